//! `{var}` placeholder substitution.
//!
//! `{{` and `}}` produce literal braces. Variable names are taken verbatim
//! between the braces.

use std::collections::BTreeMap;

use crate::workflow::error::{WorkflowError, WorkflowResult};

/// Variables available to templates.
pub type Vars = BTreeMap<String, String>;

/// Replace every `{name}` in `template` with its value from `vars`.
pub fn render(template: &str, vars: &Vars) -> WorkflowResult<String> {
    let malformed = |reason: &str| WorkflowError::Template {
        template: template.to_string(),
        reason: reason.to_string(),
    };

    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') => return Err(malformed("nested '{'")),
                        Some(c) => name.push(c),
                        None => return Err(malformed("unclosed '{'")),
                    }
                }
                let name = name.trim();
                if name.is_empty() {
                    return Err(malformed("empty placeholder"));
                }
                let value = vars.get(name).ok_or_else(|| WorkflowError::MissingVariable {
                    name: name.to_string(),
                })?;
                out.push_str(value);
            }
            '}' => return Err(malformed("unmatched '}'")),
            c => out.push(c),
        }
    }
    Ok(out)
}

/// Names of the placeholders used in `template`, in order of appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '{' {
            continue;
        }
        if chars.peek() == Some(&'{') {
            chars.next();
            continue;
        }
        let name: String = chars.by_ref().take_while(|c| *c != '}').collect();
        let name = name.trim().to_string();
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}
