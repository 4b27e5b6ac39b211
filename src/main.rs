//! gitsaga command-line interface.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter};

use gitsaga::storage::GitRepository;
use gitsaga::workflow::{
    builtin, PlanBuilder, Report, WorkflowConfig, WorkflowDefinition, EXIT_OK, EXIT_SETUP,
};

#[derive(Parser)]
#[command(name = "gitsaga", version)]
#[command(about = "Run git and work-item workflows that roll back on failure", long_about = None)]
struct Cli {
    #[arg(short = 'C', long = "repo", global = true, help = "Repository to operate on (default: current directory)")]
    repo: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Config file (default: .gitsaga.toml in the repository)")]
    config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable debug logging")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "List available workflows and their steps")]
    List,

    #[command(about = "Run a workflow")]
    Run {
        #[arg(help = "Workflow name")]
        workflow: String,

        #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var, help = "Set a template variable")]
        vars: Vec<(String, String)>,
    },

    #[command(about = "Start a feature branch (runs start-feature)")]
    Start {
        #[arg(help = "Feature name; the branch becomes feature/<name>")]
        name: String,
    },
}

fn parse_var(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty variable name in '{}'", raw));
    }
    Ok((key.to_string(), value.to_string()))
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "gitsaga=debug" } else { "gitsaga=info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    // clap's own usage-error code (2) would read as an incomplete rollback
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(EXIT_SETUP)
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    init_tracing(cli.verbose);

    let outcome = match cli.command {
        Commands::List => list(cli.config.as_ref(), cli.repo.as_ref()),
        Commands::Run { workflow, vars } => run(cli.repo, cli.config, &workflow, vars).await,
        Commands::Start { name } => {
            run(
                cli.repo,
                cli.config,
                builtin::START_FEATURE,
                vec![("name".to_string(), name)],
            )
            .await
        }
    };
    ExitCode::from(exit_status(outcome))
}

/// Errors returned here happened before any step ran.
fn exit_status(outcome: Result<u8>) -> u8 {
    match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            EXIT_SETUP
        }
    }
}

fn list(config: Option<&PathBuf>, repo: Option<&PathBuf>) -> Result<u8> {
    let config = load_config(config, repo)?;
    print_workflows(&config.workflows());
    Ok(EXIT_OK)
}

fn load_config(config: Option<&PathBuf>, repo: Option<&PathBuf>) -> Result<WorkflowConfig> {
    match config {
        Some(path) => Ok(WorkflowConfig::load(path)?),
        None => {
            let root = match repo {
                Some(path) => path.clone(),
                None => std::env::current_dir().context("could not determine current directory")?,
            };
            let root = GitRepository::discover(&root)
                .map(|repo| repo.path().to_path_buf())
                .unwrap_or(root);
            Ok(WorkflowConfig::discover(root)?)
        }
    }
}

async fn run(
    repo_arg: Option<PathBuf>,
    config_arg: Option<PathBuf>,
    name: &str,
    vars: Vec<(String, String)>,
) -> Result<u8> {
    let config = load_config(config_arg.as_ref(), repo_arg.as_ref())?;
    let repo_path = repo_arg
        .or_else(|| config.repository.path.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let repo = GitRepository::discover(&repo_path)
        .with_context(|| format!("no git repository at {}", repo_path.display()))?;
    debug!(repo = %repo.path().display(), workflow = name, "running workflow");

    let workflow = config.workflow(name)?;
    let mut builder = PlanBuilder::new(repo, &config).vars(vars);
    if workflow.needs_tracker() {
        if let Some(tracker) = &config.tracker {
            builder = builder.with_tracker(tracker.client()?);
        }
    }

    let plan = builder.build(&workflow)?;
    let result = plan.execute().await;

    let report = Report::new(&workflow.name, &result);
    print!("{}", report);
    Ok(report.exit_code())
}

fn print_workflows(workflows: &[WorkflowDefinition]) {
    for workflow in workflows {
        println!("{}", workflow.name);
        if !workflow.description.is_empty() {
            println!("    {}", workflow.description);
        }
        let vars = workflow.variables();
        if !vars.is_empty() {
            println!("    variables: {}", vars.join(", "));
        }
        for (i, step) in workflow.steps.iter().enumerate() {
            println!("    {}. {}", i + 1, step);
        }
        println!();
    }
}
