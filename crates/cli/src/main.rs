use anyhow::Result;
use clap::{ArgGroup, Args, Parser, Subcommand};
use policy_agent::PipelineError;
use policy_protocol::{ErrorCode, ErrorEnvelope};
use std::path::PathBuf;

mod commands;
mod settings;

#[derive(Parser)]
#[command(name = "policy-agent")]
#[command(about = "Policy Q&A and conflict checking on a local inference engine", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file (missing file means defaults)
    #[arg(long, global = true, default_value = "policy-agent.toml")]
    config: PathBuf,

    /// JSON document store
    #[arg(long, global = true, default_value = "policies.json")]
    store: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Print machine-readable JSON on stdout (implies --quiet)
    #[arg(long, global = true)]
    json: bool,

    #[command(flatten)]
    engine: EngineFlags,
}

/// Engine overrides applied after the config file and environment.
#[derive(Args)]
pub struct EngineFlags {
    /// Inference engine executable
    #[arg(long, global = true)]
    pub llm_binary: Option<PathBuf>,

    /// Model weights passed to the engine
    #[arg(long, global = true)]
    pub model: Option<PathBuf>,

    /// Per-request engine timeout in milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Maximum engine processes running at once
    #[arg(long, global = true)]
    pub max_concurrency: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a question from stored policies
    Ask(AskArgs),

    /// Check a new or updated policy against related stored policies
    #[command(name = "check-conflict")]
    CheckConflict(SubmissionArgs),

    /// Save a new policy or replace an existing policy's content
    Upload(SubmissionArgs),

    /// Draft a policy from a free-text request against the legal KB
    Draft(DraftArgs),

    /// Parse a conflict-analysis reply (file or stdin) without running the engine
    #[command(name = "parse-verdict")]
    ParseVerdict(ParseVerdictArgs),
}

#[derive(Args)]
pub struct AskArgs {
    /// Question text
    pub query: String,

    /// Department scope (defaults to the configured department)
    #[arg(long)]
    pub department: Option<String>,
}

#[derive(Args)]
#[command(group(ArgGroup::new("mode").required(true).args(["metadata", "policy_id"])))]
pub struct SubmissionArgs {
    /// Policy form as JSON (create mode)
    #[arg(long)]
    pub metadata: Option<String>,

    /// Existing policy number or document id (update mode)
    #[arg(long)]
    pub policy_id: Option<String>,

    /// Extracted policy text; `-` reads stdin
    #[arg(long)]
    pub content: PathBuf,
}

#[derive(Args)]
pub struct DraftArgs {
    /// What the policy should cover
    pub request: String,

    /// Legal KB directory (overrides the configured one)
    #[arg(long)]
    pub kb: Option<PathBuf>,
}

#[derive(Args)]
pub struct ParseVerdictArgs {
    /// Reply text file; stdin when omitted
    pub file: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let mut cli = Cli::parse();

    // stdout is reserved for JSON
    if cli.json {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let json = cli.json;
    let verbose = cli.verbose;
    if let Err(err) = run(cli).await {
        report_error(&err, json, verbose);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let output = commands::Output { json: cli.json };
    match cli.command {
        Commands::ParseVerdict(args) => commands::run_parse_verdict(args, output),
        Commands::Ask(args) => {
            let agent = settings::agent(&cli.config, &cli.store, &cli.engine).await?;
            commands::run_ask(&agent, args, output).await
        }
        Commands::CheckConflict(args) => {
            let agent = settings::agent(&cli.config, &cli.store, &cli.engine).await?;
            commands::run_check_conflict(&agent, args, output).await
        }
        Commands::Upload(args) => {
            let agent = settings::agent(&cli.config, &cli.store, &cli.engine).await?;
            commands::run_upload(&agent, args, output).await
        }
        Commands::Draft(args) => {
            let drafter = settings::drafter(&cli.config, &cli.engine, args.kb.as_deref())?;
            commands::run_draft(&drafter, args, output).await
        }
    }
}

fn report_error(err: &anyhow::Error, json: bool, verbose: bool) {
    let envelope = err.downcast_ref::<PipelineError>().map_or_else(
        || ErrorEnvelope::generic(ErrorCode::Internal, false),
        PipelineError::to_envelope,
    );

    if verbose {
        eprintln!("Error: {err:#}");
    }
    if json {
        match serde_json::to_string(&envelope) {
            Ok(raw) => println!("{raw}"),
            Err(_) => eprintln!("{}", envelope.message),
        }
    } else {
        eprintln!("{}", envelope.message);
        for issue in &envelope.validation {
            eprintln!("  {}: {}", issue.field, issue.message);
        }
    }
}
