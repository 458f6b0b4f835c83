use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use careerkit::app::{GenerationGateway, SetupInspector};
use careerkit::domain::{
    GenerationRequest, GenerationResult, GenerationTask, ProviderKind, RequestField,
};
use careerkit::infra::llm::ProviderRegistry;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "careerkit=info";

/// Résumé advice, cover letters, and résumé polishing from OpenAI or Claude.
///
/// Text arguments starting with `@` are read from the named file.
#[derive(Debug, Parser)]
#[command(name = "careerkit", version)]
struct Cli {
    /// Environment file loaded before providers are configured.
    #[arg(long, global = true, default_value = ".env")]
    env_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Suggest résumé improvements for a specific job.
    Advice {
        #[arg(long)]
        position: String,
        #[arg(long)]
        job_description: String,
        #[arg(long)]
        resume: String,
        #[command(flatten)]
        provider: ProviderArgs,
    },
    /// Draft a cover letter grounded in the résumé.
    CoverLetter {
        #[arg(long)]
        company: String,
        #[arg(long)]
        position: String,
        #[arg(long)]
        job_description: String,
        #[arg(long)]
        resume: String,
        #[command(flatten)]
        provider: ProviderArgs,
    },
    /// Polish a résumé section for a target position.
    Polish {
        #[arg(long)]
        position: String,
        #[arg(long)]
        resume: String,
        /// Free-text polishing instructions; general improvements when omitted.
        #[arg(long, default_value = "")]
        instructions: String,
        #[command(flatten)]
        provider: ProviderArgs,
    },
    /// Report configuration status and optionally test provider connectivity.
    Check {
        /// Send one minimal request to every available provider.
        #[arg(long)]
        probe: bool,
    },
}

#[derive(Debug, Args)]
struct ProviderArgs {
    #[arg(long, value_enum, default_value_t = ProviderChoice::Openai)]
    provider: ProviderChoice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ProviderChoice {
    Openai,
    Anthropic,
}

impl From<ProviderChoice> for ProviderKind {
    fn from(choice: ProviderChoice) -> Self {
        match choice {
            ProviderChoice::Openai => ProviderKind::OpenAi,
            ProviderChoice::Anthropic => ProviderKind::Anthropic,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();
    load_env_file(&cli.env_file);

    match run(cli) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_env_file(path: &Path) {
    match dotenvy::from_path(path) {
        Ok(()) => debug!(path = %path.display(), "loaded environment file"),
        Err(error) if error.not_found() => {
            debug!(path = %path.display(), "no environment file")
        }
        Err(error) => warn!(path = %path.display(), %error, "failed to load environment file"),
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let registry = ProviderRegistry::from_env();

    let (task, request, provider) = match cli.command {
        Command::Check { probe } => {
            let report = SetupInspector::new(&registry)
                .with_env_file(cli.env_file)
                .run(probe);
            println!("{}", report.render());
            return Ok(if report.is_ready() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            });
        }
        Command::Advice {
            position,
            job_description,
            resume,
            provider,
        } => (
            GenerationTask::Advice,
            GenerationRequest::new()
                .with_field(RequestField::Position, read_text_arg(&position)?)
                .with_field(RequestField::JobDescription, read_text_arg(&job_description)?)
                .with_field(RequestField::ResumeContent, read_text_arg(&resume)?),
            provider.provider,
        ),
        Command::CoverLetter {
            company,
            position,
            job_description,
            resume,
            provider,
        } => (
            GenerationTask::CoverLetter,
            GenerationRequest::new()
                .with_field(RequestField::CompanyName, read_text_arg(&company)?)
                .with_field(RequestField::Position, read_text_arg(&position)?)
                .with_field(RequestField::JobDescription, read_text_arg(&job_description)?)
                .with_field(RequestField::ResumeContent, read_text_arg(&resume)?),
            provider.provider,
        ),
        Command::Polish {
            position,
            resume,
            instructions,
            provider,
        } => (
            GenerationTask::Polish,
            GenerationRequest::new()
                .with_field(RequestField::Position, read_text_arg(&position)?)
                .with_field(RequestField::ResumeContent, read_text_arg(&resume)?)
                .with_field(RequestField::PolishInstructions, read_text_arg(&instructions)?),
            provider.provider,
        ),
    };

    let gateway = GenerationGateway::new(registry);
    match gateway.generate(task, &request, provider.into()) {
        GenerationResult::Success(generated) => {
            println!("{}", generated.text);
            Ok(ExitCode::SUCCESS)
        }
        GenerationResult::Failure(failure) => {
            eprintln!("{}", failure.message());
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Returns the argument as-is, or the contents of the file named after a
/// leading `@`.
fn read_text_arg(value: &str) -> Result<String> {
    match value.strip_prefix('@') {
        Some(path) => fs::read_to_string(path).with_context(|| format!("failed to read {path}")),
        None => Ok(value.to_string()),
    }
}
