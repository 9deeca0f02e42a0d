use anyhow::{bail, Context as _};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;

use triage_rs::error::{SyntaxError, TriageError};
use triage_rs::workflow::condition::{evaluate, parse};
use triage_rs::workflow::diagnosis::diagnose_in_background;
use triage_rs::workflow::loader::ProtocolLoader;
use triage_rs::workflow::script::{ConditionSite, NavigationListener, Navigator};
use triage_rs::workflow::state::Context;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a condition and evaluate it against answers
    Check {
        /// The condition text
        #[arg(short, long)]
        expr: String,

        /// JSON/YAML answers file
        #[arg(short, long)]
        answers: Option<PathBuf>,
    },
    /// Report every syntax problem in a protocol
    Lint {
        /// Protocol file (defaults to TRIAGE_PROTOCOL)
        #[arg(short, long)]
        protocol: Option<PathBuf>,
    },
    /// Walk the screens forward with the given answers
    Walk {
        /// Protocol file (defaults to TRIAGE_PROTOCOL)
        #[arg(short, long)]
        protocol: Option<PathBuf>,

        /// JSON/YAML answers file
        #[arg(short, long)]
        answers: PathBuf,
    },
    /// Run the diagnosis rules and print the result as JSON
    Diagnose {
        /// Protocol file (defaults to TRIAGE_PROTOCOL)
        #[arg(short, long)]
        protocol: Option<PathBuf>,

        /// JSON/YAML answers file
        #[arg(short, long)]
        answers: PathBuf,
    },
    /// Print the JSON Schema for protocol files
    Schema,
}

/// Prints fail-open condition errors so authors can fix them
struct StderrListener;

impl NavigationListener for StderrListener {
    fn on_condition_error(&self, site: &ConditionSite, error: &SyntaxError) {
        eprintln!("warning: {} has an invalid condition, shown anyway: {}", site, error);
    }
}

fn protocol_path(flag: Option<PathBuf>) -> Result<PathBuf, TriageError> {
    flag.or_else(|| std::env::var("TRIAGE_PROTOCOL").ok().map(PathBuf::from))
        .ok_or_else(|| TriageError::config("no protocol given: pass --protocol or set TRIAGE_PROTOCOL"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let loader = ProtocolLoader::new();

    match args.command {
        Commands::Check { expr, answers } => {
            let ctx = match answers {
                Some(path) => loader.load_answers(&path)?,
                None => Context::new(),
            };
            let parsed = parse(&expr)?;
            println!("{}", parsed);
            println!("{}", evaluate(&parsed, &ctx));
        }
        Commands::Lint { protocol } => {
            let path = protocol_path(protocol)?;
            let def = loader
                .load_protocol(&path)
                .with_context(|| format!("loading {}", path.display()))?;
            let issues = ProtocolLoader::validate(&def);
            for issue in &issues {
                println!("{}", issue);
            }
            if !issues.is_empty() {
                bail!("{} problem(s) in {}", issues.len(), path.display());
            }
            println!("{}: ok", def.name);
        }
        Commands::Walk { protocol, answers } => {
            let path = protocol_path(protocol)?;
            let def = loader
                .load_protocol(&path)
                .with_context(|| format!("loading {}", path.display()))?;
            let ctx = loader.load_answers(&answers)?;

            let mut navigator = Navigator::new(def.screens)?.with_listener(Box::new(StderrListener));
            while let Some(id) = navigator.next(&ctx) {
                let fields: Vec<String> = navigator
                    .visible_fields(&id, &ctx)?
                    .iter()
                    .map(|f| f.id.clone())
                    .collect();
                println!("{} [{}]", id, fields.join(", "));
            }
            println!("-- summary --");
        }
        Commands::Diagnose { protocol, answers } => {
            let path = protocol_path(protocol)?;
            let def = loader
                .load_protocol(&path)
                .with_context(|| format!("loading {}", path.display()))?;
            let ctx = loader.load_answers(&answers)?;

            let result = diagnose_in_background(def.rules, ctx).await?;
            println!("{}", serde_json::to_string_pretty(&result.unwrap_or_default())?);
        }
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(ProtocolLoader::schema())?);
        }
    }

    Ok(())
}
