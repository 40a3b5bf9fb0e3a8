use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use releve_llm::LlmStructurer;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod pipeline;
mod state;

use config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "releve",
    version,
    about = "Extract bank-statement transactions from PDFs and check their balances"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the text of a PDF statement, page by page (OCR when a page has no text)
    Extract {
        pdf: PathBuf,

        /// Output text file (default: <output_dir>/<stem>.txt)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Fail on image-only pages instead of running OCR
        #[arg(long)]
        no_ocr: bool,
    },

    /// Structure one statement (.txt or .pdf) into JSON through the language model
    Structure {
        input: PathBuf,

        /// Output JSON file (default: <output_dir>/<stem>.json)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Structure every PDF of a directory
    StructureDir {
        #[arg(long)]
        input_dir: Option<PathBuf>,

        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Check that initial amount + transactions == final amount
    Reconcile {
        #[arg(required = true)]
        json: Vec<PathBuf>,

        /// Accepted absolute gap, e.g. 0.01 (default: [reconcile] tolerance)
        #[arg(long)]
        tolerance: Option<String>,

        /// Exit with status 1 when any statement does not balance
        #[arg(long)]
        strict: bool,
    },

    /// Extract, structure and reconcile every PDF of a directory
    Run {
        #[arg(long)]
        input_dir: Option<PathBuf>,

        #[arg(long)]
        output_dir: Option<PathBuf>,

        #[arg(long)]
        strict: bool,
    },

    /// Manage ~/.releve/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env may carry OPENAI_API_KEY / ANTHROPIC_API_KEY
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let cfg = config::load_config()?;

    match cli.command {
        Command::Extract { pdf, out, no_ocr } => {
            let out = out.unwrap_or_else(|| pipeline::output_path(&cfg.paths.output_dir, &pdf, "txt"));
            let pages = pipeline::extract(&cfg.extractor(no_ocr), &pdf, &out)?;
            println!("Extracted {} page(s) to {}", pages, out.display());
        }

        Command::Structure { input, out } => {
            let out = out.unwrap_or_else(|| pipeline::output_path(&cfg.paths.output_dir, &input, "json"));
            let structurer = new_structurer(&cfg)?;
            let st = pipeline::structure(&structurer, &cfg.extractor(false), &input, &out)?;
            println!(
                "Wrote {} ({} transactions)",
                out.display(),
                st.transactions.len()
            );
        }

        Command::StructureDir {
            input_dir,
            output_dir,
        } => {
            let input_dir = input_dir.unwrap_or_else(|| cfg.paths.input_dir.clone());
            let output_dir = output_dir.unwrap_or_else(|| cfg.paths.output_dir.clone());
            let structurer = new_structurer(&cfg)?;
            let written =
                pipeline::structure_dir(&structurer, &cfg.extractor(false), &input_dir, &output_dir)?;
            for p in &written {
                println!("Wrote {}", p.display());
            }
        }

        Command::Reconcile {
            json,
            tolerance,
            strict,
        } => {
            let reconciler = match tolerance {
                Some(t) => releve_core::Reconciler::with_tolerance(config::parse_tolerance(&t)?)?,
                None => cfg.reconciler()?,
            };
            let summary = pipeline::reconcile_paths(&reconciler, &json, &mut io::stdout().lock())?;
            tracing::info!(
                balanced = summary.balanced,
                mismatched = summary.mismatched,
                "reconciliation done"
            );
            if strict && summary.mismatched > 0 {
                std::process::exit(1);
            }
        }

        Command::Run {
            input_dir,
            output_dir,
            strict,
        } => {
            let input_dir = input_dir.unwrap_or_else(|| cfg.paths.input_dir.clone());
            let output_dir = output_dir.unwrap_or_else(|| cfg.paths.output_dir.clone());
            let structurer = new_structurer(&cfg)?;
            let summary = pipeline::run_all(
                &structurer,
                &cfg.extractor(false),
                &cfg.reconciler()?,
                &input_dir,
                &output_dir,
                &mut io::stdout().lock(),
            )?;
            println!(
                "\n{} balanced, {} mismatched",
                summary.balanced, summary.mismatched
            );
            if strict && summary.mismatched > 0 {
                std::process::exit(1);
            }
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => show_config(&cfg)?,
        },
    }

    Ok(())
}

fn new_structurer(cfg: &Config) -> Result<LlmStructurer> {
    let sc = cfg.structurer_config()?;
    if sc.api_key.is_none() {
        bail!(
            "missing API key for {}: set {} (a .env file in the working directory is read too)",
            sc.provider,
            sc.provider.api_key_var()
        );
    }
    LlmStructurer::new(sc).context("create LLM client")
}

fn show_config(cfg: &Config) -> Result<()> {
    println!("# {}", config::config_path()?.display());
    print!("{}", toml::to_string_pretty(cfg).context("serialize config")?);
    let key_var = cfg.provider()?.api_key_var();
    let key_state = if std::env::var(key_var).is_ok_and(|k| !k.trim().is_empty()) {
        "set"
    } else {
        "missing"
    };
    println!("\n# {key_var}: {key_state}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_and_version() {
        Cli::command().debug_assert();
        assert_eq!(
            Cli::command().get_version(),
            Some(env!("CARGO_PKG_VERSION"))
        );
    }

    #[test]
    fn test_reconcile_args() {
        let cli =
            Cli::try_parse_from(["releve", "reconcile", "a.json", "b.json", "--tolerance", "0.01", "--strict"])
                .unwrap();
        match cli.command {
            Command::Reconcile {
                json,
                tolerance,
                strict,
            } => {
                assert_eq!(json, vec![PathBuf::from("a.json"), PathBuf::from("b.json")]);
                assert_eq!(tolerance.as_deref(), Some("0.01"));
                assert!(strict);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(Cli::try_parse_from(["releve", "reconcile"]).is_err());
    }
}
