use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use copydesk_editor_core::{html_to_plain_text, markdown_to_html, sanitize_html, trusted_html};
use miette::{IntoDiagnostic, Result, WrapErr};

mod config;
mod replay;

#[derive(Parser)]
#[command(version, about = "Copydesk - headless markdown/HTML editor tools", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Editor configuration file (KDL)
    #[arg(long, global = true, env = "COPYDESK_CONFIG")]
    config: Option<PathBuf>,

    /// Print HTML instead of plain text where both are possible
    #[arg(long, global = true)]
    html: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render markdown to trusted HTML
    Render {
        /// Input file, stdin when omitted
        input: Option<PathBuf>,
    },
    /// Sanitize an HTML fragment
    Sanitize {
        /// Input file, stdin when omitted
        input: Option<PathBuf>,
    },
    /// Project an HTML fragment to plain text
    Plain {
        /// Input file, stdin when omitted
        input: Option<PathBuf>,
    },
    /// Replay a KDL editing script against a headless session
    Replay {
        /// Script file, stdin when omitted
        script: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    init_miette()?;
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render { input } => {
            let text = read_input(input.as_deref())?;
            println!("{}", trusted_html(&markdown_to_html(&text)));
        }
        Commands::Sanitize { input } => {
            let html = read_input(input.as_deref())?;
            println!("{}", sanitize_html(&html));
        }
        Commands::Plain { input } => {
            let html = read_input(input.as_deref())?;
            println!("{}", html_to_plain_text(&html));
        }
        Commands::Replay { script } => {
            let config = config::load(cli.config.as_deref())?;
            let source = read_input(script.as_deref())?;
            let session = replay::run(&source, config)?;
            tracing::info!(
                open = session.is_open(),
                history = session.history().len(),
                "replay finished"
            );
            println!("{}", replay::output(&session, cli.html));
        }
    }

    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("could not read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .into_diagnostic()
                .wrap_err("could not read stdin")?;
            Ok(buf)
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn init_miette() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .context_lines(3)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))
    .into_diagnostic()
    .wrap_err("couldn't set the miette hook")?;
    miette::set_panic_hook();
    Ok(())
}
