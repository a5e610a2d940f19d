//! cbtopo - Cluster topology summaries from collected diagnostic bundles.

mod session;

use anyhow::{Context, Result};
use cbtopo_analyzer::{Layout, OutputFormat, SessionBindings, Settings, Toolkit};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "cbtopo")]
#[command(
    author,
    version,
    about = "Summarize which cluster nodes run which services from collected log bundles"
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print one topology table per cluster followed by the combined report
    Summary {
        /// Directory whose subdirectories are log locations
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// YAML settings file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Table layout (matrix, services)
        #[arg(long)]
        layout: Option<String>,

        /// Combined report format (text, json)
        #[arg(long, default_value = "text")]
        format: String,

        /// Print node and service ids as JSON after the report
        #[arg(long)]
        bindings: bool,
    },

    /// Interactive session; node ids accumulate across runs
    Session {
        /// Directory whose subdirectories are log locations
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// YAML settings file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Summary {
            dir,
            config,
            layout,
            format,
            bindings,
        } => {
            let mut settings = load_settings(config.as_deref())?;
            if let Some(layout) = layout {
                settings.layout = layout.parse::<Layout>()?;
            }
            let format: OutputFormat = format.parse()?;
            info!("Summarizing log locations in {:?}", dir);

            let toolkit = Toolkit::snapshot(&settings);
            let mut session = bindings.then(SessionBindings::new);

            let output = cbtopo_analyzer::run(&dir, &toolkit, &settings, format, session.as_mut())
                .with_context(|| format!("Failed to summarize {:?}", dir))?;

            for table in &output.tables {
                println!("{}", table);
                println!();
            }
            println!("{}", output.report);

            if let Some(bindings) = &session {
                let vars = output.namespace(Some(bindings));
                println!("{}", serde_json::to_string_pretty(&vars)?);
            }
        }

        Commands::Session { dir, config } => {
            let settings = load_settings(config.as_deref())?;
            let toolkit = Toolkit::snapshot(&settings);
            let mut session = session::Session::new(&dir, &toolkit, &settings);

            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            session.run_loop(stdin.lock(), stdout.lock())?;
        }
    }

    Ok(())
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => Settings::load(path)
            .with_context(|| format!("Failed to load settings from {:?}", path)),
        None => Ok(Settings::default()),
    }
}
