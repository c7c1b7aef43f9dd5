// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SOTApics command-line front end.
//!
//! Each subcommand is one bot command run against the shared state
//! directory, plus a stand-alone eQSL generator for any activation folder.

use anyhow::Context;
use clap::{Parser, Subcommand};
use sotapics::{config::Config, services::QslCompositor, AppState};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Photos and eQSLs for SOTA activations.
#[derive(Parser, Debug)]
#[command(name = "sotapics", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register the callsign used for folders and eQSLs.
    Register {
        #[arg(long, env = "SOTAPICS_USER")]
        user: String,
        callsign: String,
    },
    /// Set the active SOTA reference (e.g. EA3/GI-002).
    Ref {
        #[arg(long, env = "SOTAPICS_USER")]
        user: String,
        reference: String,
    },
    /// Add a photo to today's activation. Caption "qsl" marks the eQSL background.
    Photo {
        #[arg(long, env = "SOTAPICS_USER")]
        user: String,
        file: PathBuf,
        #[arg(long)]
        caption: Option<String>,
    },
    /// Store the contact log (CSV with TO STATION, DATE, FREQ, MODE, RST).
    Contacts {
        #[arg(long, env = "SOTAPICS_USER")]
        user: String,
        file: PathBuf,
    },
    /// End the active session.
    Cancel {
        #[arg(long, env = "SOTAPICS_USER")]
        user: String,
    },
    /// Look up a summit in the SOTA directory.
    Describe { reference: String },
    /// Generate eQSLs for today's activation.
    Generate {
        #[arg(long, env = "SOTAPICS_USER")]
        user: String,
    },
    /// Generate eQSLs from any activation folder.
    Eqsl {
        /// Activator callsign (e.g. EA3GNU)
        #[arg(long)]
        callsign: String,
        #[arg(long)]
        activation_path: PathBuf,
        #[arg(long, default_value = "output_eqsls")]
        output_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;

    let font_path = config.eqsl_font_path.clone();
    let open_state = || AppState::open(config);

    match cli.command {
        Commands::Register { user, callsign } => {
            let state = open_state().await?;
            let callsign = state.activations.register_callsign(&user, &callsign).await?;
            println!("Callsign registered: {}", callsign);
        }
        Commands::Ref { user, reference } => {
            let state = open_state().await?;
            let opened = state.activations.set_reference(&user, &reference).await?;
            match opened.summit {
                Some(summit) => println!("Reference set: {}", summit.describe()),
                None => println!("Reference set: {}", opened.session.reference),
            }
            println!("Now send me your activation photos!");
        }
        Commands::Photo {
            user,
            file,
            caption,
        } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let state = open_state().await?;
            let upload = state
                .activations
                .upload_photo(&user, &bytes, caption.as_deref())
                .await?;
            println!("📷 Photo {} saved.", upload.slot);
            if upload.qsl_marked {
                println!("{} will be used for eQSLs.", upload.file_name);
            }
        }
        Commands::Contacts { user, file } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let state = open_state().await?;
            let path = state.activations.upload_contact_log(&user, &bytes).await?;
            println!("Contact log saved: {}", path.display());
        }
        Commands::Cancel { user } => {
            let state = open_state().await?;
            state.activations.cancel(&user).await?;
            println!("Session cancelled.");
        }
        Commands::Describe { reference } => {
            let state = open_state().await?;
            let summit = state.summits.describe(&reference).await?;
            println!("{}", summit.describe());
        }
        Commands::Generate { user } => {
            let state = open_state().await?;
            for path in state.activations.generate_confirmations(&user).await? {
                println!("{}", path.display());
            }
        }
        Commands::Eqsl {
            callsign,
            activation_path,
            output_dir,
        } => {
            let compositor = QslCompositor::new(font_path.as_deref());
            let callsign = callsign.trim().to_uppercase();
            for path in compositor.generate(&activation_path, &callsign, &output_dir)? {
                println!("{}", path.display());
            }
        }
    }

    Ok(())
}

/// Initialize structured JSON logging on stderr.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true)
        .with_writer(std::io::stderr);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sotapics=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
