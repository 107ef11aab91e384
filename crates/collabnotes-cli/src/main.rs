//! collabnotes CLI - shared notes from the terminal
//!
//! Reads and writes the same note collection the other collabnotes front
//! ends use, through the core view models.

mod cli;
mod commands;
mod error;


use clap::Parser;
use tracing_subscriber::filter::Directive;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::common::load_config;
use crate::commands::delete::run_delete;
use crate::commands::edit::run_edit;
use crate::commands::list::run_list;
use crate::commands::show::run_show;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let directive: Directive = "collabnotes=info"
        .parse()
        .map_err(|error| CliError::Config(format!("invalid log directive: {error}")))?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.db_path, cli.collection)?;
    tracing::debug!(
        "Using collection {} at {}",
        config.collection,
        config.store_path.display()
    );

    match cli.command {
        Commands::Add { title, content } => {
            run_add(&title, content, &config).await?;
        }
        Commands::List { json } => run_list(json, &config)?,
        Commands::Show { id, json } => run_show(&id, json, &config)?,
        Commands::Edit { id, title, content } => {
            run_edit(&id, title.as_deref(), content.as_deref(), &config).await?;
        }
        Commands::Delete { id, yes } => run_delete(&id, yes, &config).await?,
    }

    Ok(())
}
