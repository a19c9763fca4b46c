//! Ruchna CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations (shop schema)
//! ruchna migrate storefront
//!
//! # Run admin database migrations (session table)
//! ruchna migrate admin
//!
//! # Run all database migrations
//! ruchna migrate all
//!
//! # Hash the shared admin password for ADMIN_PASSWORD_HASH
//! echo 'long random passphrase' | ruchna admin hash-password
//!
//! # Load products from a YAML file
//! ruchna seed catalog catalog.yaml
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ruchna")]
#[command(author, version, about = "Ruchna CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Admin account tools
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Load data from files
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Run storefront database migrations
    Storefront,
    /// Run admin database migrations
    Admin,
    /// Run all database migrations
    All,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Read a password from stdin and print its Argon2 hash
    HashPassword,
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Insert products and variants from a YAML file
    Catalog {
        /// Path to the YAML file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate { target } => match target {
            MigrateTarget::Storefront => commands::migrate::storefront().await?,
            MigrateTarget::Admin => commands::migrate::admin().await?,
            MigrateTarget::All => {
                commands::migrate::storefront().await?;
                commands::migrate::admin().await?;
            }
        },
        Commands::Admin { action } => match action {
            AdminAction::HashPassword => commands::admin::hash_password()?,
        },
        Commands::Seed { target } => match target {
            SeedTarget::Catalog { file } => {
                commands::seed::catalog(&file).await?;
            }
        },
    }
    Ok(())
}
