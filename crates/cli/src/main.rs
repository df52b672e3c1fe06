//! Afterschool CLI - database migrations and maintenance.
//!
//! # Usage
//!
//! ```bash
//! # Apply the PostgreSQL schema
//! afterschool-cli migrate
//!
//! # Insert the sample lessons if the lesson table is empty
//! afterschool-cli seed
//!
//! # Restore every lesson's spaces and empty all carts
//! afterschool-cli reset
//!
//! # Create a student account
//! afterschool-cli user create --student-id M00123456 --password 'correct horse'
//! ```
//!
//! # Environment Variables
//!
//! - `AFTERSCHOOL_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use secrecy::SecretString;

use afterschool_core::StudentId;

mod commands;

#[derive(Parser)]
#[command(name = "afterschool-cli")]
#[command(author, version, about = "Afterschool booking CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Insert the sample lessons when none exist
    Seed,
    /// Reset lesson spaces to the default and clear every cart
    Reset,
    /// Manage student accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new student account
    Create {
        /// Student id (`M` followed by 8 digits)
        #[arg(short, long, value_parser = StudentId::parse)]
        student_id: StudentId,

        /// Password, at least 8 characters
        #[arg(short, long)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed => commands::seed::seed().await?,
        Commands::Reset => commands::seed::reset().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                student_id,
                password,
            } => {
                commands::user::create(&student_id, &SecretString::from(password)).await?;
            }
        },
    }
    Ok(())
}
