//! FK Designers CLI - Database migrations and staff account management.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! fkd-cli migrate
//!
//! # Create a staff or admin account (password from FKD_ADMIN_PASSWORD)
//! fkd-cli admin create -e ops@fkdesigner.in -f Asha -l Rao -p 9820012345 -r staff
//!
//! # Deactivate an account
//! fkd-cli admin set-active -e ops@fkdesigner.in --active false
//! ```
//!
//! The database is configured exactly as for the API server: `DATABASE_URL`
//! or the discrete `DB_*` variables, `.env` honoured.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "fkd-cli")]
#[command(author, version, about = "FK Designers CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage staff and admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a staff or admin account with its staff record
    Create {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// First name
        #[arg(short, long)]
        first_name: String,

        /// Last name
        #[arg(short, long)]
        last_name: String,

        /// Phone number (10-15 digits)
        #[arg(short, long)]
        phone: String,

        /// Role (`staff` or `admin`)
        #[arg(short, long, default_value = "staff")]
        role: String,

        /// Job title stored on the staff record
        #[arg(long, default_value = "Staff")]
        position: String,

        /// Department stored on the staff record
        #[arg(long, default_value = "Operations")]
        department: String,
    },
    /// Activate or deactivate an account
    SetActive {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// New status
        #[arg(long, action = clap::ArgAction::Set)]
        active: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                first_name,
                last_name,
                phone,
                role,
                position,
                department,
            } => {
                commands::admin::create_user(&commands::admin::NewStaffArgs {
                    email,
                    first_name,
                    last_name,
                    phone,
                    role,
                    position,
                    department,
                })
                .await?;
            }
            AdminAction::SetActive { email, active } => {
                commands::admin::set_active(&email, active).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_set_active_parses_explicit_bool() {
        let cli = Cli::try_parse_from([
            "fkd-cli",
            "admin",
            "set-active",
            "-e",
            "ops@fkdesigner.in",
            "--active",
            "false",
        ]);
        let (email, active) = match cli {
            Ok(Cli {
                command:
                    Commands::Admin {
                        action: AdminAction::SetActive { email, active },
                    },
            }) => (email, active),
            Ok(_) => panic!("parsed into the wrong subcommand"),
            Err(err) => panic!("parse failed: {err}"),
        };
        assert_eq!(email, "ops@fkdesigner.in");
        assert!(!active);
    }
}
