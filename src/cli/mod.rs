use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod chat;
pub mod init;
pub mod serve;

use crate::core::AppConfig;

#[derive(Subcommand)]
enum Command {
    /// Create the database and its tables
    Init {},
    /// Run the API server
    Serve {
        /// Set the server host address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Set the server port
        #[arg(long, default_value = "2222")]
        port: String,
    },
    /// Chat with the portfolio assistant through a running server
    Chat {
        /// Full URL of the chat endpoint
        #[arg(long, default_value = "http://127.0.0.1:2222/api/chat")]
        url: String,

        /// Bearer token to send with each request
        #[arg(long)]
        api_key: Option<String>,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();

    // Handle each sub command
    match args.command {
        Some(Command::Init {}) => {
            init::run(&AppConfig::default().db_path).await?;
        }
        Some(Command::Serve { host, port }) => {
            serve::run(host, port).await?;
        }
        Some(Command::Chat { url, api_key }) => {
            chat::run(&url, api_key.as_deref()).await?;
        }
        None => {}
    }

    Ok(())
}
