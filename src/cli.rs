use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "imgvault")]
#[command(author, version, about = "Admin service for image records hosted on Cloudinary")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the admin server
    Start {
        /// Host to bind to (overrides config and HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Validate configuration and print the effective settings
    Validate,

    /// Fetch the stored image URLs of a record, like the gallery widget does
    Urls {
        /// Image record id
        id: String,

        /// Server origin
        #[arg(long, default_value = "http://localhost:3000")]
        base_url: String,

        /// Cookie header to send (for the session-protected fallbacks)
        #[arg(long)]
        cookie: Option<String>,

        /// Print the gallery HTML fragment instead of one URL per line
        #[arg(long)]
        html: bool,
    },

    /// Generate a random secret for signing session cookies
    GenerateSecret,

    /// Display version information
    Version,
}
