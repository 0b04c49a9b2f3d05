mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use imgvault::widget::{Gallery, ImageUrlsClient};

fn main() -> Result<()> {
    // A missing .env is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise use defaults based on verbose flag.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "imgvault=trace,iv_server=trace,iv_upload=trace,iv_db=debug,iv_core=debug,tower_http=debug".to_string()
        } else {
            "imgvault=info,iv_server=info,iv_upload=info,iv_db=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(cli.config.as_deref(), host, port))
        }
        Commands::Validate => validate_config(cli.config.as_deref()),
        Commands::Urls {
            id,
            base_url,
            cookie,
            html,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(print_urls(cli.config.as_deref(), &id, &base_url, cookie, html))
        }
        Commands::GenerateSecret => {
            println!("{}", iv_server::session::generate_secret());
            Ok(())
        }
        Commands::Version => {
            println!("imgvault {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn start_server(
    config_path: Option<&std::path::Path>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let mut config = imgvault::load_config(config_path).context("failed to load configuration")?;

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!(
        "Starting imgvault on {}:{}",
        config.server.host,
        config.server.port
    );

    iv_server::start(config).await.context("server failed")?;
    Ok(())
}

fn validate_config(path: Option<&std::path::Path>) -> Result<()> {
    let config = imgvault::load_config(path).context("failed to load configuration")?;

    match path {
        Some(p) => println!("Validating config: {}", p.display()),
        None => println!("No config file specified, using defaults and environment"),
    }
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Admin root: {}", config.server.root_path);
    println!("  Database: {}", config.server.db_path.display());
    println!("  Mode: {:?}", config.server.mode);
    println!("  Admin email: {}", config.auth.email);
    println!(
        "  Cloudinary: {}",
        if config.cloudinary.is_configured() {
            config.cloudinary.cloud_name.as_str()
        } else {
            "(not configured)"
        }
    );
    println!("  Upload folder: {}", config.upload.folder);
    println!(
        "  Allowed types: {}",
        config.upload.allowed_mime_types.join(", ")
    );

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("Configuration is valid");
    } else {
        for warning in &warnings {
            println!("  warning: {warning}");
        }
    }
    Ok(())
}

async fn print_urls(
    config_path: Option<&std::path::Path>,
    id: &str,
    base_url: &str,
    cookie: Option<String>,
    html: bool,
) -> Result<()> {
    let config = imgvault::load_config(config_path).context("failed to load configuration")?;

    let mut client = ImageUrlsClient::new(base_url, &config.server.root_path)
        .context("failed to build HTTP client")?;
    if let Some(cookie) = cookie {
        client = client.with_cookie(cookie);
    }

    let mut gallery = Gallery::new(client, Some(id.to_string()));
    gallery.refresh().await;

    if html {
        print!("{}", gallery.render());
    } else if gallery.urls().is_empty() {
        println!("No images");
    } else {
        for url in gallery.urls() {
            println!("{url}");
        }
    }
    Ok(())
}
