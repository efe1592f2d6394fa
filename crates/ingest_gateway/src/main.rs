// Ingest Video Gateway
//
// Web front-end for the Ingest video API
// Serves either the client-credentials or the user-authorization variant

use clap::{Args, Parser, Subcommand};
use ingest_gateway::{start_server, IngestConfig, Variant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ingest-gateway", version, about = "Ingest video API web front-end")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Authenticate the server itself and share one token across visitors
    ClientCredentials(ServeArgs),
    /// Log each visitor in through the OAuth2 authorization-code flow
    UserAuthorization(ServeArgs),
}

#[derive(Args)]
struct ServeArgs {
    #[arg(long, env = "INGEST_GATEWAY_HOST", default_value = "127.0.0.1")]
    host: String,
    #[arg(long, env = "INGEST_GATEWAY_PORT", default_value_t = 5000)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let (variant, args) = match cli.command {
        Command::ClientCredentials(args) => (Variant::ClientCredentials, args),
        Command::UserAuthorization(args) => (Variant::UserAuthorization, args),
    };

    let config = IngestConfig::from_env()?;

    println!("Ingest Video Gateway");
    println!();
    println!("[OK] Client configured: {}", config.credential.client_id);
    println!("[OK] API: {}", config.base_api_url);
    println!(
        "[OK] Request timeout: {}s",
        config.request_timeout.as_secs()
    );
    println!();
    println!("[INFO] Available endpoints:");
    println!("  GET    http://{}:{}/                 - Home", args.host, args.port);
    println!("  GET    http://{}:{}/videos           - Published and scheduled videos", args.host, args.port);
    println!("  GET    http://{}:{}/videos/<id>      - Play a video", args.host, args.port);
    if variant == Variant::UserAuthorization {
        println!("  GET    http://{}:{}/login            - Start Ingest login", args.host, args.port);
        println!("  GET    http://{}:{}/oauth/callback   - OAuth callback handler", args.host, args.port);
        println!("  GET    http://{}:{}/logout           - Revoke token and log out", args.host, args.port);
    }
    println!();

    start_server(config, variant, &args.host, args.port).await?;

    Ok(())
}
