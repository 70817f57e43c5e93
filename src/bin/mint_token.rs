use clap::Parser;
use dotenvy::dotenv;
use rust_upload_hooks::utils::auth::create_upload_token;
use std::env;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Mint an upload token signed with JWT_SECRET, for local testing of the
/// pre-create hook.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Value of the `sub` claim
    #[arg(long)]
    subject: String,

    /// Token lifetime in hours
    #[arg(long, default_value_t = 1)]
    ttl_hours: i64,
}

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mint_token=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let Some(secret) = env::var("JWT_SECRET").ok().filter(|s| !s.is_empty()) else {
        error!("❌ Missing environment variable: JWT_SECRET is required.");
        info!("Usage: JWT_SECRET=... cargo run --bin mint_token -- --subject <user>");
        std::process::exit(1);
    };

    let token = create_upload_token(
        &args.subject,
        &secret,
        chrono::Duration::hours(args.ttl_hours),
    )?;
    info!("🔑 Token for {} valid for {}h", args.subject, args.ttl_hours);

    println!("{}", token);
    Ok(())
}
