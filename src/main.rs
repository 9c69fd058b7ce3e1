use anyhow::Result;
use clap::Parser;
use pos_cart_screen::{
    cli::{Args, CliApp},
    utils::Config,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::from_env().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    let filter = if args.verbose {
        "debug".to_string()
    } else {
        config.log_level.clone()
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();

    tracing::info!(
        "🛒 POS cart starting for {} environment",
        config.environment
    );

    let app = CliApp::new(config)?;
    app.run(args).await?;

    tracing::info!("🛒 POS cart stopped");
    Ok(())
}
