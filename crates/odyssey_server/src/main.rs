use clap::Parser;
use odyssey_server::{Cli, Commands, OdysseyConfig, init_logging, migrate, serve};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = OdysseyConfig::load(cli.config.as_deref())?;
    init_logging(&config.server)?;

    match cli.command {
        Commands::Serve { bind } => {
            let bind = match bind {
                Some(addr) => addr,
                None => config.server.bind_addr()?,
            };
            serve(&config, bind).await?;
        }
        Commands::Migrate => {
            let applied = tokio::task::spawn_blocking(move || migrate(&config)).await??;
            tracing::info!(applied, "Database is up to date");
        }
    }

    Ok(())
}
