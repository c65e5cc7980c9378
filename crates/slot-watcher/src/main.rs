use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use slot_watcher::{Config, JsonFileStore, Mailer, PollService, SmtpMailer, StatusStore};

#[derive(Parser)]
#[command(name = "slot-watcher")]
#[command(about = "Watch a booking API for free doctor appointments and email new ones")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(
        short,
        long,
        default_value = "slot-watcher.toml",
        env = "SLOT_WATCHER_CONFIG"
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll forever (default)
    Run,
    /// Run a single poll cycle and print what happened
    Once,
    /// Print an example configuration file
    ExampleConfig,
    /// Print the slots already notified, per doctor
    Status,
    /// Send a test email with the configured mail settings
    TestMail,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slot_watcher=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::ExampleConfig => {
            let rendered = toml::to_string_pretty(&Config::example())
                .context("Failed to render example config")?;
            print!("{}", rendered);
        }
        Commands::Status => {
            let config = Config::load(&cli.config)?;
            let status = JsonFileStore::new(&config.status_path).load();
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::TestMail => {
            let config = Config::load(&cli.config)?;
            let mailer = SmtpMailer::new(&config.mail)?;
            mailer
                .send("Slot watcher test", "Mail settings work.")
                .await?;
            println!("Test email sent to {}", config.mail.to);
        }
        Commands::Once => {
            let config = Config::load(&cli.config)?;
            let service = PollService::from_config(config)?;
            let now = chrono::Local::now().naive_local();
            let report = service.run_cycle(now).await?;
            println!("Checked:  {}", report.checked.join(", "));
            println!("Failed:   {}", report.failed.join(", "));
            println!("Notified: {}", report.notified.join(", "));
        }
        Commands::Run => {
            let config = Config::load(&cli.config)?;
            tracing::info!("Starting slot watcher with {}", cli.config.display());
            let service = PollService::from_config(config)?;
            service.run().await?;
        }
    }

    Ok(())
}
