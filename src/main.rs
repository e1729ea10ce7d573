use chrono::Utc;
use clap::Parser;
use color_eyre::eyre::{Result, bail};
use tokio::sync::broadcast::error::RecvError;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use stockwire::StockwireClient;
use stockwire::domain::ports::ApiRequest;
use stockwire::infrastructure::{AppConfig, CliArgs, Command, StorageManager, StreamSignal};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry().with(filter).init();
    }

    Ok(())
}

async fn create_client(args: &CliArgs) -> Result<StockwireClient> {
    let storage = StorageManager::new()?;
    let mut config = storage.load_config(args.config.as_deref())?;
    config.merge_with_args(args);

    init_logging(&config)?;

    info!(version = stockwire::VERSION, "Starting stockwire");

    Ok(StockwireClient::from_config(&config, &storage).await?)
}

async fn listen(client: &StockwireClient) -> Result<()> {
    let Some(token) = client.token() else {
        bail!("not logged in; run `stockwire login` first");
    };

    let mut signals = client.subscribe_notifications();
    client.connect_notifications(token)?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            signal = signals.recv() => match signal {
                Ok(StreamSignal::Connected) => eprintln!("connected"),
                Ok(StreamSignal::Event(event)) => println!("{}", serde_json::to_string(&event)?),
                Ok(StreamSignal::Error(e)) if e.is_terminal() => bail!(e),
                Ok(StreamSignal::Error(e)) => eprintln!("stream error: {e}"),
                Err(RecvError::Lagged(skipped)) => eprintln!("skipped {skipped} signals"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    client.disconnect_notifications();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    let args = CliArgs::parse();
    let client = create_client(&args).await?;

    match args.command {
        Command::Login {
            email,
            password,
            no_persist,
        } => {
            let response = client.login(&email, &password, !no_persist).await?;
            println!(
                "logged in as {} ({})",
                response.profile.user_name, response.profile.tier_code
            );
            if !response.persisted {
                eprintln!("credential was not saved and ends with this process");
            }
        }
        Command::Logout => {
            client.logout().await?;
            println!("logged out");
        }
        Command::Status => match client.credential() {
            Some(credential) => match credential.remaining(Utc::now()) {
                Some(left) => println!(
                    "{} (id {}), expires in {}m{}",
                    credential.profile().user_name,
                    credential.profile().user_id,
                    left.as_secs() / 60,
                    if client.is_admin() { ", admin" } else { "" }
                ),
                None => println!("credential expired at {}", credential.expires_at()),
            },
            None => println!("not logged in"),
        },
        Command::Get { path } => {
            let response = client.send(ApiRequest::get(path)).await?;
            eprintln!("{}", response.status());
            println!("{}", response.text());
        }
        Command::Listen => listen(&client).await?,
    }

    Ok(())
}
