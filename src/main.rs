use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

use rsiwatch::RsiwatchError;
use rsiwatch::config::fetch_config;
use rsiwatch::credentials::populate_env_from_keychain;
use rsiwatch::kraken::KrakenOhlcProvider;
use rsiwatch::monitor::{Monitor, StatusRequest};
use rsiwatch::notifier::{LogNotifier, Notifier};
use rsiwatch::subscribers::JsonSubscriberStore;
use rsiwatch::telegram::TelegramNotifier;

#[tokio::main]
async fn main() -> Result<(), RsiwatchError> {
    // Initialize tracing subscriber for logging output.
    tracing_subscriber::fmt::init();

    populate_env_from_keychain();
    let app_config = fetch_config()?;
    debug!(?app_config, "loaded configuration");

    let provider = Arc::new(KrakenOhlcProvider::new(&app_config.kraken.rest_url)?);
    let store = Arc::new(JsonSubscriberStore::new(
        app_config.monitor.subscribers_file.clone(),
        app_config.defaults.clone(),
    ));
    let notifier: Arc<dyn Notifier> = match app_config.telegram.bot_token {
        Some(token) => Arc::new(TelegramNotifier::new(token)?),
        None => {
            info!("TELEGRAM_BOT_TOKEN not set, alerts will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let (status_tx, status_rx) = mpsc::channel(32);
    spawn_status_console(status_tx);

    info!(
        subscribers_file = %store.path().display(),
        "RSI signal monitor starting"
    );
    let monitor = Monitor::new(
        provider,
        store,
        notifier,
        app_config.strategy,
        app_config.monitor.cycle_interval,
    );
    monitor.run(status_rx).await
}

/// Reads subscriber ids from stdin, one per line, and requests a status
/// reply for each.
fn spawn_status_console(tx: mpsc::Sender<StatusRequest>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let subscriber_id = line.trim();
            if subscriber_id.is_empty() {
                continue;
            }
            let request = StatusRequest {
                subscriber_id: subscriber_id.to_string(),
            };
            if tx.send(request).await.is_err() {
                break;
            }
        }
    });
}
