//! Subscriber sources.
//!
//! The monitor only reads subscribers; adding, editing and removing them is
//! the job of whatever chat front-end owns the records.

use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::Result;
use crate::config::{SubscriberDefaults, split_pairs};
use crate::error::RsiwatchError;
use crate::models::Subscriber;

/// Supplies the current set of subscribers, keyed by id.
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    async fn list_subscribers(&self) -> Result<BTreeMap<String, Subscriber>>;
}

/// A fixed, in-memory subscriber set.
#[derive(Debug, Default)]
pub struct StaticSubscriberStore {
    subscribers: BTreeMap<String, Subscriber>,
}

impl StaticSubscriberStore {
    pub fn new(subscribers: impl IntoIterator<Item = Subscriber>) -> Self {
        Self {
            subscribers: subscribers
                .into_iter()
                .map(|s| (s.id.clone(), s))
                .collect(),
        }
    }
}

#[async_trait]
impl SubscriberStore for StaticSubscriberStore {
    async fn list_subscribers(&self) -> Result<BTreeMap<String, Subscriber>> {
        Ok(self.subscribers.clone())
    }
}

/// One record of the subscriber file. Missing fields take the configured defaults.
#[derive(Debug, Deserialize)]
struct SubscriberRecord {
    #[serde(default)]
    pairs: Option<Vec<String>>,
    #[serde(default)]
    interval: Option<String>,
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default)]
    alert_frequency: Option<u64>,
}

impl SubscriberRecord {
    fn into_subscriber(self, id: String, defaults: &SubscriberDefaults) -> Subscriber {
        let instruments = self
            .pairs
            .map(|pairs| split_pairs(&pairs.join(",")))
            .unwrap_or_else(|| defaults.pairs.clone());

        Subscriber {
            id,
            instruments,
            timeframe: self.interval.unwrap_or_else(|| defaults.timeframe.clone()),
            timezone: self.timezone.unwrap_or_else(|| defaults.timezone.clone()),
            repeat_frequency_minutes: self
                .alert_frequency
                .unwrap_or(defaults.repeat_frequency_minutes),
        }
    }
}

/// Parses a subscriber file body: a JSON object mapping chat id to record.
///
/// # Errors
///
/// Returns [`RsiwatchError::Json`] if the body is not a valid subscriber map.
pub fn parse_subscribers(
    json: &str,
    defaults: &SubscriberDefaults,
) -> Result<BTreeMap<String, Subscriber>> {
    let records: HashMap<String, SubscriberRecord> = serde_json::from_str(json)?;
    Ok(records
        .into_iter()
        .map(|(id, record)| {
            let subscriber = record.into_subscriber(id.clone(), defaults);
            (id, subscriber)
        })
        .collect())
}

/// Reads subscribers from a JSON file on every call, so edits made by the
/// chat front-end are picked up on the next cycle.
#[derive(Debug)]
pub struct JsonSubscriberStore {
    path: PathBuf,
    defaults: SubscriberDefaults,
}

impl JsonSubscriberStore {
    pub fn new(path: impl Into<PathBuf>, defaults: SubscriberDefaults) -> Self {
        Self {
            path: path.into(),
            defaults,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SubscriberStore for JsonSubscriberStore {
    async fn list_subscribers(&self) -> Result<BTreeMap<String, Subscriber>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no subscriber file yet");
                return Ok(BTreeMap::new());
            }
            Err(e) => {
                return Err(RsiwatchError::Io(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };

        parse_subscribers(&contents, &self.defaults)
    }
}
