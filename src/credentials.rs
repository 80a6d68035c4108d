//! Secure credential storage via the OS keychain.
//!
//! At startup, [`populate_env_from_keychain`] copies any stored credentials
//! into environment variables so the existing config flow picks them up
//! transparently. Values already set in the environment win.

use tracing::{debug, warn};
use zeroize::Zeroizing;

/// Keychain service name used for all stored credentials.
const SERVICE: &str = "rsiwatch";

/// Known credential keys managed by this module.
#[derive(Clone, Copy, Debug)]
pub enum CredentialKey {
    TelegramBotToken,
}

impl CredentialKey {
    /// Returns the keychain entry identifier.
    pub fn keyring_id(self) -> &'static str {
        match self {
            Self::TelegramBotToken => "telegram_bot_token",
        }
    }

    /// Returns the environment variable name for this credential.
    pub fn env_var(self) -> &'static str {
        match self {
            Self::TelegramBotToken => "TELEGRAM_BOT_TOKEN",
        }
    }

    /// All credential keys.
    pub const ALL: [CredentialKey; 1] = [Self::TelegramBotToken];
}

/// Loads a credential from the keychain, returning `None` if not set.
pub fn load(key: CredentialKey) -> Option<Zeroizing<String>> {
    let entry = keyring::Entry::new(SERVICE, key.keyring_id()).ok()?;
    match entry.get_password() {
        Ok(password) => Some(Zeroizing::new(password)),
        Err(keyring::Error::NoEntry) => None,
        Err(e) => {
            warn!(key = key.keyring_id(), error = %e, "failed to read keychain entry");
            None
        }
    }
}

/// Populates environment variables from the keychain for any
/// credentials not already set in the environment.
///
/// Call this at startup before [`crate::config::fetch_config`].
pub fn populate_env_from_keychain() {
    populate_env_with(load);
}

/// Copies credentials from `lookup` into unset environment variables.
/// A variable already present in the environment is left alone and
/// `lookup` is not consulted for it.
fn populate_env_with(lookup: impl Fn(CredentialKey) -> Option<Zeroizing<String>>) {
    for key in CredentialKey::ALL {
        if std::env::var_os(key.env_var()).is_some() {
            debug!(key = key.env_var(), "credential already set in environment");
            continue;
        }
        let Some(value) = lookup(key) else {
            continue;
        };
        debug!(key = key.env_var(), "loaded credential from keychain");
        // SAFETY: called before the monitor spawns any tasks.
        unsafe {
            std::env::set_var(key.env_var(), value.as_str());
        }
    }
}
