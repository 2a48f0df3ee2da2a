use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_PIN;

pub const PIN_LENGTH: usize = 4;

/// Per-install settings stored next to the domain collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub pin: Option<String>,
}

impl Settings {
    /// The PIN that unlocks the app: the stored one, else the default.
    pub fn effective_pin(&self) -> &str {
        self.pin.as_deref().unwrap_or(DEFAULT_PIN)
    }
}

/// A PIN is exactly four ASCII digits.
pub fn is_valid_pin(pin: &str) -> bool {
    pin.len() == PIN_LENGTH && pin.bytes().all(|b| b.is_ascii_digit())
}
