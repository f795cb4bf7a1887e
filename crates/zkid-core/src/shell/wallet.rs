//! Wallet connection status for display.
//!
//! Connecting, signing and key management belong to the wallet widget; this
//! side only reads the connected public key.

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::WalletError;

lazy_static! {
    // Base58 alphabet (no 0, O, I, l); 32-byte keys encode to 32-44 characters.
    static ref BASE58_KEY: Regex = Regex::new(r"^[1-9A-HJ-NP-Za-km-z]{32,44}$").unwrap();
}

/// Base58-encoded wallet public key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PublicKey(String);

impl PublicKey {
    pub fn parse(text: &str) -> Result<Self, WalletError> {
        let text = text.trim();
        if BASE58_KEY.is_match(text) {
            Ok(Self(text.to_string()))
        } else {
            Err(WalletError::InvalidPublicKey(text.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First and last four characters, for narrow displays.
    pub fn abbreviated(&self) -> String {
        format!("{}…{}", &self.0[..4], &self.0[self.0.len() - 4..])
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PublicKey {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PublicKey {
    type Error = WalletError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PublicKey> for String {
    fn from(value: PublicKey) -> Self {
        value.0
    }
}

/// Source of wallet connection state.
pub trait WalletConnection {
    /// The connected wallet's public key, `None` when disconnected.
    fn public_key(&self) -> Option<&PublicKey>;
}

/// Connection state fixed at construction (CLI flag, config file, page input).
#[derive(Debug, Clone, Default)]
pub struct StaticWallet {
    key: Option<PublicKey>,
}

impl StaticWallet {
    pub fn connected(key: PublicKey) -> Self {
        Self { key: Some(key) }
    }

    pub fn disconnected() -> Self {
        Self { key: None }
    }

    /// Build from an optional key string; blank strings mean disconnected.
    pub fn from_optional(key: Option<&str>) -> Result<Self, WalletError> {
        match key.map(str::trim).filter(|k| !k.is_empty()) {
            Some(key) => Ok(Self::connected(PublicKey::parse(key)?)),
            None => Ok(Self::disconnected()),
        }
    }
}

impl WalletConnection for StaticWallet {
    fn public_key(&self) -> Option<&PublicKey> {
        self.key.as_ref()
    }
}

/// What the wallet area of the shell shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "public_key", rename_all = "snake_case")]
pub enum WalletStatus {
    Connected(PublicKey),
    Disconnected,
}

impl WalletStatus {
    pub fn of(wallet: &impl WalletConnection) -> Self {
        match wallet.public_key() {
            Some(key) => Self::Connected(key.clone()),
            None => Self::Disconnected,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Connected(key) => format!("Connected: {}", key),
            Self::Disconnected => "Wallet not connected".to_string(),
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const KEY: &str = "4Nd1mBQtrMJVYVfKf2PJy9NZUZdTAsp7D4xWLs4gDB4T";

    #[test]
    fn test_parse_valid_keys() {
        assert!(PublicKey::parse(KEY).is_ok());
        assert!(PublicKey::parse("11111111111111111111111111111111").is_ok());
        assert_eq!(PublicKey::parse(&format!("  {}\n", KEY)).unwrap().as_str(), KEY);
    }

    #[test]
    fn test_parse_rejects_non_base58() {
        let bad_keys = vec![
            "0".to_string(),
            "short".to_string(),
            KEY.replace('4', "0"),
            KEY.replace('N', "O"),
            KEY.replace('d', "l"),
            KEY.replace('D', "I"),
        ];
        for bad in &bad_keys {
            assert!(
                matches!(PublicKey::parse(bad), Err(WalletError::InvalidPublicKey(_))),
                "accepted {}",
                bad
            );
        }
        assert!(PublicKey::parse(&format!("{}{}", KEY, "abc")).is_err());
    }

    #[test]
    fn test_abbreviated() {
        assert_eq!(PublicKey::parse(KEY).unwrap().abbreviated(), "4Nd1…DB4T");
    }

    #[test]
    fn test_status_labels() {
        let connected = StaticWallet::from_optional(Some(KEY)).unwrap();
        assert_eq!(WalletStatus::of(&connected).label(), format!("Connected: {}", KEY));

        let blank = StaticWallet::from_optional(Some("   ")).unwrap();
        assert_eq!(WalletStatus::of(&blank), WalletStatus::Disconnected);
        assert_eq!(WalletStatus::of(&blank).label(), "Wallet not connected");

        assert!(StaticWallet::from_optional(Some("not-a-key")).is_err());
    }
}
