use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::address::{validate_address, AddressError};
use crate::asset::AssetType;
use crate::ata::derive_associated_token_account;
use crate::network::Network;

pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] AddressError),
    #[error("asset type \"native\" must not carry a token_mint")]
    NativeWithMint,
    #[error("asset type \"token\" requires a non-empty token_mint")]
    TokenWithoutMint,
    #[error(
        "poll_interval {given:?} is outside the allowed range [{min:?}, {max:?}]",
        min = MIN_POLL_INTERVAL,
        max = MAX_POLL_INTERVAL
    )]
    PollIntervalOutOfRange { given: Duration },
}

/// The logical identity of a monitored triple: `(address, network, asset_type, token_mint)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistrationKey {
    pub address: String,
    pub network: Network,
    pub asset_type: AssetType,
    pub token_mint: Option<String>,
}

impl RegistrationKey {
    pub fn new(
        address: impl Into<String>,
        network: Network,
        asset_type: AssetType,
        token_mint: Option<String>,
    ) -> Result<Self, RegistrationError> {
        let address = address.into();
        validate_address(&address)?;
        match (asset_type, &token_mint) {
            (AssetType::Native, Some(_)) => return Err(RegistrationError::NativeWithMint),
            (AssetType::Token, None) => return Err(RegistrationError::TokenWithoutMint),
            (AssetType::Token, Some(mint)) => validate_address(mint)?,
            (AssetType::Native, None) => {}
        }
        Ok(Self { address, network, asset_type, token_mint })
    }

    /// The address the poller should actually read from the oracle: the wallet
    /// address itself for native assets, the associated token account for
    /// tokens. Mirrors `associated_token_address`, recomputed on demand.
    pub fn poll_address(&self) -> String {
        match &self.token_mint {
            Some(mint) => derive_associated_token_account(&self.address, mint),
            None => self.address.clone(),
        }
    }

    pub fn associated_token_address(&self) -> Option<String> {
        self.token_mint
            .as_ref()
            .map(|mint| derive_associated_token_account(&self.address, mint))
    }
}

impl fmt::Display for RegistrationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.token_mint {
            Some(mint) => write!(f, "{}/{}/{}/{}", self.network, self.address, self.asset_type, mint),
            None => write!(f, "{}/{}/{}", self.network, self.address, self.asset_type),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Active,
    Paused,
    Error,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    #[serde(flatten)]
    pub key: RegistrationKey,
    #[serde(with = "duration_secs")]
    pub poll_interval: Duration,
    pub associated_token_address: Option<String>,
    pub last_poll_time: Option<DateTime<Utc>>,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Registration {
    pub fn validate_poll_interval(interval: Duration) -> Result<Duration, RegistrationError> {
        if interval < MIN_POLL_INTERVAL || interval > MAX_POLL_INTERVAL {
            return Err(RegistrationError::PollIntervalOutOfRange { given: interval });
        }
        Ok(interval)
    }

    /// Clamps an operator- or caller-supplied interval into the allowed range,
    /// per spec.md §4.9's validation rule, rather than rejecting it outright.
    pub fn clamp_poll_interval(interval: Duration) -> Duration {
        interval.clamp(MIN_POLL_INTERVAL, MAX_POLL_INTERVAL)
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        d.as_secs().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> String {
        bs58::encode([byte; 32]).into_string()
    }

    #[test]
    fn native_key_requires_no_mint() {
        let key = RegistrationKey::new(addr(1), Network::Mainnet, AssetType::Native, None).unwrap();
        assert_eq!(key.associated_token_address(), None);
        assert_eq!(key.poll_address(), key.address);
    }

    #[test]
    fn native_key_rejects_a_mint() {
        let err = RegistrationKey::new(addr(1), Network::Mainnet, AssetType::Native, Some(addr(2)));
        assert!(matches!(err, Err(RegistrationError::NativeWithMint)));
    }

    #[test]
    fn token_key_requires_a_mint() {
        let err = RegistrationKey::new(addr(1), Network::Mainnet, AssetType::Token, None);
        assert!(matches!(err, Err(RegistrationError::TokenWithoutMint)));
    }

    #[test]
    fn token_key_derives_a_stable_ata() {
        let key =
            RegistrationKey::new(addr(1), Network::Mainnet, AssetType::Token, Some(addr(2))).unwrap();
        let ata = key.associated_token_address().unwrap();
        assert_eq!(key.poll_address(), ata);
        assert_eq!(key.associated_token_address(), Some(ata));
    }

    #[test]
    fn poll_interval_is_clamped_not_rejected() {
        assert_eq!(Registration::clamp_poll_interval(Duration::from_secs(1)), MIN_POLL_INTERVAL);
        assert_eq!(
            Registration::clamp_poll_interval(Duration::from_secs(u64::MAX)),
            MAX_POLL_INTERVAL
        );
    }
}
