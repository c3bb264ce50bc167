use std::str::FromStr;

use crate::asset::AssetType;
use crate::network::Network;
use crate::registration::RegistrationKey;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("schedule id {0:?} does not match the \"poll-wallet-{{network}}-{{address}}-{{asset}}\" grammar")]
pub struct ScheduleIdError(String);

/// Encodes the schedule-plane identity of a Registration per spec.md §3/§6:
/// `poll-wallet-{network}-{address}-{"native"|"token"-{mint}}`. Neither the
/// base58 address alphabet nor the network/asset tokens contain `-`, so the
/// grammar round-trips through a plain split.
pub fn encode_schedule_id(key: &RegistrationKey) -> String {
    match (&key.asset_type, &key.token_mint) {
        (AssetType::Native, _) => format!("poll-wallet-{}-{}-native", key.network, key.address),
        (AssetType::Token, Some(mint)) => {
            format!("poll-wallet-{}-{}-token-{}", key.network, key.address, mint)
        }
        (AssetType::Token, None) => unreachable!("RegistrationKey enforces mint presence for token"),
    }
}

/// Parses a schedule id back into the 4-tuple it names. Per spec.md §4.4,
/// anything that fails to parse is treated as an orphan by the caller, not a
/// hard error, so the caller only needs `Result` to tell the two cases apart.
pub fn decode_schedule_id(id: &str) -> Result<RegistrationKey, ScheduleIdError> {
    let rest = id
        .strip_prefix("poll-wallet-")
        .ok_or_else(|| ScheduleIdError(id.to_string()))?;
    let parts: Vec<&str> = rest.split('-').collect();
    let key = match parts.as_slice() {
        [network, address, "native"] => RegistrationKey {
            address: (*address).to_string(),
            network: Network::from_str(network).map_err(|_| ScheduleIdError(id.to_string()))?,
            asset_type: AssetType::Native,
            token_mint: None,
        },
        [network, address, "token", mint] => RegistrationKey {
            address: (*address).to_string(),
            network: Network::from_str(network).map_err(|_| ScheduleIdError(id.to_string()))?,
            asset_type: AssetType::Token,
            token_mint: Some((*mint).to_string()),
        },
        _ => return Err(ScheduleIdError(id.to_string())),
    };
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> String {
        bs58::encode([byte; 32]).into_string()
    }

    #[test]
    fn round_trips_native() {
        let key = RegistrationKey::new(addr(1), Network::Devnet, AssetType::Native, None).unwrap();
        let id = encode_schedule_id(&key);
        assert_eq!(decode_schedule_id(&id).unwrap(), key);
    }

    #[test]
    fn round_trips_token() {
        let key =
            RegistrationKey::new(addr(1), Network::Mainnet, AssetType::Token, Some(addr(2))).unwrap();
        let id = encode_schedule_id(&key);
        assert_eq!(decode_schedule_id(&id).unwrap(), key);
    }

    #[test]
    fn unparseable_ids_are_orphans() {
        assert!(decode_schedule_id("not-a-schedule-id").is_err());
        assert!(decode_schedule_id("poll-wallet-mainnet-short-native").is_ok());
        assert!(decode_schedule_id("poll-wallet-testnet-addr-native").is_err());
    }
}
