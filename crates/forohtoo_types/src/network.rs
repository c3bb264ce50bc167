use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// The chain a registration or transaction is scoped to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Network {
    Mainnet,
    Devnet,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_display_and_from_str() {
        for network in [Network::Mainnet, Network::Devnet] {
            assert_eq!(network.to_string().parse::<Network>().unwrap(), network);
        }
    }

    #[test]
    fn rejects_unknown_network() {
        assert!("testnet".parse::<Network>().is_err());
    }
}
