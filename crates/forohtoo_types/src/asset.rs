use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Whether a registration tracks the wallet's native balance or a specific token mint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssetType {
    Native,
    Token,
}
