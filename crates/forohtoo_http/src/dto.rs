use forohtoo_types::{AssetType, Network};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Matches `forohtoo_types::address::{MIN,MAX}_ADDRESS_LEN`; kept as literals
/// since `validator`'s derive attributes require compile-time literals.
const MIN_ADDRESS_LEN: u64 = 32;
const MAX_ADDRESS_LEN: u64 = 44;

#[derive(Debug, Deserialize, Validate)]
pub struct AssetDto {
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub token_mint: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateWalletAssetRequest {
    #[validate(length(min = "MIN_ADDRESS_LEN", max = "MAX_ADDRESS_LEN"))]
    pub address: String,
    pub network: Network,
    #[validate(nested)]
    pub asset: AssetDto,
    #[validate(range(min = 1))]
    pub poll_interval: u64,
}

#[derive(Debug, Deserialize)]
pub struct DeleteWalletAssetQuery {
    pub network: Network,
    pub asset_type: AssetType,
    pub token_mint: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WalletAssetsByAddressQuery {
    pub network: Network,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ListTransactionsQuery {
    pub wallet_address: String,
    pub network: Network,
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    pub lookback: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct RegistrationStatusResponse {
    pub status: forohtoo_types::PaymentWorkflowStatus,
    pub payment_signature: Option<String>,
    pub error: Option<String>,
}
