use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::network::Network;

/// USDC's fixed decimal precision on both supported networks.
pub const USDC_DECIMALS: u32 = 6;

#[derive(Clone, Debug)]
pub struct InvoiceParams {
    pub id: String,
    pub pay_to_address: String,
    pub network: Network,
    pub usdc_mint: String,
    pub amount: u64,
    pub memo: String,
    pub timeout_secs: u64,
    pub created_at: DateTime<Utc>,
}

/// The payment-plane artifact handed back to a caller whose registration
/// requires payment. `id` is the address being registered, which is what
/// makes re-requesting the same invoice idempotent (spec.md §3).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub pay_to_address: String,
    pub network: Network,
    pub usdc_mint: String,
    pub amount: u64,
    pub amount_usdc: f64,
    pub memo: String,
    pub expires_at: DateTime<Utc>,
    pub timeout: u64,
    pub status_url: String,
    pub payment_url: String,
    pub qr_code_data: String,
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    /// Builds every derived display field from the raw payment parameters.
    /// `status_url` is relative to the caller's own host, so it is supplied
    /// by the HTTP layer rather than computed here.
    pub fn new(params: InvoiceParams, status_url: String, qr_code_data: String) -> Self {
        let amount_usdc = params.amount as f64 / 10f64.powi(USDC_DECIMALS as i32);
        let payment_url = format!(
            "solana:{recipient}?amount={amount}&spl-token={mint}&memo={memo}&label=Forohtoo&message=Wallet+registration+payment",
            recipient = params.pay_to_address,
            amount = amount_usdc,
            mint = params.usdc_mint,
            memo = params.memo,
        );
        let expires_at = params.created_at + chrono::Duration::seconds(params.timeout_secs as i64);
        Self {
            id: params.id,
            pay_to_address: params.pay_to_address,
            network: params.network,
            usdc_mint: params.usdc_mint,
            amount: params.amount,
            amount_usdc,
            memo: params.memo,
            expires_at,
            timeout: params.timeout_secs,
            status_url,
            payment_url,
            qr_code_data,
            created_at: params.created_at,
        }
    }

    pub fn has_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> InvoiceParams {
        InvoiceParams {
            id: "wallet-addr".into(),
            pay_to_address: "service-wallet".into(),
            network: Network::Mainnet,
            usdc_mint: "usdc-mint".into(),
            amount: 1_000_000,
            memo: "forohtoo-reg-wallet-addr".into(),
            timeout_secs: 300,
            created_at: DateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn converts_base_units_to_decimal_usdc() {
        let invoice = Invoice::new(params(), "https://x/status".into(), "".into());
        assert_eq!(invoice.amount_usdc, 1.0);
    }

    #[test]
    fn payment_url_carries_memo_and_mint() {
        let invoice = Invoice::new(params(), "https://x/status".into(), "".into());
        assert!(invoice.payment_url.contains("spl-token=usdc-mint"));
        assert!(invoice.payment_url.contains("memo=forohtoo-reg-wallet-addr"));
    }

    #[test]
    fn expiry_is_created_at_plus_timeout() {
        let invoice = Invoice::new(params(), "https://x/status".into(), "".into());
        assert!(invoice.has_expired(invoice.expires_at));
        assert!(!invoice.has_expired(invoice.created_at));
    }
}
