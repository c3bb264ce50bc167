use std::time::Duration;

use forohtoo_config::ForohtooConfig;
use forohtoo_schedule::ScheduleRuntime;
use forohtoo_storage::Store;
use forohtoo_types::{AssetType, Network, RegistrationKey, RegistrationStatus};
use tracing::info;

use crate::error::{HttpError, HttpResult};

/// Called once at startup, before the router starts accepting connections
/// (spec.md §4.9 last paragraph): if the payment gateway is enabled, the
/// service must be an active Registration on its own service wallet, or it
/// can never see the payments that gate other registrations.
pub async fn ensure_self_registration(
    config: &ForohtooConfig,
    store: &dyn Store,
    schedule_runtime: &dyn ScheduleRuntime,
) -> HttpResult<()> {
    if !config.payment_gateway.enabled {
        return Ok(());
    }
    let service_wallet = config
        .payment_gateway
        .service_wallet
        .clone()
        .ok_or_else(|| HttpError::Configuration("payment gateway enabled without service_wallet".into()))?;
    let service_network = config
        .payment_gateway
        .service_network
        .ok_or_else(|| HttpError::Configuration("payment gateway enabled without service_network".into()))?;
    let usdc_mint = match service_network {
        Network::Mainnet => config.mainnet_usdc_mint.clone(),
        Network::Devnet => config.devnet_usdc_mint.clone(),
    };
    let key = RegistrationKey::new(service_wallet, service_network, AssetType::Token, Some(usdc_mint))?;
    let interval = Duration::from_secs(config.default_poll_interval_secs);

    store.upsert_registration(&key, interval.as_secs(), RegistrationStatus::Active).await?;
    forohtoo_schedule::upsert(schedule_runtime, key, interval).await?;
    info!("service self-registration ensured");
    Ok(())
}
