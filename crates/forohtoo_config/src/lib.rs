//! Environment-sourced configuration for the Forohtoo node, loaded once at
//! startup and validated fail-fast (spec.md §6). Every other crate receives
//! an already-validated `ForohtooConfig`; nothing downstream re-checks it.

mod tracing_init;

use std::env;
use std::str::FromStr;

use forohtoo_types::Network;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

pub use tracing_init::init_tracing;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("environment variable {name} has an invalid value {value:?}: {reason}")]
    Invalid { name: &'static str, value: String, reason: String },
    #[error("configuration failed validation: {0}")]
    Validation(#[from] ValidationErrors),
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct PaymentGatewayConfig {
    pub enabled: bool,
    pub service_wallet: Option<String>,
    pub service_network: Option<Network>,
    #[validate(range(min = 1))]
    pub fee_amount: u64,
    #[validate(range(min = 1))]
    pub payment_timeout_secs: u64,
    #[validate(length(min = 1))]
    pub memo_prefix: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct WorkflowRuntimeConfig {
    #[validate(length(min = 1))]
    pub host: String,
    #[validate(length(min = 1))]
    pub namespace: String,
    #[validate(length(min = 1))]
    pub task_queue: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_poll_interval_bounds"))]
pub struct ForohtooConfig {
    #[validate(length(min = 1))]
    pub database_url: String,
    #[validate(length(min = 1))]
    pub message_bus_url: String,
    #[validate(nested)]
    pub workflow_runtime: WorkflowRuntimeConfig,
    #[validate(length(min = 1))]
    pub mainnet_rpc_urls: Vec<String>,
    #[validate(length(min = 1))]
    pub devnet_rpc_urls: Vec<String>,
    #[validate(length(min = 1))]
    pub mainnet_usdc_mint: String,
    #[validate(length(min = 1))]
    pub devnet_usdc_mint: String,
    pub default_poll_interval_secs: u64,
    pub minimum_poll_interval_secs: u64,
    #[validate(length(min = 1))]
    pub log_level: String,
    #[validate(length(min = 1))]
    pub http_bind_addr: String,
    #[validate(nested)]
    pub payment_gateway: PaymentGatewayConfig,
}

fn validate_poll_interval_bounds(config: &ForohtooConfig) -> Result<(), ValidationError> {
    if config.minimum_poll_interval_secs > config.default_poll_interval_secs {
        let mut err = ValidationError::new("poll_interval_bounds");
        err.message = Some("minimum_poll_interval_secs must not exceed default_poll_interval_secs".into());
        return Err(err);
    }
    Ok(())
}

impl ForohtooConfig {
    /// Reads every recognized option from the process environment, applying
    /// the defaults below where a variable is unset, and validates the
    /// result. Called exactly once, from `forohtoo_node::main`.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self {
            database_url: required("FOROHTOO_DATABASE_URL")?,
            message_bus_url: env_or("FOROHTOO_MESSAGE_BUS_URL", "nats://127.0.0.1:4222"),
            workflow_runtime: WorkflowRuntimeConfig {
                host: env_or("FOROHTOO_WORKFLOW_RUNTIME_HOST", "127.0.0.1:7233"),
                namespace: env_or("FOROHTOO_WORKFLOW_RUNTIME_NAMESPACE", "default"),
                task_queue: env_or("FOROHTOO_WORKFLOW_RUNTIME_TASK_QUEUE", "forohtoo-registration"),
            },
            mainnet_rpc_urls: url_list("FOROHTOO_MAINNET_RPC_URLS", "https://api.mainnet-beta.solana.com"),
            devnet_rpc_urls: url_list("FOROHTOO_DEVNET_RPC_URLS", "https://api.devnet.solana.com"),
            mainnet_usdc_mint: env_or(
                "FOROHTOO_MAINNET_USDC_MINT",
                "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
            ),
            devnet_usdc_mint: env_or(
                "FOROHTOO_DEVNET_USDC_MINT",
                "4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU",
            ),
            default_poll_interval_secs: parsed_or("FOROHTOO_DEFAULT_POLL_INTERVAL_SECS", 30)?,
            minimum_poll_interval_secs: parsed_or("FOROHTOO_MINIMUM_POLL_INTERVAL_SECS", 10)?,
            log_level: env_or("FOROHTOO_LOG_LEVEL", "info"),
            http_bind_addr: env_or("FOROHTOO_HTTP_BIND_ADDR", "0.0.0.0:8080"),
            payment_gateway: load_payment_gateway()?,
        };
        config.validate()?;
        Ok(config)
    }
}

fn load_payment_gateway() -> Result<PaymentGatewayConfig, ConfigError> {
    let enabled = parsed_or("FOROHTOO_PAYMENT_GATEWAY_ENABLED", false)?;
    let service_network = match env::var("FOROHTOO_PAYMENT_SERVICE_NETWORK") {
        Ok(raw) => Some(Network::from_str(&raw).map_err(|e| ConfigError::Invalid {
            name: "FOROHTOO_PAYMENT_SERVICE_NETWORK",
            value: raw,
            reason: e.to_string(),
        })?),
        Err(_) => None,
    };
    Ok(PaymentGatewayConfig {
        enabled,
        service_wallet: env::var("FOROHTOO_PAYMENT_SERVICE_WALLET").ok(),
        service_network,
        fee_amount: parsed_or("FOROHTOO_PAYMENT_FEE_AMOUNT", 1_000_000)?,
        payment_timeout_secs: parsed_or("FOROHTOO_PAYMENT_TIMEOUT_SECS", 300)?,
        memo_prefix: env_or("FOROHTOO_PAYMENT_MEMO_PREFIX", "forohtoo-reg-"),
    })
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn env_or(name: &'static str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn url_list(name: &'static str, default: &str) -> Vec<String> {
    match env::var(name) {
        Ok(raw) => raw.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect(),
        Err(_) => vec![default.to_string()],
    }
}

fn parsed_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.parse::<T>().map_err(|e| ConfigError::Invalid {
            name,
            value: raw,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn base_env() -> Vec<(&'static str, &'static str)> {
        vec![("FOROHTOO_DATABASE_URL", "postgres://localhost/forohtoo")]
    }

    #[test]
    fn load_fails_without_required_database_url() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::remove_var("FOROHTOO_DATABASE_URL");
        assert!(matches!(ForohtooConfig::load(), Err(ConfigError::Missing("FOROHTOO_DATABASE_URL"))));
    }

    #[test]
    fn load_succeeds_with_only_the_required_variable_set() {
        let _guard = ENV_LOCK.lock().unwrap();
        for (k, v) in base_env() {
            env::set_var(k, v);
        }
        let config = ForohtooConfig::load().unwrap();
        assert_eq!(config.default_poll_interval_secs, 30);
        assert!(!config.payment_gateway.enabled);
        env::remove_var("FOROHTOO_DATABASE_URL");
    }

    #[test]
    fn rejects_minimum_interval_above_default() {
        let _guard = ENV_LOCK.lock().unwrap();
        for (k, v) in base_env() {
            env::set_var(k, v);
        }
        env::set_var("FOROHTOO_MINIMUM_POLL_INTERVAL_SECS", "999");
        env::set_var("FOROHTOO_DEFAULT_POLL_INTERVAL_SECS", "30");
        let err = ForohtooConfig::load().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        env::remove_var("FOROHTOO_DATABASE_URL");
        env::remove_var("FOROHTOO_MINIMUM_POLL_INTERVAL_SECS");
        env::remove_var("FOROHTOO_DEFAULT_POLL_INTERVAL_SECS");
    }
}
