use std::time::Duration;

use async_trait::async_trait;
use forohtoo_types::RegistrationKey;

use crate::error::ScheduleError;

/// Stands in for the durable timer/cron runtime spec.md §4.4 treats as an
/// external collaborator: something that, given a schedule id and a 4-tuple,
/// keeps invoking a handler on `interval` until told to stop. `forohtoo_node`
/// supplies the concrete `ScheduleHandler` that actually runs a poll cycle.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ScheduleRuntime: Send + Sync {
    async fn create_schedule(
        &self,
        id: String,
        key: RegistrationKey,
        interval: Duration,
    ) -> Result<(), ScheduleError>;

    async fn delete_schedule(&self, id: &str) -> Result<(), ScheduleError>;

    async fn schedule_exists(&self, id: &str) -> Result<bool, ScheduleError>;

    async fn list_schedule_ids(&self) -> Result<Vec<String>, ScheduleError>;
}

/// The side effect a schedule tick performs. Kept separate from
/// `forohtoo_poller` so this crate doesn't need to know about oracles or
/// stores directly — `forohtoo_node` wires a `PollerActivity` in behind this.
#[async_trait]
pub trait ScheduleHandler: Send + Sync {
    async fn run_cycle(&self, key: &RegistrationKey);
}
