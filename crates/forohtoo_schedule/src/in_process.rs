use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use forohtoo_types::RegistrationKey;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::ScheduleError;
use crate::runtime::{ScheduleHandler, ScheduleRuntime};

/// A schedule backed by a plain `tokio::time::interval` task, keyed by
/// schedule id in a `DashMap`. Good enough for a single-process deployment;
/// a durable cron/workflow runtime would replace this without changing the
/// `ScheduleRuntime` trait.
pub struct InProcessScheduleRuntime<H> {
    handler: Arc<H>,
    tasks: DashMap<String, JoinHandle<()>>,
}

impl<H> InProcessScheduleRuntime<H>
where
    H: ScheduleHandler + 'static,
{
    pub fn new(handler: Arc<H>) -> Self {
        Self { handler, tasks: DashMap::new() }
    }
}

impl<H> Drop for InProcessScheduleRuntime<H> {
    fn drop(&mut self) {
        for entry in self.tasks.iter() {
            entry.value().abort();
        }
    }
}

#[async_trait]
impl<H> ScheduleRuntime for InProcessScheduleRuntime<H>
where
    H: ScheduleHandler + 'static,
{
    async fn create_schedule(
        &self,
        id: String,
        key: RegistrationKey,
        interval: Duration,
    ) -> Result<(), ScheduleError> {
        if let Some((_, old)) = self.tasks.remove(&id) {
            old.abort();
        }
        let handler = self.handler.clone();
        let task_id = id.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                debug!(schedule_id = %task_id, "tick");
                handler.run_cycle(&key).await;
            }
        });
        self.tasks.insert(id, handle);
        Ok(())
    }

    async fn delete_schedule(&self, id: &str) -> Result<(), ScheduleError> {
        if let Some((_, handle)) = self.tasks.remove(id) {
            handle.abort();
        }
        Ok(())
    }

    async fn schedule_exists(&self, id: &str) -> Result<bool, ScheduleError> {
        Ok(self.tasks.contains_key(id))
    }

    async fn list_schedule_ids(&self) -> Result<Vec<String>, ScheduleError> {
        Ok(self.tasks.iter().map(|e| e.key().clone()).collect())
    }
}
