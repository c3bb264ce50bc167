use std::time::Duration;

use forohtoo_metrics::ScheduleMetrics;
use forohtoo_storage::{RegistrationFilter, Store};
use forohtoo_types::{decode_schedule_id, encode_schedule_id, RegistrationKey, RegistrationStatus};
use tracing::{info, warn};

use crate::error::ScheduleError;
use crate::runtime::ScheduleRuntime;

/// Creates the schedule if absent, else deletes and recreates it with the
/// new interval — spec.md §4.4 explicitly allows this policy provided no
/// in-flight tick is lost, which a fresh `tokio::time::interval` guarantees
/// (the next tick simply fires `interval` from now).
pub async fn upsert(
    runtime: &dyn ScheduleRuntime,
    key: RegistrationKey,
    interval: Duration,
) -> Result<String, ScheduleError> {
    let id = encode_schedule_id(&key);
    runtime.create_schedule(id.clone(), key, interval).await?;
    Ok(id)
}

/// Idempotent: deleting an absent schedule is not an error.
pub async fn delete(runtime: &dyn ScheduleRuntime, key: &RegistrationKey) -> Result<(), ScheduleError> {
    let id = encode_schedule_id(key);
    runtime.delete_schedule(&id).await
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub created: u64,
    pub deleted: u64,
}

/// Compares active Registrations against existing schedules and fixes up
/// both directions (spec.md §4.4). Safe to run concurrently with API writes:
/// both `Upsert`/`Delete` and this sweep converge on the same idempotent
/// `create_schedule`/`delete_schedule` primitives.
pub async fn reconcile(
    store: &dyn Store,
    runtime: &dyn ScheduleRuntime,
    metrics: &ScheduleMetrics,
) -> Result<ReconcileOutcome, ScheduleError> {
    let active = store
        .list_registrations(RegistrationFilter { status: Some(RegistrationStatus::Active), network: None })
        .await?;

    let mut desired = std::collections::HashMap::new();
    for registration in &active {
        desired.insert(encode_schedule_id(&registration.key), registration);
    }

    let existing = runtime.list_schedule_ids().await?;
    let mut outcome = ReconcileOutcome::default();

    for id in &existing {
        let is_orphan = match decode_schedule_id(id) {
            Ok(key) => !desired.contains_key(&encode_schedule_id(&key)),
            Err(_) => true,
        };
        if is_orphan {
            warn!(schedule_id = %id, "deleting orphan schedule");
            runtime.delete_schedule(id).await?;
            outcome.deleted += 1;
        }
    }

    let existing: std::collections::HashSet<_> = existing.into_iter().collect();
    for (id, registration) in desired {
        if existing.contains(&id) {
            continue;
        }
        info!(schedule_id = %id, "creating missing schedule");
        runtime.create_schedule(id, registration.key.clone(), registration.poll_interval).await?;
        outcome.created += 1;
    }

    metrics.record_reconcile_run(outcome.created, outcome.deleted);
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use forohtoo_storage::MockStore;
    use forohtoo_types::{AssetType, Network, Registration};

    use super::*;
    use crate::runtime::MockScheduleRuntime;

    fn addr(byte: u8) -> String {
        bs58::encode([byte; 32]).into_string()
    }

    fn active_registration(address: String) -> Registration {
        let key = RegistrationKey::new(address, Network::Devnet, AssetType::Native, None).unwrap();
        Registration {
            key,
            poll_interval: Duration::from_secs(30),
            associated_token_address: None,
            last_poll_time: None,
            status: RegistrationStatus::Active,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn creates_schedule_for_active_registration_with_none_existing() {
        let registration = active_registration(addr(1));
        let expected_id = encode_schedule_id(&registration.key);

        let mut store = MockStore::new();
        let reg_clone = registration.clone();
        store.expect_list_registrations().returning(move |_| Ok(vec![reg_clone.clone()]));

        let mut runtime = MockScheduleRuntime::new();
        runtime.expect_list_schedule_ids().returning(|| Ok(vec![]));
        runtime
            .expect_create_schedule()
            .withf(move |id, _, _| id == &expected_id)
            .returning(|_, _, _| Ok(()));

        let outcome = reconcile(&store, &runtime, &ScheduleMetrics).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome { created: 1, deleted: 0 });
    }

    #[tokio::test]
    async fn deletes_orphan_and_unparseable_schedules() {
        let mut store = MockStore::new();
        store.expect_list_registrations().returning(|_| Ok(vec![]));

        let mut runtime = MockScheduleRuntime::new();
        runtime.expect_list_schedule_ids().returning(|| {
            Ok(vec!["poll-wallet-devnet-stale-native".into(), "garbage-id".into()])
        });
        runtime.expect_delete_schedule().times(2).returning(|_| Ok(()));

        let outcome = reconcile(&store, &runtime, &ScheduleMetrics).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome { created: 0, deleted: 2 });
    }

    #[tokio::test]
    async fn matching_schedule_is_left_untouched() {
        let registration = active_registration(addr(2));
        let id = encode_schedule_id(&registration.key);

        let mut store = MockStore::new();
        let reg_clone = registration.clone();
        store.expect_list_registrations().returning(move |_| Ok(vec![reg_clone.clone()]));

        let mut runtime = MockScheduleRuntime::new();
        let id_clone = id.clone();
        runtime.expect_list_schedule_ids().returning(move || Ok(vec![id_clone.clone()]));
        // No create_schedule/delete_schedule expectation: calling either panics the mock.

        let outcome = reconcile(&store, &runtime, &ScheduleMetrics).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome { created: 0, deleted: 0 });
    }
}
