use forohtoo_storage::{CreateTransactionOutcome, CreateTransactionParams, PgStore, RegistrationFilter, Store};
use forohtoo_types::{AssetType, ConfirmationStatus, Network, RegistrationKey, RegistrationStatus};

fn wallet_key() -> RegistrationKey {
    RegistrationKey::new(bs58::encode([9u8; 32]).into_string(), Network::Devnet, AssetType::Native, None)
        .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn upsert_then_get_round_trips(pool: sqlx::PgPool) -> sqlx::Result<()> {
    let store = PgStore::from_pool(pool);
    let key = wallet_key();
    store.upsert_registration(&key, 30, RegistrationStatus::Active).await.unwrap();

    let fetched = store.get_registration(&key).await.unwrap().unwrap();
    assert_eq!(fetched.key, key);
    assert_eq!(fetched.poll_interval.as_secs(), 30);
    assert_eq!(fetched.status, RegistrationStatus::Active);
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn upsert_is_idempotent_and_updates_interval(pool: sqlx::PgPool) -> sqlx::Result<()> {
    let store = PgStore::from_pool(pool);
    let key = wallet_key();
    store.upsert_registration(&key, 30, RegistrationStatus::Active).await.unwrap();
    store.upsert_registration(&key, 60, RegistrationStatus::Paused).await.unwrap();

    let all = store.list_registrations(RegistrationFilter::default()).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].poll_interval.as_secs(), 60);
    assert_eq!(all[0].status, RegistrationStatus::Paused);
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_transaction_reports_already_exists(pool: sqlx::PgPool) -> sqlx::Result<()> {
    let store = PgStore::from_pool(pool);
    let params = CreateTransactionParams {
        signature: "sig-1".into(),
        network: Network::Devnet,
        wallet_address: bs58::encode([1u8; 32]).into_string(),
        from_address: None,
        slot: 100,
        block_time: chrono::Utc::now(),
        amount: 500,
        token_mint: None,
        memo: None,
        confirmation_status: ConfirmationStatus::Confirmed,
    };
    let first = store.create_transaction(params).await.unwrap();
    assert!(matches!(first, CreateTransactionOutcome::Created(_)));

    let dup = CreateTransactionParams {
        signature: "sig-1".into(),
        network: Network::Devnet,
        wallet_address: bs58::encode([1u8; 32]).into_string(),
        from_address: None,
        slot: 100,
        block_time: chrono::Utc::now(),
        amount: 500,
        token_mint: None,
        memo: None,
        confirmation_status: ConfirmationStatus::Confirmed,
    };
    let second = store.create_transaction(dup).await.unwrap();
    assert!(matches!(second, CreateTransactionOutcome::AlreadyExists));
    Ok(())
}
