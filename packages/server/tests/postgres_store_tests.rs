//! Integration tests for the Postgres-backed store.

mod common;

use std::sync::Arc;

use chrono::Duration;
use common::{seed_match, t0, TestHarness};
use serde_json::json;
use server_core::domains::matching::actions::complete_match;
use server_core::domains::matching::{MatchRecord, MatchStatus, PairingHistoryEntry};
use server_core::kernel::store::{load_collection, update_collection, HISTORY_KEY, MATCHES_KEY};
use server_core::kernel::BaseStore;
use test_context::test_context;

#[test_context(TestHarness)]
#[tokio::test]
async fn missing_keys_read_as_none(ctx: &TestHarness) {
    let store = ctx.store();

    assert!(store.get(MATCHES_KEY).await.unwrap().is_none());
    store.ping().await.unwrap();
}

#[test_context(TestHarness)]
#[tokio::test]
async fn set_overwrites_existing_value(ctx: &TestHarness) {
    let store = ctx.store();

    store.set(HISTORY_KEY, json!([])).await.unwrap();
    store.set(HISTORY_KEY, json!([{"pair": ["U1", "U2"], "timestamp": 0}])).await.unwrap();

    let value = store.get(HISTORY_KEY).await.unwrap().unwrap();
    assert_eq!(value.as_array().map(Vec::len), Some(1));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn match_lifecycle_round_trips(ctx: &TestHarness) {
    let store = ctx.store();
    let record = seed_match(&store, "G1", MatchStatus::Pending, t0()).await;

    let loaded = MatchRecord::find_by_id(&record.id, &store)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded, record);

    MatchRecord::advance_status(&record.id, MatchStatus::FollowedUp, &store)
        .await
        .unwrap();
    complete_match(&record.id, &store).await.unwrap();

    assert!(MatchRecord::find_active(&store).await.unwrap().is_empty());
    assert_eq!(MatchRecord::find_all(&store).await.unwrap().len(), 1);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn history_expiry_against_postgres(ctx: &TestHarness) {
    let store = ctx.store();
    PairingHistoryEntry::new("U1", "U2", t0() - Duration::days(181))
        .unwrap()
        .record(&store)
        .await
        .unwrap();
    PairingHistoryEntry::new("U3", "U4", t0() - Duration::days(1))
        .unwrap()
        .record(&store)
        .await
        .unwrap();

    let removed = PairingHistoryEntry::delete_expired(Duration::days(180), t0(), &store)
        .await
        .unwrap();
    assert_eq!(removed, 1);

    let remaining = PairingHistoryEntry::find_all(&store).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert!(remaining[0].involves("U4", "U3"));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn concurrent_updates_do_not_lose_writes(ctx: &TestHarness) {
    let store: Arc<dyn BaseStore> = Arc::new(ctx.store());

    let mut handles = Vec::new();
    for i in 0..20 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            update_collection(store.as_ref(), HISTORY_KEY, move |items: &mut Vec<i64>| {
                items.push(i)
            })
            .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let mut items: Vec<i64> = load_collection(store.as_ref(), HISTORY_KEY).await.unwrap();
    items.sort();
    assert_eq!(items, (0..20).collect::<Vec<_>>());
}
