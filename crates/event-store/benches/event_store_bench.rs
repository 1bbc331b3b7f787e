use common::AccountId;
use criterion::{Criterion, criterion_group, criterion_main};
use event_store::{EventEnvelope, EventStore, InMemoryEventStore, Version};

fn make_envelope(account_id: &AccountId, version: i64) -> EventEnvelope {
    EventEnvelope::builder()
        .account_id(account_id.clone())
        .operator_id("op-bench")
        .event_type("BalanceChanged")
        .version(Version::new(version))
        .payload_raw(serde_json::json!({"amount": "1.00", "transaction_id": "TX-bench"}))
        .build()
}

fn bench_append(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("event_store/append_single", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryEventStore::new();
                let account_id = AccountId::new("ACC-BENCH");
                store
                    .append(
                        &account_id,
                        Version::initial(),
                        vec![make_envelope(&account_id, 1)],
                    )
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_read_history(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();
    let account_id = AccountId::new("ACC-BENCH");

    rt.block_on(async {
        let events: Vec<_> = (1..=500).map(|v| make_envelope(&account_id, v)).collect();
        store
            .append(&account_id, Version::initial(), events)
            .await
            .unwrap();
    });

    c.bench_function("event_store/read_500_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                let events = store.read_all_events(&account_id).await.unwrap();
                assert_eq!(events.len(), 500);
            });
        });
    });
}

criterion_group!(benches, bench_append, bench_read_history);
criterion_main!(benches);
