use dynamo_mapper::{
    DerivedKind, LocalIndex, Record, RetryConfig, Table, TableBuilder, Value, WireType,
};
use std::sync::Arc;
use std::time::Duration;

use super::MockStore;

/// Build a record from field/value pairs
#[allow(dead_code)]
pub fn record(pairs: &[(&str, Value)]) -> Record {
    pairs
        .iter()
        .map(|(field, value)| (field.to_string(), value.clone()))
        .collect()
}

/// Retry policy without delays
#[allow(dead_code)]
pub fn no_delay(max_retries: usize) -> RetryConfig {
    RetryConfig {
        max_retries,
        initial_delay: Duration::ZERO,
        max_delay: Duration::ZERO,
    }
}

/// Users table: `id` partition key, numeric `age`, ISO `created`
#[allow(dead_code)]
pub fn users(store: &Arc<MockStore>) -> TableBuilder<Arc<MockStore>> {
    Table::builder("users", store.clone())
        .mapping("id", WireType::S)
        .mapping("age", WireType::N)
        .mapping("created", DerivedKind::IsoDate)
        .key(["id"])
        .retry_config(no_delay(5))
}

/// Forum threads table: `forum` + `subject` key, local index `postIx` on `lastPostTime`
#[allow(dead_code)]
pub fn threads(store: &Arc<MockStore>) -> TableBuilder<Arc<MockStore>> {
    Table::builder("threads", store.clone())
        .mapping("forum", WireType::S)
        .mapping("subject", WireType::S)
        .mapping("lastPostTime", DerivedKind::Timestamp)
        .local_index(LocalIndex::new("postIx", "lastPostTime"))
        .retry_config(no_delay(5))
}
