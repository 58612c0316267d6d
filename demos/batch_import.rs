/// Example: bulk import with automatic resubmission of unprocessed items
///
/// Batch writes are split into chunks of 25 operations. Whatever the store leaves
/// unprocessed (throttling, capacity limits) is resubmitted with exponential backoff
/// until every chunk settles or the retry ceiling is hit.
///
/// Run against LocalStack with `AWS_PROFILE=localstack cargo run --example batch_import`.
use std::time::Duration;

use dynamo_mapper::{
    BatchLimits, CreateTableOptions, DerivedKind, Error, Record, RetryConfig, Table, Value,
    WireType, aws,
};

fn order(n: i64) -> Record {
    let mut order = Record::new();
    let _ = order.insert("customer".into(), Value::from(format!("customer-{}", n % 7)));
    let _ = order.insert("order".into(), Value::Int(n));
    let _ = order.insert("total".into(), Value::Float(n as f64 * 9.99));
    let _ = order.insert("placed".into(), Value::Date(chrono::Utc::now()));
    order
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let orders = Table::builder("orders", aws::connect().await)
        .mapping("customer", WireType::S)
        .mapping("order", WireType::N)
        .mapping("placed", DerivedKind::IsoDate)
        .batch_limits(BatchLimits {
            concurrency: 4,
            ..Default::default()
        })
        .retry_config(RetryConfig {
            max_retries: 8,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
        })
        .build()?;

    if let Err(err) = orders.create_table(CreateTableOptions::default()).await {
        println!("create_table: {err}");
    }

    let records: Vec<Record> = (0..1_000).map(order).collect();
    match orders.batch_write(records, std::iter::empty::<i64>()).await {
        Ok(output) => println!(
            "wrote 1000 orders in {} chunks, {} resubmissions, {:?}",
            output.chunks, output.retry_count, output.total_duration
        ),
        Err(Error::RetryLimitExceeded { retries, .. }) => {
            eprintln!("gave up after {retries} resubmissions of a chunk");
        }
        Err(err) => return Err(err),
    }

    let found = orders
        .batch_get(
            [("customer-1", 1), ("customer-2", 2)],
            Default::default(),
        )
        .await?;
    println!("read back {} orders", found.len());
    Ok(())
}
