/// Query Tests
///
/// Pagination, counting, streaming and index routing of queries.
mod helpers;

use dynamo_mapper::{Condition, ConditionSet, Cursor, QueryOptions, Value};
use futures_util::TryStreamExt;
use helpers::*;

fn thread(subject: &str) -> Json {
    json!({"forum": {"S": "rust"}, "subject": {"S": subject}})
}

/// Two pages: the first with a cursor, the second without
fn two_pages(_: Operation, _: &Json, index: usize) -> Result<Json, Error> {
    Ok(match index {
        0 => json!({
            "Items": [thread("a"), thread("b")],
            "Count": 2,
            "ScannedCount": 2,
            "LastEvaluatedKey": thread("b")
        }),
        _ => json!({"Items": [thread("c")], "Count": 1, "ScannedCount": 1}),
    })
}

fn in_forum() -> ConditionSet {
    let mut conditions = ConditionSet::new();
    let _ = conditions.insert("forum".into(), Condition::eq("rust"));
    conditions
}

/// Test that a query follows the cursor to the last page
#[tokio::test]
async fn test_query_follows_cursor() {
    let store = shared(MockStore::new(two_pages));
    let table = threads(&store).build().unwrap();

    let items = table.query(&in_forum(), QueryOptions::default()).await.unwrap();
    let subjects: Vec<_> = items.iter().map(|item| item["subject"].clone()).collect();
    assert_eq!(subjects, vec![Value::from("a"), "b".into(), "c".into()]);

    let payloads = store.payloads(Operation::Query);
    assert_eq!(payloads.len(), 2);
    assert_eq!(
        payloads[0],
        json!({
            "TableName": "threads",
            "KeyConditions": {
                "forum": {"ComparisonOperator": "EQ", "AttributeValueList": [{"S": "rust"}]}
            }
        })
    );
    assert_eq!(payloads[1]["ExclusiveStartKey"], thread("b"));
}

/// Test that count queries return a bare number
#[tokio::test]
async fn test_query_count() {
    let store = shared(MockStore::always(json!({"Count": 7, "ScannedCount": 9})));
    let table = threads(&store).build().unwrap();

    let count = table.query_count(&in_forum(), QueryOptions::default()).await.unwrap();
    assert_eq!(count, 7);

    let payloads = store.payloads(Operation::Query);
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0]["Select"], "COUNT");
}

/// Test that a satisfied limit stops pagination
#[tokio::test]
async fn test_query_limit_stops_pagination() {
    let store = shared(MockStore::new(two_pages));
    let table = threads(&store).build().unwrap();

    let options = QueryOptions {
        limit: Some(2),
        ..Default::default()
    };
    let items = table.query(&in_forum(), options).await.unwrap();
    assert_eq!(items.len(), 2);

    let payloads = store.payloads(Operation::Query);
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0]["Limit"], 2);
}

/// Test the page ceiling
#[tokio::test]
async fn test_query_page_limit() {
    let store = shared(MockStore::always(json!({
        "Items": [thread("a")],
        "Count": 1,
        "LastEvaluatedKey": thread("a")
    })));
    let table = threads(&store).max_pages(3).build().unwrap();

    let err = table.query(&in_forum(), QueryOptions::default()).await.unwrap_err();
    assert!(matches!(
        err,
        Error::PageLimitExceeded {
            operation: Operation::Query,
            max_pages: 3
        }
    ));
    assert_eq!(store.calls().len(), 3);
}

/// Test single page access with manual cursor threading
#[tokio::test]
async fn test_query_page() {
    let store = shared(MockStore::new(two_pages));
    let table = threads(&store).build().unwrap();

    let first = table.query_page(&in_forum(), QueryOptions::default()).await.unwrap();
    assert_eq!(first.items.len(), 2);
    assert_eq!(first.count, 2);
    assert_eq!(first.cursor, Some(Cursor::new(thread("b"))));

    let options = QueryOptions {
        exclusive_start_key: first.cursor,
        ..Default::default()
    };
    let second = table.query_page(&in_forum(), options).await.unwrap();
    assert_eq!(second.items.len(), 1);
    assert!(second.cursor.is_none());

    assert_eq!(store.payloads(Operation::Query)[1]["ExclusiveStartKey"], thread("b"));
}

/// Test streaming records across pages
#[tokio::test]
async fn test_query_stream() {
    let store = shared(MockStore::new(two_pages));
    let table = threads(&store).build().unwrap();

    let items: Vec<_> = table
        .query_stream(&in_forum(), QueryOptions::default())
        .try_collect()
        .await
        .unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(store.calls().len(), 2);
}

/// Test that a local index is picked from its sort key
#[tokio::test]
async fn test_query_routes_local_index() {
    let store = shared(MockStore::always(json!({"Count": 0})));
    let table = threads(&store).build().unwrap();

    let mut conditions = in_forum();
    let _ = conditions.insert(
        "lastPostTime".into(),
        Condition::compare(">", 1_700_000_000_000_i64),
    );
    let _ = table.query(&conditions, QueryOptions::default()).await.unwrap();

    let payload = &store.payloads(Operation::Query)[0];
    assert_eq!(payload["IndexName"], "postIx");
    assert_eq!(
        payload["KeyConditions"]["lastPostTime"],
        json!({"ComparisonOperator": "GT", "AttributeValueList": [{"N": "1700000000000"}]})
    );
}

/// Test that an explicit index name wins over routing
#[tokio::test]
async fn test_query_explicit_index() {
    let store = shared(MockStore::always(json!({"Count": 0})));
    let table = threads(&store).build().unwrap();

    let mut conditions = in_forum();
    let _ = conditions.insert("lastPostTime".into(), Condition::between(1, 5));
    let options = QueryOptions {
        index_name: Some("otherIx".into()),
        scan_index_forward: Some(false),
        ..Default::default()
    };
    let _ = table.query(&conditions, options).await.unwrap();

    let payload = &store.payloads(Operation::Query)[0];
    assert_eq!(payload["IndexName"], "otherIx");
    assert_eq!(payload["ScanIndexForward"], false);
}

/// Test that a query without conditions is rejected
#[tokio::test]
async fn test_query_needs_conditions() {
    let store = shared(MockStore::always(json!({})));
    let table = threads(&store).build().unwrap();

    let err = table
        .query(&ConditionSet::new(), QueryOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_validation_error());
    assert!(store.calls().is_empty());
}
