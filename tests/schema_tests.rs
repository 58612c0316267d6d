/// Table Lifecycle Tests
///
/// Create, describe, update, delete and list requests.
mod helpers;

use dynamo_mapper::{CreateTableOptions, GlobalIndex, Projection};
use helpers::*;

/// Test the full create request of a table with both index kinds
#[tokio::test]
async fn test_create_table_with_indexes() {
    let store = shared(MockStore::always(json!({
        "TableDescription": {"TableName": "threads", "TableStatus": "CREATING"}
    })));
    let table = threads(&store)
        .global_index(
            GlobalIndex::new("authorIx", "author")
                .sort_key("lastPostTime")
                .projection(Projection::KeysOnly)
                .throughput(2, 3),
        )
        .build()
        .unwrap();

    let options = CreateTableOptions {
        read_capacity: 5,
        write_capacity: 10,
    };
    let description = table.create_table(options).await.unwrap();
    assert_eq!(description.table_name.as_deref(), Some("threads"));
    assert!(!description.is_active());

    let payload = &store.payloads(Operation::CreateTable)[0];
    assert_eq!(
        payload,
        &json!({
            "TableName": "threads",
            "AttributeDefinitions": [
                {"AttributeName": "forum", "AttributeType": "S"},
                {"AttributeName": "subject", "AttributeType": "S"},
                {"AttributeName": "lastPostTime", "AttributeType": "N"},
                {"AttributeName": "author", "AttributeType": "S"}
            ],
            "KeySchema": [
                {"AttributeName": "forum", "KeyType": "HASH"},
                {"AttributeName": "subject", "KeyType": "RANGE"}
            ],
            "LocalSecondaryIndexes": [{
                "IndexName": "postIx",
                "KeySchema": [
                    {"AttributeName": "forum", "KeyType": "HASH"},
                    {"AttributeName": "lastPostTime", "KeyType": "RANGE"}
                ],
                "Projection": {"ProjectionType": "ALL"}
            }],
            "GlobalSecondaryIndexes": [{
                "IndexName": "authorIx",
                "KeySchema": [
                    {"AttributeName": "author", "KeyType": "HASH"},
                    {"AttributeName": "lastPostTime", "KeyType": "RANGE"}
                ],
                "Projection": {"ProjectionType": "KEYS_ONLY"},
                "ProvisionedThroughput": {"ReadCapacityUnits": 2, "WriteCapacityUnits": 3}
            }],
            "ProvisionedThroughput": {"ReadCapacityUnits": 5, "WriteCapacityUnits": 10}
        })
    );
}

/// Test that a table without indexes omits the index lists
#[tokio::test]
async fn test_create_table_without_indexes() {
    let store = shared(MockStore::always(json!({})));
    let table = users(&store).build().unwrap();

    let description = table.create_table(CreateTableOptions::default()).await.unwrap();
    assert!(description.table_name.is_none());

    let payload = &store.payloads(Operation::CreateTable)[0];
    assert!(payload.get("LocalSecondaryIndexes").is_none());
    assert!(payload.get("GlobalSecondaryIndexes").is_none());
    assert_eq!(
        payload["ProvisionedThroughput"],
        json!({"ReadCapacityUnits": 1, "WriteCapacityUnits": 1})
    );
}

/// Test that invalid capacity never reaches the store
#[tokio::test]
async fn test_invalid_throughput() {
    let store = shared(MockStore::always(json!({})));
    let table = users(&store).build().unwrap();

    let options = CreateTableOptions {
        read_capacity: 0,
        write_capacity: 1,
    };
    assert!(table.create_table(options).await.unwrap_err().is_validation_error());
    assert!(table.update_table(1, -1).await.unwrap_err().is_validation_error());
    assert!(store.calls().is_empty());
}

/// Test describe, update and delete requests
#[tokio::test]
async fn test_describe_update_delete() {
    let store = shared(MockStore::new(|operation, _, _| {
        let status = match operation {
            Operation::DescribeTable => "ACTIVE",
            Operation::UpdateTable => "UPDATING",
            _ => "DELETING",
        };
        Ok(json!({
            "TableDescription": {
                "TableName": "users",
                "TableStatus": status,
                "ItemCount": 12,
                "KeySchema": [{"AttributeName": "id", "KeyType": "HASH"}]
            }
        }))
    }));
    let table = users(&store).build().unwrap();

    let described = table.describe_table().await.unwrap();
    assert!(described.is_active());
    assert_eq!(described.item_count, Some(12));
    assert_eq!(described.key_schema[0].attribute_name, "id");

    let updated = table.update_table(4, 8).await.unwrap();
    assert_eq!(updated.table_status.as_deref(), Some("UPDATING"));

    let deleted = table.delete_table().await.unwrap();
    assert_eq!(deleted.table_status.as_deref(), Some("DELETING"));

    let calls = store.calls();
    assert_eq!(calls[0], (Operation::DescribeTable, json!({"TableName": "users"})));
    assert_eq!(
        calls[1],
        (
            Operation::UpdateTable,
            json!({
                "TableName": "users",
                "ProvisionedThroughput": {"ReadCapacityUnits": 4, "WriteCapacityUnits": 8}
            })
        )
    );
    assert_eq!(calls[2], (Operation::DeleteTable, json!({"TableName": "users"})));
}

/// Test that table listing follows pages
#[tokio::test]
async fn test_list_tables() {
    let store = shared(MockStore::new(|_, _, index| {
        Ok(match index {
            0 => json!({"TableNames": ["a", "b"], "LastEvaluatedTableName": "b"}),
            _ => json!({"TableNames": ["c"]}),
        })
    }));
    let table = users(&store).build().unwrap();

    assert_eq!(table.list_tables().await.unwrap(), vec!["a", "b", "c"]);

    let payloads = store.payloads(Operation::ListTables);
    assert_eq!(payloads, vec![json!({}), json!({"ExclusiveStartTableName": "b"})]);
}

/// Test that store errors surface unchanged
#[tokio::test]
async fn test_create_existing_table() {
    let store = shared(MockStore::new(|operation, _, _| {
        Err(dynamo_mapper::TransportError::new(operation, "Table already exists: users")
            .with_code("ResourceInUseException")
            .into())
    }));
    let table = users(&store).build().unwrap();

    let err = table.create_table(CreateTableOptions::default()).await.unwrap_err();
    assert!(err.is_transport_error());
    assert!(!err.is_conditional_check_failed());
}
