//! [`StoreClient`] over the official AWS SDK.
//!
//! Each request payload is parsed into its typed form, sent through the SDK's fluent
//! builders and the SDK output is turned back into DynamoDB JSON. Attribute kinds the
//! mapper does not support (`BOOL`, `NULL`, `L`, `M`) are passed through as is, so
//! decoding them fails with [`Error::UnknownWireType`].

use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::error::ProvideErrorMetadata;
use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::{self as sdk, AttributeValue};
use aws_smithy_runtime_api::client::result::SdkError;
use aws_smithy_runtime_api::http::Response;
use aws_types::sdk_config::{RetryConfig, TimeoutConfig};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as Json, json};
use std::collections::{BTreeMap, HashMap};
use std::error::Error as StdError;
use std::time::Duration;

use crate::client::{Operation, Payload, StoreClient};
use crate::error::{Error, TransportError};
use crate::wire::{
    self, AttributeUpdate, BatchGetItemInput, BatchGetItemOutput, BatchWriteItemInput,
    BatchWriteItemOutput, CreateTableInput, Cursor, DeleteItemInput, GetItemInput, GetItemOutput,
    Item, KeyType, ListOutput, ListTablesInput, ListTablesOutput, ProjectionType, PutItemInput,
    QueryInput, RawItem, ScanInput, Select, TableNameInput, TableOutput, UpdateAction,
    UpdateItemInput, UpdateTableInput, WireAttribute, WireCondition, WireConditions,
    WireProjection, WireType, WriteOutput,
};

type SdkItem = HashMap<String, AttributeValue>;

/// Load the AWS configuration with the crate defaults
///
/// - Adaptive retry mode with 3 max attempts
/// - Exponential backoff starting at 1 second
/// - Connect timeout: 3 seconds
/// - Read timeout: 20 seconds
/// - Operation timeout: 60 seconds
/// - LocalStack support via `AWS_PROFILE=localstack`
pub async fn config_defaults() -> SdkConfig {
    let timeout_config = TimeoutConfig::builder()
        .connect_timeout(Duration::from_secs(3))
        .read_timeout(Duration::from_secs(20))
        .operation_timeout(Duration::from_secs(60))
        .build();

    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .retry_config(
            RetryConfig::adaptive()
                .with_max_attempts(3)
                .with_initial_backoff(Duration::from_secs(1)),
        )
        .timeout_config(timeout_config);

    if std::env::var("AWS_PROFILE").unwrap_or_default() == "localstack" {
        loader = loader.endpoint_url("http://127.0.0.1:4566");
    }

    loader.load().await
}

/// Build a DynamoDB client with [`config_defaults`]
///
/// # Example
///
/// ```rust,no_run
/// use dynamo_mapper::{Error, Table, aws};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Error> {
///     let users = Table::builder("users", aws::connect().await)
///         .key(["user_id"])
///         .build()?;
///     let count = users.scan_count(&Default::default(), Default::default()).await?;
///     println!("{count} users");
///     Ok(())
/// }
/// ```
pub async fn connect() -> Client {
    Client::new(&config_defaults().await)
}

/// Build a DynamoDB client from an explicit configuration
pub fn connect_with(config: &SdkConfig) -> Client {
    Client::new(config)
}

impl StoreClient for Client {
    async fn request(&self, operation: Operation, payload: Payload) -> Result<Payload, Error> {
        match operation {
            Operation::GetItem => get_item(self, parse(payload)?).await,
            Operation::PutItem => put_item(self, parse(payload)?).await,
            Operation::DeleteItem => delete_item(self, parse(payload)?).await,
            Operation::UpdateItem => update_item(self, parse(payload)?).await,
            Operation::Query => query(self, parse(payload)?).await,
            Operation::Scan => scan(self, parse(payload)?).await,
            Operation::BatchGetItem => batch_get_item(self, parse(payload)?).await,
            Operation::BatchWriteItem => batch_write_item(self, parse(payload)?).await,
            Operation::CreateTable => create_table(self, parse(payload)?).await,
            Operation::DescribeTable => describe_table(self, parse(payload)?).await,
            Operation::UpdateTable => update_table(self, parse(payload)?).await,
            Operation::DeleteTable => delete_table(self, parse(payload)?).await,
            Operation::ListTables => list_tables(self, parse(payload)?).await,
        }
    }
}

fn parse<T: DeserializeOwned>(payload: Payload) -> Result<T, Error> {
    Ok(serde_json::from_value(payload)?)
}

/// Wire JSON of an SDK output
fn render<T: Serialize>(operation: Operation, output: &T) -> Result<Payload, Error> {
    serde_json::to_value(output).map_err(|source| Error::Response { operation, source })
}

/// Wrap an SDK failure, keeping the service error code
fn transport<E>(operation: Operation, err: SdkError<E, Response>) -> Error
where
    E: ProvideErrorMetadata + StdError + Send + Sync + 'static,
{
    let code = err
        .as_service_error()
        .and_then(ProvideErrorMetadata::code)
        .map(str::to_string);
    let error = TransportError::new(operation, err);
    match code {
        Some(code) => error.with_code(code).into(),
        None => error.into(),
    }
}

async fn get_item(client: &Client, input: GetItemInput) -> Result<Payload, Error> {
    let output = client
        .get_item()
        .table_name(input.table_name)
        .set_key(Some(to_sdk_item(input.key)))
        .set_attributes_to_get(input.attributes_to_get)
        .set_consistent_read(input.consistent_read)
        .send()
        .await
        .map_err(|e| transport(Operation::GetItem, e))?;

    render(Operation::GetItem, &GetItemOutput {
        item: output.item.map(to_raw_item),
    })
}

async fn put_item(client: &Client, input: PutItemInput) -> Result<Payload, Error> {
    let output = client
        .put_item()
        .table_name(input.table_name)
        .set_item(Some(to_sdk_item(input.item)))
        .set_expected(input.expected.map(to_sdk_expected))
        .set_return_values(input.return_values.as_deref().map(sdk::ReturnValue::from))
        .send()
        .await
        .map_err(|e| transport(Operation::PutItem, e))?;

    render(Operation::PutItem, &WriteOutput {
        attributes: output.attributes.map(to_raw_item),
    })
}

async fn delete_item(client: &Client, input: DeleteItemInput) -> Result<Payload, Error> {
    let output = client
        .delete_item()
        .table_name(input.table_name)
        .set_key(Some(to_sdk_item(input.key)))
        .set_expected(input.expected.map(to_sdk_expected))
        .set_return_values(input.return_values.as_deref().map(sdk::ReturnValue::from))
        .send()
        .await
        .map_err(|e| transport(Operation::DeleteItem, e))?;

    render(Operation::DeleteItem, &WriteOutput {
        attributes: output.attributes.map(to_raw_item),
    })
}

async fn update_item(client: &Client, input: UpdateItemInput) -> Result<Payload, Error> {
    let updates: HashMap<String, sdk::AttributeValueUpdate> = input
        .attribute_updates
        .into_iter()
        .map(|(field, update)| (field, to_sdk_update(update)))
        .collect();

    let output = client
        .update_item()
        .table_name(input.table_name)
        .set_key(Some(to_sdk_item(input.key)))
        .set_attribute_updates(Some(updates))
        .set_expected(input.expected.map(to_sdk_expected))
        .set_return_values(input.return_values.as_deref().map(sdk::ReturnValue::from))
        .send()
        .await
        .map_err(|e| transport(Operation::UpdateItem, e))?;

    render(Operation::UpdateItem, &WriteOutput {
        attributes: output.attributes.map(to_raw_item),
    })
}

async fn query(client: &Client, input: QueryInput) -> Result<Payload, Error> {
    let output = client
        .query()
        .table_name(input.table_name)
        .set_index_name(input.index_name)
        .set_key_conditions(Some(to_sdk_conditions(input.key_conditions)?))
        .set_attributes_to_get(input.attributes_to_get)
        .set_limit(input.limit)
        .set_consistent_read(input.consistent_read)
        .set_scan_index_forward(input.scan_index_forward)
        .set_exclusive_start_key(input.exclusive_start_key.map(cursor_to_sdk).transpose()?)
        .set_select(input.select.map(to_sdk_select))
        .send()
        .await
        .map_err(|e| transport(Operation::Query, e))?;

    render(Operation::Query, &ListOutput {
        items: output.items.unwrap_or_default().into_iter().map(to_raw_item).collect(),
        count: i64::from(output.count),
        scanned_count: i64::from(output.scanned_count),
        last_evaluated_key: output.last_evaluated_key.map(|key| Json::Object(to_raw_item(key))),
    })
}

async fn scan(client: &Client, input: ScanInput) -> Result<Payload, Error> {
    let output = client
        .scan()
        .table_name(input.table_name)
        .set_scan_filter(input.scan_filter.map(to_sdk_conditions).transpose()?)
        .set_attributes_to_get(input.attributes_to_get)
        .set_limit(input.limit)
        .set_exclusive_start_key(input.exclusive_start_key.map(cursor_to_sdk).transpose()?)
        .set_select(input.select.map(to_sdk_select))
        .set_segment(input.segment)
        .set_total_segments(input.total_segments)
        .send()
        .await
        .map_err(|e| transport(Operation::Scan, e))?;

    render(Operation::Scan, &ListOutput {
        items: output.items.unwrap_or_default().into_iter().map(to_raw_item).collect(),
        count: i64::from(output.count),
        scanned_count: i64::from(output.scanned_count),
        last_evaluated_key: output.last_evaluated_key.map(|key| Json::Object(to_raw_item(key))),
    })
}

async fn batch_get_item(client: &Client, input: BatchGetItemInput) -> Result<Payload, Error> {
    let mut request_items = HashMap::with_capacity(input.request_items.len());
    for (table, keys) in input.request_items {
        let keys = sdk::KeysAndAttributes::builder()
            .set_keys(Some(keys.keys.into_iter().map(to_sdk_item).collect()))
            .set_attributes_to_get(keys.attributes_to_get)
            .set_consistent_read(keys.consistent_read)
            .build()?;
        let _ = request_items.insert(table, keys);
    }

    let output = client
        .batch_get_item()
        .set_request_items(Some(request_items))
        .send()
        .await
        .map_err(|e| transport(Operation::BatchGetItem, e))?;

    let responses = output
        .responses
        .unwrap_or_default()
        .into_iter()
        .map(|(table, items)| (table, items.into_iter().map(to_raw_item).collect()))
        .collect();

    let mut unprocessed_keys = BTreeMap::new();
    for (table, keys) in output.unprocessed_keys.unwrap_or_default() {
        let _ = unprocessed_keys.insert(
            table,
            wire::KeysAndAttributes {
                keys: keys
                    .keys
                    .into_iter()
                    .map(from_sdk_item)
                    .collect::<Result<Vec<_>, _>>()?,
                attributes_to_get: keys.attributes_to_get,
                consistent_read: keys.consistent_read,
            },
        );
    }

    render(Operation::BatchGetItem, &BatchGetItemOutput {
        responses,
        unprocessed_keys,
    })
}

async fn batch_write_item(client: &Client, input: BatchWriteItemInput) -> Result<Payload, Error> {
    let mut request_items = HashMap::with_capacity(input.request_items.len());
    for (table, requests) in input.request_items {
        let requests = requests
            .into_iter()
            .map(to_sdk_write_request)
            .collect::<Result<Vec<_>, _>>()?;
        let _ = request_items.insert(table, requests);
    }

    let output = client
        .batch_write_item()
        .set_request_items(Some(request_items))
        .send()
        .await
        .map_err(|e| transport(Operation::BatchWriteItem, e))?;

    let mut unprocessed_items = BTreeMap::new();
    for (table, requests) in output.unprocessed_items.unwrap_or_default() {
        let requests = requests
            .into_iter()
            .map(from_sdk_write_request)
            .collect::<Result<Vec<_>, _>>()?;
        let _ = unprocessed_items.insert(table, requests);
    }

    render(Operation::BatchWriteItem, &BatchWriteItemOutput { unprocessed_items })
}

async fn create_table(client: &Client, input: CreateTableInput) -> Result<Payload, Error> {
    let attribute_definitions = input
        .attribute_definitions
        .into_iter()
        .map(|d| {
            sdk::AttributeDefinition::builder()
                .attribute_name(d.attribute_name)
                .attribute_type(sdk::ScalarAttributeType::from(d.attribute_type.as_str()))
                .build()
        })
        .collect::<Result<Vec<_>, _>>()?;

    let local_indexes = input
        .local_secondary_indexes
        .map(|indexes| {
            indexes
                .into_iter()
                .map(|index| {
                    sdk::LocalSecondaryIndex::builder()
                        .index_name(index.index_name)
                        .set_key_schema(Some(to_sdk_key_schema(index.key_schema)?))
                        .projection(to_sdk_projection(index.projection))
                        .build()
                        .map_err(Error::from)
                })
                .collect::<Result<Vec<_>, Error>>()
        })
        .transpose()?;

    let global_indexes = input
        .global_secondary_indexes
        .map(|indexes| {
            indexes
                .into_iter()
                .map(|index| {
                    sdk::GlobalSecondaryIndex::builder()
                        .index_name(index.index_name)
                        .set_key_schema(Some(to_sdk_key_schema(index.key_schema)?))
                        .projection(to_sdk_projection(index.projection))
                        .provisioned_throughput(to_sdk_throughput(index.provisioned_throughput)?)
                        .build()
                        .map_err(Error::from)
                })
                .collect::<Result<Vec<_>, Error>>()
        })
        .transpose()?;

    let output = client
        .create_table()
        .table_name(input.table_name)
        .set_attribute_definitions(Some(attribute_definitions))
        .set_key_schema(Some(to_sdk_key_schema(input.key_schema)?))
        .set_local_secondary_indexes(local_indexes)
        .set_global_secondary_indexes(global_indexes)
        .provisioned_throughput(to_sdk_throughput(input.provisioned_throughput)?)
        .send()
        .await
        .map_err(|e| transport(Operation::CreateTable, e))?;

    render(Operation::CreateTable, &TableOutput {
        table_description: output.table_description.map(from_sdk_description),
    })
}

async fn describe_table(client: &Client, input: TableNameInput) -> Result<Payload, Error> {
    let output = client
        .describe_table()
        .table_name(input.table_name)
        .send()
        .await
        .map_err(|e| transport(Operation::DescribeTable, e))?;

    render(Operation::DescribeTable, &TableOutput {
        table_description: output.table.map(from_sdk_description),
    })
}

async fn update_table(client: &Client, input: UpdateTableInput) -> Result<Payload, Error> {
    let output = client
        .update_table()
        .table_name(input.table_name)
        .provisioned_throughput(to_sdk_throughput(input.provisioned_throughput)?)
        .send()
        .await
        .map_err(|e| transport(Operation::UpdateTable, e))?;

    render(Operation::UpdateTable, &TableOutput {
        table_description: output.table_description.map(from_sdk_description),
    })
}

async fn delete_table(client: &Client, input: TableNameInput) -> Result<Payload, Error> {
    let output = client
        .delete_table()
        .table_name(input.table_name)
        .send()
        .await
        .map_err(|e| transport(Operation::DeleteTable, e))?;

    render(Operation::DeleteTable, &TableOutput {
        table_description: output.table_description.map(from_sdk_description),
    })
}

async fn list_tables(client: &Client, input: ListTablesInput) -> Result<Payload, Error> {
    let output = client
        .list_tables()
        .set_exclusive_start_table_name(input.exclusive_start_table_name)
        .set_limit(input.limit)
        .send()
        .await
        .map_err(|e| transport(Operation::ListTables, e))?;

    render(Operation::ListTables, &ListTablesOutput {
        table_names: output.table_names.unwrap_or_default(),
        last_evaluated_table_name: output.last_evaluated_table_name,
    })
}

fn to_sdk_attribute(attr: WireAttribute) -> AttributeValue {
    match attr {
        WireAttribute::S(s) => AttributeValue::S(s),
        WireAttribute::N(n) => AttributeValue::N(n),
        WireAttribute::B(b) => AttributeValue::B(Blob::new(b)),
        WireAttribute::Ss(ss) => AttributeValue::Ss(ss),
        WireAttribute::Ns(ns) => AttributeValue::Ns(ns),
        WireAttribute::Bs(bs) => AttributeValue::Bs(bs.into_iter().map(Blob::new).collect()),
    }
}

fn to_sdk_item(item: Item) -> SdkItem {
    item.into_iter()
        .map(|(field, attr)| (field, to_sdk_attribute(attr)))
        .collect()
}

fn cursor_to_sdk(cursor: Cursor) -> Result<SdkItem, Error> {
    match cursor.into_inner() {
        Json::Object(map) => map
            .into_iter()
            .map(|(field, json)| Ok((field, to_sdk_attribute(WireAttribute::try_from(json)?))))
            .collect(),
        other => Err(Error::validation(format!("cursor must be an object, got {other}"))),
    }
}

/// DynamoDB JSON of any SDK attribute, including kinds the mapper rejects
fn attribute_json(attr: AttributeValue) -> Json {
    match attr {
        AttributeValue::S(s) => json!({ "S": s }),
        AttributeValue::N(n) => json!({ "N": n }),
        AttributeValue::B(b) => json!({ "B": STANDARD.encode(b.into_inner()) }),
        AttributeValue::Ss(ss) => json!({ "SS": ss }),
        AttributeValue::Ns(ns) => json!({ "NS": ns }),
        AttributeValue::Bs(bs) => {
            let bs: Vec<String> = bs.into_iter().map(|b| STANDARD.encode(b.into_inner())).collect();
            json!({ "BS": bs })
        }
        AttributeValue::Bool(b) => json!({ "BOOL": b }),
        AttributeValue::Null(n) => json!({ "NULL": n }),
        AttributeValue::L(list) => json!({ "L": list.into_iter().map(attribute_json).collect::<Vec<_>>() }),
        AttributeValue::M(map) => json!({ "M": to_raw_item(map) }),
        _ => Json::Object(Map::new()),
    }
}

fn to_raw_item(item: SdkItem) -> RawItem {
    item.into_iter()
        .map(|(field, attr)| (field, attribute_json(attr)))
        .collect()
}

fn from_sdk_item(item: SdkItem) -> Result<Item, Error> {
    item.into_iter()
        .map(|(field, attr)| Ok((field, WireAttribute::try_from(attribute_json(attr))?)))
        .collect()
}

fn to_sdk_conditions(conditions: WireConditions) -> Result<HashMap<String, sdk::Condition>, Error> {
    conditions
        .into_iter()
        .map(|(field, condition)| {
            let condition = sdk::Condition::builder()
                .comparison_operator(sdk::ComparisonOperator::from(
                    condition.comparison_operator.as_str(),
                ))
                .set_attribute_value_list(operands(condition.attribute_value_list))
                .build()?;
            Ok((field, condition))
        })
        .collect()
}

fn to_sdk_expected(conditions: WireConditions) -> HashMap<String, sdk::ExpectedAttributeValue> {
    conditions
        .into_iter()
        .map(|(field, WireCondition { comparison_operator, attribute_value_list })| {
            let expected = sdk::ExpectedAttributeValue::builder()
                .comparison_operator(sdk::ComparisonOperator::from(comparison_operator.as_str()))
                .set_attribute_value_list(operands(attribute_value_list))
                .build();
            (field, expected)
        })
        .collect()
}

fn operands(values: Option<Vec<WireAttribute>>) -> Option<Vec<AttributeValue>> {
    values.map(|values| values.into_iter().map(to_sdk_attribute).collect())
}

fn to_sdk_update(update: AttributeUpdate) -> sdk::AttributeValueUpdate {
    let action = match update.action {
        UpdateAction::Put => sdk::AttributeAction::Put,
        UpdateAction::Add => sdk::AttributeAction::Add,
        UpdateAction::Delete => sdk::AttributeAction::Delete,
    };
    sdk::AttributeValueUpdate::builder()
        .action(action)
        .set_value(update.value.map(to_sdk_attribute))
        .build()
}

fn to_sdk_select(select: Select) -> sdk::Select {
    match select {
        Select::AllAttributes => sdk::Select::AllAttributes,
        Select::AllProjectedAttributes => sdk::Select::AllProjectedAttributes,
        Select::SpecificAttributes => sdk::Select::SpecificAttributes,
        Select::Count => sdk::Select::Count,
    }
}

fn to_sdk_write_request(request: wire::WriteRequest) -> Result<sdk::WriteRequest, Error> {
    let put_request = request
        .put_request
        .map(|put| sdk::PutRequest::builder().set_item(Some(to_sdk_item(put.item))).build())
        .transpose()?;
    let delete_request = request
        .delete_request
        .map(|delete| sdk::DeleteRequest::builder().set_key(Some(to_sdk_item(delete.key))).build())
        .transpose()?;

    Ok(sdk::WriteRequest::builder()
        .set_put_request(put_request)
        .set_delete_request(delete_request)
        .build())
}

fn from_sdk_write_request(request: sdk::WriteRequest) -> Result<wire::WriteRequest, Error> {
    Ok(wire::WriteRequest {
        put_request: request
            .put_request
            .map(|put| Ok::<_, Error>(wire::PutRequest { item: from_sdk_item(put.item)? }))
            .transpose()?,
        delete_request: request
            .delete_request
            .map(|delete| Ok::<_, Error>(wire::DeleteRequest { key: from_sdk_item(delete.key)? }))
            .transpose()?,
    })
}

fn to_sdk_key_schema(
    key_schema: Vec<wire::KeySchemaElement>,
) -> Result<Vec<sdk::KeySchemaElement>, Error> {
    key_schema
        .into_iter()
        .map(|element| {
            let key_type = match element.key_type {
                KeyType::Hash => sdk::KeyType::Hash,
                KeyType::Range => sdk::KeyType::Range,
            };
            Ok(sdk::KeySchemaElement::builder()
                .attribute_name(element.attribute_name)
                .key_type(key_type)
                .build()?)
        })
        .collect()
}

fn to_sdk_projection(projection: WireProjection) -> sdk::Projection {
    let projection_type = match projection.projection_type {
        ProjectionType::All => sdk::ProjectionType::All,
        ProjectionType::KeysOnly => sdk::ProjectionType::KeysOnly,
        ProjectionType::Include => sdk::ProjectionType::Include,
    };
    sdk::Projection::builder()
        .projection_type(projection_type)
        .set_non_key_attributes(projection.non_key_attributes)
        .build()
}

fn to_sdk_throughput(
    throughput: wire::ProvisionedThroughput,
) -> Result<sdk::ProvisionedThroughput, Error> {
    Ok(sdk::ProvisionedThroughput::builder()
        .read_capacity_units(throughput.read_capacity_units)
        .write_capacity_units(throughput.write_capacity_units)
        .build()?)
}

fn from_sdk_description(description: sdk::TableDescription) -> wire::TableDescription {
    let key_schema = description
        .key_schema
        .unwrap_or_default()
        .into_iter()
        .filter_map(|element| {
            let key_type = match element.key_type {
                sdk::KeyType::Hash => KeyType::Hash,
                sdk::KeyType::Range => KeyType::Range,
                _ => return None,
            };
            Some(wire::KeySchemaElement {
                attribute_name: element.attribute_name,
                key_type,
            })
        })
        .collect();

    let attribute_definitions = description
        .attribute_definitions
        .unwrap_or_default()
        .into_iter()
        .filter_map(|definition| {
            let attribute_type = match definition.attribute_type {
                sdk::ScalarAttributeType::S => WireType::S,
                sdk::ScalarAttributeType::N => WireType::N,
                sdk::ScalarAttributeType::B => WireType::B,
                _ => return None,
            };
            Some(wire::AttributeDefinition {
                attribute_name: definition.attribute_name,
                attribute_type,
            })
        })
        .collect();

    wire::TableDescription {
        table_name: description.table_name,
        table_status: description.table_status.map(|status| status.as_str().to_string()),
        item_count: description.item_count,
        table_size_bytes: description.table_size_bytes,
        key_schema,
        attribute_definitions,
        provisioned_throughput: description.provisioned_throughput.map(|throughput| {
            wire::ProvisionedThroughput {
                read_capacity_units: throughput.read_capacity_units.unwrap_or_default(),
                write_capacity_units: throughput.write_capacity_units.unwrap_or_default(),
            }
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_kinds_pass_through() {
        let mut item = SdkItem::new();
        let _ = item.insert("flag".into(), AttributeValue::Bool(true));
        let _ = item.insert("id".into(), AttributeValue::N("7".into()));

        let raw = to_raw_item(item.clone());
        assert_eq!(raw["flag"], json!({ "BOOL": true }));
        assert_eq!(raw["id"], json!({ "N": "7" }));

        let err = from_sdk_item(item).unwrap_err();
        assert!(matches!(err, Error::UnknownWireType(_)));
    }

    #[test]
    fn test_binary_round_trip() {
        let attr = to_sdk_attribute(WireAttribute::Bs(vec![vec![1, 2], vec![3]]));
        let back = WireAttribute::try_from(attribute_json(attr)).unwrap();
        assert_eq!(back, WireAttribute::Bs(vec![vec![1, 2], vec![3]]));
    }

    #[test]
    fn test_cursor_to_sdk() {
        let cursor = Cursor::new(json!({ "id": { "S": "a" }, "n": { "N": "1" } }));
        let key = cursor_to_sdk(cursor).unwrap();
        assert_eq!(key["id"], AttributeValue::S("a".into()));
        assert_eq!(key["n"], AttributeValue::N("1".into()));

        assert!(cursor_to_sdk(Cursor::new(json!("x"))).is_err());
    }

    #[test]
    fn test_transport_keeps_operation() {
        let err = transport::<aws_sdk_dynamodb::operation::scan::ScanError>(
            Operation::Scan,
            SdkError::timeout_error("slow"),
        );
        assert!(err.is_transport_error());
        assert!(!err.is_conditional_check_failed());
    }

    #[test]
    fn test_unrenderable_output_is_response_error() {
        let mut output = std::collections::BTreeMap::new();
        let _ = output.insert((1, 2), "pair");
        let err = render(Operation::Query, &output).unwrap_err();
        assert!(matches!(
            err,
            Error::Response {
                operation: Operation::Query,
                ..
            }
        ));
    }
}
