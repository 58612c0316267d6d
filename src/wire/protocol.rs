//! Request and response bodies of the DynamoDB JSON protocol (condition/attribute-update
//! API shapes).

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::BTreeMap;

use super::{Cursor, Item, RawItem, WireAttribute, WireType};

/// `ComparisonOperator` plus operands, used by key conditions, scan filters and
/// expected-value checks
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WireCondition {
    /// `EQ`, `NE`, `BETWEEN`, `NULL`, ...
    pub comparison_operator: String,
    /// Encoded operands, absent for `NULL`/`NOT_NULL`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_value_list: Option<Vec<WireAttribute>>,
}

/// Field name to condition
pub type WireConditions = BTreeMap<String, WireCondition>;

/// `GetItem` request
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetItemInput {
    /// Table name
    pub table_name: String,
    /// Primary key
    pub key: Item,
    /// Projection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes_to_get: Option<Vec<String>>,
    /// Strongly consistent read
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consistent_read: Option<bool>,
}

/// `GetItem` response
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetItemOutput {
    /// The item, absent when no item has the key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<RawItem>,
}

/// `PutItem` request
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutItemInput {
    /// Table name
    pub table_name: String,
    /// Full item
    pub item: Item,
    /// Conditions the stored item must satisfy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<WireConditions>,
    /// `NONE` or `ALL_OLD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_values: Option<String>,
}

/// `DeleteItem` request
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteItemInput {
    /// Table name
    pub table_name: String,
    /// Primary key
    pub key: Item,
    /// Conditions the stored item must satisfy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<WireConditions>,
    /// `NONE` or `ALL_OLD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_values: Option<String>,
}

/// Attribute-level update action
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UpdateAction {
    /// Replace the attribute
    Put,
    /// Add to a number or union into a set
    Add,
    /// Remove the attribute, or members of a set
    Delete,
}

/// One entry of `AttributeUpdates`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttributeUpdate {
    /// Action to apply
    pub action: UpdateAction,
    /// Operand, absent when deleting a whole attribute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<WireAttribute>,
}

/// `UpdateItem` request
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateItemInput {
    /// Table name
    pub table_name: String,
    /// Primary key
    pub key: Item,
    /// Per-attribute actions
    pub attribute_updates: BTreeMap<String, AttributeUpdate>,
    /// Conditions the stored item must satisfy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<WireConditions>,
    /// `NONE`, `ALL_OLD`, `UPDATED_OLD`, `ALL_NEW` or `UPDATED_NEW`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_values: Option<String>,
}

/// `PutItem`, `DeleteItem` and `UpdateItem` response
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WriteOutput {
    /// Attributes requested through `ReturnValues`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<RawItem>,
}

/// `Select` parameter of query and scan
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Select {
    /// Every attribute
    AllAttributes,
    /// Every attribute projected into the index
    AllProjectedAttributes,
    /// Only `AttributesToGet`
    SpecificAttributes,
    /// Only the number of matching items
    Count,
}

/// `Query` request
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryInput {
    /// Table name
    pub table_name: String,
    /// Secondary index to query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_name: Option<String>,
    /// Conditions on key (or index key) fields
    pub key_conditions: WireConditions,
    /// Projection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes_to_get: Option<Vec<String>>,
    /// Per-page item ceiling enforced by the store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,
    /// Strongly consistent read
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consistent_read: Option<bool>,
    /// Ascending (`true`) or descending sort key order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_index_forward: Option<bool>,
    /// Continuation cursor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_start_key: Option<Cursor>,
    /// What to return
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Select>,
}

/// `Scan` request
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScanInput {
    /// Table name
    pub table_name: String,
    /// Filter applied by the store after reading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_filter: Option<WireConditions>,
    /// Projection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes_to_get: Option<Vec<String>>,
    /// Per-page item ceiling enforced by the store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,
    /// Continuation cursor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_start_key: Option<Cursor>,
    /// What to return
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Select>,
    /// Segment of a parallel scan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<i32>,
    /// Number of segments of a parallel scan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_segments: Option<i32>,
}

/// `Query` and `Scan` response page
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListOutput {
    /// Items of this page, empty in count mode
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<RawItem>,
    /// Number of items matched on this page
    #[serde(default)]
    pub count: i64,
    /// Number of items read before filtering
    #[serde(default)]
    pub scanned_count: i64,
    /// Cursor of the next page, absent on the last one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_evaluated_key: Option<Json>,
}

/// Keys of one table inside a batch get, with that table's read options
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeysAndAttributes {
    /// Primary keys
    pub keys: Vec<Item>,
    /// Projection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes_to_get: Option<Vec<String>>,
    /// Strongly consistent read
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consistent_read: Option<bool>,
}

/// `BatchGetItem` request
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchGetItemInput {
    /// Table name to keys
    pub request_items: BTreeMap<String, KeysAndAttributes>,
}

/// `BatchGetItem` response
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchGetItemOutput {
    /// Table name to items found
    #[serde(default)]
    pub responses: BTreeMap<String, Vec<RawItem>>,
    /// Keys the store did not get to, to be resubmitted verbatim
    #[serde(default)]
    pub unprocessed_keys: BTreeMap<String, KeysAndAttributes>,
}

/// Put half of a [`WriteRequest`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutRequest {
    /// Full item
    pub item: Item,
}

/// Delete half of a [`WriteRequest`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteRequest {
    /// Primary key
    pub key: Item,
}

/// One put or delete of a batch write
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WriteRequest {
    /// Put, if this is a put
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put_request: Option<PutRequest>,
    /// Delete, if this is a delete
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_request: Option<DeleteRequest>,
}

impl WriteRequest {
    /// A put of `item`
    pub fn put(item: Item) -> Self {
        Self {
            put_request: Some(PutRequest { item }),
            delete_request: None,
        }
    }

    /// A delete of `key`
    pub fn delete(key: Item) -> Self {
        Self {
            put_request: None,
            delete_request: Some(DeleteRequest { key }),
        }
    }
}

/// `BatchWriteItem` request
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchWriteItemInput {
    /// Table name to writes
    pub request_items: BTreeMap<String, Vec<WriteRequest>>,
}

/// `BatchWriteItem` response
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchWriteItemOutput {
    /// Writes the store did not get to, to be resubmitted verbatim
    #[serde(default)]
    pub unprocessed_items: BTreeMap<String, Vec<WriteRequest>>,
}

/// Role of a key attribute
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyType {
    /// Partition key
    Hash,
    /// Sort key
    Range,
}

/// Name and role of one key attribute
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeySchemaElement {
    /// Field name
    pub attribute_name: String,
    /// Partition or sort key
    pub key_type: KeyType,
}

/// Declared scalar type of an indexed attribute
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttributeDefinition {
    /// Field name
    pub attribute_name: String,
    /// `S`, `N` or `B`
    pub attribute_type: WireType,
}

/// Which attributes an index carries
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectionType {
    /// Every attribute
    All,
    /// Only key attributes
    KeysOnly,
    /// Keys plus `NonKeyAttributes`
    Include,
}

/// Index projection
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WireProjection {
    /// Projection type
    pub projection_type: ProjectionType,
    /// Extra attributes for `INCLUDE`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_key_attributes: Option<Vec<String>>,
}

/// Read and write capacity units
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProvisionedThroughput {
    /// Read capacity units
    #[serde(default)]
    pub read_capacity_units: i64,
    /// Write capacity units
    #[serde(default)]
    pub write_capacity_units: i64,
}

/// Local secondary index definition
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LocalSecondaryIndex {
    /// Index name
    pub index_name: String,
    /// Base partition key then the index sort key
    pub key_schema: Vec<KeySchemaElement>,
    /// Projection
    pub projection: WireProjection,
}

/// Global secondary index definition
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GlobalSecondaryIndex {
    /// Index name
    pub index_name: String,
    /// Index partition key and optional sort key
    pub key_schema: Vec<KeySchemaElement>,
    /// Projection
    pub projection: WireProjection,
    /// Capacity of the index itself
    pub provisioned_throughput: ProvisionedThroughput,
}

/// `CreateTable` request
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateTableInput {
    /// Table name
    pub table_name: String,
    /// Types of every key and index key attribute
    pub attribute_definitions: Vec<AttributeDefinition>,
    /// Partition key then optional sort key
    pub key_schema: Vec<KeySchemaElement>,
    /// Local secondary indexes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_secondary_indexes: Option<Vec<LocalSecondaryIndex>>,
    /// Global secondary indexes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_secondary_indexes: Option<Vec<GlobalSecondaryIndex>>,
    /// Table capacity
    pub provisioned_throughput: ProvisionedThroughput,
}

/// Request naming only a table: `DescribeTable` and `DeleteTable`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableNameInput {
    /// Table name
    pub table_name: String,
}

/// `UpdateTable` request
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateTableInput {
    /// Table name
    pub table_name: String,
    /// New capacity
    pub provisioned_throughput: ProvisionedThroughput,
}

/// `ListTables` request
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListTablesInput {
    /// Continue after this table name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_start_table_name: Option<String>,
    /// Page size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,
}

/// `ListTables` response page
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListTablesOutput {
    /// Table names of this page
    #[serde(default)]
    pub table_names: Vec<String>,
    /// Continue after this name, absent on the last page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_evaluated_table_name: Option<String>,
}

/// Table metadata as reported by the store
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableDescription {
    /// Table name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    /// `CREATING`, `ACTIVE`, `UPDATING` or `DELETING`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_status: Option<String>,
    /// Approximate number of items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_count: Option<i64>,
    /// Approximate size in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_size_bytes: Option<i64>,
    /// Key schema
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_schema: Vec<KeySchemaElement>,
    /// Attribute definitions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attribute_definitions: Vec<AttributeDefinition>,
    /// Table capacity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioned_throughput: Option<ProvisionedThroughput>,
}

impl TableDescription {
    /// `true` once the table accepts reads and writes
    pub fn is_active(&self) -> bool {
        self.table_status.as_deref() == Some("ACTIVE")
    }
}

/// Response of table lifecycle operations
///
/// `DescribeTable` reports under `Table`, the others under `TableDescription`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableOutput {
    /// Table metadata
    #[serde(default, alias = "Table", skip_serializing_if = "Option::is_none")]
    pub table_description: Option<TableDescription>,
}
