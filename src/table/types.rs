use std::collections::BTreeMap;
use std::time::Duration;

use crate::table::condition::ConditionSet;
use crate::table::helpers::batch_processor;
use crate::value::Record;
use crate::wire::{Cursor, ProjectionType, ProvisionedThroughput, WireProjection};

/// Retry configuration for DynamoDB operations
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Maximum number of resubmissions of unprocessed batch keys or items, per chunk
    pub max_retries: usize,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
        }
    }
}

/// Per-request ceilings of batch operations
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchLimits {
    /// Keys per `BatchGetItem` request
    pub get: usize,
    /// Operations per `BatchWriteItem` request
    pub write: usize,
    /// Chunks in flight at once
    pub concurrency: usize,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            get: batch_processor::BATCH_READ_SIZE,
            write: batch_processor::BATCH_WRITE_SIZE,
            concurrency: batch_processor::DEFAULT_CONCURRENCY,
        }
    }
}

/// Attributes carried by a secondary index
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Projection {
    /// Every attribute
    #[default]
    All,
    /// Key attributes only
    KeysOnly,
    /// Key attributes plus the listed ones
    Include(Vec<String>),
}

impl Projection {
    pub(crate) fn to_wire(&self) -> WireProjection {
        match self {
            Projection::All => WireProjection {
                projection_type: ProjectionType::All,
                non_key_attributes: None,
            },
            Projection::KeysOnly => WireProjection {
                projection_type: ProjectionType::KeysOnly,
                non_key_attributes: None,
            },
            Projection::Include(attributes) => WireProjection {
                projection_type: ProjectionType::Include,
                non_key_attributes: Some(attributes.clone()),
            },
        }
    }
}

/// Local secondary index: the base partition key with an alternate sort key
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalIndex {
    /// Index name
    pub name: String,
    /// Alternate sort key field
    pub sort_key: String,
    /// Projection
    pub projection: Projection,
}

impl LocalIndex {
    /// Index `name` sorted by `sort_key`, projecting every attribute
    pub fn new(name: impl Into<String>, sort_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sort_key: sort_key.into(),
            projection: Projection::All,
        }
    }

    /// Set the projection
    pub fn projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }
}

/// Global secondary index with its own key and capacity
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlobalIndex {
    /// Index name
    pub name: String,
    /// Index partition key field
    pub partition_key: String,
    /// Index sort key field
    pub sort_key: Option<String>,
    /// Projection
    pub projection: Projection,
    /// Capacity of the index
    pub throughput: ProvisionedThroughput,
}

impl GlobalIndex {
    /// Index `name` partitioned by `partition_key`, 1/1 capacity, projecting everything
    pub fn new(name: impl Into<String>, partition_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partition_key: partition_key.into(),
            sort_key: None,
            projection: Projection::All,
            throughput: ProvisionedThroughput {
                read_capacity_units: 1,
                write_capacity_units: 1,
            },
        }
    }

    /// Set the sort key
    pub fn sort_key(mut self, field: impl Into<String>) -> Self {
        self.sort_key = Some(field.into());
        self
    }

    /// Set the projection
    pub fn projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    /// Set the capacity
    pub fn throughput(mut self, read: i64, write: i64) -> Self {
        self.throughput = ProvisionedThroughput {
            read_capacity_units: read,
            write_capacity_units: write,
        };
        self
    }

    /// Key fields of the index
    pub(crate) fn key_fields(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.partition_key.as_str()).chain(self.sort_key.as_deref())
    }
}

/// `ReturnValues` of write operations
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReturnValues {
    /// Nothing
    None,
    /// The item as it was before the write
    AllOld,
    /// Updated attributes as they were before
    UpdatedOld,
    /// The item as it is after the write
    AllNew,
    /// Updated attributes as they are after
    UpdatedNew,
}

impl ReturnValues {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            ReturnValues::None => "NONE",
            ReturnValues::AllOld => "ALL_OLD",
            ReturnValues::UpdatedOld => "UPDATED_OLD",
            ReturnValues::AllNew => "ALL_NEW",
            ReturnValues::UpdatedNew => "UPDATED_NEW",
        }
    }
}

/// Options of `get`
#[derive(Clone, Debug, Default)]
pub struct GetOptions {
    /// Only return these attributes
    pub attributes: Option<Vec<String>>,
    /// Strongly consistent read
    pub consistent_read: bool,
}

/// Options of `put`
#[derive(Clone, Debug, Default)]
pub struct PutOptions {
    /// Conditions the stored item must satisfy for the put to happen
    pub expected: ConditionSet,
    /// Attributes to return
    pub return_values: Option<ReturnValues>,
}

/// Options of `delete`
#[derive(Clone, Debug, Default)]
pub struct DeleteOptions {
    /// Conditions the stored item must satisfy for the delete to happen
    pub expected: ConditionSet,
    /// Attributes to return
    pub return_values: Option<ReturnValues>,
}

/// Options of `update`
#[derive(Clone, Debug, Default)]
pub struct UpdateOptions {
    /// Conditions the stored item must satisfy for the update to happen
    pub expected: ConditionSet,
    /// Attributes to return
    pub return_values: Option<ReturnValues>,
}

/// Options of queries
#[derive(Clone, Debug, Default)]
pub struct QueryOptions {
    /// Index to query; routed from the conditions when unset
    pub index_name: Option<String>,
    /// Only return these attributes
    pub attributes: Option<Vec<String>>,
    /// Item ceiling: per page for the store, overall for reads that follow cursors
    pub limit: Option<u32>,
    /// Strongly consistent read
    pub consistent_read: bool,
    /// Ascending (`true`) or descending sort key order
    pub scan_index_forward: Option<bool>,
    /// Resume after this cursor
    pub exclusive_start_key: Option<Cursor>,
}

/// Options of scans
#[derive(Clone, Debug, Default)]
pub struct ScanOptions {
    /// Only return these attributes
    pub attributes: Option<Vec<String>>,
    /// Item ceiling: per page for the store, overall for reads that follow cursors
    pub limit: Option<u32>,
    /// Resume after this cursor
    pub exclusive_start_key: Option<Cursor>,
    /// Scan only this segment
    pub segment: Option<u32>,
    /// Split the scan into this many segments
    pub total_segments: Option<u32>,
}

/// Read options of one table inside a batch get
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchGetOptions {
    /// Only return these attributes
    pub attributes: Option<Vec<String>>,
    /// Strongly consistent read
    pub consistent_read: bool,
}

/// Options of `create_table`
#[derive(Clone, Copy, Debug)]
pub struct CreateTableOptions {
    /// Read capacity units
    pub read_capacity: i64,
    /// Write capacity units
    pub write_capacity: i64,
}

impl Default for CreateTableOptions {
    fn default() -> Self {
        Self {
            read_capacity: 1,
            write_capacity: 1,
        }
    }
}

/// One page of a query or scan
#[must_use = "page results should be used or you'll lose the fetched data"]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    /// Decoded items
    pub items: Vec<Record>,
    /// Items matched on this page
    pub count: i64,
    /// Items read before filtering
    pub scanned_count: i64,
    /// Cursor of the next page, absent on the last one
    pub cursor: Option<Cursor>,
}

/// Batch get output
#[must_use = "batch get results should be used or you'll lose the fetched data"]
#[derive(Clone, Debug, Default)]
pub struct BatchReadOutput {
    /// Table name to items found, in chunk order
    pub items: BTreeMap<String, Vec<Record>>,
    /// Number of requests issued before retries
    pub chunks: usize,
    /// Number of resubmissions of unprocessed keys across all chunks
    pub retry_count: usize,
    /// Total execution time including all retries
    pub total_duration: Duration,
}

impl BatchReadOutput {
    /// Items found in `table`
    pub fn table(&self, table: &str) -> &[Record] {
        self.items.get(table).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Batch write output
#[must_use = "batch write results carry retry metrics"]
#[derive(Clone, Debug, Default)]
pub struct BatchWriteOutput {
    /// Number of requests issued before retries
    pub chunks: usize,
    /// Number of resubmissions of unprocessed items across all chunks
    pub retry_count: usize,
    /// Total execution time including all retries
    pub total_duration: Duration,
}
