mod batch;
mod condition;
mod helpers;
mod index;
mod key;
mod mapper;
mod operations;
mod pagination;
mod types;

pub use batch::{BatchGetGroup, BatchWriteGroup};
pub use condition::{Comparator, Condition, ConditionSet, conditions};
pub use key::{Key, KeySpec};
pub use mapper::{ItemHook, ItemMapper, RecordHook};
pub use operations::UpdateActions;
pub use types::{
    BatchGetOptions, BatchLimits, BatchReadOutput, BatchWriteOutput, CreateTableOptions,
    DeleteOptions, GetOptions, GlobalIndex, LocalIndex, Page, Projection, PutOptions,
    QueryOptions, RetryConfig, ReturnValues, ScanOptions, UpdateOptions,
};

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::Error;
use crate::client::{Operation, StoreClient};
use crate::codec::{FieldMapping, TypeHint};
use crate::value::{Record, Value};
use crate::wire::{Item, WireConditions, WireType};

/// Handle on one table of the store
///
/// Configuration is fixed by [`TableBuilder`] and never changes afterwards, so a
/// handle can be shared freely between concurrent operations.
pub struct Table<C> {
    pub(crate) name: String,
    client: C,
    pub(crate) key: KeySpec,
    key_types: HashMap<String, WireType>,
    pub(crate) mapper: ItemMapper,
    pub(crate) local_indexes: Vec<LocalIndex>,
    pub(crate) global_indexes: Vec<GlobalIndex>,
    use_next_id: bool,
    limits: BatchLimits,
    retry: RetryConfig,
    pub(crate) max_pages: Option<usize>,
}

impl<C: StoreClient> Table<C> {
    /// Start configuring a handle on table `name`, sending requests through `client`
    pub fn builder(name: impl Into<String>, client: C) -> TableBuilder<C> {
        TableBuilder::new(name, client)
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Primary key fields
    pub fn key(&self) -> &KeySpec {
        &self.key
    }

    /// Record/item mapper of this table
    pub fn mapper(&self) -> &ItemMapper {
        &self.mapper
    }

    /// Store client
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Encode a record into a wire item
    pub fn to_item(&self, record: &Record) -> Result<Item, Error> {
        self.mapper.to_item(record)
    }

    /// Decode a wire item into a record
    pub fn from_item(&self, item: Item) -> Result<Record, Error> {
        self.mapper.from_item(item)
    }

    /// Build the wire key of `key`
    pub fn resolve_key(&self, key: impl Into<Key>) -> Result<Item, Error> {
        self.key.resolve(key.into(), self.mapper.mapping())
    }

    /// Scalar type `field` is stored as when it is part of a key
    ///
    /// Declared key type first, then the field's type hint, then `S`.
    pub fn key_type(&self, field: &str) -> Result<WireType, Error> {
        if let Some(t) = self.key_types.get(field) {
            return Ok(*t);
        }
        match self.mapper.mapping().get(field) {
            None => Ok(WireType::S),
            Some(hint) => hint.key_type().ok_or_else(|| {
                Error::validation(format!("unsupported key type {hint:?} for field `{field}`"))
            }),
        }
    }

    /// Reserved value of key `field` for the id counter item
    pub(crate) fn default_key_value(&self, field: &str) -> Result<Value, Error> {
        Ok(match self.key_type(field)? {
            WireType::N => Value::Int(0),
            // "0000" read as base64
            WireType::B => Value::Bytes(vec![0xd3, 0x4d, 0x34]),
            _ => Value::from("0"),
        })
    }

    /// Key of the id counter item
    pub(crate) fn default_key(&self) -> Result<Key, Error> {
        self.key
            .fields()
            .iter()
            .map(|field| self.default_key_value(field))
            .collect::<Result<Vec<_>, _>>()
            .map(Key::Positional)
    }

    pub(crate) fn wire_conditions(&self, set: &ConditionSet) -> Result<WireConditions, Error> {
        condition::wire_conditions(set, self.mapper.mapping())
    }

    pub(crate) fn optional_conditions(
        &self,
        set: &ConditionSet,
    ) -> Result<Option<WireConditions>, Error> {
        if set.is_empty() {
            return Ok(None);
        }
        self.wire_conditions(set).map(Some)
    }

    /// Send one request and parse its response
    pub(crate) async fn send<I, O>(&self, operation: Operation, input: &I) -> Result<O, Error>
    where
        I: Serialize,
        O: DeserializeOwned,
    {
        let payload = serde_json::to_value(input)?;
        debug!(table = %self.name, %operation, "sending request");
        let response = self.client.request(operation, payload).await?;
        serde_json::from_value(response).map_err(|source| Error::Response { operation, source })
    }
}

impl<C> fmt::Debug for Table<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("key_types", &self.key_types)
            .field("mapper", &self.mapper)
            .field("local_indexes", &self.local_indexes)
            .field("global_indexes", &self.global_indexes)
            .field("use_next_id", &self.use_next_id)
            .field("limits", &self.limits)
            .field("retry", &self.retry)
            .field("max_pages", &self.max_pages)
            .finish_non_exhaustive()
    }
}

/// Configuration of a [`Table`]
pub struct TableBuilder<C> {
    name: String,
    client: C,
    mapping: FieldMapping,
    key: Option<Vec<String>>,
    key_types: HashMap<String, WireType>,
    mapper: ItemMapper,
    local_indexes: Vec<LocalIndex>,
    global_indexes: Vec<GlobalIndex>,
    use_next_id: bool,
    limits: BatchLimits,
    retry: RetryConfig,
    max_pages: Option<usize>,
}

impl<C: StoreClient> TableBuilder<C> {
    fn new(name: impl Into<String>, client: C) -> Self {
        Self {
            name: name.into(),
            client,
            mapping: FieldMapping::new(),
            key: None,
            key_types: HashMap::new(),
            mapper: ItemMapper::default(),
            local_indexes: Vec::new(),
            global_indexes: Vec::new(),
            use_next_id: false,
            limits: BatchLimits::default(),
            retry: RetryConfig::default(),
            max_pages: None,
        }
    }

    /// Declare the encoding of `field`
    ///
    /// Without an explicit [`key`](Self::key), the first two mapped fields form the key.
    pub fn mapping(mut self, field: impl Into<String>, hint: impl Into<TypeHint>) -> Self {
        self.mapping.insert(field, hint);
        self
    }

    /// Primary key fields: partition key, then optional sort key
    pub fn key<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Declare the scalar type `field` has as a key or index key
    pub fn key_type(mut self, field: impl Into<String>, wire_type: WireType) -> Self {
        let _ = self.key_types.insert(field.into(), wire_type);
        self
    }

    /// Transform records before they are encoded
    pub fn pre_to<F>(mut self, hook: F) -> Self
    where
        F: Fn(Record) -> Record + Send + Sync + 'static,
    {
        self.mapper.pre_to = Some(Arc::new(hook));
        self
    }

    /// Transform items after they are encoded
    pub fn post_to<F>(mut self, hook: F) -> Self
    where
        F: Fn(Item) -> Item + Send + Sync + 'static,
    {
        self.mapper.post_to = Some(Arc::new(hook));
        self
    }

    /// Transform items before they are decoded
    pub fn pre_from<F>(mut self, hook: F) -> Self
    where
        F: Fn(Item) -> Item + Send + Sync + 'static,
    {
        self.mapper.pre_from = Some(Arc::new(hook));
        self
    }

    /// Transform records after they are decoded
    pub fn post_from<F>(mut self, hook: F) -> Self
    where
        F: Fn(Record) -> Record + Send + Sync + 'static,
    {
        self.mapper.post_from = Some(Arc::new(hook));
        self
    }

    /// Declare a local secondary index
    pub fn local_index(mut self, index: LocalIndex) -> Self {
        self.local_indexes.push(index);
        self
    }

    /// Declare a global secondary index
    pub fn global_index(mut self, index: GlobalIndex) -> Self {
        self.global_indexes.push(index);
        self
    }

    /// Keep an id counter item under the reserved default key and hide it from scans
    pub fn use_next_id(mut self, enabled: bool) -> Self {
        self.use_next_id = enabled;
        self
    }

    /// Override batch ceilings and concurrency
    pub fn batch_limits(mut self, limits: BatchLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Override the retry policy for unprocessed batch remainders
    pub fn retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Fail paginated reads that need more than `max_pages` pages
    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Validate the configuration and build the handle
    pub fn build(self) -> Result<Table<C>, Error> {
        if self.name.is_empty() {
            return Err(Error::validation("Table must have a name"));
        }

        let fields = match self.key {
            Some(fields) => fields,
            None => {
                let mapped: Vec<String> = self.mapping.fields().take(2).map(String::from).collect();
                if mapped.is_empty() {
                    vec!["id".to_string()]
                } else {
                    mapped
                }
            }
        };
        let key = KeySpec::new(fields)?;

        if let Some((field, t)) = self.key_types.iter().find(|(_, t)| !t.is_scalar()) {
            return Err(Error::validation(format!(
                "key type of `{field}` must be S, N or B, got {t}"
            )));
        }
        if self.limits.get == 0 || self.limits.write == 0 {
            return Err(Error::validation("batch limits must be at least 1"));
        }
        if self.max_pages == Some(0) {
            return Err(Error::validation("max_pages must be at least 1"));
        }

        let mut mapper = ItemMapper::new(self.mapping);
        mapper.pre_to = self.mapper.pre_to;
        mapper.post_to = self.mapper.post_to;
        mapper.pre_from = self.mapper.pre_from;
        mapper.post_from = self.mapper.post_from;

        Ok(Table {
            name: self.name,
            client: self.client,
            key,
            key_types: self.key_types,
            mapper,
            local_indexes: self.local_indexes,
            global_indexes: self.global_indexes,
            use_next_id: self.use_next_id,
            limits: self.limits,
            retry: self.retry,
            max_pages: self.max_pages,
        })
    }
}

impl<C> fmt::Debug for TableBuilder<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableBuilder")
            .field("name", &self.name)
            .field("mapping", &self.mapping)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Payload;
    use crate::codec::DerivedKind;

    struct NoStore;

    impl StoreClient for NoStore {
        async fn request(&self, _: Operation, _: Payload) -> Result<Payload, Error> {
            Ok(Payload::Null)
        }
    }

    #[test]
    fn test_table_must_have_a_name() {
        let err = Table::builder("", NoStore).build().unwrap_err();
        assert!(err.is_validation_error());
    }

    #[test]
    fn test_key_defaults() {
        let table = Table::builder("t", NoStore).build().unwrap();
        assert_eq!(table.key().fields(), ["id"]);

        let table = Table::builder("t", NoStore)
            .mapping("forum", WireType::S)
            .mapping("subject", WireType::S)
            .mapping("views", WireType::N)
            .build()
            .unwrap();
        assert_eq!(table.key().fields(), ["forum", "subject"]);

        let table = Table::builder("t", NoStore)
            .mapping("views", WireType::N)
            .key(["slug"])
            .build()
            .unwrap();
        assert_eq!(table.key().fields(), ["slug"]);
    }

    #[test]
    fn test_key_type_resolution() {
        let table = Table::builder("t", NoStore)
            .key(["id", "created"])
            .mapping("created", DerivedKind::Timestamp)
            .mapping("tags", WireType::Ss)
            .key_type("id", WireType::N)
            .build()
            .unwrap();

        assert_eq!(table.key_type("id").unwrap(), WireType::N);
        assert_eq!(table.key_type("created").unwrap(), WireType::N);
        assert_eq!(table.key_type("other").unwrap(), WireType::S);
        assert!(table.key_type("tags").unwrap_err().is_validation_error());
    }

    #[test]
    fn test_default_key() {
        let table = Table::builder("t", NoStore)
            .key(["id", "range"])
            .key_type("id", WireType::N)
            .key_type("range", WireType::B)
            .build()
            .unwrap();

        assert_eq!(
            table.default_key().unwrap(),
            Key::Positional(vec![Value::Int(0), Value::Bytes(vec![0xd3, 0x4d, 0x34])])
        );
    }

    #[test]
    fn test_non_scalar_key_type_is_rejected() {
        let err = Table::builder("t", NoStore)
            .key_type("id", WireType::Ns)
            .build()
            .unwrap_err();
        assert!(err.is_validation_error());
    }
}
