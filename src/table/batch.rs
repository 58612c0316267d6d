use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Instant;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

use crate::Error;
use crate::client::{Operation, StoreClient};
use crate::table::Table;
use crate::table::helpers::{fan_out, retry_config};
use crate::table::key::Key;
use crate::table::mapper::ItemMapper;
use crate::table::types::{BatchGetOptions, BatchReadOutput, BatchWriteOutput};
use crate::value::Record;
use crate::wire::{
    BatchGetItemInput, BatchGetItemOutput, BatchWriteItemInput, BatchWriteItemOutput, Item,
    KeysAndAttributes, RawItem, WriteRequest,
};

/// Keys to read from one table in a multi-table batch get
pub struct BatchGetGroup<'a, C> {
    table: &'a Table<C>,
    keys: Vec<Key>,
    options: BatchGetOptions,
}

impl<'a, C: StoreClient> BatchGetGroup<'a, C> {
    /// Read `keys` from `table`
    pub fn new<K: Into<Key>>(table: &'a Table<C>, keys: impl IntoIterator<Item = K>) -> Self {
        Self {
            table,
            keys: keys.into_iter().map(Into::into).collect(),
            options: BatchGetOptions::default(),
        }
    }

    /// Read options applied to every key of this table
    pub fn options(mut self, options: BatchGetOptions) -> Self {
        self.options = options;
        self
    }
}

impl<C> fmt::Debug for BatchGetGroup<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchGetGroup")
            .field("table", &self.table.name)
            .field("keys", &self.keys.len())
            .field("options", &self.options)
            .finish()
    }
}

/// Puts and deletes against one table in a multi-table batch write
pub struct BatchWriteGroup<'a, C> {
    table: &'a Table<C>,
    puts: Vec<Record>,
    deletes: Vec<Key>,
}

impl<'a, C: StoreClient> BatchWriteGroup<'a, C> {
    /// No operations on `table` yet
    pub fn new(table: &'a Table<C>) -> Self {
        Self {
            table,
            puts: Vec::new(),
            deletes: Vec::new(),
        }
    }

    /// Put `record`
    pub fn put(mut self, record: Record) -> Self {
        self.puts.push(record);
        self
    }

    /// Put every record
    pub fn puts(mut self, records: impl IntoIterator<Item = Record>) -> Self {
        self.puts.extend(records);
        self
    }

    /// Delete the item with `key`
    pub fn delete(mut self, key: impl Into<Key>) -> Self {
        self.deletes.push(key.into());
        self
    }

    /// Delete every key
    pub fn deletes<K: Into<Key>>(mut self, keys: impl IntoIterator<Item = K>) -> Self {
        self.deletes.extend(keys.into_iter().map(Into::into));
        self
    }
}

impl<C> fmt::Debug for BatchWriteGroup<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchWriteGroup")
            .field("table", &self.table.name)
            .field("puts", &self.puts.len())
            .field("deletes", &self.deletes.len())
            .finish()
    }
}

/// Responses gathered by one get chunk, plus its resubmission count
type ChunkResponses = (BTreeMap<String, Vec<RawItem>>, usize);

impl<C: StoreClient> Table<C> {
    /// Get many items of this table by key
    ///
    /// Keys are split into requests of at most [`BatchLimits::get`](crate::BatchLimits)
    /// keys, sent concurrently. Unprocessed keys reported by the store are resubmitted
    /// until none remain or the retry ceiling is hit.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use dynamo_mapper::{BatchGetOptions, Error, StoreClient, Table};
    ///
    /// async fn example<C: StoreClient>(users: &Table<C>) -> Result<(), Error> {
    ///     let ids = (1..=250).map(|n| format!("user-{n}"));
    ///     // 3 requests: 100 + 100 + 50 keys
    ///     let found = users.batch_get(ids, BatchGetOptions::default()).await?;
    ///     println!("found {} users", found.len());
    ///     Ok(())
    /// }
    /// ```
    pub async fn batch_get<K: Into<Key>>(
        &self,
        keys: impl IntoIterator<Item = K>,
        options: BatchGetOptions,
    ) -> Result<Vec<Record>, Error> {
        let group = BatchGetGroup::new(self, keys).options(options);
        let mut output = Self::batch_get_many(vec![group]).await?;
        Ok(output.items.remove(&self.name).unwrap_or_default())
    }

    /// Put and delete many items of this table
    ///
    /// Operations are split into requests of at most
    /// [`BatchLimits::write`](crate::BatchLimits) entries, sent concurrently.
    pub async fn batch_write<K: Into<Key>>(
        &self,
        puts: impl IntoIterator<Item = Record>,
        deletes: impl IntoIterator<Item = K>,
    ) -> Result<BatchWriteOutput, Error> {
        let group = BatchWriteGroup::new(self).puts(puts).deletes(deletes);
        Self::batch_write_many(vec![group]).await
    }

    /// Get items from several tables at once
    ///
    /// Requests go through the first group's client, with its batch limits and retry
    /// policy. Items are decoded by the mapper of the table they belong to and returned
    /// per table name, in request order. Groups naming the same table must carry the
    /// same options.
    #[instrument(skip_all, fields(groups = groups.len()))]
    pub async fn batch_get_many(groups: Vec<BatchGetGroup<'_, C>>) -> Result<BatchReadOutput, Error> {
        let started = Instant::now();
        let Some(driver) = groups.first().map(|group| group.table) else {
            return Ok(BatchReadOutput::default());
        };

        // one set of read options per table
        let mut table_options: HashMap<&str, &BatchGetOptions> = HashMap::new();
        for group in &groups {
            let name = group.table.name.as_str();
            let options = *table_options.entry(name).or_insert(&group.options);
            if options != &group.options {
                return Err(Error::validation(format!(
                    "batch get groups for table {name} have different options"
                )));
            }
        }

        // resolve every key before sending anything
        let mut entries: Vec<(&str, &BatchGetOptions, Item)> = Vec::new();
        for group in &groups {
            for key in &group.keys {
                let item = group.table.resolve_key(key.clone())?;
                entries.push((group.table.name.as_str(), &group.options, item));
            }
        }
        if entries.is_empty() {
            return Ok(BatchReadOutput::default());
        }

        let chunks: Vec<BatchGetItemInput> = entries
            .chunks(driver.limits.get)
            .map(|chunk| {
                let mut request_items: BTreeMap<String, KeysAndAttributes> = BTreeMap::new();
                for (table, options, item) in chunk {
                    request_items
                        .entry(table.to_string())
                        .or_insert_with(|| KeysAndAttributes {
                            keys: Vec::new(),
                            attributes_to_get: options.attributes.clone(),
                            consistent_read: options.consistent_read.then_some(true),
                        })
                        .keys
                        .push(item.clone());
                }
                BatchGetItemInput { request_items }
            })
            .collect();
        let chunk_count = chunks.len();
        debug!(keys = entries.len(), chunks = chunk_count, "batch get");

        let settled = fan_out::join_all(
            chunks
                .into_iter()
                .enumerate()
                .map(|(index, input)| driver.settle_get(index, input)),
            driver.limits.concurrency,
        )
        .await?;

        let mappers: HashMap<&str, &ItemMapper> = groups
            .iter()
            .map(|group| (group.table.name.as_str(), &group.table.mapper))
            .collect();
        let fallback = ItemMapper::default();

        let mut output = BatchReadOutput {
            chunks: chunk_count,
            ..BatchReadOutput::default()
        };
        for (responses, retries) in settled {
            output.retry_count += retries;
            for (table, raw_items) in responses {
                let mapper = mappers.get(table.as_str()).copied().unwrap_or(&fallback);
                let records = raw_items
                    .into_iter()
                    .map(|raw| mapper.from_raw(raw))
                    .collect::<Result<Vec<_>, _>>()?;
                output.items.entry(table).or_default().extend(records);
            }
        }
        output.total_duration = started.elapsed();
        Ok(output)
    }

    /// Put and delete items in several tables at once
    ///
    /// Requests go through the first group's client, with its batch limits and retry
    /// policy.
    #[instrument(skip_all, fields(groups = groups.len()))]
    pub async fn batch_write_many(
        groups: Vec<BatchWriteGroup<'_, C>>,
    ) -> Result<BatchWriteOutput, Error> {
        let started = Instant::now();
        let Some(driver) = groups.first().map(|group| group.table) else {
            return Ok(BatchWriteOutput::default());
        };

        let mut entries: Vec<(&str, WriteRequest)> = Vec::new();
        for group in &groups {
            let table = group.table;
            for record in &group.puts {
                entries.push((table.name.as_str(), WriteRequest::put(table.to_item(record)?)));
            }
            for key in &group.deletes {
                let key = table.resolve_key(key.clone())?;
                entries.push((table.name.as_str(), WriteRequest::delete(key)));
            }
        }
        if entries.is_empty() {
            return Ok(BatchWriteOutput::default());
        }

        let chunks: Vec<BatchWriteItemInput> = entries
            .chunks(driver.limits.write)
            .map(|chunk| {
                let mut request_items: BTreeMap<String, Vec<WriteRequest>> = BTreeMap::new();
                for (table, request) in chunk {
                    request_items
                        .entry(table.to_string())
                        .or_default()
                        .push(request.clone());
                }
                BatchWriteItemInput { request_items }
            })
            .collect();
        let chunk_count = chunks.len();
        debug!(operations = entries.len(), chunks = chunk_count, "batch write");

        let retries = fan_out::join_all(
            chunks
                .into_iter()
                .enumerate()
                .map(|(index, input)| driver.settle_write(index, input)),
            driver.limits.concurrency,
        )
        .await?;

        Ok(BatchWriteOutput {
            chunks: chunk_count,
            retry_count: retries.into_iter().sum(),
            total_duration: started.elapsed(),
        })
    }

    async fn settle_get(&self, chunk: usize, input: BatchGetItemInput) -> Result<ChunkResponses, Error> {
        let mut responses: BTreeMap<String, Vec<RawItem>> = BTreeMap::new();
        let retries = self
            .settle(Operation::BatchGetItem, chunk, input, |output: BatchGetItemOutput| {
                for (table, items) in output.responses {
                    responses.entry(table).or_default().extend(items);
                }
                let request_items: BTreeMap<_, _> = output
                    .unprocessed_keys
                    .into_iter()
                    .filter(|(_, keys)| !keys.keys.is_empty())
                    .collect();
                let remaining = request_items.values().map(|k| k.keys.len()).sum();
                (BatchGetItemInput { request_items }, remaining)
            })
            .await?;
        Ok((responses, retries))
    }

    async fn settle_write(&self, chunk: usize, input: BatchWriteItemInput) -> Result<usize, Error> {
        self.settle(Operation::BatchWriteItem, chunk, input, |output: BatchWriteItemOutput| {
            let request_items: BTreeMap<_, _> = output
                .unprocessed_items
                .into_iter()
                .filter(|(_, requests)| !requests.is_empty())
                .collect();
            let remaining = request_items.values().map(Vec::len).sum();
            (BatchWriteItemInput { request_items }, remaining)
        })
        .await
    }

    /// Send one chunk and resubmit its unprocessed remainder until nothing is left
    ///
    /// `absorb` takes each response and returns the remainder to resubmit with its
    /// size. Returns the number of resubmissions.
    async fn settle<I, O, F>(
        &self,
        operation: Operation,
        chunk: usize,
        mut input: I,
        mut absorb: F,
    ) -> Result<usize, Error>
    where
        I: Serialize,
        O: DeserializeOwned,
        F: FnMut(O) -> (I, usize),
    {
        let mut retries = 0;
        loop {
            let output: O = self.send(operation, &input).await?;
            let (remainder, remaining) = absorb(output);
            if remaining == 0 {
                return Ok(retries);
            }
            if retries >= self.retry.max_retries {
                return Err(Error::RetryLimitExceeded { operation, retries });
            }

            let delay =
                retry_config::retry_delay(retries, self.retry.initial_delay, self.retry.max_delay);
            warn!(
                %operation,
                chunk,
                remaining,
                attempt = retries + 1,
                ?delay,
                "resubmitting unprocessed requests"
            );
            sleep(delay).await;
            retries += 1;
            input = remainder;
        }
    }
}
