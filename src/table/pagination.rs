use futures_util::stream::{self, Stream, TryStreamExt};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::Error;
use crate::client::{Operation, StoreClient};
use crate::table::Table;
use crate::table::condition::{Comparator, Condition, ConditionSet};
use crate::table::helpers::fan_out;
use crate::table::types::{Page, QueryOptions, ScanOptions};
use crate::value::Record;
use crate::wire::{Cursor, ListOutput, QueryInput, ScanInput, Select, WireConditions};

/// Query or scan request that can be resumed from a cursor
trait ListInput: Serialize {
    const OPERATION: Operation;

    fn set_cursor(&mut self, cursor: Cursor);

    fn limit(&self) -> Option<i32>;

    fn is_count(&self) -> bool;
}

impl ListInput for QueryInput {
    const OPERATION: Operation = Operation::Query;

    fn set_cursor(&mut self, cursor: Cursor) {
        self.exclusive_start_key = Some(cursor);
    }

    fn limit(&self) -> Option<i32> {
        self.limit
    }

    fn is_count(&self) -> bool {
        self.select == Some(Select::Count)
    }
}

impl ListInput for ScanInput {
    const OPERATION: Operation = Operation::Scan;

    fn set_cursor(&mut self, cursor: Cursor) {
        self.exclusive_start_key = Some(cursor);
    }

    fn limit(&self) -> Option<i32> {
        self.limit
    }

    fn is_count(&self) -> bool {
        self.select == Some(Select::Count)
    }
}

/// Result of one complete paginated read
#[derive(Debug, Default)]
struct Accumulated {
    items: Vec<Record>,
    count: i64,
}

/// Largest `total_segments` the store accepts
const MAX_SEGMENTS: u32 = 1_000_000;

fn wire_limit(limit: Option<u32>) -> Option<i32> {
    limit.map(|l| i32::try_from(l).unwrap_or(i32::MAX))
}

impl<C: StoreClient> Table<C> {
    /// Query items matching key `conditions`, following cursors until the last page
    ///
    /// Reading stops early once `options.limit` items have been gathered. The index is
    /// `options.index_name` when set, otherwise the one routed from the conditions.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use dynamo_mapper::{Condition, ConditionSet, Error, QueryOptions, StoreClient, Table};
    ///
    /// async fn example<C: StoreClient>(threads: &Table<C>) -> Result<(), Error> {
    ///     let mut conditions = ConditionSet::new();
    ///     conditions.insert("forum".to_string(), Condition::eq("rust"));
    ///     conditions.insert("subject".to_string(), Condition::begins_with("async"));
    ///
    ///     let items = threads.query(&conditions, QueryOptions::default()).await?;
    ///     println!("{} threads", items.len());
    ///     Ok(())
    /// }
    /// ```
    #[instrument(skip_all, fields(table = %self.name))]
    pub async fn query(
        &self,
        conditions: &ConditionSet,
        options: QueryOptions,
    ) -> Result<Vec<Record>, Error> {
        let input = self.query_input(conditions, options, None)?;
        Ok(self.read_all(input).await?.items)
    }

    /// Count items matching key `conditions` without fetching them
    #[instrument(skip_all, fields(table = %self.name))]
    pub async fn query_count(
        &self,
        conditions: &ConditionSet,
        options: QueryOptions,
    ) -> Result<i64, Error> {
        let input = self.query_input(conditions, options, Some(Select::Count))?;
        Ok(self.read_all(input).await?.count)
    }

    /// Fetch a single page of a query
    ///
    /// Pass the returned cursor as `exclusive_start_key` to fetch the next page.
    pub async fn query_page(
        &self,
        conditions: &ConditionSet,
        options: QueryOptions,
    ) -> Result<Page, Error> {
        let input = self.query_input(conditions, options, None)?;
        self.read_page(&input).await
    }

    /// Stream the records of a query, fetching pages lazily
    pub fn query_stream<'a>(
        &'a self,
        conditions: &ConditionSet,
        options: QueryOptions,
    ) -> impl Stream<Item = Result<Record, Error>> + use<'a, C> {
        let first = self.query_input(conditions, options, None);

        stream::try_unfold(Some(first), move |state| async move {
            let Some(input) = state else {
                return Ok::<_, Error>(None);
            };
            let mut input = input?;
            let page = self.read_page(&input).await?;

            let next = page.cursor.map(|cursor| {
                input.set_cursor(cursor);
                Ok(input)
            });
            Ok(Some((page.items, next)))
        })
        .map_ok(|items| stream::iter(items.into_iter().map(Ok)))
        .try_flatten()
    }

    /// Scan the table, following cursors until the last page
    ///
    /// With `total_segments` set and no `segment`, every segment is scanned
    /// concurrently and the results are concatenated in segment order.
    #[instrument(skip_all, fields(table = %self.name))]
    pub async fn scan(
        &self,
        filter: &ConditionSet,
        options: ScanOptions,
    ) -> Result<Vec<Record>, Error> {
        let inputs = self.scan_inputs(filter, options, None)?;
        let segments = self.read_segments(inputs).await?;
        Ok(segments.into_iter().flat_map(|segment| segment.items).collect())
    }

    /// Count items passing `filter`, summing over segments when scanning in parallel
    #[instrument(skip_all, fields(table = %self.name))]
    pub async fn scan_count(&self, filter: &ConditionSet, options: ScanOptions) -> Result<i64, Error> {
        let inputs = self.scan_inputs(filter, options, Some(Select::Count))?;
        let segments = self.read_segments(inputs).await?;
        Ok(segments.iter().map(|segment| segment.count).sum())
    }

    /// Fetch a single page of a scan
    pub async fn scan_page(&self, filter: &ConditionSet, options: ScanOptions) -> Result<Page, Error> {
        let mut inputs = self.scan_inputs(filter, options, None)?;
        if inputs.len() != 1 {
            return Err(Error::validation(
                "a single scan page needs an explicit segment when total_segments > 1",
            ));
        }
        match inputs.pop() {
            Some(input) => self.read_page(&input).await,
            None => Err(Error::validation("scan has no segment to read")),
        }
    }

    fn query_input(
        &self,
        conditions: &ConditionSet,
        options: QueryOptions,
        select: Option<Select>,
    ) -> Result<QueryInput, Error> {
        if conditions.is_empty() {
            return Err(Error::validation("query needs at least one key condition"));
        }

        Ok(QueryInput {
            table_name: self.name.clone(),
            index_name: options.index_name.or_else(|| self.route_index(conditions)),
            key_conditions: self.wire_conditions(conditions)?,
            attributes_to_get: options.attributes,
            limit: wire_limit(options.limit),
            consistent_read: options.consistent_read.then_some(true),
            scan_index_forward: options.scan_index_forward,
            exclusive_start_key: options.exclusive_start_key,
            select,
        })
    }

    /// One request per segment to read
    fn scan_inputs(
        &self,
        filter: &ConditionSet,
        options: ScanOptions,
        select: Option<Select>,
    ) -> Result<Vec<ScanInput>, Error> {
        let segments: Vec<(Option<i32>, Option<i32>)> = match (options.segment, options.total_segments) {
            (None, None) => vec![(None, None)],
            (Some(_), None) => {
                return Err(Error::validation("scan segment requires total_segments"));
            }
            (_, Some(0)) => return Err(Error::validation("total_segments must be at least 1")),
            (_, Some(total)) if total > MAX_SEGMENTS => {
                return Err(Error::validation(format!(
                    "total_segments {total} exceeds the maximum of {MAX_SEGMENTS}"
                )));
            }
            (Some(segment), Some(total)) if segment >= total => {
                return Err(Error::validation(format!(
                    "scan segment {segment} is out of range for {total} segments"
                )));
            }
            (Some(segment), Some(total)) => vec![(wire_limit(Some(segment)), wire_limit(Some(total)))],
            (None, Some(total)) => {
                if total > 1 && options.exclusive_start_key.is_some() {
                    return Err(Error::validation(
                        "a parallel scan cannot resume from a single cursor",
                    ));
                }
                let total = wire_limit(Some(total));
                (0..total.unwrap_or(1)).map(|s| (Some(s), total)).collect()
            }
        };

        let scan_filter = self.scan_filter(filter)?;
        Ok(segments
            .into_iter()
            .map(|(segment, total_segments)| ScanInput {
                table_name: self.name.clone(),
                scan_filter: scan_filter.clone(),
                attributes_to_get: options.attributes.clone(),
                limit: wire_limit(options.limit),
                exclusive_start_key: options.exclusive_start_key.clone(),
                select,
                segment,
                total_segments,
            })
            .collect())
    }

    /// Caller filter, plus the exclusion of the id counter item when enabled
    fn scan_filter(&self, filter: &ConditionSet) -> Result<Option<WireConditions>, Error> {
        if !self.use_next_id {
            return self.optional_conditions(filter);
        }

        let mut filter = filter.clone();
        for field in self.key.fields() {
            if !filter.contains_key(field) {
                let reserved = self.default_key_value(field)?;
                let _ = filter.insert(
                    field.clone(),
                    Condition::Compare(Comparator::Ne, vec![reserved]),
                );
            }
        }
        self.optional_conditions(&filter)
    }

    /// Read every segment concurrently, results in segment order
    async fn read_segments(&self, inputs: Vec<ScanInput>) -> Result<Vec<Accumulated>, Error> {
        let concurrency = inputs.len();
        if concurrency > 1 {
            debug!(table = %self.name, segments = concurrency, "scanning segments in parallel");
        }
        fan_out::join_all(inputs.into_iter().map(|input| self.read_all(input)), concurrency).await
    }

    async fn read_page<I: ListInput>(&self, input: &I) -> Result<Page, Error> {
        let output: ListOutput = self.send(I::OPERATION, input).await?;
        let items = output
            .items
            .into_iter()
            .map(|raw| self.mapper.from_raw(raw))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            count: output.count,
            scanned_count: output.scanned_count,
            cursor: output.last_evaluated_key.map(Cursor::new),
        })
    }

    /// Follow cursors until the store returns none or the limit is satisfied
    async fn read_all<I: ListInput>(&self, mut input: I) -> Result<Accumulated, Error> {
        let count_only = input.is_count();
        let limit = input.limit().map(i64::from);
        let mut acc = Accumulated::default();
        let mut pages = 0usize;

        loop {
            if let Some(max_pages) = self.max_pages {
                if pages >= max_pages {
                    return Err(Error::PageLimitExceeded {
                        operation: I::OPERATION,
                        max_pages,
                    });
                }
            }

            let output: ListOutput = self.send(I::OPERATION, &input).await?;
            pages += 1;
            debug!(
                table = %self.name,
                operation = %I::OPERATION,
                page = pages,
                count = output.count,
                "page received"
            );

            let gathered = if count_only {
                acc.count += output.count;
                acc.count
            } else {
                for raw in output.items {
                    acc.items.push(self.mapper.from_raw(raw)?);
                }
                acc.count = acc.items.len() as i64;
                acc.count
            };

            let satisfied = limit.is_some_and(|limit| gathered >= limit);
            match output.last_evaluated_key {
                Some(cursor) if !satisfied => input.set_cursor(Cursor::new(cursor)),
                _ => return Ok(acc),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_limit_saturates() {
        assert_eq!(wire_limit(None), None);
        assert_eq!(wire_limit(Some(10)), Some(10));
        assert_eq!(wire_limit(Some(u32::MAX)), Some(i32::MAX));
    }
}
