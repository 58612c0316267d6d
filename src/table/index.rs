use tracing::debug;

use crate::client::StoreClient;
use crate::table::Table;
use crate::table::condition::ConditionSet;

impl<C: StoreClient> Table<C> {
    /// Pick the secondary index a query on `conditions` must target
    ///
    /// Returns `None` when every condition is on a primary key field. Otherwise tries,
    /// in order:
    ///
    /// 1. the first local index sorted by one of the non-key fields
    /// 2. the first global index partitioned by a condition field whose key fields cover
    ///    every condition
    /// 3. the first non-key field name itself, left for the store to accept or reject
    pub fn route_index(&self, conditions: &ConditionSet) -> Option<String> {
        let non_key: Vec<&str> = conditions
            .keys()
            .map(String::as_str)
            .filter(|field| !self.key.contains(field))
            .collect();
        let first = *non_key.first()?;

        if let Some(index) = self
            .local_indexes
            .iter()
            .find(|index| non_key.contains(&index.sort_key.as_str()))
        {
            return Some(index.name.clone());
        }

        if let Some(index) = self.global_indexes.iter().find(|index| {
            conditions.contains_key(&index.partition_key)
                && conditions
                    .keys()
                    .all(|field| index.key_fields().any(|key| key == field.as_str()))
        }) {
            return Some(index.name.clone());
        }

        debug!(table = %self.name, field = first, "no declared index matches, using field name");
        Some(first.to_string())
    }
}
