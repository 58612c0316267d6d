use std::collections::BTreeMap;
use tracing::instrument;

use crate::Error;
use crate::client::{Operation, StoreClient};
use crate::table::key::Key;
use crate::table::types::{
    DeleteOptions, GetOptions, PutOptions, ReturnValues, UpdateOptions,
};
use crate::table::Table;
use crate::value::{Record, Value};
use crate::wire::{
    AttributeUpdate, DeleteItemInput, GetItemInput, GetItemOutput, PutItemInput,
    UpdateAction, UpdateItemInput, WriteOutput,
};

/// Field holding the counter of [`Table::next_id`]
const LAST_ID_FIELD: &str = "lastId";

/// Attribute-level actions of an update
///
/// When several actions name the same attribute, the first one registered wins, with
/// puts registered before adds and adds before deletes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateActions {
    put: Vec<(String, Value)>,
    add: Vec<(String, Value)>,
    delete: Vec<(String, Option<Value>)>,
}

impl UpdateActions {
    /// No actions
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace `field` with `value`; an empty value deletes the attribute
    pub fn put(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.put.push((field.into(), value.into()));
        self
    }

    /// Add `value` to a number, or union it into a set
    pub fn add(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.add.push((field.into(), value.into()));
        self
    }

    /// Remove `field` entirely
    pub fn delete(mut self, field: impl Into<String>) -> Self {
        self.delete.push((field.into(), None));
        self
    }

    /// Remove `members` from the set in `field`
    pub fn delete_members(mut self, field: impl Into<String>, members: impl Into<Value>) -> Self {
        self.delete.push((field.into(), Some(members.into())));
        self
    }

    /// `true` if no action is registered
    pub fn is_empty(&self) -> bool {
        self.put.is_empty() && self.add.is_empty() && self.delete.is_empty()
    }

    /// Parse the declarative form `{put: {..}, add: {..}, delete: ..}`
    ///
    /// `delete` is a field name, a map of set members to remove, or a list of either.
    /// Any other action name is rejected.
    pub fn from_record(record: Record) -> Result<Self, Error> {
        let mut actions = Self::new();
        for (action, value) in record {
            match action.as_str() {
                "put" => actions.put.extend(action_fields(&action, value)?),
                "add" => actions.add.extend(action_fields(&action, value)?),
                "delete" => actions.push_deletes(value)?,
                _ => {
                    return Err(Error::validation(format!(
                        "actions must only contain put/add/delete attributes, got `{action}`"
                    )));
                }
            }
        }
        Ok(actions)
    }

    fn push_deletes(&mut self, value: Value) -> Result<(), Error> {
        match value {
            Value::String(field) => self.delete.push((field, None)),
            Value::Map(members) => self
                .delete
                .extend(members.into_iter().map(|(field, v)| (field, Some(v)))),
            Value::List(entries) => {
                for entry in entries {
                    match entry {
                        Value::String(_) | Value::Map(_) => self.push_deletes(entry)?,
                        other => {
                            return Err(Error::validation(format!(
                                "delete action entries must be field names or maps, got {other:?}"
                            )));
                        }
                    }
                }
            }
            other => {
                return Err(Error::validation(format!(
                    "delete action must be a field name, a map or a list, got {other:?}"
                )));
            }
        }
        Ok(())
    }
}

fn action_fields(action: &str, value: Value) -> Result<Vec<(String, Value)>, Error> {
    match value {
        Value::Map(fields) => Ok(fields.into_iter().collect()),
        other => Err(Error::validation(format!(
            "`{action}` action must be a map of fields, got {other:?}"
        ))),
    }
}

impl<C: StoreClient> Table<C> {
    /// Get an item by its primary key
    ///
    /// Returns `None` if no item has the key.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use dynamo_mapper::{Error, GetOptions, StoreClient, Table};
    ///
    /// async fn example<C: StoreClient>(posts: &Table<C>) -> Result<(), Error> {
    ///     // forum + subject key
    ///     let post = posts.get(("rust", "ownership"), GetOptions::default()).await?;
    ///
    ///     if let Some(post) = post {
    ///         println!("Found post: {post:?}");
    ///     }
    ///     Ok(())
    /// }
    /// ```
    pub async fn get(
        &self,
        key: impl Into<Key>,
        options: GetOptions,
    ) -> Result<Option<Record>, Error> {
        let input = GetItemInput {
            table_name: self.name.clone(),
            key: self.resolve_key(key)?,
            attributes_to_get: options.attributes,
            consistent_read: options.consistent_read.then_some(true),
        };

        let output: GetItemOutput = self.send(Operation::GetItem, &input).await?;
        self.mapper.from_raw_optional(output.item)
    }

    /// Put a whole record, replacing any item with the same key
    ///
    /// Returns the attributes requested through `return_values`.
    pub async fn put(&self, record: &Record, options: PutOptions) -> Result<Option<Record>, Error> {
        let input = PutItemInput {
            table_name: self.name.clone(),
            item: self.to_item(record)?,
            expected: self.optional_conditions(&options.expected)?,
            return_values: options.return_values.map(|r| r.as_str().to_string()),
        };

        let output: WriteOutput = self.send(Operation::PutItem, &input).await?;
        self.mapper.from_raw_optional(output.attributes)
    }

    /// Delete an item by its primary key
    ///
    /// Returns the attributes requested through `return_values`.
    pub async fn delete(
        &self,
        key: impl Into<Key>,
        options: DeleteOptions,
    ) -> Result<Option<Record>, Error> {
        let input = DeleteItemInput {
            table_name: self.name.clone(),
            key: self.resolve_key(key)?,
            expected: self.optional_conditions(&options.expected)?,
            return_values: options.return_values.map(|r| r.as_str().to_string()),
        };

        let output: WriteOutput = self.send(Operation::DeleteItem, &input).await?;
        self.mapper.from_raw_optional(output.attributes)
    }

    /// Apply attribute-level actions to an item
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use dynamo_mapper::{Error, StoreClient, Table, UpdateActions, UpdateOptions, Value};
    ///
    /// async fn example<C: StoreClient>(users: &Table<C>) -> Result<(), Error> {
    ///     let actions = UpdateActions::new()
    ///         .put("name", "Ferris")
    ///         .put("nickname", "") // deletes the attribute
    ///         .add("logins", 1)
    ///         .delete_members("roles", vec![Value::from("guest")]);
    ///
    ///     users.update("user-1", actions, UpdateOptions::default()).await?;
    ///     Ok(())
    /// }
    /// ```
    #[instrument(skip_all, fields(table = %self.name))]
    pub async fn update(
        &self,
        key: impl Into<Key>,
        actions: UpdateActions,
        options: UpdateOptions,
    ) -> Result<Option<Record>, Error> {
        let input = UpdateItemInput {
            table_name: self.name.clone(),
            key: self.resolve_key(key)?,
            attribute_updates: self.attribute_updates(actions)?,
            expected: self.optional_conditions(&options.expected)?,
            return_values: options.return_values.map(|r| r.as_str().to_string()),
        };

        let output: WriteOutput = self.send(Operation::UpdateItem, &input).await?;
        self.mapper.from_raw_optional(output.attributes)
    }

    /// Put every non-key field of `record` onto the item named by its key fields
    pub async fn update_record(
        &self,
        record: &Record,
        options: UpdateOptions,
    ) -> Result<Option<Record>, Error> {
        let mut key = Vec::with_capacity(self.key.fields().len());
        for field in self.key.fields() {
            let value = record.get(field).ok_or_else(|| {
                Error::validation(format!("record is missing key field `{field}`"))
            })?;
            key.push(value.clone());
        }

        let actions = record
            .iter()
            .filter(|(field, _)| !self.key.contains(field))
            .fold(UpdateActions::new(), |actions, (field, value)| {
                actions.put(field.clone(), value.clone())
            });

        self.update(Key::Positional(key), actions, options).await
    }

    /// Atomically add `amount` to a numeric attribute and return its new value
    ///
    /// Returns `None` when the store reports no new value.
    pub async fn increment(
        &self,
        key: impl Into<Key>,
        field: &str,
        amount: impl Into<Value>,
    ) -> Result<Option<Value>, Error> {
        let actions = UpdateActions::new().add(field, amount);
        let input = UpdateItemInput {
            table_name: self.name.clone(),
            key: self.resolve_key(key)?,
            attribute_updates: self.attribute_updates(actions)?,
            expected: None,
            return_values: Some(ReturnValues::UpdatedNew.as_str().to_string()),
        };

        let output: WriteOutput = self.send(Operation::UpdateItem, &input).await?;
        match output.attributes {
            Some(attributes) => match attributes.get(field) {
                Some(raw) => self.mapper.decode_raw_attribute(raw, field, &attributes),
                None => Ok(None),
            },
            None => Ok(None),
        }
    }

    /// Reserve the next sequential id
    ///
    /// The counter lives in the `lastId` attribute of the item whose key fields all hold
    /// their reserved default value (`"0"`, `0`, or the bytes of base64 `"0000"`).
    pub async fn next_id(&self, amount: i64) -> Result<Option<Value>, Error> {
        let key = self.default_key()?;
        self.increment(key, LAST_ID_FIELD, amount).await
    }

    /// Set the sequential id counter to `value`
    pub async fn init_id(&self, value: impl Into<Value>) -> Result<(), Error> {
        let key = self.default_key()?;
        let actions = UpdateActions::new().put(LAST_ID_FIELD, value);
        let _ = self.update(key, actions, UpdateOptions::default()).await?;
        Ok(())
    }

    pub(crate) fn attribute_updates(
        &self,
        actions: UpdateActions,
    ) -> Result<BTreeMap<String, AttributeUpdate>, Error> {
        if actions.is_empty() {
            return Err(Error::validation("update has no actions"));
        }

        let mapping = self.mapper.mapping();
        let owner = Record::new();
        let mut updates = BTreeMap::new();

        for (field, value) in actions.put {
            if updates.contains_key(&field) {
                continue;
            }
            let update = match mapping.encode(&value, &field, &owner)? {
                Some(attr) => AttributeUpdate {
                    action: UpdateAction::Put,
                    value: Some(attr),
                },
                // the store cannot hold an empty value, so clear the attribute instead
                None => AttributeUpdate {
                    action: UpdateAction::Delete,
                    value: None,
                },
            };
            let _ = updates.insert(field, update);
        }

        for (field, value) in actions.add {
            if updates.contains_key(&field) {
                continue;
            }
            let attr = mapping.encode(&value, &field, &owner)?.ok_or_else(|| {
                Error::validation(format!("cannot add an empty value to `{field}`"))
            })?;
            let _ = updates.insert(
                field,
                AttributeUpdate {
                    action: UpdateAction::Add,
                    value: Some(attr),
                },
            );
        }

        for (field, members) in actions.delete {
            if updates.contains_key(&field) {
                continue;
            }
            let value = match members {
                Some(members) => Some(mapping.encode(&members, &field, &owner)?.ok_or_else(|| {
                    Error::validation(format!("no set members to delete from `{field}`"))
                })?),
                None => None,
            };
            let _ = updates.insert(
                field,
                AttributeUpdate {
                    action: UpdateAction::Delete,
                    value,
                },
            );
        }

        Ok(updates)
    }
}
