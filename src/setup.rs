//! Table definitions and lifecycle operations.

use tracing::{debug, instrument};

use crate::Error;
use crate::client::{Operation, StoreClient};
use crate::table::{CreateTableOptions, Table};
use crate::wire::{
    AttributeDefinition, CreateTableInput, GlobalSecondaryIndex, KeySchemaElement, KeyType,
    ListTablesInput, ListTablesOutput, LocalSecondaryIndex, ProvisionedThroughput,
    TableDescription, TableNameInput, TableOutput, UpdateTableInput,
};

fn key_element(field: &str, key_type: KeyType) -> KeySchemaElement {
    KeySchemaElement {
        attribute_name: field.to_string(),
        key_type,
    }
}

fn throughput(read: i64, write: i64) -> Result<ProvisionedThroughput, Error> {
    if read < 1 || write < 1 {
        return Err(Error::validation(format!(
            "provisioned throughput must be at least 1, got {read}/{write}"
        )));
    }
    Ok(ProvisionedThroughput {
        read_capacity_units: read,
        write_capacity_units: write,
    })
}

impl<C: StoreClient> Table<C> {
    /// Build the `CreateTable` request of this table
    ///
    /// Every key field of the table and of its indexes gets exactly one attribute
    /// definition, typed by [`Table::key_type`].
    pub fn create_table_input(
        &self,
        options: &CreateTableOptions,
    ) -> Result<CreateTableInput, Error> {
        let mut key_fields: Vec<&str> = self.key.fields().iter().map(String::as_str).collect();
        key_fields.extend(self.local_indexes.iter().map(|index| index.sort_key.as_str()));
        for index in &self.global_indexes {
            key_fields.extend(index.key_fields());
        }

        let mut attribute_definitions: Vec<AttributeDefinition> = Vec::new();
        for field in key_fields {
            if attribute_definitions.iter().any(|d| d.attribute_name == field) {
                continue;
            }
            attribute_definitions.push(AttributeDefinition {
                attribute_name: field.to_string(),
                attribute_type: self.key_type(field)?,
            });
        }

        let mut key_schema = vec![key_element(self.key.partition_key(), KeyType::Hash)];
        if let Some(sort_key) = self.key.sort_key() {
            key_schema.push(key_element(sort_key, KeyType::Range));
        }

        let local_indexes: Vec<LocalSecondaryIndex> = self
            .local_indexes
            .iter()
            .map(|index| LocalSecondaryIndex {
                index_name: index.name.clone(),
                key_schema: vec![
                    key_element(self.key.partition_key(), KeyType::Hash),
                    key_element(&index.sort_key, KeyType::Range),
                ],
                projection: index.projection.to_wire(),
            })
            .collect();

        let mut global_indexes: Vec<GlobalSecondaryIndex> = Vec::new();
        for index in &self.global_indexes {
            let mut key_schema = vec![key_element(&index.partition_key, KeyType::Hash)];
            if let Some(sort_key) = &index.sort_key {
                key_schema.push(key_element(sort_key, KeyType::Range));
            }
            global_indexes.push(GlobalSecondaryIndex {
                index_name: index.name.clone(),
                key_schema,
                projection: index.projection.to_wire(),
                provisioned_throughput: throughput(
                    index.throughput.read_capacity_units,
                    index.throughput.write_capacity_units,
                )?,
            });
        }

        Ok(CreateTableInput {
            table_name: self.name.clone(),
            attribute_definitions,
            key_schema,
            local_secondary_indexes: (!local_indexes.is_empty()).then_some(local_indexes),
            global_secondary_indexes: (!global_indexes.is_empty()).then_some(global_indexes),
            provisioned_throughput: throughput(options.read_capacity, options.write_capacity)?,
        })
    }

    /// Create this table with its key and indexes
    ///
    /// The store's errors, including "table already exists", are returned unchanged.
    #[instrument(skip_all, fields(table = %self.name))]
    pub async fn create_table(
        &self,
        options: CreateTableOptions,
    ) -> Result<TableDescription, Error> {
        let input = self.create_table_input(&options)?;
        let output: TableOutput = self.send(Operation::CreateTable, &input).await?;
        Ok(output.table_description.unwrap_or_default())
    }

    /// Describe this table
    ///
    /// Use [`TableDescription::is_active`] to check whether it accepts requests yet.
    pub async fn describe_table(&self) -> Result<TableDescription, Error> {
        let input = TableNameInput {
            table_name: self.name.clone(),
        };
        let output: TableOutput = self.send(Operation::DescribeTable, &input).await?;
        Ok(output.table_description.unwrap_or_default())
    }

    /// Change the provisioned capacity of this table
    pub async fn update_table(&self, read: i64, write: i64) -> Result<TableDescription, Error> {
        let input = UpdateTableInput {
            table_name: self.name.clone(),
            provisioned_throughput: throughput(read, write)?,
        };
        let output: TableOutput = self.send(Operation::UpdateTable, &input).await?;
        Ok(output.table_description.unwrap_or_default())
    }

    /// Delete this table
    pub async fn delete_table(&self) -> Result<TableDescription, Error> {
        let input = TableNameInput {
            table_name: self.name.clone(),
        };
        let output: TableOutput = self.send(Operation::DeleteTable, &input).await?;
        Ok(output.table_description.unwrap_or_default())
    }

    /// Names of every table in the store, following pages to the end
    pub async fn list_tables(&self) -> Result<Vec<String>, Error> {
        let mut input = ListTablesInput::default();
        let mut names = Vec::new();
        let mut pages = 0usize;

        loop {
            if let Some(max_pages) = self.max_pages {
                if pages >= max_pages {
                    return Err(Error::PageLimitExceeded {
                        operation: Operation::ListTables,
                        max_pages,
                    });
                }
            }

            let output: ListTablesOutput = self.send(Operation::ListTables, &input).await?;
            pages += 1;
            names.extend(output.table_names);

            match output.last_evaluated_table_name {
                Some(last) => input.exclusive_start_table_name = Some(last),
                None => break,
            }
        }

        debug!(tables = names.len(), pages, "listed tables");
        Ok(names)
    }
}
