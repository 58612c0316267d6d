use crate::Error;
use crate::codec::FieldMapping;
use crate::value::{Record, Value};
use crate::wire::Item;

/// Ordered primary key fields: partition key, then optional sort key
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeySpec {
    fields: Vec<String>,
}

impl KeySpec {
    /// Key of one or two distinct, non-empty field names
    pub fn new<I, S>(fields: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if fields.is_empty() || fields.len() > 2 {
            return Err(Error::validation(format!(
                "key must have one or two fields, got {}",
                fields.len()
            )));
        }
        if fields.iter().any(String::is_empty) {
            return Err(Error::validation("key field names must not be empty"));
        }
        if fields.len() == 2 && fields[0] == fields[1] {
            return Err(Error::validation(format!(
                "partition and sort key are both `{}`",
                fields[0]
            )));
        }
        Ok(Self { fields })
    }

    /// Partition key field
    pub fn partition_key(&self) -> &str {
        &self.fields[0]
    }

    /// Sort key field
    pub fn sort_key(&self) -> Option<&str> {
        self.fields.get(1).map(String::as_str)
    }

    /// Key fields in order
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// `true` if `field` is part of the primary key
    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    /// Build the wire key of `key`
    ///
    /// Positional values are zipped against the key fields in order. Every component
    /// must encode to a non-empty attribute.
    pub fn resolve(&self, key: Key, mapping: &FieldMapping) -> Result<Item, Error> {
        let components: Vec<(String, Value)> = match key {
            Key::Positional(values) => {
                if values.is_empty() {
                    return Err(Error::validation("key has no components"));
                }
                if values.len() > self.fields.len() {
                    return Err(Error::validation(format!(
                        "key has {} components but the table key is {:?}",
                        values.len(),
                        self.fields
                    )));
                }
                self.fields.iter().cloned().zip(values).collect()
            }
            Key::Named(record) => {
                if let Some(field) = record.keys().find(|f| !self.contains(f)) {
                    return Err(Error::validation(format!(
                        "`{field}` is not a key field of {:?}",
                        self.fields
                    )));
                }
                if !record.contains_key(self.partition_key()) {
                    return Err(Error::validation(format!(
                        "key is missing partition key `{}`",
                        self.partition_key()
                    )));
                }
                record.into_iter().collect()
            }
        };

        let owner: Record = components.iter().cloned().collect();
        let mut item = Item::with_capacity(components.len());
        for (field, value) in &components {
            let attr = mapping.encode(value, field, &owner)?.ok_or_else(|| {
                Error::validation(format!("key field `{field}` has an empty value"))
            })?;
            let _ = item.insert(field.clone(), attr);
        }
        Ok(item)
    }
}

/// Key of one item, as given by the caller
///
/// Converts from a bare scalar, a tuple or list of components (positional), or a
/// record of key fields (named).
#[derive(Clone, Debug, PartialEq)]
pub enum Key {
    /// Components in key field order
    Positional(Vec<Value>),
    /// Components by field name
    Named(Record),
}

impl From<Value> for Key {
    fn from(value: Value) -> Self {
        match value {
            Value::List(values) => Key::Positional(values),
            Value::Map(record) => Key::Named(record),
            other => Key::Positional(vec![other]),
        }
    }
}

impl From<Vec<Value>> for Key {
    fn from(values: Vec<Value>) -> Self {
        Key::Positional(values)
    }
}

impl From<Record> for Key {
    fn from(record: Record) -> Self {
        Key::Named(record)
    }
}

impl<A: Into<Value>, B: Into<Value>> From<(A, B)> for Key {
    fn from((partition, sort): (A, B)) -> Self {
        Key::Positional(vec![partition.into(), sort.into()])
    }
}

macro_rules! scalar_key {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Key {
                fn from(value: $ty) -> Self {
                    Key::Positional(vec![value.into()])
                }
            }
        )*
    };
}

scalar_key!(&str, String, i32, i64, u32, f64, Vec<u8>, &[u8]);
