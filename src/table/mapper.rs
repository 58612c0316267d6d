use serde_json::Value as Json;
use std::fmt;
use std::sync::Arc;

use crate::Error;
use crate::codec::FieldMapping;
use crate::value::{Record, Value};
use crate::wire::{Item, RawItem, WireAttribute};

/// Hook over a native record
pub type RecordHook = dyn Fn(Record) -> Record + Send + Sync;

/// Hook over a wire item
pub type ItemHook = dyn Fn(Item) -> Item + Send + Sync;

/// Whole record to and from whole wire item
///
/// Holds the table's field mapping plus four optional hooks: `pre_to` runs on the
/// record before encoding, `post_to` on the encoded item, `pre_from` on the item
/// before decoding and `post_from` on the decoded record.
#[derive(Clone, Default)]
pub struct ItemMapper {
    mapping: Arc<FieldMapping>,
    pub(crate) pre_to: Option<Arc<RecordHook>>,
    pub(crate) post_to: Option<Arc<ItemHook>>,
    pub(crate) pre_from: Option<Arc<ItemHook>>,
    pub(crate) post_from: Option<Arc<RecordHook>>,
}

impl ItemMapper {
    /// Mapper over `mapping` without hooks
    pub fn new(mapping: FieldMapping) -> Self {
        Self {
            mapping: Arc::new(mapping),
            ..Self::default()
        }
    }

    /// The field mapping
    pub fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }

    /// Encode a record, dropping fields that encode to nothing
    pub fn to_item(&self, record: &Record) -> Result<Item, Error> {
        let record = match &self.pre_to {
            Some(hook) => hook(record.clone()),
            None => record.clone(),
        };

        let mut item = Item::with_capacity(record.len());
        for (field, value) in &record {
            if let Some(attr) = self.mapping.encode(value, field, &record)? {
                let _ = item.insert(field.clone(), attr);
            }
        }

        Ok(match &self.post_to {
            Some(hook) => hook(item),
            None => item,
        })
    }

    /// Decode an item
    pub fn from_item(&self, item: Item) -> Result<Record, Error> {
        let item = match &self.pre_from {
            Some(hook) => hook(item),
            None => item,
        };

        let mut record = Record::new();
        for (field, attr) in &item {
            if let Some(value) = self.mapping.decode(attr, field, &item)? {
                let _ = record.insert(field.clone(), value);
            }
        }

        Ok(match &self.post_from {
            Some(hook) => hook(record),
            None => record,
        })
    }

    /// Decode an item straight from a response
    ///
    /// Attributes of a type outside `S`, `N`, `B`, `SS`, `NS` and `BS` fail with
    /// [`Error::UnknownWireType`].
    pub fn from_raw(&self, raw: RawItem) -> Result<Record, Error> {
        self.from_item(parse_item(raw)?)
    }

    /// Decode an optional response item; `None` means "no item"
    pub fn from_raw_optional(&self, raw: Option<RawItem>) -> Result<Option<Record>, Error> {
        raw.map(|raw| self.from_raw(raw)).transpose()
    }

    /// Decode one raw attribute of `field`
    pub(crate) fn decode_raw_attribute(
        &self,
        raw: &Json,
        field: &str,
        owner: &RawItem,
    ) -> Result<Option<Value>, Error> {
        let attr = WireAttribute::from_json(raw)?;
        let owner = parse_item(owner.clone())?;
        self.mapping.decode(&attr, field, &owner)
    }
}

/// Validate every attribute of a response item
pub(crate) fn parse_item(raw: RawItem) -> Result<Item, Error> {
    raw.into_iter()
        .map(|(field, json)| Ok((field, WireAttribute::try_from(json)?)))
        .collect()
}

impl fmt::Debug for ItemMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemMapper")
            .field("mapping", &self.mapping)
            .field("pre_to", &self.pre_to.is_some())
            .field("post_to", &self.post_to.is_some())
            .field("pre_from", &self.pre_from.is_some())
            .field("post_from", &self.post_from.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::TypeHint;
    use crate::wire::WireType;
    use serde_json::json;

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_empty_fields_are_dropped() {
        let mapper = ItemMapper::default();
        let item = mapper
            .to_item(&record(&[
                ("a", Value::Int(0)),
                ("b", Value::from("")),
                ("c", Value::Null),
            ]))
            .unwrap();

        assert_eq!(item.len(), 1);
        assert_eq!(item["a"], WireAttribute::N("0".into()));
    }

    #[test]
    fn test_hooks() {
        let mut mapper = ItemMapper::default();
        mapper.pre_to = Some(Arc::new(|mut r: Record| {
            let _ = r.remove("secret");
            r
        }));
        mapper.post_from = Some(Arc::new(|mut r: Record| {
            let _ = r.insert("loaded".into(), Value::Bool(true));
            r
        }));

        let item = mapper
            .to_item(&record(&[("id", "a".into()), ("secret", "x".into())]))
            .unwrap();
        assert!(!item.contains_key("secret"));

        let decoded = mapper.from_item(item).unwrap();
        assert_eq!(decoded["loaded"], Value::Bool(true));
        assert_eq!(decoded["id"], Value::from("a"));
    }

    #[test]
    fn test_from_raw_unknown_type() {
        let mapper = ItemMapper::default();
        let raw = json!({"id": {"S": "a"}, "flag": {"BOOL": true}});
        let raw = raw.as_object().cloned().unwrap();

        let err = mapper.from_raw(raw).unwrap_err();
        assert!(matches!(err, Error::UnknownWireType(_)));
    }

    #[test]
    fn test_from_raw_with_mapping() {
        let mut mapping = FieldMapping::new();
        mapping.insert("count", TypeHint::Primitive(WireType::N));
        let mapper = ItemMapper::new(mapping);

        let raw = json!({"count": {"N": "3"}, "tags": {"SS": ["a"]}});
        let decoded = mapper.from_raw(raw.as_object().cloned().unwrap()).unwrap();
        assert_eq!(decoded["count"], Value::Int(3));
        assert_eq!(decoded["tags"], Value::List(vec!["a".into()]));
    }
}
