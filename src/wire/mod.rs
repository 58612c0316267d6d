//! The store's wire representation: tagged attributes, items and payloads.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use std::collections::HashMap;
use std::fmt;

use crate::Error;

mod protocol;
pub use protocol::*;

/// A wire item: field name to typed attribute
pub type Item = HashMap<String, WireAttribute>;

/// An item as it arrives in a response, attributes not yet validated
pub type RawItem = Map<String, Json>;

/// A typed wire attribute with exactly one populated variant
///
/// Serializes as a single-key object, e.g. `{"N": "100"}`. Binary payloads are held as
/// raw bytes and transmitted as base64 text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WireAttribute {
    /// Text
    S(String),
    /// Decimal number kept as text
    N(String),
    /// Bytes
    B(Vec<u8>),
    /// Set of texts
    Ss(Vec<String>),
    /// Set of decimal numbers
    Ns(Vec<String>),
    /// Set of byte sequences
    Bs(Vec<Vec<u8>>),
}

impl WireAttribute {
    /// Tag of the populated variant
    pub fn wire_type(&self) -> WireType {
        match self {
            WireAttribute::S(_) => WireType::S,
            WireAttribute::N(_) => WireType::N,
            WireAttribute::B(_) => WireType::B,
            WireAttribute::Ss(_) => WireType::Ss,
            WireAttribute::Ns(_) => WireType::Ns,
            WireAttribute::Bs(_) => WireType::Bs,
        }
    }

    /// `true` if the payload is empty, which the store forbids as a stored value
    pub fn is_empty(&self) -> bool {
        match self {
            WireAttribute::S(s) | WireAttribute::N(s) => s.is_empty(),
            WireAttribute::B(b) => b.is_empty(),
            WireAttribute::Ss(l) | WireAttribute::Ns(l) => l.is_empty(),
            WireAttribute::Bs(l) => l.is_empty(),
        }
    }

    /// Parse a tagged JSON attribute
    ///
    /// Variants are probed in the order `S`, `N`, `B`, `SS`, `NS`, `BS`; the first
    /// non-null one wins. Anything else is an [`Error::UnknownWireType`].
    pub fn from_json(json: &Json) -> Result<Self, Error> {
        let unknown = || Error::UnknownWireType(json.to_string());
        let object = json.as_object().ok_or_else(unknown)?;
        let populated = |tag: &str| object.get(tag).filter(|v| !v.is_null());

        if let Some(v) = populated("S") {
            return v.as_str().map(|s| WireAttribute::S(s.to_string())).ok_or_else(unknown);
        }
        if let Some(v) = populated("N") {
            return v.as_str().map(|s| WireAttribute::N(s.to_string())).ok_or_else(unknown);
        }
        if let Some(v) = populated("B") {
            let text = v.as_str().ok_or_else(unknown)?;
            return decode_base64(text).map(WireAttribute::B).ok_or_else(unknown);
        }
        if let Some(v) = populated("SS") {
            return string_list(v).map(WireAttribute::Ss).ok_or_else(unknown);
        }
        if let Some(v) = populated("NS") {
            return string_list(v).map(WireAttribute::Ns).ok_or_else(unknown);
        }
        if let Some(v) = populated("BS") {
            return string_list(v)
                .and_then(|list| list.iter().map(|s| decode_base64(s)).collect())
                .map(WireAttribute::Bs)
                .ok_or_else(unknown);
        }
        Err(unknown())
    }

    /// Tagged JSON form of the attribute
    pub fn to_json(&self) -> Json {
        let mut object = Map::with_capacity(1);
        let (tag, value) = match self {
            WireAttribute::S(s) => ("S", Json::from(s.as_str())),
            WireAttribute::N(n) => ("N", Json::from(n.as_str())),
            WireAttribute::B(b) => ("B", Json::from(STANDARD.encode(b))),
            WireAttribute::Ss(l) => ("SS", Json::from(l.clone())),
            WireAttribute::Ns(l) => ("NS", Json::from(l.clone())),
            WireAttribute::Bs(l) => (
                "BS",
                Json::from(l.iter().map(|b| STANDARD.encode(b)).collect::<Vec<_>>()),
            ),
        };
        let _ = object.insert(tag.to_string(), value);
        Json::Object(object)
    }
}

fn decode_base64(text: &str) -> Option<Vec<u8>> {
    STANDARD.decode(text).ok()
}

fn string_list(json: &Json) -> Option<Vec<String>> {
    json.as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

impl TryFrom<Json> for WireAttribute {
    type Error = Error;

    fn try_from(json: Json) -> Result<Self, Self::Error> {
        WireAttribute::from_json(&json)
    }
}

impl Serialize for WireAttribute {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            WireAttribute::S(s) => map.serialize_entry("S", s)?,
            WireAttribute::N(n) => map.serialize_entry("N", n)?,
            WireAttribute::B(b) => map.serialize_entry("B", &STANDARD.encode(b))?,
            WireAttribute::Ss(l) => map.serialize_entry("SS", l)?,
            WireAttribute::Ns(l) => map.serialize_entry("NS", l)?,
            WireAttribute::Bs(l) => {
                let encoded: Vec<String> = l.iter().map(|b| STANDARD.encode(b)).collect();
                map.serialize_entry("BS", &encoded)?
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for WireAttribute {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = Json::deserialize(deserializer)?;
        WireAttribute::from_json(&json).map_err(de::Error::custom)
    }
}

/// Wire type tags
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WireType {
    /// `S`
    S,
    /// `N`
    N,
    /// `B`
    B,
    /// `SS`
    #[serde(rename = "SS")]
    Ss,
    /// `NS`
    #[serde(rename = "NS")]
    Ns,
    /// `BS`
    #[serde(rename = "BS")]
    Bs,
}

impl WireType {
    /// Protocol tag
    pub fn as_str(&self) -> &'static str {
        match self {
            WireType::S => "S",
            WireType::N => "N",
            WireType::B => "B",
            WireType::Ss => "SS",
            WireType::Ns => "NS",
            WireType::Bs => "BS",
        }
    }

    /// `true` for `S`, `N` and `B`, the only types a key attribute may have
    pub fn is_scalar(&self) -> bool {
        matches!(self, WireType::S | WireType::N | WireType::B)
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque continuation token of a paginated list operation
///
/// Fed back verbatim as `ExclusiveStartKey` on the next call of the same query or scan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(Json);

impl Cursor {
    /// Wrap a `LastEvaluatedKey` value
    pub fn new(json: Json) -> Self {
        Self(json)
    }

    /// The raw key value
    pub fn as_json(&self) -> &Json {
        &self.0
    }

    /// Unwrap the raw key value
    pub fn into_inner(self) -> Json {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialize_tagged() {
        let json = serde_json::to_value(WireAttribute::B(vec![1, 2, 3, 4])).unwrap();
        assert_eq!(json, json!({"B": "AQIDBA=="}));

        let json = serde_json::to_value(WireAttribute::Ns(vec!["1".into(), "2".into()])).unwrap();
        assert_eq!(json, json!({"NS": ["1", "2"]}));

        let attr = WireAttribute::Bs(vec![vec![1], vec![2]]);
        assert_eq!(serde_json::to_value(&attr).unwrap(), attr.to_json());
    }

    #[test]
    fn test_from_json() {
        assert_eq!(
            WireAttribute::from_json(&json!({"S": "hello"})).unwrap(),
            WireAttribute::S("hello".into())
        );
        assert_eq!(
            WireAttribute::from_json(&json!({"BS": ["AQ==", "Ag=="]})).unwrap(),
            WireAttribute::Bs(vec![vec![1], vec![2]])
        );
        // null variants are skipped
        assert_eq!(
            WireAttribute::from_json(&json!({"S": null, "N": "5"})).unwrap(),
            WireAttribute::N("5".into())
        );
    }

    #[test]
    fn test_from_json_unknown() {
        let err = WireAttribute::from_json(&json!({"BOOL": true})).unwrap_err();
        assert!(matches!(err, Error::UnknownWireType(_)));

        let err = WireAttribute::from_json(&json!({"B": "not base64!"})).unwrap_err();
        assert!(matches!(err, Error::UnknownWireType(_)));

        let err = serde_json::from_value::<WireAttribute>(json!({"M": {}})).unwrap_err();
        assert!(err.to_string().contains("unknown wire type"));
    }

    #[test]
    fn test_is_empty() {
        assert!(WireAttribute::S(String::new()).is_empty());
        assert!(WireAttribute::Ns(vec![]).is_empty());
        assert!(!WireAttribute::N("0".into()).is_empty());
    }
}
