//! Attribute codec: one native value to and from one wire attribute.
//!
//! Fields with a declared [`TypeHint`] round-trip exactly. Without a hint the codec
//! infers the encoding from the value's shape, and decoding is only a best effort:
//! booleans come back from their text form and numeric-looking text is not quoted,
//! so `encode` followed by `decode` is not always the identity.

use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::Error;
use crate::value::{Record, Value, iso_date};
use crate::wire::{Item, WireAttribute, WireType};

/// Signature of a custom encoder: value, field name, owning record
pub type ToWireFn =
    dyn Fn(&Value, &str, &Record) -> Result<Option<WireAttribute>, Error> + Send + Sync;

/// Signature of a custom decoder: attribute, field name, owning item
pub type FromWireFn =
    dyn Fn(&WireAttribute, &str, &Item) -> Result<Option<Value>, Error> + Send + Sync;

/// Declared encoding of a field
#[derive(Clone, Debug)]
pub enum TypeHint {
    /// Encode as the given wire type
    Primitive(WireType),
    /// Encode through a derived representation
    Derived(DerivedKind),
    /// Caller-supplied transform pair
    Custom(CustomTransform),
}

/// Derived encodings built on top of the primitive wire types
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DerivedKind {
    /// Any value as JSON text in `S`, including null
    Json,
    /// Arbitrary-precision decimal kept as text, in `N` or `NS`
    BigNum,
    /// Date as ISO-8601 text in `S`
    IsoDate,
    /// Date as epoch milliseconds in `N`
    ///
    /// Sub-millisecond precision is truncated on encode; fractional milliseconds
    /// read from the wire are rounded to the nearest millisecond.
    Timestamp,
    /// Map of member to truthy marker, stored as a set of its members
    MembershipSet(WireType),
}

impl TypeHint {
    /// Scalar wire type a key field with this hint is stored as, if it can be a key
    pub fn key_type(&self) -> Option<WireType> {
        match self {
            TypeHint::Primitive(t) if t.is_scalar() => Some(*t),
            TypeHint::Derived(DerivedKind::Json | DerivedKind::IsoDate) => Some(WireType::S),
            TypeHint::Derived(DerivedKind::BigNum | DerivedKind::Timestamp) => Some(WireType::N),
            _ => None,
        }
    }
}

impl From<WireType> for TypeHint {
    fn from(value: WireType) -> Self {
        TypeHint::Primitive(value)
    }
}

impl From<DerivedKind> for TypeHint {
    fn from(value: DerivedKind) -> Self {
        TypeHint::Derived(value)
    }
}

impl From<CustomTransform> for TypeHint {
    fn from(value: CustomTransform) -> Self {
        TypeHint::Custom(value)
    }
}

impl FromStr for TypeHint {
    type Err = Error;

    /// Parse the short hint names: `S`, `N`, `B`, `SS`, `NS`, `BS`, `json`, `bignum`,
    /// `isodate`, `timestamp`, `mapS`, `mapN` and `mapB`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "S" => TypeHint::Primitive(WireType::S),
            "N" => TypeHint::Primitive(WireType::N),
            "B" => TypeHint::Primitive(WireType::B),
            "SS" => TypeHint::Primitive(WireType::Ss),
            "NS" => TypeHint::Primitive(WireType::Ns),
            "BS" => TypeHint::Primitive(WireType::Bs),
            "json" => TypeHint::Derived(DerivedKind::Json),
            "bignum" => TypeHint::Derived(DerivedKind::BigNum),
            "isodate" => TypeHint::Derived(DerivedKind::IsoDate),
            "timestamp" => TypeHint::Derived(DerivedKind::Timestamp),
            "mapS" => TypeHint::Derived(DerivedKind::MembershipSet(WireType::S)),
            "mapN" => TypeHint::Derived(DerivedKind::MembershipSet(WireType::N)),
            "mapB" => TypeHint::Derived(DerivedKind::MembershipSet(WireType::B)),
            other => return Err(Error::validation(format!("unknown type hint `{other}`"))),
        })
    }
}

/// Custom encoder/decoder pair
///
/// A missing direction falls back to shape inference.
#[derive(Clone, Default)]
pub struct CustomTransform {
    to_wire: Option<Arc<ToWireFn>>,
    from_wire: Option<Arc<FromWireFn>>,
}

impl CustomTransform {
    /// Empty transform, both directions inferred
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the encoder. Returning `None` omits the field.
    pub fn to_wire<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &str, &Record) -> Result<Option<WireAttribute>, Error> + Send + Sync + 'static,
    {
        self.to_wire = Some(Arc::new(f));
        self
    }

    /// Set the decoder. Returning `None` omits the field.
    pub fn from_wire<F>(mut self, f: F) -> Self
    where
        F: Fn(&WireAttribute, &str, &Item) -> Result<Option<Value>, Error> + Send + Sync + 'static,
    {
        self.from_wire = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for CustomTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomTransform")
            .field("to_wire", &self.to_wire.is_some())
            .field("from_wire", &self.from_wire.is_some())
            .finish()
    }
}

/// Field name to [`TypeHint`]
///
/// Fixed when a table handle is built and shared read-only afterwards.
#[derive(Clone, Debug, Default)]
pub struct FieldMapping {
    hints: HashMap<String, TypeHint>,
    order: Vec<String>,
}

impl FieldMapping {
    /// Empty mapping, every field inferred
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the hint for `field`, replacing any earlier one
    pub fn insert(&mut self, field: impl Into<String>, hint: impl Into<TypeHint>) {
        let field = field.into();
        if self.hints.insert(field.clone(), hint.into()).is_none() {
            self.order.push(field);
        }
    }

    /// Hint declared for `field`
    pub fn get(&self, field: &str) -> Option<&TypeHint> {
        self.hints.get(field)
    }

    /// Mapped field names in declaration order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Encode `value` of `field`; `None` means the field carries no value
    pub fn encode(
        &self,
        value: &Value,
        field: &str,
        owner: &Record,
    ) -> Result<Option<WireAttribute>, Error> {
        let attr = match self.get(field) {
            Some(TypeHint::Custom(custom)) => match &custom.to_wire {
                Some(to_wire) => to_wire(value, field, owner)?,
                None => infer(value, field)?,
            },
            Some(TypeHint::Derived(DerivedKind::Json)) => Some(json_text(value, field)?),
            _ if value.is_empty() => None,
            Some(TypeHint::Primitive(t)) => encode_primitive(*t, value, field)?,
            Some(TypeHint::Derived(kind)) => encode_derived(*kind, value, field)?,
            None => infer(value, field)?,
        };
        Ok(attr.filter(|a| !a.is_empty()))
    }

    /// Decode `attr` of `field`; `None` means the field is omitted from the record
    pub fn decode(
        &self,
        attr: &WireAttribute,
        field: &str,
        owner: &Item,
    ) -> Result<Option<Value>, Error> {
        match self.get(field) {
            Some(TypeHint::Custom(custom)) => match &custom.from_wire {
                Some(from_wire) => from_wire(attr, field, owner),
                None => infer_from(attr, field).map(Some),
            },
            Some(TypeHint::Primitive(t)) => decode_primitive(*t, attr, field).map(Some),
            Some(TypeHint::Derived(kind)) => decode_derived(*kind, attr, field).map(Some),
            None => infer_from(attr, field).map(Some),
        }
    }
}

fn encode_primitive(
    wire_type: WireType,
    value: &Value,
    field: &str,
) -> Result<Option<WireAttribute>, Error> {
    Ok(Some(match wire_type {
        WireType::S => WireAttribute::S(text(value, field)?),
        WireType::N => WireAttribute::N(number_text(value, field)?),
        WireType::B => WireAttribute::B(bytes(value, field)?),
        WireType::Ss => {
            WireAttribute::Ss(list(value, field)?.iter().map(|v| text(v, field)).collect::<Result<_, _>>()?)
        }
        WireType::Ns => WireAttribute::Ns(
            list(value, field)?
                .iter()
                .map(|v| number_text(v, field))
                .collect::<Result<_, _>>()?,
        ),
        WireType::Bs => WireAttribute::Bs(
            list(value, field)?
                .iter()
                .map(|v| bytes(v, field))
                .collect::<Result<_, _>>()?,
        ),
    }))
}

fn encode_derived(
    kind: DerivedKind,
    value: &Value,
    field: &str,
) -> Result<Option<WireAttribute>, Error> {
    Ok(Some(match (kind, value) {
        (DerivedKind::Json, _) => json_text(value, field)?,
        (DerivedKind::BigNum, Value::List(items)) => WireAttribute::Ns(
            items
                .iter()
                .map(|v| number_text(v, field))
                .collect::<Result<_, _>>()?,
        ),
        (DerivedKind::BigNum, _) => WireAttribute::N(number_text(value, field)?),
        (DerivedKind::IsoDate, _) => WireAttribute::S(iso_date(&date(value, field)?)),
        (DerivedKind::Timestamp, Value::Int(ms)) => WireAttribute::N(ms.to_string()),
        (DerivedKind::Timestamp, _) => {
            WireAttribute::N(date(value, field)?.timestamp_millis().to_string())
        }
        (DerivedKind::MembershipSet(member_type), Value::Map(members)) => {
            let keys = members
                .iter()
                .filter(|(_, marker)| marker.is_truthy())
                .map(|(key, _)| key);
            match member_type {
                WireType::N => WireAttribute::Ns(
                    keys.map(|k| number_text(&Value::from(k.as_str()), field))
                        .collect::<Result<_, _>>()?,
                ),
                WireType::B => WireAttribute::Bs(
                    keys.map(|k| bytes(&Value::from(k.as_str()), field))
                        .collect::<Result<_, _>>()?,
                ),
                _ => WireAttribute::Ss(keys.cloned().collect()),
            }
        }
        (DerivedKind::MembershipSet(_), _) => {
            return Err(Error::encoding(field, "membership set requires a map"));
        }
    }))
}

fn infer(value: &Value, field: &str) -> Result<Option<WireAttribute>, Error> {
    Ok(match value {
        v if v.is_empty() => None,
        Value::String(s) => Some(WireAttribute::S(s.clone())),
        Value::Bool(b) => Some(WireAttribute::S(b.to_string())),
        Value::Int(_) | Value::Float(_) => Some(WireAttribute::N(number_text(value, field)?)),
        Value::Bytes(b) => Some(WireAttribute::B(b.clone())),
        Value::Date(d) => Some(WireAttribute::S(iso_date(d))),
        Value::List(items) if items.iter().all(|v| matches!(v, Value::String(_))) => {
            Some(WireAttribute::Ss(items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect()))
        }
        Value::List(items) if items.iter().all(|v| matches!(v, Value::Int(_) | Value::Float(_))) => {
            Some(WireAttribute::Ns(
                items
                    .iter()
                    .map(|v| number_text(v, field))
                    .collect::<Result<_, _>>()?,
            ))
        }
        Value::List(items) if items.iter().all(|v| matches!(v, Value::Bytes(_))) => {
            Some(WireAttribute::Bs(
                items
                    .iter()
                    .map(|v| bytes(v, field))
                    .collect::<Result<_, _>>()?,
            ))
        }
        _ => Some(json_text(value, field)?),
    })
}

fn decode_primitive(wire_type: WireType, attr: &WireAttribute, field: &str) -> Result<Value, Error> {
    match (wire_type, attr) {
        (WireType::S, WireAttribute::S(s)) => Ok(Value::String(s.clone())),
        (WireType::N, WireAttribute::N(n)) => parse_number(n, field),
        (WireType::B, WireAttribute::B(b)) => Ok(Value::Bytes(b.clone())),
        (WireType::Ss, WireAttribute::Ss(_))
        | (WireType::Ns, WireAttribute::Ns(_))
        | (WireType::Bs, WireAttribute::Bs(_)) => infer_from(attr, field),
        _ => Err(mismatch(wire_type.as_str(), attr, field)),
    }
}

fn decode_derived(kind: DerivedKind, attr: &WireAttribute, field: &str) -> Result<Value, Error> {
    match (kind, attr) {
        (DerivedKind::Json, WireAttribute::S(s)) => serde_json::from_str(s)
            .map(Value::from_json)
            .map_err(|e| Error::decoding(field, e.to_string())),
        (DerivedKind::BigNum, WireAttribute::N(n)) => Ok(Value::String(n.clone())),
        (DerivedKind::BigNum, WireAttribute::Ns(ns)) => {
            Ok(Value::List(ns.iter().map(|n| Value::String(n.clone())).collect()))
        }
        (DerivedKind::IsoDate, WireAttribute::S(s)) => DateTime::parse_from_rfc3339(s)
            .map(|d| Value::Date(d.with_timezone(&Utc)))
            .map_err(|e| Error::decoding(field, format!("`{s}` is not an ISO-8601 date: {e}"))),
        (DerivedKind::Timestamp, WireAttribute::N(n)) => {
            let millis = match parse_number(n, field)? {
                Value::Int(ms) => ms,
                Value::Float(ms) if (i64::MIN as f64..i64::MAX as f64).contains(&ms.round()) => {
                    ms.round() as i64
                }
                _ => return Err(Error::decoding(field, format!("`{n}` is not a timestamp"))),
            };
            Utc.timestamp_millis_opt(millis)
                .single()
                .map(Value::Date)
                .ok_or_else(|| Error::decoding(field, format!("timestamp {millis} out of range")))
        }
        (DerivedKind::MembershipSet(_), WireAttribute::Ss(members) | WireAttribute::Ns(members)) => {
            Ok(Value::Map(
                members
                    .iter()
                    .map(|m| (m.clone(), Value::Bool(true)))
                    .collect(),
            ))
        }
        (DerivedKind::MembershipSet(_), WireAttribute::Bs(members)) => Ok(Value::Map(
            members
                .iter()
                .map(|m| (STANDARD.encode(m), Value::Bool(true)))
                .collect(),
        )),
        (kind, attr) => Err(mismatch(&format!("{kind:?}"), attr, field)),
    }
}

fn infer_from(attr: &WireAttribute, field: &str) -> Result<Value, Error> {
    Ok(match attr {
        WireAttribute::S(s) if s == "true" => Value::Bool(true),
        WireAttribute::S(s) if s == "false" => Value::Bool(false),
        WireAttribute::S(s) if s.starts_with('{') || s.starts_with('[') => {
            serde_json::from_str(s).map_or_else(|_| Value::String(s.clone()), Value::from_json)
        }
        WireAttribute::S(s) => Value::String(s.clone()),
        WireAttribute::N(n) => parse_number(n, field)?,
        WireAttribute::B(b) => Value::Bytes(b.clone()),
        WireAttribute::Ss(l) => Value::List(l.iter().map(|s| Value::String(s.clone())).collect()),
        WireAttribute::Ns(l) => Value::List(
            l.iter()
                .map(|n| parse_number(n, field))
                .collect::<Result<_, _>>()?,
        ),
        WireAttribute::Bs(l) => Value::List(l.iter().map(|b| Value::Bytes(b.clone())).collect()),
    })
}

fn mismatch(expected: &str, attr: &WireAttribute, field: &str) -> Error {
    Error::decoding(
        field,
        format!("expected {expected}, found {}", attr.wire_type()),
    )
}

/// Decimal text of a number, rejecting non-finite values
///
/// Whole floats keep a fractional part (`3.0`, `-0.0`) so they decode as floats again.
pub(crate) fn format_number(n: f64, field: &str) -> Result<String, Error> {
    if !n.is_finite() {
        return Err(Error::encoding(field, format!("{n} is not a finite number")));
    }
    let text = n.to_string();
    if text.contains('.') {
        Ok(text)
    } else {
        Ok(format!("{text}.0"))
    }
}

fn parse_number(text: &str, field: &str) -> Result<Value, Error> {
    if let Ok(i) = text.parse::<i64>() {
        return Ok(Value::Int(i));
    }
    match text.parse::<f64>() {
        Ok(f) if f.is_finite() => Ok(Value::Float(f)),
        _ => Err(Error::decoding(field, format!("`{text}` is not a number"))),
    }
}

fn is_numeric(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty()
        && text.parse::<f64>().is_ok_and(f64::is_finite)
        && text.bytes().all(|b| b.is_ascii_digit() || b"+-.eE".contains(&b))
}

fn text(value: &Value, field: &str) -> Result<String, Error> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Int(_) | Value::Float(_) => number_text(value, field),
        Value::Date(d) => Ok(iso_date(d)),
        Value::Bytes(b) => String::from_utf8(b.clone())
            .map_err(|_| Error::encoding(field, "bytes are not valid UTF-8 text")),
        Value::List(_) | Value::Map(_) => Ok(serde_json::to_string(&value.to_json()?)?),
        Value::Null => Err(Error::encoding(field, "null has no text form")),
    }
}

fn number_text(value: &Value, field: &str) -> Result<String, Error> {
    match value {
        Value::Int(i) => Ok(i.to_string()),
        Value::Float(f) => format_number(*f, field),
        Value::String(s) if is_numeric(s) => Ok(s.trim().to_string()),
        other => Err(Error::encoding(field, format!("{other:?} is not a number"))),
    }
}

fn bytes(value: &Value, field: &str) -> Result<Vec<u8>, Error> {
    match value {
        Value::Bytes(b) => Ok(b.clone()),
        Value::String(s) => STANDARD
            .decode(s)
            .map_err(|e| Error::encoding(field, format!("`{s}` is not base64: {e}"))),
        other => Err(Error::encoding(field, format!("{other:?} is not binary"))),
    }
}

fn list<'a>(value: &'a Value, field: &str) -> Result<&'a [Value], Error> {
    match value {
        Value::List(items) => Ok(items),
        other => Err(Error::encoding(field, format!("{other:?} is not a list"))),
    }
}

fn date(value: &Value, field: &str) -> Result<DateTime<Utc>, Error> {
    match value {
        Value::Date(d) => Ok(*d),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|e| Error::encoding(field, format!("`{s}` is not an ISO-8601 date: {e}"))),
        other => Err(Error::encoding(field, format!("{other:?} is not a date"))),
    }
}

fn json_text(value: &Value, field: &str) -> Result<WireAttribute, Error> {
    let json = value
        .to_json()
        .map_err(|e| Error::encoding(field, e.to_string()))?;
    Ok(WireAttribute::S(serde_json::to_string(&json)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(field: &str, hint: &str) -> FieldMapping {
        let mut mapping = FieldMapping::new();
        mapping.insert(field, hint.parse::<TypeHint>().unwrap());
        mapping
    }

    fn roundtrip(mapping: &FieldMapping, field: &str, value: Value) -> Value {
        let attr = mapping.encode(&value, field, &Record::new()).unwrap().unwrap();
        mapping.decode(&attr, field, &Item::new()).unwrap().unwrap()
    }

    #[test]
    fn test_empty_values_are_absent() {
        let mapping = FieldMapping::new();
        let owner = Record::new();
        for value in [
            Value::Null,
            Value::from(""),
            Value::List(vec![]),
            Value::Bytes(vec![]),
            Value::Map(Record::new()),
        ] {
            assert_eq!(mapping.encode(&value, "a", &owner).unwrap(), None, "{value:?}");
        }

        let hinted = mapping_with_all_primitives();
        for field in ["s", "n", "b", "ss", "ns", "bs"] {
            assert_eq!(hinted.encode(&Value::Null, field, &owner).unwrap(), None);
            assert_eq!(hinted.encode(&Value::from(""), field, &owner).unwrap(), None);
        }
        assert_eq!(hinted.encode(&Value::List(vec![]), "ss", &owner).unwrap(), None);
    }

    fn mapping_with_all_primitives() -> FieldMapping {
        let mut mapping = FieldMapping::new();
        for (field, hint) in [
            ("s", "S"),
            ("n", "N"),
            ("b", "B"),
            ("ss", "SS"),
            ("ns", "NS"),
            ("bs", "BS"),
        ] {
            mapping.insert(field, hint.parse::<TypeHint>().unwrap());
        }
        mapping
    }

    #[test]
    fn test_non_finite_numbers_are_rejected() {
        let mapping = mapping("n", "N");
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = mapping.encode(&Value::Float(value), "n", &Record::new()).unwrap_err();
            assert!(err.is_encoding_error());
            // inferred numbers too
            let err = FieldMapping::new()
                .encode(&Value::Float(value), "x", &Record::new())
                .unwrap_err();
            assert!(matches!(err, Error::Encoding { ref field, .. } if field == "x"));
        }
    }

    #[test]
    fn test_number_hint() {
        let mapping = mapping("n", "N");
        let owner = Record::new();
        assert_eq!(
            mapping.encode(&Value::Float(1.5), "n", &owner).unwrap(),
            Some(WireAttribute::N("1.5".into()))
        );
        assert_eq!(
            mapping.encode(&Value::from("42"), "n", &owner).unwrap(),
            Some(WireAttribute::N("42".into()))
        );
        assert!(mapping.encode(&Value::from("abc"), "n", &owner).is_err());
        assert_eq!(roundtrip(&mapping, "n", Value::Int(-7)), Value::Int(-7));
        assert_eq!(roundtrip(&mapping, "n", Value::Float(0.25)), Value::Float(0.25));

        // whole floats stay floats
        assert_eq!(
            mapping.encode(&Value::Float(3.0), "n", &owner).unwrap(),
            Some(WireAttribute::N("3.0".into()))
        );
        assert_eq!(roundtrip(&mapping, "n", Value::Float(3.0)), Value::Float(3.0));
        assert_eq!(
            mapping.encode(&Value::Float(-0.0), "n", &owner).unwrap(),
            Some(WireAttribute::N("-0.0".into()))
        );
        match roundtrip(&mapping, "n", Value::Float(-0.0)) {
            Value::Float(f) => assert!(f == 0.0 && f.is_sign_negative()),
            other => panic!("expected a float, got {other:?}"),
        }
        assert_eq!(roundtrip(&mapping, "n", Value::Float(1e21)), Value::Float(1e21));
    }

    #[test]
    fn test_bignum_keeps_precision() {
        let mapping = mapping("big", "bignum");
        let value = Value::from("9999999999999999");
        assert_eq!(
            mapping.encode(&value, "big", &Record::new()).unwrap(),
            Some(WireAttribute::N("9999999999999999".into()))
        );
        assert_eq!(roundtrip(&mapping, "big", value.clone()), value);

        let huge = Value::from("123456789012345678901234567890.5");
        assert_eq!(roundtrip(&mapping, "big", huge.clone()), huge);

        let list = Value::List(vec!["1".into(), "99999999999999999999".into()]);
        assert_eq!(roundtrip(&mapping, "big", list.clone()), list);
    }

    #[test]
    fn test_date_hints() {
        let date = Utc.timestamp_millis_opt(1345534683133).unwrap();

        let iso = mapping("created", "isodate");
        assert_eq!(
            iso.encode(&Value::Date(date), "created", &Record::new()).unwrap(),
            Some(WireAttribute::S("2012-08-21T07:38:03.133Z".into()))
        );
        assert_eq!(roundtrip(&iso, "created", Value::Date(date)), Value::Date(date));

        let ts = mapping("created", "timestamp");
        assert_eq!(
            ts.encode(&Value::Date(date), "created", &Record::new()).unwrap(),
            Some(WireAttribute::N("1345534683133".into()))
        );
        assert_eq!(roundtrip(&ts, "created", Value::Date(date)), Value::Date(date));
    }

    #[test]
    fn test_timestamp_precision() {
        let ts = mapping("created", "timestamp");
        let decode = |n: &str| ts.decode(&WireAttribute::N(n.into()), "created", &Item::new());

        let nearest = Utc.timestamp_millis_opt(1345534683134).unwrap();
        assert_eq!(decode("1345534683133.6").unwrap(), Some(Value::Date(nearest)));
        let lower = Utc.timestamp_millis_opt(1345534683133).unwrap();
        assert_eq!(decode("1345534683133.4").unwrap(), Some(Value::Date(lower)));
        assert!(matches!(decode("1e300").unwrap_err(), Error::Decoding { .. }));

        // sub-millisecond precision is dropped on encode
        let precise = lower + chrono::Duration::microseconds(900);
        assert_eq!(
            ts.encode(&Value::Date(precise), "created", &Record::new()).unwrap(),
            Some(WireAttribute::N("1345534683133".into()))
        );
    }

    #[test]
    fn test_json_hint() {
        let mapping = mapping("meta", "json");
        let owner = Record::new();
        assert_eq!(
            mapping.encode(&Value::Null, "meta", &owner).unwrap(),
            Some(WireAttribute::S("null".into()))
        );
        assert_eq!(
            mapping.encode(&Value::from(""), "meta", &owner).unwrap(),
            Some(WireAttribute::S("\"\"".into()))
        );

        let mut nested = Record::new();
        let _ = nested.insert("a".into(), Value::List(vec![Value::Int(1), Value::Bool(true)]));
        let value = Value::Map(nested);
        assert_eq!(roundtrip(&mapping, "meta", value.clone()), value);
        assert_eq!(roundtrip(&mapping, "meta", Value::from("1")), Value::from("1"));
    }

    #[test]
    fn test_membership_set() {
        let mapping = mapping("tags", "mapS");
        let mut members = Record::new();
        let _ = members.insert("a".into(), Value::Int(1));
        let _ = members.insert("b".into(), Value::Bool(true));
        let _ = members.insert("c".into(), Value::Bool(false));

        assert_eq!(
            mapping.encode(&Value::Map(members), "tags", &Record::new()).unwrap(),
            Some(WireAttribute::Ss(vec!["a".into(), "b".into()]))
        );

        let decoded = mapping
            .decode(&WireAttribute::Ss(vec!["a".into(), "b".into()]), "tags", &Item::new())
            .unwrap()
            .unwrap();
        let mut expected = Record::new();
        let _ = expected.insert("a".into(), Value::Bool(true));
        let _ = expected.insert("b".into(), Value::Bool(true));
        assert_eq!(decoded, Value::Map(expected));
    }

    #[test]
    fn test_sets() {
        let mapping = mapping_with_all_primitives();
        let ns = Value::List(vec![Value::Int(1), Value::Float(2.5)]);
        assert_eq!(roundtrip(&mapping, "ns", ns.clone()), ns);

        let bs = Value::List(vec![Value::Bytes(vec![1, 2]), Value::Bytes(vec![3])]);
        assert_eq!(roundtrip(&mapping, "bs", bs.clone()), bs);

        let ss = Value::List(vec!["x".into(), "y".into()]);
        assert_eq!(roundtrip(&mapping, "ss", ss.clone()), ss);
    }

    #[test]
    fn test_inference() {
        let mapping = FieldMapping::new();
        let owner = Record::new();
        let encode = |v: Value| mapping.encode(&v, "f", &owner).unwrap().unwrap();

        assert_eq!(encode(Value::Bool(true)), WireAttribute::S("true".into()));
        assert_eq!(encode(Value::Int(0)), WireAttribute::N("0".into()));
        assert_eq!(encode(Value::Bytes(vec![9])), WireAttribute::B(vec![9]));
        assert_eq!(
            encode(Value::List(vec!["a".into(), "b".into()])),
            WireAttribute::Ss(vec!["a".into(), "b".into()])
        );
        assert_eq!(
            encode(Value::List(vec![Value::Int(1), Value::Int(2)])),
            WireAttribute::Ns(vec!["1".into(), "2".into()])
        );
        assert_eq!(
            encode(Value::List(vec![Value::Int(1), "a".into()])),
            WireAttribute::S("[1,\"a\"]".into())
        );
    }

    #[test]
    fn test_inferred_decoding() {
        let mapping = FieldMapping::new();
        let decode = |a: WireAttribute| mapping.decode(&a, "f", &Item::new()).unwrap().unwrap();

        assert_eq!(decode(WireAttribute::S("true".into())), Value::Bool(true));
        assert_eq!(decode(WireAttribute::S("false".into())), Value::Bool(false));
        assert_eq!(
            decode(WireAttribute::S("[1,2]".into())),
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
        assert_eq!(decode(WireAttribute::S("{oops".into())), Value::from("{oops"));
        assert_eq!(decode(WireAttribute::N("3.75".into())), Value::Float(3.75));
        assert_eq!(decode(WireAttribute::N("12".into())), Value::Int(12));
    }

    #[test]
    fn test_hint_mismatch_is_decoding_error() {
        let mapping = mapping("n", "N");
        let err = mapping
            .decode(&WireAttribute::S("x".into()), "n", &Item::new())
            .unwrap_err();
        assert!(matches!(err, Error::Decoding { ref field, .. } if field == "n"));
    }

    #[test]
    fn test_custom_transform() {
        let mut mapping = FieldMapping::new();
        mapping.insert(
            "upper",
            CustomTransform::new()
                .to_wire(|v, _, _| Ok(v.as_str().map(|s| WireAttribute::S(s.to_uppercase()))))
                .from_wire(|a, _, _| match a {
                    WireAttribute::S(s) => Ok(Some(Value::String(s.to_lowercase()))),
                    _ => Ok(None),
                }),
        );

        let attr = mapping.encode(&Value::from("abc"), "upper", &Record::new()).unwrap();
        assert_eq!(attr, Some(WireAttribute::S("ABC".into())));
        assert_eq!(
            mapping.decode(&WireAttribute::S("ABC".into()), "upper", &Item::new()).unwrap(),
            Some(Value::from("abc"))
        );
        assert_eq!(mapping.encode(&Value::Int(1), "upper", &Record::new()).unwrap(), None);

        // decoder falls back to inference
        mapping.insert("half", CustomTransform::new());
        assert_eq!(
            mapping.decode(&WireAttribute::N("2".into()), "half", &Item::new()).unwrap(),
            Some(Value::Int(2))
        );
    }

    #[test]
    fn test_key_type() {
        assert_eq!("N".parse::<TypeHint>().unwrap().key_type(), Some(WireType::N));
        assert_eq!("isodate".parse::<TypeHint>().unwrap().key_type(), Some(WireType::S));
        assert_eq!("timestamp".parse::<TypeHint>().unwrap().key_type(), Some(WireType::N));
        assert_eq!("SS".parse::<TypeHint>().unwrap().key_type(), None);
        assert!("float".parse::<TypeHint>().is_err());
    }
}
