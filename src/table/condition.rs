use std::collections::BTreeMap;
use std::fmt;

use crate::Error;
use crate::codec::FieldMapping;
use crate::value::{Record, Value};
use crate::wire::{WireCondition, WireConditions};

/// Field name to condition, as used for key conditions, scan filters and expected values
pub type ConditionSet = BTreeMap<String, Condition>;

/// Comparison operator of a condition
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Comparator {
    /// `EQ`
    Eq,
    /// `NE`
    Ne,
    /// `LE`
    Le,
    /// `LT`
    Lt,
    /// `GE`
    Ge,
    /// `GT`
    Gt,
    /// `BETWEEN`, two operands
    Between,
    /// `BEGINS_WITH`
    BeginsWith,
    /// `CONTAINS`
    Contains,
    /// `NOT_CONTAINS`
    NotContains,
    /// `IN`
    In,
    /// `NULL`
    Null,
    /// `NOT_NULL`
    NotNull,
    /// Any other operator name, passed through upper-cased
    Other(String),
}

impl Comparator {
    /// Parse an operator: symbols (`=`, `!=`, `<=`, `>=<=`, ...), camel-case aliases
    /// (`beginsWith`, `doesNotContain`, ...) or a raw protocol name in any case
    pub fn parse(operator: &str) -> Self {
        match operator {
            "=" | "==" => Comparator::Eq,
            "!=" => Comparator::Ne,
            "<=" => Comparator::Le,
            "<" => Comparator::Lt,
            ">=" => Comparator::Ge,
            ">" => Comparator::Gt,
            ">=<=" => Comparator::Between,
            "beginsWith" | "startsWith" => Comparator::BeginsWith,
            "notContains" | "doesNotContain" => Comparator::NotContains,
            "notNull" => Comparator::NotNull,
            raw => match raw.to_uppercase().as_str() {
                "EQ" => Comparator::Eq,
                "NE" => Comparator::Ne,
                "LE" => Comparator::Le,
                "LT" => Comparator::Lt,
                "GE" => Comparator::Ge,
                "GT" => Comparator::Gt,
                "BETWEEN" => Comparator::Between,
                "BEGINS_WITH" => Comparator::BeginsWith,
                "CONTAINS" => Comparator::Contains,
                "NOT_CONTAINS" => Comparator::NotContains,
                "IN" => Comparator::In,
                "NULL" => Comparator::Null,
                "NOT_NULL" => Comparator::NotNull,
                other => Comparator::Other(other.to_string()),
            },
        }
    }

    /// Protocol name
    pub fn as_str(&self) -> &str {
        match self {
            Comparator::Eq => "EQ",
            Comparator::Ne => "NE",
            Comparator::Le => "LE",
            Comparator::Lt => "LT",
            Comparator::Ge => "GE",
            Comparator::Gt => "GT",
            Comparator::Between => "BETWEEN",
            Comparator::BeginsWith => "BEGINS_WITH",
            Comparator::Contains => "CONTAINS",
            Comparator::NotContains => "NOT_CONTAINS",
            Comparator::In => "IN",
            Comparator::Null => "NULL",
            Comparator::NotNull => "NOT_NULL",
            Comparator::Other(name) => name,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Condition on one field
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    /// The attribute does not exist
    Null,
    /// The attribute exists
    NotNull,
    /// The attribute equals the value
    Eq(Value),
    /// The attribute equals one of the values
    In(Vec<Value>),
    /// Any comparison with its operands
    Compare(Comparator, Vec<Value>),
}

impl Condition {
    /// `field = value`
    pub fn eq(value: impl Into<Value>) -> Self {
        Condition::Eq(value.into())
    }

    /// `field <op> value`
    pub fn compare(operator: &str, value: impl Into<Value>) -> Self {
        Condition::Compare(Comparator::parse(operator), vec![value.into()])
    }

    /// `low <= field <= high`
    pub fn between(low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Condition::Compare(Comparator::Between, vec![low.into(), high.into()])
    }

    /// `field` starts with `prefix`
    pub fn begins_with(prefix: impl Into<Value>) -> Self {
        Condition::Compare(Comparator::BeginsWith, vec![prefix.into()])
    }

    /// Parse the declarative form
    ///
    /// * null: attribute is null
    /// * `"notNull"`: attribute is not null
    /// * scalar: equality
    /// * list: membership
    /// * map with a single operator key, e.g. `{">=<=": [1, 5]}`: that comparison
    pub fn from_value(value: Value) -> Result<Self, Error> {
        Ok(match value {
            Value::Null => Condition::Null,
            Value::String(s) if s == "notNull" || s == "NOT_NULL" => Condition::NotNull,
            Value::List(values) => Condition::In(values),
            Value::Map(mut record) => {
                if record.len() != 1 {
                    return Err(Error::validation(format!(
                        "condition must have exactly one operator, got {}",
                        record.len()
                    )));
                }
                let Some((operator, operands)) = record.pop_first() else {
                    return Err(Error::validation("condition has no operator"));
                };
                let operands = match operands {
                    Value::List(values) => values,
                    single => vec![single],
                };
                Condition::Compare(Comparator::parse(&operator), operands)
            }
            scalar => Condition::Eq(scalar),
        })
    }

    /// Build the wire clause for `field`
    ///
    /// When any operand encodes to nothing the comparison cannot be sent as is; it
    /// becomes a `NOT_NULL` test for negative comparators and a `NULL` test otherwise.
    pub fn to_wire(&self, field: &str, mapping: &FieldMapping) -> Result<WireCondition, Error> {
        let (comparator, operands) = match self {
            Condition::Null => return Ok(bare(&Comparator::Null)),
            Condition::NotNull => return Ok(bare(&Comparator::NotNull)),
            Condition::Eq(value) => (Comparator::Eq, std::slice::from_ref(value)),
            Condition::In(values) => (Comparator::In, values.as_slice()),
            Condition::Compare(comparator, values) => (comparator.clone(), values.as_slice()),
        };
        if operands.is_empty() {
            if matches!(comparator, Comparator::Null | Comparator::NotNull) {
                return Ok(bare(&comparator));
            }
            return Err(Error::validation(format!(
                "{comparator} condition on `{field}` has no operands"
            )));
        }

        let owner = Record::new();
        let mut encoded = Vec::with_capacity(operands.len());
        for operand in operands {
            match mapping.encode(operand, field, &owner)? {
                Some(attr) => encoded.push(attr),
                None => {
                    let rewritten = match comparator {
                        Comparator::Ne | Comparator::NotContains => Comparator::NotNull,
                        _ => Comparator::Null,
                    };
                    return Ok(bare(&rewritten));
                }
            }
        }

        Ok(WireCondition {
            comparison_operator: comparator.as_str().to_string(),
            attribute_value_list: Some(encoded),
        })
    }
}

fn bare(comparator: &Comparator) -> WireCondition {
    WireCondition {
        comparison_operator: comparator.as_str().to_string(),
        attribute_value_list: None,
    }
}

/// Parse a record of declarative conditions, one per field
pub fn conditions(record: Record) -> Result<ConditionSet, Error> {
    record
        .into_iter()
        .map(|(field, value)| Ok((field, Condition::from_value(value)?)))
        .collect()
}

/// Encode every condition of `set`
pub(crate) fn wire_conditions(
    set: &ConditionSet,
    mapping: &FieldMapping,
) -> Result<WireConditions, Error> {
    set.iter()
        .map(|(field, condition)| Ok((field.clone(), condition.to_wire(field, mapping)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::WireAttribute;

    fn wire(condition: Condition) -> WireCondition {
        condition.to_wire("field", &FieldMapping::new()).unwrap()
    }

    #[test]
    fn test_comparator_aliases() {
        assert_eq!(Comparator::parse("=="), Comparator::Eq);
        assert_eq!(Comparator::parse(">=<="), Comparator::Between);
        assert_eq!(Comparator::parse("startsWith"), Comparator::BeginsWith);
        assert_eq!(Comparator::parse("doesNotContain"), Comparator::NotContains);
        assert_eq!(Comparator::parse("contains"), Comparator::Contains);
        assert_eq!(Comparator::parse("weird").as_str(), "WEIRD");
    }

    #[test]
    fn test_declarative_forms() {
        assert_eq!(Condition::from_value(Value::Null).unwrap(), Condition::Null);
        assert_eq!(Condition::from_value("notNull".into()).unwrap(), Condition::NotNull);
        assert_eq!(
            Condition::from_value(Value::Int(3)).unwrap(),
            Condition::Eq(Value::Int(3))
        );
        assert_eq!(
            Condition::from_value(Value::List(vec![1.into(), 2.into()])).unwrap(),
            Condition::In(vec![1.into(), 2.into()])
        );

        let mut op = Record::new();
        let _ = op.insert(">=<=".into(), Value::List(vec![1.into(), 5.into()]));
        assert_eq!(
            Condition::from_value(Value::Map(op)).unwrap(),
            Condition::between(1, 5)
        );

        let mut two = Record::new();
        let _ = two.insert("<".into(), 1.into());
        let _ = two.insert(">".into(), 5.into());
        assert!(Condition::from_value(Value::Map(two)).unwrap_err().is_validation_error());
    }

    #[test]
    fn test_wire_shapes() {
        assert_eq!(
            wire(Condition::between(1, 5)),
            WireCondition {
                comparison_operator: "BETWEEN".into(),
                attribute_value_list: Some(vec![
                    WireAttribute::N("1".into()),
                    WireAttribute::N("5".into())
                ]),
            }
        );
        assert_eq!(wire(Condition::Null), bare(&Comparator::Null));
        assert_eq!(wire(Condition::In(vec!["a".into()])).comparison_operator, "IN");
    }

    #[test]
    fn test_empty_operand_rewrites() {
        assert_eq!(wire(Condition::eq("")).comparison_operator, "NULL");
        assert_eq!(wire(Condition::compare("!=", "")), bare(&Comparator::NotNull));
        assert_eq!(
            wire(Condition::compare("doesNotContain", Value::Null)),
            bare(&Comparator::NotNull)
        );
        assert_eq!(wire(Condition::begins_with("")), bare(&Comparator::Null));
        assert_eq!(wire(Condition::between("a", "")), bare(&Comparator::Null));
    }

    #[test]
    fn test_conditions_from_record() {
        let mut record = Record::new();
        let _ = record.insert("id".into(), "abc".into());
        let _ = record.insert("deleted".into(), Value::Null);

        let set = conditions(record).unwrap();
        assert_eq!(set["id"], Condition::eq("abc"));
        assert_eq!(set["deleted"], Condition::Null);
    }
}
