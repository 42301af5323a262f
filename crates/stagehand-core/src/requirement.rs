//! Declared input requirements.
//!
//! A requirement is either a bare type identifier (cardinality defaults to
//! exactly one) or a (type, cardinality) pair. The two shapes are a closed
//! sum type; configuration data is parsed into it strictly, with malformed
//! entries rejected at construction time, never at call time.

use crate::error::{Error, Result};
use serde::de::{self, Deserializer};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// How many context values a requirement expects to resolve to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    Single,
    Multiple,
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::Multiple => write!(f, "multiple"),
        }
    }
}

/// One declared input requirement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequirementSpec {
    /// Bare type identifier; exactly one value expected.
    Exact(String),
    /// Type identifier with an explicit cardinality.
    Cardinality(String, Cardinality),
}

impl RequirementSpec {
    pub fn exact(type_id: impl Into<String>) -> Self {
        Self::Exact(type_id.into())
    }

    pub fn single(type_id: impl Into<String>) -> Self {
        Self::Cardinality(type_id.into(), Cardinality::Single)
    }

    pub fn multiple(type_id: impl Into<String>) -> Self {
        Self::Cardinality(type_id.into(), Cardinality::Multiple)
    }

    pub fn type_id(&self) -> &str {
        match self {
            Self::Exact(t) => t,
            Self::Cardinality(t, _) => t,
        }
    }

    pub fn cardinality(&self) -> Cardinality {
        match self {
            Self::Exact(_) => Cardinality::Single,
            Self::Cardinality(_, c) => *c,
        }
    }

    /// Parse one configuration value. Accepted shapes: a type-identifier
    /// string, or a `[type, "single" | "multiple"]` pair.
    pub fn from_value(value: &Value) -> std::result::Result<Self, String> {
        match value {
            Value::String(t) if !t.is_empty() => Ok(Self::Exact(t.clone())),
            Value::String(_) => Err("type identifier must be non-empty".into()),
            Value::Array(pair) => {
                if pair.len() != 2 {
                    return Err(shape_error(value));
                }
                let (Some(t), Some(c)) = (pair[0].as_str(), pair[1].as_str()) else {
                    return Err(shape_error(value));
                };
                if t.is_empty() {
                    return Err("type identifier must be non-empty".into());
                }
                match c {
                    "single" => Ok(Self::Cardinality(t.into(), Cardinality::Single)),
                    "multiple" => Ok(Self::Cardinality(t.into(), Cardinality::Multiple)),
                    other => Err(format!(
                        "cardinality must be \"single\" or \"multiple\", got \"{}\"",
                        other
                    )),
                }
            }
            _ => Err(shape_error(value)),
        }
    }
}

fn shape_error(value: &Value) -> String {
    format!(
        "expected a type-identifier string or a [type, \"single\"|\"multiple\"] pair, got {}",
        value
    )
}

/// Parse a full `requires` list, naming the offending index on rejection.
pub fn parse_requires(entries: &[Value]) -> Result<Vec<RequirementSpec>> {
    entries
        .iter()
        .enumerate()
        .map(|(index, value)| {
            RequirementSpec::from_value(value)
                .map_err(|detail| Error::InvalidRequirement { index, detail })
        })
        .collect()
}

// Wire shape matches the configuration shorthand: bare string or pair.
impl Serialize for RequirementSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Exact(t) => serializer.serialize_str(t),
            Self::Cardinality(t, c) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(t)?;
                seq.serialize_element(&c.to_string())?;
                seq.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for RequirementSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_string_defaults_to_single() {
        let spec = RequirementSpec::from_value(&json!("document")).unwrap();
        assert_eq!(spec, RequirementSpec::exact("document"));
        assert_eq!(spec.cardinality(), Cardinality::Single);
    }

    #[test]
    fn pair_with_explicit_cardinality() {
        let spec = RequirementSpec::from_value(&json!(["reading", "multiple"])).unwrap();
        assert_eq!(spec.type_id(), "reading");
        assert_eq!(spec.cardinality(), Cardinality::Multiple);
    }

    #[test]
    fn rejects_unknown_cardinality_literal() {
        let err = RequirementSpec::from_value(&json!(["reading", "many"])).unwrap_err();
        assert!(err.contains("single"), "unexpected message: {}", err);
        assert!(err.contains("multiple"));
    }

    #[test]
    fn rejects_malformed_shapes() {
        for bad in [json!(42), json!(["only-one"]), json!(["a", "b", "c"]), json!({})] {
            let err = RequirementSpec::from_value(&bad).unwrap_err();
            assert!(
                err.contains("pair") || err.contains("non-empty"),
                "unexpected message for {}: {}",
                bad,
                err
            );
        }
    }

    #[test]
    fn parse_requires_names_offending_index() {
        let entries = vec![json!("fine"), json!(["also-fine", "single"]), json!(7)];
        let err = parse_requires(&entries).unwrap_err();
        match err {
            Error::InvalidRequirement { index, .. } => assert_eq!(index, 2),
            other => panic!("expected InvalidRequirement, got {}", other),
        }
    }

    #[test]
    fn serde_round_trip() {
        let specs = vec![
            RequirementSpec::exact("document"),
            RequirementSpec::multiple("reading"),
        ];
        let json = serde_json::to_string(&specs).unwrap();
        assert_eq!(json, r#"["document",["reading","multiple"]]"#);
        let back: Vec<RequirementSpec> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, specs);
    }
}
