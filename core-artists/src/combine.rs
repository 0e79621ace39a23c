//! Set algebra over the record sets of independent sub-searches.
//!
//! Records are compared through a canonical form: maps sorted by key,
//! sequences kept in order and canonicalized element-wise, scalars as they
//! are. Two records that only differ in the key order of a map are the same
//! record.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{ArtistError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CombinationLogic {
    #[default]
    Or,
    And,
}

/// Hashable, totally ordered image of a serialized record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CanonicalValue {
    Null,
    Bool(bool),
    Integer(i64),
    Unsigned(u64),
    /// IEEE-754 bits, `-0.0` folded into `0.0`.
    Float(u64),
    Text(String),
    Sequence(Vec<CanonicalValue>),
    Mapping(Vec<(String, CanonicalValue)>),
}

impl CanonicalValue {
    pub fn of<T: Serialize>(record: &T) -> Result<Self> {
        let value = serde_json::to_value(record)
            .map_err(|e| ArtistError::Canonicalization(e.to_string()))?;
        Ok(Self::from_json(&value))
    }

    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => CanonicalValue::Null,
            Value::Bool(b) => CanonicalValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    CanonicalValue::Integer(i)
                } else if let Some(u) = n.as_u64() {
                    CanonicalValue::Unsigned(u)
                } else {
                    let f = n.as_f64().unwrap_or_default();
                    CanonicalValue::Float(if f == 0.0 { 0 } else { f.to_bits() })
                }
            }
            Value::String(s) => CanonicalValue::Text(s.clone()),
            Value::Array(items) => {
                CanonicalValue::Sequence(items.iter().map(Self::from_json).collect())
            }
            Value::Object(map) => {
                let mut entries: Vec<(String, CanonicalValue)> = map
                    .iter()
                    .map(|(key, value)| (key.clone(), Self::from_json(value)))
                    .collect();
                entries.sort_by(|a, b| a.0.cmp(&b.0));
                CanonicalValue::Mapping(entries)
            }
        }
    }
}

pub struct QueryCombiner;

impl QueryCombiner {
    /// Unions or intersects `result_sets`.
    ///
    /// The output holds each canonical record once, keeping the first
    /// occurrence, ordered by canonical form. `And` over no sets, or over
    /// any empty set, is empty.
    pub fn combine<T>(result_sets: &[Vec<T>], logic: CombinationLogic) -> Result<Vec<T>>
    where
        T: Serialize + Clone,
    {
        let mut keyed: Vec<BTreeMap<CanonicalValue, &T>> = Vec::with_capacity(result_sets.len());
        for set in result_sets {
            let mut records = BTreeMap::new();
            for record in set {
                records.entry(CanonicalValue::of(record)?).or_insert(record);
            }
            keyed.push(records);
        }

        let combined: Vec<T> = match logic {
            CombinationLogic::Or => {
                let mut union: BTreeMap<&CanonicalValue, &T> = BTreeMap::new();
                for records in &keyed {
                    for (key, record) in records {
                        union.entry(key).or_insert(*record);
                    }
                }
                union.into_values().cloned().collect()
            }
            CombinationLogic::And => match keyed.split_first() {
                None => Vec::new(),
                Some((first, rest)) => {
                    let common: BTreeSet<&CanonicalValue> = first
                        .keys()
                        .filter(|key| rest.iter().all(|records| records.contains_key(*key)))
                        .collect();
                    common
                        .into_iter()
                        .filter_map(|key| first.get(key).map(|record| (*record).clone()))
                        .collect()
                }
            },
        };

        debug!(
            sets = result_sets.len(),
            logic = ?logic,
            combined = combined.len(),
            "Combined search results"
        );
        Ok(combined)
    }
}
