//! Field-level comparison of the local replica against the remote catalog.
//!
//! # Algorithm
//!
//! 1. Index remote records by code (first occurrence wins on duplicates).
//! 2. Walk local records in input order: no remote match gives `LocalOnly`;
//!    a match with at least one differing field gives `Modified`.
//! 3. Walk remote records in input order: no local match gives `RemoteOnly`.
//!
//! Matched records with no differing fields produce no report. The engine
//! only detects differences; choosing a winner is left to the caller.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{CatalogError, Side};
use crate::product::{Code, Product, CODE_FIELD};

/// Local and remote values of one differing field. `None` means the field
/// is absent on that side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDelta {
    pub local: Option<Value>,
    pub remote: Option<Value>,
}

/// One record that is not in sync.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Difference {
    /// Only present locally (typically created offline).
    LocalOnly { local: Product },

    /// Only present remotely.
    RemoteOnly { remote: Product },

    /// Present on both sides with at least one differing field.
    Modified {
        local: Product,
        remote: Product,
        deltas: BTreeMap<String, FieldDelta>,
    },
}

impl Difference {
    pub fn kind(&self) -> &'static str {
        match self {
            Difference::LocalOnly { .. } => "local_only",
            Difference::RemoteOnly { .. } => "remote_only",
            Difference::Modified { .. } => "modified",
        }
    }

    /// Code of the record this report is about.
    pub fn code(&self) -> Option<Code> {
        match self {
            Difference::LocalOnly { local } | Difference::Modified { local, .. } => local.code,
            Difference::RemoteOnly { remote } => remote.code,
        }
    }
}

/// Per-kind report counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub local_only: usize,
    pub remote_only: usize,
    pub modified: usize,
}

impl DiffSummary {
    pub fn of(differences: &[Difference]) -> Self {
        let mut summary = Self::default();
        for d in differences {
            match d {
                Difference::LocalOnly { .. } => summary.local_only += 1,
                Difference::RemoteOnly { .. } => summary.remote_only += 1,
                Difference::Modified { .. } => summary.modified += 1,
            }
        }
        summary
    }

    pub fn is_in_sync(&self) -> bool {
        self.local_only == 0 && self.remote_only == 0 && self.modified == 0
    }
}

fn codes_of(records: &[Product], side: Side) -> Result<Vec<Code>, CatalogError> {
    records
        .iter()
        .enumerate()
        .map(|(index, r)| r.code.ok_or(CatalogError::MalformedRecord { side, index }))
        .collect()
}

/// Compare the local and remote record sets.
///
/// Reports for local records (local-only and modified) come first in local
/// input order, then remote-only reports in remote input order. Fails with
/// `MalformedRecord` if any input record has no code.
pub fn diff(local: &[Product], remote: &[Product]) -> Result<Vec<Difference>, CatalogError> {
    let local_codes = codes_of(local, Side::Local)?;
    let remote_codes = codes_of(remote, Side::Remote)?;

    let mut remote_index: HashMap<Code, usize> = HashMap::with_capacity(remote.len());
    for (i, code) in remote_codes.iter().enumerate() {
        remote_index.entry(*code).or_insert(i);
    }
    let local_set: HashSet<Code> = local_codes.iter().copied().collect();

    let mut differences = Vec::new();

    for (record, code) in local.iter().zip(&local_codes) {
        match remote_index.get(code) {
            None => differences.push(Difference::LocalOnly {
                local: record.clone(),
            }),
            Some(&i) => {
                let deltas = field_deltas(&record.fields, &remote[i].fields);
                if !deltas.is_empty() {
                    differences.push(Difference::Modified {
                        local: record.clone(),
                        remote: remote[i].clone(),
                        deltas,
                    });
                }
            }
        }
    }

    for (record, code) in remote.iter().zip(&remote_codes) {
        if !local_set.contains(code) {
            differences.push(Difference::RemoteOnly {
                remote: record.clone(),
            });
        }
    }

    Ok(differences)
}

/// Differing fields over the union of both sides' field names. The code
/// field is the match key and never a delta.
pub fn field_deltas(local: &Map<String, Value>, remote: &Map<String, Value>) -> BTreeMap<String, FieldDelta> {
    let names: BTreeSet<&String> = local
        .keys()
        .chain(remote.keys())
        .filter(|name| name.as_str() != CODE_FIELD)
        .collect();
    let mut deltas = BTreeMap::new();

    for name in names {
        let l = local.get(name);
        let r = remote.get(name);
        let same = match (l, r) {
            (Some(a), Some(b)) => values_equal(a, b),
            (None, None) => true,
            _ => false,
        };
        if !same {
            deltas.insert(
                name.clone(),
                FieldDelta {
                    local: l.cloned(),
                    remote: r.cloned(),
                },
            );
        }
    }

    deltas
}

/// Structural equality. Arrays and objects compare element-wise; numbers
/// compare by value, so `10` equals `10.0`.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if x.is_f64() || y.is_f64() {
                x.as_f64() == y.as_f64()
            } else {
                x == y
            }
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(p, q)| values_equal(p, q))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| values_equal(v, w)))
        }
        _ => a == b,
    }
}
