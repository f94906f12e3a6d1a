//! Typed projection of bound variables for presentation.

use serde::{Deserialize, Serialize};

use super::eval::Bindings;
use crate::model::{DataKind, Datum, EntryKey};
use crate::store::TripleStore;

/// One resolved value in a result column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultValue {
    /// The identifier string the bound handle was interned from.
    pub id: String,
    /// Entry key, for subject values that have an entry.
    pub key: Option<EntryKey>,
}

/// One selector's column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultColumn {
    pub name: String,
    pub kind: DataKind,
    pub values: Vec<ResultValue>,
}

impl ResultColumn {
    pub fn ids(&self) -> Vec<&str> {
        self.values.iter().map(|v| v.id.as_str()).collect()
    }
}

/// A query result: one column per selector.
///
/// In associated view (some condition bound several variables at once) the
/// columns are parallel — position `i` of every column belongs to the same
/// binding row, and duplicates are kept. Otherwise each column is its
/// variable's deduplicated domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    columns: Vec<ResultColumn>,
    associated: bool,
}

impl QueryResult {
    /// Project the selectors out of the final bindings.
    pub fn project(store: &TripleStore, bindings: &Bindings, selectors: &[String]) -> Self {
        let associated = bindings.is_associated();
        let columns = selectors
            .iter()
            .map(|name| {
                let kind = bindings.kind(name).unwrap_or(DataKind::Subject);
                let data = if associated {
                    bindings.column(name)
                } else {
                    bindings.domain(name).unwrap_or_default()
                };
                ResultColumn {
                    name: name.clone(),
                    kind,
                    values: data.into_iter().map(|d| resolve(store, d)).collect(),
                }
            })
            .collect();
        Self { columns, associated }
    }

    pub fn is_associated(&self) -> bool {
        self.associated
    }

    pub fn columns(&self) -> &[ResultColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ResultColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Identifier strings of one selector, empty if the selector is unknown.
    pub fn ids(&self, name: &str) -> Vec<&str> {
        self.column(name).map(|c| c.ids()).unwrap_or_default()
    }

    /// Row-correlated (a, b) identifier pairs. Meaningful in associated view,
    /// where columns are parallel.
    pub fn paired_ids(&self, a: &str, b: &str) -> Vec<(&str, &str)> {
        let left = self.ids(a);
        let right = self.ids(b);
        left.into_iter().zip(right).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(|c| c.values.is_empty())
    }
}

fn resolve(store: &TripleStore, datum: Datum) -> ResultValue {
    let id = store.symbols().resolve(datum.handle()).to_string();
    let key = match datum {
        Datum::Subject(h) => store.key_of(h),
        Datum::Relation(_) => None,
    };
    ResultValue { id, key }
}

impl std::fmt::Display for QueryResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for column in &self.columns {
            writeln!(f, "{}", column.name)?;
            writeln!(f, "[")?;
            for value in &column.values {
                match (column.kind, value.key) {
                    (DataKind::Subject, Some(key)) => {
                        writeln!(f, "\tkey : {key} => {}", value.id)?
                    }
                    (DataKind::Subject, None) => writeln!(f, "\t{}", value.id)?,
                    (DataKind::Relation, _) => writeln!(f, "\trelation : {}", value.id)?,
                }
            }
            writeln!(f, "]")?;
        }
        Ok(())
    }
}
