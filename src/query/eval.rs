//! Query evaluator.
//!
//! Conditions are evaluated left to right. Each condition produces a set of
//! rows over the variables it mentions; those rows are folded into a global
//! binding matrix by natural join on the shared variables (cross product when
//! none are shared). Variable domains are always the distinct projection of a
//! matrix column, so domains and matrix never disagree.
//!
//! A middle variable matching several relations on one entry contributes one
//! row per match — join semantics, never first-match.

use hashbrown::HashSet;

use super::ast::{Condition, Query, Term};
use crate::model::{DataKind, Datum, EntryKey};
use crate::store::TripleStore;
use crate::Result;

// ============================================================================
// Bindings
// ============================================================================

/// The evolving table of consistent variable assignments.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    columns: Vec<String>,
    kinds: Vec<DataKind>,
    rows: Vec<Vec<Datum>>,
    seeded: bool,
    associated: bool,
}

impl Bindings {
    fn column_index(&self, variable: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == variable)
    }

    /// Whether `variable` has been bound by an earlier condition.
    pub fn is_bound(&self, variable: &str) -> bool {
        self.column_index(variable).is_some()
    }

    /// Distinct values of a bound variable, in first-appearance row order.
    /// `None` if the variable was never bound.
    pub fn domain(&self, variable: &str) -> Option<Vec<Datum>> {
        let col = self.column_index(variable)?;
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for row in &self.rows {
            if seen.insert(row[col]) {
                out.push(row[col]);
            }
        }
        Some(out)
    }

    /// Size of a bound variable's domain; 0 if unbound.
    pub fn domain_len(&self, variable: &str) -> usize {
        self.domain(variable).map_or(0, |d| d.len())
    }

    pub fn kind(&self, variable: &str) -> Option<DataKind> {
        self.column_index(variable).map(|i| self.kinds[i])
    }

    /// Row-correlated values of two variables.
    pub fn pairs(&self, a: &str, b: &str) -> Vec<(Datum, Datum)> {
        let (Some(ca), Some(cb)) = (self.column_index(a), self.column_index(b)) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for row in &self.rows {
            let pair = (row[ca], row[cb]);
            if seen.insert(pair) {
                out.push(pair);
            }
        }
        out
    }

    /// Row-correlated values of one variable, duplicates preserved.
    pub fn column(&self, variable: &str) -> Vec<Datum> {
        match self.column_index(variable) {
            Some(col) => self.rows.iter().map(|row| row[col]).collect(),
            None => Vec::new(),
        }
    }

    /// True once any single condition has bound more than one variable —
    /// results must then preserve row correlation.
    pub fn is_associated(&self) -> bool {
        self.associated
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Fold one condition's rows into the matrix.
    fn merge(&mut self, vars: &[(String, DataKind)], rows: Vec<Vec<Datum>>) {
        let rows = dedup_rows(rows);

        if !self.seeded {
            self.columns = vars.iter().map(|(n, _)| n.clone()).collect();
            self.kinds = vars.iter().map(|(_, k)| *k).collect();
            self.rows = rows;
            self.seeded = true;
            return;
        }

        // (matrix column, condition column) pairs for shared variables, and
        // the condition columns of first-seen variables.
        let mut shared: Vec<(usize, usize)> = Vec::new();
        let mut fresh: Vec<usize> = Vec::new();
        for (j, (name, kind)) in vars.iter().enumerate() {
            match self.column_index(name) {
                Some(i) => shared.push((i, j)),
                None => {
                    self.columns.push(name.clone());
                    self.kinds.push(*kind);
                    fresh.push(j);
                }
            }
        }

        let mut joined = Vec::new();
        for row in &self.rows {
            for cond_row in &rows {
                if shared.iter().all(|&(i, j)| row[i] == cond_row[j]) {
                    let mut wide = row.clone();
                    wide.extend(fresh.iter().map(|&j| cond_row[j]));
                    joined.push(wide);
                }
            }
        }
        self.rows = joined;
    }
}

fn dedup_rows(rows: Vec<Vec<Datum>>) -> Vec<Vec<Datum>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for row in rows {
        if seen.insert(row.clone()) {
            out.push(row);
        }
    }
    out
}

// ============================================================================
// Evaluation
// ============================================================================

/// Evaluate a parsed query against the store.
pub fn evaluate(store: &TripleStore, query: &Query) -> Result<Bindings> {
    let mut bindings = Bindings::default();
    for condition in &query.conditions {
        let (vars, rows) = eval_condition(store, condition, &bindings);
        if vars.len() > 1 {
            bindings.associated = true;
        }
        bindings.merge(&vars, rows);
    }
    Ok(bindings)
}

/// Evaluate one condition against the store under the current bindings.
/// Returns the condition's variable columns and its surviving rows.
fn eval_condition(
    store: &TripleStore,
    condition: &Condition,
    bindings: &Bindings,
) -> (Vec<(String, DataKind)>, Vec<Vec<Datum>>) {
    // Column layout of this condition: each distinct variable once, in
    // left/middle/right order. A repeated variable constrains its positions
    // to equal values.
    let mut vars: Vec<(String, DataKind)> = Vec::new();
    for (term, kind) in [
        (&condition.left, DataKind::Subject),
        (&condition.middle, DataKind::Relation),
        (&condition.right, DataKind::Subject),
    ] {
        if let Some(name) = term.as_variable() {
            if !vars.iter().any(|(n, _)| n == name) {
                vars.push((name.to_string(), kind));
            }
        }
    }

    // Bound domains are snapshotted as hash sets for membership tests.
    let domain_of = |term: &Term| -> Option<HashSet<Datum>> {
        let name = term.as_variable()?;
        bindings.is_bound(name).then(|| {
            bindings.domain(name).unwrap_or_default().into_iter().collect()
        })
    };
    let middle_domain = domain_of(&condition.middle);
    let right_domain = domain_of(&condition.right);

    // Left candidates. A bound variable iterates its ordered domain so row
    // order stays deterministic.
    let left_domain = condition
        .left
        .as_variable()
        .filter(|name| bindings.is_bound(name))
        .and_then(|name| bindings.domain(name));
    let left_keys: Vec<EntryKey> = match &condition.left {
        Term::Variable(_) => match &left_domain {
            Some(domain) => domain
                .iter()
                .filter_map(|d| match d {
                    Datum::Subject(h) => store.key_of(*h),
                    Datum::Relation(_) => None,
                })
                .collect(),
            None => store.keys().collect(),
        },
        Term::Ident(id) => store.find_key(id).into_iter().collect(),
        Term::Key(k) => {
            let key = EntryKey(*k);
            store.entry_by_key(key).map(|_| key).into_iter().collect()
        }
    };

    let mut rows = Vec::new();

    for key in left_keys {
        let Some(entry) = store.entry_by_key(key) else { continue };

        // Middle candidates on this entry.
        let relations: Vec<_> = match &condition.middle {
            Term::Variable(_) => match &middle_domain {
                Some(domain) => entry
                    .relations()
                    .filter(|r| domain.contains(&Datum::Relation(*r)))
                    .collect(),
                None => entry.relations().collect(),
            },
            Term::Ident(id) => match store.find_relation(id) {
                Some(r) if entry.has_relation(r) => vec![r],
                _ => Vec::new(),
            },
            // Keys never name relations.
            Term::Key(_) => Vec::new(),
        };

        for relation in relations {
            // Right candidates under this relation.
            let values: Vec<_> = match &condition.right {
                Term::Variable(_) => match &right_domain {
                    Some(domain) => entry
                        .values(relation)
                        .iter()
                        .copied()
                        .filter(|v| domain.contains(&Datum::Subject(*v)))
                        .collect(),
                    None => entry.values(relation).to_vec(),
                },
                Term::Ident(id) => match store.symbols().lookup(id) {
                    Some(v) if entry.contains(relation, v) => vec![v],
                    _ => Vec::new(),
                },
                Term::Key(k) => match store.entry_by_key(EntryKey(*k)) {
                    Some(value_entry) if entry.contains(relation, value_entry.id()) => {
                        vec![value_entry.id()]
                    }
                    _ => Vec::new(),
                },
            };

            for value in values {
                let assignments = [
                    (&condition.left, Datum::Subject(entry.id())),
                    (&condition.middle, Datum::Relation(relation)),
                    (&condition.right, Datum::Subject(value)),
                ];
                let mut row: Vec<Option<Datum>> = vec![None; vars.len()];
                let mut consistent = true;
                for (term, datum) in assignments {
                    let Some(name) = term.as_variable() else { continue };
                    let Some(col) = vars.iter().position(|(n, _)| n == name) else { continue };
                    match row[col] {
                        None => row[col] = Some(datum),
                        Some(existing) if existing == datum => {}
                        Some(_) => {
                            consistent = false;
                            break;
                        }
                    }
                }
                if consistent {
                    rows.push(row.into_iter().flatten().collect());
                }
            }
        }
    }

    (vars, rows)
}

// ============================================================================
// Tests
// ============================================================================
