//! Typed query-time values.

use serde::{Deserialize, Serialize};

use super::Handle;

/// What kind of identifier a bound value refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataKind {
    Subject,
    Relation,
}

/// A value bound to a query variable: a subject or a relation handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Datum {
    Subject(Handle),
    Relation(Handle),
}

impl Datum {
    pub fn kind(self) -> DataKind {
        match self {
            Datum::Subject(_) => DataKind::Subject,
            Datum::Relation(_) => DataKind::Relation,
        }
    }

    pub fn handle(self) -> Handle {
        match self {
            Datum::Subject(h) | Datum::Relation(h) => h,
        }
    }
}
