//! Parsing of the external command texts: insertions and relation-property
//! updates. Query text is handled by [`crate::query`].
//!
//! Commands are whitespace-separated words. Parse failures leave the store
//! untouched — nothing is resolved or interned before parsing succeeds.

use crate::model::RelationProperty;
use crate::{Error, Result};

/// `id` names the implicit subject-identity slot of an entry and may not be
/// used as a relation name.
pub const RESERVED_RELATION: &str = "id";

/// A parsed insertion: `<id> (<relation> <value>)*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertCommand {
    pub subject: String,
    pub facts: Vec<(String, String)>,
}

/// A parsed property update: `<relation> (is|not) <property>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyCommand {
    pub relation: String,
    pub enable: bool,
    pub property: RelationProperty,
}

/// Words with their byte offsets, for error positions.
fn words(text: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut offset = 0;
    for chunk in text.split_whitespace() {
        // split_whitespace loses positions; recover them by scanning forward
        let Some(found) = text[offset..].find(chunk) else { continue };
        let start = offset + found;
        out.push((start, chunk));
        offset = start + chunk.len();
    }
    out
}

fn check_identifier(position: usize, word: &str) -> Result<()> {
    if word.starts_with('?') {
        return Err(Error::Parse {
            position,
            message: format!("'{word}': identifiers may not start with '?'"),
        });
    }
    if word.contains([':', '&', ',']) {
        return Err(Error::Parse {
            position,
            message: format!("'{word}': identifiers may not contain ':', '&' or ','"),
        });
    }
    Ok(())
}

/// Parse `<id> (<relation> <value>)*`. A lone `<id>` is a valid insertion
/// creating an empty entry.
pub fn parse_insert(text: &str) -> Result<InsertCommand> {
    let words = words(text);
    let Some(&(pos, subject)) = words.first() else {
        return Err(Error::Parse {
            position: 0,
            message: "empty insertion".into(),
        });
    };
    check_identifier(pos, subject)?;

    let mut facts = Vec::new();
    let mut pairs = words[1..].chunks_exact(2);
    for pair in &mut pairs {
        let (rel_pos, relation) = pair[0];
        let (val_pos, value) = pair[1];
        check_identifier(rel_pos, relation)?;
        check_identifier(val_pos, value)?;
        if relation == RESERVED_RELATION {
            return Err(Error::Parse {
                position: rel_pos,
                message: format!("'{RESERVED_RELATION}' is reserved and may not name a relation"),
            });
        }
        facts.push((relation.to_string(), value.to_string()));
    }
    if let &[(pos, word)] = pairs.remainder() {
        return Err(Error::Parse {
            position: pos,
            message: format!("relation '{word}' has no value"),
        });
    }

    Ok(InsertCommand { subject: subject.to_string(), facts })
}

/// Parse `<relation> (is|not) <property-name>`.
pub fn parse_property(text: &str) -> Result<PropertyCommand> {
    let words = words(text);
    let [(rel_pos, relation), (qual_pos, qualifier), (prop_pos, property)] = words[..] else {
        return Err(Error::Parse {
            position: 0,
            message: "expected '<relation> (is|not) <property>'".into(),
        });
    };
    check_identifier(rel_pos, relation)?;
    if relation == RESERVED_RELATION {
        return Err(Error::Parse {
            position: rel_pos,
            message: format!("'{RESERVED_RELATION}' is reserved and may not name a relation"),
        });
    }
    let enable = match qualifier {
        "is" => true,
        "not" => false,
        other => {
            return Err(Error::Parse {
                position: qual_pos,
                message: format!("expected 'is' or 'not', got '{other}'"),
            });
        }
    };
    let property: RelationProperty = property.parse().map_err(|()| Error::Parse {
        position: prop_pos,
        message: format!("unknown property '{property}'"),
    })?;

    Ok(PropertyCommand { relation: relation.to_string(), enable, property })
}
