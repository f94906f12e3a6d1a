//! Relations and their algebraic property flags.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Handle;

/// The algebraic properties a relation can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationProperty {
    Reflexive,
    Irreflexive,
    Symmetric,
    Antisymmetric,
    Asymmetric,
    Transitive,
}

impl RelationProperty {
    pub const ALL: [RelationProperty; 6] = [
        RelationProperty::Reflexive,
        RelationProperty::Irreflexive,
        RelationProperty::Symmetric,
        RelationProperty::Antisymmetric,
        RelationProperty::Asymmetric,
        RelationProperty::Transitive,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RelationProperty::Reflexive => "reflexive",
            RelationProperty::Irreflexive => "irreflexive",
            RelationProperty::Symmetric => "symmetric",
            RelationProperty::Antisymmetric => "antisymmetric",
            RelationProperty::Asymmetric => "asymmetric",
            RelationProperty::Transitive => "transitive",
        }
    }
}

impl std::fmt::Display for RelationProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for RelationProperty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reflexive" => Ok(RelationProperty::Reflexive),
            "irreflexive" => Ok(RelationProperty::Irreflexive),
            "symmetric" => Ok(RelationProperty::Symmetric),
            "antisymmetric" => Ok(RelationProperty::Antisymmetric),
            "asymmetric" => Ok(RelationProperty::Asymmetric),
            "transitive" => Ok(RelationProperty::Transitive),
            _ => Err(()),
        }
    }
}

/// Active property flags of one relation.
///
/// Invariants (held at mutation time, never re-derived per insert):
/// - reflexive and irreflexive are mutually exclusive
/// - symmetric and asymmetric are mutually exclusive
/// - asymmetric implies antisymmetric and irreflexive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyFlags {
    pub reflexive: bool,
    pub irreflexive: bool,
    pub symmetric: bool,
    pub antisymmetric: bool,
    pub asymmetric: bool,
    pub transitive: bool,
}

impl PropertyFlags {
    pub fn is_active(&self, property: RelationProperty) -> bool {
        match property {
            RelationProperty::Reflexive => self.reflexive,
            RelationProperty::Irreflexive => self.irreflexive,
            RelationProperty::Symmetric => self.symmetric,
            RelationProperty::Antisymmetric => self.antisymmetric,
            RelationProperty::Asymmetric => self.asymmetric,
            RelationProperty::Transitive => self.transitive,
        }
    }

    /// Active properties, in declaration order.
    pub fn active(&self) -> impl Iterator<Item = RelationProperty> + '_ {
        RelationProperty::ALL.iter().copied().filter(|p| self.is_active(*p))
    }

    /// Whether any property with a closure procedure is active.
    pub fn any_closure_active(&self) -> bool {
        self.reflexive || self.irreflexive || self.symmetric || self.transitive
    }
}

/// A named relation: interned handle plus its property flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    handle: Handle,
    flags: PropertyFlags,
}

impl Relation {
    pub fn new(handle: Handle) -> Self {
        Self { handle, flags: PropertyFlags::default() }
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn flags(&self) -> &PropertyFlags {
        &self.flags
    }

    /// Switch a property on, enforcing the mutual-exclusion invariants by
    /// adjusting the dependent flags first.
    pub fn activate(&mut self, property: RelationProperty) {
        match property {
            RelationProperty::Reflexive => {
                self.flags.irreflexive = false;
                self.flags.reflexive = true;
            }
            RelationProperty::Irreflexive => {
                self.flags.reflexive = false;
                self.flags.irreflexive = true;
            }
            RelationProperty::Symmetric => {
                self.flags.asymmetric = false;
                self.flags.symmetric = true;
            }
            RelationProperty::Antisymmetric => {
                self.flags.antisymmetric = true;
            }
            RelationProperty::Asymmetric => {
                // asymmetric subsumes antisymmetric and irreflexive
                self.flags.symmetric = false;
                self.flags.reflexive = false;
                self.flags.asymmetric = true;
                self.flags.antisymmetric = true;
                self.flags.irreflexive = true;
            }
            RelationProperty::Transitive => {
                self.flags.transitive = true;
            }
        }
        debug!(relation = %self.handle, property = %property, "property activated");
    }

    /// Switch a property off. Facts already derived while it was active are
    /// kept; only the flag changes.
    pub fn deactivate(&mut self, property: RelationProperty) {
        match property {
            RelationProperty::Reflexive => self.flags.reflexive = false,
            RelationProperty::Irreflexive => self.flags.irreflexive = false,
            RelationProperty::Symmetric => self.flags.symmetric = false,
            RelationProperty::Antisymmetric => self.flags.antisymmetric = false,
            RelationProperty::Asymmetric => self.flags.asymmetric = false,
            RelationProperty::Transitive => self.flags.transitive = false,
        }
        debug!(relation = %self.handle, property = %property, "property deactivated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflexive_clears_irreflexive() {
        let mut rel = Relation::new(Handle(0));
        rel.activate(RelationProperty::Irreflexive);
        rel.activate(RelationProperty::Reflexive);
        assert!(rel.flags().reflexive);
        assert!(!rel.flags().irreflexive);
    }

    #[test]
    fn test_asymmetric_implies_antisymmetric_irreflexive() {
        let mut rel = Relation::new(Handle(0));
        rel.activate(RelationProperty::Symmetric);
        rel.activate(RelationProperty::Asymmetric);
        let flags = rel.flags();
        assert!(flags.asymmetric);
        assert!(flags.antisymmetric);
        assert!(flags.irreflexive);
        assert!(!flags.symmetric);
        assert!(!flags.reflexive);
    }

    #[test]
    fn test_deactivate_asymmetric_keeps_implied_flags() {
        let mut rel = Relation::new(Handle(0));
        rel.activate(RelationProperty::Asymmetric);
        rel.deactivate(RelationProperty::Asymmetric);
        assert!(!rel.flags().asymmetric);
        // implied flags were set at activation time and stay
        assert!(rel.flags().antisymmetric);
        assert!(rel.flags().irreflexive);
    }

    #[test]
    fn test_property_from_str() {
        assert_eq!("SYMMETRIC".parse(), Ok(RelationProperty::Symmetric));
        assert_eq!("transitive".parse(), Ok(RelationProperty::Transitive));
        assert!("commutative".parse::<RelationProperty>().is_err());
    }
}
