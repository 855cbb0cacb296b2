//! Specificity triples.

use crate::{ComplexSelector, CompoundSelector, SimpleSelector};

/// (ids, classes, types)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Specificity(pub u16, pub u16, pub u16);

impl Specificity {
    /// Component-wise saturating sum.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(
            self.0.saturating_add(other.0),
            self.1.saturating_add(other.1),
            self.2.saturating_add(other.2),
        )
    }

    /// Collapse the triple into one integer with base 256 per component.
    ///
    /// Components above 255 carry into the next one, as a point count would.
    pub fn weight(self) -> u64 {
        u64::from(self.0) * 65_536 + u64::from(self.1) * 256 + u64::from(self.2)
    }
}

fn specificity_of_simple(simple: &SimpleSelector) -> Specificity {
    match simple {
        SimpleSelector::IdSelector(_) => Specificity(1, 0, 0),
        SimpleSelector::Class(_)
        | SimpleSelector::Attribute { .. }
        | SimpleSelector::PseudoClass(_) => Specificity(0, 1, 0),
        SimpleSelector::Type(_) | SimpleSelector::PseudoElement(_) => Specificity(0, 0, 1),
        SimpleSelector::Universal => Specificity::default(),
        // The most specific argument counts; the negation itself adds nothing.
        SimpleSelector::Negation(compounds) => compounds
            .iter()
            .map(specificity_of_compound)
            .max()
            .unwrap_or_default(),
    }
}

fn specificity_of_compound(compound: &CompoundSelector) -> Specificity {
    compound
        .simples
        .iter()
        .map(specificity_of_simple)
        .fold(Specificity::default(), Specificity::saturating_add)
}

/// Sum of the compounds.
pub fn specificity_of_complex(sel: &ComplexSelector) -> Specificity {
    sel.rest.iter().fold(specificity_of_compound(&sel.first), |total, pair| {
        total.saturating_add(specificity_of_compound(&pair.1))
    })
}
