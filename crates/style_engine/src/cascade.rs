//! Cascade resolution for a single element.
//!
//! Candidates come from the user-agent sheet, every attached author sheet and the
//! element's inline `style` attribute. Importance beats origin, origin beats specificity,
//! specificity beats source order.

use css_selectors::Specificity;
use std::collections::HashMap;

/// Where a declaration came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Origin {
    UserAgent,
    Author,
}

/// A declaration tracked during cascading with metadata used to resolve conflicts.
#[derive(Clone, Debug)]
pub(crate) struct CascadedDecl {
    /// Property value as authored, trimmed.
    pub value: String,
    pub important: bool,
    pub origin: Origin,
    /// Winning selector specificity for the rule; zero for inline style.
    pub specificity: Specificity,
    /// Global source order across attached sheets.
    pub source_order: u32,
    pub inline: bool,
}

/// Return true if `candidate` wins over `previous` according to CSS cascade rules.
fn wins_over(candidate: &CascadedDecl, previous: &CascadedDecl) -> bool {
    if candidate.important != previous.important {
        return candidate.important;
    }
    if candidate.origin != previous.origin {
        // Important user-agent declarations beat important author ones.
        return (candidate.origin > previous.origin) != candidate.important;
    }
    if candidate.inline != previous.inline {
        return candidate.inline;
    }
    if candidate.specificity != previous.specificity {
        return candidate.specificity > previous.specificity;
    }
    candidate.source_order >= previous.source_order
}

/// Insert a cascaded declaration into the property map if it wins over any existing one.
pub(crate) fn cascade_put(props: &mut HashMap<String, CascadedDecl>, name: &str, entry: CascadedDecl) {
    let should_insert = props
        .get(name)
        .is_none_or(|previous| wins_over(&entry, previous));
    if should_insert {
        props.insert(name.to_owned(), entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(value: &str, specificity: Specificity, order: u32) -> CascadedDecl {
        CascadedDecl {
            value: value.to_owned(),
            important: false,
            origin: Origin::Author,
            specificity,
            source_order: order,
            inline: false,
        }
    }

    #[test]
    fn ordering_of_importance_inline_specificity_and_order() {
        let mut props = HashMap::new();
        cascade_put(&mut props, "color", decl("red", Specificity(1, 0, 0), 0));
        cascade_put(&mut props, "color", decl("blue", Specificity(0, 1, 0), 1));
        assert_eq!(props["color"].value, "red");

        let inline = CascadedDecl {
            inline: true,
            ..decl("green", Specificity::default(), 2)
        };
        cascade_put(&mut props, "color", inline);
        assert_eq!(props["color"].value, "green");

        let important = CascadedDecl {
            important: true,
            ..decl("black", Specificity(0, 0, 1), 3)
        };
        cascade_put(&mut props, "color", important);
        assert_eq!(props["color"].value, "black");

        cascade_put(&mut props, "width", decl("1px", Specificity(0, 1, 0), 4));
        cascade_put(&mut props, "width", decl("2px", Specificity(0, 1, 0), 5));
        assert_eq!(props["width"].value, "2px");
    }

    #[test]
    fn author_beats_user_agent_unless_important() {
        let mut props = HashMap::new();
        let ua = CascadedDecl {
            origin: Origin::UserAgent,
            ..decl("block", Specificity(1, 0, 0), 0)
        };
        cascade_put(&mut props, "display", ua);
        cascade_put(&mut props, "display", decl("flex", Specificity(0, 0, 1), 1));
        assert_eq!(props["display"].value, "flex");
    }
}
