use csspec::{
    DomAdapter as _, ElementSet, Expectation, HtmlDocument, StylesheetRegistry,
    resolve_relative_element,
};
use html::NodeId;

const NESTED: &str = r#"<html><body>
<div id="a" class="x"><div id="b" class="x"><div id="c"></div></div><div id="d" class="cousin"></div></div>
</body></html>"#;

const SIBLINGS: &str = r#"<html><body>
<div id="s"><div id="a" class="x"></div><div id="b"></div><div id="c"></div></div>
</body></html>"#;

fn element(doc: &HtmlDocument, id: &str) -> NodeId {
    doc.dom.query_selector_all(&format!("#{id}")).unwrap()[0]
}

/// Ids of the set resolved from `relative`, with `#c` as the current element.
fn resolve(doc: &HtmlDocument, current_selector: &str, relative: &str) -> String {
    let current = ElementSet::new(vec![element(doc, "c")], current_selector);
    resolve_relative_element(doc, relative, &current)
        .unwrap()
        .iter()
        .filter_map(|node| doc.id(node))
        .collect::<Vec<_>>()
        .join(",")
}

/// Ids resolved from `relative` in a page holding `body`, the current set being every
/// element matching `rule`.
fn resolve_in(body: &str, rule: &str, relative: &str) -> String {
    let doc = HtmlDocument::parse(&format!("<html><body>{body}</body></html>"), None).unwrap();
    let current = ElementSet::select(&doc, rule).unwrap();
    resolve_relative_element(&doc, relative, &current)
        .unwrap()
        .iter()
        .filter_map(|node| doc.id(node))
        .collect::<Vec<_>>()
        .join(",")
}

const CHAIN: &str = r#"<div id="a"><div id="b"><div id="c"></div></div></div>"#;
const PAIR: &str = r#"<div id="a"><div id="b"></div><div id="c"></div></div>"#;
const DEEP: &str = r#"<div id="a"><div id="b"><div id="c"><div id="d"></div></div></div></div>"#;

#[test]
fn relative_references_across_small_trees() {
    for (body, rule, relative, expected) in [
        (CHAIN, "#a", "#b", "b"),
        (CHAIN, "#a", "div", "b,c"),
        (CHAIN, "#a", "div div", "c"),
        (CHAIN, "#a", "div > div", "c"),
        (CHAIN, "#a", "#b >div", "c"),
        (CHAIN, "#a #c", "^*#a", "a"),
        (CHAIN, "#a div div", "^*#a", "a"),
        (CHAIN, "div div div", "^*div", "b,a"),
        (PAIR, "#a #b", "^*div div", "b,c"),
        (CHAIN, "#a #c", "&", "c"),
        (CHAIN, "#a #c", "&#c", "c"),
        (CHAIN, "#a #c", "&#a", ""),
        (CHAIN, "#a", "& div", "b,c"),
        (CHAIN, "#a", "& > div", "b"),
        (CHAIN, "#a #c", "^", "a"),
        (CHAIN, "div > #c", "^", "b"),
        (CHAIN, "div #c", "^#a", "a"),
        (CHAIN, "div > #c", "^#b", "b"),
        (CHAIN, "div > #c", "^#a", ""),
        (PAIR, "div #b", "^div", "a"),
        (CHAIN, "#a div #c", "^^", "a"),
        (DEEP, "#a div #d", "^^#a", "a"),
        (DEEP, "#a div #d", "^^#b", ""),
    ] {
        assert_eq!(
            resolve_in(body, rule, relative),
            expected,
            "{relative:?} from {rule:?}"
        );
    }
}

#[test]
fn carets_walk_ancestors() {
    let doc = HtmlDocument::parse(NESTED, None).unwrap();
    for (current, relative, expected) in [
        ("#a #c", "^", "a"),
        ("div #c", "^.x", "b"),
        ("div #c", "^#a", "a"),
        ("div #c", "^#c", ""),
        ("#a #c", "^ .cousin", "d"),
        ("#a div #c", "^^", "a"),
        ("#a #c", "&&", "a"),
        ("#a div #c", "&&&", "a"),
        ("div div div", "^*div", "b,a"),
        ("#c", "^*", "b,a"),
    ] {
        assert_eq!(
            resolve(&doc, current, relative),
            expected,
            "{relative:?} from {current:?}"
        );
    }
}

#[test]
fn carets_follow_sibling_combinators() {
    let doc = HtmlDocument::parse(SIBLINGS, None).unwrap();
    for (current, relative, expected) in [
        ("div > #c", "^", "s"),
        ("div > #c", "^#s", "s"),
        ("div > #c", "^#a", ""),
        ("div + #c", "^", "b"),
        ("div + #c", "^div#b", "b"),
        ("div + #c", "^#a", ""),
        ("div ~ #c", "^", "b"),
        ("div ~ #c", "^div", "b"),
        ("div ~ #c", "^.x", "a"),
    ] {
        assert_eq!(
            resolve(&doc, current, relative),
            expected,
            "{relative:?} from {current:?}"
        );
    }
}

#[test]
fn ampersand_and_bare_selectors() {
    let doc = HtmlDocument::parse(NESTED, None).unwrap();
    let a = ElementSet::new(vec![element(&doc, "a")], "#a");
    let ids = |set: ElementSet<NodeId>| {
        set.iter()
            .filter_map(|node| doc.id(node))
            .collect::<Vec<_>>()
            .join(",")
    };
    assert_eq!(ids(resolve_relative_element(&doc, "div div", &a).unwrap()), "c");
    assert_eq!(ids(resolve_relative_element(&doc, "& > div", &a).unwrap()), "b,d");
    assert_eq!(ids(resolve_relative_element(&doc, "&.x", &a).unwrap()), "a");
    assert_eq!(resolve(&doc, "#a #c", "&#a"), "");
}

#[test]
fn expressions_substitute_attribute_references() {
    let mut doc = HtmlDocument::parse(NESTED, None).unwrap();
    let mut registry = StylesheetRegistry::new();
    registry
        .append_stylesheet(&mut doc, "#a { width: 10px } #c { width: 5px } #d { width: 30px }")
        .unwrap();
    let target = ElementSet::new(vec![element(&doc, "c")], "#a #c");
    let expectation = Expectation::new("width", "^[width]");

    let resolve = |expression: &str| {
        expectation
            .resolve_expression(&doc, &registry, &target, expression)
            .unwrap()
    };
    assert_eq!(resolve("^[width]"), "10px");
    assert_eq!(resolve("'(^ .cousin)[width]'"), "30px");
    assert_eq!(resolve("[width]"), "5px");
    assert_eq!(resolve("&[width] wide"), "5px wide");
    assert_eq!(resolve("^[no-such-property]"), "");
    assert_eq!(resolve("auto"), "auto");

    assert_eq!(
        expectation.test(&doc, &registry, &target).unwrap().as_deref(),
        Some("expected :width to be 10px but was 5px.")
    );
    let matching = Expectation::new("width", "(& )[width]");
    assert_eq!(matching.test(&doc, &registry, &target).unwrap(), None);
}
