use csspec::{
    CaseResult, CsspecError, DomAdapter as _, ElementSet, Expectation, HtmlDocument, Outcome,
    Stylesheet, StylesheetRegistry, TestCase,
};
use html::NodeId;
use std::sync::Arc;

const ELEMENTS: &str = r#"<div id="element1" class="single multiple"><span id="inner1" class="inner"></span></div><div id="element2" class="multiple"></div>"#;

fn page(inner: &str) -> (HtmlDocument, ElementSet<NodeId>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let markup = format!(
        r#"<!DOCTYPE html><html><head></head><body><div id="fixture">{inner}</div></body></html>"#
    );
    let doc = HtmlDocument::parse(&markup, None).unwrap();
    let fixture = ElementSet::select(&doc, "#fixture").unwrap();
    (doc, fixture)
}

fn ids(doc: &HtmlDocument, target: &ElementSet<NodeId>, _: &str, _: &Expectation) -> Option<String> {
    Some(
        target
            .iter()
            .filter_map(|node| doc.id(node))
            .collect::<Vec<_>>()
            .join(","),
    )
}

fn classes(
    doc: &HtmlDocument,
    target: &ElementSet<NodeId>,
    _: &str,
    _: &Expectation,
) -> Option<String> {
    doc.attribute(target.first()?, "class")
}

/// A registry with one sheet holding `css` plus the `ids` and `classes` probes.
fn registry(doc: &mut HtmlDocument, css: &str) -> StylesheetRegistry<HtmlDocument> {
    let mut sheet = Stylesheet::inline(doc, css, None).unwrap();
    sheet.register_function("ids", Arc::new(ids), "*", false).unwrap();
    sheet
        .register_function("classes", Arc::new(classes), "*", false)
        .unwrap();
    let mut registry = StylesheetRegistry::new();
    registry.push(sheet);
    registry
}

fn exec(
    doc: &mut HtmlDocument,
    registry: &StylesheetRegistry<HtmlDocument>,
    fixture: &ElementSet<NodeId>,
    selector: &str,
    expectations: &[(&str, &str)],
) -> CaseResult {
    let expectations = expectations
        .iter()
        .map(|(attribute, expected)| Expectation::new(*attribute, *expected))
        .collect();
    TestCase::new(selector, expectations)
        .unwrap()
        .exec(doc, registry, fixture)
        .unwrap()
}

fn assert_pass(result: &CaseResult) {
    assert_eq!(result.outcome, Outcome::Pass, "{}: {:?}", result.selector, result.messages);
}

#[test]
fn selects_by_class_and_id() {
    let (mut doc, fixture) = page(ELEMENTS);
    let registry = registry(&mut doc, "");
    for (selector, expected) in [
        (".single", "element1"),
        (".single.multiple", "element1"),
        (".single .inner", "inner1"),
        (".multiple", "element1,element2"),
        ("#element1", "element1"),
        ("#element1 #inner1", "inner1"),
        (".single#element1", "element1"),
        (".single #inner1", "inner1"),
        ("#element1 .inner", "inner1"),
        (".multiple:not(.single)", "element2"),
        (".multiple:not(#element2)", "element1"),
    ] {
        let result = exec(
            &mut doc,
            &registry,
            &fixture,
            &format!("{selector}.-it-selects"),
            &[("ids", expected)],
        );
        assert_pass(&result);
    }
}

#[test]
fn describe_classes_tag_the_fixture_then_roll_back() {
    let (mut doc, fixture) = page(ELEMENTS);
    let registry = registry(&mut doc, "");
    let before = doc.dom.to_json_value();

    let result = exec(
        &mut doc,
        &registry,
        &fixture,
        ".-describe-this.-describe-that.-it-is-tagged",
        &[("ids", "fixture"), ("classes", "-describe-this -describe-that")],
    );
    assert_pass(&result);
    assert_eq!(result.description, "this that is tagged");
    assert_eq!(doc.dom.to_json_value(), before);
}

#[test]
fn qualified_describe_classes_go_to_matching_elements() {
    let (mut doc, fixture) = page(ELEMENTS);
    let registry = registry(&mut doc, "");
    let result = exec(
        &mut doc,
        &registry,
        &fixture,
        "#inner1.-describe-this.-it-is-tagged",
        &[("ids", "inner1"), ("classes", "inner -describe-this")],
    );
    assert_pass(&result);

    let fixture_class = exec(
        &mut doc,
        &registry,
        &fixture,
        ".-describe-x .multiple.-describe-y.-it-is-nested",
        &[("ids", "element1,element2"), ("classes", "single multiple -describe-y")],
    );
    assert_pass(&fixture_class);
    assert_eq!(doc.attribute(fixture.first().unwrap(), "class"), None);
}

#[test]
fn when_selectors_attach_classes_and_ids() {
    let (mut doc, fixture) = page(r#"<div id="element1" class="single"><span id="inner1" class="inner"></span></div>"#);
    let registry = registry(&mut doc, "");
    let before = doc.dom.to_json_value();

    let attached = exec(
        &mut doc,
        &registry,
        &fixture,
        ".single.-when-in-a-state-.activate.-it-is-active",
        &[("classes", "single -when-in-a-state- activate")],
    );
    assert_pass(&attached);
    assert_eq!(attached.description, "in a state is active");

    let renamed = exec(
        &mut doc,
        &registry,
        &fixture,
        ".single.-when-renamed-#newID.-it-has-the-new-id",
        &[("ids", "newID")],
    );
    assert_pass(&renamed);

    let removed = exec(
        &mut doc,
        &registry,
        &fixture,
        "#element1.-when-not-single-:not(.single).-it-lost-the-class",
        &[("classes", "-when-not-single-")],
    );
    assert_pass(&removed);

    let chained = exec(
        &mut doc,
        &registry,
        &fixture,
        "#inner1.-when-in-a-state-.activate.-when-.featured.-it-has-all",
        &[("classes", "inner -when-in-a-state- activate -when- featured")],
    );
    assert_pass(&chained);

    assert_eq!(doc.dom.to_json_value(), before);
}

#[test]
fn negative_id_clears_only_a_matching_id() {
    let (mut doc, fixture) = page(r#"<div id="element1" class="single"></div>"#);
    let mut registry = registry(&mut doc, "");
    registry
        .get_mut(0)
        .unwrap()
        .register_function(
            "raw-id",
            Arc::new(|doc: &HtmlDocument, target: &ElementSet<NodeId>, _: &str, _: &Expectation| {
                doc.attribute(target.first()?, "id").map(|id| format!("<{id}>"))
            }),
            "*",
            false,
        )
        .unwrap();

    let cleared = exec(
        &mut doc,
        &registry,
        &fixture,
        ".single.-when-unidentified-:not(#element1).-it-has-no-id",
        &[("raw-id", "<>")],
    );
    assert_pass(&cleared);

    let untouched = exec(
        &mut doc,
        &registry,
        &fixture,
        ".single.-when-unidentified-:not(#other).-it-keeps-its-id",
        &[("raw-id", "<element1>")],
    );
    assert_pass(&untouched);

    let single = doc.dom.query_selector_all(".single").unwrap()[0];
    assert_eq!(doc.attribute(single, "id").as_deref(), Some("element1"));
}

#[test]
fn content_replaces_markup_and_is_restored() {
    let (mut doc, fixture) = page(r#"<div class="element">ORIGINAL</div>"#);
    let css = r#"
        .-describe-fixture { content: 'FIXTURE CONTENT' }
        .element.-describe-element { content: '<div id="e0" class="inner"></div>' }
        * { -fn-markup: "$el.html()" }
    "#;
    let registry = registry(&mut doc, css);
    let before = doc.dom.to_json_value();

    let fixture_content = exec(
        &mut doc,
        &registry,
        &fixture,
        ".-describe-fixture.-it-shows-the-content",
        &[("markup", "'FIXTURE CONTENT'")],
    );
    assert_pass(&fixture_content);

    let nested = exec(
        &mut doc,
        &registry,
        &fixture,
        ".element.-describe-element .inner.-it-selects-inside-the-content",
        &[("ids", "e0")],
    );
    assert_pass(&nested);

    assert_eq!(doc.dom.to_json_value(), before);
}

#[test]
fn restored_content_keeps_whitespace_and_nodes() {
    let (mut doc, fixture) = page("\n  <p class=\"x\">hi</p>\n");
    let css = r#"
        .-describe-swap { content: 'NEW' }
        * { -fn-markup: "$el.html()" }
    "#;
    let registry = registry(&mut doc, css);
    let before = doc.dom.to_json_value();
    let paragraph = doc.dom.query_selector_all(".x").unwrap();

    let swapped = exec(
        &mut doc,
        &registry,
        &fixture,
        ".-describe-swap.-it-shows-new",
        &[("markup", "'NEW'")],
    );
    assert_pass(&swapped);
    assert_eq!(doc.dom.to_json_value(), before);
    assert_eq!(doc.dom.query_selector_all(".x").unwrap(), paragraph);

    let after = exec(
        &mut doc,
        &registry,
        &fixture,
        ".x.-it-is-still-there",
        &[("classes", "x")],
    );
    assert_pass(&after);
}

#[test]
fn table_rows_take_cell_content() {
    let (mut doc, fixture) = page(
        r#"<table><tbody><tr class="row"><td id="one">1</td><td id="two">2</td></tr></tbody></table>"#,
    );
    let css = r#"
        .row.-describe-swap { content: '<td id="nine">9</td>' }
        * { -fn-markup: "$el.html()" }
    "#;
    let registry = registry(&mut doc, css);
    let before = doc.dom.to_json_value();

    let swapped = exec(
        &mut doc,
        &registry,
        &fixture,
        ".row.-describe-swap td.-it-holds-the-new-cell",
        &[("ids", "nine")],
    );
    assert_pass(&swapped);
    assert_eq!(doc.dom.to_json_value(), before);

    let cells = exec(
        &mut doc,
        &registry,
        &fixture,
        ".row td.-it-has-both-cells",
        &[("ids", "one,two")],
    );
    assert_pass(&cells);
}

#[test]
fn computed_style_expectations() {
    let (mut doc, fixture) = page(ELEMENTS);
    let css = "
        .-describe-menu .single { position: absolute }
        .-describe-menu.-when-open .single { position: fixed; color: red }
        .-describe-menu .single.-it-is-absolute { position: absolute }
        .-describe-menu.-when-open .single.-it-is-fixed { position: fixed; color: red }
        .-describe-menu .multiple.-it-reads-the-first { position: absolute }
    ";
    let registry = registry(&mut doc, css);
    let results = registry
        .exec_all(&mut doc, &fixture)
        .unwrap();
    assert_eq!(results.len(), 3);
    for result in &results {
        assert_pass(result);
    }
    assert_eq!(results[1].description, "menu open is fixed");
}

#[test]
fn failures_evaluate_every_expectation() {
    let (mut doc, fixture) = page(ELEMENTS);
    let registry = registry(&mut doc, "#element1 { position: relative }");
    let result = exec(
        &mut doc,
        &registry,
        &fixture,
        ".single.-it-is-wrong-twice",
        &[("position", "absolute"), ("ids", "element1"), ("display", "inline")],
    );
    assert_eq!(result.outcome, Outcome::Fail);
    assert_eq!(
        result.messages,
        [
            "expected :position to be absolute but was relative.",
            "expected :display to be inline but was block.",
        ]
    );
}

#[test]
fn pending_and_inapplicable() {
    let (mut doc, fixture) = page(ELEMENTS);
    let registry = registry(&mut doc, "");
    let pending = exec(&mut doc, &registry, &fixture, ".single.-it-is-not-written-yet", &[]);
    assert_eq!(pending.outcome, Outcome::Pending);
    assert!(pending.messages.is_empty());

    let inapplicable = exec(
        &mut doc,
        &registry,
        &fixture,
        ".missing.-it-has-no-target",
        &[("position", "static")],
    );
    assert_eq!(inapplicable.outcome, Outcome::Inapplicable);
}

#[test]
fn unappliable_selectors_error_and_still_roll_back() {
    let (mut doc, fixture) = page(ELEMENTS);
    let registry = registry(&mut doc, "");
    let before = doc.dom.to_json_value();
    let case = TestCase::new(
        ".-describe-x .single.-when-hovered-:hover.-it-cannot-hover",
        vec![Expectation::new("position", "static")],
    )
    .unwrap();
    let err = case.exec(&mut doc, &registry, &fixture).unwrap_err();
    assert!(matches!(err, CsspecError::UnappliableSelector(selector) if selector == ":hover"));
    assert_eq!(doc.dom.to_json_value(), before);
}

#[test]
fn test_cases_are_reusable() {
    let (mut doc, fixture) = page(ELEMENTS);
    let registry = registry(&mut doc, ".-when-on .single { color: green }");
    let case = TestCase::new(
        ".-when-on .single.-it-is-green",
        vec![Expectation::new("color", "green")],
    )
    .unwrap();
    for _ in 0..2 {
        let result = case.exec(&mut doc, &registry, &fixture).unwrap();
        assert_pass(&result);
    }
}
