use csspec::{
    CaseResult, CsspecError, DomAdapter as _, ElementSet, Expectation, HtmlDocument, OnLoad,
    Outcome, Report, SheetOrigin, Stylesheet, StylesheetRegistry,
};
use html::NodeId;
use std::cell::Cell;
use std::rc::Rc;
use url::Url;

const PAGE: &str = r#"<html><body><div id="fixture">
<div id="outer" class="box"><span id="inner" class="label" data-tone="warm"></span></div>
</div></body></html>"#;

fn inner(doc: &HtmlDocument) -> ElementSet<NodeId> {
    ElementSet::select(doc, "#inner").unwrap()
}

fn custom(
    doc: &HtmlDocument,
    registry: &StylesheetRegistry<HtmlDocument>,
    attribute: &str,
) -> Option<String> {
    let target = inner(doc);
    registry
        .element_fn_attribute(doc, &target, attribute)
        .unwrap()
        .and_then(|function| function.evaluate(doc, &target, &Expectation::new(attribute, "")))
}

fn resolved(
    doc: &HtmlDocument,
    registry: &StylesheetRegistry<HtmlDocument>,
    attribute: &str,
) -> Option<String> {
    Expectation::new(attribute, "")
        .resolve_attribute(doc, registry, &inner(doc), attribute)
        .unwrap()
}

#[test]
fn prepare_collects_test_cases_and_functions() {
    let mut doc = HtmlDocument::parse(PAGE, None).unwrap();
    let sheet = Stylesheet::inline(
        &mut doc,
        r#"
        .box { color: red }
        .box .label.-it-is-red, .box.-it-is-also-red { color: red; -fn-tone: "$el.attr('data-tone')" }
        .-describe-a .-it-is-pending {}
        "#,
        None,
    )
    .unwrap();

    assert!(sheet.loaded());
    assert_eq!(sheet.origin(), &SheetOrigin::Inline);
    let selectors: Vec<&str> = sheet.test_cases().iter().map(|case| case.selector()).collect();
    assert_eq!(
        selectors,
        [".box .label.-it-is-red", ".box.-it-is-also-red", ".-describe-a .-it-is-pending"]
    );
    assert_eq!(
        sheet.test_cases()[0].expectations(),
        [Expectation::new("color", "red")]
    );
    assert!(sheet.test_cases()[2].expectations().is_empty());
    assert_eq!(sheet.functions().attribute_count(), 2);
    assert_eq!(sheet.functions().get("tone").len(), 2);
}

#[test]
fn malformed_sheets_are_rejected() {
    let mut doc = HtmlDocument::parse(PAGE, None).unwrap();
    let nested = Stylesheet::inline(&mut doc, ".-it-a .-it-b { color: red }", None);
    assert!(matches!(nested, Err(CsspecError::NestedRequirement(_))));

    let unsupported = Stylesheet::inline(&mut doc, r#".box { -fn-x: "alert(1)" }"#, None);
    assert!(matches!(unsupported, Err(CsspecError::FunctionSource { .. })));
}

#[test]
fn rejected_sheets_leave_no_styles_behind() {
    let mut doc = HtmlDocument::parse(PAGE, None).unwrap();
    let mut registry = StylesheetRegistry::new();
    let nested = registry.append_stylesheet(
        &mut doc,
        "#inner { color: red } .-it-a .-it-b { color: red }",
    );
    assert!(matches!(nested, Err(CsspecError::NestedRequirement(_))));
    let unsupported =
        registry.append_stylesheet(&mut doc, r#"#inner { width: 9px; -fn-x: "alert(1)" }"#);
    assert!(matches!(unsupported, Err(CsspecError::FunctionSource { .. })));

    assert!(registry.is_empty());
    assert_eq!(doc.styles.author_sheet_count(), 0);
    let span = inner(&doc).first().unwrap();
    assert_ne!(doc.computed_style(span, "color").as_deref(), Some("red"));
    assert_ne!(doc.computed_style(span, "width").as_deref(), Some("9px"));
}

#[test]
fn on_load_fires_once_after_preparing() {
    let mut doc = HtmlDocument::parse(PAGE, None).unwrap();
    let seen = Rc::new(Cell::new(None));
    let observer = Rc::clone(&seen);
    let url = Url::parse("https://example.test/spec.css").unwrap();
    let on_load: OnLoad<HtmlDocument> = Box::new(move |sheet| {
        observer.set(Some(sheet.test_cases().len()));
    });
    let mut sheet = Stylesheet::external(url.clone(), Some(on_load));
    assert!(!sheet.loaded());
    assert_eq!(sheet.origin(), &SheetOrigin::External(url));
    assert_eq!(seen.get(), None);

    sheet
        .after_load(&mut doc, ".box.-it-a { color: red } .box.-it-b { color: blue }")
        .unwrap();
    assert!(sheet.loaded());
    assert_eq!(seen.get(), Some(2));

    seen.set(None);
    sheet.after_load(&mut doc, ".box.-it-a { color: red }").unwrap();
    assert_eq!(sheet.test_cases().len(), 1);
    assert_eq!(seen.get(), None);
}

#[test]
fn unloaded_sheets_are_skipped() {
    let mut doc = HtmlDocument::parse(PAGE, None).unwrap();
    let fixture = ElementSet::select(&doc, "#fixture").unwrap();
    let mut registry = StylesheetRegistry::new();
    registry.push(Stylesheet::external(
        Url::parse("https://example.test/late.css").unwrap(),
        None,
    ));
    registry
        .append_stylesheet(&mut doc, ".box.-it-has-no-expectations {}")
        .unwrap();

    let results = registry.exec_all(&mut doc, &fixture).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].outcome, Outcome::Pending);
}

#[test]
fn removing_a_sheet_detaches_its_styles() {
    let mut doc = HtmlDocument::parse(PAGE, None).unwrap();
    let mut registry = StylesheetRegistry::new();
    let index = registry
        .append_stylesheet(&mut doc, "#inner { color: red }")
        .unwrap();
    let span = inner(&doc).first().unwrap();
    assert_eq!(doc.computed_style(span, "color").as_deref(), Some("red"));

    let mut sheet = registry.remove(&mut doc, index).unwrap();
    assert!(registry.is_empty());
    assert_ne!(doc.computed_style(span, "color").as_deref(), Some("red"));
    sheet.remove(&mut doc);
    assert!(registry.remove(&mut doc, index).is_none());
}

#[test]
fn most_specific_function_wins() {
    let mut doc = HtmlDocument::parse(PAGE, None).unwrap();
    let mut registry = StylesheetRegistry::new();
    registry
        .append_stylesheet(
            &mut doc,
            r#"
            #outer { -fn-kind: "'outer'" }
            .box { -fn-kind: "'box'" }
            .box { -fn-tone: "'first'" }
            .box { -fn-tone: "'second'" }
            .label { -fn-size: "$el.length" }
            "#,
        )
        .unwrap();

    assert_eq!(custom(&doc, &registry, "kind").as_deref(), Some("outer"));
    assert_eq!(custom(&doc, &registry, "tone").as_deref(), Some("second"));
    assert_eq!(custom(&doc, &registry, "size").as_deref(), Some("1"));
    assert_eq!(custom(&doc, &registry, "missing"), None);

    registry
        .append_stylesheet(&mut doc, r#".box { -fn-tone: "'third'" }"#)
        .unwrap();
    assert_eq!(custom(&doc, &registry, "tone").as_deref(), Some("third"));

    registry
        .append_stylesheet(&mut doc, r#"span { -fn-kind: "'loud'" !important }"#)
        .unwrap();
    assert_eq!(custom(&doc, &registry, "kind").as_deref(), Some("loud"));
}

#[test]
fn custom_attributes_compete_with_declarations() {
    let mut doc = HtmlDocument::parse(PAGE, None).unwrap();
    let mut registry = StylesheetRegistry::new();
    registry
        .append_stylesheet(
            &mut doc,
            r#"
            .box { -fn-color: "'blue'" }
            #inner.label { color: red }
            #outer { -fn-width: "'wide'" }
            .label { width: 1px }
            .box { -fn-height: "'tall'" }
            .label { height: 2px }
            span { -fn-visibility: "'shown'" }
            "#,
        )
        .unwrap();
    assert_eq!(resolved(&doc, &registry, "color").as_deref(), Some("red"));
    assert_eq!(resolved(&doc, &registry, "width").as_deref(), Some("wide"));
    assert_eq!(resolved(&doc, &registry, "height").as_deref(), Some("tall"));
    assert_eq!(resolved(&doc, &registry, "visibility").as_deref(), Some("shown"));

    let span = inner(&doc).first().unwrap();
    doc.set_attribute(span, "style", "width: 3px");
    assert_eq!(resolved(&doc, &registry, "width").as_deref(), Some("3px"));
}

#[test]
fn custom_attributes_drive_expectations() {
    let mut doc = HtmlDocument::parse(PAGE, None).unwrap();
    let fixture = ElementSet::select(&doc, "#fixture").unwrap();
    let mut registry = StylesheetRegistry::new();
    registry
        .append_stylesheet(
            &mut doc,
            r#"
            .box { -fn-tone: "function() { return $el.attr('data-tone'); }" }
            .box .label.-it-is-warm { tone: warm }
            .box .label.-it-is-cold { tone: cold }
            "#,
        )
        .unwrap();

    let results = registry.exec_all(&mut doc, &fixture).unwrap();
    assert_eq!(results[0].outcome, Outcome::Pass);
    assert_eq!(results[1].outcome, Outcome::Fail);
    assert_eq!(results[1].messages, ["expected :tone to be cold but was warm."]);
    assert_eq!(registry.test_case_count(), 2);

    registry.clear(&mut doc);
    assert!(registry.is_empty());
}

fn case(description: &str, outcome: Outcome, messages: &[&str]) -> CaseResult {
    CaseResult {
        selector: format!(".-it-{description}"),
        description: description.to_owned(),
        outcome,
        messages: messages.iter().map(|message| (*message).to_owned()).collect(),
    }
}

#[test]
fn report_summarizes_outcomes() {
    let report = Report::new(vec![
        case("works", Outcome::Pass, &[]),
        case("breaks", Outcome::Fail, &["expected :color to be red but was blue."]),
        case("skipped", Outcome::Inapplicable, &[]),
        case("later", Outcome::Pending, &[]),
        case("works again", Outcome::Pass, &[]),
    ]);
    assert_eq!(report.counts.total, 5);
    assert_eq!(report.counts.pass, 2);
    assert!(!report.passed());
    assert_eq!(report.dots(), ".F_*.");
    assert_eq!(
        report.to_string(),
        ".F_*.\n\
         5 CASES: 2 PASS, 1 FAIL, 1 N/A, 1 PENDING\n\
         \n\
         FAILURE: breaks\n    expected :color to be red but was blue.\n"
    );

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["counts"]["fail"], 1);
    assert_eq!(json["cases"][1]["outcome"], "fail");
    assert!(Report::new(Vec::new()).passed());
}
