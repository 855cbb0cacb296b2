use css_syntax::{parse_declaration_list, parse_stylesheet, split_selector_list};

#[test]
fn rules_keep_source_order_and_raw_values() {
    let sheet = parse_stylesheet(
        ".not-it { y: 10 }\n.-it-is-a-clause { color: red }\n.-it-is-another { color: blue !important }",
    );
    let preludes: Vec<&str> = sheet.rules.iter().map(|rule| rule.prelude.as_str()).collect();
    assert_eq!(preludes, vec![".not-it", ".-it-is-a-clause", ".-it-is-another"]);

    let last = &sheet.rules[2].declarations[0];
    assert_eq!(last.name, "color");
    assert_eq!(last.value, "blue");
    assert!(last.important);
}

#[test]
fn quoted_values_keep_their_quotes() {
    let sheet = parse_stylesheet(".some-class { -fn-custom-attr: \"return 321;\"; content: 'A B' }");
    let decls = &sheet.rules[0].declarations;
    assert_eq!(decls[0].name, "-fn-custom-attr");
    assert_eq!(decls[0].value, "\"return 321;\"");
    assert_eq!(decls[1].name, "content");
    assert_eq!(decls[1].value, "'A B'");
}

#[test]
fn at_rules_are_skipped() {
    let sheet = parse_stylesheet("@media screen { .a { x: 1 } } .b { x: 2 }");
    assert_eq!(sheet.rules.len(), 1);
    assert_eq!(sheet.rules[0].prelude, ".b");
}

#[test]
fn selector_lists_split_outside_parentheses() {
    assert_eq!(
        split_selector_list("#this.-it-a, #that.-it-b"),
        vec!["#this.-it-a".to_owned(), "#that.-it-b".to_owned()]
    );
    assert_eq!(
        split_selector_list(".a:not(.b, .c),.d"),
        vec![".a:not(.b, .c)".to_owned(), ".d".to_owned()]
    );
    assert!(split_selector_list("  ").is_empty());
}

#[test]
fn rule_exposes_its_selector_alternatives() {
    let sheet = parse_stylesheet(".-it-can, .-it-does { color: red }");
    assert_eq!(sheet.rules[0].selectors(), vec![".-it-can", ".-it-does"]);
}

#[test]
fn declaration_lists_parse_like_style_attributes() {
    let decls = parse_declaration_list("position: fixed; margin-top : 10px; font-size: 20px !important");
    let names: Vec<&str> = decls.iter().map(|decl| decl.name.as_str()).collect();
    assert_eq!(names, vec!["position", "margin-top", "font-size"]);
    assert_eq!(decls[1].value, "10px");
    assert!(decls[2].important);
    assert_eq!(decls[2].value, "20px");
}
