//! Property metadata: inheritance, initial values and shorthand expansion.

/// Minimal user-agent stylesheet with display defaults.
pub(crate) const UA_CSS: &str = r"
html, body, div, p, header, main, footer, section, article, aside, nav, ul, ol, li, dl, dt, dd,
h1, h2, h3, h4, h5, h6, form, fieldset, figure, figcaption, blockquote, pre, address, hr, table { display: block }
table { display: table }
tr { display: table-row }
td, th { display: table-cell }
li { display: list-item }
head, style, script, title, meta, link, template { display: none }
body { margin: 8px }
b, strong, th { font-weight: bold }
i, em { font-style: italic }
";

/// Properties whose value is taken from the parent when not cascaded.
const INHERITED: &[&str] = &[
    "color",
    "cursor",
    "direction",
    "font",
    "font-family",
    "font-size",
    "font-style",
    "font-variant",
    "font-weight",
    "letter-spacing",
    "line-height",
    "list-style",
    "list-style-position",
    "list-style-type",
    "quotes",
    "text-align",
    "text-indent",
    "text-transform",
    "visibility",
    "white-space",
    "word-spacing",
];

pub(crate) fn is_inherited(property: &str) -> bool {
    INHERITED.contains(&property) || property.starts_with("--")
}

/// Initial value of a property, or `None` when the engine has no default for it.
pub(crate) fn initial_value(property: &str) -> Option<&'static str> {
    Some(match property {
        "display" => "inline",
        "position" => "static",
        "float" | "clear" | "text-transform" | "list-style-image" => "none",
        "visibility" => "visible",
        "overflow" | "overflow-x" | "overflow-y" => "visible",
        "content" => "normal",
        "color" => "canvastext",
        "background-color" => "transparent",
        "opacity" => "1",
        "font-size" => "16px",
        "font-style" | "font-variant" | "font-weight" | "line-height" | "letter-spacing"
        | "word-spacing" | "white-space" => "normal",
        "text-align" => "start",
        "text-indent" => "0",
        "direction" => "ltr",
        "cursor" | "z-index" | "width" | "height" | "top" | "right" | "bottom" | "left" => "auto",
        "min-width" | "min-height" => "0",
        "max-width" | "max-height" => "none",
        "margin-top" | "margin-right" | "margin-bottom" | "margin-left" | "padding-top"
        | "padding-right" | "padding-bottom" | "padding-left" => "0",
        "box-sizing" => "content-box",
        "list-style-type" => "disc",
        "list-style-position" => "outside",
        _ => return None,
    })
}

/// Expand `margin`/`padding` shorthands into their longhands; other properties pass through.
pub(crate) fn expand_shorthand(name: &str, value: &str) -> Vec<(String, String)> {
    if name != "margin" && name != "padding" {
        return vec![(name.to_owned(), value.to_owned())];
    }
    let parts: Vec<&str> = value.split_whitespace().collect();
    let (top, right, bottom, left) = match parts.as_slice() {
        [all] => (*all, *all, *all, *all),
        [vertical, horizontal] => (*vertical, *horizontal, *vertical, *horizontal),
        [top, horizontal, bottom] => (*top, *horizontal, *bottom, *horizontal),
        [top, right, bottom, left] => (*top, *right, *bottom, *left),
        _ => return vec![(name.to_owned(), value.to_owned())],
    };
    let mut out = vec![(name.to_owned(), value.to_owned())];
    for (side, side_value) in [("top", top), ("right", right), ("bottom", bottom), ("left", left)] {
        out.push((format!("{name}-{side}"), side_value.to_owned()));
    }
    out
}
