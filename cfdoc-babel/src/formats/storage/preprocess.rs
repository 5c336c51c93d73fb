//! Storage preprocessing (raw storage XHTML → constrained `data-*` dialect)
//!
//! The wiki's storage format is XHTML with `ac:` (macro) and `ri:` (resource identifier)
//! elements and CDATA sections. An HTML5 parser does not understand any of those: CDATA
//! turns into bogus comments and self-closing custom tags swallow their siblings. The
//! preprocessor therefore works in three passes:
//!
//!     1. textual: CDATA → escaped text, `<x .../>` → `<x ...></x>` for non-void tags
//!     2. tree: parse with html5ever and rewrite wiki elements into plain HTML carrying
//!        `data-*` attributes (and comment markers for structure HTML cannot express)
//!     3. serialize the rewritten tree back to a string
//!
//! Macro mapping:
//!
//! | Storage element                       | Dialect                                          |
//! |---------------------------------------|--------------------------------------------------|
//! | code macro, language only             | `pre[data-language] > code`                      |
//! | code macro with more parameters       | `pre[data-macro=code]` + `data-title`, ...       |
//! | info/note/warning/tip/success/error   | `div[data-macro=<type>][data-title]`             |
//! | expand                                | `details[data-macro=expand][data-title]`         |
//! | toc                                   | `nav[data-macro=toc][data-min][data-max]`        |
//! | status                                | `span[data-macro=status][data-color]`            |
//! | any other macro                       | `div[data-unsupported-macro]` around the original|
//! | `ac:image`                            | `img[data-attachment]` or `img[src]`             |
//! | `ac:task-list` / `ac:task`            | `ul[data-macro=task-list]` / `li[data-task-*]`   |
//! | `ac:emoticon`                         | `span[data-emoji][data-emoji-id]`                |
//! | `ac:link > ri:user`                   | `a[data-user-mention]`                           |
//! | `ac:link > ri:page`                   | `a[data-confluence-link]`                        |
//! | decision list extension               | `div[data-cf-marker=decision]` + comment         |
//! | `ac:layout`                           | root level `cf:layout-*` marker comments         |
//!
//! Macros found inside phrasing content (paragraphs, headings, formatting) use `span`
//! wrappers instead of block elements, since a block element would close the paragraph
//! when the result is parsed again.

use super::html_tree::{
    append_all, attr, child_element, children, create_comment, create_element, create_text,
    element_children, is_tag, non_empty_attr, parse_html, serialize_handles, tag_name,
    text_content, top_level_nodes,
};
use crate::common::codec::{DecisionItem, Marker, SectionMarker};
use crate::common::escape::html_escape;
use crate::error::ParseError;
use markup5ever_rcdom::Handle;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Default upper bound for raw input, 5 MiB.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 5 * 1024 * 1024;

/// Default element depth below which markup is rewritten.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 64;

/// Panel macro names with a structured form.
pub const PANEL_MACROS: [&str; 6] = ["info", "note", "warning", "tip", "success", "error"];

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// A self-closing tag. Quoted attribute values may hold `>` and `/`.
static SELF_CLOSING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"<([A-Za-z][A-Za-z0-9:._-]*)((?:\s+[^\s"'<>/=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'<>/=]+))?)*)\s*/>"#,
    )
    .expect("SELF_CLOSING: invalid regex pattern")
});

/// Turns raw storage markup into the dialect the storage parser reads.
pub trait Preprocessor {
    fn preprocess(&self, raw: &str) -> Result<String, ParseError>;
}

/// The full storage rewrite.
///
/// Elements nested deeper than `max_nesting_depth` are carried through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoragePreprocessor {
    pub max_input_bytes: usize,
    pub max_nesting_depth: usize,
}

impl StoragePreprocessor {
    pub fn new(max_input_bytes: usize) -> Self {
        Self {
            max_input_bytes,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }

    pub fn with_max_nesting_depth(mut self, max_nesting_depth: usize) -> Self {
        self.max_nesting_depth = max_nesting_depth;
        self
    }
}

impl Default for StoragePreprocessor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_INPUT_BYTES)
    }
}

impl Preprocessor for StoragePreprocessor {
    fn preprocess(&self, raw: &str) -> Result<String, ParseError> {
        check_size(raw, self.max_input_bytes)?;
        let text = replace_cdata(raw)?;
        let text = expand_self_closing(&text);

        let dom = parse_html(&text);
        let rewritten: Vec<Handle> = top_level_nodes(&dom)
            .iter()
            .flat_map(|node| rewrite(node, Scope::root(self.max_nesting_depth)))
            .collect();
        Ok(serialize_handles(&rewritten))
    }
}

/// Only enforces the size limit. For input that is already in the dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassthroughPreprocessor {
    pub max_input_bytes: usize,
}

impl Default for PassthroughPreprocessor {
    fn default() -> Self {
        Self {
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }
}

impl Preprocessor for PassthroughPreprocessor {
    fn preprocess(&self, raw: &str) -> Result<String, ParseError> {
        check_size(raw, self.max_input_bytes)?;
        Ok(raw.to_string())
    }
}

fn check_size(raw: &str, max_input_bytes: usize) -> Result<(), ParseError> {
    if raw.len() > max_input_bytes {
        log::warn!(
            "rejecting storage input of {} bytes (limit {max_input_bytes})",
            raw.len()
        );
        return Err(ParseError::preprocess(
            format!(
                "input is {} bytes, exceeding the {max_input_bytes} byte limit",
                raw.len()
            ),
            raw,
        ));
    }
    Ok(())
}

/// Replaces every CDATA section with its HTML-escaped content.
fn replace_cdata(raw: &str) -> Result<String, ParseError> {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find(CDATA_OPEN) {
        out.push_str(&rest[..start]);
        let body_start = start + CDATA_OPEN.len();
        let Some(len) = rest[body_start..].find(CDATA_CLOSE) else {
            return Err(ParseError::preprocess("unterminated CDATA section", raw));
        };
        out.push_str(&html_escape(&rest[body_start..body_start + len]));
        rest = &rest[body_start + len + CDATA_CLOSE.len()..];
    }
    out.push_str(rest);
    Ok(out)
}

/// `<ri:page ri:content-title="x"/>` → `<ri:page ri:content-title="x"></ri:page>`.
fn expand_self_closing(text: &str) -> String {
    SELF_CLOSING
        .replace_all(text, |caps: &Captures| {
            let tag = &caps[1];
            if VOID_ELEMENTS.contains(&tag.to_ascii_lowercase().as_str()) {
                caps[0].to_string()
            } else {
                format!("<{tag}{}></{tag}>", &caps[2])
            }
        })
        .into_owned()
}

/// Tags whose content is phrasing only.
fn is_phrasing_container(tag: &str) -> bool {
    matches!(
        tag,
        "p" | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "span"
            | "strong"
            | "b"
            | "em"
            | "i"
            | "u"
            | "s"
            | "del"
            | "strike"
            | "sub"
            | "sup"
            | "code"
            | "a"
    )
}

/// Where a node sits in the tree being rewritten.
#[derive(Debug, Clone, Copy)]
struct Scope {
    /// Inside phrasing content.
    inline: bool,
    depth: usize,
    max_depth: usize,
}

impl Scope {
    fn root(max_depth: usize) -> Self {
        Self {
            inline: false,
            depth: 0,
            max_depth,
        }
    }

    fn child(self, inline: bool) -> Self {
        Self {
            inline,
            depth: self.depth + 1,
            ..self
        }
    }
}

fn rewrite_children(node: &Handle, scope: Scope) -> Vec<Handle> {
    children(node)
        .iter()
        .flat_map(|child| rewrite(child, scope))
        .collect()
}

fn rewrite(node: &Handle, scope: Scope) -> Vec<Handle> {
    let Some(tag) = tag_name(node) else {
        return vec![node.clone()];
    };
    if scope.depth > scope.max_depth {
        log::debug!("nesting depth {} exceeded at <{tag}>, not rewriting below", scope.depth);
        return vec![node.clone()];
    }
    let inline = scope.inline;
    let tag = tag.to_string();
    match tag.as_str() {
        "ac:structured-macro" | "ac:macro" => vec![rewrite_macro(node, scope)],
        "ac:image" => vec![rewrite_image(node, inline)],
        "ac:task-list" if !inline => vec![rewrite_task_list(node, scope)],
        "ac:emoticon" => vec![rewrite_emoticon(node)],
        "ac:link" => vec![rewrite_link(node, inline)],
        "ac:adf-extension" if !inline => vec![rewrite_adf_extension(node)],
        "ac:layout" if !inline => rewrite_layout(node, scope),
        "ac:inline-comment-marker" | "ac:placeholder" => {
            rewrite_children(node, scope.child(inline))
        }
        other if other.starts_with("ac:") || other.starts_with("ri:") => {
            vec![unsupported(node, other.trim_start_matches("ac:"), inline)]
        }
        other => {
            let attrs = super::html_tree::attributes(node);
            let element = create_element(
                other,
                attrs
                    .iter()
                    .map(|(name, value)| (name.as_str(), value.clone()))
                    .collect(),
            );
            let child_inline = inline || is_phrasing_container(other);
            append_all(&element, rewrite_children(node, scope.child(child_inline)));
            vec![element]
        }
    }
}

/// Wraps the untouched original in a `data-unsupported-macro` container.
fn unsupported(node: &Handle, name: &str, inline: bool) -> Handle {
    log::debug!("keeping unsupported storage element {name} verbatim");
    let wrapper = create_element(
        if inline { "span" } else { "div" },
        vec![("data-unsupported-macro", name.to_string())],
    );
    append_all(&wrapper, [node.clone()]);
    wrapper
}

struct MacroParts {
    name: String,
    params: Vec<(String, String)>,
    rich_body: Option<Handle>,
    plain_body: Option<String>,
}

impl MacroParts {
    fn read(node: &Handle) -> Self {
        let mut params = Vec::new();
        let mut rich_body = None;
        let mut plain_body = None;
        for child in element_children(node) {
            match tag_name(&child) {
                Some("ac:parameter") => params.push((
                    attr(&child, "ac:name").unwrap_or_default(),
                    text_content(&child),
                )),
                Some("ac:rich-text-body") => rich_body = Some(child.clone()),
                Some("ac:plain-text-body") => plain_body = Some(text_content(&child)),
                _ => {}
            }
        }
        Self {
            name: attr(node, "ac:name")
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase(),
            params,
            rich_body,
            plain_body,
        }
    }

    fn param(&self, name: &str) -> Option<String> {
        self.params
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// Whether every parameter is one the structured form can carry.
    fn only_params(&self, known: &[&str]) -> bool {
        self.params
            .iter()
            .all(|(key, _)| known.iter().any(|k| k.eq_ignore_ascii_case(key)))
    }
}

fn rewrite_macro(node: &Handle, scope: Scope) -> Handle {
    let parts = MacroParts::read(node);
    let name = parts.name.as_str();

    if scope.inline {
        return match name {
            "status" if parts.only_params(&["title", "colour", "color"]) => status_span(&parts),
            "toc" if parts.only_params(&["minLevel", "maxLevel"]) => {
                toc_element("span", &parts)
            }
            _ => unsupported(node, name, true),
        };
    }

    match name {
        "code" if parts.only_params(&["language"]) && parts.rich_body.is_none() => {
            let mut attrs = Vec::new();
            if let Some(language) = parts.param("language") {
                attrs.push(("data-language", language));
            }
            code_element(attrs, parts.plain_body.as_deref().unwrap_or_default())
        }
        "code"
            if parts.only_params(&["language", "title", "linenumbers", "collapse", "firstline"])
                && parts.rich_body.is_none() =>
        {
            let mut attrs = vec![("data-macro", "code".to_string())];
            for (param, data) in [
                ("language", "data-language"),
                ("title", "data-title"),
                ("linenumbers", "data-linenumbers"),
                ("collapse", "data-collapse"),
                ("firstline", "data-firstline"),
            ] {
                if let Some(value) = parts.param(param) {
                    attrs.push((data, value));
                }
            }
            code_element(attrs, parts.plain_body.as_deref().unwrap_or_default())
        }
        panel if PANEL_MACROS.contains(&panel) && parts.only_params(&["title"]) => {
            container_macro("div", panel, &parts, scope)
        }
        "expand" if parts.only_params(&["title"]) => {
            container_macro("details", "expand", &parts, scope)
        }
        "toc" if parts.only_params(&["minLevel", "maxLevel"]) => toc_element("nav", &parts),
        "status" if parts.only_params(&["title", "colour", "color"]) => status_span(&parts),
        _ => unsupported(node, name, false),
    }
}

fn code_element(attrs: Vec<(&str, String)>, code: &str) -> Handle {
    let pre = create_element("pre", attrs);
    let code_el = create_element("code", vec![]);
    append_all(&code_el, [create_text(code)]);
    append_all(&pre, [code_el]);
    pre
}

fn container_macro(tag: &str, macro_name: &str, parts: &MacroParts, scope: Scope) -> Handle {
    let mut attrs = vec![("data-macro", macro_name.to_string())];
    if let Some(title) = parts.param("title") {
        attrs.push(("data-title", title));
    }
    let element = create_element(tag, attrs);
    if let Some(body) = &parts.rich_body {
        append_all(&element, rewrite_children(body, scope.child(false)));
    }
    element
}

fn toc_element(tag: &str, parts: &MacroParts) -> Handle {
    let mut attrs = vec![("data-macro", "toc".to_string())];
    if let Some(min) = parts.param("minLevel") {
        attrs.push(("data-min", min));
    }
    if let Some(max) = parts.param("maxLevel") {
        attrs.push(("data-max", max));
    }
    create_element(tag, attrs)
}

fn status_span(parts: &MacroParts) -> Handle {
    let color = parts
        .param("colour")
        .or_else(|| parts.param("color"))
        .unwrap_or_else(|| "Grey".to_string());
    let span = create_element(
        "span",
        vec![("data-macro", "status".to_string()), ("data-color", color)],
    );
    append_all(
        &span,
        [create_text(&parts.param("title").unwrap_or_default())],
    );
    span
}

fn rewrite_image(node: &Handle, inline: bool) -> Handle {
    let mut attrs: Vec<(&str, String)> = Vec::new();
    let resources = element_children(node);
    match resources.as_slice() {
        [resource] if is_tag(resource, "ri:attachment") && element_children(resource).is_empty() => {
            let Some(filename) = non_empty_attr(resource, "ri:filename") else {
                return unsupported(node, "image", inline);
            };
            attrs.push(("data-attachment", filename));
            if let Some(version) = non_empty_attr(resource, "ri:version-at-save") {
                attrs.push(("data-version", version));
            }
        }
        [resource] if is_tag(resource, "ri:url") => {
            let Some(src) = non_empty_attr(resource, "ri:value") else {
                return unsupported(node, "image", inline);
            };
            attrs.push(("src", src));
        }
        _ => return unsupported(node, "image", inline),
    }
    for (storage, data) in [
        ("ac:alt", "alt"),
        ("ac:title", "title"),
        ("ac:align", "data-align"),
        ("ac:width", "data-width"),
    ] {
        if let Some(value) = non_empty_attr(node, storage) {
            attrs.push((data, value));
        }
    }
    create_element("img", attrs)
}

fn rewrite_task_list(node: &Handle, scope: Scope) -> Handle {
    let list = create_element("ul", vec![("data-macro", "task-list".to_string())]);
    let items = element_children(node)
        .iter()
        .filter(|child| is_tag(child, "ac:task"))
        .map(|task| {
            let field = |tag: &str| {
                child_element(task, tag)
                    .map(|el| text_content(&el).trim().to_string())
                    .unwrap_or_default()
            };
            let mut attrs = vec![
                ("data-task-id", field("ac:task-id")),
                ("data-task-status", field("ac:task-status")),
            ];
            let uuid = field("ac:task-uuid");
            if !uuid.is_empty() {
                attrs.push(("data-task-uuid", uuid));
            }
            let item = create_element("li", attrs);
            if let Some(body) = child_element(task, "ac:task-body") {
                append_all(&item, rewrite_children(&body, scope.child(true)));
            }
            item
        })
        .collect::<Vec<_>>();
    append_all(&list, items);
    list
}

fn rewrite_emoticon(node: &Handle) -> Handle {
    let name = non_empty_attr(node, "ac:name").unwrap_or_default();
    let shortname = non_empty_attr(node, "ac:emoji-shortname").unwrap_or_else(|| format!(":{name}:"));
    let fallback = non_empty_attr(node, "ac:emoji-fallback").unwrap_or_default();
    let span = create_element(
        "span",
        vec![
            ("data-emoji", shortname),
            (
                "data-emoji-id",
                non_empty_attr(node, "ac:emoji-id").unwrap_or_default(),
            ),
        ],
    );
    append_all(&span, [create_text(&fallback)]);
    span
}

fn rewrite_link(node: &Handle, inline: bool) -> Handle {
    let elements = element_children(node);
    let resource = elements
        .iter()
        .find(|child| tag_name(child).is_some_and(|tag| tag.starts_with("ri:")));
    let body_text = elements
        .iter()
        .find(|child| {
            is_tag(child, "ac:link-body") || is_tag(child, "ac:plain-text-link-body")
        })
        .map(|body| text_content(body));

    match resource {
        Some(user) if is_tag(user, "ri:user") && body_text.is_none() => {
            match non_empty_attr(user, "ri:account-id").or_else(|| non_empty_attr(user, "ri:userkey")) {
                Some(account_id) => create_element("a", vec![("data-user-mention", account_id)]),
                None => unsupported(node, "link", inline),
            }
        }
        Some(page) if is_tag(page, "ri:page") && !has_anchor(node) => {
            let title = non_empty_attr(page, "ri:content-title").unwrap_or_default();
            let text = body_text
                .filter(|text| !text.trim().is_empty())
                .unwrap_or_else(|| title.clone());
            let link = create_element("a", vec![("data-confluence-link", title)]);
            append_all(&link, [create_text(&text)]);
            link
        }
        _ => unsupported(node, "link", inline),
    }
}

fn has_anchor(node: &Handle) -> bool {
    non_empty_attr(node, "ac:anchor").is_some()
}

fn rewrite_adf_extension(node: &Handle) -> Handle {
    match decision_items(node) {
        Some(items) => {
            let wrapper = create_element("div", vec![("data-cf-marker", "decision".to_string())]);
            append_all(&wrapper, [create_comment(&Marker::Decision(items).encode())]);
            wrapper
        }
        None => unsupported(node, "adf-extension", false),
    }
}

fn adf_attribute(node: &Handle, key: &str) -> String {
    element_children(node)
        .iter()
        .find(|child| {
            is_tag(child, "ac:adf-attribute") && attr(child, "key").as_deref() == Some(key)
        })
        .map(|child| text_content(child).trim().to_string())
        .unwrap_or_default()
}

fn decision_items(node: &Handle) -> Option<Vec<DecisionItem>> {
    let list = child_element(node, "ac:adf-node")
        .filter(|list| attr(list, "type").as_deref() == Some("decision-list"))?;
    let items = element_children(&list)
        .iter()
        .filter(|child| {
            is_tag(child, "ac:adf-node") && attr(child, "type").as_deref() == Some("decision-item")
        })
        .map(|item| DecisionItem {
            local_id: adf_attribute(item, "local-id"),
            state: adf_attribute(item, "state"),
            content: child_element(item, "ac:adf-content")
                .map(|content| text_content(&content).trim().to_string())
                .unwrap_or_default(),
        })
        .collect();
    Some(items)
}

/// Flattens a layout into marker comments with the cell contents between them.
fn rewrite_layout(node: &Handle, scope: Scope) -> Vec<Handle> {
    let mut out = vec![create_comment(&Marker::LayoutStart.encode())];
    let sections: Vec<Handle> = element_children(node)
        .into_iter()
        .filter(|child| is_tag(child, "ac:layout-section"))
        .collect();
    for (index, section) in sections.iter().enumerate() {
        let cells: Vec<Handle> = element_children(section)
            .into_iter()
            .filter(|child| is_tag(child, "ac:layout-cell"))
            .collect();
        let marker = Marker::Section(SectionMarker {
            index,
            layout_type: attr(section, "ac:type").unwrap_or_default(),
            breakout_mode: attr(section, "ac:breakout-mode").unwrap_or_default(),
            breakout_width: attr(section, "ac:breakout-width").unwrap_or_default(),
            cell_count: cells.len(),
        });
        out.push(create_comment(&marker.encode()));
        for (cell_index, cell) in cells.iter().enumerate() {
            let marker = Marker::Cell {
                section: index,
                cell: cell_index,
            };
            out.push(create_comment(&marker.encode()));
            out.extend(rewrite_children(cell, scope.child(false)));
        }
        out.push(create_comment(&Marker::SectionEnd(index).encode()));
    }
    out.push(create_comment(&Marker::LayoutEnd.encode()));
    out
}
