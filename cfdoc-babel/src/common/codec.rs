//! Comment side channel.
//!
//! Structure that has no native HTML form (layout grids, decision lists, smart links,
//! inline status lozenges) travels through the pipeline as HTML comments. The comment body
//! is a `cf:` prefixed record whose fields are separated by `;` (and decision items by
//! `|`). Free-text fields are percent-encoded so that separators and comment terminators
//! can never leak out of a field.
//!
//!     cf:decision:<localId;state;content>|<localId;state;content>
//!     cf:layout-start / cf:layout-end
//!     cf:section:<index>;<type>;<breakoutMode>;<breakoutWidth>;<cellCount>
//!     cf:section-end:<index>
//!     cf:cell:<sectionIndex>;<cellIndex>
//!     cf:smartlink:<href>;<appearance>;<datasource>
//!     cf:status:<title>;<color>
//!     cf:toc:<minLevel>;<maxLevel>
//!     cf:link:<text>
//!
//! Decoding never fails loudly: text that is not a well formed record yields `None`.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

const FIELD: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'%')
    .add(b';')
    .add(b'|')
    .add(b'<')
    .add(b'>')
    .add(b'-');

const PREFIX: &str = "cf:";

/// One entry of a decision list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionItem {
    pub local_id: String,
    pub state: String,
    pub content: String,
}

/// Metadata of one layout section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionMarker {
    pub index: usize,
    pub layout_type: String,
    pub breakout_mode: String,
    pub breakout_width: String,
    pub cell_count: usize,
}

/// A decoded side-channel record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    Decision(Vec<DecisionItem>),
    LayoutStart,
    LayoutEnd,
    Section(SectionMarker),
    SectionEnd(usize),
    Cell {
        section: usize,
        cell: usize,
    },
    SmartLink {
        href: String,
        appearance: String,
        datasource: String,
    },
    Status {
        title: String,
        color: String,
    },
    Toc {
        min_level: Option<u8>,
        max_level: Option<u8>,
    },
    Link(String),
}

impl Marker {
    /// The comment body, without `<!--` and `-->`.
    pub fn encode(&self) -> String {
        match self {
            Marker::Decision(items) => {
                let items: Vec<String> = items
                    .iter()
                    .map(|item| {
                        join_fields(&[
                            escape(&item.local_id),
                            escape(&item.state),
                            escape(&item.content),
                        ])
                    })
                    .collect();
                format!("{PREFIX}decision:{}", items.join("|"))
            }
            Marker::LayoutStart => format!("{PREFIX}layout-start"),
            Marker::LayoutEnd => format!("{PREFIX}layout-end"),
            Marker::Section(section) => format!(
                "{PREFIX}section:{}",
                join_fields(&[
                    section.index.to_string(),
                    escape(&section.layout_type),
                    escape(&section.breakout_mode),
                    escape(&section.breakout_width),
                    section.cell_count.to_string(),
                ])
            ),
            Marker::SectionEnd(index) => format!("{PREFIX}section-end:{index}"),
            Marker::Cell { section, cell } => format!("{PREFIX}cell:{section};{cell}"),
            Marker::SmartLink {
                href,
                appearance,
                datasource,
            } => format!(
                "{PREFIX}smartlink:{}",
                join_fields(&[escape(href), escape(appearance), escape(datasource)])
            ),
            Marker::Status { title, color } => format!(
                "{PREFIX}status:{}",
                join_fields(&[escape(title), escape(color)])
            ),
            Marker::Toc {
                min_level,
                max_level,
            } => format!(
                "{PREFIX}toc:{};{}",
                level_field(*min_level),
                level_field(*max_level)
            ),
            Marker::Link(text) => format!("{PREFIX}link:{}", escape(text)),
        }
    }

    /// Parses a comment body. Surrounding whitespace is ignored; encoded fields never carry
    /// raw spaces.
    pub fn decode(text: &str) -> Option<Marker> {
        let body = text.trim().strip_prefix(PREFIX)?;
        match body {
            "layout-start" => return Some(Marker::LayoutStart),
            "layout-end" => return Some(Marker::LayoutEnd),
            _ => {}
        }
        let (kind, payload) = body.split_once(':')?;
        match kind {
            "decision" => decode_decision(payload),
            "section" => {
                let [index, layout_type, mode, width, count] = fields::<5>(payload)?;
                Some(Marker::Section(SectionMarker {
                    index: index.parse().ok()?,
                    layout_type: unescape(layout_type)?,
                    breakout_mode: unescape(mode)?,
                    breakout_width: unescape(width)?,
                    cell_count: count.parse().ok()?,
                }))
            }
            "section-end" => Some(Marker::SectionEnd(payload.parse().ok()?)),
            "cell" => {
                let [section, cell] = fields::<2>(payload)?;
                Some(Marker::Cell {
                    section: section.parse().ok()?,
                    cell: cell.parse().ok()?,
                })
            }
            "smartlink" => {
                let [href, appearance, datasource] = fields::<3>(payload)?;
                Some(Marker::SmartLink {
                    href: unescape(href)?,
                    appearance: unescape(appearance)?,
                    datasource: unescape(datasource)?,
                })
            }
            "status" => {
                let [title, color] = fields::<2>(payload)?;
                Some(Marker::Status {
                    title: unescape(title)?,
                    color: unescape(color)?,
                })
            }
            "toc" => {
                let [min, max] = fields::<2>(payload)?;
                Some(Marker::Toc {
                    min_level: parse_level(min)?,
                    max_level: parse_level(max)?,
                })
            }
            "link" => Some(Marker::Link(unescape(payload)?)),
            _ => None,
        }
    }

    /// The full comment form, `<!--body-->`.
    pub fn to_comment(&self) -> String {
        format!("<!--{}-->", self.encode())
    }

    /// Decodes a full comment. Accepts the bare body as well.
    pub fn from_comment(comment: &str) -> Option<Marker> {
        let trimmed = comment.trim();
        let body = trimmed
            .strip_prefix("<!--")
            .and_then(|rest| rest.strip_suffix("-->"))
            .unwrap_or(trimmed);
        Marker::decode(body)
    }

    pub fn is_layout_boundary(&self) -> bool {
        matches!(
            self,
            Marker::LayoutStart
                | Marker::LayoutEnd
                | Marker::Section(_)
                | Marker::SectionEnd(_)
                | Marker::Cell { .. }
        )
    }
}

/// Percent-encodes a free-text field.
pub fn escape(field: &str) -> String {
    utf8_percent_encode(field, FIELD).to_string()
}

/// Reverses [`escape`]. Returns `None` when the decoded bytes are not UTF-8.
pub fn unescape(field: &str) -> Option<String> {
    percent_decode_str(field)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

fn join_fields(fields: &[String]) -> String {
    fields.join(";")
}

fn fields<const N: usize>(payload: &str) -> Option<[&str; N]> {
    let parts: Vec<&str> = payload.split(';').collect();
    parts.try_into().ok()
}

fn decode_decision(payload: &str) -> Option<Marker> {
    if payload.is_empty() {
        return Some(Marker::Decision(Vec::new()));
    }
    payload
        .split('|')
        .map(|item| {
            let [local_id, state, content] = fields::<3>(item)?;
            Some(DecisionItem {
                local_id: unescape(local_id)?,
                state: unescape(state)?,
                content: unescape(content)?,
            })
        })
        .collect::<Option<Vec<_>>>()
        .map(Marker::Decision)
}

fn level_field(level: Option<u8>) -> String {
    level.map(|l| l.to_string()).unwrap_or_default()
}

/// Empty means unset; anything else must be a number.
fn parse_level(field: &str) -> Option<Option<u8>> {
    if field.is_empty() {
        Some(None)
    } else {
        field.parse().ok().map(Some)
    }
}
