//! Layout reconstruction.
//!
//! The preprocessor flattens `ac:layout` grids into root-level marker comments with the
//! cell contents between them:
//!
//!     cf:layout-start
//!     cf:section:0;two_equal;default;;2
//!     cf:cell:0;0   ...cell 0 blocks...
//!     cf:cell:0;1   ...cell 1 blocks...
//!     cf:section-end:0
//!     cf:layout-end
//!
//! After the blocks of a document have been serialized, [`assemble`] scans the fragment
//! list once and rebuilds each bracketed region as a real layout.

use crate::common::codec::{Marker, SectionMarker};
use crate::common::escape::html_escape;

/// One serialized top-level node.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Fragment {
    /// A layout marker comment, kept with its original text.
    Marker { marker: Marker, raw: String },
    Markup(String),
}

impl Fragment {
    fn raw(&self) -> &str {
        match self {
            Fragment::Marker { raw, .. } | Fragment::Markup(raw) => raw,
        }
    }

    fn marker(&self) -> Option<&Marker> {
        match self {
            Fragment::Marker { marker, .. } => Some(marker),
            Fragment::Markup(_) => None,
        }
    }

    fn is_boundary(&self) -> bool {
        self.marker().is_some_and(Marker::is_layout_boundary)
    }
}

/// Concatenates the fragments, replacing every complete layout region by its
/// `ac:layout` markup. A start marker with no end marker is left as is.
pub(crate) fn assemble(fragments: &[Fragment]) -> String {
    let mut out = String::new();
    let mut index = 0;
    while index < fragments.len() {
        if fragments[index].marker() == Some(&Marker::LayoutStart) {
            let end = fragments[index + 1..]
                .iter()
                .position(|fragment| fragment.marker() == Some(&Marker::LayoutEnd))
                .map(|offset| index + 1 + offset);
            match end {
                Some(end) => {
                    out.push_str(&build_layout(&fragments[index + 1..end]));
                    index = end + 1;
                    continue;
                }
                None => {
                    log::warn!("layout start marker has no matching end marker; leaving it untouched");
                    for fragment in &fragments[index..] {
                        out.push_str(fragment.raw());
                    }
                    break;
                }
            }
        }
        out.push_str(fragments[index].raw());
        index += 1;
    }
    out
}

fn build_layout(region: &[Fragment]) -> String {
    let mut out = String::from("<ac:layout>");
    let sections = region
        .iter()
        .enumerate()
        .filter_map(|(position, fragment)| match fragment.marker() {
            Some(Marker::Section(section)) => Some((position, section)),
            _ => None,
        });
    for (position, section) in sections {
        out.push_str(&section_open(section));
        for cell in 0..cells_to_emit(region, section) {
            out.push_str("<ac:layout-cell>");
            let start = region[position + 1..]
                .iter()
                .position(|fragment| {
                    fragment.marker()
                        == Some(&Marker::Cell {
                            section: section.index,
                            cell,
                        })
                })
                .map(|offset| position + 1 + offset);
            if let Some(start) = start {
                for fragment in region[start + 1..]
                    .iter()
                    .take_while(|fragment| !fragment.is_boundary())
                {
                    out.push_str(fragment.raw());
                }
            }
            out.push_str("</ac:layout-cell>");
        }
        out.push_str("</ac:layout-section>");
    }
    out.push_str("</ac:layout>");
    out
}

/// The declared cell count, capped by the cell markers actually present. A section
/// always keeps at least one cell.
fn cells_to_emit(region: &[Fragment], section: &SectionMarker) -> usize {
    let present = region
        .iter()
        .filter_map(|fragment| match fragment.marker() {
            Some(Marker::Cell { section: index, cell }) if *index == section.index => {
                Some(cell + 1)
            }
            _ => None,
        })
        .max()
        .unwrap_or(0);
    section.cell_count.min(present.max(1))
}

fn section_open(section: &SectionMarker) -> String {
    let mut tag = format!(
        r#"<ac:layout-section ac:type="{}""#,
        html_escape(&section.layout_type)
    );
    if !section.breakout_mode.is_empty() {
        tag.push_str(&format!(
            r#" ac:breakout-mode="{}""#,
            html_escape(&section.breakout_mode)
        ));
    }
    if !section.breakout_width.is_empty() {
        tag.push_str(&format!(
            r#" ac:breakout-width="{}""#,
            html_escape(&section.breakout_width)
        ));
    }
    tag.push('>');
    tag
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(marker: Marker) -> Fragment {
        Fragment::Marker {
            raw: marker.to_comment(),
            marker,
        }
    }

    fn markup(html: &str) -> Fragment {
        Fragment::Markup(html.to_string())
    }

    fn two_cell_region() -> Vec<Fragment> {
        vec![
            marker(Marker::LayoutStart),
            marker(Marker::Section(SectionMarker {
                index: 0,
                layout_type: "two_equal".to_string(),
                breakout_mode: "default".to_string(),
                breakout_width: String::new(),
                cell_count: 2,
            })),
            marker(Marker::Cell {
                section: 0,
                cell: 0,
            }),
            markup("<p>A</p>"),
            marker(Marker::Cell {
                section: 0,
                cell: 1,
            }),
            markup("<p>B</p>"),
            marker(Marker::SectionEnd(0)),
            marker(Marker::LayoutEnd),
        ]
    }

    #[test]
    fn rebuilds_two_cells() {
        insta::assert_snapshot!(assemble(&two_cell_region()), @r#"<ac:layout><ac:layout-section ac:type="two_equal" ac:breakout-mode="default"><ac:layout-cell><p>A</p></ac:layout-cell><ac:layout-cell><p>B</p></ac:layout-cell></ac:layout-section></ac:layout>"#);
    }

    #[test]
    fn content_around_region_is_kept() {
        let mut fragments = vec![markup("<h1>T</h1>")];
        fragments.extend(two_cell_region());
        fragments.push(markup("<p>after</p>"));
        let out = assemble(&fragments);
        assert!(out.starts_with("<h1>T</h1><ac:layout>"));
        assert!(out.ends_with("</ac:layout><p>after</p>"));
    }

    #[test]
    fn several_regions_are_each_rebuilt() {
        let mut fragments = two_cell_region();
        fragments.extend(two_cell_region());
        let out = assemble(&fragments);
        assert_eq!(out.matches("<ac:layout>").count(), 2);
        assert!(!out.contains("cf:"));
    }

    #[test]
    fn unterminated_region_is_left_alone() {
        let mut fragments = two_cell_region();
        fragments.pop();
        let out = assemble(&fragments);
        assert!(out.starts_with("<!--cf:layout-start-->"));
        assert!(!out.contains("<ac:layout>"));
    }

    #[test]
    fn missing_cell_marker_yields_empty_cell() {
        let fragments = vec![
            marker(Marker::LayoutStart),
            marker(Marker::Section(SectionMarker {
                index: 0,
                layout_type: "single".to_string(),
                breakout_mode: String::new(),
                breakout_width: String::new(),
                cell_count: 1,
            })),
            marker(Marker::SectionEnd(0)),
            marker(Marker::LayoutEnd),
        ];
        assert_eq!(
            assemble(&fragments),
            r#"<ac:layout><ac:layout-section ac:type="single"><ac:layout-cell></ac:layout-cell></ac:layout-section></ac:layout>"#
        );
    }

    #[test]
    fn declared_cell_count_is_capped_by_markers() {
        let fragments = vec![
            marker(Marker::LayoutStart),
            marker(Marker::Section(SectionMarker {
                index: 0,
                layout_type: "two_equal".to_string(),
                breakout_mode: String::new(),
                breakout_width: String::new(),
                cell_count: 2_000_000,
            })),
            marker(Marker::Cell {
                section: 0,
                cell: 0,
            }),
            markup("<p>A</p>"),
            marker(Marker::SectionEnd(0)),
            marker(Marker::LayoutEnd),
        ];
        assert_eq!(
            assemble(&fragments),
            r#"<ac:layout><ac:layout-section ac:type="two_equal"><ac:layout-cell><p>A</p></ac:layout-cell></ac:layout-section></ac:layout>"#
        );
    }
}
