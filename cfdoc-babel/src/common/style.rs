//! Inline `style` attribute helpers.

use crate::ast::Alignment;

/// Looks up one declaration in an inline style, e.g. `color` in `color: red; margin: 0`.
pub fn style_value(style: &str, property: &str) -> Option<String> {
    style.split(';').find_map(|declaration| {
        let (name, value) = declaration.split_once(':')?;
        if name.trim().eq_ignore_ascii_case(property) {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        } else {
            None
        }
    })
}

/// Parses a pixel length such as `30px` or `30`.
pub fn parse_px(value: &str) -> Option<u32> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    number
        .parse::<f32>()
        .ok()
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| n.round() as u32)
}

pub fn parse_alignment(value: &str) -> Option<Alignment> {
    match value.trim().to_ascii_lowercase().as_str() {
        "left" => Some(Alignment::Left),
        "center" => Some(Alignment::Center),
        "right" => Some(Alignment::Right),
        _ => None,
    }
}

pub fn alignment_name(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::Left => "left",
        Alignment::Center => "center",
        Alignment::Right => "right",
    }
}

/// Rebuilds the `style` attribute of a paragraph.
pub fn paragraph_style(alignment: Option<Alignment>, indent: Option<u32>) -> Option<String> {
    let mut declarations = Vec::new();
    if let Some(alignment) = alignment {
        declarations.push(format!("text-align: {};", alignment_name(alignment)));
    }
    if let Some(indent) = indent {
        declarations.push(format!("margin-left: {indent}px;"));
    }
    (!declarations.is_empty()).then(|| declarations.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_declarations_case_insensitively() {
        let style = "Text-Align: center; margin-left:30px";
        assert_eq!(style_value(style, "text-align").as_deref(), Some("center"));
        assert_eq!(style_value(style, "margin-left").as_deref(), Some("30px"));
        assert_eq!(style_value(style, "color"), None);
    }

    #[test]
    fn background_color_is_not_color() {
        assert_eq!(style_value("background-color: red", "color"), None);
    }

    #[test]
    fn parses_pixels() {
        assert_eq!(parse_px("30px"), Some(30));
        assert_eq!(parse_px("12.6"), Some(13));
        assert_eq!(parse_px("1em"), None);
    }

    #[test]
    fn rebuilds_paragraph_style() {
        assert_eq!(
            paragraph_style(Some(Alignment::Center), Some(30)).as_deref(),
            Some("text-align: center; margin-left: 30px;")
        );
        assert_eq!(paragraph_style(None, None), None);
    }
}
