//! Table of contents helper

use crate::content::Heading;

use super::html_escape;

/// Render a nested table of contents from a heading outline
pub fn toc(headings: &[Heading], max_depth: u8) -> String {
    let entries: Vec<&Heading> = headings.iter().filter(|h| h.level <= max_depth).collect();
    if entries.is_empty() {
        return String::new();
    }

    let base = entries.iter().map(|h| h.level).min().unwrap_or(1);
    let mut html = r#"<ol class="toc">"#.to_string();
    let mut current_level = base;

    for heading in entries {
        // Adjust nesting
        while current_level < heading.level {
            html.push_str("<ol>");
            current_level += 1;
        }
        while current_level > heading.level {
            html.push_str("</ol>");
            current_level -= 1;
        }

        html.push_str(&format!(
            "<li class=\"toc-item toc-level-{}\"><a class=\"toc-link\" href=\"#{}\">{}</a></li>",
            heading.level,
            html_escape(&heading.id),
            html_escape(&heading.text)
        ));
    }

    while current_level > base {
        html.push_str("</ol>");
        current_level -= 1;
    }

    html.push_str("</ol>");
    html
}
