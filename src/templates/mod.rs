//! Built-in terminal theme templates using Tera template engine
//!
//! The templates are embedded in the binary. A file with the same name in the
//! site's templates directory replaces the embedded one.

use anyhow::{Context as _, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tera::{Context, Tera};

use crate::helpers;

/// Stylesheet copied to `assets/site.css`
pub const SITE_CSS: &str = include_str!("assets/site.css");

/// Boot animation player copied to `assets/boot.js`
pub const BOOT_JS: &str = include_str!("assets/boot.js");

const TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("terminal/layout.html")),
    ("macros.html", include_str!("terminal/macros.html")),
    ("index.html", include_str!("terminal/index.html")),
    ("post.html", include_str!("terminal/post.html")),
    ("tag.html", include_str!("terminal/tag.html")),
    ("tags.html", include_str!("terminal/tags.html")),
];

/// Template renderer with the embedded terminal theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a renderer with the embedded templates, letting files in
    /// `override_dir` take precedence
    pub fn new(override_dir: Option<&Path>, date_format: &str) -> Result<Self> {
        let mut tera = Tera::default();

        // Output is HTML we build ourselves; escaping is explicit via `esc`
        tera.autoescape_on(vec![]);

        let mut sources = Vec::with_capacity(TEMPLATES.len());
        for (name, builtin) in TEMPLATES {
            let custom = match override_dir.map(|dir| dir.join(name)) {
                Some(path) if path.is_file() => {
                    tracing::debug!("Using template override {:?}", path);
                    Some(
                        fs::read_to_string(&path)
                            .with_context(|| format!("failed to read template {:?}", path))?,
                    )
                }
                _ => None,
            };
            sources.push((*name, custom.unwrap_or_else(|| builtin.to_string())));
        }
        tera.add_raw_templates(sources)?;

        let default_format = date_format.to_string();
        tera.register_filter(
            "date_format",
            move |value: &tera::Value, args: &HashMap<String, tera::Value>| {
                date_format_filter(value, args, &default_format)
            },
        );
        tera.register_filter("esc", esc_filter);
        tera.register_filter("strip_html", strip_html_filter);
        tera.register_filter("truncate_chars", truncate_chars_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        self.tera
            .render(template_name, context)
            .with_context(|| format!("failed to render {}", template_name))
    }
}

/// Tera filter: escape HTML special characters
fn esc_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("esc", "value", String, value);
    Ok(tera::Value::String(helpers::html_escape(&s)))
}

/// Tera filter: strip HTML tags
fn strip_html_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("strip_html", "value", String, value);
    Ok(tera::Value::String(helpers::strip_html(&s)))
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 150,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => "...".to_string(),
    };
    Ok(tera::Value::String(helpers::truncate_html(
        &s,
        length,
        Some(&omission),
    )))
}

/// Tera filter: format a `YYYY-MM-DD` date string
fn date_format_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
    default_format: &str,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("date_format", "value", String, value);
    let format = match args.get("format") {
        Some(val) => tera::try_get_value!("date_format", "format", String, val),
        None => default_format.to_string(),
    };

    let Ok(date) = chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d") else {
        return Ok(tera::Value::String(s));
    };
    let formatted = if format == "LL" {
        helpers::full_date(&date)
    } else {
        helpers::format_date(&date, &format)
    };
    Ok(tera::Value::String(formatted))
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub author: String,
    pub url: String,
    pub root: String,
    pub language: String,
    pub tag_dir: String,
    pub generator: String,
    /// Boot script as JSON, safe to embed in a `<script>` element
    pub boot_json: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostData {
    pub slug: String,
    pub title: String,
    pub date: String,
    pub url: String,
    pub tags: Vec<TagRef>,
    pub featured: bool,
    pub teaser: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagRef {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagData {
    pub name: String,
    pub slug: String,
    pub url: String,
    pub count: usize,
    pub posts: Vec<PostData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NavPost {
    pub title: String,
    pub url: String,
}
