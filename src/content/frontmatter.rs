//! Front-matter parsing

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

lazy_static! {
    /// ISO-8601 shaped date, optionally followed by a time and offset
    static ref ISO_DATE: Regex = Regex::new(
        r"^\d{4}-\d{2}-\d{2}(?:[T ]\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?\s*(?:Z|[+-]\d{2}:?\d{2})?)?$"
    )
    .unwrap();
}

/// Front-matter parsing errors
#[derive(Error, Debug)]
pub enum FrontMatterError {
    #[error("front-matter block opened with `---` but never closed")]
    Unterminated,

    #[error("missing required key `{0}`")]
    MissingKey(&'static str),

    #[error("invalid date {0:?} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Custom deserializer that handles both a single string and a list of strings
fn string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, SeqAccess, Visitor};
    use std::fmt;

    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value])
        }

        fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
        where
            S: SeqAccess<'de>,
        {
            let mut vec = Vec::new();
            while let Some(item) = seq.next_element::<String>()? {
                vec.push(item);
            }
            Ok(vec)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

/// The YAML block as written, before validation
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFrontMatter {
    title: Option<String>,
    date: Option<String>,
    excerpt: Option<String>,
    #[serde(deserialize_with = "string_or_vec")]
    tags: Vec<String>,
    featured: bool,
    #[serde(flatten)]
    extra: IndexMap<String, serde_yaml::Value>,
}

/// Validated front-matter of a post
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrontMatter {
    pub title: String,
    pub date: NaiveDate,
    pub excerpt: Option<String>,
    pub tags: BTreeSet<String>,
    pub featured: bool,
    /// Keys this parser does not know about, in source order
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl FrontMatter {
    /// Parse front-matter from content string.
    ///
    /// Returns `(front_matter, body)`. A file that does not open with a
    /// `---` line has no front-matter and is entirely body.
    pub fn parse(content: &str) -> Result<(Option<Self>, &str), FrontMatterError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        match split_block(content)? {
            Some((yaml, body)) => {
                let raw: RawFrontMatter = if yaml.trim().is_empty() {
                    RawFrontMatter::default()
                } else {
                    serde_yaml::from_str(yaml)?
                };
                let fm = Self::validate(raw)?;
                Ok((Some(fm), body.trim_start_matches(['\n', '\r'])))
            }
            None => Ok((None, content)),
        }
    }

    fn validate(raw: RawFrontMatter) -> Result<Self, FrontMatterError> {
        let title = raw
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(FrontMatterError::MissingKey("title"))?;

        let date = raw
            .date
            .filter(|d| !d.trim().is_empty())
            .ok_or(FrontMatterError::MissingKey("date"))?;
        let date = parse_date(&date)?;

        let tags = raw
            .tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        Ok(Self {
            title,
            date,
            excerpt: raw.excerpt,
            tags,
            featured: raw.featured,
            extra: raw.extra,
        })
    }
}

/// Locate the `---` delimited block at the very top of the file.
/// Returns `(yaml, rest)` or `None` when the file has no block.
fn split_block(content: &str) -> Result<Option<(&str, &str)>, FrontMatterError> {
    let mut lines = content.split_inclusive('\n');

    match lines.next() {
        Some(first) if first.trim_end() == "---" => {
            let yaml_start = first.len();
            let mut offset = yaml_start;
            for line in lines {
                let marker = line.trim_end();
                if marker == "---" || marker == "..." {
                    return Ok(Some((
                        &content[yaml_start..offset],
                        &content[offset + line.len()..],
                    )));
                }
                offset += line.len();
            }
            Err(FrontMatterError::Unterminated)
        }
        _ => Ok(None),
    }
}

/// Parse a front-matter date, keeping only the calendar date.
///
/// Only ISO-8601 shapes are accepted; `2024/01/15` or `Jan 5 2024` are errors.
pub fn parse_date(value: &str) -> Result<NaiveDate, FrontMatterError> {
    let value = value.trim();
    let invalid = || FrontMatterError::InvalidDate(value.to_string());

    if !ISO_DATE.is_match(value) {
        return Err(invalid());
    }

    if value.len() == 10 {
        return NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.date_naive());
    }

    let with_offset = [
        "%Y-%m-%d %H:%M:%S%.f%:z",
        "%Y-%m-%d %H:%M:%S%.f %:z",
        "%Y-%m-%d %H:%M:%S%.f%z",
        "%Y-%m-%dT%H:%M:%S%.f%z",
    ];
    for fmt in with_offset {
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Ok(dt.date_naive());
        }
    }

    let naive = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
    ];
    for fmt in naive {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(dt.date());
        }
    }

    Err(invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_yaml_frontmatter() {
        let content = r#"---
title: "X"
date: "2026-01-01"
tags: [a, b]
---

This is the content.
"#;

        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        let fm = fm.unwrap();
        assert_eq!(fm.title, "X");
        assert_eq!(fm.date, ymd(2026, 1, 1));
        assert_eq!(fm.tags, BTreeSet::from(["a".to_string(), "b".to_string()]));
        assert!(!fm.featured);
        assert_eq!(fm.excerpt, None);
        assert_eq!(remaining, "This is the content.\n");
    }

    #[test]
    fn test_optional_fields() {
        let content = r#"---
title: Hello World
date: 2024-01-15 10:30:00
excerpt: A short summary
featured: true
tags:
  - rust
  - security
  - rust
---
Body
"#;

        let (fm, _) = FrontMatter::parse(content).unwrap();
        let fm = fm.unwrap();
        assert_eq!(fm.title, "Hello World");
        assert_eq!(fm.date, ymd(2024, 1, 15));
        assert_eq!(fm.excerpt.as_deref(), Some("A short summary"));
        assert!(fm.featured);
        assert_eq!(fm.tags.len(), 2);
    }

    #[test]
    fn test_parse_single_string_tags() {
        let content = "---\ntitle: Single Tag Post\ndate: 2024-01-15\ntags: Notes\n---\n";

        let (fm, body) = FrontMatter::parse(content).unwrap();
        let fm = fm.unwrap();
        assert_eq!(fm.tags, BTreeSet::from(["Notes".to_string()]));
        assert_eq!(body, "");
    }

    #[test]
    fn test_unrecognized_keys_preserved() {
        let content = "---\ntitle: T\ndate: 2024-01-15\nlayout: wide\ncover: img.png\n---\nx";

        let (fm, _) = FrontMatter::parse(content).unwrap();
        let fm = fm.unwrap();
        let keys: Vec<_> = fm.extra.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["layout", "cover"]);
        assert_eq!(fm.extra["layout"].as_str(), Some("wide"));
    }

    #[test]
    fn test_no_frontmatter_is_body() {
        let content = "# Just markdown\n\n---\n\nwith a rule";
        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert!(fm.is_none());
        assert_eq!(body, content);
    }

    #[test]
    fn test_marker_must_be_at_start() {
        let content = "\n---\ntitle: T\ndate: 2024-01-15\n---\n";
        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert!(fm.is_none());
        assert_eq!(body, content);
    }

    #[test]
    fn test_bom_is_skipped() {
        let content = "\u{feff}---\ntitle: T\ndate: 2024-01-15\n---\nbody";
        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.unwrap().title, "T");
        assert_eq!(body, "body");
    }

    #[test]
    fn test_crlf_line_endings() {
        let content = "---\r\ntitle: T\r\ndate: 2024-01-15\r\n---\r\nbody\r\n";
        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.unwrap().date, ymd(2024, 1, 15));
        assert_eq!(body, "body\r\n");
    }

    #[test]
    fn test_unterminated_block() {
        let content = "---\ntitle: Never closed\ndate: 2024-01-15\n\nBody text";
        let err = FrontMatter::parse(content).unwrap_err();
        assert!(matches!(err, FrontMatterError::Unterminated));
    }

    #[test]
    fn test_missing_required_keys() {
        let err = FrontMatter::parse("---\ndate: 2024-01-15\n---\n").unwrap_err();
        assert!(matches!(err, FrontMatterError::MissingKey("title")));

        let err = FrontMatter::parse("---\ntitle: T\n---\n").unwrap_err();
        assert!(matches!(err, FrontMatterError::MissingKey("date")));

        let err = FrontMatter::parse("---\ntitle: \"  \"\ndate: 2024-01-15\n---\n").unwrap_err();
        assert!(matches!(err, FrontMatterError::MissingKey("title")));

        let err = FrontMatter::parse("---\n---\nbody").unwrap_err();
        assert!(matches!(err, FrontMatterError::MissingKey("title")));
    }

    #[test]
    fn test_invalid_date() {
        let err = FrontMatter::parse("---\ntitle: T\ndate: 2024/01/15\n---\n").unwrap_err();
        assert!(matches!(err, FrontMatterError::InvalidDate(ref d) if d == "2024/01/15"));

        let err = FrontMatter::parse("---\ntitle: T\ndate: 2024-02-30\n---\n").unwrap_err();
        assert!(matches!(err, FrontMatterError::InvalidDate(_)));
    }

    #[test]
    fn test_wrong_type_is_yaml_error() {
        let err = FrontMatter::parse("---\ntitle: T\ndate: 2024-01-15\nfeatured: maybe\n---\n")
            .unwrap_err();
        assert!(matches!(err, FrontMatterError::Yaml(_)));
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = ymd(2024, 1, 15);
        assert_eq!(parse_date("2024-01-15").unwrap(), expected);
        assert_eq!(parse_date("2024-01-15 10:30").unwrap(), expected);
        assert_eq!(parse_date("2024-01-15 10:30:00").unwrap(), expected);
        assert_eq!(parse_date("2024-01-15T10:30:00").unwrap(), expected);
        assert_eq!(parse_date("2024-01-15T10:30:00.250").unwrap(), expected);
        assert_eq!(parse_date("2024-01-15T23:30:00+08:00").unwrap(), expected);
        assert_eq!(parse_date("2024-01-15T10:30:00Z").unwrap(), expected);

        assert!(parse_date("15-01-2024").is_err());
        assert!(parse_date("Jan 15 2024").is_err());
        assert!(parse_date("2024-1-5").is_err());
        assert!(parse_date("2024-01-15 25:00").is_err());
    }
}
