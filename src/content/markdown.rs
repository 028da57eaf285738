//! Markdown rendering with syntax highlighting

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use serde::Serialize;
use std::collections::HashSet;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{styled_line_to_highlighted_html, IncludeBackground};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::config::HighlightConfig;
use crate::helpers::html_escape;

/// Marker separating a post's summary from the rest of its body
pub const MORE_MARKER: &str = "<!-- more -->";

/// A heading found while rendering, used for the table of contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub level: u8,
    pub id: String,
    pub text: String,
}

/// Rendered markdown body
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RenderedBody {
    pub html: String,
    pub headings: Vec<Heading>,
}

/// Markdown renderer with syntax highlighting
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
    line_numbers: bool,
}

/// Heading being collected until its end tag
struct PendingHeading<'a> {
    level: HeadingLevel,
    id: Option<CowStr<'a>>,
    classes: Vec<CowStr<'a>>,
    attrs: Vec<(CowStr<'a>, Option<CowStr<'a>>)>,
    events: Vec<Event<'a>>,
    text: String,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self::with_options(&HighlightConfig::default())
    }

    /// Create with custom settings
    pub fn with_options(config: &HighlightConfig) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme_name: config.theme.clone(),
            line_numbers: config.line_number,
        }
    }

    /// Render markdown to HTML.
    ///
    /// Never fails: an unterminated code fence runs to the end of the
    /// document and an unknown fence language is rendered as plain text.
    pub fn render(&self, markdown: &str) -> RenderedBody {
        // YAML metadata blocks are handled by FrontMatter::parse()
        let parser = Parser::new_ext(markdown, parser_options());

        let mut events: Vec<Event> = Vec::new();
        let mut headings: Vec<Heading> = Vec::new();
        let mut used_ids: HashSet<String> = HashSet::new();
        let mut code_block: Option<(Option<String>, String)> = None;
        let mut heading: Option<PendingHeading> = None;

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => {
                            info.split_whitespace().next().map(str::to_string)
                        }
                        CodeBlockKind::Indented => None,
                    };
                    code_block = Some((lang, String::new()));
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((lang, code)) = code_block.take() {
                        let highlighted = self.highlight_code(&code, lang.as_deref());
                        events.push(Event::Html(CowStr::from(highlighted)));
                    }
                }
                Event::Text(text) if code_block.is_some() => {
                    if let Some((_, code)) = code_block.as_mut() {
                        code.push_str(&text);
                    }
                }
                Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }) => {
                    heading = Some(PendingHeading {
                        level,
                        id,
                        classes,
                        attrs,
                        events: Vec::new(),
                        text: String::new(),
                    });
                }
                Event::End(TagEnd::Heading(_)) if heading.is_some() => {
                    let Some(pending) = heading.take() else {
                        continue;
                    };
                    let text = pending.text.trim().to_string();
                    let base = match pending.id {
                        Some(id) => id.to_string(),
                        None => slug::slugify(&text),
                    };
                    let id = unique_id(&mut used_ids, base);
                    headings.push(Heading {
                        level: pending.level as u8,
                        id: id.clone(),
                        text,
                    });
                    events.push(Event::Start(Tag::Heading {
                        level: pending.level,
                        id: Some(CowStr::from(id)),
                        classes: pending.classes,
                        attrs: pending.attrs,
                    }));
                    events.extend(pending.events);
                    events.push(Event::End(TagEnd::Heading(pending.level)));
                }
                other => match heading.as_mut() {
                    Some(pending) => {
                        if let Event::Text(ref t) | Event::Code(ref t) = other {
                            pending.text.push_str(t);
                        }
                        pending.events.push(other);
                    }
                    None => events.push(other),
                },
            }
        }

        // pulldown-cmark closes open fences itself; this only guards the invariant
        if let Some((lang, code)) = code_block.take() {
            events.push(Event::Html(CowStr::from(
                self.highlight_code(&code, lang.as_deref()),
            )));
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        RenderedBody {
            html: html_output,
            headings,
        }
    }

    /// Highlight a code block, keeping the fence language verbatim
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> String {
        let Some(lang) = lang else {
            return format!("<pre><code>{}</code></pre>\n", html_escape(code));
        };

        // `rust,ignore` style info strings look up the part before the comma
        let token = lang.split(',').next().unwrap_or(lang);
        let syntax = self
            .syntax_set
            .find_syntax_by_token(token)
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let lang_attr = html_escape(lang);
        let Some(theme) = self.theme() else {
            return plain_block(code, &lang_attr);
        };

        let mut highlighter = HighlightLines::new(syntax, theme);
        let mut highlighted = Vec::new();
        for line in LinesWithEndings::from(code) {
            let line_html = highlighter
                .highlight_line(line, &self.syntax_set)
                .and_then(|regions| {
                    styled_line_to_highlighted_html(&regions, IncludeBackground::No)
                });
            match line_html {
                Ok(html) => highlighted.push(html),
                // Fallback to plain code block
                Err(_) => return plain_block(code, &lang_attr),
            }
        }

        let background = theme
            .settings
            .background
            .map(|c| format!(r#" style="background-color:#{:02x}{:02x}{:02x};""#, c.r, c.g, c.b))
            .unwrap_or_default();

        if self.line_numbers {
            add_line_numbers(&highlighted, &lang_attr, &background)
        } else {
            format!(
                r#"<pre class="highlight"{}><code class="language-{}" data-lang="{}">{}</code></pre>"#,
                background,
                lang_attr,
                lang_attr,
                highlighted.concat()
            ) + "\n"
        }
    }

    fn theme(&self) -> Option<&Theme> {
        self.theme_set
            .themes
            .get(&self.theme_name)
            .or_else(|| self.theme_set.themes.values().next())
    }

    /// Return the summary part of a body (before `<!-- more -->`), if marked
    ///
    /// Only a marker written as raw HTML counts; one shown inside a code
    /// block or code span is content.
    pub fn split_summary(content: &str) -> Option<&str> {
        Parser::new_ext(content, parser_options())
            .into_offset_iter()
            .find_map(|(event, range)| match event {
                Event::Html(html) | Event::InlineHtml(html) if html.contains(MORE_MARKER) => {
                    content[range.clone()]
                        .find(MORE_MARKER)
                        .map(|i| range.start + i)
                }
                _ => None,
            })
            .map(|pos| content[..pos].trim())
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES
}

fn plain_block(code: &str, lang_attr: &str) -> String {
    format!(
        r#"<pre><code class="language-{}" data-lang="{}">{}</code></pre>"#,
        lang_attr,
        lang_attr,
        html_escape(code)
    ) + "\n"
}

/// Add line numbers to highlighted code, one entry per source line
fn add_line_numbers(lines: &[String], lang_attr: &str, background: &str) -> String {
    let gutter = (1..=lines.len())
        .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
        .collect::<Vec<_>>()
        .join("\n");
    let code_lines = lines
        .iter()
        .map(|line| line.replace(['\r', '\n'], ""))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<figure class="highlight" data-lang="{}"{}><table><tr><td class="gutter"><pre>{}</pre></td><td class="code"><pre><code class="language-{}">{}</code></pre></td></tr></table></figure>"#,
        lang_attr, background, gutter, lang_attr, code_lines
    ) + "\n"
}

/// First free anchor among `base`, `base-1`, `base-2`, ...
fn unique_id(used: &mut HashSet<String>, base: String) -> String {
    let base = if base.is_empty() {
        "section".to_string()
    } else {
        base
    };
    let mut id = base.clone();
    let mut n = 1;
    while used.contains(&id) {
        id = format!("{}-{}", base, n);
        n += 1;
    }
    used.insert(id.clone());
    id
}
