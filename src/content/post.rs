//! Post model

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;

use super::{FrontMatter, MarkdownRenderer, RenderedBody};

/// A blog post
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    /// Slug (URL-friendly name derived from the file name)
    pub slug: String,

    /// Post title
    pub title: String,

    /// Publication date
    pub date: NaiveDate,

    /// Hand-written excerpt from front-matter
    pub excerpt: Option<String>,

    /// Post tags
    pub tags: BTreeSet<String>,

    /// Pinned to the top of the index
    pub featured: bool,

    /// Front-matter keys with no meaning to the pipeline
    pub extra: IndexMap<String, serde_yaml::Value>,

    /// Raw markdown content
    pub body: String,

    /// Rendered HTML content
    pub rendered: RenderedBody,

    /// Rendered content before `<!-- more -->`
    pub summary: Option<String>,

    /// Source file path
    pub source: PathBuf,
}

impl Post {
    /// Build a post from validated front-matter and render its body
    pub fn new(
        slug: String,
        source: PathBuf,
        front_matter: FrontMatter,
        body: &str,
        renderer: &MarkdownRenderer,
    ) -> Self {
        let mut post = Self {
            slug,
            title: front_matter.title,
            date: front_matter.date,
            excerpt: front_matter.excerpt,
            tags: front_matter.tags,
            featured: front_matter.featured,
            extra: front_matter.extra,
            body: body.to_string(),
            rendered: RenderedBody::default(),
            summary: None,
            source,
        };
        post.rerender(renderer);
        post
    }

    /// Recompute the derived `rendered` and `summary` fields from `body`
    pub fn rerender(&mut self, renderer: &MarkdownRenderer) {
        self.rendered = renderer.render(&self.body);
        self.summary = MarkdownRenderer::split_summary(&self.body)
            .filter(|s| !s.is_empty())
            .map(|s| renderer.render(s).html);
    }

    /// Text shown in listings: front-matter excerpt, else the summary
    pub fn teaser(&self) -> Option<String> {
        self.excerpt
            .as_ref()
            .map(|e| crate::helpers::html_escape(e))
            .or_else(|| self.summary.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn front_matter(excerpt: Option<&str>) -> FrontMatter {
        FrontMatter {
            title: "Borrowing".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            excerpt: excerpt.map(str::to_string),
            tags: BTreeSet::from(["rust".to_string()]),
            featured: false,
            extra: IndexMap::new(),
        }
    }

    #[test]
    fn test_new_renders_body() {
        let renderer = MarkdownRenderer::new();
        let post = Post::new(
            "borrowing".to_string(),
            PathBuf::from("posts/borrowing.md"),
            front_matter(None),
            "Lead in.\n<!-- more -->\n## Details\n",
            &renderer,
        );
        assert_eq!(post.slug, "borrowing");
        assert!(post.rendered.html.contains("Details"));
        assert_eq!(post.summary.as_deref(), Some("<p>Lead in.</p>\n"));
        assert_eq!(post.teaser(), post.summary);
    }

    #[test]
    fn test_excerpt_wins_over_summary() {
        let renderer = MarkdownRenderer::new();
        let post = Post::new(
            "b".to_string(),
            PathBuf::from("b.md"),
            front_matter(Some("Lifetimes & you")),
            "Lead in.\n<!-- more -->\nrest",
            &renderer,
        );
        assert_eq!(post.teaser().as_deref(), Some("Lifetimes &amp; you"));
    }

    #[test]
    fn test_rerender_matches_initial_render() {
        let renderer = MarkdownRenderer::new();
        let mut post = Post::new(
            "c".to_string(),
            PathBuf::from("c.md"),
            front_matter(None),
            "```go\nfunc main() {}\n```\n",
            &renderer,
        );
        let before = post.rendered.clone();
        post.rerender(&renderer);
        assert_eq!(before, post.rendered);
    }
}
