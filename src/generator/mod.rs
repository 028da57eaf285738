//! Generator module - renders the post collection into static documents
//!
//! Rendering is pure: the same repository and configuration always yield the
//! same documents in the same order. Only [`Generator::write`] touches disk.

use anyhow::{Context as _, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tera::Context;

use crate::config::SiteConfig;
use crate::content::{Post, PostRepository};
use crate::helpers::{
    date_xml, escape_xml, full_url_for, meta_generator, output_path_for, strip_html,
    strip_invalid_xml_chars, toc, url_for,
};
use crate::templates::{
    NavPost, PostData, SiteData, TagData, TagRef, TemplateRenderer, BOOT_JS, SITE_CSS,
};
use crate::Site;

/// Deepest heading level listed in a post's table of contents
const TOC_DEPTH: u8 = 3;

/// A file to be written below the public directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Path relative to the public directory
    pub path: PathBuf,
    pub contents: String,
}

impl Document {
    fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// Static site generator using Tera templates
pub struct Generator {
    config: SiteConfig,
    renderer: TemplateRenderer,
}

/// Posts sharing one tag slug
struct TagGroup<'a> {
    name: &'a str,
    posts: Vec<&'a Post>,
}

impl Generator {
    /// Create a new generator
    pub fn new(site: &Site) -> Result<Self> {
        let renderer = TemplateRenderer::new(
            Some(site.templates_dir.as_path()),
            &site.config.date_format,
        )?;
        Ok(Self {
            config: site.config.clone(),
            renderer,
        })
    }

    /// Render every document of the site
    pub fn render(&self, repo: &PostRepository) -> Result<Vec<Document>> {
        let site_data = self.build_site_data()?;
        let tags = self.group_tags(repo);

        let mut documents = Vec::with_capacity(repo.len() + tags.len() + 6);
        documents.push(self.render_index(repo, &site_data)?);
        for post in repo.posts() {
            documents.push(self.render_post(repo, post, &site_data)?);
        }
        documents.push(self.render_tag_index(&tags, &site_data)?);
        for (slug, group) in &tags {
            documents.push(self.render_tag(slug, group, &site_data)?);
        }
        documents.push(self.render_atom_feed(repo));
        documents.push(self.render_search_index(repo)?);
        documents.push(Document::new("assets/site.css", SITE_CSS));
        documents.push(Document::new("assets/boot.js", BOOT_JS));

        Ok(documents)
    }

    /// Write documents below `out_dir`, creating directories as needed
    pub fn write(documents: &[Document], out_dir: &Path) -> Result<()> {
        for doc in documents {
            let output_path = out_dir.join(&doc.path);
            if let Some(parent) = output_path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create dir {:?}", parent))?;
            }
            fs::write(&output_path, &doc.contents)
                .with_context(|| format!("Failed to write {:?}", output_path))?;
            tracing::debug!("Generated {:?}", output_path);
        }
        Ok(())
    }

    /// Render and write the whole site, returning the number of files
    pub fn generate(&self, repo: &PostRepository, out_dir: &Path) -> Result<usize> {
        let documents = self.render(repo)?;
        Self::write(&documents, out_dir)?;
        Ok(documents.len())
    }

    fn build_site_data(&self) -> Result<SiteData> {
        let boot_json = self
            .config
            .boot
            .to_embedded_json()
            .context("Failed to serialize boot script")?;

        Ok(SiteData {
            title: self.config.title.clone(),
            description: self.config.description.clone(),
            author: self.config.author.clone(),
            url: self.config.url.clone(),
            root: url_for(&self.config, "/"),
            language: self.config.language.clone(),
            tag_dir: self.config.tag_dir.trim_matches('/').to_string(),
            generator: meta_generator(),
            boot_json,
        })
    }

    fn post_path(&self, post: &Post) -> String {
        format!("{}/{}/", self.config.post_dir.trim_matches('/'), post.slug)
    }

    fn tag_path(&self, slug: &str) -> String {
        format!("{}/{}/", self.config.tag_dir.trim_matches('/'), slug)
    }

    fn post_data(&self, post: &Post) -> PostData {
        let tags = post
            .tags
            .iter()
            .filter_map(|name| {
                let slug = slug::slugify(name);
                (!slug.is_empty()).then(|| TagRef {
                    name: name.clone(),
                    url: url_for(&self.config, &self.tag_path(&slug)),
                })
            })
            .collect();

        PostData {
            slug: post.slug.clone(),
            title: post.title.clone(),
            date: post.date.format("%Y-%m-%d").to_string(),
            url: url_for(&self.config, &self.post_path(post)),
            tags,
            featured: post.featured,
            teaser: post.teaser(),
            content: post.rendered.html.clone(),
        }
    }

    fn nav_post(&self, post: &Post) -> NavPost {
        NavPost {
            title: post.title.clone(),
            url: url_for(&self.config, &self.post_path(post)),
        }
    }

    /// Group tags by slug; the display name is the smallest spelling seen
    fn group_tags<'a>(&self, repo: &'a PostRepository) -> BTreeMap<String, TagGroup<'a>> {
        let mut groups: BTreeMap<String, TagGroup<'a>> = BTreeMap::new();
        for (name, posts) in repo.tags() {
            let slug = slug::slugify(name);
            if slug.is_empty() {
                tracing::warn!("Tag {:?} has no usable slug, skipping its page", name);
                continue;
            }
            let group = groups.entry(slug).or_insert_with(|| TagGroup {
                name,
                posts: Vec::new(),
            });
            if name < group.name {
                group.name = name;
            }
            group.posts.extend(posts);
        }

        // Spellings were merged; restore index order without repeats
        for group in groups.values_mut() {
            group.posts.sort_by(|a, b| PostRepository::index_order(a, b));
            group.posts.dedup_by(|a, b| a.slug == b.slug);
        }
        groups
    }

    fn base_context(&self, site_data: &SiteData) -> Context {
        let mut context = Context::new();
        context.insert("site", site_data);
        context
    }

    fn render_index(&self, repo: &PostRepository, site_data: &SiteData) -> Result<Document> {
        let posts: Vec<PostData> = repo.posts().iter().map(|p| self.post_data(p)).collect();
        let featured: Vec<PostData> = repo.featured().map(|p| self.post_data(p)).collect();

        let mut context = self.base_context(site_data);
        context.insert("posts", &posts);
        context.insert("featured", &featured);

        let html = self.renderer.render("index.html", &context)?;
        Ok(Document::new(output_path_for("/"), html))
    }

    fn render_post(
        &self,
        repo: &PostRepository,
        post: &Post,
        site_data: &SiteData,
    ) -> Result<Document> {
        let (newer, older) = repo.neighbours(&post.slug);

        let mut context = self.base_context(site_data);
        context.insert("post", &self.post_data(post));
        context.insert("toc", &toc(&post.rendered.headings, TOC_DEPTH));
        context.insert("newer", &newer.map(|p| self.nav_post(p)));
        context.insert("older", &older.map(|p| self.nav_post(p)));

        let html = self
            .renderer
            .render("post.html", &context)
            .with_context(|| format!("while rendering post `{}`", post.slug))?;
        Ok(Document::new(output_path_for(&self.post_path(post)), html))
    }

    fn tag_data(&self, slug: &str, group: &TagGroup<'_>, with_posts: bool) -> TagData {
        let posts = if with_posts {
            group.posts.iter().map(|p| self.post_data(p)).collect()
        } else {
            Vec::new()
        };
        TagData {
            name: group.name.to_string(),
            slug: slug.to_string(),
            url: url_for(&self.config, &self.tag_path(slug)),
            count: group.posts.len(),
            posts,
        }
    }

    fn render_tag_index(
        &self,
        tags: &BTreeMap<String, TagGroup<'_>>,
        site_data: &SiteData,
    ) -> Result<Document> {
        let tags: Vec<TagData> = tags
            .iter()
            .map(|(slug, group)| self.tag_data(slug, group, false))
            .collect();

        let mut context = self.base_context(site_data);
        context.insert("tags", &tags);

        let html = self.renderer.render("tags.html", &context)?;
        Ok(Document::new(output_path_for(&self.config.tag_dir), html))
    }

    fn render_tag(
        &self,
        slug: &str,
        group: &TagGroup<'_>,
        site_data: &SiteData,
    ) -> Result<Document> {
        let mut context = self.base_context(site_data);
        context.insert("tag", &self.tag_data(slug, group, true));

        let html = self.renderer.render("tag.html", &context)?;
        Ok(Document::new(output_path_for(&self.tag_path(slug)), html))
    }

    fn render_atom_feed(&self, repo: &PostRepository) -> Document {
        let config = &self.config;
        let base_url = config.url.trim_end_matches('/');
        // Newest post date, so rebuilding an unchanged site is byte-identical
        let updated = repo
            .posts()
            .first()
            .map(|p| date_xml(&p.date))
            .unwrap_or_else(|| "1970-01-01T00:00:00Z".to_string());

        let mut feed = String::new();
        feed.push_str(r#"<?xml version="1.0" encoding="utf-8"?>"#);
        feed.push('\n');
        feed.push_str(r#"<feed xmlns="http://www.w3.org/2005/Atom">"#);
        feed.push('\n');
        feed.push_str(&format!("  <title>{}</title>\n", escape_xml(&config.title)));
        feed.push_str(&format!(
            "  <link href=\"{}\" rel=\"self\"/>\n",
            full_url_for(config, "atom.xml")
        ));
        feed.push_str(&format!("  <link href=\"{}\"/>\n", full_url_for(config, "/")));
        feed.push_str(&format!("  <updated>{}</updated>\n", updated));
        feed.push_str(&format!("  <id>{}</id>\n", full_url_for(config, "/")));
        feed.push_str(&format!(
            "  <author><name>{}</name></author>\n",
            escape_xml(&config.author)
        ));

        for post in repo.posts().iter().take(config.feed_limit) {
            let link = full_url_for(config, &self.post_path(post));
            feed.push_str("  <entry>\n");
            feed.push_str(&format!("    <title>{}</title>\n", escape_xml(&post.title)));
            feed.push_str(&format!("    <link href=\"{}\"/>\n", link));
            feed.push_str(&format!("    <id>{}</id>\n", link));
            feed.push_str(&format!("    <published>{}</published>\n", date_xml(&post.date)));
            feed.push_str(&format!("    <updated>{}</updated>\n", date_xml(&post.date)));
            for tag in &post.tags {
                feed.push_str(&format!("    <category term=\"{}\"/>\n", escape_xml(tag)));
            }
            let content = post.teaser().unwrap_or_else(|| post.rendered.html.clone());
            let content = strip_invalid_xml_chars(&absolute_urls(&content, base_url));
            // CDATA cannot contain its own terminator
            let content = content.replace("]]>", "]]]]><![CDATA[>");
            feed.push_str(&format!(
                "    <content type=\"html\"><![CDATA[{}]]></content>\n",
                content
            ));
            feed.push_str("  </entry>\n");
        }

        feed.push_str("</feed>\n");
        Document::new("atom.xml", feed)
    }

    fn render_search_index(&self, repo: &PostRepository) -> Result<Document> {
        let search_data: Vec<serde_json::Value> = repo
            .posts()
            .iter()
            .map(|p| {
                serde_json::json!({
                    "title": p.title,
                    "url": url_for(&self.config, &self.post_path(p)),
                    "date": p.date.format("%Y-%m-%d").to_string(),
                    "tags": p.tags,
                    "text": strip_html(&p.rendered.html),
                })
            })
            .collect();

        let json = serde_json::to_string_pretty(&search_data)?;
        Ok(Document::new("search.json", json))
    }
}

/// Rewrite root-relative `href`/`src` attributes against `base_url`
fn absolute_urls(content: &str, base_url: &str) -> String {
    content
        .replace("href=\"/", &format!("href=\"{}/", base_url))
        .replace("src=\"/", &format!("src=\"{}/", base_url))
        .replace("href='/", &format!("href='{}/", base_url))
        .replace("src='/", &format!("src='{}/", base_url))
}
