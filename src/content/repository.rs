//! Post repository - loads posts from the content directory

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use super::{ContentError, FrontMatter, FrontMatterError, MarkdownRenderer, Post, SlugConflict};
use crate::config::HighlightConfig;

/// What to do with a file that fails to load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadPolicy {
    /// Abort the build, naming the file
    #[default]
    #[serde(rename = "fail")]
    FailFast,
    /// Log the error and leave the file out
    #[serde(rename = "skip")]
    SkipInvalid,
}

/// Options for loading the post collection
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// File extensions treated as posts
    pub extensions: Vec<String>,
    pub policy: LoadPolicy,
    pub highlight: HighlightConfig,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["md".to_string(), "markdown".to_string()],
            policy: LoadPolicy::FailFast,
            highlight: HighlightConfig::default(),
        }
    }
}

/// The ordered, slug-unique collection of posts for one build
#[derive(Debug, Clone, Default)]
pub struct PostRepository {
    posts: Vec<Post>,
}

impl PostRepository {
    /// Load every post below `root`
    pub fn load(root: &Path, options: &LoadOptions) -> Result<Self, ContentError> {
        if !root.exists() {
            tracing::warn!("Content directory {:?} does not exist", root);
            return Ok(Self::default());
        }

        let renderer = MarkdownRenderer::with_options(&options.highlight);
        let mut posts = Vec::new();

        for entry in WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden(e))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();
            if !path.is_file() || !has_extension(path, &options.extensions) {
                continue;
            }

            match load_post(path, &renderer) {
                Ok(post) => {
                    tracing::debug!("Loaded {:?} as `{}`", path, post.slug);
                    posts.push(post);
                }
                Err(e) => match options.policy {
                    LoadPolicy::FailFast => return Err(e),
                    LoadPolicy::SkipInvalid => {
                        tracing::warn!("Skipping post: {}", e);
                    }
                },
            }
        }

        Self::from_posts(posts)
    }

    /// Build a repository from already loaded posts, checking slug uniqueness
    pub fn from_posts(mut posts: Vec<Post>) -> Result<Self, ContentError> {
        let mut by_slug: BTreeMap<&str, Vec<PathBuf>> = BTreeMap::new();
        for post in &posts {
            by_slug
                .entry(post.slug.as_str())
                .or_default()
                .push(post.source.clone());
        }

        let conflicts: Vec<SlugConflict> = by_slug
            .into_iter()
            .filter(|(_, files)| files.len() > 1)
            .map(|(slug, mut files)| {
                files.sort();
                SlugConflict {
                    slug: slug.to_string(),
                    files,
                }
            })
            .collect();
        if !conflicts.is_empty() {
            return Err(ContentError::DuplicateSlug { conflicts });
        }

        posts.sort_by(Self::index_order);

        Ok(Self { posts })
    }

    /// Index order: newest first, ties by slug
    pub fn index_order(a: &Post, b: &Post) -> Ordering {
        b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug))
    }

    /// All posts, newest first
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn get(&self, slug: &str) -> Option<&Post> {
        self.posts.iter().find(|p| p.slug == slug)
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Posts pinned with `featured: true`, in index order
    pub fn featured(&self) -> impl Iterator<Item = &Post> {
        self.posts.iter().filter(|p| p.featured)
    }

    /// Tag name -> posts carrying it (in index order)
    pub fn tags(&self) -> BTreeMap<&str, Vec<&Post>> {
        let mut tags: BTreeMap<&str, Vec<&Post>> = BTreeMap::new();
        for post in &self.posts {
            for tag in &post.tags {
                tags.entry(tag.as_str()).or_default().push(post);
            }
        }
        tags
    }

    /// The (newer, older) neighbours of a post in index order
    pub fn neighbours(&self, slug: &str) -> (Option<&Post>, Option<&Post>) {
        let Some(pos) = self.posts.iter().position(|p| p.slug == slug) else {
            return (None, None);
        };
        let newer = pos.checked_sub(1).and_then(|i| self.posts.get(i));
        let older = self.posts.get(pos + 1);
        (newer, older)
    }
}

/// Load a single post from a file
fn load_post(path: &Path, renderer: &MarkdownRenderer) -> Result<Post, ContentError> {
    let content = fs::read_to_string(path).map_err(|source| ContentError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let (front_matter, body) = FrontMatter::parse(&content)
        .map_err(|e| ContentError::front_matter(path.to_path_buf(), e))?;
    let front_matter = front_matter.ok_or_else(|| {
        ContentError::front_matter(path.to_path_buf(), FrontMatterError::MissingKey("title"))
    })?;

    for key in front_matter.extra.keys() {
        tracing::warn!("{:?}: unrecognized front-matter key `{}`", path, key);
    }

    let slug = slug_for(path).ok_or_else(|| ContentError::EmptySlug {
        path: path.to_path_buf(),
    })?;

    Ok(Post::new(
        slug,
        path.to_path_buf(),
        front_matter,
        body,
        renderer,
    ))
}

/// URL-safe slug derived from the file name
pub fn slug_for(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_string_lossy();
    let slug = slug::slugify(stem);
    (!slug.is_empty()).then_some(slug)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}
