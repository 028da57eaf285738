//! Create a new post

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use crate::Site;

/// Write a post scaffold for `title` into the source directory
pub fn run(site: &Site, title: &str) -> Result<PathBuf> {
    let slug = slug::slugify(title);
    if slug.is_empty() {
        anyhow::bail!("Title {:?} does not produce a usable file name", title);
    }

    let extension = site
        .config
        .extensions
        .first()
        .map(String::as_str)
        .unwrap_or("md");
    let file_path = site.source_dir.join(format!("{}.{}", slug, extension));
    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    let today = chrono::Local::now().date_naive();
    // serde_yaml quotes titles that would not survive as plain scalars
    let title_yaml = serde_yaml::to_string(title)?;
    let content = format!(
        "---\ntitle: {}\ndate: {}\ntags: []\n---\n",
        title_yaml.trim_end(),
        today.format("%Y-%m-%d")
    );

    fs::create_dir_all(&site.source_dir)?;
    fs::write(&file_path, content)?;
    tracing::info!("Created: {:?}", file_path);

    Ok(file_path)
}
