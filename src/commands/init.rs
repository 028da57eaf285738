//! Initialize a new site

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::config::SiteConfig;

const CONFIG_TEMPLATE: &str = r#"# termpress configuration

# Site
title: termpress
description: ''
author: John Doe
language: en
date_format: YYYY-MM-DD

# URL
url: http://example.com
root: /

# Directory
source_dir: posts
public_dir: public
templates_dir: templates
post_dir: posts
tag_dir: tags

# Content
extensions: [md, markdown]
# fail: abort the build on the first bad post; skip: log it and continue
on_error: fail

# Output
feed_limit: 20
highlight:
  theme: base16-ocean.dark
  line_number: false

# Boot animation shown before each page
boot:
  enabled: true
  delay:
    min_ms: 60
    max_ms: 220
  lines:
    - "TERMPRESS BIOS v0.1"
    - "Memory check ......... 640K OK"
    - "Mounting /dev/posts"
    - text: "login: guest"
      delay_ms: 400
"#;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    let config_path = target_dir.join("_config.yml");
    if config_path.exists() {
        anyhow::bail!("{:?} already contains a site", target_dir);
    }

    let defaults = SiteConfig::default();
    fs::create_dir_all(target_dir.join(&defaults.source_dir))?;
    fs::create_dir_all(target_dir.join(&defaults.templates_dir))?;
    fs::write(&config_path, CONFIG_TEMPLATE)?;

    let today = chrono::Local::now().date_naive();
    let sample_post = format!(
        r#"---
title: Hello World
date: {}
tags: [meta]
---

Welcome to your new terminal. This is the first post.
<!-- more -->

## Quick Start

### Create a new post

```bash
$ termpress new "My New Post"
```

### Generate static files

```bash
$ termpress build
```

### Watch the boot sequence

```bash
$ termpress boot
```
"#,
        today.format("%Y-%m-%d")
    );

    fs::write(
        target_dir.join(&defaults.source_dir).join("hello-world.md"),
        sample_post,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Site;
    use tempfile::TempDir;

    #[test]
    fn test_init_site_builds() {
        let tmp = TempDir::new().unwrap();
        init_site(tmp.path()).unwrap();

        let site = Site::new(tmp.path()).unwrap();
        assert_eq!(site.config.boot.lines.len(), 4);
        assert_eq!(site.config.boot.lines[3].delay_ms, Some(400));

        let repo = site.load_posts().unwrap();
        assert_eq!(repo.len(), 1);
        assert!(repo.get("hello-world").is_some());

        site.build().unwrap();
        assert!(site.public_dir.join("posts/hello-world/index.html").is_file());
    }

    #[test]
    fn test_init_refuses_existing_site() {
        let tmp = TempDir::new().unwrap();
        init_site(tmp.path()).unwrap();
        assert!(init_site(tmp.path()).is_err());
    }
}
