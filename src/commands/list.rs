//! List site content

use anyhow::Result;
use std::io::Write;

use crate::Site;

/// Print posts or tags of the site to `out`
pub fn run<W: Write>(site: &Site, content_type: &str, out: &mut W) -> Result<()> {
    let repo = site.load_posts()?;

    match content_type {
        "post" | "posts" => {
            writeln!(out, "Posts ({}):", repo.len())?;
            for post in repo.posts() {
                writeln!(
                    out,
                    "  {}{} - {} [{}]",
                    if post.featured { "* " } else { "" },
                    post.date.format("%Y-%m-%d"),
                    post.title,
                    post.source.display()
                )?;
            }
        }
        "tag" | "tags" => {
            let tags = repo.tags();
            writeln!(out, "Tags ({}):", tags.len())?;
            let mut tags: Vec<_> = tags.into_iter().map(|(t, p)| (t, p.len())).collect();
            // Most used first; BTreeMap order breaks ties
            tags.sort_by(|a, b| b.1.cmp(&a.1));
            for (tag, count) in tags {
                writeln!(out, "  {} ({})", tag, count)?;
            }
        }
        _ => {
            anyhow::bail!("Unknown type: {}. Available: post, tag", content_type);
        }
    }

    Ok(())
}
