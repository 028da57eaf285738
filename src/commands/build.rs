//! Generate static files

use anyhow::Result;

use super::clean;
use crate::generator::Generator;
use crate::Site;

/// Load posts, render every document and rewrite the public directory
pub fn run(site: &Site) -> Result<()> {
    let start = std::time::Instant::now();

    let repo = site.load_posts()?;
    tracing::info!("Loaded {} posts", repo.len());

    let generator = Generator::new(site)?;
    let documents = generator.render(&repo)?;

    // Output of deleted or renamed posts must not survive a rebuild
    clean::run(site)?;
    Generator::write(&documents, &site.public_dir)?;
    let count = documents.len();

    let duration = start.elapsed();
    tracing::info!(
        "Generated {} files in {:.2}s",
        count,
        duration.as_secs_f64()
    );

    Ok(())
}
