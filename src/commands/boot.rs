//! Play the boot sequence in the terminal

use anyhow::Result;
use std::io;

use crate::boot::{self, BootOutcome};
use crate::Site;

/// Play the configured boot script on stdout
pub async fn run(site: &Site) -> Result<BootOutcome> {
    let script = &site.config.boot;
    if !script.enabled {
        tracing::info!("Boot sequence is disabled in _config.yml");
        return Ok(BootOutcome::Completed);
    }

    let mut stdout = io::stdout();
    let outcome = boot::play(script, &mut stdout).await?;
    if outcome == BootOutcome::Cancelled {
        tracing::info!("Boot sequence interrupted");
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_disabled_boot_completes_immediately() {
        let mut config = SiteConfig::default();
        config.boot.enabled = false;
        let site = Site::with_config(PathBuf::from("."), config);
        assert_eq!(run(&site).await.unwrap(), BootOutcome::Completed);
    }
}
