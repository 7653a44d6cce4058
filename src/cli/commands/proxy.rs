//! Proxy pool commands.

use console::style;

use crate::config::Settings;

/// Print the next unused proxy URL.
pub async fn cmd_proxy_next(settings: &Settings) -> anyhow::Result<()> {
    let mut rotator = settings.proxy_rotator()?;
    match rotator.acquire_proxy().await? {
        Some(url) => println!("{}", url),
        None => anyhow::bail!("No proxies available, even after refreshing the pool"),
    }
    Ok(())
}

/// Re-scrape the sources and reset the used log.
pub async fn cmd_proxy_refresh(settings: &Settings) -> anyhow::Result<()> {
    let mut rotator = settings.proxy_rotator()?;
    let count = rotator.refresh_pool().await?;
    println!(
        "{} Refreshed proxy pool with {} entries in {}",
        style("✓").green(),
        count,
        settings.proxy_dir.display()
    );
    Ok(())
}

/// Delete the used-proxy log.
pub fn cmd_proxy_clear_used(settings: &Settings) -> anyhow::Result<()> {
    let mut rotator = settings.proxy_rotator()?;
    rotator.clear_used_pool()?;
    println!("{} Cleared used proxies", style("✓").green());
    Ok(())
}

/// Show pool sizes.
pub fn cmd_proxy_status(settings: &Settings) -> anyhow::Result<()> {
    let status = settings.proxy_rotator()?.status()?;
    println!("{}", style("Proxy Pool").bold());
    println!("{}", "-".repeat(40));
    println!("{:<20} {}", "Directory:", settings.proxy_dir.display());
    println!("{:<20} {}", "Available:", status.available);
    println!("{:<20} {}", "Used:", status.used);
    if status.available == 0 {
        println!(
            "\n{} Pool is empty; the next `proxy next` will refresh it",
            style("!").yellow()
        );
    }
    Ok(())
}
