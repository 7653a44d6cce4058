//! Crawl command.

use chrono::Utc;
use console::style;

use super::super::helpers::write_file;
use super::CrawlArgs;
use crate::config::Settings;
use crate::crawl::{output_path, CacheMode, Crawler, CrawlerRunConfig, HttpCrawler};
use crate::markdown::MarkdownPipeline;

/// Crawl one page and write its (cleaned) markdown.
pub async fn cmd_crawl(settings: &Settings, args: CrawlArgs, verbose: bool) -> anyhow::Result<()> {
    let proxy = if args.rotate_proxy {
        let mut rotator = settings.proxy_rotator()?;
        match rotator.acquire_proxy().await? {
            Some(url) => Some(url),
            None => anyhow::bail!("No proxies available for --rotate-proxy"),
        }
    } else {
        args.proxy
    };

    let mut browser = settings.browser_config(proxy);
    browser.verbose = verbose;
    let crawler = HttpCrawler::new(&browser)?.with_cache_dir(&settings.cache_dir);

    let pipeline = if args.raw {
        MarkdownPipeline::default()
    } else {
        MarkdownPipeline::google_maps()
    };
    let mut run_config = CrawlerRunConfig::default()
        .with_markdown(pipeline)
        .with_cache_mode(if args.cache {
            CacheMode::Enabled
        } else {
            CacheMode::Bypass
        });
    if let Some(selector) = args.selector {
        run_config = run_config.with_css_selector(selector);
    }

    let result = crawler.crawl(&args.url, &run_config).await;

    if !result.success {
        eprintln!(
            "{} Crawl failed: {}",
            style("✗").red(),
            result.error_message.as_deref().unwrap_or("unknown error")
        );
        if let Some(status) = result.status_code {
            eprintln!("  Status code: {}", status);
        }
        anyhow::bail!("Crawl of {} failed", args.url);
    }

    let markdown = result
        .markdown
        .as_ref()
        .map(|m| m.best().to_string())
        .unwrap_or_default();

    if args.stdout {
        println!("{}", markdown);
        return Ok(());
    }

    let path = args
        .output
        .unwrap_or_else(|| output_path(&settings.output_dir, &args.url, Utc::now(), "md"));
    write_file(&path, &markdown)?;
    println!(
        "{} Saved {} ({} bytes)",
        style("✓").green(),
        path.display(),
        markdown.len()
    );

    Ok(())
}
