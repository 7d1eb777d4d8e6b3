//! CLI commands implementation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::{load_settings, Settings};
use crate::fetch::SessionCookies;
use crate::models::GameMetadata;
use crate::orchestrator::ThreadScraper;
use crate::parser::MetadataParser;

#[derive(Parser)]
#[command(name = "threadscrape")]
#[command(about = "Extract catalog metadata from forum thread pages")]
#[command(version)]
pub struct Cli {
    /// Settings file (defaults to ./threadscrape.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a thread and print its metadata as JSON
    Scrape {
        /// Thread URL
        url: String,
        /// JSON cookie export with the authenticated session
        #[arg(long, env = "THREADSCRAPE_COOKIES")]
        cookies: Option<PathBuf>,
        /// Skip the browser and use a plain HTTP request
        #[arg(long)]
        plain: bool,
    },

    /// Parse saved thread markup and print its metadata as JSON
    Parse {
        /// HTML file
        file: PathBuf,
        /// URL the markup was fetched from
        #[arg(long)]
        url: Option<String>,
    },

    /// Print the effective settings as TOML
    Config,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref()).context("Failed to load settings")?;

    match cli.command {
        Commands::Scrape {
            url,
            cookies,
            plain,
        } => cmd_scrape(&settings, &url, cookies.as_deref(), plain).await,
        Commands::Parse { file, url } => cmd_parse(&settings, &file, url.as_deref()),
        Commands::Config => cmd_config(&settings),
    }
}

fn load_cookies(settings: &Settings, explicit: Option<&Path>) -> anyhow::Result<SessionCookies> {
    match explicit.or(settings.cookies_file.as_deref()) {
        Some(path) => {
            let cookies = SessionCookies::load(path)?;
            if cookies.is_empty() {
                eprintln!(
                    "{} No usable cookies in {}",
                    style("!").yellow(),
                    path.display()
                );
            }
            Ok(cookies)
        }
        None => Ok(SessionCookies::default()),
    }
}

fn print_metadata(meta: &GameMetadata) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(meta).context("Failed to serialize metadata")?;
    println!("{}", json);
    Ok(())
}

async fn cmd_scrape(
    settings: &Settings,
    url: &str,
    cookies: Option<&Path>,
    plain: bool,
) -> anyhow::Result<()> {
    let cookies = load_cookies(settings, cookies)?;

    let mut settings = settings.clone();
    if plain {
        settings.browser.enabled = false;
    }
    let scraper = ThreadScraper::from_settings(&settings, cookies)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(format!("Scraping {}...", url));
    pb.enable_steady_tick(Duration::from_millis(100));

    let result = scraper.scrape(url).await;
    pb.finish_and_clear();

    match result {
        Ok(meta) => {
            eprintln!(
                "{} {} ({} tags)",
                style("✓").green(),
                meta.name,
                meta.tags.len()
            );
            print_metadata(&meta)
        }
        Err(e) => {
            eprintln!("{} {}", style("✗").red(), url);
            Err(e).with_context(|| format!("Failed to scrape {}", url))
        }
    }
}

fn cmd_parse(settings: &Settings, file: &Path, url: Option<&str>) -> anyhow::Result<()> {
    let markup = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let source_url = url.unwrap_or(&settings.site.base_url);
    let meta = MetadataParser::new(&settings.site)
        .parse(&markup, source_url)
        .with_context(|| format!("Failed to parse {}", file.display()))?;

    print_metadata(&meta)
}

fn cmd_config(settings: &Settings) -> anyhow::Result<()> {
    let text = toml::to_string_pretty(settings).context("Failed to serialize settings")?;
    print!("{}", text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_scrape_arguments() {
        let cli = Cli::try_parse_from([
            "threadscrape",
            "-v",
            "--config",
            "custom.toml",
            "scrape",
            "https://f95zone.to/threads/x.1/",
            "--plain",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        match cli.command {
            Commands::Scrape { url, plain, .. } => {
                assert_eq!(url, "https://f95zone.to/threads/x.1/");
                assert!(plain);
            }
            _ => panic!("expected scrape"),
        }
    }

    #[test]
    fn test_parse_command_arguments() {
        let cli = Cli::try_parse_from([
            "threadscrape",
            "parse",
            "page.html",
            "--url",
            "https://f95zone.to/threads/x.1/",
        ])
        .unwrap();

        match cli.command {
            Commands::Parse { file, url } => {
                assert_eq!(file, PathBuf::from("page.html"));
                assert_eq!(url.as_deref(), Some("https://f95zone.to/threads/x.1/"));
            }
            _ => panic!("expected parse"),
        }
    }

    #[test]
    fn test_load_cookies_prefers_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = dir.path().join("explicit.json");
        std::fs::write(
            &explicit,
            r#"[{"name": "a", "value": "1", "domain": "f95zone.to"}]"#,
        )
        .unwrap();

        let settings = Settings {
            cookies_file: Some(dir.path().join("missing.json")),
            ..Settings::default()
        };

        let cookies = load_cookies(&settings, Some(&explicit)).unwrap();
        assert_eq!(cookies.len(), 1);
        assert!(load_cookies(&settings, None).is_err());
        assert!(load_cookies(&Settings::default(), None).unwrap().is_empty());
    }
}
