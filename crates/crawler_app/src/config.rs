//! Runtime configuration with environment overrides.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crawler_engine::CrawlConfig;

pub struct AppConfig {
    pub crawl: CrawlConfig,
    pub verbose: bool,
    pub log_file: Option<PathBuf>,
}

impl AppConfig {
    /// Builds the configuration from engine defaults, overridable through
    /// `NEWSCRAWL_*` environment variables.
    pub fn from_env() -> Self {
        let mut crawl = CrawlConfig::default();
        crawl.output_root = env::var_os("NEWSCRAWL_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(default_root);
        if let Some(secs) = read_u64("NEWSCRAWL_PERIOD_SECS") {
            crawl.period = Duration::from_secs(secs);
        }
        if let Ok(base) = env::var("NEWSCRAWL_BASE_URL") {
            crawl.base_url = base;
        }
        if let Some(limit) = read_u64("NEWSCRAWL_MAX_CONCURRENCY") {
            crawl.fetch.max_concurrency = Some(limit as usize);
        }

        Self {
            crawl,
            verbose: env::var_os("NEWSCRAWL_VERBOSE").is_some(),
            log_file: env::var_os("NEWSCRAWL_LOG_FILE").map(PathBuf::from),
        }
    }
}

fn read_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|value| value.parse().ok())
}

/// Default output root: a `pages` folder next to the executable.
fn default_root() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("pages")))
        .unwrap_or_else(|| PathBuf::from("pages"))
}
