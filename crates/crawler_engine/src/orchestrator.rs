use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crawl_logging::{crawl_debug, crawl_error, crawl_info, crawl_warn};
use tokio::task::{JoinHandle, JoinSet};

use crate::extract::{extract_comment_links, extract_top_stories, Story};
use crate::fetch::{FetchSettings, Fetcher, ReqwestTransport};
use crate::persist::{PageStore, SaveOutcome};
use crate::state::CrawlState;
use crate::types::{CrawlError, JobId, PageContent, TickSummary};

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Listing page URL; discussion-thread URLs are derived from it.
    pub base_url: String,
    /// Root folder for persisted pages.
    pub output_root: PathBuf,
    /// Fixed interval between crawl ticks.
    pub period: Duration,
    pub fetch: FetchSettings,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: "https://news.ycombinator.com/".to_string(),
            output_root: PathBuf::from("pages"),
            period: Duration::from_secs(15),
            fetch: FetchSettings::default(),
        }
    }
}

/// Drives the crawl: one job per tick, one concurrent sub-job per listed
/// story, one fetch+save per comment link.
pub struct Crawler {
    config: CrawlConfig,
    fetcher: Fetcher,
    store: PageStore,
    state: Arc<CrawlState>,
    next_job: AtomicU64,
}

impl Crawler {
    pub fn new(config: CrawlConfig) -> Result<Self, CrawlError> {
        let state = Arc::new(CrawlState::new());
        let transport = Arc::new(ReqwestTransport::new(config.fetch.attempt_timeout)?);
        let fetcher = Fetcher::new(transport, Arc::clone(&state), config.fetch.clone());
        let store = PageStore::new(config.output_root.clone());
        Ok(Self {
            config,
            fetcher,
            store,
            state,
            next_job: AtomicU64::new(1),
        })
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    /// Runs forever on the configured period. Each tick spawns one
    /// fire-and-forget job; a slow job overlaps later ticks instead of
    /// delaying them. Handles are kept only to watch for leaks.
    pub async fn run(self: Arc<Self>) -> Result<(), CrawlError> {
        let mut timer = tokio::time::interval(self.config.period);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut in_flight: Vec<JoinHandle<()>> = Vec::new();

        loop {
            timer.tick().await;
            in_flight.retain(|handle| !handle.is_finished());

            let job = self.next_job.fetch_add(1, Ordering::Relaxed);
            let crawler = Arc::clone(&self);
            in_flight.push(tokio::spawn(async move {
                match crawler.run_tick(job).await {
                    Ok(summary) => report(&summary),
                    Err(err) => crawl_error!("job {job}: tick failed: {err}"),
                }
            }));
            crawl_debug!("{} job(s) in flight", in_flight.len());
        }
    }

    /// One crawl tick: fetch the listing, fan out one sub-job per fresh
    /// story, wait for the fan-out, consume the job counter.
    pub async fn run_tick(self: &Arc<Self>, job: JobId) -> Result<TickSummary, CrawlError> {
        crawl_info!("job {job}: fetching listing {}", self.config.base_url);
        let listing = self.fetcher.fetch(&self.config.base_url, None).await?;
        let listing_html = match listing {
            Some(PageContent::Text(html)) => html,
            Some(PageContent::Bytes(_)) => {
                return Err(CrawlError::Listing("listing response was not text".into()));
            }
            None => {
                return Err(CrawlError::Listing(format!(
                    "cannot reach {}",
                    self.config.base_url
                )));
            }
        };

        let stories = extract_top_stories(&listing_html);
        crawl_info!("job {job}: listing holds {} stories", stories.len());
        self.state.open_job(job);

        let mut sub_jobs = JoinSet::new();
        for story in stories {
            let url = self.normalize_story_url(&story.url);
            if url.is_empty() || self.state.is_known(&url) {
                continue;
            }
            let crawler = Arc::clone(self);
            let story = Story {
                thread_id: story.thread_id,
                url,
            };
            sub_jobs.spawn(async move { crawler.crawl_story(job, story).await });
        }
        while let Some(finished) = sub_jobs.join_next().await {
            if let Err(err) = finished {
                crawl_warn!("job {job}: sub-job aborted: {err}");
            }
        }

        let downloaded = self.state.take_job_count(job);
        let errors = self.state.errors_snapshot();
        Ok(TickSummary {
            job_id: job,
            downloaded,
            errors,
        })
    }

    /// Discussion links on the listing are relative ("item?id=123");
    /// everything else is already absolute.
    fn normalize_story_url(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        if trimmed.contains("item?id=") && !trimmed.starts_with(&self.config.base_url) {
            format!("{}{}", self.config.base_url, trimmed)
        } else {
            trimmed.to_string()
        }
    }

    /// Sub-job for one story: its page plus every page linked from
    /// top-level comments. The story-page fetch starts before the thread
    /// page is awaited; all saves complete before the sub-job does.
    async fn crawl_story(self: Arc<Self>, job: JobId, story: Story) {
        let mut saves = JoinSet::new();

        {
            let crawler = Arc::clone(&self);
            let url = story.url.clone();
            saves.spawn(async move {
                let folder = url.clone();
                crawler.fetch_and_save(job, url, folder).await;
            });
        }

        let thread_url = format!("{}item?id={}", self.config.base_url, story.thread_id);
        match self.fetcher.fetch(&thread_url, None).await {
            Ok(Some(PageContent::Text(comment_html))) => {
                for link in extract_comment_links(&comment_html) {
                    if self.state.is_known(&link) {
                        continue;
                    }
                    let crawler = Arc::clone(&self);
                    let folder = story.url.clone();
                    saves.spawn(async move {
                        crawler.fetch_and_save(job, link, folder).await;
                    });
                }
            }
            Ok(Some(PageContent::Bytes(_))) => {
                crawl_warn!("job {job}: thread page {thread_url} was not text, skipping links");
            }
            Ok(None) => {
                // exhausted retries; already blacklisted and recorded
            }
            Err(err) => {
                crawl_error!("job {job}: fetching {thread_url} failed: {err}");
            }
        }

        while let Some(finished) = saves.join_next().await {
            if let Err(err) = finished {
                crawl_warn!("job {job}: save task aborted: {err}");
            }
        }
    }

    /// Fetches one URL on the job's behalf and persists the content.
    /// Failures only cost this URL; siblings keep running.
    async fn fetch_and_save(&self, job: JobId, url: String, folder_hint: String) {
        let content = match self.fetcher.fetch(&url, Some(job)).await {
            Ok(Some(content)) => content,
            Ok(None) => return,
            Err(err) => {
                crawl_error!("job {job}: fetching {url} failed: {err}");
                return;
            }
        };
        match self.store.save(&folder_hint, &url, &content).await {
            Ok(SaveOutcome::Written(path)) => {
                crawl_debug!("job {job}: wrote {}", path.display());
            }
            Ok(SaveOutcome::Skipped(path)) => {
                crawl_debug!("job {job}: {} already saved", path.display());
            }
            Err(err) => {
                crawl_error!("job {job}: saving {url} failed: {err}");
            }
        }
    }
}

fn report(summary: &TickSummary) {
    crawl_info!(
        "job {}: {} resources downloaded this tick",
        summary.job_id,
        summary.downloaded
    );
    if !summary.errors.is_empty() {
        crawl_info!(
            "job {}: {} URL(s) permanently failed so far",
            summary.job_id,
            summary.errors.len()
        );
        for (url, message) in &summary.errors {
            crawl_warn!("  {url}: {message}");
        }
    }
}
