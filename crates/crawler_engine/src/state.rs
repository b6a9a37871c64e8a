use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use crate::types::JobId;

/// Shared crawl history: URLs that ever succeeded, URLs that permanently
/// failed, the last error per failed URL, and per-job download counters.
///
/// A single mutex guards the whole record and is never held across an
/// await point, so every update is one atomic step regardless of how
/// tasks interleave.
#[derive(Debug, Default)]
pub struct CrawlState {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    downloaded: HashSet<String>,
    blacklist: HashSet<String>,
    errors: HashMap<String, String>,
    job_counts: HashMap<JobId, u64>,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the URL was ever downloaded or permanently failed. Known
    /// URLs are never fetched again for the lifetime of the process.
    pub fn is_known(&self, url: &str) -> bool {
        let inner = self.lock();
        inner.downloaded.contains(url) || inner.blacklist.contains(url)
    }

    pub fn is_blacklisted(&self, url: &str) -> bool {
        self.lock().blacklist.contains(url)
    }

    /// Registers a successful download, attributing it to `job` if given.
    pub fn mark_downloaded(&self, url: &str, job: Option<JobId>) {
        let mut inner = self.lock();
        inner.downloaded.insert(url.to_string());
        if let Some(job) = job {
            *inner.job_counts.entry(job).or_insert(0) += 1;
        }
    }

    /// Records retry exhaustion: the URL joins the blacklist and the error
    /// map keeps its last error message.
    pub fn mark_failed(&self, url: &str, message: &str) {
        let mut inner = self.lock();
        inner.blacklist.insert(url.to_string());
        inner.errors.insert(url.to_string(), message.to_string());
    }

    /// Opens the download counter for a new job at zero.
    pub fn open_job(&self, job: JobId) {
        self.lock().job_counts.insert(job, 0);
    }

    /// Consumes a job's download counter. Each job is read exactly once;
    /// a second read is a caller bug and panics.
    pub fn take_job_count(&self, job: JobId) -> u64 {
        self.lock()
            .job_counts
            .remove(&job)
            .unwrap_or_else(|| panic!("job {job} counter consumed twice or never opened"))
    }

    /// Sorted snapshot of all (url, last error) pairs recorded so far.
    pub fn errors_snapshot(&self) -> Vec<(String, String)> {
        let inner = self.lock();
        let mut pairs: Vec<_> = inner
            .errors
            .iter()
            .map(|(url, message)| (url.clone(), message.clone()))
            .collect();
        pairs.sort();
        pairs
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
