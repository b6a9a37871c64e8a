//! Crawler engine: fetch/retry/dedup pipeline and tick orchestration.
mod decode;
mod extract;
mod fetch;
mod naming;
mod orchestrator;
mod persist;
mod state;
mod types;

pub use decode::decode_text;
pub use extract::{extract_comment_links, extract_top_stories, Story};
pub use fetch::{FetchSettings, Fetcher, RawResponse, ReqwestTransport, Transport};
pub use naming::{derived_name, NAME_MAX_LEN};
pub use orchestrator::{CrawlConfig, Crawler};
pub use persist::{PageStore, PersistError, SaveOutcome};
pub use state::CrawlState;
pub use types::{CrawlError, FailureKind, FetchError, JobId, PageContent, TickSummary};
