//! Headless crawler binary: periodically mirrors a news site's top
//! stories and comment-linked pages to local storage.

mod config;
mod logging;

use std::process::ExitCode;
use std::sync::Arc;

use crawl_logging::{crawl_error, crawl_info};
use crawler_engine::Crawler;

use config::AppConfig;

fn main() -> ExitCode {
    let config = AppConfig::from_env();
    logging::initialize(&config);

    crawl_info!(
        "starting page downloads into {}",
        config.crawl.output_root.display()
    );

    // One logical thread of control; all concurrency is cooperative.
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            crawl_error!("failed to start runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    let crawler = match Crawler::new(config.crawl) {
        Ok(crawler) => Arc::new(crawler),
        Err(err) => {
            crawl_error!("failed to initialize crawler: {err}");
            return ExitCode::FAILURE;
        }
    };

    // Per-URL and per-tick failures are handled inside the loop; an error
    // escaping it is fatal for the process.
    if let Err(err) = runtime.block_on(crawler.run()) {
        crawl_error!("crawler stopped: {err}");
        return ExitCode::FAILURE;
    }

    crawl_info!("finished page downloads");
    ExitCode::SUCCESS
}
