//! Shared test utilities for linkshelf integration tests.
//!
//! `TestHarness` wires an in-memory database, a worker pool and the bookmark
//! service around fake fetch and completion backends.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use linkshelf::{
    AiServiceError, BookmarkService, CompletionClient, ContentFetcher, ContentProcessor, Database,
    Enricher, FetchError, JobOutcome, PipelineConfig, WorkerPool,
};

/// Serves HTML per URL; unknown URLs time out.
#[derive(Default)]
pub struct FakeWeb {
    pages: HashMap<String, String>,
}

impl FakeWeb {
    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }
}

impl ContentFetcher for FakeWeb {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Timeout {
                url: url.to_string(),
                message: "operation timed out".to_string(),
            })
    }
}

/// Answers summary and tag prompts with fixed replies.
pub struct FakeModel {
    summary: Result<String, AiServiceError>,
    tags: Result<String, AiServiceError>,
    pub calls: Mutex<usize>,
}

impl FakeModel {
    pub fn new(summary: &str, tags: &str) -> Self {
        Self {
            summary: Ok(summary.to_string()),
            tags: Ok(tags.to_string()),
            calls: Mutex::new(0),
        }
    }

    pub fn failing(error: AiServiceError) -> Self {
        Self {
            summary: Err(error.clone()),
            tags: Err(error),
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl CompletionClient for FakeModel {
    fn complete(&self, system: &str, _user: &str) -> Result<String, AiServiceError> {
        *self.calls.lock().unwrap() += 1;
        if system.contains("tags") {
            self.tags.clone()
        } else {
            self.summary.clone()
        }
    }
}

pub struct TestHarness {
    pub db: Arc<Database>,
    pub pool: Arc<WorkerPool>,
    pub service: BookmarkService,
    pub model: Arc<FakeModel>,
}

impl TestHarness {
    pub fn new(web: FakeWeb, model: FakeModel, workers: usize) -> Self {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let model = Arc::new(model);
        let config = Arc::new(PipelineConfig::default());
        let processor = ContentProcessor::new(model.clone(), config.tag_count);
        let enricher = Arc::new(Enricher::new(config, db.clone(), Arc::new(web), processor));
        let pool = Arc::new(WorkerPool::new(enricher, workers).unwrap());
        let service = BookmarkService::new(db.clone(), pool.clone());

        Self {
            db,
            pool,
            service,
            model,
        }
    }

    pub fn next_outcome(&self) -> JobOutcome {
        self.pool
            .recv_result_timeout(Duration::from_secs(10))
            .expect("no job outcome within 10s")
    }

    pub fn outcomes(&self, n: usize) -> Vec<JobOutcome> {
        (0..n).map(|_| self.next_outcome()).collect()
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        self.pool.shutdown();
    }
}

pub fn article(title: &str, body: &str) -> String {
    format!(
        "<html><head><title>{}</title></head><body>\
         <nav>Home | About</nav><main><p>{}</p></main>\
         <footer>Copyright</footer><script>track()</script></body></html>",
        title, body
    )
}
