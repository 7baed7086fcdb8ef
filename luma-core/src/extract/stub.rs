//! `StubDecoder` — in-memory paginated document backend.
//!
//! Stands in for a real PDF/document library so the ingestion path can be
//! exercised end-to-end without platform decode support. Optional per-page
//! delays let tests script any completion order.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{LumaError, Result};
use crate::extract::DocumentDecoder;

pub struct StubDecoder {
    pages: Vec<String>,
    page_delays: Vec<Duration>,
    failing_page: Option<usize>,
}

impl StubDecoder {
    pub fn new(pages: Vec<String>) -> Self {
        Self {
            pages,
            page_delays: Vec::new(),
            failing_page: None,
        }
    }

    /// Delay delivery of each page by the matching duration (pages without
    /// an entry return immediately).
    pub fn with_page_delays(mut self, delays: Vec<Duration>) -> Self {
        self.page_delays = delays;
        self
    }

    /// Make one page fail its text request.
    pub fn failing_on_page(mut self, page: usize) -> Self {
        self.failing_page = Some(page);
        self
    }
}

#[async_trait]
impl DocumentDecoder for StubDecoder {
    async fn page_count(&self, bytes: &[u8]) -> Result<usize> {
        if bytes.is_empty() {
            return Err(LumaError::Decode("empty document".into()));
        }
        Ok(self.pages.len())
    }

    async fn page_text(&self, _bytes: &[u8], page: usize) -> Result<String> {
        if let Some(delay) = self.page_delays.get(page.saturating_sub(1)) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing_page == Some(page) {
            return Err(LumaError::Decode(format!("page {page} is unreadable")));
        }
        self.pages
            .get(page - 1)
            .cloned()
            .ok_or_else(|| LumaError::Decode(format!("page {page} out of range")))
    }
}
