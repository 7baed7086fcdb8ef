//! Document text extraction.
//!
//! The `DocumentDecoder` trait decouples extraction from any concrete
//! decode backend (in-memory stub, a PDF library, a platform viewer).
//! `Extractor` composes the decoder's per-page output into the single
//! string the session controller commits to the ingested region; it never
//! writes a region itself.

pub mod stub;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{LumaError, Result};

/// How the uploaded bytes should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Bytes are the text itself.
    PlainText,
    /// Bytes are a paginated document; text is gathered page by page.
    PaginatedDocument,
}

/// Contract for document decode capabilities.
///
/// Pages are numbered 1..=N. Implementations may take arbitrary time per
/// page; the extractor tolerates any completion order.
#[async_trait]
pub trait DocumentDecoder: Send + Sync {
    /// Number of pages in the document.
    ///
    /// # Errors
    /// Returns `LumaError::Decode` if the bytes cannot be parsed.
    async fn page_count(&self, bytes: &[u8]) -> Result<usize>;

    /// Text content of one page.
    async fn page_text(&self, bytes: &[u8], page: usize) -> Result<String>;
}

/// Shared counters observable while an extraction job runs.
#[derive(Debug, Default)]
pub struct ExtractionCounters {
    pub pages_total: AtomicUsize,
    pub pages_done: AtomicUsize,
}

impl ExtractionCounters {
    /// (total, done) snapshot.
    pub fn snapshot(&self) -> (usize, usize) {
        (
            self.pages_total.load(Ordering::Relaxed),
            self.pages_done.load(Ordering::Relaxed),
        )
    }
}

/// Turns raw file bytes into one plain-text string.
pub struct Extractor {
    decoder: Arc<dyn DocumentDecoder>,
}

impl Extractor {
    pub fn new(decoder: Arc<dyn DocumentDecoder>) -> Self {
        Self { decoder }
    }

    /// Extract the text of `bytes` interpreted as `kind`.
    ///
    /// Paginated documents fetch all pages concurrently, but the composed
    /// text always follows page order: page N's text is never appended
    /// before page N-1's. Page texts are joined with a single space.
    ///
    /// # Errors
    /// `LumaError::Decode` when the bytes cannot be parsed as `kind`
    /// (invalid UTF-8, corrupt document, no pages).
    pub async fn extract(
        &self,
        bytes: &[u8],
        kind: SourceKind,
        counters: &ExtractionCounters,
    ) -> Result<String> {
        match kind {
            SourceKind::PlainText => {
                counters.pages_total.store(1, Ordering::Relaxed);
                let text = String::from_utf8(bytes.to_vec())
                    .map_err(|e| LumaError::Decode(format!("not valid UTF-8 text: {e}")))?;
                counters.pages_done.store(1, Ordering::Relaxed);
                debug!(chars = text.len(), "decoded plain text upload");
                Ok(text)
            }
            SourceKind::PaginatedDocument => {
                let total = self.decoder.page_count(bytes).await?;
                if total == 0 {
                    return Err(LumaError::Decode("document has no pages".into()));
                }
                counters.pages_total.store(total, Ordering::Relaxed);
                info!(pages = total, "extracting paginated document");

                let fetches = (1..=total).map(|page| async move {
                    let text = self.decoder.page_text(bytes, page).await;
                    counters.pages_done.fetch_add(1, Ordering::Relaxed);
                    (page, text)
                });

                // Completion order is not page order; commit strictly by
                // page index before concatenating.
                let mut pages: Vec<(usize, Result<String>)> = join_all(fetches).await;
                pages.sort_by_key(|(page, _)| *page);

                let mut texts = Vec::with_capacity(total);
                for (page, text) in pages {
                    let text = text?;
                    debug!(page, chars = text.len(), "page text gathered");
                    texts.push(text);
                }
                Ok(texts.join(" "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::stub::StubDecoder;
    use super::*;

    use std::time::Duration;

    fn paged(pages: &[&str]) -> Extractor {
        Extractor::new(Arc::new(StubDecoder::new(
            pages.iter().map(|p| p.to_string()).collect(),
        )))
    }

    #[tokio::test]
    async fn plain_text_decodes_utf8_directly() {
        let extractor = paged(&[]);
        let counters = ExtractionCounters::default();
        let text = extractor
            .extract("hej världen".as_bytes(), SourceKind::PlainText, &counters)
            .await
            .expect("plain text decode");
        assert_eq!(text, "hej världen");
        assert_eq!(counters.snapshot(), (1, 1));
    }

    #[tokio::test]
    async fn plain_text_rejects_invalid_utf8() {
        let extractor = paged(&[]);
        let counters = ExtractionCounters::default();
        let err = extractor
            .extract(&[0xff, 0xfe, 0x00], SourceKind::PlainText, &counters)
            .await
            .expect_err("invalid bytes must fail");
        assert!(matches!(err, LumaError::Decode(_)));
    }

    #[tokio::test]
    async fn pages_compose_in_page_order_despite_completion_order() {
        // First page is the slowest: completion order is C, B, A.
        let decoder = StubDecoder::new(vec!["A".into(), "B".into(), "C".into()])
            .with_page_delays(vec![
                Duration::from_millis(30),
                Duration::from_millis(10),
                Duration::ZERO,
            ]);
        let extractor = Extractor::new(Arc::new(decoder));
        let counters = ExtractionCounters::default();
        let text = extractor
            .extract(b"doc", SourceKind::PaginatedDocument, &counters)
            .await
            .expect("paginated decode");
        assert_eq!(text, "A B C");
        assert_eq!(counters.snapshot(), (3, 3));
    }

    #[tokio::test]
    async fn zero_page_document_is_a_decode_error() {
        let extractor = paged(&[]);
        let counters = ExtractionCounters::default();
        let err = extractor
            .extract(b"doc", SourceKind::PaginatedDocument, &counters)
            .await
            .expect_err("empty document must fail");
        assert!(matches!(err, LumaError::Decode(_)));
    }

    #[tokio::test]
    async fn page_failure_propagates_as_decode_error() {
        let decoder = StubDecoder::new(vec!["only page".into()]).failing_on_page(1);
        let extractor = Extractor::new(Arc::new(decoder));
        let counters = ExtractionCounters::default();
        let err = extractor
            .extract(b"doc", SourceKind::PaginatedDocument, &counters)
            .await
            .expect_err("failing page must fail the job");
        assert!(matches!(err, LumaError::Decode(_)));
    }
}
