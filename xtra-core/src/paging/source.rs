//! Cursor-driven data sources with provider fallback.

use std::sync::Arc;

use async_trait::async_trait;
use futures::Stream;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use xtra_sources::{Page, SourceError};

use super::fallback::{Attempt, attempt_in_order};
use super::provider::{ApiPref, ApiProvider, PageCursor};

/// Default number of items requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 30;

#[derive(Debug, Error)]
pub enum PageError {
    #[error("all providers failed: {}", describe_causes(.0))]
    AllProvidersFailed(Vec<(ApiProvider, SourceError)>),

    #[error("no providers configured")]
    NoProviders,

    #[error("page load cancelled")]
    Cancelled,
}

impl PageError {
    /// Provider failures are transient from the caller's point of view.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::AllProvidersFailed(_))
    }

    pub fn causes(&self) -> &[(ApiProvider, SourceError)] {
        match self {
            Self::AllProvidersFailed(causes) => causes,
            _ => &[],
        }
    }
}

fn describe_causes(causes: &[(ApiProvider, SourceError)]) -> String {
    causes
        .iter()
        .map(|(provider, e)| format!("{provider}: {e}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Issues one provider call for a fixed feature.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    type Item: Send;

    async fn fetch(
        &self,
        provider: ApiProvider,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<Page<Self::Item>, SourceError>;
}

/// A page together with where it came from and how to continue.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedPage<T> {
    pub items: Vec<T>,
    /// `None` marks the end of the sequence.
    pub next: Option<PageCursor>,
    pub provider: ApiProvider,
}

impl<T> LoadedPage<T> {
    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }
}

pub struct PagedDataSource<F> {
    fetcher: F,
    pref: ApiPref,
    page_size: u32,
}

impl<F: PageFetcher> PagedDataSource<F> {
    pub fn new(fetcher: F, pref: ApiPref) -> Self {
        Self {
            fetcher,
            pref,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn pref(&self) -> &ApiPref {
        &self.pref
    }

    /// Load one page.
    ///
    /// Without a cursor every preferred provider is tried in order. A cursor
    /// only makes sense to the provider that issued it, so continuations go
    /// to that provider alone.
    pub async fn load_page(
        &self,
        cursor: Option<&PageCursor>,
    ) -> Result<LoadedPage<F::Item>, PageError> {
        let pinned;
        let candidates = match cursor {
            Some(cursor) => {
                pinned = [cursor.provider];
                &pinned[..]
            }
            None => self.pref.providers(),
        };
        if candidates.is_empty() {
            return Err(PageError::NoProviders);
        }

        let token = cursor.map(|c| c.token.as_str());
        let outcome = attempt_in_order(candidates, |provider| {
            debug!(%provider, ?token, "loading page");
            self.fetcher.fetch(provider, token, self.page_size)
        })
        .await;

        match outcome {
            Attempt::Succeeded {
                provider,
                value,
                failures,
            } => {
                for (failed, e) in &failures {
                    warn!(provider = %failed, error = %e, fallback = %provider, "provider failed, fell back");
                }
                Ok(LoadedPage {
                    next: value.cursor.map(|token| PageCursor::new(provider, token)),
                    items: value.items,
                    provider,
                })
            }
            Attempt::AllFailed(causes) => {
                warn!(error = %describe_causes(&causes), "every provider failed");
                Err(PageError::AllProvidersFailed(causes))
            }
        }
    }

    /// Like [`load_page`](Self::load_page), abandoned as soon as `cancel` fires.
    pub async fn load_page_cancellable(
        &self,
        cursor: Option<&PageCursor>,
        cancel: &CancellationToken,
    ) -> Result<LoadedPage<F::Item>, PageError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PageError::Cancelled),
            result = self.load_page(cursor) => result,
        }
    }
}

/// Forward-only reader over a [`PagedDataSource`].
///
/// Owns the cursor, so pages come out strictly in cursor order. A failed or
/// cancelled load leaves the cursor where it was and can be retried.
pub struct Pager<F> {
    source: Arc<PagedDataSource<F>>,
    cursor: Option<PageCursor>,
    finished: bool,
    cancel: CancellationToken,
}

impl<F: PageFetcher + 'static> Pager<F> {
    pub fn new(source: Arc<PagedDataSource<F>>) -> Self {
        Self::with_cancellation(source, CancellationToken::new())
    }

    pub fn with_cancellation(source: Arc<PagedDataSource<F>>, cancel: CancellationToken) -> Self {
        Self {
            source,
            cursor: None,
            finished: false,
            cancel,
        }
    }

    /// Resume from a cursor saved earlier.
    pub fn resume(source: Arc<PagedDataSource<F>>, cursor: PageCursor) -> Self {
        let mut pager = Self::new(source);
        pager.cursor = Some(cursor);
        pager
    }

    pub fn cursor(&self) -> Option<&PageCursor> {
        self.cursor.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Load the next page, or `None` once the end marker has been seen.
    pub async fn next_page(&mut self) -> Result<Option<LoadedPage<F::Item>>, PageError> {
        if self.finished {
            return Ok(None);
        }
        let page = self
            .source
            .load_page_cancellable(self.cursor.as_ref(), &self.cancel)
            .await?;
        self.cursor = page.next.clone();
        self.finished = page.next.is_none();
        Ok(Some(page))
    }

    /// Pages as a stream. The stream ends after the last page or the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<LoadedPage<F::Item>, PageError>> {
        futures::stream::unfold(Some(self), |state| async move {
            let mut pager = state?;
            match pager.next_page().await {
                Ok(Some(page)) => Some((Ok(page), Some(pager))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }
}
