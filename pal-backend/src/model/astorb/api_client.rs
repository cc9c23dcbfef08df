//! AstorbDB catalog client: filtered query, retry and pagination.

use chrono::NaiveDate;
use pal_common::MinorPlanetRecord;
use std::sync::Arc;
use tracing::{debug, info};

use super::query::CatalogQuery;
use super::types::decode_page;
use crate::error::{PalError, PalResult};
use crate::model::http::retry::{classify_status, run_with_retry};
use crate::model::http::{AttemptOutcome, HttpTransport, RetryPolicy};
use crate::model::sky::SkyWindow;

pub const ASTORB_GRAPHQL_URL: &str = "https://astorbdb.lowell.edu/v1/graphql";
/// Rows the service returns per page at most
pub const PAGE_SIZE: usize = 1000;

pub struct CatalogClient {
    transport: Arc<dyn HttpTransport>,
    url: String,
    page_size: usize,
    retry: RetryPolicy,
}

impl CatalogClient {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            url: ASTORB_GRAPHQL_URL.to_string(),
            page_size: PAGE_SIZE,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Every body inside `window` on `date` no fainter than `mag_limit`,
    /// ascending by catalog identifier and free of duplicates.
    pub async fn fetch(
        &self,
        window: &SkyWindow,
        date: NaiveDate,
        mag_limit: f64,
    ) -> PalResult<Vec<MinorPlanetRecord>> {
        let segments = window.ra_segments();
        let mut records = Vec::new();

        for segment in &segments {
            let query = CatalogQuery::new(*segment, window, date, mag_limit, self.page_size);
            records.extend(self.fetch_segment(query).await?);
        }

        if segments.len() > 1 {
            records.sort_by_key(|r| r.cursor());
            records.dedup_by(|a, b| a.cursor().is_some() && a.cursor() == b.cursor());
        }

        info!(
            "Catalog returned {} bodies for {} (mag <= {})",
            records.len(),
            date,
            mag_limit
        );
        Ok(records)
    }

    /// Page through one RA segment until a short page arrives.
    async fn fetch_segment(&self, first: CatalogQuery) -> PalResult<Vec<MinorPlanetRecord>> {
        let mut records: Vec<MinorPlanetRecord> = Vec::new();
        let mut query = first;
        let mut page_number = 1;

        loop {
            let page = self.fetch_page(&query).await?;
            let page_len = page.len();
            debug!(
                "Page {} for {} returned {} rows (after {:?})",
                page_number, query.date, page_len, query.after
            );

            let next_cursor = page.last().map(|r| r.cursor());
            records.extend(page);

            if page_len < self.page_size {
                return Ok(records);
            }

            let cursor = next_cursor.flatten().ok_or_else(|| {
                PalError::MalformedResponse(
                    "last row of a full page has no identifier to continue from".to_string(),
                )
            })?;
            if query.after.is_some_and(|previous| cursor <= previous) {
                return Err(PalError::MalformedResponse(format!(
                    "pagination did not advance past identifier {}",
                    cursor
                )));
            }

            query = query.after(cursor);
            page_number += 1;
        }
    }

    /// POST one query, retrying per the client's policy.
    async fn fetch_page(&self, query: &CatalogQuery) -> PalResult<Vec<MinorPlanetRecord>> {
        let body = query.to_body();
        let label = format!("AstorbDB query for {}", query.date);

        run_with_retry(&self.retry, &label, |_| {
            let transport = Arc::clone(&self.transport);
            let url = self.url.clone();
            let body = body.clone();
            async move {
                match transport.post_json(&url, &body).await {
                    Err(e) => AttemptOutcome::Retryable(format!("request failed: {:#}", e)),
                    Ok(response) if response.is_ok() => match decode_page(&response.body) {
                        Ok(page) => AttemptOutcome::Success(page),
                        Err(reason) => AttemptOutcome::Retryable(reason),
                    },
                    // Every non-200 status is retried, client errors included
                    Ok(response) => classify_status(response.status, &[]),
                }
            }
        })
        .await
    }
}
