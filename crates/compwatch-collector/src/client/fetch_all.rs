//! Multi-page collection loop for `ApiClient`.

use compwatch_core::{PaginationMode, RawRecord};
use reqwest::Url;

use crate::error::CollectionError;
use crate::pagination::extract_next_link;
use crate::parse::{map_item, Page};

use super::ApiClient;

/// Every record of one collection run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collected {
    pub records: Vec<RawRecord>,
    pub pages: usize,
    /// Retries spent across all pages.
    pub retries: u32,
}

impl Collected {
    fn push_page(&mut self, page: &Page, retries: u32, collected_at: &str) {
        self.pages += 1;
        self.retries += retries;
        self.records
            .extend(page.items.iter().map(|item| map_item(item, collected_at)));
        tracing::info!(
            page = self.pages,
            records = page.items.len(),
            retries,
            "page fetched"
        );
    }
}

impl ApiClient {
    /// Fetches every page according to the configured pagination mode.
    ///
    /// **All-or-nothing**: if any page fails, records from earlier pages are
    /// discarded and the error is returned, so a partial catalogue is never
    /// persisted as if it were complete.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`ApiClient::fetch_page`]. Returns
    /// [`CollectionError::PaginationLimit`] when more than `max_pages` pages
    /// would be requested.
    pub async fn fetch_all(&self, collected_at: &str) -> Result<Collected, CollectionError> {
        match self.pagination {
            PaginationMode::None => {
                let mut out = Collected::default();
                let (page, _, retries) = self.fetch_page(&self.endpoint).await?;
                out.push_page(&page, retries, collected_at);
                Ok(out)
            }
            PaginationMode::Offset => self.fetch_all_offset(collected_at).await,
            PaginationMode::LinkHeader => self.fetch_all_linked(collected_at).await,
        }
    }

    fn check_page_budget(&self, fetched: usize) -> Result<(), CollectionError> {
        if fetched >= self.max_pages {
            return Err(CollectionError::PaginationLimit {
                url: self.endpoint.to_string(),
                max_pages: self.max_pages,
            });
        }
        Ok(())
    }

    async fn fetch_all_offset(&self, collected_at: &str) -> Result<Collected, CollectionError> {
        let mut out = Collected::default();
        let mut offset = 0usize;
        let page_size = self.page_size as usize;

        loop {
            self.check_page_budget(out.pages)?;
            let url = self.offset_url(offset);
            let (page, _, retries) = self.fetch_page(&url).await?;
            out.push_page(&page, retries, collected_at);

            let received = page.items.len();
            offset += received;
            let reached_total = page.total.is_some_and(|total| offset as u64 >= total);
            if received == 0 || received < page_size || reached_total {
                break;
            }
        }

        Ok(out)
    }

    async fn fetch_all_linked(&self, collected_at: &str) -> Result<Collected, CollectionError> {
        let mut out = Collected::default();
        let mut next: Option<Url> = Some(self.first_link_url());

        while let Some(url) = next.take() {
            self.check_page_budget(out.pages)?;
            let (page, link_header, retries) = self.fetch_page(&url).await?;
            out.push_page(&page, retries, collected_at);

            if let Some(target) = extract_next_link(link_header.as_deref()) {
                let resolved = url.join(&target).map_err(|e| CollectionError::InvalidUrl {
                    url: target.clone(),
                    reason: format!("bad next link: {e}"),
                })?;
                next = Some(resolved);
            }
        }

        Ok(out)
    }
}
