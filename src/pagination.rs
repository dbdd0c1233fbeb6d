//! Sequential page walking over a GitHub listing.
//!
//! `Start -> Fetch(page) -> { Empty | PartialPage: Stop ; FullPage: Fetch(page + 1) }`.
//! An upstream error ends the walk and is handed to the caller.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::Result;
use crate::github::GitHubClient;

pub struct Paginator<'a, T> {
    client: &'a GitHubClient,
    endpoint: String,
    next_page: u32,
    pages_fetched: u32,
    done: bool,
    _item: PhantomData<T>,
}

impl<'a, T: DeserializeOwned> Paginator<'a, T> {
    pub fn new(client: &'a GitHubClient, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            next_page: 1,
            pages_fetched: 0,
            done: false,
            _item: PhantomData,
        }
    }

    /// Next non-empty page, or `None` once the listing is exhausted
    pub async fn next_page(&mut self) -> Result<Option<Vec<T>>> {
        if self.done {
            return Ok(None);
        }

        let page = match self.client.fetch_page::<T>(&self.endpoint, self.next_page).await {
            Ok(page) => page,
            Err(e) => {
                self.done = true;
                return Err(e);
            }
        };
        self.pages_fetched += 1;

        debug!(
            endpoint = %self.endpoint,
            page = page.number,
            items = page.items.len(),
            "Fetched page"
        );

        if page.is_last {
            self.done = true;
        } else {
            self.next_page += 1;
        }

        if page.items.is_empty() {
            return Ok(None);
        }
        Ok(Some(page.items))
    }

    /// Drain every remaining page into one vector
    pub async fn collect_all(&mut self) -> Result<Vec<T>> {
        let mut all = Vec::new();
        while let Some(items) = self.next_page().await? {
            all.extend(items);
        }
        Ok(all)
    }

    /// Requests issued so far
    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    pub fn is_done(&self) -> bool {
        self.done
    }
}
