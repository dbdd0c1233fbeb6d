use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::{upsert_each_page, Collector, CollectorKind, CollectorReport, STARRED_ENDPOINT};
use crate::error::Result;
use crate::github::GitHubClient;
use crate::models::StarRecord;
use crate::store::SyncStore;
use crate::types::GitHubRepo;

/// Repositories the user has starred, upserted page by page on (user_id, repo_id)
pub struct StarsCollector {
    store: Arc<dyn SyncStore>,
}

impl StarsCollector {
    pub fn new(store: Arc<dyn SyncStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Collector for StarsCollector {
    fn kind(&self) -> CollectorKind {
        CollectorKind::Stars
    }

    async fn collect(&self, user_id: &str, github: &GitHubClient) -> Result<CollectorReport> {
        let mut report = CollectorReport::new(self.kind());

        upsert_each_page(
            self.store.as_ref(),
            github,
            STARRED_ENDPOINT,
            &mut report,
            |repo: GitHubRepo| StarRecord {
                user_id: user_id.to_string(),
                repo_id: repo.id,
                repo_name: repo.full_name,
                repo_url: repo.html_url,
            },
        )
        .await?;

        info!(user_id, stars = report.rows_written, pages = report.pages_fetched, "Stored starred repos");
        Ok(report)
    }
}
