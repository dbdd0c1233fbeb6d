use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::{upsert_each_page, Collector, CollectorKind, CollectorReport, FOLLOWING_ENDPOINT};
use crate::error::Result;
use crate::github::GitHubClient;
use crate::models::FollowRecord;
use crate::store::SyncStore;
use crate::types::GitHubUser;

pub struct FollowsCollector {
    store: Arc<dyn SyncStore>,
}

impl FollowsCollector {
    pub fn new(store: Arc<dyn SyncStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Collector for FollowsCollector {
    fn kind(&self) -> CollectorKind {
        CollectorKind::Follows
    }

    async fn collect(&self, user_id: &str, github: &GitHubClient) -> Result<CollectorReport> {
        let mut report = CollectorReport::new(self.kind());

        upsert_each_page(
            self.store.as_ref(),
            github,
            FOLLOWING_ENDPOINT,
            &mut report,
            |user: GitHubUser| FollowRecord {
                user_id: user_id.to_string(),
                followed_user_id: user.id,
                followed_user_name: user.login,
                url: user.html_url,
            },
        )
        .await?;

        info!(user_id, follows = report.rows_written, "Stored followed users");
        Ok(report)
    }
}
