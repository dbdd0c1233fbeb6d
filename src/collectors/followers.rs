use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::{upsert_each_page, Collector, CollectorKind, CollectorReport, FOLLOWERS_ENDPOINT};
use crate::error::Result;
use crate::github::GitHubClient;
use crate::models::FollowerRecord;
use crate::store::SyncStore;
use crate::types::GitHubUser;

pub struct FollowersCollector {
    store: Arc<dyn SyncStore>,
}

impl FollowersCollector {
    pub fn new(store: Arc<dyn SyncStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Collector for FollowersCollector {
    fn kind(&self) -> CollectorKind {
        CollectorKind::Followers
    }

    async fn collect(&self, user_id: &str, github: &GitHubClient) -> Result<CollectorReport> {
        let mut report = CollectorReport::new(self.kind());

        upsert_each_page(
            self.store.as_ref(),
            github,
            FOLLOWERS_ENDPOINT,
            &mut report,
            |user: GitHubUser| FollowerRecord {
                user_id: user_id.to_string(),
                follower_user_id: user.id,
                follower_user_name: user.login,
                url: user.html_url,
            },
        )
        .await?;

        info!(user_id, followers = report.rows_written, "Stored followers");
        Ok(report)
    }
}
