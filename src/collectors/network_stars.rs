use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info, warn};

use super::{
    upsert_each_page, user_starred_endpoint, Collector, CollectorKind, CollectorReport, SkippedUser,
    FOLLOWING_ENDPOINT,
};
use crate::error::Result;
use crate::github::GitHubClient;
use crate::models::{NetworkStarRecord, StarOwner, Table};
use crate::pagination::Paginator;
use crate::store::{from_row, SyncStore};
use crate::types::{GitHubRepo, GitHubUser};

/// Stars of the users the syncing user follows.
///
/// Followed users are visited one after another, never concurrently, and at
/// most `follow_limit` of them. A failure while collecting one followed
/// user's stars skips that user; the collector itself keeps going.
pub struct NetworkStarsCollector {
    store: Arc<dyn SyncStore>,
    follow_limit: usize,
}

impl NetworkStarsCollector {
    pub fn new(store: Arc<dyn SyncStore>, follow_limit: usize) -> Self {
        Self { store, follow_limit }
    }

    /// Page `/user/following` until `follow_limit` users are known, then truncate
    async fn followed_users(&self, github: &GitHubClient, report: &mut CollectorReport) -> Result<Vec<GitHubUser>> {
        let mut followed = Vec::new();
        if self.follow_limit == 0 {
            return Ok(followed);
        }

        let mut pages = Paginator::<GitHubUser>::new(github, FOLLOWING_ENDPOINT);
        let outcome = async {
            while followed.len() < self.follow_limit {
                match pages.next_page().await? {
                    Some(users) => followed.extend(users),
                    None => break,
                }
            }
            Ok::<(), crate::error::SyncError>(())
        }
        .await;
        report.pages_fetched += pages.pages_fetched();
        outcome?;

        followed.truncate(self.follow_limit);
        Ok(followed)
    }

    /// Owner to tag this followed user's rows with. Rows already stored for
    /// them keep their owner, so a re-sync never reverts a merge.
    async fn owner_for(&self, github_user_id: i64) -> Result<StarOwner> {
        let existing = self
            .store
            .first_where(Table::NetworkStars, "github_user_id", json!(github_user_id))
            .await?;

        match existing {
            Some(row) => Ok(from_row::<NetworkStarRecord>(row)?.owner),
            None => Ok(StarOwner::unclaimed()),
        }
    }

    async fn collect_followed_user(
        &self,
        github: &GitHubClient,
        followed: &GitHubUser,
        report: &mut CollectorReport,
    ) -> Result<()> {
        let owner = self.owner_for(followed.id).await?;
        debug!(login = %followed.login, owner = %owner.key(), "Collecting network stars");

        upsert_each_page(
            self.store.as_ref(),
            github,
            &user_starred_endpoint(&followed.login),
            report,
            |repo: GitHubRepo| NetworkStarRecord {
                owner: owner.clone(),
                github_user_id: followed.id,
                github_username: followed.login.clone(),
                repo_id: repo.id,
                repo_name: repo.full_name,
                repo_url: repo.html_url,
            },
        )
        .await
    }
}

#[async_trait]
impl Collector for NetworkStarsCollector {
    fn kind(&self) -> CollectorKind {
        CollectorKind::NetworkStars
    }

    async fn collect(&self, user_id: &str, github: &GitHubClient) -> Result<CollectorReport> {
        let mut report = CollectorReport::new(self.kind());

        let followed = self.followed_users(github, &mut report).await?;
        info!(user_id, followed = followed.len(), limit = self.follow_limit, "Collecting network stars");

        for user in &followed {
            if let Err(e) = self.collect_followed_user(github, user, &mut report).await {
                warn!(
                    user_id,
                    login = %user.login,
                    status = ?e.status(),
                    "Skipping followed user: {}",
                    e
                );
                report.skipped_users.push(SkippedUser {
                    github_user_id: user.id,
                    login: user.login.clone(),
                    error: e.to_string(),
                });
            }
        }

        info!(
            user_id,
            stars = report.rows_written,
            skipped = report.skipped_users.len(),
            "Stored network stars"
        );
        Ok(report)
    }
}
