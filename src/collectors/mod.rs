//! One collector per GitHub resource type.
//!
//! Collectors are independent: each owns its pagination loop and its upserts
//! and shares nothing mutable with the others.

pub mod followers;
pub mod follows;
pub mod languages;
pub mod network_stars;
pub mod stars;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};
use crate::github::GitHubClient;
use crate::pagination::Paginator;
use crate::store::{upsert_records, Record, SyncStore};

pub use followers::FollowersCollector;
pub use follows::FollowsCollector;
pub use languages::LanguagesCollector;
pub use network_stars::NetworkStarsCollector;
pub use stars::StarsCollector;

pub const STARRED_ENDPOINT: &str = "/user/starred";
pub const FOLLOWING_ENDPOINT: &str = "/user/following";
pub const FOLLOWERS_ENDPOINT: &str = "/user/followers";
pub const OWNED_REPOS_ENDPOINT: &str = "/user/repos?type=owner";

pub fn user_starred_endpoint(login: &str) -> String {
    format!("/users/{}/starred", login)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectorKind {
    Stars,
    Follows,
    Followers,
    Languages,
    NetworkStars,
}

impl std::fmt::Display for CollectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CollectorKind::Stars => "stars",
            CollectorKind::Follows => "follows",
            CollectorKind::Followers => "followers",
            CollectorKind::Languages => "languages",
            CollectorKind::NetworkStars => "network_stars",
        };
        f.write_str(name)
    }
}

/// A followed user whose stars could not be collected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedUser {
    pub github_user_id: i64,
    pub login: String,
    pub error: String,
}

/// What a successful collector run did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectorReport {
    pub kind: CollectorKind,
    pub pages_fetched: u32,
    pub rows_written: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_users: Vec<SkippedUser>,
}

impl CollectorReport {
    pub fn new(kind: CollectorKind) -> Self {
        Self {
            kind,
            pages_fetched: 0,
            rows_written: 0,
            skipped_users: Vec::new(),
        }
    }
}

#[async_trait]
pub trait Collector: Send + Sync {
    fn kind(&self) -> CollectorKind;

    /// Fetch this resource for `user_id` and persist it
    async fn collect(&self, user_id: &str, github: &GitHubClient) -> Result<CollectorReport>;
}

/// Walk `endpoint`, mapping each page to records and upserting it before
/// requesting the next one.
pub(crate) async fn upsert_each_page<T, R, F>(
    store: &dyn SyncStore,
    github: &GitHubClient,
    endpoint: &str,
    report: &mut CollectorReport,
    map: F,
) -> Result<()>
where
    T: DeserializeOwned + Send,
    R: Record + Send + Sync,
    F: Fn(T) -> R + Send + Sync,
{
    let mut pages = Paginator::<T>::new(github, endpoint);
    let outcome = async {
        while let Some(items) = pages.next_page().await? {
            let records: Vec<R> = items.into_iter().map(&map).collect();
            report.rows_written += upsert_records(store, &records).await?;
        }
        Ok::<(), SyncError>(())
    }
    .await;
    report.pages_fetched += pages.pages_fetched();
    outcome
}
