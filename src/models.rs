use serde::{Deserialize, Serialize};
use surrealdb::sql::Datetime;
use surrealdb::RecordId;
use uuid::Uuid;

use crate::store::Record;

/// Tables written by the collectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Stars,
    Follows,
    Followers,
    Languages,
    NetworkStars,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Stars => "github_stars",
            Table::Follows => "github_follows",
            Table::Followers => "github_followers",
            Table::Languages => "github_languages",
            Table::NetworkStars => "github_network_stars",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A repository starred by the syncing user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarRecord {
    pub user_id: String,
    pub repo_id: i64,
    pub repo_name: String,
    pub repo_url: String,
}

impl Record for StarRecord {
    const TABLE: Table = Table::Stars;
    const CONFLICT_KEYS: &'static [&'static str] = &["user_id", "repo_id"];
}

/// A GitHub account the syncing user follows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowRecord {
    pub user_id: String,
    pub followed_user_id: i64,
    pub followed_user_name: String,
    pub url: String,
}

impl Record for FollowRecord {
    const TABLE: Table = Table::Follows;
    const CONFLICT_KEYS: &'static [&'static str] = &["user_id", "followed_user_id"];
}

/// A GitHub account following the syncing user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowerRecord {
    pub user_id: String,
    pub follower_user_id: i64,
    pub follower_user_name: String,
    pub url: String,
}

impl Record for FollowerRecord {
    const TABLE: Table = Table::Followers;
    const CONFLICT_KEYS: &'static [&'static str] = &["user_id", "follower_user_id"];
}

/// How many of the user's owned repositories use a language.
/// `frequency` is the fresh total of the latest sync, never an increment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageFrequency {
    pub user_id: String,
    pub language: String,
    pub frequency: u32,
}

impl Record for LanguageFrequency {
    const TABLE: Table = Table::Languages;
    const CONFLICT_KEYS: &'static [&'static str] = &["user_id", "language"];
}

/// Who a network star belongs to.
///
/// Rows are written `Unclaimed` while syncing someone else's network; the
/// only transition to `Registered` is `SyncCoordinator::merge_network_stars`.
/// Both variants are stored in the `user_id` column, tagged by `owner_status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "owner_status", rename_all = "snake_case")]
pub enum StarOwner {
    Registered {
        user_id: String,
    },
    Unclaimed {
        #[serde(rename = "user_id")]
        placeholder_id: Uuid,
    },
}

impl StarOwner {
    pub fn unclaimed() -> Self {
        StarOwner::Unclaimed {
            placeholder_id: Uuid::new_v4(),
        }
    }

    pub fn is_registered(&self) -> bool {
        matches!(self, StarOwner::Registered { .. })
    }

    /// Value of the `user_id` column
    pub fn key(&self) -> String {
        match self {
            StarOwner::Registered { user_id } => user_id.clone(),
            StarOwner::Unclaimed { placeholder_id } => placeholder_id.to_string(),
        }
    }
}

/// A repository starred by a followed GitHub user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkStarRecord {
    #[serde(flatten)]
    pub owner: StarOwner,
    pub github_user_id: i64,
    pub github_username: String,
    pub repo_id: i64,
    pub repo_name: String,
    pub repo_url: String,
}

impl Record for NetworkStarRecord {
    const TABLE: Table = Table::NetworkStars;
    // The placeholder changes between runs, so it cannot be part of the key
    const CONFLICT_KEYS: &'static [&'static str] = &["github_user_id", "repo_id"];
}

/// GitHub account information from SurrealDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: RecordId,
    #[serde(rename = "access_token")]
    pub access_token: String,
    #[serde(rename = "userId")]
    pub user_id: RecordId,
    #[serde(rename = "providerId")]
    pub provider_id: String,
    /// GitHub's numeric user id, as a string
    #[serde(rename = "providerAccountId")]
    pub provider_account_id: String,
    pub scope: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Datetime,
    #[serde(rename = "updatedAt")]
    pub updated_at: Datetime,
}

/// A GitHub account linked to an app user, ready to be synced
#[derive(Clone)]
pub struct LinkedAccount {
    pub user_id: String,
    pub github_user_id: Option<i64>,
    pub access_token: String,
    /// Set for accounts linked while the service is running
    pub is_new: bool,
}

impl std::fmt::Debug for LinkedAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkedAccount")
            .field("user_id", &self.user_id)
            .field("github_user_id", &self.github_user_id)
            .field("access_token", &"<redacted>")
            .field("is_new", &self.is_new)
            .finish()
    }
}

impl LinkedAccount {
    pub fn from_account(account: Account, is_new: bool) -> Self {
        Self {
            user_id: account.user_id.key().to_string(),
            github_user_id: account.provider_account_id.parse().ok(),
            access_token: account.access_token,
            is_new,
        }
    }
}

/// Rate limit state reported by the last GitHub response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitState {
    pub remaining: u32,
    pub limit: u32,
    pub reset_time: chrono::DateTime<chrono::Utc>,
    pub is_limited: bool,
}
