use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
/// GitHub's maximum page size
pub const MAX_PER_PAGE: u32 = 100;
pub const DEFAULT_FOLLOW_LIMIT: usize = 20;

/// Settings shared by the GitHub client and the collectors
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub api_base_url: String,
    /// Items requested per page; a shorter page ends pagination
    pub per_page: u32,
    /// How many followed users the network stars collector visits
    pub follow_limit: usize,
    pub request_timeout: Duration,
    /// Deadline for a whole `sync_all` run, applied by callers
    pub sync_timeout: Option<Duration>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            per_page: MAX_PER_PAGE,
            follow_limit: DEFAULT_FOLLOW_LIMIT,
            request_timeout: Duration::from_secs(30),
            sync_timeout: None,
        }
    }
}

impl SyncConfig {
    /// Config pointed at another API root, e.g. a GitHub Enterprise host or a mock server
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.clamp(1, MAX_PER_PAGE);
        self
    }

    pub fn with_follow_limit(mut self, limit: usize) -> Self {
        self.follow_limit = limit;
        self
    }

    pub fn with_sync_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.sync_timeout = timeout;
        self
    }
}
