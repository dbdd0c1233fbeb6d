use serde::Deserialize;

// GitHub API response structures

/// Entry of `/user/starred` and `/users/{login}/starred`
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRepo {
    pub id: i64,
    pub full_name: String,
    pub html_url: String,
}

/// Entry of `/user/following` and `/user/followers`
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubUser {
    pub id: i64,
    pub login: String,
    pub html_url: String,
}

/// Entry of `/user/repos?type=owner`; only the language matters here
#[derive(Debug, Clone, Deserialize)]
pub struct OwnedRepo {
    pub language: Option<String>,
}
