use chrono::Utc;
use github_account_sync::models::{
    Account, FollowRecord, LanguageFrequency, LinkedAccount, NetworkStarRecord, StarOwner, StarRecord, Table,
};
use github_account_sync::store::{conflict_key, from_row, to_row, Record};
use serde_json::json;
use surrealdb::sql::Datetime;
use surrealdb::RecordId;
use uuid::Uuid;

fn account(provider_account_id: &str) -> Account {
    let now = Datetime::from(Utc::now());
    Account {
        id: RecordId::from(("account", "a1")),
        user_id: RecordId::from(("user", "abc")),
        access_token: "token123".to_string(),
        provider_id: "github".to_string(),
        provider_account_id: provider_account_id.to_string(),
        scope: Some("repo,user".to_string()),
        created_at: now.clone(),
        updated_at: now,
    }
}

#[test]
fn test_table_names() {
    assert_eq!(Table::Stars.name(), "github_stars");
    assert_eq!(Table::Follows.name(), "github_follows");
    assert_eq!(Table::Followers.name(), "github_followers");
    assert_eq!(Table::Languages.name(), "github_languages");
    assert_eq!(Table::NetworkStars.to_string(), "github_network_stars");
}

#[test]
fn test_conflict_keys() {
    assert_eq!(StarRecord::CONFLICT_KEYS, &["user_id", "repo_id"]);
    assert_eq!(FollowRecord::CONFLICT_KEYS, &["user_id", "followed_user_id"]);
    assert_eq!(LanguageFrequency::CONFLICT_KEYS, &["user_id", "language"]);
    assert_eq!(NetworkStarRecord::CONFLICT_KEYS, &["github_user_id", "repo_id"]);
}

#[test]
fn test_star_record_columns() {
    let star = StarRecord {
        user_id: "u1".to_string(),
        repo_id: 12345,
        repo_name: "rust-lang/rust".to_string(),
        repo_url: "https://github.com/rust-lang/rust".to_string(),
    };

    let row = to_row(&star).unwrap();
    assert_eq!(row["user_id"], json!("u1"));
    assert_eq!(row["repo_id"], json!(12345));
    assert_eq!(conflict_key(&row, StarRecord::CONFLICT_KEYS).unwrap(), "u1:12345");
}

#[test]
fn test_unclaimed_owner_is_stored_in_user_id() {
    let placeholder_id = Uuid::new_v4();
    let star = NetworkStarRecord {
        owner: StarOwner::Unclaimed { placeholder_id },
        github_user_id: 42,
        github_username: "octocat".to_string(),
        repo_id: 7,
        repo_name: "octocat/Hello-World".to_string(),
        repo_url: "https://github.com/octocat/Hello-World".to_string(),
    };

    let row = to_row(&star).unwrap();
    assert_eq!(row["owner_status"], json!("unclaimed"));
    assert_eq!(row["user_id"], json!(placeholder_id.to_string()));
    assert_eq!(row["github_user_id"], json!(42));

    let back: NetworkStarRecord = from_row(row).unwrap();
    assert_eq!(back, star);
}

#[test]
fn test_registered_owner_round_trip() {
    let row = json!({
        "owner_status": "registered",
        "user_id": "u1",
        "github_user_id": 42,
        "github_username": "octocat",
        "repo_id": 7,
        "repo_name": "octocat/Hello-World",
        "repo_url": "https://github.com/octocat/Hello-World",
    });

    let star: NetworkStarRecord = from_row(row.as_object().cloned().unwrap()).unwrap();
    assert!(star.owner.is_registered());
    assert_eq!(star.owner.key(), "u1");
}

#[test]
fn test_merge_patch_only_touches_owner_columns() {
    let patch = to_row(&StarOwner::Registered {
        user_id: "u1".to_string(),
    })
    .unwrap();

    assert_eq!(patch.len(), 2);
    assert_eq!(patch["owner_status"], json!("registered"));
    assert_eq!(patch["user_id"], json!("u1"));
}

#[test]
fn test_linked_account_from_account() {
    let linked = LinkedAccount::from_account(account("583231"), true);

    assert_eq!(linked.user_id, "abc");
    assert_eq!(linked.github_user_id, Some(583231));
    assert_eq!(linked.access_token, "token123");
    assert!(linked.is_new);
}

#[test]
fn test_linked_account_with_unparseable_github_id() {
    let linked = LinkedAccount::from_account(account("gh789"), false);
    assert_eq!(linked.github_user_id, None);
}

#[test]
fn test_linked_account_debug_redacts_token() {
    let linked = LinkedAccount::from_account(account("1"), false);
    let debug = format!("{:?}", linked);
    assert!(!debug.contains("token123"));
    assert!(debug.contains("<redacted>"));
}

#[test]
fn test_account_serialization() {
    let value = serde_json::to_value(account("583231")).unwrap();
    assert_eq!(value["providerId"], json!("github"));
    assert_eq!(value["providerAccountId"], json!("583231"));
    assert_eq!(value["access_token"], json!("token123"));
}
