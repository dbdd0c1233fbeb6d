mod common;

use common::{owned_repo, repos, user, users, TestContext, TOKEN};
use github_account_sync::collectors::{
    Collector, FollowersCollector, FollowsCollector, LanguagesCollector, NetworkStarsCollector, StarsCollector,
};
use github_account_sync::github::GitHubClient;
use github_account_sync::models::{
    FollowRecord, FollowerRecord, LanguageFrequency, NetworkStarRecord, StarRecord, Table,
};
use github_account_sync::store::SyncStore;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, ResponseTemplate};

fn github(ctx: &TestContext) -> GitHubClient {
    GitHubClient::with_config(TOKEN.to_string(), &ctx.config).expect("Failed to create client")
}

fn store(ctx: &TestContext) -> Arc<dyn SyncStore> {
    ctx.store.clone()
}

#[tokio::test]
async fn test_stars_resync_is_idempotent() {
    let ctx = TestContext::new().await;
    ctx.mount_page("/user/starred", 1, repos(1..4)).await;

    let collector = StarsCollector::new(store(&ctx));
    let github = github(&ctx);

    let first = collector.collect("u1", &github).await.expect("First sync failed");
    let second = collector.collect("u1", &github).await.expect("Second sync failed");

    assert_eq!(first.rows_written, 3);
    assert_eq!(second.rows_written, 3);
    assert_eq!(ctx.store.count(Table::Stars), 3);

    let stars: Vec<StarRecord> = ctx.store.records(Table::Stars).unwrap();
    assert!(stars.iter().all(|s| s.user_id == "u1"));
    assert_eq!(stars[0].repo_name, "owner/repo-1");
    assert_eq!(stars[0].repo_url, "https://github.com/owner/repo-1");
}

#[tokio::test]
async fn test_stars_upserted_page_by_page() {
    let ctx = TestContext::new().await.with_config(|c| c.with_per_page(2));
    ctx.mount_page("/user/starred", 1, repos(1..3)).await;
    ctx.mount_page("/user/starred", 2, repos(3..5)).await;
    ctx.mount_page("/user/starred", 3, repos(5..6)).await;

    let report = StarsCollector::new(store(&ctx))
        .collect("u1", &github(&ctx))
        .await
        .unwrap();

    assert_eq!(report.pages_fetched, 3);
    assert_eq!(report.rows_written, 5);
    assert_eq!(ctx.store.upsert_calls(Table::Stars), 3);
}

#[tokio::test]
async fn test_stars_keeps_earlier_pages_when_a_later_page_fails() {
    let ctx = TestContext::new().await.with_config(|c| c.with_per_page(2));
    ctx.mount_page("/user/starred", 1, repos(1..3)).await;
    ctx.mount_status("/user/starred", 500).await;

    let result = StarsCollector::new(store(&ctx)).collect("u1", &github(&ctx)).await;

    assert_eq!(result.unwrap_err().status(), Some(500));
    assert_eq!(ctx.store.count(Table::Stars), 2);
}

#[tokio::test]
async fn test_follows_and_followers() {
    let ctx = TestContext::new().await;
    ctx.mount_page("/user/following", 1, json!([user(7, "octocat"), user(8, "hubot")]))
        .await;
    ctx.mount_page("/user/followers", 1, json!([user(9, "monalisa")])).await;

    let github = github(&ctx);
    FollowsCollector::new(store(&ctx)).collect("u1", &github).await.unwrap();
    FollowersCollector::new(store(&ctx)).collect("u1", &github).await.unwrap();

    let follows: Vec<FollowRecord> = ctx.store.records(Table::Follows).unwrap();
    assert_eq!(follows.len(), 2);
    let octocat = follows.iter().find(|f| f.followed_user_id == 7).unwrap();
    assert_eq!(octocat.followed_user_name, "octocat");
    assert_eq!(octocat.url, "https://github.com/octocat");

    let followers: Vec<FollowerRecord> = ctx.store.records(Table::Followers).unwrap();
    assert_eq!(followers.len(), 1);
    assert_eq!(followers[0].follower_user_id, 9);
    assert_eq!(followers[0].follower_user_name, "monalisa");
}

#[tokio::test]
async fn test_languages_counted_across_pages_and_written_once() {
    let ctx = TestContext::new().await.with_config(|c| c.with_per_page(3));
    ctx.mount_page(
        "/user/repos",
        1,
        json!([owned_repo(1, Some("A")), owned_repo(2, Some("A")), owned_repo(3, Some("B"))]),
    )
    .await;
    ctx.mount_page(
        "/user/repos",
        2,
        json!([owned_repo(4, Some("A")), owned_repo(5, Some("C")), owned_repo(6, None)]),
    )
    .await;
    ctx.mount_page("/user/repos", 3, json!([])).await;

    let report = LanguagesCollector::new(store(&ctx))
        .collect("u1", &github(&ctx))
        .await
        .unwrap();

    assert_eq!(report.pages_fetched, 3);
    assert_eq!(ctx.store.upsert_calls(Table::Languages), 1);

    let languages: HashMap<String, u32> = ctx
        .store
        .records::<LanguageFrequency>(Table::Languages)
        .unwrap()
        .into_iter()
        .map(|l| (l.language, l.frequency))
        .collect();
    assert_eq!(languages, HashMap::from([("A".to_string(), 3), ("B".to_string(), 1), ("C".to_string(), 1)]));
}

#[tokio::test]
async fn test_languages_only_owned_repos_requested() {
    let ctx = TestContext::new().await;
    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .and(query_param("type", "owner"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([owned_repo(1, Some("Rust"))])))
        .expect(1)
        .mount(&ctx.server)
        .await;

    LanguagesCollector::new(store(&ctx))
        .collect("u1", &github(&ctx))
        .await
        .unwrap();
    ctx.server.verify().await;
}

#[tokio::test]
async fn test_languages_resync_replaces_frequency() {
    let ctx = TestContext::new().await;
    ctx.mount_page("/user/repos", 1, json!([owned_repo(1, Some("Rust")), owned_repo(2, Some("Rust"))]))
        .await;

    let collector = LanguagesCollector::new(store(&ctx));
    let github = github(&ctx);
    collector.collect("u1", &github).await.unwrap();
    collector.collect("u1", &github).await.unwrap();

    let languages: Vec<LanguageFrequency> = ctx.store.records(Table::Languages).unwrap();
    assert_eq!(languages.len(), 1);
    assert_eq!(languages[0].frequency, 2, "Frequency must not accumulate across syncs");
}

#[tokio::test]
async fn test_languages_without_any_language_writes_nothing() {
    let ctx = TestContext::new().await;
    ctx.mount_page("/user/repos", 1, json!([owned_repo(1, None)])).await;

    let report = LanguagesCollector::new(store(&ctx))
        .collect("u1", &github(&ctx))
        .await
        .unwrap();

    assert_eq!(report.rows_written, 0);
    assert_eq!(ctx.store.upsert_calls(Table::Languages), 0);
}

#[tokio::test]
async fn test_network_stars_skip_failing_followed_user() {
    let ctx = TestContext::new().await;
    ctx.mount_page(
        "/user/following",
        1,
        json!([user(1, "alice"), user(2, "bob"), user(3, "carol")]),
    )
    .await;
    ctx.mount_page("/users/alice/starred", 1, repos(10..12)).await;
    ctx.mount_status("/users/bob/starred", 500).await;
    ctx.mount_page("/users/carol/starred", 1, repos(30..31)).await;

    let report = NetworkStarsCollector::new(store(&ctx), 20)
        .collect("u1", &github(&ctx))
        .await
        .expect("One failing followed user must not fail the collector");

    assert_eq!(report.rows_written, 3);
    assert_eq!(report.skipped_users.len(), 1);
    assert_eq!(report.skipped_users[0].login, "bob");
    assert_eq!(report.skipped_users[0].github_user_id, 2);

    let stars: Vec<NetworkStarRecord> = ctx.store.records(Table::NetworkStars).unwrap();
    assert_eq!(stars.len(), 3);
    assert!(stars.iter().all(|s| !s.owner.is_registered()));
    assert!(!stars.iter().any(|s| s.github_user_id == 2));

    let alice: Vec<_> = stars.iter().filter(|s| s.github_username == "alice").collect();
    assert_eq!(alice.len(), 2);
    assert_eq!(alice[0].owner, alice[1].owner, "One placeholder per followed user");

    let carol = stars.iter().find(|s| s.github_username == "carol").unwrap();
    assert_ne!(carol.owner, alice[0].owner);
    assert_ne!(carol.owner.key(), "u1");
}

#[tokio::test]
async fn test_network_stars_respect_follow_limit() {
    let ctx = TestContext::new().await;
    ctx.mount_page("/user/following", 1, users(1..101)).await;
    Mock::given(method("GET"))
        .and(path("/user/following"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(users(101..151)))
        .expect(0)
        .mount(&ctx.server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/users/[^/]+/starred$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(20)
        .mount(&ctx.server)
        .await;

    let report = NetworkStarsCollector::new(store(&ctx), 20)
        .collect("u1", &github(&ctx))
        .await
        .unwrap();

    assert!(report.skipped_users.is_empty());
    assert_eq!(ctx.store.count(Table::NetworkStars), 0);
    ctx.server.verify().await;
}

#[tokio::test]
async fn test_network_stars_resync_keeps_placeholder() {
    let ctx = TestContext::new().await;
    ctx.mount_page("/user/following", 1, json!([user(1, "alice")])).await;
    ctx.mount_page("/users/alice/starred", 1, repos(10..12)).await;

    let collector = NetworkStarsCollector::new(store(&ctx), 20);
    let github = github(&ctx);

    collector.collect("u1", &github).await.unwrap();
    let before: Vec<NetworkStarRecord> = ctx.store.records(Table::NetworkStars).unwrap();

    collector.collect("u1", &github).await.unwrap();
    let after: Vec<NetworkStarRecord> = ctx.store.records(Table::NetworkStars).unwrap();

    assert_eq!(after.len(), 2);
    assert_eq!(before[0].owner, after[0].owner);
}

#[tokio::test]
async fn test_network_stars_fail_when_following_list_fails() {
    let ctx = TestContext::new().await;
    ctx.mount_status("/user/following", 403).await;

    let result = NetworkStarsCollector::new(store(&ctx), 20)
        .collect("u1", &github(&ctx))
        .await;

    assert_eq!(result.unwrap_err().status(), Some(403));
}

#[tokio::test]
async fn test_network_stars_visit_followed_users_one_at_a_time() {
    let ctx = TestContext::new().await;
    ctx.mount_page(
        "/user/following",
        1,
        json!([user(1, "alice"), user(2, "bob"), user(3, "carol")]),
    )
    .await;
    for login in ["alice", "bob", "carol"] {
        Mock::given(method("GET"))
            .and(path(format!("/users/{}/starred", login)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(repos(1..2))
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&ctx.server)
            .await;
    }

    let started = Instant::now();
    let report = NetworkStarsCollector::new(store(&ctx), 20)
        .collect("u1", &github(&ctx))
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(report.rows_written, 3);
    assert!(elapsed >= Duration::from_millis(900), "followed users overlapped: {:?}", elapsed);

    let starred: Vec<String> = ctx
        .server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.url.path().to_string())
        .filter(|p| p.starts_with("/users/"))
        .collect();
    assert_eq!(
        starred,
        vec!["/users/alice/starred", "/users/bob/starred", "/users/carol/starred"]
    );
}
