use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{Collector, CollectorKind, CollectorReport, OWNED_REPOS_ENDPOINT};
use crate::error::Result;
use crate::github::GitHubClient;
use crate::models::LanguageFrequency;
use crate::pagination::Paginator;
use crate::store::{upsert_records, SyncStore};
use crate::types::OwnedRepo;

/// Language histogram over the user's owned repositories.
///
/// The count spans pages, so pagination is drained before anything is
/// written; the store then receives a single batch that replaces each
/// language's previous frequency.
pub struct LanguagesCollector {
    store: Arc<dyn SyncStore>,
}

impl LanguagesCollector {
    pub fn new(store: Arc<dyn SyncStore>) -> Self {
        Self { store }
    }
}

/// Count repositories per non-null language
pub fn language_histogram<'a>(repos: impl IntoIterator<Item = &'a OwnedRepo>) -> BTreeMap<String, u32> {
    let mut counts = BTreeMap::new();
    for language in repos.into_iter().filter_map(|repo| repo.language.as_ref()) {
        *counts.entry(language.clone()).or_insert(0) += 1;
    }
    counts
}

#[async_trait]
impl Collector for LanguagesCollector {
    fn kind(&self) -> CollectorKind {
        CollectorKind::Languages
    }

    async fn collect(&self, user_id: &str, github: &GitHubClient) -> Result<CollectorReport> {
        let mut report = CollectorReport::new(self.kind());

        let mut pages = Paginator::<OwnedRepo>::new(github, OWNED_REPOS_ENDPOINT);
        let repos = pages.collect_all().await?;
        report.pages_fetched = pages.pages_fetched();

        let histogram = language_histogram(&repos);
        debug!(user_id, repos = repos.len(), languages = histogram.len(), "Counted languages");

        let records: Vec<LanguageFrequency> = histogram
            .into_iter()
            .map(|(language, frequency)| LanguageFrequency {
                user_id: user_id.to_string(),
                language,
                frequency,
            })
            .collect();

        report.rows_written = upsert_records(self.store.as_ref(), &records).await?;

        info!(user_id, languages = report.rows_written, "Stored language histogram");
        Ok(report)
    }
}
