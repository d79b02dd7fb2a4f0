use thiserror::Error;

use crate::analysis::collector::{self, CollectError};
use crate::analysis::scoring;
use crate::commands::db::AnalysisStore;
use crate::github::GithubClient;
use crate::models::analysis::Analysis;
use crate::models::repo::RepoSnapshot;

const DEFAULT_LIST_LIMIT: usize = 10;
const MAX_LIST_LIMIT: usize = 50;

/// Errors surfaced at the service boundary. `http_status` carries the
/// transport mapping for callers that expose these operations over HTTP.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{message}")]
    InvalidProfileUrl {
        message: String,
        field: &'static str,
    },

    #[error("Analysis not found")]
    NotFound,

    #[error("GitHub temporarily blocked requests (rate limit). Please wait a bit and try again.")]
    RateLimited,

    #[error("Unable to fetch GitHub data right now. Please try again.")]
    Upstream,

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl AnalysisError {
    pub fn http_status(&self) -> u16 {
        match self {
            AnalysisError::InvalidProfileUrl { .. } => 400,
            AnalysisError::NotFound => 404,
            AnalysisError::RateLimited | AnalysisError::Upstream | AnalysisError::Storage(_) => 503,
        }
    }
}

impl From<CollectError> for AnalysisError {
    fn from(err: CollectError) -> Self {
        match err {
            CollectError::InvalidProfileUrl { message } => AnalysisError::InvalidProfileUrl {
                message,
                field: "profileUrl",
            },
            err if err.is_rate_limited() => AnalysisError::RateLimited,
            CollectError::UserFetch { .. } | CollectError::Network(_) => AnalysisError::Upstream,
        }
    }
}

/// Analyze a profile URL and persist the scored result.
pub async fn create_analysis(
    store: &AnalysisStore,
    github: &GithubClient,
    profile_url: &str,
) -> Result<Analysis, AnalysisError> {
    let draft = collector::collect_profile(github, profile_url).await?;
    let scores = scoring::score(&draft.aggregates);
    Ok(store.insert_analysis(&draft, &scores)?)
}

pub fn get_analysis(store: &AnalysisStore, id: &str) -> Result<Analysis, AnalysisError> {
    store.get_analysis(id)?.ok_or(AnalysisError::NotFound)
}

/// Stored analyses, newest first. `limit` is clamped into [1, 50]; the
/// default is 10.
pub fn list_analyses(
    store: &AnalysisStore,
    limit: Option<usize>,
) -> Result<Vec<Analysis>, AnalysisError> {
    let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
    Ok(store.list_analyses(limit)?)
}

/// The repository snapshots captured by one analysis.
pub fn get_analysis_repos(
    store: &AnalysisStore,
    id: &str,
) -> Result<Vec<RepoSnapshot>, AnalysisError> {
    Ok(get_analysis(store, id)?.repos)
}
