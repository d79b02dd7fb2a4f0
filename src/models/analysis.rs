use serde::{Deserialize, Serialize};

use crate::models::repo::RepoSnapshot;

/// Share of analyzed repositories whose primary language matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopLanguage {
    pub language: String,
    pub share: f64, // fraction in [0,1] over the full repo count
}

/// Aggregate signals handed to the scoring engine.
///
/// Coverages are fractions in [0,1] over the full repository count;
/// `lang_diversity` is the distinct primary-language count across all
/// repositories, not just the README-probed ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileAggregates {
    pub repo_count: usize,
    pub readme_coverage: f64,
    pub avg_readme_len: f64,
    pub topics_coverage: f64,
    pub license_coverage: f64,
    pub recent_commit_days: usize,
    pub lang_diversity: usize,
    pub stars_total: u64,
    pub forks_total: u64,
}

/// Collector output: everything about a profile except scores and the
/// store-assigned identity fields.
#[derive(Debug, Clone)]
pub struct AnalysisDraft {
    pub profile_url: String,
    pub username: String,
    pub repos: Vec<RepoSnapshot>,
    pub top_languages: Vec<TopLanguage>,
    pub aggregates: ProfileAggregates,
    pub is_partial: bool,
    pub partial_reason: Option<String>,
}

/// One completed analysis run; the unit of persistence.
///
/// `id` and `created_at` are assigned exactly once by the store. The record
/// is immutable after creation — there is no update operation anywhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub id: String,
    pub profile_url: String,
    pub username: String,
    pub created_at: i64,
    pub score_overall: u8,
    pub score_documentation: u8,
    pub score_code_quality: u8,
    pub score_activity: u8,
    pub score_project_impact: u8,
    pub score_discoverability: u8,
    pub repo_count: usize,
    pub pinned_count: usize,
    pub top_languages: Vec<TopLanguage>,
    pub recent_commit_days: usize,
    pub strengths: Vec<String>,
    pub red_flags: Vec<String>,
    pub suggestions: Vec<String>,
    pub repos: Vec<RepoSnapshot>,
    pub is_partial: bool,
    pub partial_reason: Option<String>,
}
