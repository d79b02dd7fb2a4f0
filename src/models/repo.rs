use serde::{Deserialize, Serialize};

/// Snapshot of one public repository, captured at analysis time and stored
/// verbatim inside its parent analysis for drill-down views.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoSnapshot {
    pub name: String,
    pub full_name: String,
    pub url: String,
    pub description: Option<String>,
    pub primary_language: Option<String>,
    pub stars: u32,
    pub forks: u32,
    pub open_issues: u32,
    pub has_readme: bool,
    pub readme_length: usize,
    pub has_license: bool,
    pub has_topics: bool,
    pub topics_count: usize,
    pub last_push_at: String, // push date, or update date when never pushed
}
