use std::collections::HashSet;

use log::warn;
use reqwest::Url;
use thiserror::Error;

use crate::github::{GithubClient, GithubError, GithubRepo};
use crate::models::analysis::{AnalysisDraft, ProfileAggregates, TopLanguage};
use crate::models::repo::RepoSnapshot;

/// Only the most recently updated repositories get a README probe.
pub const README_PROBE_LIMIT: usize = 12;
/// Repositories considered when falling back to push dates for activity.
pub const PUSH_DATE_FALLBACK_LIMIT: usize = 30;
/// Languages reported per analysis.
const TOP_LANGUAGE_LIMIT: usize = 6;

const EVENTS_FALLBACK_REASON: &str =
    "Could not fetch recent activity events; using repo update dates as fallback.";

#[derive(Debug, Error)]
pub enum CollectError {
    /// Malformed URL, non-github.com host, or missing username segment.
    /// Raised before any network access.
    #[error("{message}")]
    InvalidProfileUrl { message: String },

    /// The user resource answered with a non-success status.
    #[error("GitHub user fetch failed ({status}): {message}")]
    UserFetch { status: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl CollectError {
    /// A 403 on the user fetch is GitHub's anonymous rate limit.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, CollectError::UserFetch { status: 403, .. })
    }
}

/// Extract the username from a github.com profile URL. Never touches the
/// network, so a bad URL fails before any upstream request is issued.
pub fn parse_profile_username(profile_url: &str) -> Result<String, CollectError> {
    let url = Url::parse(profile_url).map_err(|_| CollectError::InvalidProfileUrl {
        message: "Please enter a valid URL".to_string(),
    })?;

    if url.host_str() != Some("github.com") {
        return Err(CollectError::InvalidProfileUrl {
            message: "Please enter a github.com profile URL".to_string(),
        });
    }

    url.path_segments()
        .and_then(|mut segments| segments.find(|segment| !segment.is_empty()))
        .map(str::to_string)
        .ok_or_else(|| CollectError::InvalidProfileUrl {
            message: "Invalid GitHub profile URL".to_string(),
        })
}

/// Run the bounded upstream read sequence and build a normalized draft.
///
/// The user fetch is the only fatal step. Everything after it degrades
/// gracefully: a failed repository list becomes an empty list, a failed
/// README probe records "no README", and a failed events fetch falls back
/// to push dates and marks the analysis partial.
pub async fn collect_profile(
    client: &GithubClient,
    profile_url: &str,
) -> Result<AnalysisDraft, CollectError> {
    let username = parse_profile_username(profile_url)?;

    client.get_user(&username).await.map_err(|err| match err {
        GithubError::Status { status, message } => CollectError::UserFetch {
            status,
            message: if message.is_empty() {
                "Unable to fetch GitHub profile".to_string()
            } else {
                message
            },
        },
        GithubError::Network(err) => CollectError::Network(err),
    })?;

    let repos = match client.list_repos(&username).await {
        Ok(repos) => repos,
        Err(err) => {
            warn!("repository list fetch failed for {username}: {err}");
            Vec::new()
        }
    };

    // Probe results are index-aligned with the repository list; repositories
    // beyond the window stay (false, 0).
    let mut readme_probes = Vec::with_capacity(repos.len().min(README_PROBE_LIMIT));
    for repo in repos.iter().take(README_PROBE_LIMIT) {
        let probe = match client.readme_length(&repo.full_name).await {
            Ok(length) => (true, length),
            Err(_) => (false, 0),
        };
        readme_probes.push(probe);
    }

    let mut language_counts: Vec<(String, usize)> = Vec::new();
    let mut readme_count = 0usize;
    let mut readme_len_sum = 0usize;
    let mut has_topics_count = 0usize;
    let mut license_count = 0usize;
    let mut stars_total = 0u64;
    let mut forks_total = 0u64;

    let mut snapshots = Vec::with_capacity(repos.len());
    for (index, repo) in repos.iter().enumerate() {
        let (has_readme, readme_length) = readme_probes.get(index).copied().unwrap_or((false, 0));

        if has_readme {
            readme_count += 1;
            readme_len_sum += readme_length;
        }

        if let Some(language) = repo.language.as_deref() {
            match language_counts.iter_mut().find(|(name, _)| name == language) {
                Some((_, count)) => *count += 1,
                None => language_counts.push((language.to_string(), 1)),
            }
        }

        let has_topics = !repo.topics.is_empty();
        if has_topics {
            has_topics_count += 1;
        }

        let has_license = has_recognized_license(repo);
        if has_license {
            license_count += 1;
        }

        stars_total += u64::from(repo.stargazers_count);
        forks_total += u64::from(repo.forks_count);

        snapshots.push(RepoSnapshot {
            name: repo.name.clone(),
            full_name: repo.full_name.clone(),
            url: repo.html_url.clone(),
            description: repo.description.clone(),
            primary_language: repo.language.clone(),
            stars: repo.stargazers_count,
            forks: repo.forks_count,
            open_issues: repo.open_issues_count,
            has_readme,
            readme_length,
            has_license,
            has_topics,
            topics_count: repo.topics.len(),
            last_push_at: repo
                .pushed_at
                .clone()
                .or_else(|| repo.updated_at.clone())
                .unwrap_or_default(),
        });
    }

    let repo_count = snapshots.len();
    let top_languages = rank_top_languages(&language_counts, repo_count);

    let (recent_commit_days, is_partial, partial_reason) =
        match client.list_public_events(&username).await {
            Ok(events) => {
                let days = distinct_utc_days(
                    events
                        .iter()
                        .filter(|event| event.event_type == "PushEvent")
                        .filter_map(|event| event.created_at.as_deref()),
                );
                (days, false, None)
            }
            Err(err) => {
                warn!("events fetch failed for {username}: {err}");
                let days = distinct_utc_days(
                    snapshots
                        .iter()
                        .take(PUSH_DATE_FALLBACK_LIMIT)
                        .map(|snapshot| snapshot.last_push_at.as_str()),
                );
                (days, true, Some(EVENTS_FALLBACK_REASON.to_string()))
            }
        };

    let aggregates = ProfileAggregates {
        repo_count,
        readme_coverage: coverage(readme_count, repo_count),
        avg_readme_len: if readme_count == 0 {
            0.0
        } else {
            readme_len_sum as f64 / readme_count as f64
        },
        topics_coverage: coverage(has_topics_count, repo_count),
        license_coverage: coverage(license_count, repo_count),
        recent_commit_days,
        lang_diversity: language_counts.len(),
        stars_total,
        forks_total,
    };

    Ok(AnalysisDraft {
        profile_url: profile_url.to_string(),
        username,
        repos: snapshots,
        top_languages,
        aggregates,
        is_partial,
        partial_reason,
    })
}

fn coverage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

/// A license counts only with a recognized SPDX id; GitHub reports
/// unrecognized licenses as NOASSERTION.
fn has_recognized_license(repo: &GithubRepo) -> bool {
    match repo
        .license
        .as_ref()
        .and_then(|license| license.spdx_id.as_deref())
    {
        Some(id) => !id.is_empty() && id != "NOASSERTION",
        None => false,
    }
}

/// Count distinct UTC calendar dates among ISO-8601 timestamps.
fn distinct_utc_days<'a>(timestamps: impl Iterator<Item = &'a str>) -> usize {
    let mut days = HashSet::new();
    for timestamp in timestamps {
        let day = timestamp.get(..10).unwrap_or(timestamp);
        if !day.is_empty() {
            days.insert(day.to_string());
        }
    }
    days.len()
}

fn rank_top_languages(counts: &[(String, usize)], repo_count: usize) -> Vec<TopLanguage> {
    let mut ordered: Vec<&(String, usize)> = counts.iter().collect();
    // Stable sort keeps encounter order for equal counts.
    ordered.sort_by(|a, b| b.1.cmp(&a.1));

    ordered
        .into_iter()
        .take(TOP_LANGUAGE_LIMIT)
        .map(|(language, count)| TopLanguage {
            language: language.clone(),
            share: coverage(*count, repo_count),
        })
        .collect()
}
