use serde::{Deserialize, Serialize};

use crate::models::analysis::ProfileAggregates;

/// Scores plus narrative for one profile. All scores are integers in [0,100].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBundle {
    pub documentation: u8,
    pub code_quality: u8,
    pub activity: u8,
    pub project_impact: u8,
    pub discoverability: u8,
    pub overall: u8,
    pub strengths: Vec<String>,
    pub red_flags: Vec<String>,
    pub suggestions: Vec<String>,
}

/// Overall weights: documentation, code quality, activity, impact,
/// discoverability.
const OVERALL_WEIGHTS: [f64; 5] = [0.25, 0.20, 0.20, 0.20, 0.15];

const MAX_SUGGESTIONS: usize = 6;

fn clamp_score(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

/// Convert aggregate profile signals into five dimension scores, an overall
/// score, and the strengths / red flags / suggestions lists.
///
/// Pure and deterministic: identical aggregates always produce identical
/// output. Narrative entries are appended in a fixed order and gated on the
/// raw aggregates, not the derived scores.
pub fn score(input: &ProfileAggregates) -> ScoreBundle {
    let repo_count = input.repo_count as f64;
    let commit_days = input.recent_commit_days as f64;
    let stars = input.stars_total as f64;
    let forks = input.forks_total as f64;

    let documentation = clamp_score(
        input.readme_coverage * 55.0
            + (input.avg_readme_len / 80.0).min(25.0)
            + input.license_coverage * 10.0
            + input.topics_coverage * 10.0,
    );

    let code_quality = clamp_score(
        input.license_coverage * 15.0
            + input.topics_coverage * 15.0
            + (input.lang_diversity as f64 * 10.0).min(40.0)
            + ((1.0 + repo_count).log10() * 25.0).min(30.0),
    );

    // recent_commit_days: higher is better, saturating at 120 distinct days
    let activity = clamp_score(
        (commit_days / 120.0 * 70.0).min(70.0) + ((1.0 + repo_count).log10() * 18.0).min(30.0),
    );

    let project_impact = clamp_score(
        ((1.0 + stars).log10() * 35.0).min(70.0) + ((1.0 + forks).log10() * 30.0).min(30.0),
    );

    let discoverability = clamp_score(
        input.topics_coverage * 45.0 + input.readme_coverage * 35.0 + (repo_count * 2.0).min(20.0),
    );

    let overall = clamp_score(
        f64::from(documentation) * OVERALL_WEIGHTS[0]
            + f64::from(code_quality) * OVERALL_WEIGHTS[1]
            + f64::from(activity) * OVERALL_WEIGHTS[2]
            + f64::from(project_impact) * OVERALL_WEIGHTS[3]
            + f64::from(discoverability) * OVERALL_WEIGHTS[4],
    );

    let mut strengths = Vec::new();
    if input.readme_coverage >= 0.7 {
        strengths.push(
            "Most repositories have a README, which helps recruiters quickly understand your work."
                .to_string(),
        );
    }
    if input.topics_coverage >= 0.5 {
        strengths
            .push("Many repositories use topics, improving search/discoverability.".to_string());
    }
    if input.recent_commit_days >= 60 {
        strengths.push(
            "Recent and consistent activity signals momentum and learning consistency.".to_string(),
        );
    }
    if input.stars_total >= 20 {
        strengths.push(
            "Your projects show external interest (stars), which helps with credibility."
                .to_string(),
        );
    }

    let mut red_flags = Vec::new();
    if input.readme_coverage < 0.4 {
        red_flags.push(
            "Many repositories are missing READMEs, which makes it hard for recruiters to evaluate impact."
                .to_string(),
        );
    }
    if input.recent_commit_days < 10 {
        red_flags.push("Low recent activity can look like an inactive portfolio.".to_string());
    }
    if input.topics_coverage < 0.25 {
        red_flags.push("Few repos have topics, reducing discoverability and clarity.".to_string());
    }

    // Suggestions: always at least 3
    let mut suggestions = vec![
        "Pick your top 3–5 repositories and add recruiter-focused READMEs (problem, approach, setup, screenshots, tradeoffs, and results)."
            .to_string(),
        "Add topics and short descriptions to each showcased repository so people can understand them at a glance."
            .to_string(),
        "Create a simple project story: add a demo link, key features, and a clear 'what I learned' section for each project."
            .to_string(),
    ];

    if input.license_coverage < 0.5 {
        suggestions.push(
            "Add a LICENSE file to public repos you want recruiters to review—signals professionalism."
                .to_string(),
        );
    }
    if input.lang_diversity <= 1 {
        suggestions.push(
            "Show breadth by pinning projects in different languages/frameworks (even small ones) to demonstrate range."
                .to_string(),
        );
    }
    if input.stars_total == 0 {
        suggestions.push(
            "Improve shareability: add screenshots, a short demo video, and clear usage instructions to encourage stars."
                .to_string(),
        );
    }
    suggestions.truncate(MAX_SUGGESTIONS);

    ScoreBundle {
        documentation,
        code_quality,
        activity,
        project_impact,
        discoverability,
        overall,
        strengths,
        red_flags,
        suggestions,
    }
}
