use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension, Result, Row};

use crate::analysis::scoring::ScoreBundle;
use crate::models::analysis::{Analysis, AnalysisDraft, TopLanguage};
use crate::models::repo::RepoSnapshot;

const DB_SCHEMA_VERSION: i64 = 1;

pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )?;

    let mut version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version < 1 {
        apply_migration_1(conn)?;
        version = 1;
        conn.pragma_update(None, "user_version", version)?;
    }

    if version > DB_SCHEMA_VERSION {
        // Future schema; do not fail reads/writes for forward-compatible changes.
        conn.pragma_update(None, "user_version", version)?;
    }

    Ok(())
}

fn apply_migration_1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS analyses (
            id TEXT PRIMARY KEY,
            profile_url TEXT NOT NULL,
            username TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            score_overall INTEGER NOT NULL,
            score_documentation INTEGER NOT NULL,
            score_code_quality INTEGER NOT NULL,
            score_activity INTEGER NOT NULL,
            score_project_impact INTEGER NOT NULL,
            score_discoverability INTEGER NOT NULL,
            repo_count INTEGER NOT NULL DEFAULT 0,
            pinned_count INTEGER NOT NULL DEFAULT 0,
            top_languages TEXT NOT NULL DEFAULT '[]',
            recent_commit_days INTEGER NOT NULL DEFAULT 0,
            strengths TEXT NOT NULL DEFAULT '[]',
            red_flags TEXT NOT NULL DEFAULT '[]',
            suggestions TEXT NOT NULL DEFAULT '[]',
            repos TEXT NOT NULL DEFAULT '[]',
            is_partial INTEGER NOT NULL DEFAULT 0,
            partial_reason TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_analyses_created_at ON analyses(created_at);
        ",
    )
}

const ANALYSIS_COLUMNS: &str = "id, profile_url, username, created_at, score_overall, \
     score_documentation, score_code_quality, score_activity, score_project_impact, \
     score_discoverability, repo_count, pinned_count, top_languages, recent_commit_days, \
     strengths, red_flags, suggestions, repos, is_partial, partial_reason";

/// Handle to the analyses database.
///
/// Constructed once by the caller and passed to the service operations;
/// connections are opened per call. Records are append-only: there is no
/// update or delete.
#[derive(Debug, Clone)]
pub struct AnalysisStore {
    db_path: PathBuf,
}

impl AnalysisStore {
    /// Open (or create) the database at `db_path` and run migrations.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let store = Self {
            db_path: db_path.as_ref().to_path_buf(),
        };
        store.connection()?;
        Ok(store)
    }

    fn connection(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)?;
        initialize_schema(&conn)?;
        Ok(conn)
    }

    /// Persist a scored draft, assigning the id and creation time. UUIDs keep
    /// concurrent inserts collision-free.
    pub fn insert_analysis(&self, draft: &AnalysisDraft, scores: &ScoreBundle) -> Result<Analysis> {
        let analysis = Analysis {
            id: uuid::Uuid::new_v4().to_string(),
            profile_url: draft.profile_url.clone(),
            username: draft.username.clone(),
            created_at: chrono::Utc::now().timestamp(),
            score_overall: scores.overall,
            score_documentation: scores.documentation,
            score_code_quality: scores.code_quality,
            score_activity: scores.activity,
            score_project_impact: scores.project_impact,
            score_discoverability: scores.discoverability,
            repo_count: draft.repos.len(),
            pinned_count: 0,
            top_languages: draft.top_languages.clone(),
            recent_commit_days: draft.aggregates.recent_commit_days,
            strengths: scores.strengths.clone(),
            red_flags: scores.red_flags.clone(),
            suggestions: scores.suggestions.clone(),
            repos: draft.repos.clone(),
            is_partial: draft.is_partial,
            partial_reason: draft.partial_reason.clone(),
        };

        let conn = self.connection()?;
        conn.execute(
            "
            INSERT INTO analyses (
                id,
                profile_url,
                username,
                created_at,
                score_overall,
                score_documentation,
                score_code_quality,
                score_activity,
                score_project_impact,
                score_discoverability,
                repo_count,
                pinned_count,
                top_languages,
                recent_commit_days,
                strengths,
                red_flags,
                suggestions,
                repos,
                is_partial,
                partial_reason
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)
            ",
            params![
                analysis.id,
                analysis.profile_url,
                analysis.username,
                analysis.created_at,
                analysis.score_overall,
                analysis.score_documentation,
                analysis.score_code_quality,
                analysis.score_activity,
                analysis.score_project_impact,
                analysis.score_discoverability,
                analysis.repo_count as i64,
                analysis.pinned_count as i64,
                to_json(&analysis.top_languages),
                analysis.recent_commit_days as i64,
                to_json(&analysis.strengths),
                to_json(&analysis.red_flags),
                to_json(&analysis.suggestions),
                to_json(&analysis.repos),
                analysis.is_partial as i32,
                analysis.partial_reason,
            ],
        )?;

        Ok(analysis)
    }

    pub fn get_analysis(&self, id: &str) -> Result<Option<Analysis>> {
        let conn = self.connection()?;
        conn.query_row(
            &format!("SELECT {ANALYSIS_COLUMNS} FROM analyses WHERE id = ?1"),
            params![id],
            row_to_analysis,
        )
        .optional()
    }

    /// Stored analyses, newest first. Ties on the second fall back to
    /// insertion order.
    pub fn list_analyses(&self, limit: usize) -> Result<Vec<Analysis>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ANALYSIS_COLUMNS} FROM analyses ORDER BY created_at DESC, rowid DESC LIMIT ?1"
        ))?;

        let analyses = stmt
            .query_map(params![limit as i64], row_to_analysis)?
            .filter_map(|row| row.ok())
            .collect();

        Ok(analyses)
    }
}

fn row_to_analysis(row: &Row<'_>) -> rusqlite::Result<Analysis> {
    Ok(Analysis {
        id: row.get(0)?,
        profile_url: row.get(1)?,
        username: row.get(2)?,
        created_at: row.get(3)?,
        score_overall: row.get::<_, i64>(4)? as u8,
        score_documentation: row.get::<_, i64>(5)? as u8,
        score_code_quality: row.get::<_, i64>(6)? as u8,
        score_activity: row.get::<_, i64>(7)? as u8,
        score_project_impact: row.get::<_, i64>(8)? as u8,
        score_discoverability: row.get::<_, i64>(9)? as u8,
        repo_count: row.get::<_, i64>(10)? as usize,
        pinned_count: row.get::<_, i64>(11)? as usize,
        top_languages: from_json::<Vec<TopLanguage>>(row.get(12)?),
        recent_commit_days: row.get::<_, i64>(13)? as usize,
        strengths: from_json::<Vec<String>>(row.get(14)?),
        red_flags: from_json::<Vec<String>>(row.get(15)?),
        suggestions: from_json::<Vec<String>>(row.get(16)?),
        repos: from_json::<Vec<RepoSnapshot>>(row.get(17)?),
        is_partial: row.get::<_, i32>(18)? != 0,
        partial_reason: row.get(19)?,
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "[]".to_string())
}

fn from_json<T: serde::de::DeserializeOwned + Default>(raw: String) -> T {
    serde_json::from_str(&raw).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::analysis::ProfileAggregates;

    fn sample_draft(username: &str) -> AnalysisDraft {
        AnalysisDraft {
            profile_url: format!("https://github.com/{username}"),
            username: username.to_string(),
            repos: vec![RepoSnapshot {
                name: "alpha".to_string(),
                full_name: format!("{username}/alpha"),
                url: format!("https://github.com/{username}/alpha"),
                description: Some("demo repository".to_string()),
                primary_language: Some("Rust".to_string()),
                stars: 12,
                forks: 3,
                open_issues: 1,
                has_readme: true,
                readme_length: 420,
                has_license: true,
                has_topics: true,
                topics_count: 2,
                last_push_at: "2024-03-01T10:00:00Z".to_string(),
            }],
            top_languages: vec![TopLanguage {
                language: "Rust".to_string(),
                share: 1.0,
            }],
            aggregates: ProfileAggregates {
                repo_count: 1,
                recent_commit_days: 4,
                ..ProfileAggregates::default()
            },
            is_partial: true,
            partial_reason: Some("degraded activity source".to_string()),
        }
    }

    fn sample_scores() -> ScoreBundle {
        ScoreBundle {
            documentation: 82,
            code_quality: 64,
            activity: 31,
            project_impact: 18,
            discoverability: 57,
            overall: 52,
            strengths: vec!["strength".to_string()],
            red_flags: vec!["red flag".to_string()],
            suggestions: vec!["suggestion".to_string()],
        }
    }

    fn open_store() -> (tempfile::TempDir, AnalysisStore) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = AnalysisStore::open(dir.path().join("analyses.db")).expect("open store");
        (dir, store)
    }

    #[test]
    fn schema_initializes_with_expected_version() {
        let conn = Connection::open_in_memory().expect("in-memory db");
        initialize_schema(&conn).expect("schema init");
        let version: i64 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .expect("schema version");
        assert_eq!(version, DB_SCHEMA_VERSION);
    }

    #[test]
    fn insert_assigns_identity_and_round_trips_nested_data() {
        let (_tmp, store) = open_store();

        let created = store
            .insert_analysis(&sample_draft("octocat"), &sample_scores())
            .expect("insert analysis");
        assert!(!created.id.is_empty());
        assert!(created.created_at > 0);
        assert_eq!(created.pinned_count, 0);

        let loaded = store
            .get_analysis(&created.id)
            .expect("load analysis")
            .expect("analysis exists");

        assert_eq!(loaded.username, "octocat");
        assert_eq!(loaded.score_documentation, 82);
        assert_eq!(loaded.repo_count, 1);
        assert_eq!(loaded.repos.len(), 1);
        assert_eq!(loaded.repos[0].full_name, "octocat/alpha");
        assert_eq!(loaded.repos[0].readme_length, 420);
        assert_eq!(loaded.top_languages[0].language, "Rust");
        assert_eq!(loaded.strengths, vec!["strength".to_string()]);
        assert!(loaded.is_partial);
        assert_eq!(
            loaded.partial_reason.as_deref(),
            Some("degraded activity source")
        );
    }

    #[test]
    fn missing_id_reads_as_none() {
        let (_tmp, store) = open_store();
        assert!(store
            .get_analysis("no-such-id")
            .expect("query analysis")
            .is_none());
    }

    #[test]
    fn list_returns_newest_first_and_honors_limit() {
        let (_tmp, store) = open_store();
        let scores = sample_scores();

        for username in ["first", "second", "third"] {
            store
                .insert_analysis(&sample_draft(username), &scores)
                .expect("insert analysis");
        }

        let listed = store.list_analyses(2).expect("list analyses");
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].username, "third");
        assert_eq!(listed[1].username, "second");
    }
}
