use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use gow_common::{
    Error, InteractionRecord, InteractionSummary, MatchCandidate, ProjectDescriptor, Result, UserId,
    UserProfile, UserRole,
};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::context_store::ContextStore;
use crate::migrations::CONTEXT_SCHEMA_V1;

/// Seed file shape accepted by [`SqliteContextStore::apply_seed`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedData {
    #[serde(default)]
    pub profiles: Vec<UserProfile>,
    #[serde(default)]
    pub projects: Vec<SeedProject>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedProject {
    pub client_id: UserId,
    #[serde(default = "default_project_status")]
    pub status: String,
    #[serde(flatten)]
    pub project: ProjectDescriptor,
}

fn default_project_status() -> String {
    "open".to_string()
}

/// SQLite-backed context store for profiles, projects and the interaction log.
pub struct SqliteContextStore {
    conn: Mutex<Connection>,
}

impl SqliteContextStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        info!("opening context store at {}", db_path.display());
        let conn = Connection::open(db_path)
            .map_err(|e| Error::Database(format!("failed to open database: {e}")))?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(|e| Error::Database(format!("failed to set pragmas: {e}")))?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Database(format!("failed to open in-memory database: {e}")))?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        self.conn()?
            .execute_batch(CONTEXT_SCHEMA_V1.sql)
            .map_err(|e| {
                Error::Database(format!(
                    "context migration v{} failed: {e}",
                    CONTEXT_SCHEMA_V1.version
                ))
            })?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Database("context store connection lock poisoned".to_string()))
    }

    /// Create or replace a profile row.
    pub fn upsert_profile(&self, profile: &UserProfile) -> Result<()> {
        let skills = serde_json::to_string(&profile.skills)?;
        self.conn()?
            .execute(
                "INSERT INTO profiles
                    (id, full_name, bio, skills, location, avatar_url, hourly_rate, role, experience)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(id) DO UPDATE SET
                   full_name = excluded.full_name,
                   bio = excluded.bio,
                   skills = excluded.skills,
                   location = excluded.location,
                   avatar_url = excluded.avatar_url,
                   hourly_rate = excluded.hourly_rate,
                   role = excluded.role,
                   experience = excluded.experience,
                   updated_at = datetime('now')",
                params![
                    profile.id.as_str(),
                    profile.full_name,
                    profile.bio,
                    skills,
                    profile.location,
                    profile.avatar_url,
                    profile.hourly_rate,
                    profile.role.as_str(),
                    profile.experience,
                ],
            )
            .map_err(|e| Error::Database(format!("failed to upsert profile: {e}")))?;
        Ok(())
    }

    /// Insert a project owned by `client_id`. Returns the project id.
    pub fn insert_project(
        &self,
        client_id: &UserId,
        project: &ProjectDescriptor,
        status: &str,
    ) -> Result<String> {
        let project_id = project
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let skills = serde_json::to_string(&project.skills)?;
        self.conn()?
            .execute(
                "INSERT INTO projects
                    (id, client_id, title, category, budget_min, budget_max, description, skills, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    project_id,
                    client_id.as_str(),
                    project.title,
                    project.category,
                    project.budget_min,
                    project.budget_max,
                    project.description,
                    skills,
                    status,
                    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
                ],
            )
            .map_err(|e| Error::Database(format!("failed to insert project: {e}")))?;
        Ok(project_id)
    }

    /// Load profiles and projects from a seed document.
    pub fn apply_seed(&self, seed: &SeedData) -> Result<()> {
        for profile in &seed.profiles {
            self.upsert_profile(profile)?;
        }
        for entry in &seed.projects {
            self.insert_project(&entry.client_id, &entry.project, &entry.status)?;
        }
        info!(
            "applied seed: {} profiles, {} projects",
            seed.profiles.len(),
            seed.projects.len()
        );
        Ok(())
    }

    /// Delete interaction rows older than `days`. Returns the number of rows removed.
    pub fn purge_interactions_older_than(&self, days: u32) -> Result<usize> {
        let cutoff = Utc::now() - Duration::days(i64::from(days));
        let deleted = self
            .conn()?
            .execute(
                "DELETE FROM interactions WHERE created_at < ?1",
                params![cutoff.to_rfc3339_opts(SecondsFormat::Micros, true)],
            )
            .map_err(|e| Error::Database(format!("failed to purge interactions: {e}")))?;
        if deleted > 0 {
            info!("purged {} interactions older than {} days", deleted, days);
        }
        Ok(deleted)
    }

    pub fn count_interactions(&self, user_id: &UserId) -> Result<usize> {
        let count: i64 = self
            .conn()?
            .query_row(
                "SELECT count(*) FROM interactions WHERE user_id = ?1",
                params![user_id.as_str()],
                |row| row.get(0),
            )
            .map_err(|e| Error::Database(format!("failed to count interactions: {e}")))?;
        Ok(count as usize)
    }

    fn load_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>> {
        self.conn()?
            .query_row(
                "SELECT id, full_name, bio, skills, location, avatar_url, hourly_rate, role, experience
                 FROM profiles WHERE id = ?1",
                params![user_id.as_str()],
                profile_from_row,
            )
            .optional()
            .map_err(|e| Error::Database(format!("failed to load profile: {e}")))
    }

    fn load_recent_interactions(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<InteractionSummary>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT message, response, created_at
                 FROM interactions
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?2",
            )
            .map_err(|e| Error::Database(format!("failed to prepare interaction query: {e}")))?;

        let rows = stmt
            .query_map(params![user_id.as_str(), limit as i64], |row| {
                let timestamp_raw: String = row.get(2)?;
                Ok(InteractionSummary {
                    message: row.get(0)?,
                    response: row.get(1)?,
                    timestamp: Some(parse_timestamp(&timestamp_raw)),
                })
            })
            .map_err(|e| Error::Database(format!("failed to load interactions: {e}")))?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::Database(format!("failed to read interaction row: {e}")))
    }

    fn load_active_project(&self, user_id: &UserId) -> Result<Option<ProjectDescriptor>> {
        self.conn()?
            .query_row(
                "SELECT id, title, category, budget_min, budget_max, description, skills
                 FROM projects
                 WHERE client_id = ?1 AND status = 'open'
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT 1",
                params![user_id.as_str()],
                project_from_row,
            )
            .optional()
            .map_err(|e| Error::Database(format!("failed to load active project: {e}")))
    }

    fn load_open_projects_excluding(&self, user_id: &UserId) -> Result<Vec<ProjectDescriptor>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, title, category, budget_min, budget_max, description, skills
                 FROM projects
                 WHERE status = 'open' AND client_id != ?1",
            )
            .map_err(|e| Error::Database(format!("failed to prepare project query: {e}")))?;

        let rows = stmt
            .query_map(params![user_id.as_str()], project_from_row)
            .map_err(|e| Error::Database(format!("failed to load projects: {e}")))?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::Database(format!("failed to read project row: {e}")))
    }

    /// Providers other than the owner of `project_id`, if that project is stored.
    fn load_service_providers(&self, project_id: Option<&str>) -> Result<Vec<UserProfile>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, full_name, bio, skills, location, avatar_url, hourly_rate, role, experience
                 FROM profiles
                 WHERE role IN ('provider', 'both')
                   AND id NOT IN (SELECT client_id FROM projects WHERE id = ?1)",
            )
            .map_err(|e| Error::Database(format!("failed to prepare provider query: {e}")))?;

        let rows = stmt
            .query_map(params![project_id], profile_from_row)
            .map_err(|e| Error::Database(format!("failed to load providers: {e}")))?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::Database(format!("failed to read provider row: {e}")))
    }

    fn insert_interaction(&self, record: &InteractionRecord) -> Result<()> {
        self.conn()?
            .execute(
                "INSERT INTO interactions (id, user_id, message, response, intent, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.id,
                    record.user_id.as_str(),
                    record.message,
                    record.response,
                    record.intent.as_str(),
                    record.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
                ],
            )
            .map_err(|e| Error::Database(format!("failed to append interaction: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl ContextStore for SqliteContextStore {
    async fn fetch_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>> {
        self.load_profile(user_id)
    }

    async fn fetch_recent_interactions(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<InteractionSummary>> {
        self.load_recent_interactions(user_id, limit)
    }

    async fn fetch_active_project(&self, user_id: &UserId) -> Result<Option<ProjectDescriptor>> {
        self.load_active_project(user_id)
    }

    async fn fetch_matching_projects(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<MatchCandidate>> {
        let Some(profile) = self.load_profile(user_id)? else {
            return Ok(Vec::new());
        };

        let mut matches: Vec<MatchCandidate> = self
            .load_open_projects_excluding(user_id)?
            .into_iter()
            .filter_map(|project| {
                let wanted = project_needles(&project);
                let (score, shared) = score_overlap(&profile.skills, &wanted);
                if score == 0 {
                    return None;
                }
                Some(MatchCandidate {
                    id: project.id.clone().unwrap_or_default(),
                    title: project.title.clone(),
                    score,
                    reason: format!("Coincide con tus habilidades: {}", shared.join(", ")),
                })
            })
            .collect();

        rank(&mut matches, limit);
        Ok(matches)
    }

    async fn fetch_matching_freelancers(
        &self,
        project: &ProjectDescriptor,
        limit: usize,
    ) -> Result<Vec<MatchCandidate>> {
        let wanted = project_needles(project);
        if wanted.is_empty() {
            warn!(
                "project '{}' has no skills or category to match against",
                project.title
            );
            return Ok(Vec::new());
        }

        let mut matches: Vec<MatchCandidate> = self
            .load_service_providers(project.id.as_deref())?
            .into_iter()
            .filter_map(|profile| {
                let (score, shared) = score_overlap(&profile.skills, &wanted);
                if score == 0 {
                    return None;
                }
                Some(MatchCandidate {
                    id: profile.id.to_string(),
                    title: profile
                        .full_name
                        .clone()
                        .unwrap_or_else(|| profile.id.to_string()),
                    score,
                    reason: format!("Domina: {}", shared.join(", ")),
                })
            })
            .collect();

        rank(&mut matches, limit);
        Ok(matches)
    }

    async fn append_interaction(&self, record: &InteractionRecord) -> Result<()> {
        self.insert_interaction(record)
    }
}

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<UserProfile> {
    let id: String = row.get(0)?;
    let skills_raw: String = row.get(3)?;
    let role_raw: String = row.get(7)?;
    Ok(UserProfile {
        id: UserId::from(id),
        full_name: row.get(1)?,
        bio: row.get(2)?,
        skills: parse_skills(&skills_raw),
        location: row.get(4)?,
        avatar_url: row.get(5)?,
        hourly_rate: row.get(6)?,
        role: UserRole::from(role_raw.as_str()),
        experience: row.get(8)?,
    })
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<ProjectDescriptor> {
    let skills_raw: String = row.get(6)?;
    Ok(ProjectDescriptor {
        id: Some(row.get(0)?),
        title: row.get(1)?,
        category: row.get(2)?,
        budget_min: row.get(3)?,
        budget_max: row.get(4)?,
        description: row.get(5)?,
        skills: parse_skills(&skills_raw),
    })
}

fn parse_skills(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!("ignoring malformed skills column: {e}");
        Vec::new()
    })
}

/// What a project asks for: its skills, or its category when no skills are listed.
fn project_needles(project: &ProjectDescriptor) -> Vec<String> {
    if !project.skills.is_empty() {
        return project.skills.clone();
    }
    project.category.iter().cloned().collect()
}

/// Share of `wanted` covered by `have` (case-insensitive), as 0-100, plus the shared items.
fn score_overlap(have: &[String], wanted: &[String]) -> (u8, Vec<String>) {
    if wanted.is_empty() {
        return (0, Vec::new());
    }
    let have: Vec<String> = have.iter().map(|s| s.trim().to_lowercase()).collect();
    let shared: Vec<String> = wanted
        .iter()
        .filter(|w| have.contains(&w.trim().to_lowercase()))
        .cloned()
        .collect();
    let score = (shared.len() * 100 / wanted.len()).min(100) as u8;
    (score, shared)
}

fn rank(matches: &mut Vec<MatchCandidate>, limit: usize) {
    matches.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.title.cmp(&b.title)));
    matches.truncate(limit);
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gow_common::Intent;

    fn provider(id: &str, name: &str, skills: &[&str]) -> UserProfile {
        UserProfile {
            id: UserId::from(id),
            full_name: Some(name.to_string()),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            role: UserRole::Provider,
            ..Default::default()
        }
    }

    fn project(title: &str, skills: &[&str]) -> ProjectDescriptor {
        ProjectDescriptor {
            title: title.to_string(),
            category: Some("desarrollo".to_string()),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn in_memory_creates_context_tables() {
        let store = SqliteContextStore::in_memory().expect("in-memory store should open");
        let conn = store.conn().unwrap();
        for table in ["profiles", "projects", "interactions"] {
            let exists: i64 = conn
                .query_row(
                    "SELECT count(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    params![table],
                    |row| row.get(0),
                )
                .expect("failed to query sqlite_master");
            assert_eq!(exists, 1, "missing table {table}");
        }
    }

    #[tokio::test]
    async fn profile_round_trips_through_upsert() {
        let store = SqliteContextStore::in_memory().unwrap();
        let mut profile = provider("u1", "Lucía", &["rust", "sql"]);
        profile.hourly_rate = Some(40.0);
        store.upsert_profile(&profile).unwrap();

        profile.bio = Some("Backend".to_string());
        store.upsert_profile(&profile).unwrap();

        let loaded = store
            .fetch_profile(&UserId::from("u1"))
            .await
            .unwrap()
            .expect("profile should exist");
        assert_eq!(loaded.full_name.as_deref(), Some("Lucía"));
        assert_eq!(loaded.bio.as_deref(), Some("Backend"));
        assert_eq!(loaded.skills, vec!["rust", "sql"]);
        assert_eq!(loaded.hourly_rate, Some(40.0));
        assert_eq!(loaded.role, UserRole::Provider);
    }

    #[tokio::test]
    async fn missing_profile_is_none() {
        let store = SqliteContextStore::in_memory().unwrap();
        assert!(
            store
                .fetch_profile(&UserId::from("ghost"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn recent_interactions_are_most_recent_first_and_bounded() {
        let store = SqliteContextStore::in_memory().unwrap();
        let user = UserId::from("u1");
        for i in 0..4 {
            let mut record = InteractionRecord::new(
                user.clone(),
                format!("pregunta {i}"),
                format!("respuesta {i}"),
                Intent::General,
            );
            record.timestamp = Utc::now() - Duration::minutes(10 - i);
            store.append_interaction(&record).await.unwrap();
        }

        let recent = store.fetch_recent_interactions(&user, 3).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].message, "pregunta 3");
        assert_eq!(recent[2].message, "pregunta 1");
        assert_eq!(store.count_interactions(&user).unwrap(), 4);
    }

    #[tokio::test]
    async fn active_project_is_latest_open_one() {
        let store = SqliteContextStore::in_memory().unwrap();
        let client = UserId::from("c1");
        store
            .insert_project(&client, &project("Viejo", &["php"]), "closed")
            .unwrap();
        store
            .insert_project(&client, &project("App móvil", &["flutter"]), "open")
            .unwrap();

        let active = store
            .fetch_active_project(&client)
            .await
            .unwrap()
            .expect("open project expected");
        assert_eq!(active.title, "App móvil");
        assert_eq!(active.skills, vec!["flutter"]);
        assert!(active.id.is_some());
    }

    #[tokio::test]
    async fn matching_projects_ranks_by_skill_overlap() {
        let store = SqliteContextStore::in_memory().unwrap();
        store
            .upsert_profile(&provider("dev", "Dev", &["Rust", "SQL"]))
            .unwrap();
        let client = UserId::from("c1");
        store
            .insert_project(&client, &project("API en Rust", &["rust", "sql"]), "open")
            .unwrap();
        store
            .insert_project(&client, &project("Web mixta", &["rust", "react"]), "open")
            .unwrap();
        store
            .insert_project(&client, &project("Diseño", &["figma"]), "open")
            .unwrap();

        let matches = store
            .fetch_matching_projects(&UserId::from("dev"), 5)
            .await
            .unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].title, "API en Rust");
        assert_eq!(matches[0].score, 100);
        assert_eq!(matches[1].score, 50);
        assert!(matches[1].reason.contains("rust"));
    }

    #[tokio::test]
    async fn matching_projects_without_profile_is_empty() {
        let store = SqliteContextStore::in_memory().unwrap();
        let matches = store
            .fetch_matching_projects(&UserId::from("ghost"), 3)
            .await
            .unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn matching_freelancers_respects_limit() {
        let store = SqliteContextStore::in_memory().unwrap();
        for (id, skills) in [
            ("a", vec!["flutter", "dart"]),
            ("b", vec!["flutter"]),
            ("c", vec!["dart"]),
            ("d", vec!["go"]),
        ] {
            store.upsert_profile(&provider(id, id, &skills)).unwrap();
        }
        let wanted = project("App", &["flutter", "dart"]);

        let matches = store.fetch_matching_freelancers(&wanted, 2).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "a");
        assert_eq!(matches[0].score, 100);
    }

    #[tokio::test]
    async fn matching_freelancers_falls_back_to_category() {
        let store = SqliteContextStore::in_memory().unwrap();
        store
            .upsert_profile(&provider("a", "Ana", &["Desarrollo"]))
            .unwrap();
        let wanted = project("Sitio", &[]);

        let matches = store.fetch_matching_freelancers(&wanted, 3).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].title, "Ana");
    }

    #[tokio::test]
    async fn matching_freelancers_skips_the_project_owner() {
        let store = SqliteContextStore::in_memory().unwrap();
        let mut owner = provider("me", "Yo", &["figma"]);
        owner.role = UserRole::Both;
        store.upsert_profile(&owner).unwrap();
        store
            .upsert_profile(&provider("other", "Otra", &["figma"]))
            .unwrap();
        let project_id = store
            .insert_project(&UserId::from("me"), &project("Logo", &["figma"]), "open")
            .unwrap();

        let mut wanted = project("Logo", &["figma"]);
        wanted.id = Some(project_id);
        let matches = store.fetch_matching_freelancers(&wanted, 5).await.unwrap();
        let ids: Vec<_> = matches.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["other"]);
    }

    #[tokio::test]
    async fn purge_removes_only_old_interactions() {
        let store = SqliteContextStore::in_memory().unwrap();
        let user = UserId::from("u1");
        let mut old = InteractionRecord::new(user.clone(), "hola", "hola", Intent::General);
        old.timestamp = Utc::now() - Duration::days(31);
        store.append_interaction(&old).await.unwrap();
        let fresh = InteractionRecord::new(user.clone(), "hey", "hey", Intent::General);
        store.append_interaction(&fresh).await.unwrap();

        assert_eq!(store.purge_interactions_older_than(30).unwrap(), 1);
        assert_eq!(store.count_interactions(&user).unwrap(), 1);
    }

    #[test]
    fn seed_document_loads_profiles_and_projects() {
        let seed: SeedData = serde_json::from_value(serde_json::json!({
            "profiles": [{ "id": "p1", "fullName": "Pablo", "skills": ["seo"], "role": "freelancer" }],
            "projects": [{ "clientId": "c1", "title": "Blog", "skills": ["seo"] }]
        }))
        .unwrap();

        let store = SqliteContextStore::in_memory().unwrap();
        store.apply_seed(&seed).unwrap();

        let profile = store.load_profile(&UserId::from("p1")).unwrap().unwrap();
        assert_eq!(profile.role, UserRole::Provider);
        let project = store
            .load_active_project(&UserId::from("c1"))
            .unwrap()
            .unwrap();
        assert_eq!(project.title, "Blog");
    }

    #[test]
    fn score_overlap_is_case_insensitive() {
        let (score, shared) = score_overlap(
            &["RUST".to_string()],
            &["rust".to_string(), "go".to_string()],
        );
        assert_eq!(score, 50);
        assert_eq!(shared, vec!["rust"]);
    }
}
