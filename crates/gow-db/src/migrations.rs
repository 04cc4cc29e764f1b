/// A versioned block of schema SQL applied with `execute_batch`.
pub struct Migration {
    pub version: u32,
    pub sql: &'static str,
}

pub const CONTEXT_SCHEMA_V1: Migration = Migration {
    version: 1,
    sql: "CREATE TABLE IF NOT EXISTS profiles (
            id TEXT PRIMARY KEY,
            full_name TEXT,
            bio TEXT,
            skills TEXT NOT NULL DEFAULT '[]',
            location TEXT,
            avatar_url TEXT,
            hourly_rate REAL,
            role TEXT NOT NULL DEFAULT 'new',
            experience TEXT,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS projects (
            id TEXT PRIMARY KEY,
            client_id TEXT NOT NULL,
            title TEXT NOT NULL,
            category TEXT,
            budget_min REAL,
            budget_max REAL,
            description TEXT,
            skills TEXT NOT NULL DEFAULT '[]',
            status TEXT NOT NULL DEFAULT 'open',
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_projects_client_status
            ON projects(client_id, status);

        CREATE TABLE IF NOT EXISTS interactions (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            message TEXT NOT NULL,
            response TEXT NOT NULL,
            intent TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_interactions_user_created_at
            ON interactions(user_id, created_at);",
};
