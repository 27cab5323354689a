//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
        tracing::info!("Applied schema migration v1");
    }

    Ok(())
}

/// Migration v1: Initial schema
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- DAILY LOGS
        -- One row per user per calendar day
        -- ============================================
        CREATE TABLE daily_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            date TEXT NOT NULL,                  -- ISO date: "2026-01-13"
            total_calories_override REAL,        -- manual total, NULL when unset
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),

            UNIQUE(user_id, date)
        );

        CREATE INDEX idx_daily_logs_user_date ON daily_logs(user_id, date);

        -- ============================================
        -- MEALS
        -- Ordered groups of entries inside a log
        -- ============================================
        CREATE TABLE meals (
            row_id INTEGER PRIMARY KEY AUTOINCREMENT,
            daily_log_id INTEGER NOT NULL REFERENCES daily_logs(id) ON DELETE CASCADE,
            meal_id TEXT NOT NULL,               -- stable UUID
            name TEXT NOT NULL,
            position INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX idx_meals_log ON meals(daily_log_id);

        -- ============================================
        -- FOOD ENTRIES
        -- Logged items with nutrients for the serving eaten
        -- ============================================
        CREATE TABLE food_entries (
            row_id INTEGER PRIMARY KEY AUTOINCREMENT,
            meal_row_id INTEGER NOT NULL REFERENCES meals(row_id) ON DELETE CASCADE,
            entry_id TEXT NOT NULL,              -- catalog id, barcode, or UUID
            name TEXT NOT NULL,
            calories REAL NOT NULL DEFAULT 0,
            protein REAL NOT NULL DEFAULT 0,     -- grams
            carbs REAL NOT NULL DEFAULT 0,       -- grams
            fat REAL NOT NULL DEFAULT 0,         -- grams
            serving_size TEXT NOT NULL,          -- label, e.g. "2oz"
            serving_weight REAL NOT NULL DEFAULT 100,
            timestamp TEXT,                      -- RFC 3339
            position INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX idx_food_entries_meal ON food_entries(meal_row_id);

        -- ============================================
        -- GOAL PROFILES
        -- ============================================
        CREATE TABLE goal_profiles (
            user_id TEXT PRIMARY KEY,
            calories REAL,
            protein REAL NOT NULL,
            carbs REAL NOT NULL,
            fat REAL NOT NULL,
            protein_pct REAL NOT NULL,
            carbs_pct REAL NOT NULL,
            fat_pct REAL NOT NULL,
            weight REAL NOT NULL,                -- pounds
            height REAL NOT NULL,                -- centimeters
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- ============================================
        -- WEIGHT HISTORY
        -- ============================================
        CREATE TABLE weight_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            weight REAL NOT NULL,                -- pounds
            timestamp TEXT NOT NULL              -- RFC 3339
        );

        CREATE INDEX idx_weight_history_user_time ON weight_history(user_id, timestamp);

        -- ============================================
        -- MANUAL FOODS
        -- User-entered barcode products
        -- ============================================
        CREATE TABLE manual_foods (
            barcode TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            calories REAL NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        "#,
    )?;

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);
    Ok(version)
}

/// Check if the database needs migration
pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    let current = get_schema_version(conn)?;
    Ok(current < SCHEMA_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(needs_migration_after_table(&conn));
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
        assert!(!needs_migration(&conn).unwrap());
    }

    fn needs_migration_after_table(conn: &Connection) -> bool {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (version INTEGER PRIMARY KEY, applied_at TEXT NOT NULL DEFAULT (datetime('now')))",
            [],
        )
        .unwrap();
        needs_migration(conn).unwrap()
    }
}
