//! Daily log MCP tools
//!
//! Tools for finding days, logging food, and reading day summaries, plus the
//! listener that refreshes a day's summary after each change.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::resolve_date;
use crate::db::Database;
use crate::events::{EventBus, NutritionEvent};
use crate::models::{DailyLog, FoodEntry, GoalProfile, Macros, DATE_FORMAT};
use crate::nutrition::{adjust_serving, summarize, total_calories, total_macros, DaySummary, ServingRequest};

/// Response for get_or_create_day
#[derive(Debug, Serialize)]
pub struct GetOrCreateDayResponse {
    pub id: Option<i64>,
    pub date: String,
    pub created: bool, // true if newly created, false if already existed
    pub log: DailyLog,
}

/// Response for tools that change a day's entries
#[derive(Debug, Serialize)]
pub struct LogChangeResponse {
    pub entry: Option<FoodEntry>,
    pub summary: DaySummary,
}

/// Response for remove_food_from_log
#[derive(Debug, Serialize)]
pub struct RemoveFoodResponse {
    pub food_id: String,
    pub removed: bool,
    pub summary: DaySummary,
}

/// One row of list_daily_history
#[derive(Debug, Serialize)]
pub struct HistoryDay {
    pub date: String,
    pub total_calories: f64,
    pub displayed_calories: f64,
    pub macros: Macros,
    pub entry_count: usize,
}

/// Response for list_daily_history
#[derive(Debug, Serialize)]
pub struct ListHistoryResponse {
    pub user_id: String,
    pub days: Vec<HistoryDay>,
}

// ============================================================================
// Helpers
// ============================================================================

fn load_or_create(db: &Database, user_id: &str, date: Option<&str>) -> Result<(DailyLog, bool), String> {
    let date = resolve_date(date)?;
    let mut conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    DailyLog::find_or_create(&mut conn, user_id, date).map_err(|e| format!("Failed to load day: {}", e))
}

fn load_goals(db: &Database, user_id: &str) -> Result<GoalProfile, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    GoalProfile::load(&conn, user_id).map_err(|e| format!("Failed to load goals: {}", e))
}

/// Apply `change` to a day under the database write lock, then publish and summarize
///
/// Returns the updated log, whether it changed, and its summary.
fn update_day<F>(
    db: &Database,
    events: &EventBus,
    user_id: &str,
    date: NaiveDate,
    change: F,
) -> Result<(DailyLog, bool, DaySummary), String>
where
    F: FnOnce(&mut DailyLog) -> bool,
{
    let (log, changed) = {
        let mut conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
        DailyLog::update(&mut conn, user_id, date, change).map_err(|e| format!("Failed to save day: {}", e))?
    };

    if changed {
        events.publish(NutritionEvent::LogUpdated {
            user_id: user_id.to_string(),
            date,
        });
    }

    let goals = load_goals(db, user_id)?;
    let summary = summarize(&log, &goals);
    Ok((log, changed, summary))
}

/// Apply the optional serving adjustment and give manual entries an id
fn prepare_entry(mut entry: FoodEntry, serving: Option<&ServingRequest>) -> FoodEntry {
    if entry.id.trim().is_empty() {
        entry.id = uuid::Uuid::new_v4().to_string();
    }
    let entry = FoodEntry::new(entry.id, entry.name, entry.nutrients, entry.serving_size, entry.serving_weight);
    match serving {
        Some(request) => adjust_serving(&entry, request).apply_to(&entry),
        None => entry,
    }
}

// ============================================================================
// Day Tools
// ============================================================================

/// Get or create a user's log for a date
pub fn get_or_create_day(db: &Database, user_id: &str, date: Option<&str>) -> Result<GetOrCreateDayResponse, String> {
    let (log, created) = load_or_create(db, user_id, date)?;
    Ok(GetOrCreateDayResponse {
        id: log.id,
        date: log.date.format(DATE_FORMAT).to_string(),
        created,
        log,
    })
}

/// Totals and goal progress for a day; a missing day reads as empty without being created
pub fn get_day_summary(db: &Database, user_id: &str, date: Option<&str>) -> Result<DaySummary, String> {
    let date = resolve_date(date)?;
    let log = {
        let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
        DailyLog::get_by_date(&conn, user_id, date)
            .map_err(|e| format!("Failed to get day: {}", e))?
            .unwrap_or_else(|| DailyLog::empty(user_id, date))
    };
    let goals = load_goals(db, user_id)?;
    Ok(summarize(&log, &goals))
}

/// Add a food to a day, scaled to the requested serving
pub fn add_food_to_log(
    db: &Database,
    events: &EventBus,
    user_id: &str,
    date: Option<&str>,
    entry: FoodEntry,
    serving: Option<&ServingRequest>,
) -> Result<LogChangeResponse, String> {
    let date = resolve_date(date)?;
    let entry = prepare_entry(entry, serving);

    let (log, _, summary) = update_day(db, events, user_id, date, |log| {
        log.add_food(&entry, Utc::now());
        true
    })?;
    tracing::info!("Logged {} ({:.0} kcal) on {}", entry.name, entry.nutrients.calories, date);

    let logged = log.entries().find(|e| e.id == entry.id).cloned();
    Ok(LogChangeResponse { entry: logged, summary })
}

/// Replace a logged food with a new serving of it
pub fn update_food_in_log(
    db: &Database,
    events: &EventBus,
    user_id: &str,
    date: Option<&str>,
    entry: FoodEntry,
    serving: Option<&ServingRequest>,
) -> Result<LogChangeResponse, String> {
    let date = resolve_date(date)?;
    let entry = prepare_entry(entry, serving);

    let (log, found, summary) = update_day(db, events, user_id, date, |log| {
        if !log.contains_food(&entry.id) {
            return false;
        }
        log.upsert_food(&entry, Utc::now());
        true
    })?;
    if !found {
        return Err(format!("Food {} is not in the log for {}", entry.id, date));
    }

    let logged = log.entries().find(|e| e.id == entry.id).cloned();
    Ok(LogChangeResponse { entry: logged, summary })
}

/// Remove every entry with this id from a day
pub fn remove_food_from_log(
    db: &Database,
    events: &EventBus,
    user_id: &str,
    date: Option<&str>,
    food_id: &str,
) -> Result<RemoveFoodResponse, String> {
    let date = resolve_date(date)?;
    let (_, removed, summary) = update_day(db, events, user_id, date, |log| log.remove_food(food_id))?;

    Ok(RemoveFoodResponse {
        food_id: food_id.to_string(),
        removed,
        summary,
    })
}

/// Set or clear the manual calorie total shown for a day
pub fn set_calorie_override(
    db: &Database,
    events: &EventBus,
    user_id: &str,
    date: Option<&str>,
    total: Option<f64>,
) -> Result<DaySummary, String> {
    if let Some(t) = total {
        if !t.is_finite() || t < 0.0 {
            return Err(format!("Calorie override must be a non-negative number, got {}", t));
        }
    }

    let date = resolve_date(date)?;
    let (_, _, summary) = update_day(db, events, user_id, date, |log| {
        log.total_calories_override = total;
        true
    })?;
    Ok(summary)
}

/// List a user's days, newest first
pub fn list_daily_history(db: &Database, user_id: &str, limit: i64) -> Result<ListHistoryResponse, String> {
    let limit = limit.clamp(1, 365);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let logs = DailyLog::history(&conn, user_id, limit)
        .map_err(|e| format!("Failed to list days: {}", e))?;

    let days = logs
        .iter()
        .map(|log| {
            let total = total_calories(log);
            HistoryDay {
                date: log.date.format(DATE_FORMAT).to_string(),
                total_calories: total,
                displayed_calories: log.total_calories_override.unwrap_or(total),
                macros: total_macros(log),
                entry_count: log.entries().count(),
            }
        })
        .collect();

    Ok(ListHistoryResponse {
        user_id: user_id.to_string(),
        days,
    })
}

/// Log fresh day totals after every log change
///
/// Runs until every sender of the bus is dropped.
pub fn spawn_summary_listener(database: Database, events: &EventBus) -> JoinHandle<()> {
    let mut receiver = events.subscribe();
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(NutritionEvent::LogUpdated { user_id, date }) => {
                    let date = date.format(DATE_FORMAT).to_string();
                    let database = database.clone();
                    // SQLite reads block, keep them off the async workers
                    let refreshed = tokio::task::spawn_blocking(move || {
                        let summary = get_day_summary(&database, &user_id, Some(&date));
                        (user_id, date, summary)
                    })
                    .await;
                    match refreshed {
                        Ok((user_id, date, Ok(summary))) => tracing::debug!(
                            "{} {}: {:.0} kcal ({:.0}% of goal)",
                            user_id,
                            date,
                            summary.displayed_calories,
                            summary.progress.calories.percent
                        ),
                        Ok((user_id, date, Err(e))) => {
                            tracing::warn!("Could not refresh summary for {} {}: {}", user_id, date, e)
                        }
                        Err(e) => tracing::warn!("Summary refresh task failed: {}", e),
                    }
                }
                Ok(other) => tracing::debug!("Event: {:?}", other),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Summary listener skipped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Nutrients;
    use crate::nutrition::ServingUnit;
    use crate::tools::test_support::test_db;

    const DAY: Option<&str> = Some("2026-01-13");

    fn oats() -> FoodEntry {
        FoodEntry::new("fs-42", "Rolled Oats", Nutrients::new(150.0, 5.0, 27.0, 3.0), "40g", 40.0)
    }

    #[test]
    fn test_get_or_create_day_reports_creation() {
        let db = test_db();
        let first = get_or_create_day(&db, "u1", DAY).unwrap();
        assert!(first.created);
        assert_eq!(first.date, "2026-01-13");
        assert_eq!(first.log.meals.len(), 1);

        let second = get_or_create_day(&db, "u1", DAY).unwrap();
        assert!(!second.created);
        assert_eq!(second.id, first.id);
    }

    #[test]
    fn test_add_food_with_serving_updates_summary() {
        let db = test_db();
        let events = EventBus::new();
        let mut rx = events.subscribe();

        let request = ServingRequest::custom("2", "80", ServingUnit::Grams);
        let response = add_food_to_log(&db, &events, "u1", DAY, oats(), Some(&request)).unwrap();

        let entry = response.entry.unwrap();
        assert!(entry.timestamp.is_some());
        assert_eq!(entry.serving_size, "80g");
        assert!((entry.nutrients.calories - 600.0).abs() < 1e-9);
        assert!((response.summary.total_calories - 600.0).abs() < 1e-9);
        assert_eq!(response.summary.entry_count, 1);

        assert!(matches!(rx.try_recv(), Ok(NutritionEvent::LogUpdated { .. })));
    }

    #[test]
    fn test_manual_entry_gets_id() {
        let db = test_db();
        let events = EventBus::new();
        let mut entry = oats();
        entry.id = String::new();

        let response = add_food_to_log(&db, &events, "u1", DAY, entry, None).unwrap();
        assert!(!response.entry.unwrap().id.is_empty());
    }

    #[test]
    fn test_update_replaces_entry() {
        let db = test_db();
        let events = EventBus::new();
        add_food_to_log(&db, &events, "u1", DAY, oats(), None).unwrap();

        let response =
            update_food_in_log(&db, &events, "u1", DAY, oats(), Some(&ServingRequest::servings("3"))).unwrap();
        assert_eq!(response.summary.entry_count, 1);
        assert!((response.summary.total_calories - 450.0).abs() < 1e-9);

        let mut missing = oats();
        missing.id = "nope".into();
        assert!(update_food_in_log(&db, &events, "u1", DAY, missing, None).is_err());
    }

    #[test]
    fn test_remove_food() {
        let db = test_db();
        let events = EventBus::new();
        add_food_to_log(&db, &events, "u1", DAY, oats(), None).unwrap();

        let response = remove_food_from_log(&db, &events, "u1", DAY, "fs-42").unwrap();
        assert!(response.removed);
        assert_eq!(response.summary.total_calories, 0.0);

        let response = remove_food_from_log(&db, &events, "u1", DAY, "fs-42").unwrap();
        assert!(!response.removed);
        assert_eq!(response.summary.entry_count, 0);

        let day = get_or_create_day(&db, "u1", DAY).unwrap();
        assert_eq!(day.log.meals.len(), 1);
    }

    #[test]
    fn test_calorie_override() {
        let db = test_db();
        let events = EventBus::new();
        add_food_to_log(&db, &events, "u1", DAY, oats(), None).unwrap();

        let summary = set_calorie_override(&db, &events, "u1", DAY, Some(900.0)).unwrap();
        assert_eq!(summary.total_calories, 150.0);
        assert_eq!(summary.displayed_calories, 900.0);

        assert!(set_calorie_override(&db, &events, "u1", DAY, Some(-1.0)).is_err());

        let summary = set_calorie_override(&db, &events, "u1", DAY, None).unwrap();
        assert_eq!(summary.displayed_calories, 150.0);
    }

    #[test]
    fn test_summary_of_missing_day_does_not_create_it() {
        let db = test_db();
        let summary = get_day_summary(&db, "u1", DAY).unwrap();
        assert_eq!(summary.total_calories, 0.0);
        assert!(list_daily_history(&db, "u1", 10).unwrap().days.is_empty());
    }

    #[test]
    fn test_history_lists_newest_first() {
        let db = test_db();
        let events = EventBus::new();
        add_food_to_log(&db, &events, "u1", Some("2026-01-10"), oats(), None).unwrap();
        add_food_to_log(&db, &events, "u1", DAY, oats(), None).unwrap();

        let history = list_daily_history(&db, "u1", 10).unwrap();
        let dates: Vec<_> = history.days.iter().map(|d| d.date.as_str()).collect();
        assert_eq!(dates, vec!["2026-01-13", "2026-01-10"]);
        assert_eq!(history.days[0].total_calories, 150.0);
    }

    #[test]
    fn test_concurrent_adds_keep_every_entry() {
        let path = std::env::temp_dir().join(format!("calorie_beta_{}.db", uuid::Uuid::new_v4()));
        let db = Database::new(&path).unwrap();
        db.with_conn(crate::db::migrations::run_migrations).unwrap();
        let events = EventBus::new();

        std::thread::scope(|scope| {
            for i in 0..16 {
                let db = &db;
                let events = &events;
                scope.spawn(move || {
                    let mut food = oats();
                    food.id = format!("f{}", i);
                    add_food_to_log(db, events, "u1", DAY, food, None).unwrap();
                });
            }
        });

        let day = get_or_create_day(&db, "u1", DAY).unwrap();
        assert!(!day.created);
        assert_eq!(day.log.entries().count(), 16);
        assert!((get_day_summary(&db, "u1", DAY).unwrap().total_calories - 16.0 * 150.0).abs() < 1e-9);

        drop(db);
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }

    #[tokio::test]
    async fn test_summary_listener_runs_until_bus_closes() {
        let db = test_db();
        let events = EventBus::new();
        let listener = spawn_summary_listener(db.clone(), &events);

        add_food_to_log(&db, &events, "u1", DAY, oats(), None).unwrap();
        events.publish(NutritionEvent::GoalsUpdated { user_id: "u1".into() });
        drop(events);

        tokio::time::timeout(std::time::Duration::from_secs(5), listener)
            .await
            .unwrap()
            .unwrap();
    }
}
