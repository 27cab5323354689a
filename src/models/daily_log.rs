//! Daily log model
//!
//! One calendar day of food for one user. Totals are always derived from the
//! contained entries; see `nutrition::aggregator`.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, Row, TransactionBehavior};
use serde::{Deserialize, Serialize};

use super::{FoodEntry, Meal};
use crate::db::DbResult;

/// Storage format for log dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A day container for meals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLog {
    /// Row id once persisted
    pub id: Option<i64>,
    pub user_id: String,
    pub date: NaiveDate,
    pub meals: Vec<Meal>,
    /// Manual total set by the user; display layers prefer it over the computed sum
    pub total_calories_override: Option<f64>,
}

impl DailyLog {
    /// A fresh, unsaved log with one default meal
    pub fn empty(user_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: None,
            user_id: user_id.into(),
            date,
            meals: vec![Meal::default_meal()],
            total_calories_override: None,
        }
    }

    /// Iterate every entry across all meals
    pub fn entries(&self) -> impl Iterator<Item = &FoodEntry> {
        self.meals.iter().flat_map(|m| m.food_items.iter())
    }

    pub fn contains_food(&self, food_id: &str) -> bool {
        self.meals.iter().any(|m| m.contains_food(food_id))
    }

    /// Append a timestamped copy of `entry` to the first meal, creating one if needed
    pub fn add_food(&mut self, entry: &FoodEntry, now: DateTime<Utc>) {
        let stamped = entry.stamped(now);
        match self.meals.first_mut() {
            Some(meal) => meal.food_items.push(stamped),
            None => {
                let mut meal = Meal::default_meal();
                meal.food_items.push(stamped);
                self.meals.push(meal);
            }
        }
    }

    /// Remove every entry with this id from every meal; meals themselves are kept
    pub fn remove_food(&mut self, food_id: &str) -> bool {
        let removed: usize = self.meals.iter_mut().map(|m| m.remove_food(food_id)).sum();
        removed > 0
    }

    /// Replace any entry with the same id, or add it; returns true when replacing
    pub fn upsert_food(&mut self, entry: &FoodEntry, now: DateTime<Utc>) -> bool {
        let replaced = self.remove_food(&entry.id);
        self.add_food(entry, now);
        replaced
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let date_str: String = row.get("date")?;
        let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(Self {
            id: Some(row.get("id")?),
            user_id: row.get("user_id")?,
            date,
            meals: Vec::new(),
            total_calories_override: row.get("total_calories_override")?,
        })
    }

    fn with_meals(mut self, conn: &Connection) -> DbResult<Self> {
        if let Some(id) = self.id {
            self.meals = Meal::load_for_log(conn, id)?;
        }
        Ok(self)
    }

    /// Get a user's log for a date
    pub fn get_by_date(conn: &Connection, user_id: &str, date: NaiveDate) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM daily_logs WHERE user_id = ?1 AND date = ?2")?;

        let result = stmt.query_row(
            params![user_id, date.format(DATE_FORMAT).to_string()],
            Self::from_row,
        );
        match result {
            Ok(log) => Ok(Some(log.with_meals(conn)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get or create a user's log for a date
    ///
    /// Returns the log and whether it was newly created.
    pub fn find_or_create(conn: &mut Connection, user_id: &str, date: NaiveDate) -> DbResult<(Self, bool)> {
        let (log, created) = Self::update(conn, user_id, date, |log| log.id.is_none())?;
        if created {
            tracing::info!("Created daily log for {} on {}", user_id, date);
        }
        Ok((log, created))
    }

    /// Persist this log, replacing its stored meals and entries
    ///
    /// The whole log is written in one transaction; the last save wins.
    pub fn save(&self, conn: &Connection) -> DbResult<i64> {
        let tx = conn.unchecked_transaction()?;
        let log_id = self.write(&tx)?;
        tx.commit()?;
        Ok(log_id)
    }

    /// Read, change, and write back one day while holding the write lock
    ///
    /// `change` returns whether it modified the log; nothing is written otherwise.
    /// Concurrent callers for the same database queue on the lock, so no update
    /// is lost between the read and the write.
    pub fn update<F>(conn: &mut Connection, user_id: &str, date: NaiveDate, change: F) -> DbResult<(Self, bool)>
    where
        F: FnOnce(&mut Self) -> bool,
    {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut log = match Self::get_by_date(&tx, user_id, date)? {
            Some(log) => log,
            None => Self::empty(user_id, date),
        };

        let changed = change(&mut log);
        if changed {
            log.id = Some(log.write(&tx)?);
        }
        tx.commit()?;
        Ok((log, changed))
    }

    fn write(&self, conn: &Connection) -> DbResult<i64> {
        let date = self.date.format(DATE_FORMAT).to_string();

        conn.execute(
            r#"
            INSERT INTO daily_logs (user_id, date, total_calories_override)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id, date) DO UPDATE SET
                total_calories_override = excluded.total_calories_override,
                updated_at = datetime('now')
            "#,
            params![self.user_id, date, self.total_calories_override],
        )?;

        let log_id: i64 = conn.query_row(
            "SELECT id FROM daily_logs WHERE user_id = ?1 AND date = ?2",
            params![self.user_id, date],
            |row| row.get(0),
        )?;

        conn.execute(
            "DELETE FROM food_entries WHERE meal_row_id IN (SELECT row_id FROM meals WHERE daily_log_id = ?1)",
            [log_id],
        )?;
        conn.execute("DELETE FROM meals WHERE daily_log_id = ?1", [log_id])?;

        for (position, meal) in self.meals.iter().enumerate() {
            meal.insert(conn, log_id, position)?;
        }
        Ok(log_id)
    }

    /// All logs for a user, newest first
    pub fn history(conn: &Connection, user_id: &str, limit: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM daily_logs WHERE user_id = ?1 ORDER BY date DESC LIMIT ?2",
        )?;

        let logs = stmt
            .query_map(params![user_id, limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        logs.into_iter().map(|log| log.with_meals(conn)).collect()
    }

    /// Set or clear the manual calorie total for a day, creating the day if needed
    pub fn set_calorie_override(
        conn: &mut Connection,
        user_id: &str,
        date: NaiveDate,
        total: Option<f64>,
    ) -> DbResult<Self> {
        let total = total.filter(|t| t.is_finite() && *t >= 0.0);
        let (log, _) = Self::update(conn, user_id, date, |log| {
            log.total_calories_override = total;
            true
        })?;
        Ok(log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::Nutrients;
    use chrono::TimeZone;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 13).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 13, 8, 30, 0).unwrap()
    }

    fn banana() -> FoodEntry {
        FoodEntry::new("fs-1", "Banana", Nutrients::new(105.0, 1.3, 27.0, 0.4), "1 medium", 118.0)
    }

    #[test]
    fn test_empty_log_has_default_meal() {
        let log = DailyLog::empty("u1", day());
        assert_eq!(log.meals.len(), 1);
        assert_eq!(log.meals[0].name, "All Meals");
        assert_eq!(log.entries().count(), 0);
    }

    #[test]
    fn test_add_food_stamps_and_appends_to_first_meal() {
        let mut log = DailyLog::empty("u1", day());
        log.meals.push(Meal::new("Dinner"));
        log.add_food(&banana(), now());

        assert_eq!(log.meals[0].food_items.len(), 1);
        assert_eq!(log.meals[0].food_items[0].timestamp, Some(now()));
        assert!(log.meals[1].food_items.is_empty());
    }

    #[test]
    fn test_add_food_creates_meal_when_none() {
        let mut log = DailyLog::empty("u1", day());
        log.meals.clear();
        log.add_food(&banana(), now());
        assert_eq!(log.meals.len(), 1);
        assert_eq!(log.meals[0].name, "All Meals");
    }

    #[test]
    fn test_remove_last_food_keeps_meal() {
        let mut log = DailyLog::empty("u1", day());
        log.add_food(&banana(), now());
        assert!(log.remove_food("fs-1"));
        assert_eq!(log.meals.len(), 1);
        assert!(log.meals[0].food_items.is_empty());
        assert!(!log.remove_food("fs-1"));
    }

    #[test]
    fn test_remove_searches_all_meals() {
        let mut log = DailyLog::empty("u1", day());
        let mut dinner = Meal::new("Dinner");
        dinner.food_items.push(banana());
        log.meals.push(dinner);
        assert!(log.contains_food("fs-1"));
        assert!(log.remove_food("fs-1"));
        assert!(!log.contains_food("fs-1"));
    }

    #[test]
    fn test_upsert_replaces_existing_entry() {
        let mut log = DailyLog::empty("u1", day());
        log.add_food(&banana(), now());

        let mut bigger = banana();
        bigger.nutrients = bigger.nutrients.scale(2.0);
        assert!(log.upsert_food(&bigger, now()));
        assert_eq!(log.entries().count(), 1);
        assert_eq!(log.entries().next().unwrap().nutrients.calories, 210.0);

        let other = FoodEntry::new("fs-2", "Rice", Nutrients::new(200.0, 4.0, 44.0, 0.4), "1 cup", 158.0);
        assert!(!log.upsert_food(&other, now()));
        assert_eq!(log.entries().count(), 2);
    }

    #[test]
    fn test_find_or_create_then_find() {
        let mut conn = test_conn();
        let (log, created) = DailyLog::find_or_create(&mut conn, "u1", day()).unwrap();
        assert!(created);
        assert!(log.id.is_some());
        assert_eq!(log.meals.len(), 1);

        let (again, created) = DailyLog::find_or_create(&mut conn, "u1", day()).unwrap();
        assert!(!created);
        assert_eq!(again.id, log.id);
        assert_eq!(again.meals[0].id, log.meals[0].id);

        let (other_user, created) = DailyLog::find_or_create(&mut conn, "u2", day()).unwrap();
        assert!(created);
        assert_ne!(other_user.id, log.id);
    }

    #[test]
    fn test_save_round_trips_entries() {
        let mut conn = test_conn();
        let (mut log, _) = DailyLog::find_or_create(&mut conn, "u1", day()).unwrap();
        log.add_food(&banana(), now());
        log.save(&conn).unwrap();

        let loaded = DailyLog::get_by_date(&conn, "u1", day()).unwrap().unwrap();
        assert_eq!(loaded.meals, log.meals);

        log.remove_food("fs-1");
        log.save(&conn).unwrap();
        let loaded = DailyLog::get_by_date(&conn, "u1", day()).unwrap().unwrap();
        assert_eq!(loaded.meals.len(), 1);
        assert!(loaded.meals[0].food_items.is_empty());
    }

    #[test]
    fn test_update_writes_only_when_changed() {
        let mut conn = test_conn();
        let (log, changed) = DailyLog::update(&mut conn, "u1", day(), |log| log.remove_food("fs-1")).unwrap();
        assert!(!changed);
        assert!(log.id.is_none());
        assert!(DailyLog::get_by_date(&conn, "u1", day()).unwrap().is_none());

        let (log, changed) = DailyLog::update(&mut conn, "u1", day(), |log| {
            log.add_food(&banana(), now());
            true
        })
        .unwrap();
        assert!(changed);
        assert!(log.id.is_some());

        let loaded = DailyLog::get_by_date(&conn, "u1", day()).unwrap().unwrap();
        assert_eq!(loaded.entries().count(), 1);
        assert_eq!(loaded.id, log.id);
    }

    #[test]
    fn test_history_newest_first() {
        let mut conn = test_conn();
        let earlier = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        DailyLog::find_or_create(&mut conn, "u1", earlier).unwrap();
        DailyLog::find_or_create(&mut conn, "u1", day()).unwrap();
        DailyLog::find_or_create(&mut conn, "u2", day()).unwrap();

        let history = DailyLog::history(&conn, "u1", 50).unwrap();
        let dates: Vec<_> = history.iter().map(|l| l.date).collect();
        assert_eq!(dates, vec![day(), earlier]);
    }

    #[test]
    fn test_calorie_override() {
        let mut conn = test_conn();
        let log = DailyLog::set_calorie_override(&mut conn, "u1", day(), Some(1800.0)).unwrap();
        assert_eq!(log.total_calories_override, Some(1800.0));

        let loaded = DailyLog::get_by_date(&conn, "u1", day()).unwrap().unwrap();
        assert_eq!(loaded.total_calories_override, Some(1800.0));

        DailyLog::set_calorie_override(&mut conn, "u1", day(), None).unwrap();
        let loaded = DailyLog::get_by_date(&conn, "u1", day()).unwrap().unwrap();
        assert_eq!(loaded.total_calories_override, None);
    }
}
