//! Weight history model

use chrono::{DateTime, Duration, Months, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::food_entry::parse_timestamp;
use super::GoalProfile;
use crate::db::DbResult;

/// A single body-weight measurement, in pounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightRecord {
    pub id: i64,
    pub user_id: String,
    pub weight: f64,
    pub timestamp: DateTime<Utc>,
}

/// Window of history to display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Day,
    Week,
    Month,
    SixMonths,
    #[default]
    Year,
}

impl Timeframe {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "day" | "d" => Some(Timeframe::Day),
            "week" | "w" => Some(Timeframe::Week),
            "month" | "m" => Some(Timeframe::Month),
            "six_months" | "6m" => Some(Timeframe::SixMonths),
            "year" | "y" => Some(Timeframe::Year),
            _ => None,
        }
    }

    /// Earliest excluded instant; records must be strictly newer than this
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let cutoff = match self {
            Timeframe::Day => Some(now - Duration::days(1)),
            Timeframe::Week => Some(now - Duration::weeks(1)),
            Timeframe::Month => now.checked_sub_months(Months::new(1)),
            Timeframe::SixMonths => now.checked_sub_months(Months::new(6)),
            Timeframe::Year => now.checked_sub_months(Months::new(12)),
        };
        cutoff.unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Keep the records inside this window, preserving order
    pub fn filter<'a>(&self, records: &'a [WeightRecord], now: DateTime<Utc>) -> Vec<&'a WeightRecord> {
        let cutoff = self.cutoff(now);
        records.iter().filter(|r| r.timestamp > cutoff).collect()
    }
}

impl WeightRecord {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let raw: String = row.get("timestamp")?;
        let timestamp = parse_timestamp(&raw).ok_or_else(|| {
            rusqlite::Error::InvalidColumnType(0, "timestamp".to_string(), rusqlite::types::Type::Text)
        })?;

        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            weight: row.get("weight")?,
            timestamp,
        })
    }

    /// Append a measurement and make it the profile's current weight
    pub fn record(conn: &Connection, user_id: &str, weight: f64, at: DateTime<Utc>) -> DbResult<Self> {
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO weight_history (user_id, weight, timestamp) VALUES (?1, ?2, ?3)",
            params![user_id, weight, at.to_rfc3339_opts(SecondsFormat::Micros, true)],
        )?;
        let id = tx.last_insert_rowid();
        GoalProfile::store_weight(&tx, user_id, weight)?;
        tx.commit()?;

        tracing::info!("Recorded weight {} lb for {}", weight, user_id);
        Ok(Self {
            id,
            user_id: user_id.to_string(),
            weight,
            timestamp: at,
        })
    }

    /// All measurements for a user, oldest first
    pub fn history(conn: &Connection, user_id: &str) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM weight_history WHERE user_id = ?1 ORDER BY timestamp ASC, id ASC",
        )?;

        let records = stmt
            .query_map([user_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use chrono::TimeZone;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn record_at(weight: f64, ts: DateTime<Utc>) -> WeightRecord {
        WeightRecord { id: 0, user_id: "u1".into(), weight, timestamp: ts }
    }

    #[test]
    fn test_record_updates_profile_weight() {
        let conn = test_conn();
        WeightRecord::record(&conn, "u1", 182.5, at(2026, 1, 1)).unwrap();

        let profile = GoalProfile::load(&conn, "u1").unwrap();
        assert_eq!(profile.weight, 182.5);
    }

    #[test]
    fn test_history_oldest_first() {
        let conn = test_conn();
        WeightRecord::record(&conn, "u1", 180.0, at(2026, 3, 1)).unwrap();
        WeightRecord::record(&conn, "u1", 185.0, at(2026, 1, 1)).unwrap();
        WeightRecord::record(&conn, "u2", 140.0, at(2026, 2, 1)).unwrap();

        let history = WeightRecord::history(&conn, "u1").unwrap();
        let weights: Vec<_> = history.iter().map(|r| r.weight).collect();
        assert_eq!(weights, vec![185.0, 180.0]);
        assert_eq!(history[0].timestamp, at(2026, 1, 1));
    }

    #[test]
    fn test_timeframe_filter() {
        let now = at(2026, 7, 15);
        let records = vec![
            record_at(190.0, at(2025, 7, 1)),
            record_at(188.0, at(2026, 1, 20)),
            record_at(186.0, at(2026, 6, 20)),
            record_at(185.0, at(2026, 7, 10)),
            record_at(184.0, Utc.with_ymd_and_hms(2026, 7, 15, 6, 0, 0).unwrap()),
        ];

        assert_eq!(Timeframe::Day.filter(&records, now).len(), 1);
        assert_eq!(Timeframe::Week.filter(&records, now).len(), 2);
        assert_eq!(Timeframe::Month.filter(&records, now).len(), 3);
        assert_eq!(Timeframe::SixMonths.filter(&records, now).len(), 4);
        assert_eq!(Timeframe::Year.filter(&records, now).len(), 4);
    }

    #[test]
    fn test_cutoff_is_exclusive() {
        let now = at(2026, 7, 15);
        let records = vec![record_at(180.0, at(2026, 6, 15))];
        assert!(Timeframe::Month.filter(&records, now).is_empty());
    }

    #[test]
    fn test_timeframe_from_str() {
        assert_eq!(Timeframe::from_str("6M"), Some(Timeframe::SixMonths));
        assert_eq!(Timeframe::from_str("week"), Some(Timeframe::Week));
        assert_eq!(Timeframe::from_str("decade"), None);
    }
}
