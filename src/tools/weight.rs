//! Weight MCP tools

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::Database;
use crate::events::{EventBus, NutritionEvent};
use crate::models::{Timeframe, WeightRecord};

/// Response for get_weight_history
#[derive(Debug, Serialize)]
pub struct WeightHistoryResponse {
    pub user_id: String,
    pub timeframe: Timeframe,
    pub records: Vec<WeightRecord>,
    pub latest: Option<f64>,
    pub change: Option<f64>,
}

/// Record a body weight in pounds
pub fn log_weight(db: &Database, events: &EventBus, user_id: &str, weight: f64) -> Result<WeightRecord, String> {
    if !weight.is_finite() || weight <= 0.0 {
        return Err(format!("Weight must be a positive number, got {}", weight));
    }

    let record = {
        let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
        WeightRecord::record(&conn, user_id, weight, Utc::now())
            .map_err(|e| format!("Failed to record weight: {}", e))?
    };

    events.publish(NutritionEvent::WeightRecorded {
        user_id: user_id.to_string(),
        weight,
    });
    Ok(record)
}

/// Weight history inside a timeframe, oldest first
pub fn get_weight_history(
    db: &Database,
    user_id: &str,
    timeframe: Option<&str>,
    now: DateTime<Utc>,
) -> Result<WeightHistoryResponse, String> {
    let timeframe = match timeframe {
        Some(t) => Timeframe::from_str(t).ok_or_else(|| {
            format!("Unknown timeframe '{}' (use day, week, month, six_months or year)", t)
        })?,
        None => Timeframe::default(),
    };

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let all = WeightRecord::history(&conn, user_id)
        .map_err(|e| format!("Failed to get weight history: {}", e))?;

    let records: Vec<WeightRecord> = timeframe.filter(&all, now).into_iter().cloned().collect();
    let latest = records.last().map(|r| r.weight);
    let change = match (records.first(), records.last()) {
        (Some(first), Some(last)) if records.len() > 1 => Some(last.weight - first.weight),
        _ => None,
    };

    Ok(WeightHistoryResponse {
        user_id: user_id.to_string(),
        timeframe,
        records,
        latest,
        change,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::goals::get_goals;
    use crate::tools::test_support::test_db;
    use chrono::Duration;

    #[test]
    fn test_log_weight_updates_goals() {
        let db = test_db();
        let events = EventBus::new();
        log_weight(&db, &events, "u1", 178.4).unwrap();
        assert_eq!(get_goals(&db, "u1").unwrap().profile.weight, 178.4);

        assert!(log_weight(&db, &events, "u1", 0.0).is_err());
        assert!(log_weight(&db, &events, "u1", f64::NAN).is_err());
    }

    #[test]
    fn test_history_window_and_change() {
        let db = test_db();
        let events = EventBus::new();
        log_weight(&db, &events, "u1", 180.0).unwrap();
        log_weight(&db, &events, "u1", 178.0).unwrap();

        let now = Utc::now() + Duration::seconds(1);
        let history = get_weight_history(&db, "u1", Some("week"), now).unwrap();
        assert_eq!(history.records.len(), 2);
        assert_eq!(history.latest, Some(178.0));
        assert_eq!(history.change, Some(-2.0));

        // Everything is older than a day from a week ahead
        let later = now + Duration::days(7);
        assert!(get_weight_history(&db, "u1", Some("day"), later).unwrap().records.is_empty());

        assert!(get_weight_history(&db, "u1", Some("fortnight"), now).is_err());
    }
}
