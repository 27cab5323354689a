//! CalorieBeta tools module
//!
//! Tool implementations behind the MCP server. Each function takes the database
//! (and the event bus when it mutates state) and returns a serializable response
//! or an error message.

pub mod days;
pub mod foods;
pub mod goals;
pub mod weight;

use chrono::{Local, NaiveDate};

use crate::models::DATE_FORMAT;

/// Parse a "YYYY-MM-DD" date, defaulting to today in local time
pub fn resolve_date(date: Option<&str>) -> Result<NaiveDate, String> {
    match date.map(str::trim).filter(|d| !d.is_empty()) {
        Some(d) => NaiveDate::parse_from_str(d, DATE_FORMAT)
            .map_err(|e| format!("Invalid date '{}' (expected YYYY-MM-DD): {}", d, e)),
        None => Ok(Local::now().date_naive()),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_date() {
        assert_eq!(
            resolve_date(Some("2026-01-13")).unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 13).unwrap()
        );
        assert_eq!(resolve_date(None).unwrap(), Local::now().date_naive());
        assert_eq!(resolve_date(Some(" ")).unwrap(), Local::now().date_naive());
        assert!(resolve_date(Some("13/01/2026")).is_err());
    }
}
