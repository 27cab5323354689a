//! Nutrition aggregation
//!
//! Totals across a daily log and clamped progress toward goals. Everything here is
//! pure and infallible; bad inputs degrade to zero.

use serde::Serialize;

use crate::models::{non_negative, DailyLog, FoodEntry, GoalProfile, Macros, Nutrients};

/// Sum of calories across every entry in every meal
pub fn total_calories(log: &DailyLog) -> f64 {
    log.entries().map(|e| e.nutrients.calories).sum()
}

/// Componentwise protein/carbs/fat sum across every entry
pub fn total_macros(log: &DailyLog) -> Macros {
    total_nutrients(log.entries()).macros()
}

/// Sum all four nutrients over any set of entries
pub fn total_nutrients<'a, I>(entries: I) -> Nutrients
where
    I: IntoIterator<Item = &'a FoodEntry>,
{
    entries.into_iter().map(|e| &e.nutrients).sum()
}

/// Progress toward a goal as a fraction in `[0, 1]`
///
/// Non-positive goals give 0; negative totals count as 0.
pub fn progress_ratio(total: f64, goal: f64) -> f64 {
    if !(goal.is_finite() && goal > 0.0) {
        return 0.0;
    }
    (non_negative(total) / goal).min(1.0)
}

/// Progress toward a goal as a percentage in `[0, 100]`
pub fn progress_percent(total: f64, goal: f64) -> f64 {
    if !(goal.is_finite() && goal > 0.0) {
        return 0.0;
    }
    (non_negative(total) / goal * 100.0).min(100.0)
}

/// Progress of one nutrient in both display forms
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    pub total: f64,
    pub goal: f64,
    pub fraction: f64,
    pub percent: f64,
}

impl Progress {
    pub fn new(total: f64, goal: f64) -> Self {
        Self {
            total,
            goal,
            fraction: progress_ratio(total, goal),
            percent: progress_percent(total, goal),
        }
    }
}

/// Progress of all four nutrients against a goal profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GoalProgress {
    pub calories: Progress,
    pub protein: Progress,
    pub carbs: Progress,
    pub fat: Progress,
}

impl GoalProgress {
    /// Compare totals to goals; an unset calorie goal counts as 0
    pub fn compute(calories: f64, macros: Macros, goals: &GoalProfile) -> Self {
        Self {
            calories: Progress::new(calories, goals.calories.unwrap_or(0.0)),
            protein: Progress::new(macros.protein, goals.macros.protein),
            carbs: Progress::new(macros.carbs, goals.macros.carbs),
            fat: Progress::new(macros.fat, goals.macros.fat),
        }
    }
}

/// Derived view of one day for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub date: String,
    pub entry_count: usize,
    /// Raw sum of entry calories
    pub total_calories: f64,
    /// Override if set, otherwise the raw sum
    pub displayed_calories: f64,
    pub calorie_override: Option<f64>,
    pub macros: Macros,
    pub progress: GoalProgress,
}

/// Summarize a log against goals; progress uses the displayed calories
pub fn summarize(log: &DailyLog, goals: &GoalProfile) -> DaySummary {
    let total = total_calories(log);
    let displayed = log.total_calories_override.unwrap_or(total);
    let macros = total_macros(log);

    DaySummary {
        date: log.date.format(crate::models::DATE_FORMAT).to_string(),
        entry_count: log.entries().count(),
        total_calories: total,
        displayed_calories: displayed,
        calorie_override: log.total_calories_override,
        macros,
        progress: GoalProgress::compute(displayed, macros, goals),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const EPS: f64 = 1e-9;

    fn log_with(entries: &[(f64, f64, f64, f64)]) -> DailyLog {
        let mut log = DailyLog::empty("u1", NaiveDate::from_ymd_opt(2026, 1, 13).unwrap());
        for (i, (c, p, cb, f)) in entries.iter().enumerate() {
            log.meals[0].food_items.push(FoodEntry::new(
                format!("f{}", i),
                "Food",
                Nutrients::new(*c, *p, *cb, *f),
                "1 serving",
                100.0,
            ));
        }
        log
    }

    #[test]
    fn test_empty_log_totals() {
        let log = log_with(&[]);
        assert_eq!(total_calories(&log), 0.0);
        assert_eq!(total_macros(&log), Macros::default());
    }

    #[test]
    fn test_totals_single_and_many() {
        let one = log_with(&[(120.0, 3.0, 20.0, 2.0)]);
        assert_eq!(total_calories(&one), 120.0);

        let many = log_with(&[(120.0, 3.0, 20.0, 2.0), (300.0, 25.0, 0.0, 18.0), (80.5, 0.5, 21.0, 0.0)]);
        assert!((total_calories(&many) - 500.5).abs() < EPS);
        let macros = total_macros(&many);
        assert!((macros.protein - 28.5).abs() < EPS);
        assert!((macros.carbs - 41.0).abs() < EPS);
        assert!((macros.fat - 20.0).abs() < EPS);
    }

    #[test]
    fn test_totals_span_meals() {
        let mut log = log_with(&[(100.0, 1.0, 1.0, 1.0)]);
        let mut dinner = crate::models::Meal::new("Dinner");
        dinner.food_items.push(FoodEntry::new("d", "Soup", Nutrients::new(250.0, 10.0, 30.0, 8.0), "1 bowl", 300.0));
        log.meals.push(dinner);
        assert_eq!(total_calories(&log), 350.0);
    }

    #[test]
    fn test_progress_zero_goal() {
        for total in [-50.0, 0.0, 10.0, 1e9] {
            assert_eq!(progress_ratio(total, 0.0), 0.0);
            assert_eq!(progress_percent(total, 0.0), 0.0);
            assert_eq!(progress_ratio(total, -10.0), 0.0);
        }
    }

    #[test]
    fn test_progress_clamped() {
        assert_eq!(progress_percent(150.0, 100.0), 100.0);
        assert_eq!(progress_ratio(150.0, 100.0), 1.0);
        assert_eq!(progress_percent(50.0, 200.0), 25.0);
        assert_eq!(progress_ratio(50.0, 200.0), 0.25);
    }

    #[test]
    fn test_progress_negative_total() {
        assert_eq!(progress_ratio(-50.0, 100.0), 0.0);
        assert_eq!(progress_percent(-50.0, 100.0), 0.0);
    }

    #[test]
    fn test_summary_prefers_override() {
        let mut log = log_with(&[(500.0, 30.0, 50.0, 10.0)]);
        let mut goals = GoalProfile::new("u1");
        goals.calories = Some(2000.0);

        let summary = summarize(&log, &goals);
        assert_eq!(summary.displayed_calories, 500.0);
        assert_eq!(summary.progress.calories.percent, 25.0);
        assert_eq!(summary.progress.protein.fraction, 0.2);

        log.total_calories_override = Some(1000.0);
        let summary = summarize(&log, &goals);
        assert_eq!(summary.total_calories, 500.0);
        assert_eq!(summary.displayed_calories, 1000.0);
        assert_eq!(summary.progress.calories.fraction, 0.5);
    }

    #[test]
    fn test_summary_without_calorie_goal() {
        let log = log_with(&[(500.0, 0.0, 0.0, 0.0)]);
        let summary = summarize(&log, &GoalProfile::new("u1"));
        assert_eq!(summary.progress.calories.percent, 0.0);
    }
}
