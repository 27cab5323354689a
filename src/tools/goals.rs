//! Goal MCP tools
//!
//! Calorie and macro targets, height, and the calorie goal calculator.

use serde::Serialize;

use crate::db::Database;
use crate::events::{EventBus, NutritionEvent};
use crate::models::{GoalProfile, MacroSplit};
use crate::nutrition::{daily_calorie_goal, ActivityLevel, EnergyInputs, Sex, WeightGoal};

/// Goal profile with height also expressed in feet and inches
#[derive(Debug, Serialize)]
pub struct GoalsResponse {
    pub profile: GoalProfile,
    pub height_feet: i64,
    pub height_inches: i64,
}

impl From<GoalProfile> for GoalsResponse {
    fn from(profile: GoalProfile) -> Self {
        let (height_feet, height_inches) = profile.height_feet_inches();
        Self {
            profile,
            height_feet,
            height_inches,
        }
    }
}

/// Response for calculate_calorie_goal
#[derive(Debug, Serialize)]
pub struct CalorieGoalResponse {
    pub calories: f64,
    pub inputs: EnergyInputs,
    pub saved: bool,
    pub goals: Option<GoalsResponse>,
}

/// Fields accepted by set_goals; unset fields keep their current value
#[derive(Debug, Clone, Default)]
pub struct GoalsUpdate {
    pub calories: Option<f64>,
    pub protein_pct: Option<f64>,
    pub carbs_pct: Option<f64>,
    pub fat_pct: Option<f64>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
}

/// Inputs for calculate_calorie_goal; weight and height default to the profile's
#[derive(Debug, Clone)]
pub struct CalorieGoalRequest {
    pub age_years: i64,
    pub sex: Sex,
    pub activity: ActivityLevel,
    pub goal: WeightGoal,
    pub weight_lb: Option<f64>,
    pub height_cm: Option<f64>,
    pub save: bool,
}

fn positive(name: &str, value: Option<f64>) -> Result<Option<f64>, String> {
    match value {
        Some(v) if !v.is_finite() || v <= 0.0 => Err(format!("{} must be a positive number, got {}", name, v)),
        other => Ok(other),
    }
}

fn load(db: &Database, user_id: &str) -> Result<GoalProfile, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    GoalProfile::load(&conn, user_id).map_err(|e| format!("Failed to load goals: {}", e))
}

fn save(db: &Database, events: &EventBus, profile: &mut GoalProfile) -> Result<(), String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    profile.save(&conn).map_err(|e| format!("Failed to save goals: {}", e))?;
    events.publish(NutritionEvent::GoalsUpdated {
        user_id: profile.user_id.clone(),
    });
    Ok(())
}

// ============================================================================
// Goal Tools
// ============================================================================

/// Get a user's goals (defaults if never saved)
pub fn get_goals(db: &Database, user_id: &str) -> Result<GoalsResponse, String> {
    load(db, user_id).map(GoalsResponse::from)
}

/// Update goals; a macro split that does not sum to 100 is refused and nothing is saved
pub fn set_goals(db: &Database, events: &EventBus, user_id: &str, update: GoalsUpdate) -> Result<GoalsResponse, String> {
    let mut profile = load(db, user_id)?;

    let split = MacroSplit {
        protein_pct: update.protein_pct.unwrap_or(profile.split.protein_pct),
        carbs_pct: update.carbs_pct.unwrap_or(profile.split.carbs_pct),
        fat_pct: update.fat_pct.unwrap_or(profile.split.fat_pct),
    };
    split.validate().map_err(|e| e.to_string())?;

    if let Some(calories) = positive("calories", update.calories)? {
        profile.calories = Some(calories);
    }
    if let Some(weight) = positive("weight", update.weight)? {
        profile.weight = weight;
    }
    if let Some(height) = positive("height", update.height)? {
        profile.height = height;
    }
    profile.split = split;

    profile.update_macros().map_err(|e| e.to_string())?;
    save(db, events, &mut profile)?;
    Ok(profile.into())
}

/// Set height from feet and inches
pub fn set_height(db: &Database, events: &EventBus, user_id: &str, feet: i64, inches: i64) -> Result<GoalsResponse, String> {
    if feet < 0 || !(0..12).contains(&inches) || feet * 12 + inches == 0 {
        return Err(format!("Invalid height {}ft {}in", feet, inches));
    }

    let mut profile = load(db, user_id)?;
    profile.set_height_feet_inches(feet, inches);
    save(db, events, &mut profile)?;
    Ok(profile.into())
}

/// Estimate a daily calorie goal, optionally saving it as the user's target
pub fn calculate_calorie_goal(
    db: &Database,
    events: &EventBus,
    user_id: &str,
    request: CalorieGoalRequest,
) -> Result<CalorieGoalResponse, String> {
    let mut profile = load(db, user_id)?;

    let inputs = EnergyInputs {
        weight_lb: positive("weight", request.weight_lb)?.unwrap_or(profile.weight),
        height_cm: positive("height", request.height_cm)?.unwrap_or(profile.height),
        age_years: request.age_years,
        sex: request.sex,
        activity: request.activity,
        goal: request.goal,
    };
    let calories = daily_calorie_goal(&inputs);

    if !request.save {
        return Ok(CalorieGoalResponse {
            calories,
            inputs,
            saved: false,
            goals: None,
        });
    }

    profile.calories = Some(calories);
    profile.weight = inputs.weight_lb;
    profile.height = inputs.height_cm;
    if let Err(e) = profile.update_macros() {
        tracing::warn!("Calorie goal saved without macro update: {}", e);
    }
    save(db, events, &mut profile)?;
    tracing::info!("Calculated calorie goal for {}: {:.0} kcal", user_id, calories);

    Ok(CalorieGoalResponse {
        calories,
        inputs,
        saved: true,
        goals: Some(profile.into()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::test_db;

    #[test]
    fn test_get_goals_defaults() {
        let db = test_db();
        let goals = get_goals(&db, "u1").unwrap();
        assert_eq!(goals.profile.calories, None);
        assert_eq!((goals.height_feet, goals.height_inches), (5, 6));
    }

    #[test]
    fn test_set_goals_recomputes_macros() {
        let db = test_db();
        let events = EventBus::new();
        let update = GoalsUpdate {
            calories: Some(2000.0),
            ..Default::default()
        };
        let goals = set_goals(&db, &events, "u1", update).unwrap();
        assert!((goals.profile.macros.protein - 150.0).abs() < 1e-9);
        assert!((goals.profile.macros.carbs - 250.0).abs() < 1e-9);

        let reloaded = get_goals(&db, "u1").unwrap();
        assert_eq!(reloaded.profile.calories, Some(2000.0));
    }

    #[test]
    fn test_set_goals_refuses_bad_split() {
        let db = test_db();
        let events = EventBus::new();
        let update = GoalsUpdate {
            calories: Some(2500.0),
            protein_pct: Some(40.0),
            ..Default::default()
        };
        let err = set_goals(&db, &events, "u1", update).unwrap_err();
        assert!(err.contains("sum to 100"));

        // Nothing was persisted
        assert_eq!(get_goals(&db, "u1").unwrap().profile.calories, None);
    }

    #[test]
    fn test_set_height() {
        let db = test_db();
        let events = EventBus::new();
        let goals = set_height(&db, &events, "u1", 5, 10).unwrap();
        assert!((goals.profile.height - 177.8).abs() < 1e-9);
        assert_eq!((goals.height_feet, goals.height_inches), (5, 10));
        assert!(set_height(&db, &events, "u1", 5, 12).is_err());
    }

    #[test]
    fn test_calculate_without_saving() {
        let db = test_db();
        let events = EventBus::new();
        let request = CalorieGoalRequest {
            age_years: 30,
            sex: Sex::Male,
            activity: ActivityLevel::Sedentary,
            goal: WeightGoal::Maintain,
            weight_lb: None,
            height_cm: None,
            save: false,
        };
        let response = calculate_calorie_goal(&db, &events, "u1", request).unwrap();
        assert!(!response.saved);
        // Defaults: 150 lb, 170 cm
        let expected = (10.0 * 150.0 * 0.453592 + 6.25 * 170.0 - 150.0 + 5.0) * 1.2;
        assert!((response.calories - expected).abs() < 1e-9);
        assert_eq!(get_goals(&db, "u1").unwrap().profile.calories, None);
    }

    #[test]
    fn test_calculate_and_save() {
        let db = test_db();
        let events = EventBus::new();
        let request = CalorieGoalRequest {
            age_years: 40,
            sex: Sex::Female,
            activity: ActivityLevel::ModeratelyActive,
            goal: WeightGoal::Lose,
            weight_lb: Some(160.0),
            height_cm: Some(165.0),
            save: true,
        };
        let response = calculate_calorie_goal(&db, &events, "u1", request).unwrap();
        assert!(response.saved);

        let goals = get_goals(&db, "u1").unwrap();
        assert_eq!(goals.profile.calories, Some(response.calories));
        assert_eq!(goals.profile.weight, 160.0);
        assert!((goals.profile.macros.protein - response.calories * 0.3 / 4.0).abs() < 1e-9);
    }
}
