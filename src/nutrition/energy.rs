//! Daily calorie goal estimation
//!
//! Mifflin-St Jeor basal metabolic rate, scaled by activity and shifted by the
//! weight goal.

use serde::{Deserialize, Serialize};

use super::units::KG_PER_LB;

/// Daily deficit or surplus for a weight change goal
const GOAL_ADJUSTMENT_KCAL: f64 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    #[default]
    Sedentary,
    LightlyActive,
    ModeratelyActive,
    VeryActive,
    ExtremelyActive,
}

impl ActivityLevel {
    pub fn factor(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::LightlyActive => 1.375,
            ActivityLevel::ModeratelyActive => 1.55,
            ActivityLevel::VeryActive => 1.725,
            ActivityLevel::ExtremelyActive => 1.9,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightGoal {
    Lose,
    #[default]
    Maintain,
    Gain,
}

impl WeightGoal {
    pub fn adjustment(&self) -> f64 {
        match self {
            WeightGoal::Lose => -GOAL_ADJUSTMENT_KCAL,
            WeightGoal::Maintain => 0.0,
            WeightGoal::Gain => GOAL_ADJUSTMENT_KCAL,
        }
    }
}

/// Inputs to the calorie goal estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyInputs {
    /// Body weight in pounds
    pub weight_lb: f64,
    pub height_cm: f64,
    pub age_years: i64,
    pub sex: Sex,
    pub activity: ActivityLevel,
    pub goal: WeightGoal,
}

/// Basal metabolic rate in kcal/day (Mifflin-St Jeor)
pub fn basal_metabolic_rate(weight_lb: f64, height_cm: f64, age_years: i64, sex: Sex) -> f64 {
    let weight_kg = weight_lb * KG_PER_LB;
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * age_years as f64;
    match sex {
        Sex::Male => base + 5.0,
        Sex::Female => base - 161.0,
    }
}

/// Daily calorie goal; a non-positive age yields 0, and the result is never negative
pub fn daily_calorie_goal(inputs: &EnergyInputs) -> f64 {
    if inputs.age_years <= 0 {
        return 0.0;
    }

    let bmr = basal_metabolic_rate(inputs.weight_lb, inputs.height_cm, inputs.age_years, inputs.sex);
    let calories = bmr * inputs.activity.factor() + inputs.goal.adjustment();
    calories.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn inputs(sex: Sex, activity: ActivityLevel, goal: WeightGoal) -> EnergyInputs {
        EnergyInputs {
            weight_lb: 180.0,
            height_cm: 180.0,
            age_years: 30,
            sex,
            activity,
            goal,
        }
    }

    #[test]
    fn test_bmr_male_and_female() {
        let kg = 180.0 * 0.453592;
        let male = basal_metabolic_rate(180.0, 180.0, 30, Sex::Male);
        assert!((male - (10.0 * kg + 1125.0 - 150.0 + 5.0)).abs() < EPS);

        let female = basal_metabolic_rate(180.0, 180.0, 30, Sex::Female);
        assert!((male - female - 166.0).abs() < EPS);
    }

    #[test]
    fn test_activity_and_goal() {
        let bmr = basal_metabolic_rate(180.0, 180.0, 30, Sex::Male);

        let maintain = daily_calorie_goal(&inputs(Sex::Male, ActivityLevel::ModeratelyActive, WeightGoal::Maintain));
        assert!((maintain - bmr * 1.55).abs() < EPS);

        let lose = daily_calorie_goal(&inputs(Sex::Male, ActivityLevel::ModeratelyActive, WeightGoal::Lose));
        assert!((maintain - lose - 500.0).abs() < EPS);

        let gain = daily_calorie_goal(&inputs(Sex::Male, ActivityLevel::ModeratelyActive, WeightGoal::Gain));
        assert!((gain - maintain - 500.0).abs() < EPS);
    }

    #[test]
    fn test_non_positive_age_is_zero() {
        let mut i = inputs(Sex::Female, ActivityLevel::Sedentary, WeightGoal::Maintain);
        i.age_years = 0;
        assert_eq!(daily_calorie_goal(&i), 0.0);
        i.age_years = -4;
        assert_eq!(daily_calorie_goal(&i), 0.0);
    }

    #[test]
    fn test_never_negative() {
        let i = EnergyInputs {
            weight_lb: 1.0,
            height_cm: 1.0,
            age_years: 90,
            sex: Sex::Female,
            activity: ActivityLevel::Sedentary,
            goal: WeightGoal::Lose,
        };
        assert_eq!(daily_calorie_goal(&i), 0.0);
    }
}
