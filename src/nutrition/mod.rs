//! Nutrition calculation module
//!
//! Text parsing, serving-size normalization, aggregation, and calorie goal estimation.

pub mod aggregator;
pub mod energy;
pub mod parser;
pub mod serving;
pub mod units;

pub use aggregator::{
    progress_percent, progress_ratio, summarize, total_calories, total_macros, total_nutrients,
    DaySummary, GoalProgress, Progress,
};
pub use energy::{daily_calorie_goal, ActivityLevel, EnergyInputs, Sex, WeightGoal};
pub use parser::{parse_nutrient_description, parse_numeric_field, parse_quantity};
pub use serving::{adjust_serving, parse_weight_text, AdjustedServing, ServingRequest};
pub use units::ServingUnit;
