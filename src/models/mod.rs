//! Data models
//!
//! Rust structs representing database entities.

mod daily_log;
mod food_entry;
mod goal_profile;
mod manual_food;
mod meal;
mod nutrition;
mod weight;

pub use daily_log::{DailyLog, DATE_FORMAT};
pub use food_entry::FoodEntry;
pub use goal_profile::{GoalError, GoalProfile, MacroSplit, FALLBACK_CALORIE_GOAL};
pub use manual_food::ManualFood;
pub use meal::{Meal, DEFAULT_MEAL_NAME};
pub use nutrition::{non_negative, Macros, Nutrients};
pub use weight::{Timeframe, WeightRecord};
