//! CalorieBeta MCP Server Implementation
//!
//! Implements the MCP server with all nutrition tracking tools.

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogChain;
use crate::db::Database;
use crate::events::EventBus;
use crate::models::{FoodEntry, Nutrients};
use crate::nutrition::{ActivityLevel, ServingRequest, ServingUnit, Sex, WeightGoal};
use crate::tools::goals::{CalorieGoalRequest, GoalsUpdate};
use crate::tools::{days, foods, goals, weight};

/// CalorieBeta MCP Service
#[derive(Clone)]
pub struct CalorieBetaService {
    database: Database,
    events: EventBus,
    catalogs: CatalogChain,
    default_user_id: String,
    tool_router: ToolRouter<CalorieBetaService>,
}

impl CalorieBetaService {
    pub fn new(database: Database, events: EventBus, catalogs: CatalogChain, default_user_id: String) -> Self {
        Self {
            database,
            events,
            catalogs,
            default_user_id,
            tool_router: Self::tool_router(),
        }
    }

    fn user<'a>(&'a self, user_id: &'a Option<String>) -> &'a str {
        user_id
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(&self.default_user_id)
    }
}

/// Serialize a tool result as pretty JSON text content
fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

// ============================================================================
// Shared Parameter Structs
// ============================================================================

/// A food as supplied by the client, nutrients per base serving
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct FoodParams {
    /// Catalog id or barcode; leave empty for a manual entry
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fat: f64,
    /// Serving label, e.g. "1 slice"
    #[serde(default = "default_serving_label")]
    pub serving_size: String,
    /// Base serving weight in grams
    #[serde(default)]
    pub serving_weight: f64,
}

fn default_serving_label() -> String {
    "1 serving".to_string()
}

impl From<FoodParams> for FoodEntry {
    fn from(p: FoodParams) -> Self {
        FoodEntry::new(
            p.id,
            p.name,
            Nutrients::new(p.calories, p.protein, p.carbs, p.fat),
            p.serving_size,
            p.serving_weight,
        )
    }
}

/// Serving adjustment as typed by the user
#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct ServingParams {
    /// Number of servings (default 1)
    pub quantity: Option<String>,
    /// Custom serving amount overriding the base serving weight
    pub custom_serving: Option<String>,
    /// "g" or "oz"; defaults to oz when the food's serving label mentions oz, else g
    pub unit: Option<String>,
}

impl ServingParams {
    /// Build a serving request for a food; without an explicit unit the food's label decides
    fn into_request(self, serving_size: &str) -> ServingRequest {
        let unit = match self.unit.as_deref() {
            Some(raw) => ServingUnit::from_str(raw).unwrap_or_else(|| {
                tracing::warn!("Unknown serving unit '{}', using grams", raw);
                ServingUnit::Grams
            }),
            None => ServingUnit::infer_from_label(serving_size),
        };
        ServingRequest {
            quantity: self.quantity,
            custom_serving: self.custom_serving,
            unit,
        }
    }
}

// ============================================================================
// Nutrition Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ParseDescriptionParams {
    /// e.g. "Per 100g - Calories: 89kcal | Fat: 0.33g | Carbs: 22.84g | Protein: 1.09g"
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AdjustServingParams {
    pub food: FoodParams,
    #[serde(default)]
    pub serving: ServingParams,
}

// ============================================================================
// Day Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DayParams {
    pub user_id: Option<String>,
    /// ISO date "YYYY-MM-DD" (default today)
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogFoodParams {
    pub user_id: Option<String>,
    pub date: Option<String>,
    pub food: FoodParams,
    pub serving: Option<ServingParams>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RemoveFoodParams {
    pub user_id: Option<String>,
    pub date: Option<String>,
    pub food_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CalorieOverrideParams {
    pub user_id: Option<String>,
    pub date: Option<String>,
    /// Manual total calories; omit to clear
    pub total_calories: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct HistoryParams {
    pub user_id: Option<String>,
    #[serde(default = "default_history_limit")]
    pub limit: i64,
}

fn default_history_limit() -> i64 {
    30
}

// ============================================================================
// Goal Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UserParams {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetGoalsParams {
    pub user_id: Option<String>,
    pub calories: Option<f64>,
    /// Macro split percentages; the three must sum to 100
    pub protein_pct: Option<f64>,
    pub carbs_pct: Option<f64>,
    pub fat_pct: Option<f64>,
    /// Body weight in pounds
    pub weight: Option<f64>,
    /// Height in centimeters
    pub height: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CalculateGoalParams {
    pub user_id: Option<String>,
    pub age: i64,
    /// "male" or "female"
    pub sex: String,
    /// sedentary, lightly_active, moderately_active, very_active, extremely_active
    #[serde(default)]
    pub activity: Option<String>,
    /// lose, maintain, gain
    #[serde(default)]
    pub goal: Option<String>,
    /// Pounds; defaults to the stored weight
    pub weight: Option<f64>,
    /// Centimeters; defaults to the stored height
    pub height: Option<f64>,
    /// Save the result as the calorie goal
    #[serde(default)]
    pub save: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetHeightParams {
    pub user_id: Option<String>,
    pub feet: i64,
    pub inches: i64,
}

// ============================================================================
// Weight Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogWeightParams {
    pub user_id: Option<String>,
    /// Pounds
    pub weight: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct WeightHistoryParams {
    pub user_id: Option<String>,
    /// day, week, month, six_months, year (default year)
    pub timeframe: Option<String>,
}

// ============================================================================
// Food Lookup Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchFoodsParams {
    pub query: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct BarcodeParams {
    pub barcode: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ManualFoodParams {
    pub barcode: String,
    pub name: String,
    pub calories: f64,
}

// ============================================================================
// Enum parsing
// ============================================================================

fn parse_sex(s: &str) -> Result<Sex, McpError> {
    match s.trim().to_lowercase().as_str() {
        "male" | "m" => Ok(Sex::Male),
        "female" | "f" => Ok(Sex::Female),
        other => Err(McpError::invalid_params(format!("Unknown sex '{}'", other), None)),
    }
}

fn parse_activity(s: Option<&str>) -> Result<ActivityLevel, McpError> {
    let Some(s) = s else {
        return Ok(ActivityLevel::default());
    };
    match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
        "sedentary" => Ok(ActivityLevel::Sedentary),
        "lightly_active" | "light" => Ok(ActivityLevel::LightlyActive),
        "moderately_active" | "moderate" => Ok(ActivityLevel::ModeratelyActive),
        "very_active" | "very" => Ok(ActivityLevel::VeryActive),
        "extremely_active" | "extreme" => Ok(ActivityLevel::ExtremelyActive),
        other => Err(McpError::invalid_params(format!("Unknown activity level '{}'", other), None)),
    }
}

fn parse_weight_goal(s: Option<&str>) -> Result<WeightGoal, McpError> {
    let Some(s) = s else {
        return Ok(WeightGoal::default());
    };
    match s.trim().to_lowercase().as_str() {
        "lose" => Ok(WeightGoal::Lose),
        "maintain" => Ok(WeightGoal::Maintain),
        "gain" => Ok(WeightGoal::Gain),
        other => Err(McpError::invalid_params(format!("Unknown weight goal '{}'", other), None)),
    }
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl CalorieBetaService {
    // --- Nutrition helpers ---

    #[tool(description = "Parse a catalog nutrient description (pipe-delimited 'Calories: ... | Fat: ... | Carbs: ... | Protein: ...') into numbers. Unparseable fields are 0.")]
    fn parse_nutrient_description(&self, Parameters(p): Parameters<ParseDescriptionParams>) -> Result<CallToolResult, McpError> {
        json_result(&foods::parse_nutrient_description(p.description.as_deref()))
    }

    #[tool(description = "Scale a food's nutrients to a number of servings and an optional custom serving size in g or oz, without logging it")]
    fn adjust_serving(&self, Parameters(p): Parameters<AdjustServingParams>) -> Result<CallToolResult, McpError> {
        let entry = FoodEntry::from(p.food);
        let request = p.serving.into_request(&entry.serving_size);
        json_result(&foods::adjust_serving(&entry, &request))
    }

    // --- Days ---

    #[tool(description = "Get the daily log for a date, creating an empty one with a default meal if needed")]
    fn get_or_create_day(&self, Parameters(p): Parameters<DayParams>) -> Result<CallToolResult, McpError> {
        let result = days::get_or_create_day(&self.database, self.user(&p.user_id), p.date.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get calorie and macro totals for a day with progress toward goals (fraction and percent)")]
    fn get_day_summary(&self, Parameters(p): Parameters<DayParams>) -> Result<CallToolResult, McpError> {
        let result = days::get_day_summary(&self.database, self.user(&p.user_id), p.date.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Add a food to a day's log, optionally scaled to a serving")]
    fn add_food_to_log(&self, Parameters(p): Parameters<LogFoodParams>) -> Result<CallToolResult, McpError> {
        let serving = p.serving.map(|s| s.into_request(&p.food.serving_size));
        let result = days::add_food_to_log(
            &self.database, &self.events, self.user(&p.user_id), p.date.as_deref(),
            p.food.into(), serving.as_ref(),
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Replace a logged food (matched by id) with a new serving of it")]
    fn update_food_in_log(&self, Parameters(p): Parameters<LogFoodParams>) -> Result<CallToolResult, McpError> {
        let serving = p.serving.map(|s| s.into_request(&p.food.serving_size));
        let result = days::update_food_in_log(
            &self.database, &self.events, self.user(&p.user_id), p.date.as_deref(),
            p.food.into(), serving.as_ref(),
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Remove a food (by id) from every meal of a day's log")]
    fn remove_food_from_log(&self, Parameters(p): Parameters<RemoveFoodParams>) -> Result<CallToolResult, McpError> {
        let result = days::remove_food_from_log(
            &self.database, &self.events, self.user(&p.user_id), p.date.as_deref(), &p.food_id,
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Set a manual total calorie figure for a day, shown instead of the computed sum. Omit total_calories to clear it.")]
    fn set_calorie_override(&self, Parameters(p): Parameters<CalorieOverrideParams>) -> Result<CallToolResult, McpError> {
        let result = days::set_calorie_override(
            &self.database, &self.events, self.user(&p.user_id), p.date.as_deref(), p.total_calories,
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "List past days with totals, newest first")]
    fn list_daily_history(&self, Parameters(p): Parameters<HistoryParams>) -> Result<CallToolResult, McpError> {
        let result = days::list_daily_history(&self.database, self.user(&p.user_id), p.limit)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Goals ---

    #[tool(description = "Get calorie and macro goals, body weight, and height")]
    fn get_goals(&self, Parameters(p): Parameters<UserParams>) -> Result<CallToolResult, McpError> {
        let result = goals::get_goals(&self.database, self.user(&p.user_id))
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Update calorie goal, macro split percentages (must sum to 100), weight or height. Macro grams are recomputed.")]
    fn set_goals(&self, Parameters(p): Parameters<SetGoalsParams>) -> Result<CallToolResult, McpError> {
        let update = GoalsUpdate {
            calories: p.calories,
            protein_pct: p.protein_pct,
            carbs_pct: p.carbs_pct,
            fat_pct: p.fat_pct,
            weight: p.weight,
            height: p.height,
        };
        let result = goals::set_goals(&self.database, &self.events, self.user(&p.user_id), update)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Estimate a daily calorie goal (Mifflin-St Jeor x activity, -500 to lose / +500 to gain). Set save=true to store it.")]
    fn calculate_calorie_goal(&self, Parameters(p): Parameters<CalculateGoalParams>) -> Result<CallToolResult, McpError> {
        let request = CalorieGoalRequest {
            age_years: p.age,
            sex: parse_sex(&p.sex)?,
            activity: parse_activity(p.activity.as_deref())?,
            goal: parse_weight_goal(p.goal.as_deref())?,
            weight_lb: p.weight,
            height_cm: p.height,
            save: p.save,
        };
        let result = goals::calculate_calorie_goal(&self.database, &self.events, self.user(&p.user_id), request)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Set height from feet and inches")]
    fn set_height(&self, Parameters(p): Parameters<SetHeightParams>) -> Result<CallToolResult, McpError> {
        let result = goals::set_height(&self.database, &self.events, self.user(&p.user_id), p.feet, p.inches)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Weight ---

    #[tool(description = "Record current body weight in pounds")]
    fn log_weight(&self, Parameters(p): Parameters<LogWeightParams>) -> Result<CallToolResult, McpError> {
        let result = weight::log_weight(&self.database, &self.events, self.user(&p.user_id), p.weight)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get weight history for a timeframe, oldest first")]
    fn get_weight_history(&self, Parameters(p): Parameters<WeightHistoryParams>) -> Result<CallToolResult, McpError> {
        let result = weight::get_weight_history(
            &self.database, self.user(&p.user_id), p.timeframe.as_deref(), chrono::Utc::now(),
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Food lookup ---

    #[tool(description = "Search the food catalog by name")]
    async fn search_foods(&self, Parameters(p): Parameters<SearchFoodsParams>) -> Result<CallToolResult, McpError> {
        let result = foods::search_foods(&self.catalogs, &p.query)
            .await
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Look up a product barcode: saved manual foods first, then FatSecret, then Open Food Facts")]
    async fn lookup_barcode(&self, Parameters(p): Parameters<BarcodeParams>) -> Result<CallToolResult, McpError> {
        let result = foods::lookup_barcode(&self.database, &self.catalogs, &p.barcode)
            .await
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Save a food for a barcode that no catalog knows (name and calories per serving)")]
    fn save_manual_food(&self, Parameters(p): Parameters<ManualFoodParams>) -> Result<CallToolResult, McpError> {
        let result = foods::save_manual_food(&self.database, &p.barcode, &p.name, p.calories)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }
}

#[tool_handler]
impl ServerHandler for CalorieBetaService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "calorie-beta".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("CalorieBeta Nutrition Tracker".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "CalorieBeta - calorie and macro tracking. \
                 Find foods with search_foods or lookup_barcode (save_manual_food when a barcode is unknown). \
                 Log with add_food_to_log / update_food_in_log / remove_food_from_log; nutrients are per base serving, \
                 pass serving.quantity and serving.custom_serving (g or oz) to scale. \
                 Days: get_or_create_day, get_day_summary, list_daily_history, set_calorie_override. \
                 Goals: get_goals, set_goals (macro percentages must sum to 100), calculate_calorie_goal, set_height. \
                 Weight: log_weight, get_weight_history. \
                 Helpers: parse_nutrient_description, adjust_serving. \
                 Dates are YYYY-MM-DD and default to today; user_id defaults to the configured user."
                    .into(),
            ),
        }
    }
}
