use serde::{Deserialize, Serialize};

use crate::record::{EnrichmentUpdate, Nutrient};

/// Body returned by the recognition endpoint.
///
/// The list-valued fields arrive as string renderings of lists, e.g.
/// `"['rice', 'beans']"`; see [`super::normalize`]. Unknown fields such as
/// `status` or `nutrition.id` are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResult {
    pub food_name: String,
    pub nutrition: RawNutrition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNutrition {
    pub ingredients: String,
    pub nutrition: String,
}

/// A normalized recognition result.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub food_name: String,
    pub nutrients: Vec<Nutrient>,
    pub ingredients: Vec<String>,
}

impl From<Analysis> for EnrichmentUpdate {
    fn from(analysis: Analysis) -> Self {
        EnrichmentUpdate::Complete {
            food_name: analysis.food_name,
            nutrients: analysis.nutrients,
            ingredients: analysis.ingredients,
        }
    }
}
