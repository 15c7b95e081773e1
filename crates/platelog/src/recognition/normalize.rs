//! Conversion of the endpoint's string-encoded lists into typed values.
//!
//! Parsing is strict: a response either yields a full analysis or a
//! [`RecognitionError::MalformedResponse`]. Nothing here performs I/O.

use crate::record::Nutrient;

use super::error::RecognitionError;
use super::types::{Analysis, RawResult};

/// Slots the nutrition values fill, in the order the endpoint emits them.
pub const NUTRIENT_SLOTS: [(&str, &str); 7] = [
    ("Calories", "kcal"),
    ("Protein", "g"),
    ("Fat", "g"),
    ("Saturated Fat", "g"),
    ("Carbohydrates", "g"),
    ("Fiber", "g"),
    ("Sugar", "g"),
];

fn is_quote(c: char) -> bool {
    c == '\'' || c == '"'
}

fn strip_list(raw: &str) -> &str {
    raw.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim_matches(|c: char| is_quote(c) || c.is_whitespace())
}

fn clean_element(element: &str) -> &str {
    element.trim_matches(|c: char| is_quote(c) || c.is_whitespace())
}

/// `"['rice', 'beans']"` → `["rice", "beans"]`. An empty list yields no items.
pub fn parse_ingredients(raw: &str) -> Vec<String> {
    let inner = strip_list(raw);
    if inner.is_empty() {
        return Vec::new();
    }

    inner
        .split(", ")
        .map(clean_element)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses the nutrition list into the seven fixed slots.
///
/// Values past the seventh are ignored. Fewer than seven values, or any
/// element that is not a finite number, is a malformed response.
pub fn parse_nutrients(raw: &str) -> Result<Vec<Nutrient>, RecognitionError> {
    let inner = strip_list(raw);
    let values = if inner.is_empty() {
        Vec::new()
    } else {
        inner
            .split(',')
            .map(|part| {
                let part = clean_element(part);
                part.parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| {
                        RecognitionError::malformed(format!("non-numeric nutrition value '{}'", part))
                    })
            })
            .collect::<Result<Vec<f64>, _>>()?
    };

    if values.len() < NUTRIENT_SLOTS.len() {
        return Err(RecognitionError::malformed(format!(
            "expected {} nutrition values, got {}",
            NUTRIENT_SLOTS.len(),
            values.len()
        )));
    }

    Ok(NUTRIENT_SLOTS
        .iter()
        .zip(values)
        .map(|((name, unit), amount)| Nutrient::new(name, amount, unit))
        .collect())
}

pub fn normalize(raw: &RawResult) -> Result<Analysis, RecognitionError> {
    let nutrients = parse_nutrients(&raw.nutrition.nutrition)?;
    let ingredients = parse_ingredients(&raw.nutrition.ingredients);

    Ok(Analysis {
        food_name: raw.food_name.trim().to_string(),
        nutrients,
        ingredients,
    })
}
