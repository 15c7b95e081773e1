//! Client and response normalizer for the external food-recognition service.

pub mod client;
pub mod error;
pub mod normalize;
pub mod types;

pub use client::{RecognitionClient, Recognizer};
pub use error::RecognitionError;
pub use normalize::{normalize, parse_ingredients, parse_nutrients, NUTRIENT_SLOTS};
pub use types::{Analysis, RawNutrition, RawResult};
