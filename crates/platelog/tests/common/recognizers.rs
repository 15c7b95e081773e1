//! Fake recognizers for driving the enrichment worker.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use platelog::recognition::{RawNutrition, RawResult, RecognitionError, Recognizer};

pub const FULL_NUTRITION: &str = "[100.0, 5.0, 2.0, 1.0, 20.0, 3.0, 1.0]";

pub fn raw_result(food_name: &str, ingredients: &str, nutrition: &str) -> RawResult {
    RawResult {
        food_name: food_name.to_string(),
        nutrition: RawNutrition {
            ingredients: ingredients.to_string(),
            nutrition: nutrition.to_string(),
        },
    }
}

/// Answers every call with the same result.
pub struct StaticRecognizer {
    result: Result<RawResult, RecognitionError>,
    calls: AtomicUsize,
}

impl StaticRecognizer {
    pub fn ok(result: RawResult) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(result),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn err(error: RecognitionError) -> Arc<Self> {
        Arc::new(Self {
            result: Err(error),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Recognizer for StaticRecognizer {
    async fn analyze(&self, _image: Vec<u8>, _filename: &str) -> Result<RawResult, RecognitionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

/// Picks a result from the uploaded file name.
pub struct ByFilenameRecognizer {
    pick: Box<dyn Fn(&str) -> Result<RawResult, RecognitionError> + Send + Sync>,
}

impl ByFilenameRecognizer {
    pub fn new<F>(pick: F) -> Arc<Self>
    where
        F: Fn(&str) -> Result<RawResult, RecognitionError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            pick: Box::new(pick),
        })
    }
}

#[async_trait]
impl Recognizer for ByFilenameRecognizer {
    async fn analyze(&self, _image: Vec<u8>, filename: &str) -> Result<RawResult, RecognitionError> {
        (self.pick)(filename)
    }
}

/// Blocks every call until the test releases it.
pub struct GatedRecognizer {
    gate: Semaphore,
    result: RawResult,
    started: AtomicUsize,
}

impl GatedRecognizer {
    pub fn new(result: RawResult) -> Arc<Self> {
        Arc::new(Self {
            gate: Semaphore::new(0),
            result,
            started: AtomicUsize::new(0),
        })
    }

    /// Lets `n` pending or future calls through.
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Recognizer for GatedRecognizer {
    async fn analyze(&self, _image: Vec<u8>, _filename: &str) -> Result<RawResult, RecognitionError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| RecognitionError::Transport(e.to_string()))?;
        permit.forget();
        Ok(self.result.clone())
    }
}
