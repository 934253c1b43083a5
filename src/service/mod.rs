use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::data::SelectedFile;
use crate::error::Result;
use crate::model::PredictionResponse;

mod http;

pub use http::HttpPredictor;

/// Remote fraud-prediction service.
#[async_trait]
pub trait PredictionService {
    /// Upload one file and return the raw classification payload.
    async fn predict(&self, file: &SelectedFile) -> Result<PredictionResponse>;

    /// Processed dataset rows kept by the service.
    async fn fetch_data(&self) -> Result<Vec<Map<String, Value>>>;

    /// True when the service origin answers at all.
    async fn health(&self) -> bool;
}
