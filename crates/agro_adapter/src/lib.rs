//! Agro adapter — the single IO boundary between form pages and the
//! inference service.
//!
//! # Architecture
//!
//! ```text
//! Page (validated, typed request)
//!   │
//!   ▼
//! Body::{Fields, Image}          (flattened with wire names)
//!   │
//!   ▼  (IO boundary)
//! Submit::submit()               one multipart POST, no retry
//!   │
//!   ▼
//! Ok(JSON object) | Err(AdapterError::{Server, Transport, Decode})
//!   │
//!   ▼
//! response::decode::<T>()        lenient, per endpoint
//! ```
//!
//! The adapter never knows what a complete form looks like; validation
//! belongs to the page.

pub mod error;
#[cfg(feature = "http")]
pub mod http;
pub mod response;
pub mod types;

use async_trait::async_trait;
use serde_json::Value;

pub use error::{AdapterError, Result, TRANSPORT_MESSAGE};
#[cfg(feature = "http")]
pub use http::HttpAdapter;
pub use response::{
    CropRecommendation, DiseaseDetection, FertilizerRecommendation, HealthStatus, NutrientAnalysis,
    ServiceInfo, YieldPrediction,
};
pub use types::{
    Body, CropRecommendationRequest, Endpoint, FertilizerRecommendationRequest, FieldValue,
    ImageFile, YieldPredictionRequest, IMAGE_FIELD,
};

/// Send one submission to an endpoint.
///
/// Implementations return the decoded JSON object on success and a
/// normalized [`AdapterError`] otherwise. The typed helpers are provided on
/// top of `submit`.
#[async_trait]
pub trait Submit: Send + Sync {
    async fn submit(&self, endpoint: Endpoint, body: Body) -> Result<Value>;

    async fn recommend_crop(&self, req: &CropRecommendationRequest) -> Result<CropRecommendation> {
        let value = self.submit(Endpoint::Crop, Body::from_record(req)?).await?;
        response::decode(Endpoint::Crop.path(), value)
    }

    async fn recommend_fertilizer(
        &self,
        req: &FertilizerRecommendationRequest,
    ) -> Result<FertilizerRecommendation> {
        let value = self.submit(Endpoint::Fertilizer, Body::from_record(req)?).await?;
        response::decode(Endpoint::Fertilizer.path(), value)
    }

    async fn detect_disease(&self, image: ImageFile) -> Result<DiseaseDetection> {
        let value = self.submit(Endpoint::Disease, Body::Image(image)).await?;
        response::decode(Endpoint::Disease.path(), value)
    }

    async fn predict_yield(&self, req: &YieldPredictionRequest) -> Result<YieldPrediction> {
        let value = self.submit(Endpoint::Yield, Body::from_record(req)?).await?;
        response::decode(Endpoint::Yield.path(), value)
    }
}
