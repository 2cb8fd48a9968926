//! The four form inputs and how each turns into a request.
//!
//! Each form is a record of strings, edited field by field. `request`
//! checks the page's required fields in order and coerces text to the typed
//! request the service expects; `call` sends it through the matching
//! [`Submit`] operation.

use agro_adapter::{
    CropRecommendation, CropRecommendationRequest, DiseaseDetection, Endpoint,
    FertilizerRecommendation, FertilizerRecommendationRequest, ImageFile, Submit, YieldPrediction,
    YieldPredictionRequest,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::catalog;
use crate::error::{FormError, Result};

pub const FILL_ALL_FIELDS: &str = "Missing required field: Please fill all fields";
pub const MISSING_CROPNAME: &str = "Missing required field: cropname";
pub const FILL_ALL_NUTRIENTS: &str = "Missing required field: Please fill all nutrient values";
pub const MISSING_YEAR: &str = "Missing required field: Year";
pub const NO_FILE_UPLOADED: &str = "No file uploaded";

/// A page's input record.
#[async_trait]
pub trait Form: Default + Send + 'static {
    type Request: Send + 'static;
    type Response: DeserializeOwned + Clone + Send + Sync + 'static;

    const ENDPOINT: Endpoint;
    /// Shown when the service could not be reached or answered garbage.
    const FAILURE_MESSAGE: &'static str;

    /// Validate and coerce. Errors carry the message the page displays.
    fn request(&self) -> Result<Self::Request>;

    /// Set a text field by its UI name.
    fn set(&mut self, field: &str, value: &str) -> Result<()>;

    /// Send a validated request to this form's endpoint.
    async fn call(submitter: &dyn Submit, request: Self::Request) -> agro_adapter::Result<Self::Response>;
}

fn blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn float(field: &'static str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or(FormError::NotNumber { field })
}

fn integer(field: &'static str, raw: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| FormError::NotInteger { field })
}

// ── crop recommendation ─────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CropForm {
    pub nitrogen: String,
    pub phosphorus: String,
    pub potassium: String,
    pub temperature: String,
    pub humidity: String,
    pub ph: String,
    pub rainfall: String,
}

#[async_trait]
impl Form for CropForm {
    type Request = CropRecommendationRequest;
    type Response = CropRecommendation;
    const ENDPOINT: Endpoint = Endpoint::Crop;
    const FAILURE_MESSAGE: &'static str = "Failed to get recommendation. Please try again.";

    fn request(&self) -> Result<CropRecommendationRequest> {
        let all = [
            &self.nitrogen,
            &self.phosphorus,
            &self.potassium,
            &self.temperature,
            &self.humidity,
            &self.ph,
            &self.rainfall,
        ];
        if all.iter().any(|v| blank(v)) {
            return Err(FormError::Missing(FILL_ALL_FIELDS));
        }
        Ok(CropRecommendationRequest {
            nitrogen: float("nitrogen", &self.nitrogen)?,
            phosphorus: float("phosphorus", &self.phosphorus)?,
            potassium: float("potassium", &self.potassium)?,
            temperature: float("temperature", &self.temperature)?,
            humidity: float("humidity", &self.humidity)?,
            ph: float("ph", &self.ph)?,
            rainfall: float("rainfall", &self.rainfall)?,
        })
    }

    async fn call(submitter: &dyn Submit, request: Self::Request) -> agro_adapter::Result<Self::Response> {
        submitter.recommend_crop(&request).await
    }

    fn set(&mut self, field: &str, value: &str) -> Result<()> {
        let slot = match field {
            "nitrogen" => &mut self.nitrogen,
            "phosphorus" => &mut self.phosphorus,
            "potassium" => &mut self.potassium,
            "temperature" => &mut self.temperature,
            "humidity" => &mut self.humidity,
            "ph" => &mut self.ph,
            "rainfall" => &mut self.rainfall,
            other => return Err(FormError::UnknownField(other.to_string())),
        };
        *slot = value.to_string();
        Ok(())
    }
}

// ── fertilizer guide ────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FertilizerForm {
    pub crop: String,
    pub nitrogen: String,
    pub phosphorus: String,
    pub potassium: String,
}

#[async_trait]
impl Form for FertilizerForm {
    type Request = FertilizerRecommendationRequest;
    type Response = FertilizerRecommendation;
    const ENDPOINT: Endpoint = Endpoint::Fertilizer;
    const FAILURE_MESSAGE: &'static str =
        "Failed to get fertilizer recommendation. Please try again.";

    fn request(&self) -> Result<FertilizerRecommendationRequest> {
        if blank(&self.crop) {
            return Err(FormError::Missing(MISSING_CROPNAME));
        }
        if blank(&self.nitrogen) || blank(&self.phosphorus) || blank(&self.potassium) {
            return Err(FormError::Missing(FILL_ALL_NUTRIENTS));
        }
        let crop = catalog::lookup(&self.crop)
            .ok_or_else(|| FormError::UnknownCrop(self.crop.trim().to_string()))?;
        Ok(FertilizerRecommendationRequest {
            crop: crop.to_string(),
            nitrogen: integer("nitrogen", &self.nitrogen)?,
            phosphorus: integer("phosphorus", &self.phosphorus)?,
            potassium: integer("potassium", &self.potassium)?,
        })
    }

    async fn call(submitter: &dyn Submit, request: Self::Request) -> agro_adapter::Result<Self::Response> {
        submitter.recommend_fertilizer(&request).await
    }

    fn set(&mut self, field: &str, value: &str) -> Result<()> {
        let slot = match field {
            "crop" => &mut self.crop,
            "nitrogen" => &mut self.nitrogen,
            "phosphorus" => &mut self.phosphorus,
            "potassium" => &mut self.potassium,
            other => return Err(FormError::UnknownField(other.to_string())),
        };
        *slot = value.to_string();
        Ok(())
    }
}

// ── disease detection ───────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiseaseForm {
    pub image: Option<ImageFile>,
}

impl DiseaseForm {
    /// Take `image` if it is an image; anything else is ignored and the
    /// current selection kept. Returns whether it was taken.
    pub fn select(&mut self, image: ImageFile) -> bool {
        if !image.is_image() {
            return false;
        }
        self.image = Some(image);
        true
    }
}

#[async_trait]
impl Form for DiseaseForm {
    type Request = ImageFile;
    type Response = DiseaseDetection;
    const ENDPOINT: Endpoint = Endpoint::Disease;
    const FAILURE_MESSAGE: &'static str = "Failed to analyze disease. Please try again.";

    fn request(&self) -> Result<ImageFile> {
        self.image.clone().ok_or(FormError::Missing(NO_FILE_UPLOADED))
    }

    fn set(&mut self, field: &str, _value: &str) -> Result<()> {
        Err(FormError::UnknownField(field.to_string()))
    }

    async fn call(submitter: &dyn Submit, request: Self::Request) -> agro_adapter::Result<Self::Response> {
        submitter.detect_disease(request).await
    }
}

// ── yield prediction ────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct YieldForm {
    pub year: String,
    pub rainfall: String,
    pub pesticides: String,
    pub temperature: String,
    pub area: String,
    pub crop: String,
}

#[async_trait]
impl Form for YieldForm {
    type Request = YieldPredictionRequest;
    type Response = YieldPrediction;
    const ENDPOINT: Endpoint = Endpoint::Yield;
    const FAILURE_MESSAGE: &'static str = "Failed to predict yield. Please try again.";

    fn request(&self) -> Result<YieldPredictionRequest> {
        if blank(&self.year) {
            return Err(FormError::Missing(MISSING_YEAR));
        }
        let rest = [&self.rainfall, &self.pesticides, &self.temperature, &self.area, &self.crop];
        if rest.iter().any(|v| blank(v)) {
            return Err(FormError::Missing(FILL_ALL_FIELDS));
        }
        Ok(YieldPredictionRequest {
            year: integer("year", &self.year)?,
            rainfall_mm: float("rainfall", &self.rainfall)?,
            pesticides_tonnes: float("pesticides", &self.pesticides)?,
            avg_temp: float("temperature", &self.temperature)?,
            area: self.area.trim().to_string(),
            item: self.crop.trim().to_string(),
        })
    }

    async fn call(submitter: &dyn Submit, request: Self::Request) -> agro_adapter::Result<Self::Response> {
        submitter.predict_yield(&request).await
    }

    fn set(&mut self, field: &str, value: &str) -> Result<()> {
        let slot = match field {
            "year" => &mut self.year,
            "rainfall" => &mut self.rainfall,
            "pesticides" => &mut self.pesticides,
            "temperature" => &mut self.temperature,
            "area" => &mut self.area,
            "crop" => &mut self.crop,
            other => return Err(FormError::UnknownField(other.to_string())),
        };
        *slot = value.to_string();
        Ok(())
    }
}
