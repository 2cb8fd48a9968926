use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::{AdapterError, Result};

/// Multipart field name the service reads uploaded images from.
pub const IMAGE_FIELD: &str = "image";

/// The four prediction routes exposed by the inference service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Crop,
    Fertilizer,
    Disease,
    Yield,
}

impl Endpoint {
    pub const ALL: [Endpoint; 4] = [
        Endpoint::Crop,
        Endpoint::Fertilizer,
        Endpoint::Disease,
        Endpoint::Yield,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Crop => "/predict-crop",
            Endpoint::Fertilizer => "/predict-fertilizer",
            Endpoint::Disease => "/predict-disease",
            Endpoint::Yield => "/predict-yield",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// A primitive form value. Everything goes over the wire as text.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Int(i64),
    Float(f64),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Int(n) => write!(f, "{n}"),
            // `90.0` prints as `90`, `20.8` as `20.8`
            FieldValue::Float(x) => write!(f, "{x}"),
        }
    }
}

/// An uploaded image held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, guessing its content type from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let content_type = content_type_for(path).unwrap_or("application/octet-stream");
        Ok(Self::new(file_name, content_type, bytes))
    }

    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }

    pub fn size_mb(&self) -> f64 {
        self.bytes.len() as f64 / 1024.0 / 1024.0
    }
}

/// Content type for common image extensions.
pub fn content_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        "webp" => Some("image/webp"),
        "tif" | "tiff" => Some("image/tiff"),
        _ => None,
    }
}

/// What a submission carries: either flat primitive fields, in record
/// order, or one image.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Fields(Vec<(String, FieldValue)>),
    Image(ImageFile),
}

impl Body {
    /// Flatten a wire record into form fields using its serde names.
    ///
    /// Only primitives are allowed; `null` fields are skipped and nested
    /// values are rejected.
    pub fn from_record<T: Serialize>(record: &T) -> Result<Self> {
        let value = serde_json::to_value(record)?;
        let Value::Object(map) = value else {
            return Err(AdapterError::Encode("record must serialize to an object".into()));
        };

        let mut fields = Vec::with_capacity(map.len());
        for (name, v) in map {
            let field = match v {
                Value::Null => continue,
                Value::String(s) => FieldValue::Text(s),
                Value::Bool(b) => FieldValue::Text(b.to_string()),
                Value::Number(n) => match n.as_i64() {
                    Some(i) => FieldValue::Int(i),
                    None => FieldValue::Float(n.as_f64().unwrap_or(f64::NAN)),
                },
                Value::Array(_) | Value::Object(_) => {
                    return Err(AdapterError::Encode(format!("field '{name}' is not a primitive")))
                }
            };
            fields.push((name, field));
        }
        Ok(Body::Fields(fields))
    }

    /// Field names as they will appear in the multipart body.
    pub fn field_names(&self) -> Vec<&str> {
        match self {
            Body::Fields(fields) => fields.iter().map(|(name, _)| name.as_str()).collect(),
            Body::Image(_) => vec![IMAGE_FIELD],
        }
    }
}

// ── wire requests ───────────────────────────────────────────────
//
// Field names follow the service's contract, including its spellings.

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropRecommendationRequest {
    #[serde(rename = "Nitrogen")]
    pub nitrogen: f64,
    #[serde(rename = "Phosporus")]
    pub phosphorus: f64,
    #[serde(rename = "Potassium")]
    pub potassium: f64,
    #[serde(rename = "Temperature")]
    pub temperature: f64,
    #[serde(rename = "Humidity")]
    pub humidity: f64,
    #[serde(rename = "pH")]
    pub ph: f64,
    #[serde(rename = "Rainfall")]
    pub rainfall: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FertilizerRecommendationRequest {
    #[serde(rename = "cropname")]
    pub crop: String,
    pub nitrogen: i64,
    #[serde(rename = "phosphorous")]
    pub phosphorus: i64,
    #[serde(rename = "pottasium")]
    pub potassium: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YieldPredictionRequest {
    #[serde(rename = "Year")]
    pub year: i64,
    #[serde(rename = "average_rain_fall_mm_per_year")]
    pub rainfall_mm: f64,
    #[serde(rename = "pesticides_tonnes")]
    pub pesticides_tonnes: f64,
    #[serde(rename = "avg_temp")]
    pub avg_temp: f64,
    #[serde(rename = "Area")]
    pub area: String,
    #[serde(rename = "Item")]
    pub item: String,
}
