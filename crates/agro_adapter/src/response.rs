//! Success payloads, decoded leniently.
//!
//! The service is trusted on success: every field is optional and a field
//! that is missing or carries an unexpected type decodes as `None` instead
//! of failing the whole response.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{AdapterError, Result};

fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_map<'de, D, V>(deserializer: D) -> std::result::Result<BTreeMap<String, V>, D::Error>
where
    D: Deserializer<'de>,
    V: DeserializeOwned,
{
    let Value::Object(map) = Value::deserialize(deserializer)? else {
        return Ok(BTreeMap::new());
    };
    Ok(map
        .into_iter()
        .filter_map(|(k, v)| serde_json::from_value(v).ok().map(|v| (k, v)))
        .collect())
}

/// Decode a success body for `route`. Fails only when the body is not an
/// object at all.
pub fn decode<T: DeserializeOwned>(route: &str, value: Value) -> Result<T> {
    if !value.is_object() {
        return Err(AdapterError::Decode {
            route: route.to_string(),
            detail: "expected a JSON object".into(),
        });
    }
    serde_json::from_value(value).map_err(|e| AdapterError::Decode {
        route: route.to_string(),
        detail: e.to_string(),
    })
}

/// A number or a string; the yield service echoes `area` as either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(n) => write!(f, "{n}"),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

// ── /predict-crop ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CropRecommendation {
    #[serde(default, deserialize_with = "lenient")]
    pub prediction: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub confidence: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub input_features: Option<CropFeatures>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CropFeatures {
    #[serde(default, deserialize_with = "lenient")]
    pub nitrogen: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub phosphorus: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub potassium: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub temperature: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub humidity: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub ph: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub rainfall: Option<f64>,
}

// ── /predict-fertilizer ─────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FertilizerRecommendation {
    #[serde(default, deserialize_with = "lenient")]
    pub recommendation: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub nutrient_analysis: Option<NutrientAnalysis>,
    #[serde(default, deserialize_with = "lenient")]
    pub primary_deficiency: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub crop: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientAnalysis {
    #[serde(rename = "required_N", default, deserialize_with = "lenient")]
    pub required_n: Option<f64>,
    #[serde(rename = "current_N", default, deserialize_with = "lenient")]
    pub current_n: Option<f64>,
    #[serde(rename = "N_diff", default, deserialize_with = "lenient")]
    pub n_diff: Option<f64>,
    #[serde(rename = "required_P", default, deserialize_with = "lenient")]
    pub required_p: Option<f64>,
    #[serde(rename = "current_P", default, deserialize_with = "lenient")]
    pub current_p: Option<f64>,
    #[serde(rename = "P_diff", default, deserialize_with = "lenient")]
    pub p_diff: Option<f64>,
    #[serde(rename = "required_K", default, deserialize_with = "lenient")]
    pub required_k: Option<f64>,
    #[serde(rename = "current_K", default, deserialize_with = "lenient")]
    pub current_k: Option<f64>,
    #[serde(rename = "K_diff", default, deserialize_with = "lenient")]
    pub k_diff: Option<f64>,
}

/// One nutrient row: (label, required, current, difference).
pub type NutrientRow = (&'static str, Option<f64>, Option<f64>, Option<f64>);

impl NutrientAnalysis {
    pub fn rows(&self) -> [NutrientRow; 3] {
        [
            ("N", self.required_n, self.current_n, self.n_diff),
            ("P", self.required_p, self.current_p, self.p_diff),
            ("K", self.required_k, self.current_k, self.k_diff),
        ]
    }
}

// ── /predict-disease ────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiseaseDetection {
    #[serde(default, deserialize_with = "lenient")]
    pub prediction: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub disease: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub cause: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub cure: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub class_index: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub total_classes: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub html: Option<String>,
}

impl DiseaseDetection {
    /// Human name for the result: the service's `disease`, else one derived
    /// from the raw class label, else "Unknown Disease".
    pub fn display_name(&self) -> String {
        if let Some(d) = self.disease.as_deref().filter(|d| !d.is_empty()) {
            return d.to_string();
        }
        match self.prediction.as_deref() {
            Some(label) if !label.is_empty() => disease_name_from_label(label),
            _ => "Unknown Disease".to_string(),
        }
    }
}

/// Turn a class label like `Tomato___Late_blight` into `Late blight`, and
/// `Corn_(maize)___healthy` into `Healthy Corn maize`.
pub fn disease_name_from_label(label: &str) -> String {
    let Some((plant, disease)) = label.split_once("___") else {
        return label.replace('_', " ").trim().to_string();
    };
    let disease = disease.replace('_', " ").trim().to_string();
    if disease.eq_ignore_ascii_case("healthy") {
        let plant: String = plant
            .replace('_', " ")
            .chars()
            .filter(|c| !matches!(c, '(' | ')' | ','))
            .collect();
        return format!("Healthy {}", plant.trim());
    }
    disease
}

// ── /predict-yield ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YieldPrediction {
    #[serde(default, deserialize_with = "lenient")]
    pub prediction: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub input_features: Option<YieldFeatures>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YieldFeatures {
    #[serde(default, deserialize_with = "lenient")]
    pub year: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub rainfall: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub pesticides: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub avg_temperature: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub area: Option<Scalar>,
    #[serde(default, deserialize_with = "lenient")]
    pub item: Option<String>,
}

// ── status ──────────────────────────────────────────────────────

/// `GET /health`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    /// Model name → loaded.
    #[serde(default, deserialize_with = "lenient_map")]
    pub models: BTreeMap<String, bool>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.as_deref() == Some("healthy")
    }
}

/// `GET /`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub version: Option<String>,
    /// Route → description.
    #[serde(default, deserialize_with = "lenient_map")]
    pub endpoints: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn crop_decodes_known_fields() {
        let r: CropRecommendation = decode(
            "/predict-crop",
            json!({"prediction": "rice", "message": "Rice is the best crop to be cultivated.", "confidence": "95%"}),
        )
        .unwrap();
        assert_eq!(r.prediction.as_deref(), Some("rice"));
        assert_eq!(r.confidence.as_deref(), Some("95%"));
        assert!(r.input_features.is_none());
    }

    #[test]
    fn mistyped_fields_decode_as_absent() {
        let r: CropRecommendation = decode(
            "/predict-crop",
            json!({"prediction": 7, "message": "ok", "input_features": "nope"}),
        )
        .unwrap();
        assert!(r.prediction.is_none());
        assert_eq!(r.message.as_deref(), Some("ok"));
        assert!(r.input_features.is_none());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let r: YieldPrediction = decode(
            "/predict-yield",
            json!({"prediction": 36613.0, "unit": "tonnes per hectare", "model": "dtr"}),
        )
        .unwrap();
        assert_eq!(r.prediction, Some(36613.0));
    }

    #[test]
    fn empty_object_is_a_valid_success() {
        let r: DiseaseDetection = decode("/predict-disease", json!({})).unwrap();
        assert_eq!(r, DiseaseDetection::default());
    }

    #[test]
    fn non_object_body_is_a_decode_error() {
        let err = decode::<CropRecommendation>("/predict-crop", json!(["rice"])).unwrap_err();
        assert!(matches!(err, AdapterError::Decode { .. }));
    }

    #[test]
    fn nutrient_analysis_uses_upper_case_wire_names() {
        let r: FertilizerRecommendation = decode(
            "/predict-fertilizer",
            json!({
                "recommendation": "The N value of your soil is low.",
                "nutrient_analysis": {
                    "required_N": 80, "current_N": 50, "N_diff": 30,
                    "required_P": 40, "current_P": 30, "P_diff": 10,
                    "required_K": 40, "current_K": 20, "K_diff": 20
                },
                "primary_deficiency": "N",
                "crop": "rice"
            }),
        )
        .unwrap();
        let rows = r.nutrient_analysis.unwrap().rows();
        assert_eq!(rows[0], ("N", Some(80.0), Some(50.0), Some(30.0)));
        assert_eq!(rows[2].3, Some(20.0));
    }

    #[test]
    fn yield_area_accepts_text_or_number() {
        let text: YieldFeatures = serde_json::from_value(json!({"area": "Albania"})).unwrap();
        assert_eq!(text.area, Some(Scalar::Text("Albania".into())));
        let num: YieldFeatures = serde_json::from_value(json!({"area": 12.5})).unwrap();
        assert_eq!(num.area.unwrap().to_string(), "12.5");
    }

    #[test]
    fn disease_names_from_labels() {
        assert_eq!(disease_name_from_label("Tomato___Late_blight"), "Late blight");
        assert_eq!(disease_name_from_label("Corn_(maize)___healthy"), "Healthy Corn maize");
        assert_eq!(disease_name_from_label("Pepper,_bell___healthy"), "Healthy Pepper bell");
        assert_eq!(disease_name_from_label("odd_label"), "odd label");
    }

    #[test]
    fn display_name_prefers_service_value() {
        let d = DiseaseDetection {
            prediction: Some("Apple___Apple_scab".into()),
            disease: Some("Apple scab".into()),
            ..Default::default()
        };
        assert_eq!(d.display_name(), "Apple scab");
        let derived = DiseaseDetection { prediction: Some("Apple___Black_rot".into()), ..Default::default() };
        assert_eq!(derived.display_name(), "Black rot");
        assert_eq!(DiseaseDetection::default().display_name(), "Unknown Disease");
    }

    #[test]
    fn health_models_skip_non_boolean_entries() {
        let h: HealthStatus = decode(
            "/health",
            json!({"status": "healthy", "models": {"crop_recommendation": true, "disease_detection": false, "bogus": "x"}}),
        )
        .unwrap();
        assert!(h.is_healthy());
        assert_eq!(h.models.len(), 2);
        assert_eq!(h.models["disease_detection"], false);
    }
}
