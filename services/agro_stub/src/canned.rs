//! Default replies for each route when nothing is scripted.
//!
//! These check the wire contract (required field names, numeric parsing,
//! an `image` part) the way the real service does, and answer with fixed
//! placeholder predictions. They are not a model of the service.

use serde_json::{json, Value};

use crate::error::StubError;
use crate::script::ReceivedRequest;

pub const CROP_FIELDS: [&str; 7] = [
    "Nitrogen",
    "Phosporus",
    "Potassium",
    "Temperature",
    "Humidity",
    "pH",
    "Rainfall",
];
pub const FERTILIZER_FIELDS: [&str; 4] = ["cropname", "nitrogen", "phosphorous", "pottasium"];
pub const YIELD_FIELDS: [&str; 6] = [
    "Year",
    "average_rain_fall_mm_per_year",
    "pesticides_tonnes",
    "avg_temp",
    "Area",
    "Item",
];

/// Crops the fertilizer table knows about.
pub const KNOWN_CROPS: [&str; 22] = [
    "rice", "maize", "chickpea", "kidneybeans", "pigeonpeas", "mothbeans", "mungbean",
    "blackgram", "lentil", "pomegranate", "banana", "mango", "grapes", "watermelon",
    "muskmelon", "apple", "orange", "papaya", "coconut", "cotton", "jute", "coffee",
];

/// Single N/P/K reference every crop is compared against.
const REFERENCE_NPK: (i64, i64, i64) = (80, 40, 40);

fn require<'a>(req: &'a ReceivedRequest, fields: &[&str]) -> Result<Vec<&'a str>, StubError> {
    fields
        .iter()
        .map(|f| req.field(f).ok_or_else(|| StubError::missing_field(f)))
        .collect()
}

fn float(name: &str, raw: &str) -> Result<f64, StubError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| StubError::bad_request(format!("Invalid input data: could not convert string to float: '{raw}' ({name})")))
}

fn int(name: &str, raw: &str) -> Result<i64, StubError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| StubError::bad_request(format!("Invalid input data: invalid literal for int(): '{raw}' ({name})")))
}

pub fn crop(req: &ReceivedRequest) -> Result<Value, StubError> {
    let raw = require(req, &CROP_FIELDS)?;
    let mut v = [0.0; 7];
    for (i, (name, text)) in CROP_FIELDS.iter().zip(&raw).enumerate() {
        v[i] = float(name, text)?;
    }
    Ok(json!({
        "prediction": "rice",
        "message": "Rice is the best crop to be cultivated.",
        "confidence": "High",
        "input_features": {
            "nitrogen": v[0], "phosphorus": v[1], "potassium": v[2],
            "temperature": v[3], "humidity": v[4], "ph": v[5], "rainfall": v[6]
        }
    }))
}

fn deficiency_key(n: i64, p: i64, k: i64) -> (&'static str, &'static str) {
    // largest absolute gap wins; ties resolve K, then P, then N
    let (nutrient, diff) = [("N", n), ("P", p), ("K", k)]
        .into_iter()
        .fold(("N", n), |best, cur| if cur.1.abs() >= best.1.abs() { cur } else { best });
    let advice = match (nutrient, diff < 0) {
        ("N", true) => "The N value of soil is high and might give rise to weeds.",
        ("N", false) => "The N value of your soil is low.",
        ("P", true) => "The P value of your soil is high.",
        ("P", false) => "The P value of your soil is low.",
        ("K", true) => "The K value of your soil is high.",
        _ => "The K value of your soil is low.",
    };
    (nutrient, advice)
}

pub fn fertilizer(req: &ReceivedRequest) -> Result<Value, StubError> {
    let raw = require(req, &FERTILIZER_FIELDS)?;
    let crop = raw[0];
    let n = int("nitrogen", raw[1])?;
    let p = int("phosphorous", raw[2])?;
    let k = int("pottasium", raw[3])?;

    if !KNOWN_CROPS.contains(&crop) {
        return Err(StubError::bad_request(format!("Crop '{crop}' not found in database")));
    }

    let (nr, pr, kr) = REFERENCE_NPK;
    let (dn, dp, dk) = (nr - n, pr - p, kr - k);
    let (primary, advice) = deficiency_key(dn, dp, dk);

    Ok(json!({
        "recommendation": advice,
        "nutrient_analysis": {
            "required_N": nr, "current_N": n, "N_diff": dn,
            "required_P": pr, "current_P": p, "P_diff": dp,
            "required_K": kr, "current_K": k, "K_diff": dk
        },
        "primary_deficiency": primary,
        "crop": crop
    }))
}

pub fn disease(req: &ReceivedRequest) -> Result<Value, StubError> {
    let image = req
        .part("image")
        .ok_or_else(|| StubError::bad_request("No file uploaded"))?;
    if image.file_name.as_deref().unwrap_or("").is_empty() {
        return Err(StubError::bad_request("No selected file"));
    }
    Ok(json!({
        "prediction": "Tomato___Late_blight",
        "disease": "Late blight",
        "cause": "Caused by the water mold Phytophthora infestans.",
        "cure": "Remove infected plants and apply a copper-based fungicide.",
        "class_index": 30,
        "total_classes": 38
    }))
}

pub fn yield_prediction(req: &ReceivedRequest) -> Result<Value, StubError> {
    let raw = require(req, &YIELD_FIELDS)?;
    let year = int("Year", raw[0])?;
    let rainfall = float("average_rain_fall_mm_per_year", raw[1])?;
    let pesticides = float("pesticides_tonnes", raw[2])?;
    let avg_temp = float("avg_temp", raw[3])?;

    Ok(json!({
        "prediction": 36613.0,
        "unit": "tonnes per hectare",
        "input_features": {
            "year": year, "rainfall": rainfall, "pesticides": pesticides,
            "avg_temperature": avg_temp, "area": raw[4], "item": raw[5]
        }
    }))
}

pub fn health() -> Value {
    json!({
        "status": "healthy",
        "models": {
            "crop_recommendation": true,
            "disease_detection": true,
            "yield_prediction": true
        }
    })
}

pub fn index() -> Value {
    json!({
        "message": "Agricultural ML API",
        "version": "1.0.0",
        "endpoints": {
            "/predict-crop": "POST - Crop recommendation",
            "/predict-fertilizer": "POST - Fertilizer recommendation",
            "/predict-disease": "POST - Disease detection",
            "/predict-yield": "POST - Yield prediction",
            "/health": "GET - Health check"
        }
    })
}
