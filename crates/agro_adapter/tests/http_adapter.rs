use agro_adapter::{
    AdapterError, Body, CropRecommendationRequest, Endpoint, FertilizerRecommendationRequest,
    FieldValue, HttpAdapter, ImageFile, Submit, YieldPredictionRequest, TRANSPORT_MESSAGE,
};
use agro_stub::{Scripted, StubState};
use serde_json::json;

async fn setup() -> (HttpAdapter, StubState, tokio::task::JoinHandle<()>) {
    let (addr, state, handle) = agro_stub::test::spawn().await.unwrap();
    (HttpAdapter::new(&format!("http://{addr}/")), state, handle)
}

fn crop_request() -> CropRecommendationRequest {
    CropRecommendationRequest {
        nitrogen: 90.0,
        phosphorus: 42.0,
        potassium: 43.0,
        temperature: 20.8,
        humidity: 82.0,
        ph: 6.5,
        rainfall: 202.0,
    }
}

// ── status ──────────────────────────────────────────────────────

#[tokio::test]
async fn health_check_decodes() {
    let (adapter, _state, _h) = setup().await;
    let health = adapter.health().await.unwrap();
    assert!(health.is_healthy());
    assert_eq!(health.models.get("yield_prediction"), Some(&true));
}

#[tokio::test]
async fn service_info_decodes() {
    let (adapter, _state, _h) = setup().await;
    let info = adapter.service_info().await.unwrap();
    assert_eq!(info.version.as_deref(), Some("1.0.0"));
    assert_eq!(info.endpoints.len(), 5);
}

// ── typed operations ────────────────────────────────────────────

#[tokio::test]
async fn recommend_crop_round_trip() {
    let (adapter, state, _h) = setup().await;
    let r = adapter.recommend_crop(&crop_request()).await.unwrap();
    assert_eq!(r.prediction.as_deref(), Some("rice"));
    let features = r.input_features.unwrap();
    assert_eq!(features.temperature, Some(20.8));

    let sent = &state.received_on("/predict-crop")[0];
    assert_eq!(
        sent.names(),
        vec!["Nitrogen", "Phosporus", "Potassium", "Temperature", "Humidity", "pH", "Rainfall"]
    );
}

#[tokio::test]
async fn recommend_fertilizer_round_trip() {
    let (adapter, _state, _h) = setup().await;
    let r = adapter
        .recommend_fertilizer(&FertilizerRecommendationRequest {
            crop: "maize".into(),
            nitrogen: 80,
            phosphorus: 40,
            potassium: 10,
        })
        .await
        .unwrap();
    assert_eq!(r.primary_deficiency.as_deref(), Some("K"));
    assert_eq!(r.nutrient_analysis.unwrap().k_diff, Some(30.0));
}

#[tokio::test]
async fn detect_disease_sends_image_part() {
    let (adapter, state, _h) = setup().await;
    let r = adapter
        .detect_disease(ImageFile::new("leaf.png", "image/png", vec![0x89, b'P', b'N', b'G']))
        .await
        .unwrap();
    assert_eq!(r.class_index, Some(30));
    assert_eq!(r.total_classes, Some(38));

    let sent = &state.received_on("/predict-disease")[0];
    assert_eq!(sent.names(), vec!["image"]);
    assert_eq!(sent.part("image").unwrap().content_type.as_deref(), Some("image/png"));
}

#[tokio::test]
async fn predict_yield_round_trip() {
    let (adapter, _state, _h) = setup().await;
    let r = adapter
        .predict_yield(&YieldPredictionRequest {
            year: 2013,
            rainfall_mm: 1485.0,
            pesticides_tonnes: 121.0,
            avg_temp: 16.37,
            area: "Albania".into(),
            item: "Maize".into(),
        })
        .await
        .unwrap();
    assert_eq!(r.prediction, Some(36613.0));
    assert_eq!(r.input_features.unwrap().area.unwrap().to_string(), "Albania");
}

// ── failure normalization ───────────────────────────────────────

#[tokio::test]
async fn service_validation_error_passes_through() {
    let (adapter, state, _h) = setup().await;
    // The adapter does not validate; an incomplete body reaches the service.
    let partial = vec![("Year".to_string(), FieldValue::Int(2013))];
    let err = adapter.submit(Endpoint::Yield, Body::Fields(partial)).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.to_string(), "Missing required field: average_rain_fall_mm_per_year");
    assert_eq!(state.received_on("/predict-yield")[0].field("Year"), Some("2013"));
}

#[tokio::test]
async fn scripted_error_without_message_reports_status() {
    let (adapter, state, _h) = setup().await;
    state.script("/predict-crop", Scripted::json(500, &json!({"error": null})));
    let err = adapter.recommend_crop(&crop_request()).await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP 500");
}

#[tokio::test]
async fn tolerant_success_decode() {
    let (adapter, state, _h) = setup().await;
    state.script(
        "/predict-disease",
        Scripted::json(200, &json!({"prediction": "Apple___healthy", "class_index": "three"})),
    );
    let r = adapter
        .detect_disease(ImageFile::new("leaf.jpg", "image/jpeg", vec![1]))
        .await
        .unwrap();
    assert_eq!(r.class_index, None);
    assert_eq!(r.display_name(), "Healthy Apple");
}

#[tokio::test]
async fn refused_connection_is_transport_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let adapter = HttpAdapter::new(&format!("http://{addr}"));
    let err = adapter.recommend_crop(&crop_request()).await.unwrap_err();
    assert!(matches!(err, AdapterError::Transport(_)));
    assert_eq!(err.to_string(), TRANSPORT_MESSAGE);
}
