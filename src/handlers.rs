use actix_cors::Cors;
use actix_web::{web, HttpResponse};
use tracing::{debug, info};

use crate::error::PredictError;
use crate::features::FeatureVector;
use crate::model_store::ModelStore;
use crate::models::{BiometricInput, ErrorResponse, PredictionResponse};

/// Any origin, method and header may call the API.
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allow_any_method()
        .allow_any_header()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/predict").route(web::post().to(predict)));
}

/// `POST /predict`
///
/// Errors are reported in the body as `{"error": ...}` with status 200, the
/// same as successful predictions.
pub async fn predict(store: web::Data<ModelStore>, body: web::Bytes) -> HttpResponse {
    info!(payload = %String::from_utf8_lossy(&body), "Received data");

    match run_prediction(&store, &body) {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => HttpResponse::Ok().json(ErrorResponse::from(&e)),
    }
}

fn run_prediction(store: &ModelStore, body: &[u8]) -> Result<PredictionResponse, PredictError> {
    store.ensure_loaded()?;

    let input = BiometricInput::from_slice(body)?;
    let features = FeatureVector::from_input(&input, store.variant());
    debug!(features = ?features.named().collect::<Vec<_>>(), "Feature vector");

    let prediction = store.predict(&features)?;
    Ok(PredictionResponse::from(prediction))
}
