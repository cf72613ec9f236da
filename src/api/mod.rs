//! API endpoints for the traffic classifier service.
//!
//! This module exposes the synchronous classification core over HTTP so the
//! enforcement layer can submit per-request features and act on verdicts.

use actix_web::{web, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::TrafficClassifier;
use crate::models::Config;

pub struct ApiState {
    pub classifier: Arc<TrafficClassifier>,
    pub config: Arc<Config>,
}

/// API configuration function for Actix-web
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(web::resource("/health").route(web::get().to(health_check)))
            .service(web::resource("/analyze").route(web::post().to(analyze))),
    );
}

/// Health check endpoint response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Per-request classification input
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub ip: String,
    pub path: String,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub size: u64,
}

/// Classification verdict
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub attack: bool,
    pub matched_patterns: Vec<String>,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Classification endpoint
pub async fn analyze(state: web::Data<ApiState>, req: web::Json<AnalyzeRequest>) -> impl Responder {
    let result = state.classifier.analyze_detailed(
        &req.ip,
        &req.path,
        req.user_agent.as_deref(),
        req.size,
    );
    HttpResponse::Ok().json(AnalyzeResponse {
        attack: result.is_attack,
        matched_patterns: result.matched_patterns,
        confidence: result.confidence,
        timestamp: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DecisionConfig, ThresholdConfig};
    use actix_web::{test, App};

    fn state() -> web::Data<ApiState> {
        let classifier = Arc::new(
            TrafficClassifier::new(ThresholdConfig::default(), DecisionConfig::default()).unwrap(),
        );
        web::Data::new(ApiState {
            classifier,
            config: Arc::new(Config::default()),
        })
    }

    #[actix_web::test]
    async fn test_health_check() {
        let app = test::init_service(App::new().app_data(state()).configure(config)).await;

        let req = test::TestRequest::get().uri("/api/v1/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let req = test::TestRequest::get().uri("/api/v1/health").to_request();
        let body = test::call_and_read_body(&app, req).await;
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert!(json["version"].is_string());
    }

    #[actix_web::test]
    async fn test_analyze_cold_start_is_benign() {
        let app = test::init_service(App::new().app_data(state()).configure(config)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/analyze")
            .set_json(AnalyzeRequest {
                ip: "203.0.113.9".to_string(),
                path: "/wp-admin".to_string(),
                user_agent: None,
                size: 0,
            })
            .to_request();

        let body: AnalyzeResponse = test::call_and_read_body_json(&app, req).await;
        assert!(!body.attack);
    }

    #[actix_web::test]
    async fn test_analyze_flags_probing_burst() {
        let app = test::init_service(App::new().app_data(state()).configure(config)).await;

        let mut last = None;
        for path in ["/", "/login", "/admin", "/.env", "/wp-admin"] {
            let req = test::TestRequest::post()
                .uri("/api/v1/analyze")
                .set_json(AnalyzeRequest {
                    ip: "203.0.113.10".to_string(),
                    path: path.to_string(),
                    user_agent: None,
                    size: 0,
                })
                .to_request();
            let body: AnalyzeResponse = test::call_and_read_body_json(&app, req).await;
            last = Some(body);
        }

        let last = last.unwrap();
        assert!(last.attack);
        assert!(!last.matched_patterns.is_empty());
        assert!(last.confidence >= 0.6);
    }
}
