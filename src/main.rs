//! Traffic Classifier Service
//!
//! This is the main entry point for the behavioral traffic classifier
//! service. It initializes the classifier and starts the web server that
//! exposes the classification endpoint to the enforcement layer.

use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use log::info;
use std::sync::Arc;

use traffic_classifier_service::api::{self, ApiState};
use traffic_classifier_service::config;
use traffic_classifier_service::core::TrafficClassifier;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    env_logger::init();

    info!("Starting traffic classifier service...");

    // Load configuration
    let config = Arc::new(config::load_config()?);

    // Initialize the classifier; one instance shared across all workers
    let classifier = Arc::new(TrafficClassifier::new(
        config.thresholds.clone(),
        config.decision.clone(),
    )?);

    let bind_addr = (config.server.host.clone(), config.server.port);
    let state = web::Data::new(ApiState {
        classifier,
        config: config.clone(),
    });

    // Start HTTP server
    HttpServer::new(move || App::new().app_data(state.clone()).configure(api::config))
        .bind(bind_addr)?
        .run()
        .await?;

    Ok(())
}
