//! HTTP exposition of the scrape pipeline

use crate::collector::ScrapeCollector;
use crate::errors::Result;
use crate::metrics;
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use serde_json::json;
use tracing::{error, info};

pub struct AppState {
    pub collector: ScrapeCollector,
    pub metrics_path: String,
}

// Run one scrape and render it; any failure is scoped to this request
pub async fn scrape_metrics(data: web::Data<AppState>) -> impl Responder {
    let rendered = data
        .collector
        .scrape()
        .await
        .and_then(|snapshot| metrics::encode(&snapshot));

    match rendered {
        Ok(body) => HttpResponse::Ok()
            .content_type(metrics::content_type())
            .body(body),
        Err(e) => {
            error!("Scrape failed: {}", e);
            HttpResponse::InternalServerError()
                .content_type("text/plain; charset=utf-8")
                .body(format!("scrape failed: {}", e))
        }
    }
}

// Health check endpoint
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "OK" }))
}

pub async fn landing_page(data: web::Data<AppState>) -> impl Responder {
    let body = format!(
        "<html><head><title>PagerDuty Exporter</title></head>\
         <body><h1>PagerDuty Exporter</h1><p><a href=\"{0}\">{0}</a></p></body></html>",
        data.metrics_path
    );

    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

pub fn configure(cfg: &mut web::ServiceConfig, metrics_path: &str) {
    cfg.route(metrics_path, web::get().to(scrape_metrics))
        .route("/health", web::get().to(health_check))
        .route("/", web::get().to(landing_page));
}

/// Serve until the server is stopped
pub async fn run(listen_address: &str, state: AppState) -> Result<()> {
    let metrics_path = state.metrics_path.clone();
    let state = web::Data::new(state);

    info!("Beginning to serve on {} (metrics at {})", listen_address, metrics_path);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(|cfg| configure(cfg, &metrics_path))
    })
    .bind(listen_address)?
    .run()
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::pagination::tests::{service_json, FakeApi};
    use crate::pagination::ResourceKind;
    use actix_web::{http::StatusCode, test};
    use std::sync::Arc;

    fn state(api: FakeApi) -> web::Data<AppState> {
        let config = Config::default();
        web::Data::new(AppState {
            collector: ScrapeCollector::new(Arc::new(api), &config).unwrap(),
            metrics_path: config.metrics_path,
        })
    }

    #[actix_web::test]
    async fn test_metrics_endpoint() {
        let api = FakeApi::default().with_collection(
            ResourceKind::Services,
            vec![
                service_json("P1", "api_SVC", Some("Ops")),
                service_json("P2", "worker", Some("Ops")),
                service_json("P3", "db_SVC", Some("Data")),
            ],
        );
        let app = test::init_service(
            App::new()
                .app_data(state(api))
                .configure(|cfg| configure(cfg, "/metrics")),
        )
        .await;

        let req = test::TestRequest::get().uri("/metrics").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = test::read_body(resp).await;
        let body = std::str::from_utf8(&body).unwrap();
        assert!(body.contains("pagerduty_total_services_metric 3"));
        assert!(body.contains("pagerduty_total_services_compliant_metric 2"));
        assert!(body.contains("pagerduty_total_users_metric 0"));
    }

    #[actix_web::test]
    async fn test_metrics_endpoint_upstream_failure() {
        let api = FakeApi {
            fail_on: Some(ResourceKind::Users),
            ..FakeApi::default()
        };
        let app = test::init_service(
            App::new()
                .app_data(state(api))
                .configure(|cfg| configure(cfg, "/metrics")),
        )
        .await;

        let req = test::TestRequest::get().uri("/metrics").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        // still serving after a failed scrape
        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_landing_page_links_metrics() {
        let app = test::init_service(
            App::new()
                .app_data(state(FakeApi::default()))
                .configure(|cfg| configure(cfg, "/metrics")),
        )
        .await;

        let req = test::TestRequest::get().uri("/").to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert!(std::str::from_utf8(&body).unwrap().contains("href=\"/metrics\""));
    }
}
