//! Webhook routes exposing the reconciler to the orchestrator
//!
//! - `GET /`: domain filter negotiation
//! - `GET /records`: records currently owned
//! - `POST /records`: apply a batch of changes
//! - `POST /adjustendpoints`: endpoints returned unchanged
//! - `GET /healthz`: liveness

use axum::extract::State;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use wdns_core::{Changes, Endpoint, Reconciler};

/// Media type negotiated with the orchestrator
pub const MEDIA_TYPE: &str = "application/external.dns.webhook+json;version=1";

/// Shared state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub reconciler: Arc<Reconciler>,
    /// Cancelled on shutdown; in-flight backend calls abort
    pub shutdown: CancellationToken,
}

#[derive(Serialize)]
struct DomainFilterResponse<'a> {
    include: &'a [String],
    exclude: &'a [String],
}

/// Build the webhook router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(negotiate))
        .route("/records", get(records).post(apply_changes))
        .route("/adjustendpoints", post(adjust_endpoints))
        .route("/healthz", get(|| async { StatusCode::OK }))
        .with_state(state)
}

fn webhook_json<T: Serialize>(body: &T) -> Response {
    let mut response = Json(body).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(MEDIA_TYPE));
    response
}

async fn negotiate(State(state): State<AppState>) -> Response {
    let filter = state.reconciler.domain_filter();
    webhook_json(&DomainFilterResponse {
        include: &filter.include,
        exclude: &filter.exclude,
    })
}

async fn records(State(state): State<AppState>) -> Response {
    match state.reconciler.list_records(&state.shutdown).await {
        Ok(endpoints) => webhook_json(&endpoints),
        Err(e) => {
            error!("Failed to list records: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn apply_changes(State(state): State<AppState>, Json(changes): Json<Changes>) -> Response {
    info!("Applying {} change(s)", changes.len());

    match state.reconciler.apply_changes(&changes, &state.shutdown).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            error!("Failed to apply changes: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn adjust_endpoints(Json(endpoints): Json<Vec<Endpoint>>) -> Response {
    webhook_json(&endpoints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use tower::ServiceExt;
    use wdns_core::traits::{Backend, HostResolver};
    use wdns_core::{
        DomainFilter, Error, Record, RecordChange, Result, View, ViewClassifier, Zone,
    };

    #[derive(Default)]
    struct FakeBackend {
        created: Mutex<Vec<RecordChange>>,
    }

    #[async_trait]
    impl Backend for FakeBackend {
        async fn list_zones(&self) -> Result<Vec<Zone>> {
            Ok(vec![Zone::new(View::Public, "example.com")])
        }

        async fn list_records(&self) -> Result<Vec<Record>> {
            Ok(vec![Record {
                view: View::Public,
                name: "www.example.com".to_string(),
                record_type: "A".to_string(),
                values: vec!["1.2.3.4".to_string()],
                ttl: 300,
            }])
        }

        async fn create_record(&self, change: &RecordChange) -> Result<()> {
            self.created.lock().unwrap().push(change.clone());
            Ok(())
        }

        async fn update_record(&self, _change: &RecordChange) -> Result<()> {
            Err(Error::backend("update rejected"))
        }

        async fn delete_record(&self, _change: &RecordChange) -> Result<()> {
            Ok(())
        }

        fn backend_name(&self) -> &'static str {
            "fake"
        }
    }

    struct NoResolver;

    #[async_trait]
    impl HostResolver for NoResolver {
        async fn resolve(&self, _host: &str) -> Option<std::net::IpAddr> {
            None
        }
    }

    fn app(backend: Arc<FakeBackend>) -> Router {
        let reconciler = Reconciler::new(
            backend,
            ViewClassifier::new(Arc::new(NoResolver)),
            DomainFilter::new(vec!["example.com".to_string()], vec![]),
        );
        router(AppState {
            reconciler: Arc::new(reconciler),
            shutdown: CancellationToken::new(),
        })
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_negotiation_returns_domain_filter() {
        let response = app(Arc::default())
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], MEDIA_TYPE);
        assert_eq!(
            body_json(response).await,
            json!({"include": ["example.com"], "exclude": []})
        );
    }

    #[tokio::test]
    async fn test_get_records() {
        let response = app(Arc::default())
            .oneshot(Request::builder().uri("/records").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body[0]["dnsName"], "www.example.com");
        assert_eq!(body[0]["recordTTL"], 300);
        assert_eq!(body[0]["labels"]["view"], "public");
    }

    #[tokio::test]
    async fn test_post_records_creates() {
        let backend = Arc::new(FakeBackend::default());
        let changes = json!({
            "create": [{"dnsName": "api.example.com", "recordType": "A", "targets": ["8.8.8.8"]}]
        });

        let response = app(backend.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/records")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(changes.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let created = backend.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].name.as_str(), "api");
        assert_eq!(created[0].zone, "example.com");
    }

    #[tokio::test]
    async fn test_post_records_reports_aggregated_failure() {
        let backend = Arc::new(FakeBackend::default());
        let changes = json!({
            "create": [{"dnsName": "ok.example.com", "recordType": "A", "targets": ["8.8.8.8"]}],
            "updateNew": [{"dnsName": "www.example.com", "recordType": "A", "targets": ["8.8.4.4"]}]
        });

        let response = app(backend.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/records")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(changes.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let message = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(message.contains("update rejected"));
        assert_eq!(backend.created.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_adjust_endpoints_echoes() {
        let endpoints = json!([{"dnsName": "a.example.com", "recordType": "TXT", "targets": ["x"]}]);

        let response = app(Arc::default())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/adjustendpoints")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(endpoints.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body[0]["dnsName"], "a.example.com");
        assert_eq!(body[0]["targets"][0], "x");
    }
}
