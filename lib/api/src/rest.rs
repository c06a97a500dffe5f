use actix_cors::Cors;
use actix_web::http::StatusCode;
use actix_web::{error, web, App, HttpRequest, HttpResponse, HttpServer, Result as ActixResult};
use peerlink_core::{Error, ErrorCategory, ProfileStore};
use peerlink_engine::{ErrorResponse, RecommendationRequest, RecommendationService, RefitOutcome, Strategy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Body of the strategy-pinned `/api/v1` and `/api/v2` routes.
#[derive(Deserialize)]
struct VersionedRequest {
    #[serde(alias = "user_id")]
    target_user_id: String,
    #[serde(default)]
    limit: Option<usize>,
}

impl VersionedRequest {
    fn into_request(self, strategy: Strategy) -> RecommendationRequest {
        RecommendationRequest {
            target_user_id: self.target_user_id,
            limit: self.limit,
            strategy,
        }
    }
}

#[derive(Serialize)]
struct ServiceDescriptor {
    name: &'static str,
    version: &'static str,
    endpoints: Vec<&'static str>,
}

#[derive(Serialize)]
struct RefitResponse {
    outcome: RefitOutcome,
}

const ENDPOINTS: &[&str] = &[
    "GET /health",
    "POST /api/v1/recommendations",
    "POST /api/v2/recommendations",
    "POST /recommendations",
    "GET /model",
    "POST /model/refit",
];

pub struct RestApi;

impl RestApi {
    pub async fn start<S: ProfileStore>(
        service: Arc<RecommendationService<S>>,
        port: u16,
    ) -> std::io::Result<()> {
        info!(port, "starting HTTP server");
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new().wrap(cors).configure(Self::routes(service.clone()))
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }

    /// Route table, shared by the server and the handler tests.
    pub fn routes<S: ProfileStore>(
        service: Arc<RecommendationService<S>>,
    ) -> impl FnOnce(&mut web::ServiceConfig) {
        move |cfg: &mut web::ServiceConfig| {
            cfg.app_data(web::Data::new(service))
                .app_data(web::JsonConfig::default().error_handler(json_error))
                .route("/", web::get().to(describe))
                .route("/health", web::get().to(health))
                .route("/api/v1/recommendations", web::post().to(recommend_rule_based::<S>))
                .route("/api/v2/recommendations", web::post().to(recommend_knn::<S>))
                .route("/recommendations", web::post().to(recommend::<S>))
                .route("/model", web::get().to(model_status::<S>))
                .route("/model/refit", web::post().to(refit::<S>));
        }
    }
}

fn status_for(category: ErrorCategory) -> StatusCode {
    match category {
        ErrorCategory::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCategory::ModelNotFitted
        | ErrorCategory::UpstreamTimeout
        | ErrorCategory::Upstream
        | ErrorCategory::DataUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCategory::InsufficientData | ErrorCategory::Storage | ErrorCategory::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(e: &Error) -> HttpResponse {
    let status = status_for(e.category());
    if status.is_server_error() {
        warn!(error = %e, status = status.as_u16(), "request failed");
    }
    HttpResponse::build(status).json(ErrorResponse::from(e))
}

fn json_error(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let body = ErrorResponse::from(&Error::InvalidRequest(err.to_string()));
    error::InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
}

async fn describe() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(ServiceDescriptor {
        name: "peerlink",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: ENDPOINTS.to_vec(),
    }))
}

async fn health() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy"
    })))
}

async fn respond<S: ProfileStore>(
    service: &RecommendationService<S>,
    request: RecommendationRequest,
) -> ActixResult<HttpResponse> {
    match service.recommend(&request).await {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn recommend_rule_based<S: ProfileStore>(
    service: web::Data<Arc<RecommendationService<S>>>,
    req: web::Json<VersionedRequest>,
) -> ActixResult<HttpResponse> {
    respond(&service, req.into_inner().into_request(Strategy::RuleBased)).await
}

async fn recommend_knn<S: ProfileStore>(
    service: web::Data<Arc<RecommendationService<S>>>,
    req: web::Json<VersionedRequest>,
) -> ActixResult<HttpResponse> {
    respond(&service, req.into_inner().into_request(Strategy::NearestNeighbor)).await
}

async fn recommend<S: ProfileStore>(
    service: web::Data<Arc<RecommendationService<S>>>,
    req: web::Json<RecommendationRequest>,
) -> ActixResult<HttpResponse> {
    respond(&service, req.into_inner()).await
}

async fn model_status<S: ProfileStore>(
    service: web::Data<Arc<RecommendationService<S>>>,
) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(service.model_status()))
}

async fn refit<S: ProfileStore>(
    service: web::Data<Arc<RecommendationService<S>>>,
) -> ActixResult<HttpResponse> {
    match service.request_refit().await {
        Ok(outcome) => Ok(HttpResponse::Accepted().json(RefitResponse { outcome })),
        Err(e) => Ok(error_response(&e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test;
    use peerlink_core::{InMemoryProfileStore, UserProfile};
    use peerlink_engine::EngineConfig;
    use serde_json::{json, Value};
    use std::future::Future;

    struct BrokenStore;

    impl ProfileStore for BrokenStore {
        fn fetch_profiles(&self) -> impl Future<Output = peerlink_core::Result<Vec<UserProfile>>> + Send {
            async { Err(Error::Upstream("feed is not valid JSON".to_string())) }
        }
    }

    fn campus() -> Vec<UserProfile> {
        vec![
            UserProfile::new("t").with_batch("2023").with_semester("3rd").with_department("CS"),
            UserProfile::new("a").with_batch("2023").with_semester("3rd").with_department("CS"),
            UserProfile::new("b").with_batch("2022").with_department("CS"),
            UserProfile::new("c").with_batch("2021").with_department("EE"),
            UserProfile::new("d").with_role("faculty").with_department("CS"),
            UserProfile::new("e").with_batch("2023").with_semester("5th"),
        ]
    }

    fn service() -> Arc<RecommendationService<InMemoryProfileStore>> {
        Arc::new(
            RecommendationService::new(
                Arc::new(InMemoryProfileStore::new(campus())),
                EngineConfig::default(),
            )
            .unwrap(),
        )
    }

    #[actix_web::test]
    async fn test_health_and_descriptor() {
        let app = test::init_service(App::new().configure(RestApi::routes(service()))).await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "healthy");

        let req = test::TestRequest::get().uri("/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["name"], "peerlink");
        assert!(body["endpoints"].as_array().unwrap().len() >= 5);
    }

    #[actix_web::test]
    async fn test_rule_based_route() {
        let app = test::init_service(App::new().configure(RestApi::routes(service()))).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/recommendations")
            .set_json(json!({"user_id": "t", "limit": 3}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["strategy"], "rule-based");
        assert_eq!(body["data"].as_array().unwrap().len(), 3);
        assert_eq!(body["data"][0]["candidate_id"], "a");
        assert_eq!(body["data"][0]["similarity_score"], 90.0);
    }

    #[actix_web::test]
    async fn test_knn_without_model_is_unavailable() {
        let app = test::init_service(App::new().configure(RestApi::routes(service()))).await;

        let req = test::TestRequest::post()
            .uri("/api/v2/recommendations")
            .set_json(json!({"user_id": "t"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["category"], "model_not_fitted");
    }

    #[actix_web::test]
    async fn test_knn_after_fit() {
        let svc = service();
        svc.fit_blocking(&campus()).unwrap();
        let app = test::init_service(App::new().configure(RestApi::routes(svc))).await;

        let req = test::TestRequest::post()
            .uri("/recommendations")
            .set_json(json!({"target_user_id": "t", "strategy": "knn"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["strategy"], "knn");

        let req = test::TestRequest::get().uri("/model").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["state"], "fitted");
        assert_eq!(body["corpus_size"], 6);
    }

    #[actix_web::test]
    async fn test_soft_failure_is_ok() {
        let app = test::init_service(App::new().configure(RestApi::routes(service()))).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/recommendations")
            .set_json(json!({"user_id": "nobody"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["reason"], "data_unavailable");
        assert_eq!(body["data"].as_array().unwrap().len(), 0);
    }

    #[actix_web::test]
    async fn test_store_failure_is_unavailable() {
        let svc = Arc::new(
            RecommendationService::new(Arc::new(BrokenStore), EngineConfig::default()).unwrap(),
        );
        let app = test::init_service(App::new().configure(RestApi::routes(svc))).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/recommendations")
            .set_json(json!({"user_id": "t"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["category"], "upstream");
    }

    #[actix_web::test]
    async fn test_invalid_requests() {
        let app = test::init_service(App::new().configure(RestApi::routes(service()))).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/recommendations")
            .set_json(json!({"user_id": "t", "limit": 0}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/recommendations")
            .set_json(json!({"limit": 3}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["category"], "invalid_request");
    }

    #[actix_web::test]
    async fn test_refit_route() {
        let app = test::init_service(App::new().configure(RestApi::routes(service()))).await;

        let req = test::TestRequest::post().uri("/model/refit").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["outcome"] == "scheduled" || body["outcome"] == "already_running");
    }
}
