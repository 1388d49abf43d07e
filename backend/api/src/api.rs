//! Axum REST API handlers.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::auth;
use crate::contributions::{self, ListQuery, Pagination};
use crate::errors::ApiError;
use crate::kyc::{self, PendingQuery};
use crate::models::{Contribution, KycRecord};
use crate::rate_limit::{self, RateLimiter};
use crate::validation::{ContributionRequest, KycSubmission, ReviewRequest};

pub struct ApiState {
    pub pool: SqlitePool,
    pub limiter: Arc<RateLimiter>,
    pub reviewer_api_key: Option<String>,
}

/// Every `OPTIONS` request, preflight or not, is answered by the CORS layer
/// before it reaches a route.
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/contributions",
            get(list_contributions)
                .post(create_contribution)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/contributions/:id",
            get(get_contribution).fallback(method_not_allowed),
        )
        .route(
            "/api/contributions/wallet/:address",
            get(wallet_contributions).fallback(method_not_allowed),
        )
        .route(
            "/api/contributions/status/:transaction_hash",
            get(transaction_status).fallback(method_not_allowed),
        )
        .route(
            "/api/kyc",
            get(get_kyc)
                .post(submit_kyc)
                .put(review_kyc)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/kyc/pending",
            get(pending_kyc).fallback(method_not_allowed),
        )
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::HeaderName::from_static("x-api-key"),
        ])
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ContributionResponse {
    pub success: bool,
    pub contribution: Contribution,
}

#[derive(Serialize)]
pub struct ContributionListResponse {
    pub success: bool,
    pub contributions: Vec<Contribution>,
    pub pagination: Pagination,
}

#[derive(Serialize)]
pub struct ContributionStatusResponse {
    pub success: bool,
    pub status: String,
    pub contribution: Contribution,
}

#[derive(Serialize)]
pub struct PendingKycResponse {
    pub success: bool,
    pub pending: Vec<KycRecord>,
    pub count: usize,
    pub limit: u32,
    pub offset: u64,
}

#[derive(Serialize)]
pub struct KycResponse {
    pub success: bool,
    pub kyc_record: KycRecord,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct KycQuery {
    pub contribution_id: Option<String>,
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /api/contributions`
pub async fn list_contributions(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = contributions::list(&state.pool, query).await?;
    Ok(Json(ContributionListResponse {
        success: true,
        contributions: page.contributions,
        pagination: page.pagination,
    }))
}

/// `POST /api/contributions`
///
/// Rate-limited per client before the body is even looked at.
pub async fn create_contribution(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    payload: Result<Json<ContributionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let client = rate_limit::client_key(&headers, peer.map(|ConnectInfo(addr)| addr));
    if !state.limiter.check(&client) {
        warn!(client = %client, "contribution attempt rate-limited");
        return Err(ApiError::RateLimited {
            retry_after: state.limiter.retry_hint(),
        });
    }

    let req = json_body(payload)?;
    let contribution = contributions::create(&state.pool, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(ContributionResponse {
            success: true,
            contribution,
        }),
    ))
}

/// `GET /api/contributions/:id`
pub async fn get_contribution(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let contribution = contributions::get(&state.pool, &id).await?;
    Ok(Json(ContributionResponse {
        success: true,
        contribution,
    }))
}

/// `GET /api/contributions/wallet/:address` — one donor's history.
pub async fn wallet_contributions(
    State(state): State<Arc<ApiState>>,
    Path(address): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = contributions::by_wallet(&state.pool, &address, query).await?;
    Ok(Json(ContributionListResponse {
        success: true,
        contributions: page.contributions,
        pagination: page.pagination,
    }))
}

/// `GET /api/contributions/status/:transaction_hash`
pub async fn transaction_status(
    State(state): State<Arc<ApiState>>,
    Path(transaction_hash): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let contribution = contributions::by_transaction_hash(&state.pool, &transaction_hash).await?;
    Ok(Json(ContributionStatusResponse {
        success: true,
        status: contribution.status.clone(),
        contribution,
    }))
}

/// `GET /api/kyc?contribution_id=…`
pub async fn get_kyc(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<KycQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let kyc_record = kyc::get(&state.pool, query.contribution_id.as_deref()).await?;
    Ok(Json(KycResponse {
        success: true,
        kyc_record,
    }))
}

/// `POST /api/kyc`
pub async fn submit_kyc(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<KycSubmission>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let kyc_record = kyc::submit(&state.pool, json_body(payload)?).await?;
    Ok((
        StatusCode::CREATED,
        Json(KycResponse {
            success: true,
            kyc_record,
        }),
    ))
}

/// `PUT /api/kyc` — reviewer-only status transition.
pub async fn review_kyc(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    payload: Result<Json<ReviewRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    auth::require_reviewer(&headers, state.reviewer_api_key.as_deref())?;
    let kyc_record = kyc::review(&state.pool, json_body(payload)?).await?;
    Ok(Json(KycResponse {
        success: true,
        kyc_record,
    }))
}

/// `GET /api/kyc/pending` — reviewer queue.
pub async fn pending_kyc(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Query(query): Query<PendingQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth::require_reviewer(&headers, state.reviewer_api_key.as_deref())?;
    let page = kyc::pending(&state.pool, query).await?;
    Ok(Json(PendingKycResponse {
        success: true,
        pending: page.pending,
        count: page.count,
        limit: page.limit,
        offset: page.offset,
    }))
}

pub async fn method_not_allowed(method: Method) -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": format!("Method {method} not allowed") })),
    )
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{HeaderValue, Request};
    use axum::response::Response;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::db::tests::{memory_pool, seed_campaign};

    const WALLET: &str = "0xABCDEF0123456789000000000000000000000000";

    async fn app_with(limiter: RateLimiter, reviewer_api_key: Option<&str>) -> Router {
        let pool = memory_pool().await;
        seed_campaign(&pool, "c1").await;
        router(Arc::new(ApiState {
            pool,
            limiter: Arc::new(limiter),
            reviewer_api_key: reviewer_api_key.map(String::from),
        }))
    }

    async fn app_with_key(reviewer_api_key: Option<&str>) -> Router {
        app_with(RateLimiter::new(10, Duration::from_secs(300)), reviewer_api_key).await
    }

    async fn app() -> Router {
        app_with_key(None).await
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .header("x-forwarded-for", "198.51.100.1")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(app: &Router, req: Request<Body>) -> Response {
        app.clone().oneshot(req).await.unwrap()
    }

    async fn body_json(resp: Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn create_contribution_json(app: &Router, amount: f64) -> Value {
        let resp = send(
            app,
            json_request(
                "POST",
                "/api/contributions",
                json!({
                    "campaign_id": "c1",
                    "amount": amount,
                    "currency": "eth",
                    "wallet_address": WALLET
                }),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        body_json(resp).await["contribution"].clone()
    }

    fn kyc_body(contribution_id: &str) -> Value {
        json!({
            "contribution_id": contribution_id,
            "full_name": "A",
            "email": "a@example.com",
            "address": "1 St",
            "city": "X",
            "state": "Y",
            "zip_code": "00000",
            "country": "US"
        })
    }

    async fn contribution_status(app: &Router, id: &str) -> String {
        let resp = send(app, get_request(&format!("/api/contributions/{id}"))).await;
        assert_eq!(resp.status(), StatusCode::OK);
        body_json(resp).await["contribution"]["status"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = app().await;
        let resp = send(&app, get_request("/health")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["status"], "ok");
    }

    #[tokio::test]
    async fn create_contribution_example() {
        let app = app().await;
        let resp = send(
            &app,
            json_request(
                "POST",
                "/api/contributions",
                json!({
                    "campaign_id": "c1",
                    "amount": 50,
                    "currency": "eth",
                    "wallet_address": WALLET
                }),
            ),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["contribution"]["currency"], "ETH");
        assert_eq!(
            body["contribution"]["wallet_address"],
            WALLET.to_lowercase()
        );
        assert_eq!(body["contribution"]["status"], "pending");
        assert_eq!(body["contribution"]["amount"], 50.0);
    }

    #[tokio::test]
    async fn validation_details_name_exactly_the_bad_fields() {
        let app = app().await;
        let resp = send(
            &app,
            json_request(
                "POST",
                "/api/contributions",
                json!({ "campaign_id": "c1", "amount": 0, "wallet_address": WALLET }),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await,
            json!({
                "error": "Validation failed",
                "details": {
                    "amount": "Valid amount is required",
                    "currency": "Currency is required"
                }
            })
        );
    }

    #[tokio::test]
    async fn format_errors_have_exact_bodies() {
        let app = app().await;
        let resp = send(
            &app,
            json_request(
                "POST",
                "/api/contributions",
                json!({
                    "campaign_id": "c1",
                    "amount": 5,
                    "currency": "eth",
                    "wallet_address": "0xnot-a-wallet"
                }),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await,
            json!({ "error": "Invalid wallet address format" })
        );

        let resp = send(
            &app,
            json_request(
                "POST",
                "/api/contributions",
                json!({
                    "campaign_id": "c1",
                    "amount": 5,
                    "currency": "eth",
                    "wallet_address": WALLET,
                    "transaction_hash": "0xdeadbeef"
                }),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await,
            json!({ "error": "Invalid transaction hash format" })
        );
    }

    #[tokio::test]
    async fn unknown_campaign_is_404() {
        let app = app().await;
        let resp = send(
            &app,
            json_request(
                "POST",
                "/api/contributions",
                json!({
                    "campaign_id": "nope",
                    "amount": 5,
                    "currency": "eth",
                    "wallet_address": WALLET
                }),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await, json!({ "error": "Campaign not found" }));
    }

    #[tokio::test]
    async fn eleventh_attempt_is_rate_limited() {
        let app = app().await;
        for _ in 0..10 {
            let resp = send(&app, json_request("POST", "/api/contributions", json!({}))).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }
        let resp = send(&app, json_request("POST", "/api/contributions", json!({}))).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        let body = body_json(resp).await;
        assert_eq!(body["retryAfter"], "5 minutes");
        assert!(body["error"].is_string());

        // Listing is not rate-limited.
        let resp = send(&app, get_request("/api/contributions")).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn first_attempt_after_window_is_allowed() {
        let app = app_with(RateLimiter::new(2, Duration::from_millis(200)), None).await;
        for _ in 0..2 {
            let resp = send(&app, json_request("POST", "/api/contributions", json!({}))).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }
        let resp = send(&app, json_request("POST", "/api/contributions", json!({}))).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

        tokio::time::sleep(Duration::from_millis(250)).await;
        let resp = send(&app, json_request("POST", "/api/contributions", json!({}))).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn list_returns_pagination() {
        let app = app().await;
        for amount in [1.0, 2.0, 3.0] {
            create_contribution_json(&app, amount).await;
        }
        let resp = send(
            &app,
            get_request("/api/contributions?campaign_id=c1&page=2&limit=2"),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["contributions"].as_array().unwrap().len(), 1);
        assert_eq!(body["contributions"][0]["amount"], 1.0);
        assert_eq!(
            body["pagination"],
            json!({ "page": 2, "limit": 2, "total": 3, "totalPages": 2 })
        );
    }

    #[tokio::test]
    async fn kyc_lifecycle_over_http() {
        let app = app().await;
        let contribution = create_contribution_json(&app, 20.0).await;
        let id = contribution["id"].as_str().unwrap();

        let resp = send(&app, json_request("POST", "/api/kyc", kyc_body(id))).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let record = body_json(resp).await["kyc_record"].clone();
        assert_eq!(record["verification_status"], "pending");
        assert_eq!(contribution_status(&app, id).await, "kyc_submitted");

        let resp = send(&app, get_request(&format!("/api/kyc?contribution_id={id}"))).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["kyc_record"]["id"], record["id"]);

        let resp = send(
            &app,
            json_request(
                "PUT",
                "/api/kyc",
                json!({ "kyc_id": record["id"], "verification_status": "verified" }),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_json(resp).await["kyc_record"]["verification_status"],
            "verified"
        );
        assert_eq!(contribution_status(&app, id).await, "completed");
    }

    #[tokio::test]
    async fn rejection_keeps_contribution_at_kyc_submitted() {
        let app = app().await;
        let contribution = create_contribution_json(&app, 20.0).await;
        let id = contribution["id"].as_str().unwrap();

        let resp = send(&app, json_request("POST", "/api/kyc", kyc_body(id))).await;
        let record = body_json(resp).await["kyc_record"].clone();

        let resp = send(
            &app,
            json_request(
                "PUT",
                "/api/kyc",
                json!({
                    "kyc_id": record["id"],
                    "verification_status": "rejected",
                    "notes": "blurry id"
                }),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(contribution_status(&app, id).await, "kyc_submitted");
    }

    #[tokio::test]
    async fn kyc_disclosure_boundary_over_http() {
        let app = app().await;
        let over = create_contribution_json(&app, 201.0).await;
        let resp = send(
            &app,
            json_request("POST", "/api/kyc", kyc_body(over["id"].as_str().unwrap())),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let details = body_json(resp).await["details"].clone();
        assert_eq!(
            details,
            json!({
                "occupation": "Occupation is required for contributions over $200",
                "employer": "Employer is required for contributions over $200"
            })
        );

        let at = create_contribution_json(&app, 200.0).await;
        let resp = send(
            &app,
            json_request("POST", "/api/kyc", kyc_body(at["id"].as_str().unwrap())),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn kyc_invalid_email_example() {
        let app = app().await;
        let contribution = create_contribution_json(&app, 20.0).await;
        let mut body = kyc_body(contribution["id"].as_str().unwrap());
        body["email"] = json!("bad-email");

        let resp = send(&app, json_request("POST", "/api/kyc", body)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await, json!({ "error": "Invalid email format" }));
    }

    #[tokio::test]
    async fn kyc_lookup_errors() {
        let app = app().await;
        let resp = send(&app, get_request("/api/kyc")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await,
            json!({ "error": "Contribution ID is required" })
        );

        let resp = send(&app, get_request("/api/kyc?contribution_id=missing")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await, json!({ "error": "KYC record not found" }));
    }

    #[tokio::test]
    async fn review_input_errors() {
        let app = app().await;
        let resp = send(
            &app,
            json_request("PUT", "/api/kyc", json!({ "kyc_id": "x" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await,
            json!({ "error": "KYC ID and verification status are required" })
        );

        let resp = send(
            &app,
            json_request(
                "PUT",
                "/api/kyc",
                json!({ "kyc_id": "x", "verification_status": "approved" }),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await,
            json!({ "error": "Invalid verification status" })
        );
    }

    #[tokio::test]
    async fn review_requires_configured_key() {
        let app = app_with_key(Some("s3cret")).await;
        let body = json!({ "kyc_id": "x", "verification_status": "verified" });

        let resp = send(&app, json_request("PUT", "/api/kyc", body.clone())).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let mut req = json_request("PUT", "/api/kyc", body);
        req.headers_mut().insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer s3cret"),
        );
        // Authorized, but the record does not exist.
        let resp = send(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"], "Failed to update KYC record");
    }

    #[tokio::test]
    async fn options_and_unsupported_methods() {
        let app = app().await;
        let resp = send(
            &app,
            Request::builder()
                .method("OPTIONS")
                .uri("/api/kyc")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            HeaderValue::from_static("*")
        );
        assert!(resp
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));

        let resp = send(
            &app,
            Request::builder()
                .method("DELETE")
                .uri("/api/contributions")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            body_json(resp).await,
            json!({ "error": "Method DELETE not allowed" })
        );
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        let app = app().await;
        let req = Request::builder()
            .method("POST")
            .uri("/api/kyc")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let resp = send(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"], "Invalid request body");
    }

    #[tokio::test]
    async fn wallet_history_over_http() {
        let app = app().await;
        create_contribution_json(&app, 4.0).await;
        create_contribution_json(&app, 6.0).await;

        let bare = &WALLET[2..];
        let resp = send(
            &app,
            get_request(&format!("/api/contributions/wallet/{bare}?limit=1")),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["contributions"][0]["amount"], 6.0);
        assert_eq!(
            body["pagination"],
            json!({ "page": 1, "limit": 1, "total": 2, "totalPages": 2 })
        );

        let resp = send(&app, get_request("/api/contributions/wallet/0x42")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await,
            json!({ "error": "Invalid wallet address format" })
        );
    }

    #[tokio::test]
    async fn status_by_transaction_hash_over_http() {
        let app = app().await;
        let hash = format!("0x{}", "c4".repeat(32));
        let resp = send(
            &app,
            json_request(
                "POST",
                "/api/contributions",
                json!({
                    "campaign_id": "c1",
                    "amount": 12,
                    "currency": "eth",
                    "wallet_address": WALLET,
                    "transaction_hash": hash
                }),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = send(&app, get_request(&format!("/api/contributions/status/{hash}"))).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["status"], "pending");
        assert_eq!(body["contribution"]["transaction_hash"], hash.as_str());

        let unknown = format!("0x{}", "0".repeat(64));
        let resp = send(&app, get_request(&format!("/api/contributions/status/{unknown}"))).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await, json!({ "error": "Transaction not found" }));

        let resp = send(&app, get_request("/api/contributions/status/0xabc")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn pending_queue_requires_reviewer() {
        let app = app_with_key(Some("s3cret")).await;
        let contribution = create_contribution_json(&app, 20.0).await;
        let resp = send(
            &app,
            json_request(
                "POST",
                "/api/kyc",
                kyc_body(contribution["id"].as_str().unwrap()),
            ),
        )
        .await;
        let record = body_json(resp).await["kyc_record"].clone();

        let resp = send(&app, get_request("/api/kyc/pending")).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let mut req = get_request("/api/kyc/pending?limit=10");
        req.headers_mut()
            .insert("x-api-key", HeaderValue::from_static("s3cret"));
        let resp = send(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["limit"], 10);
        assert_eq!(body["offset"], 0);
        assert_eq!(body["pending"][0]["id"], record["id"]);
    }
}
