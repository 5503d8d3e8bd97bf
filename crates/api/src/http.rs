use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::{Method, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use spyglass_core::ids::{TraceId, UserId};
use spyglass_core::model::trace::TracePayload;
use spyglass_core::query::{
    HealthResponse, IngestResponse, IssueSessionRequest, SessionResponse, TraceListResponse,
    TraceSpansResponse, TracesRequest,
};
use spyglass_core::time::session_expiry;
use spyglass_core::waterfall::{self, BarOrder, Waterfall};
use spyglass_store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Level;

use crate::error::ApiError;
use crate::repository::TraceRepository;
use crate::session::{AdminCaller, CurrentUser, SessionAdmin, SessionResolver};

#[derive(Clone)]
pub struct AppState {
    pub traces: Arc<dyn TraceRepository>,
    pub sessions: Arc<dyn SessionResolver>,
    pub session_cookie: String,
    pub admin: Option<SessionAdmin>,
}

impl AppState {
    pub fn from_store(store: Store, session_cookie: impl Into<String>) -> Self {
        let store = Arc::new(store);
        Self {
            traces: store.clone(),
            sessions: store,
            session_cookie: session_cookie.into(),
            admin: None,
        }
    }

    pub fn with_session_admin(mut self, admin: SessionAdmin) -> Self {
        self.admin = Some(admin);
        self
    }
}

#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub max_body_bytes: usize,
    pub cors_allow_any: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024,
            cors_allow_any: false,
        }
    }
}

pub fn router(state: AppState, cfg: &RouterConfig) -> Router {
    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/traces", post(ingest_trace).get(list_traces))
        .route("/api/traces/{trace_id}", get(fetch_trace))
        .route("/api/traces/{trace_id}/waterfall", get(trace_waterfall))
        .route("/api/sessions", post(issue_session))
        .route("/api/sessions/{token}", delete(revoke_session))
        .layer(DefaultBodyLimit::max(cfg.max_body_bytes));

    let app = if cfg.cors_allow_any {
        app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
                .allow_headers(Any),
        )
    } else {
        app
    };

    app.layer(
        TraceLayer::new_for_http()
            .on_request(tower_http::trace::DefaultOnRequest::new().level(Level::INFO))
            .on_response(tower_http::trace::DefaultOnResponse::new().level(Level::INFO)),
    )
    .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn ingest_trace(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Bytes,
) -> Result<Json<IngestResponse>, ApiError> {
    let payload: TracePayload = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(error = %e, "trace payload decode failed");
        ApiError::BadRequest(format!("invalid trace payload: {e}"))
    })?;
    let trace_id = payload.validate()?;

    state.traces.create_trace(&user, &trace_id, &payload.spans)?;
    tracing::info!(
        user = %user,
        trace_id = %trace_id,
        spans = payload.spans.len(),
        "trace ingested"
    );
    Ok(Json(IngestResponse { success: true }))
}

async fn fetch_trace(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(trace_id): Path<String>,
) -> Result<Json<TraceSpansResponse>, ApiError> {
    // An id that could never have been stored is simply not found.
    let trace_id = TraceId::parse(&trace_id).map_err(|_| ApiError::NotFound)?;
    let spans = state
        .traces
        .fetch_spans(&user, &trace_id)?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(TraceSpansResponse { spans }))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    limit: Option<usize>,
}

async fn list_traces(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<ListParams>,
) -> Result<Json<TraceListResponse>, ApiError> {
    let req = TracesRequest::clamped(params.limit);
    let traces = state.traces.list_summaries(&user, &req)?;
    Ok(Json(TraceListResponse { traces }))
}

#[derive(Debug, Deserialize)]
struct WaterfallParams {
    order: Option<String>,
}

async fn trace_waterfall(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(trace_id): Path<String>,
    Query(params): Query<WaterfallParams>,
) -> Result<Json<Waterfall>, ApiError> {
    let order = params
        .order
        .as_deref()
        .map(str::parse::<BarOrder>)
        .transpose()?
        .unwrap_or_default();
    let trace_id = TraceId::parse(&trace_id).map_err(|_| ApiError::NotFound)?;
    let spans = state
        .traces
        .fetch_spans(&user, &trace_id)?
        .ok_or(ApiError::NotFound)?;
    let layout = waterfall::layout(&spans, order)
        .map_err(|e| ApiError::Internal(format!("stored trace {trace_id} failed layout: {e}")))?;
    Ok(Json(layout))
}

async fn issue_session(
    AdminCaller(admin): AdminCaller,
    body: Bytes,
) -> Result<Json<SessionResponse>, ApiError> {
    let req: IssueSessionRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid session request: {e}")))?;
    let user = UserId::parse(&req.user_id)?;
    let now = Utc::now();
    let expires_at = session_expiry(now, req.ttl.as_deref(), req.no_expiry, admin.default_ttl)?;

    let issued = admin.sessions.issue(&user, now, expires_at)?;
    tracing::info!(user = %user, "session issued over http");
    Ok(Json(issued.into()))
}

async fn revoke_session(
    AdminCaller(admin): AdminCaller,
    Path(token): Path<String>,
) -> Result<StatusCode, ApiError> {
    if admin.sessions.revoke(&token)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::body::Body;
    use std::time::Duration;

    use axum::http::{Request, header};
    use axum::response::Response;
    use spyglass_core::error::{Result, SpyglassError};
    use spyglass_core::model::span::Span;
    use spyglass_core::model::trace::TraceSummary;
    use tower::util::ServiceExt;

    use super::*;

    struct Harness {
        store: Store,
        app: Router,
        alice: String,
        bob: String,
    }

    fn harness() -> Harness {
        let store = Store::open_in_memory().unwrap();
        let alice = store
            .create_session(&UserId::parse("alice").unwrap(), Utc::now(), None)
            .unwrap()
            .token;
        let bob = store
            .create_session(&UserId::parse("bob").unwrap(), Utc::now(), None)
            .unwrap()
            .token;
        let app = router(
            AppState::from_store(store.clone(), "spyglass.session-token"),
            &RouterConfig::default(),
        );
        Harness {
            store,
            app,
            alice,
            bob,
        }
    }

    fn post_trace(token: Option<&str>, body: String) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/traces")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body)).unwrap()
    }

    fn get(uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    }

    async fn body_text(resp: Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        serde_json::from_str(&body_text(resp).await).unwrap()
    }

    #[tokio::test]
    async fn health_needs_no_session() {
        let h = harness();
        let resp = h
            .app
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["status"], "ok");
    }

    #[tokio::test]
    async fn ingest_then_fetch_returns_same_spans() {
        let h = harness();
        let spans = testkit::nested_spans();

        let resp = h
            .app
            .clone()
            .oneshot(post_trace(
                Some(&h.alice),
                testkit::ingest_body("checkout-1", &spans, None),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, serde_json::json!({"success": true}));

        let resp = h
            .app
            .oneshot(get("/api/traces/checkout-1", &h.alice))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let fetched: TraceSpansResponse = serde_json::from_value(body_json(resp).await).unwrap();
        assert_eq!(fetched.spans, spans);
    }

    #[tokio::test]
    async fn ingest_without_session_is_unauthorized_and_writes_nothing() {
        let h = harness();
        let body = testkit::ingest_body("t1", &testkit::flat_spans(), None);

        let resp = h.app.clone().oneshot(post_trace(None, body.clone())).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_text(resp).await, "Unauthorized");

        let resp = h
            .app
            .oneshot(post_trace(Some("forged-token"), body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        assert_eq!(h.store.status().unwrap().traces_count, 0);
    }

    #[tokio::test]
    async fn unauthorized_wins_over_malformed_body() {
        let h = harness();
        let resp = h
            .app
            .oneshot(post_trace(None, "{not json".to_string()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn session_cookie_authenticates() {
        let h = harness();
        let req = Request::builder()
            .method("POST")
            .uri("/api/traces")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::COOKIE, format!("spyglass.session-token={}", h.alice))
            .body(Body::from(testkit::ingest_body("t1", &testkit::flat_spans(), None)))
            .unwrap();
        let resp = h.app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn client_supplied_user_id_is_ignored() {
        let h = harness();
        let body = testkit::ingest_body("spoof", &testkit::flat_spans(), Some("bob"));
        let resp = h
            .app
            .clone()
            .oneshot(post_trace(Some(&h.alice), body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let alice = UserId::parse("alice").unwrap();
        let bob = UserId::parse("bob").unwrap();
        let trace = TraceId::parse("spoof").unwrap();
        assert!(h.store.get_trace(&alice, &trace).unwrap().is_some());
        assert!(h.store.get_trace(&bob, &trace).unwrap().is_none());

        let resp = h.app.oneshot(get("/api/traces/spoof", &h.bob)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cross_tenant_fetch_is_not_found() {
        let h = harness();
        h.app
            .clone()
            .oneshot(post_trace(
                Some(&h.alice),
                testkit::ingest_body("private", &testkit::flat_spans(), None),
            ))
            .await
            .unwrap();

        let resp = h
            .app
            .clone()
            .oneshot(get("/api/traces/private", &h.bob))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let text = body_text(resp).await;
        assert_eq!(text, "Not Found");

        let resp = h
            .app
            .oneshot(get("/api/traces/private/waterfall", &h.bob))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn fetch_requires_session() {
        let h = harness();
        let resp = h
            .app
            .oneshot(
                Request::builder()
                    .uri("/api/traces/anything")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn duplicate_ingest_is_conflict() {
        let h = harness();
        let body = testkit::ingest_body("dup", &testkit::flat_spans(), None);
        let first = h
            .app
            .clone()
            .oneshot(post_trace(Some(&h.alice), body.clone()))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = h
            .app
            .clone()
            .oneshot(post_trace(Some(&h.alice), body.clone()))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
        assert_eq!(body_text(second).await, "Conflict");

        let other_user = h.app.oneshot(post_trace(Some(&h.bob), body)).await.unwrap();
        assert_eq!(other_user.status(), StatusCode::OK);
        assert_eq!(h.store.status().unwrap().traces_count, 2);
    }

    #[tokio::test]
    async fn invalid_payloads_are_bad_requests() {
        let h = harness();
        let cases = [
            "{not json".to_string(),
            r#"{"spans":[]}"#.to_string(),
            testkit::ingest_body("", &[], None),
            testkit::ingest_body(" padded", &testkit::flat_spans(), None),
            testkit::ingest_body("inverted", &[Span::new("late", 10.0, 5.0)], None),
            testkit::ingest_body(
                "too-wide",
                &[Span::new("a", -1e308, -1e308), Span::new("b", 1e308, 1e308)],
                None,
            ),
            testkit::ingest_body(
                "orphan",
                &[Span::new("child", 0.0, 1.0).with_ids("b", Some("missing"))],
                None,
            ),
        ];
        for body in cases {
            let resp = h
                .app
                .clone()
                .oneshot(post_trace(Some(&h.alice), body.clone()))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body: {body}");
        }
        assert_eq!(h.store.status().unwrap().traces_count, 0);
    }

    #[tokio::test]
    async fn empty_trace_is_accepted_and_renders_nothing() {
        let h = harness();
        let resp = h
            .app
            .clone()
            .oneshot(post_trace(Some(&h.alice), testkit::ingest_body("empty", &[], None)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = h
            .app
            .oneshot(get("/api/traces/empty/waterfall", &h.alice))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let layout: Waterfall = serde_json::from_value(body_json(resp).await).unwrap();
        assert!(layout.bars.is_empty());
        assert!(layout.window.is_none());
    }

    #[tokio::test]
    async fn waterfall_endpoint_lays_out_spans() {
        let h = harness();
        h.app
            .clone()
            .oneshot(post_trace(
                Some(&h.alice),
                testkit::ingest_body("w", &testkit::flat_spans(), None),
            ))
            .await
            .unwrap();

        let resp = h
            .app
            .clone()
            .oneshot(get("/api/traces/w/waterfall?order=start", &h.alice))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let layout: Waterfall = serde_json::from_value(body_json(resp).await).unwrap();
        assert_eq!(layout.total_duration(), 150.0);
        assert_eq!(layout.bars.len(), 2);
        assert!((layout.bars[1].offset_percent - 100.0 / 3.0).abs() < 1e-9);

        let resp = h
            .app
            .oneshot(get("/api/traces/w/waterfall?order=sideways", &h.alice))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn lists_only_callers_traces() {
        let h = harness();
        for (token, id) in [(&h.alice, "a1"), (&h.alice, "a2"), (&h.bob, "b1")] {
            let resp = h
                .app
                .clone()
                .oneshot(post_trace(
                    Some(token),
                    testkit::ingest_body(id, &testkit::flat_spans(), None),
                ))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let resp = h
            .app
            .oneshot(get("/api/traces?limit=10", &h.alice))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let list: TraceListResponse = serde_json::from_value(body_json(resp).await).unwrap();
        let mut ids: Vec<_> = list.traces.iter().map(|t| t.trace_id.clone()).collect();
        ids.sort();
        assert_eq!(ids, vec!["a1", "a2"]);
    }

    struct FailingRepo;

    impl TraceRepository for FailingRepo {
        fn create_trace(&self, _: &UserId, _: &TraceId, _: &[Span]) -> Result<()> {
            Err(SpyglassError::Store("IO Error: could not write /srv/db.duckdb".into()))
        }

        fn fetch_spans(&self, _: &UserId, _: &TraceId) -> Result<Option<Vec<Span>>> {
            Err(SpyglassError::Store("IO Error: could not read /srv/db.duckdb".into()))
        }

        fn list_summaries(&self, _: &UserId, _: &TracesRequest) -> Result<Vec<TraceSummary>> {
            Err(SpyglassError::Store("IO Error".into()))
        }
    }

    #[derive(Default)]
    struct CountingRepo {
        writes: AtomicUsize,
    }

    impl TraceRepository for CountingRepo {
        fn create_trace(&self, _: &UserId, _: &TraceId, _: &[Span]) -> Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn fetch_spans(&self, _: &UserId, _: &TraceId) -> Result<Option<Vec<Span>>> {
            Ok(None)
        }

        fn list_summaries(&self, _: &UserId, _: &TracesRequest) -> Result<Vec<TraceSummary>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn persistence_failure_is_generic_500() {
        let store = Store::open_in_memory().unwrap();
        let token = store
            .create_session(&UserId::parse("alice").unwrap(), Utc::now(), None)
            .unwrap()
            .token;
        let state = AppState {
            traces: Arc::new(FailingRepo),
            sessions: Arc::new(store),
            session_cookie: "spyglass.session-token".to_string(),
            admin: None,
        };
        let app = router(state, &RouterConfig::default());

        let resp = app
            .clone()
            .oneshot(post_trace(
                Some(&token),
                testkit::ingest_body("t1", &testkit::flat_spans(), None),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let text = body_text(resp).await;
        assert_eq!(text, "Internal Server Error");
        assert!(!text.contains("duckdb"));

        let resp = app.oneshot(get("/api/traces/t1", &token)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn rejected_requests_never_reach_repository() {
        let store = Store::open_in_memory().unwrap();
        let token = store
            .create_session(&UserId::parse("alice").unwrap(), Utc::now(), None)
            .unwrap()
            .token;
        let repo = Arc::new(CountingRepo::default());
        let state = AppState {
            traces: repo.clone(),
            sessions: Arc::new(store),
            session_cookie: "spyglass.session-token".to_string(),
            admin: None,
        };
        let app = router(state, &RouterConfig::default());
        let body = testkit::ingest_body("t1", &testkit::flat_spans(), None);

        app.clone().oneshot(post_trace(None, body.clone())).await.unwrap();
        app.clone()
            .oneshot(post_trace(Some("expired-or-forged"), body.clone()))
            .await
            .unwrap();
        assert_eq!(repo.writes.load(Ordering::SeqCst), 0);

        app.oneshot(post_trace(Some(&token), body)).await.unwrap();
        assert_eq!(repo.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let store = Store::open_in_memory().unwrap();
        let token = store
            .create_session(&UserId::parse("alice").unwrap(), Utc::now(), None)
            .unwrap()
            .token;
        let app = router(
            AppState::from_store(store.clone(), "spyglass.session-token"),
            &RouterConfig {
                max_body_bytes: 64,
                cors_allow_any: false,
            },
        );
        let resp = app
            .oneshot(post_trace(
                Some(&token),
                testkit::ingest_body("big", &testkit::nested_spans(), None),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(store.status().unwrap().traces_count, 0);
    }

    const ADMIN_TOKEN: &str = "admin-s3cret";

    fn admin_app(store: &Store) -> Router {
        let state = AppState::from_store(store.clone(), "spyglass.session-token")
            .with_session_admin(SessionAdmin {
                token: ADMIN_TOKEN.to_string(),
                default_ttl: Duration::from_secs(3600),
                sessions: Arc::new(store.clone()),
            });
        router(state, &RouterConfig::default())
    }

    fn post_session(token: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri("/api/sessions");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn admin_issues_session_usable_for_ingest() {
        let store = Store::open_in_memory().unwrap();
        let app = admin_app(&store);

        let resp = app
            .clone()
            .oneshot(post_session(Some(ADMIN_TOKEN), r#"{"userId":"dora","ttl":"2h"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let issued: SessionResponse = serde_json::from_value(body_json(resp).await).unwrap();
        assert_eq!(issued.user_id, "dora");
        assert!(issued.expires_at.is_some());

        let resp = app
            .oneshot(post_trace(
                Some(&issued.token),
                testkit::ingest_body("t1", &testkit::flat_spans(), None),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let dora = UserId::parse("dora").unwrap();
        let trace = TraceId::parse("t1").unwrap();
        assert!(store.get_trace(&dora, &trace).unwrap().is_some());
    }

    #[tokio::test]
    async fn admin_endpoints_require_admin_token() {
        let h = harness();
        let app = admin_app(&h.store);
        let body = r#"{"userId":"mallory","noExpiry":true}"#;

        for token in [None, Some("wrong"), Some(h.alice.as_str())] {
            let resp = app.clone().oneshot(post_session(token, body)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        }
        assert_eq!(h.store.status().unwrap().sessions_count, 2);
    }

    #[tokio::test]
    async fn admin_endpoints_absent_without_admin_token() {
        let h = harness();
        let resp = h
            .app
            .oneshot(post_session(Some(ADMIN_TOKEN), r#"{"userId":"x"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn admin_rejects_bad_session_requests() {
        let store = Store::open_in_memory().unwrap();
        let app = admin_app(&store);
        for body in [
            "{",
            r#"{"userId":""}"#,
            r#"{"userId":"u","ttl":"someday"}"#,
            r#"{"userId":"u","ttl":"1h","noExpiry":true}"#,
        ] {
            let resp = app
                .clone()
                .oneshot(post_session(Some(ADMIN_TOKEN), body))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body: {body}");
        }
        assert_eq!(store.status().unwrap().sessions_count, 0);
    }

    #[tokio::test]
    async fn admin_revokes_sessions() {
        let h = harness();
        let app = admin_app(&h.store);
        let revoke = |token: &str| {
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/sessions/{token}"))
                .header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"))
                .body(Body::empty())
                .unwrap()
        };

        let resp = app.clone().oneshot(revoke(&h.alice)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        let resp = app.clone().oneshot(revoke(&h.alice)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = app
            .oneshot(get("/api/traces?limit=1", &h.alice))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
