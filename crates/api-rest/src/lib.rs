//! # API REST
//!
//! REST API implementation for Atestado.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status codes)
//!
//! Every form interaction is a call against an in-memory session; responses carry the
//! full [`SessionView`] so a client can redraw the form after each keystroke.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, Json},
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use atestado_core::{
    constants::PRINT_FAILURE_ALERT, lookup::SuggestionState, notice::NoticeKind,
    session::RequestView, AtestadoError, AtestadoResult, CharCounter, CidSuggestion, CoreConfig,
    FormData, FormField, HttpCidSearch, Notice, RequestCounters, RequestDetails, RequestField,
    SessionStore, SessionView,
};

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    store: SessionStore<HttpCidSearch>,
}

impl AppState {
    /// Builds the state from resolved configuration.
    ///
    /// # Errors
    /// Returns an error if the CID search HTTP client cannot be constructed.
    pub fn new(cfg: Arc<CoreConfig>) -> AtestadoResult<Self> {
        let searcher = HttpCidSearch::from_config(&cfg)?;
        Ok(Self {
            store: SessionStore::new(searcher, cfg),
        })
    }

    /// Starts the background task that drops abandoned sessions.
    pub fn spawn_idle_sweeper(&self) -> JoinHandle<()> {
        self.store.spawn_idle_sweeper()
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// New value for a text field.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ValueReq {
    pub value: String,
}

/// Index of the suggestion to pick.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SelectReq {
    pub index: usize,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        create_session,
        get_session,
        delete_session,
        update_field,
        edit_text,
        clear_form,
        suggestions,
        select_suggestion,
        close_suggestions,
        focus_cid,
        add_request,
        duplicate_request,
        remove_request,
        update_request,
        print,
    ),
    components(schemas(
        HealthRes,
        ValueReq,
        SelectReq,
        SessionView,
        FormData,
        RequestView,
        RequestDetails,
        RequestCounters,
        CharCounter,
        SuggestionState,
        CidSuggestion,
        Notice,
        NoticeKind,
    ))
)]
struct ApiDoc;

type ApiResult<T> = Result<T, (StatusCode, String)>;

/// Builds the REST router with OpenAPI docs at `/swagger-ui`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sessions", post(create_session))
        .route("/sessions/:id", get(get_session).delete(delete_session))
        .route("/sessions/:id/fields/:field", put(update_field))
        .route("/sessions/:id/text", put(edit_text))
        .route("/sessions/:id/clear", post(clear_form))
        .route("/sessions/:id/cid/suggestions", get(suggestions))
        .route("/sessions/:id/cid/select", post(select_suggestion))
        .route("/sessions/:id/cid/close", post(close_suggestions))
        .route("/sessions/:id/cid/focus", post(focus_cid))
        .route("/sessions/:id/requests", post(add_request))
        .route(
            "/sessions/:id/requests/:index",
            axum::routing::delete(remove_request),
        )
        .route(
            "/sessions/:id/requests/:index/duplicate",
            post(duplicate_request),
        )
        .route(
            "/sessions/:id/requests/:index/fields/:field",
            put(update_request),
        )
        .route("/sessions/:id/print", get(print))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Maps a core error onto an HTTP status and a message safe to show the user.
fn api_error(e: AtestadoError) -> (StatusCode, String) {
    match e {
        AtestadoError::SessionNotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
        AtestadoError::InvalidInput(_)
        | AtestadoError::UnknownField(_)
        | AtestadoError::RequestIndexOutOfRange { .. }
        | AtestadoError::SuggestionIndexOutOfRange { .. }
        | AtestadoError::LineBreakNotAllowed(_) => (StatusCode::BAD_REQUEST, e.to_string()),
        AtestadoError::InvalidStartDate(_) => (StatusCode::CONFLICT, e.to_string()),
        AtestadoError::MissingPrintElement(_) => {
            tracing::error!("Print error: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                PRINT_FAILURE_ALERT.to_string(),
            )
        }
        AtestadoError::CidSearch(_) | AtestadoError::MalformedCidPayload => {
            tracing::error!("CID search error: {:?}", e);
            (StatusCode::BAD_GATEWAY, "CID search unavailable".to_string())
        }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Atestado REST API is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/sessions",
    responses(
        (status = 201, description = "Blank form session opened", body = SessionView)
    )
)]
/// Open a blank certificate form dated today.
#[axum::debug_handler]
async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionView>) {
    (StatusCode::CREATED, Json(state.store.create().await))
}

#[utoipa::path(
    get,
    path = "/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Current form state", body = SessionView),
        (status = 404, description = "Session not found")
    )
)]
#[axum::debug_handler]
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionView>> {
    state.store.view(id).await.map(Json).map_err(api_error)
}

#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 204, description = "Session closed"),
        (status = 404, description = "Session not found")
    )
)]
/// Close a session, discarding its form and cancelling any pending CID search.
#[axum::debug_handler]
async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .store
        .remove(id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(api_error)
}

#[utoipa::path(
    put,
    path = "/sessions/{id}/fields/{field}",
    params(
        ("id" = Uuid, Path, description = "Session id"),
        ("field" = String, Path, description = "patientName, patientId, cid, daysOffNumeric, startDate or attestationDate")
    ),
    request_body = ValueReq,
    responses(
        (status = 200, description = "Field updated", body = SessionView),
        (status = 400, description = "Unknown field"),
        (status = 404, description = "Session not found")
    )
)]
/// Update one form field
///
/// Date fields are masked to DD/MM/YYYY. The certificate text is recomputed and the start
/// date revalidated. Editing `cid` schedules a debounced suggestion search.
#[axum::debug_handler]
async fn update_field(
    State(state): State<AppState>,
    Path((id, field)): Path<(Uuid, String)>,
    Json(req): Json<ValueReq>,
) -> ApiResult<Json<SessionView>> {
    let field: FormField = field.parse().map_err(api_error)?;
    state
        .store
        .with_session_mut(id, |session| {
            session.update_field(field, &req.value);
            Ok(session.view(id))
        })
        .await
        .map(Json)
        .map_err(api_error)
}

#[utoipa::path(
    put,
    path = "/sessions/{id}/text",
    params(("id" = Uuid, Path, description = "Session id")),
    request_body = ValueReq,
    responses(
        (status = 200, description = "Certificate text replaced", body = SessionView),
        (status = 404, description = "Session not found")
    )
)]
/// Replace the certificate text with a hand edit. Line breaks become spaces.
#[axum::debug_handler]
async fn edit_text(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ValueReq>,
) -> ApiResult<Json<SessionView>> {
    state
        .store
        .with_session_mut(id, |session| {
            session.edit_generated_text(&req.value);
            Ok(session.view(id))
        })
        .await
        .map(Json)
        .map_err(api_error)
}

#[utoipa::path(
    post,
    path = "/sessions/{id}/clear",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Form cleared", body = SessionView),
        (status = 404, description = "Session not found")
    )
)]
#[axum::debug_handler]
async fn clear_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionView>> {
    state
        .store
        .with_session_mut(id, |session| {
            session.clear();
            Ok(session.view(id))
        })
        .await
        .map(Json)
        .map_err(api_error)
}

#[utoipa::path(
    get,
    path = "/sessions/{id}/cid/suggestions",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Current CID suggestions", body = SuggestionState),
        (status = 404, description = "Session not found")
    )
)]
#[axum::debug_handler]
async fn suggestions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SuggestionState>> {
    state
        .store
        .with_session(id, |session| Ok(session.suggestions()))
        .await
        .map(Json)
        .map_err(api_error)
}

#[utoipa::path(
    post,
    path = "/sessions/{id}/cid/select",
    params(("id" = Uuid, Path, description = "Session id")),
    request_body = SelectReq,
    responses(
        (status = 200, description = "Suggestion written into the CID field", body = SessionView),
        (status = 400, description = "No such suggestion"),
        (status = 404, description = "Session not found")
    )
)]
#[axum::debug_handler]
async fn select_suggestion(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SelectReq>,
) -> ApiResult<Json<SessionView>> {
    state
        .store
        .with_session_mut(id, |session| {
            session.select_suggestion(req.index)?;
            Ok(session.view(id))
        })
        .await
        .map(Json)
        .map_err(api_error)
}

#[utoipa::path(
    post,
    path = "/sessions/{id}/cid/close",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Suggestion list closed", body = SuggestionState),
        (status = 404, description = "Session not found")
    )
)]
/// Pointer pressed outside the CID field: close the suggestion list.
#[axum::debug_handler]
async fn close_suggestions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SuggestionState>> {
    state
        .store
        .with_session(id, |session| {
            session.pointer_down(false);
            Ok(session.suggestions())
        })
        .await
        .map(Json)
        .map_err(api_error)
}

#[utoipa::path(
    post,
    path = "/sessions/{id}/cid/focus",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Suggestion list reopened if non-empty", body = SuggestionState),
        (status = 404, description = "Session not found")
    )
)]
#[axum::debug_handler]
async fn focus_cid(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SuggestionState>> {
    state
        .store
        .with_session(id, |session| {
            session.focus_cid();
            Ok(session.suggestions())
        })
        .await
        .map(Json)
        .map_err(api_error)
}

#[utoipa::path(
    post,
    path = "/sessions/{id}/requests",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Empty referral request appended", body = SessionView),
        (status = 404, description = "Session not found")
    )
)]
#[axum::debug_handler]
async fn add_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionView>> {
    state
        .store
        .with_session_mut(id, |session| {
            session.add_request();
            Ok(session.view(id))
        })
        .await
        .map(Json)
        .map_err(api_error)
}

#[utoipa::path(
    post,
    path = "/sessions/{id}/requests/{index}/duplicate",
    params(
        ("id" = Uuid, Path, description = "Session id"),
        ("index" = usize, Path, description = "Position of the request to copy")
    ),
    responses(
        (status = 200, description = "Copy appended to the end of the list", body = SessionView),
        (status = 400, description = "No request at that position"),
        (status = 404, description = "Session not found")
    )
)]
#[axum::debug_handler]
async fn duplicate_request(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> ApiResult<Json<SessionView>> {
    state
        .store
        .with_session_mut(id, |session| {
            session.duplicate_request(index)?;
            Ok(session.view(id))
        })
        .await
        .map(Json)
        .map_err(api_error)
}

#[utoipa::path(
    delete,
    path = "/sessions/{id}/requests/{index}",
    params(
        ("id" = Uuid, Path, description = "Session id"),
        ("index" = usize, Path, description = "Position of the request to remove")
    ),
    responses(
        (status = 200, description = "Request removed", body = SessionView),
        (status = 400, description = "No request at that position"),
        (status = 404, description = "Session not found")
    )
)]
#[axum::debug_handler]
async fn remove_request(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> ApiResult<Json<SessionView>> {
    state
        .store
        .with_session_mut(id, |session| {
            session.remove_request(index)?;
            Ok(session.view(id))
        })
        .await
        .map(Json)
        .map_err(api_error)
}

#[utoipa::path(
    put,
    path = "/sessions/{id}/requests/{index}/fields/{field}",
    params(
        ("id" = Uuid, Path, description = "Session id"),
        ("index" = usize, Path, description = "Position of the request"),
        ("field" = String, Path, description = "originSector, referralService, clinicalSummary or requestDate")
    ),
    request_body = ValueReq,
    responses(
        (status = 200, description = "Request field updated", body = SessionView),
        (status = 400, description = "Unknown field, bad position or line break in the summary"),
        (status = 404, description = "Session not found")
    )
)]
/// Update one field of a referral request
///
/// Text is cut at the field's cap. A line break in the clinical summary is rejected and
/// leaves an error notice on the session.
#[axum::debug_handler]
async fn update_request(
    State(state): State<AppState>,
    Path((id, index, field)): Path<(Uuid, usize, String)>,
    Json(req): Json<ValueReq>,
) -> ApiResult<Json<SessionView>> {
    let field: RequestField = field.parse().map_err(api_error)?;
    state
        .store
        .with_session_mut(id, |session| {
            session.update_request(index, field, &req.value)?;
            Ok(session.view(id))
        })
        .await
        .map(Json)
        .map_err(api_error)
}

#[utoipa::path(
    get,
    path = "/sessions/{id}/print",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Standalone print document", content_type = "text/html", body = String),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Leave start date is invalid"),
        (status = 500, description = "Print document could not be assembled")
    )
)]
/// Render the certificate as a self-printing HTML document.
#[axum::debug_handler]
async fn print(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Html<String>> {
    state
        .store
        .with_session(id, |session| session.print())
        .await
        .map(Html)
        .map_err(api_error)
}
