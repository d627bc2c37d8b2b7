use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use chrono::{Datelike, NaiveDate};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::agenda::{MonthView, WeekCells};
use crate::auth::{self, Access, Forbidden, Role, Sessions, SESSION_COOKIE};
use crate::calendar;
use crate::config::Config;
use crate::db;
use crate::error::LoungeError;
use crate::html;
use crate::types::{NewAssignment, NewStudent, Student};

/// Application state shared across requests
pub struct AppState {
    pub db: Mutex<Connection>,
    pub config: Config,
    pub sessions: Sessions,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(conn: Connection, config: Config) -> Self {
        Self {
            db: Mutex::new(conn),
            config,
            sessions: Sessions::default(),
        }
    }
}

/// Start the web server
pub async fn serve(port: u16, config: Config) -> anyhow::Result<()> {
    let conn = db::init_db(&config.db_path)?;
    let students = db::list_students(&conn)?.len();
    info!(path = %config.db_path.display(), students = students, "Database ready");

    let state = Arc::new(AppState::new(conn, config));
    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!(%addr, "Server running");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/login", get(login_page).post(login_handler))
        .route("/logout", post(logout_handler))
        .route("/students", post(add_student_handler))
        .route("/students/{id}", get(student_page))
        .route("/students/{id}/delete", post(delete_student_handler))
        .route("/students/{id}/assignments", post(add_assignment_handler))
        .route("/assignments/{id}/toggle", post(toggle_handler))
        .route("/assignments/{id}/delete", post(delete_assignment_handler))
        .route("/events", get(events_page).post(add_event_handler))
        .route("/events/{id}/delete", post(delete_event_handler))
        .route("/api/students/{id}/month", get(month_api_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------- Errors ----------

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Lounge(#[from] LoungeError),

    #[error("login required")]
    Unauthorized,

    #[error("{0} role required")]
    Forbidden(&'static str),
}

impl From<Forbidden> for ApiError {
    fn from(err: Forbidden) -> Self {
        ApiError::Forbidden(err.required.label())
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    ok: bool,
    error: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Lounge(LoungeError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Lounge(LoungeError::InvalidArgument(_)) => StatusCode::BAD_REQUEST,
            ApiError::Lounge(LoungeError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Lounge(LoungeError::Database(e)) => {
                error!(error = %e, "Database error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    /// Message safe to show the caller; store failures stay in the log
    fn public_message(&self) -> String {
        match self {
            ApiError::Lounge(LoungeError::Database(_)) => "Database error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            ok: false,
            error: self.public_message(),
        });

        (self.status(), body).into_response()
    }
}

/// Error from an HTML route, rendered as a page rather than JSON
#[derive(Debug)]
pub struct PageError(ApiError);

impl From<LoungeError> for PageError {
    fn from(err: LoungeError) -> Self {
        PageError(err.into())
    }
}

impl From<Forbidden> for PageError {
    fn from(err: Forbidden) -> Self {
        PageError(err.into())
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = self.0.status();
        let page = html::render_error(
            status.canonical_reason().unwrap_or("Error"),
            &self.0.public_message(),
        );
        (status, Html(page.into_string())).into_response()
    }
}

// ---------- Caller resolution ----------

async fn resolve_access(parts: &Parts, state: &SharedState) -> Option<Access> {
    let cookies = parts.headers.get(header::COOKIE)?.to_str().ok()?;
    let token = auth::session_token(cookies)?;
    state.sessions.resolve(token).await
}

/// Caller of an HTML route; redirects to the login page without a session
pub struct PageAccess(pub Access);

impl FromRequestParts<SharedState> for PageAccess {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        resolve_access(parts, state)
            .await
            .map(PageAccess)
            .ok_or_else(|| Redirect::to("/login"))
    }
}

/// Caller of a JSON route; 401 without a session
pub struct ApiAccess(pub Access);

impl FromRequestParts<SharedState> for ApiAccess {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        resolve_access(parts, state)
            .await
            .map(ApiAccess)
            .ok_or(ApiError::Unauthorized)
    }
}

// ---------- Request payloads ----------

#[derive(Debug, Default, Deserialize)]
struct MonthQuery {
    year: Option<String>,
    month: Option<String>,
    error: Option<String>,
}

/// Resolve the requested month, falling back to today's for anything unparseable
/// or outside the representable calendar
fn resolve_month(query: &MonthQuery, today: NaiveDate) -> (i32, u32) {
    let year = query
        .year
        .as_deref()
        .and_then(|y| y.trim().parse::<i32>().ok())
        .filter(|y| NaiveDate::from_ymd_opt(*y, 1, 1).is_some());
    let month = query
        .month
        .as_deref()
        .and_then(|m| m.trim().parse::<u32>().ok())
        .filter(|m| (1..=12).contains(m));
    (
        year.unwrap_or_else(|| today.year()),
        month.unwrap_or_else(|| today.month()),
    )
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[derive(Debug, Deserialize)]
struct LoginForm {
    code: String,
}

#[derive(Debug, Deserialize)]
struct StudentForm {
    name: String,
    notes: Option<String>,
    strengths: Option<String>,
    weaknesses: Option<String>,
}

fn split_tags(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| s.split(',').map(str::to_string).collect())
        .unwrap_or_default()
}

impl From<StudentForm> for NewStudent {
    fn from(form: StudentForm) -> Self {
        NewStudent {
            strengths: split_tags(form.strengths.as_deref()),
            weaknesses: split_tags(form.weaknesses.as_deref()),
            name: form.name,
            notes: form.notes,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AssignmentForm {
    title: String,
    due_date: String,
    is_test: Option<String>,
    description: Option<String>,
    /// Month the form was submitted from
    year: Option<String>,
    month: Option<String>,
}

impl From<AssignmentForm> for NewAssignment {
    fn from(form: AssignmentForm) -> Self {
        NewAssignment {
            is_test: form.is_test.as_deref() == Some("1"),
            title: form.title,
            due_date: form.due_date,
            description: form.description,
        }
    }
}

#[derive(Debug, Deserialize)]
struct EventForm {
    title: String,
    date: String,
    year: Option<String>,
    month: Option<String>,
}

#[derive(Debug, Serialize)]
struct ToggleResponse {
    ok: bool,
    completed: bool,
}

#[derive(Debug, Deserialize)]
struct ApiMonthQuery {
    year: i32,
    month: u32,
}

#[derive(Debug, Serialize)]
struct MonthPayload<'a> {
    student: &'a Student,
    year: i32,
    month: u32,
    pending: usize,
    completed: usize,
    weeks: Vec<WeekCells<'a>>,
}

fn month_redirect(base: &str, date: NaiveDate) -> Redirect {
    Redirect::to(&format!(
        "{}?year={}&month={}",
        base,
        date.year(),
        date.month()
    ))
}

/// Send the caller back to the month they were viewing with an error banner
fn error_redirect(base: &str, year: Option<&str>, month: Option<&str>, message: &str) -> Redirect {
    let mut params = Vec::with_capacity(3);
    if let Some(year) = year {
        params.push(("year", year));
    }
    if let Some(month) = month {
        params.push(("month", month));
    }
    params.push(("error", message));

    match serde_urlencoded::to_string(&params) {
        Ok(query) => Redirect::to(&format!("{}?{}", base, query)),
        Err(_) => Redirect::to(base),
    }
}

// ---------- Handlers ----------

async fn health_handler(State(state): State<SharedState>) -> Result<StatusCode, ApiError> {
    let conn = state.db.lock().await;
    conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
        .map_err(LoungeError::from)?;
    Ok(StatusCode::OK)
}

async fn login_page() -> Html<String> {
    Html(html::render_login(None).into_string())
}

async fn login_handler(State(state): State<SharedState>, Form(form): Form<LoginForm>) -> Response {
    match auth::role_for_code(&state.config, &form.code) {
        Some(role) => {
            let token = state.sessions.create(role).await;
            info!(role = role.label(), "Login");
            let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, token);
            ([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response()
        }
        None => {
            warn!("Rejected login attempt");
            (
                StatusCode::UNAUTHORIZED,
                Html(html::render_login(Some("Unknown access code")).into_string()),
            )
                .into_response()
        }
    }
}

async fn logout_handler(
    State(state): State<SharedState>,
    headers: axum::http::HeaderMap,
) -> Response {
    if let Some(token) = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(auth::session_token)
    {
        state.sessions.remove(token).await;
    }
    let cookie = format!("{}=; Path=/; Max-Age=0", SESSION_COOKIE);
    ([(header::SET_COOKIE, cookie)], Redirect::to("/login")).into_response()
}

async fn index_handler(
    State(state): State<SharedState>,
    PageAccess(access): PageAccess,
) -> Result<Html<String>, PageError> {
    let conn = state.db.lock().await;
    let students = db::list_students(&conn)?;
    Ok(Html(html::render_students(&students, access).into_string()))
}

async fn add_student_handler(
    State(state): State<SharedState>,
    PageAccess(access): PageAccess,
    Form(form): Form<StudentForm>,
) -> Result<Redirect, PageError> {
    access.require(Role::Staff)?;

    let conn = state.db.lock().await;
    match db::add_student(&conn, &form.into()) {
        Ok(student) => info!(student_id = student.id, "Student added"),
        // The form marks the name as required, so this only happens for blank input
        Err(LoungeError::Validation(msg)) => warn!(reason = %msg, "Student not added"),
        Err(e) => return Err(e.into()),
    }
    Ok(Redirect::to("/"))
}

async fn delete_student_handler(
    State(state): State<SharedState>,
    PageAccess(access): PageAccess,
    Path(id): Path<i64>,
) -> Result<Redirect, PageError> {
    access.require(Role::Staff)?;

    let conn = state.db.lock().await;
    db::delete_student(&conn, id)?;
    Ok(Redirect::to("/"))
}

async fn student_page(
    State(state): State<SharedState>,
    PageAccess(access): PageAccess,
    Path(id): Path<i64>,
    Query(query): Query<MonthQuery>,
) -> Result<Response, PageError> {
    let today = today();
    let (year, month) = resolve_month(&query, today);

    let conn = state.db.lock().await;
    match MonthView::build(&conn, id, year, month) {
        Ok(view) => {
            let page = html::render_month(&view, access, query.error.as_deref(), today);
            Ok(Html(page.into_string()).into_response())
        }
        Err(LoungeError::NotFound { .. }) => Ok(Redirect::to("/").into_response()),
        Err(e) => Err(e.into()),
    }
}

async fn add_assignment_handler(
    State(state): State<SharedState>,
    PageAccess(access): PageAccess,
    Path(student_id): Path<i64>,
    Form(form): Form<AssignmentForm>,
) -> Result<Redirect, PageError> {
    access.require(Role::Staff)?;

    let base = format!("/students/{}", student_id);
    let (year, month) = (form.year.clone(), form.month.clone());

    let conn = state.db.lock().await;
    match db::add_assignment(&conn, student_id, &form.into()) {
        Ok(assignment) => {
            info!(
                assignment_id = assignment.id,
                student_id = student_id,
                "Assignment added"
            );
            Ok(month_redirect(&base, assignment.due_date))
        }
        Err(LoungeError::Validation(msg)) => {
            warn!(student_id = student_id, reason = %msg, "Assignment not added");
            Ok(error_redirect(&base, year.as_deref(), month.as_deref(), &msg))
        }
        Err(e) => Err(e.into()),
    }
}

async fn toggle_handler(
    State(state): State<SharedState>,
    ApiAccess(access): ApiAccess,
    Path(id): Path<i64>,
) -> Result<Json<ToggleResponse>, ApiError> {
    access.require(Role::Student)?;

    let conn = state.db.lock().await;
    let completed = db::toggle_completion(&conn, id)?;
    Ok(Json(ToggleResponse {
        ok: true,
        completed,
    }))
}

async fn delete_assignment_handler(
    State(state): State<SharedState>,
    PageAccess(access): PageAccess,
    Path(id): Path<i64>,
) -> Result<Redirect, PageError> {
    access.require(Role::Staff)?;

    let conn = state.db.lock().await;
    let owner = db::delete_assignment(&conn, id)?;
    Ok(Redirect::to(&format!("/students/{}", owner)))
}

async fn events_page(
    State(state): State<SharedState>,
    PageAccess(access): PageAccess,
    Query(query): Query<MonthQuery>,
) -> Result<Html<String>, PageError> {
    let (year, month) = resolve_month(&query, today());
    let grid = calendar::build_month_grid(year, month)?;

    let conn = state.db.lock().await;
    let events = db::list_events_for_month(&conn, year, month)?;
    Ok(Html(
        html::render_events(&grid, &events, access, query.error.as_deref()).into_string(),
    ))
}

async fn add_event_handler(
    State(state): State<SharedState>,
    PageAccess(access): PageAccess,
    Form(form): Form<EventForm>,
) -> Result<Redirect, PageError> {
    access.require(Role::Staff)?;

    let conn = state.db.lock().await;
    match db::add_event(&conn, &form.title, &form.date) {
        Ok(event) => {
            info!(event_id = event.id, "Event added");
            Ok(month_redirect("/events", event.date))
        }
        Err(LoungeError::Validation(msg)) => {
            warn!(reason = %msg, "Event not added");
            Ok(error_redirect(
                "/events",
                form.year.as_deref(),
                form.month.as_deref(),
                &msg,
            ))
        }
        Err(e) => Err(e.into()),
    }
}

async fn delete_event_handler(
    State(state): State<SharedState>,
    PageAccess(access): PageAccess,
    Path(id): Path<i64>,
) -> Result<Redirect, PageError> {
    access.require(Role::Staff)?;

    let conn = state.db.lock().await;
    db::delete_event(&conn, id)?;
    Ok(Redirect::to("/events"))
}

async fn month_api_handler(
    State(state): State<SharedState>,
    ApiAccess(access): ApiAccess,
    Path(id): Path<i64>,
    Query(query): Query<ApiMonthQuery>,
) -> Result<Response, ApiError> {
    access.require(Role::Student)?;

    let conn = state.db.lock().await;
    let view = MonthView::build(&conn, id, query.year, query.month)?;
    let payload = MonthPayload {
        student: &view.student,
        year: view.grid.year,
        month: view.grid.month,
        pending: view.pending_count(),
        completed: view.completed_count(),
        weeks: view.weeks(),
    };
    Ok(Json(payload).into_response())
}
