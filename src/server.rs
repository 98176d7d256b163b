//!
//! gympro HTTP server
//! ------------------
//! This module defines the Axum router for the login surface and the two
//! role areas.
//!
//! Responsibilities:
//! - Login via the HTML form (`POST /login`) and the JSON API (`POST /api/auth/login`).
//! - Logout, which only drops the session cookie.
//! - The access gate layered over every route; `/api` paths guard themselves.
//! - Thin trainer and client landing pages that re-check the session.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::LoginError;
use crate::identity::{self, Identity, LoginFlow, LoginRequest, Role, SessionCodec, SessionCookies};
use crate::security;
use crate::storage::{FileCredentialStore, SharedCredentialStore};

/// Shared server state injected into all handlers.
///
/// Holds the credential store behind the login flow and the loaded config.
/// No session data lives here: the cookie carries the whole session.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedCredentialStore,
    pub config: Arc<ServerConfig>,
    pub flow: LoginFlow,
}

impl AppState {
    pub fn new(store: SharedCredentialStore, config: ServerConfig) -> Self {
        let flow = LoginFlow::new(store.clone(), &config);
        Self { store, config: Arc::new(config), flow }
    }

    fn cookies(&self, headers: &HeaderMap) -> SessionCookies {
        SessionCookies::from_headers(headers, self.config.production)
    }

    fn session(&self, headers: &HeaderMap) -> Option<Identity> {
        identity::read_session_cookie(headers).and_then(|t| SessionCodec.decode(&t))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/login", get(login_page).post(login_form))
        .route("/logout", get(logout).post(logout))
        .route("/trainer", get(trainer_page))
        .route("/client", get(client_page))
        .route("/api/auth/login", axum::routing::post(api_login))
        .route("/api/session", get(api_session))
        .layer(axum::middleware::from_fn(identity::access_gate))
        .with_state(state)
}

/// Serve on an already-bound listener until the task is dropped.
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Open the user table, seed demo accounts on first run, bind and serve.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let users_file = config.users_file();
    let store = FileCredentialStore::open(&users_file)
        .with_context(|| format!("While opening user table: {}", users_file.display()))?;
    if config.seed_demo {
        security::ensure_demo_users(&store).await?;
    }
    let addr: SocketAddr = format!("{}:{}", config.bind, config.http_port).parse()?;
    let state = AppState::new(Arc::new(store), config);
    info!(target: "startup", "Starting server on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    serve(listener, state).await
}

fn status_of(e: &LoginError) -> StatusCode {
    StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn with_cookies(cookies: &SessionCookies) -> HeaderMap {
    let mut h = HeaderMap::new();
    cookies.apply(&mut h);
    h
}

async fn home(State(state): State<AppState>, headers: HeaderMap) -> Redirect {
    match state.session(&headers) {
        Some(id) => Redirect::to(id.role.home()),
        None => Redirect::to(identity::LOGIN_PATH),
    }
}

async fn login_page() -> Html<String> {
    Html(render_login(None))
}

async fn login_form(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(payload): Form<LoginRequest>,
) -> Response {
    let mut cookies = state.cookies(&headers);
    match state.flow.login(&payload, &mut cookies).await {
        Ok(target) => (with_cookies(&cookies), Redirect::to(target)).into_response(),
        Err(e) => (status_of(&e), Html(render_login(Some(e.user_message())))).into_response(),
    }
}

async fn api_login(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    // an unreadable body is reported like missing fields
    let payload = match payload {
        Ok(Json(p)) => p,
        Err(_) => LoginRequest::default(),
    };
    let mut cookies = state.cookies(&headers);
    match state.flow.login(&payload, &mut cookies).await {
        Ok(target) => (
            StatusCode::OK,
            with_cookies(&cookies),
            Json(json!({"success": true, "redirectTo": target})),
        ).into_response(),
        Err(e) => (status_of(&e), Json(e.to_body())).into_response(),
    }
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let mut cookies = state.cookies(&headers);
    let target = state.flow.logout(&mut cookies);
    (with_cookies(&cookies), Redirect::to(target)).into_response()
}

// Page loaders repeat the area rule so they stay safe without the gate.
async fn trainer_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match state.session(&headers) {
        None => Redirect::to(identity::LOGIN_PATH).into_response(),
        Some(id) if id.role == Role::Client => Redirect::to(identity::CLIENT_HOME).into_response(),
        Some(id) => Html(render_area(&id, "Panel del entrenador")).into_response(),
    }
}

async fn client_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match state.session(&headers) {
        None => Redirect::to(identity::LOGIN_PATH).into_response(),
        Some(id) if id.role != Role::Client => Redirect::to(identity::TRAINER_HOME).into_response(),
        Some(id) => Html(render_area(&id, "Tus ejercicios de hoy")).into_response(),
    }
}

/// `/api` is ungated, so this endpoint checks the session itself.
async fn api_session(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match state.session(&headers) {
        Some(id) => (StatusCode::OK, Json(json!({"status": "ok", "user": id}))).into_response(),
        None => (StatusCode::UNAUTHORIZED, Json(json!({"status": "unauthorized"}))).into_response(),
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn render_login(error: Option<&str>) -> String {
    let banner = error
        .map(|e| format!(r#"<div class="alert alert-error">{}</div>"#, escape_html(e)))
        .unwrap_or_default();
    format!(
        r#"<!doctype html>
<html lang="es"><head><meta charset="utf-8"><title>GymPro</title></head>
<body class="login-page">
<main class="login-card">
<h1 class="login-title">GymPro</h1>
<p class="login-subtitle">Plataforma de entrenamiento profesional</p>
{banner}
<form method="post" action="/login">
<label>Usuario <input name="username" type="text" required autocomplete="username"></label>
<label>Contraseña <input name="password" type="password" required autocomplete="current-password"></label>
<button type="submit">Ingresar</button>
</form>
</main>
</body></html>"#
    )
}

fn render_area(id: &Identity, heading: &str) -> String {
    let role_label = match id.role {
        Role::Trainer => "Entrenador",
        Role::Admin => "Admin",
        Role::Client => "Cliente",
    };
    format!(
        r#"<!doctype html>
<html lang="es"><head><meta charset="utf-8"><title>GymPro</title></head>
<body>
<nav class="navbar"><span class="navbar-brand">GymPro</span>
<span class="navbar-user">{role_label} - <strong>{username}</strong></span>
<form method="post" action="/logout"><button type="submit">Cerrar sesión</button></form>
</nav>
<main class="page"><h1>¡Hola, {name}!</h1><p>{heading}</p></main>
</body></html>"#,
        username = escape_html(&id.username),
        name = escape_html(id.display_name()),
        heading = escape_html(heading),
    )
}
