use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use tracing::debug;

use super::cookies::read_session_cookie;
use super::principal::{Role, CLIENT_HOME, LOGIN_PATH, TRAINER_HOME};
use super::session::SessionCodec;

/// Paths reachable without a session.
pub const PUBLIC_ROUTES: &[&str] = &[LOGIN_PATH];

/// Infrastructure paths that bypass the gate and guard themselves.
const UNGATED_PREFIXES: &[&str] = &["/api", "/static", "/favicon.ico"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Public,
    Unauthenticated,
    AuthenticatedWrongRole,
    AuthenticatedAuthorized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Pass,
    Redirect(&'static str),
}

/// `path` equals `prefix` or continues it with a new segment.
fn under(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

pub fn is_public(path: &str) -> bool {
    PUBLIC_ROUTES.contains(&path)
}

pub fn is_ungated(path: &str) -> bool {
    UNGATED_PREFIXES.iter().any(|p| under(path, p))
}

/// Whether `role` may reach `path`. Only the two areas are owned; any other
/// protected path is open to every signed-in role.
pub fn role_owns(role: Role, path: &str) -> bool {
    if under(path, TRAINER_HOME) {
        matches!(role, Role::Trainer | Role::Admin)
    } else if under(path, CLIENT_HOME) {
        role == Role::Client
    } else {
        true
    }
}

/// Classify one request and decide what to do with it.
pub fn evaluate(codec: &SessionCodec, path: &str, cookie: Option<&str>) -> (GateState, GateDecision) {
    if is_public(path) {
        // a corrupt cookie on the login page is just "no session"
        return match cookie.and_then(|c| codec.decode(c)) {
            Some(id) => (GateState::Public, GateDecision::Redirect(id.role.home())),
            None => (GateState::Public, GateDecision::Pass),
        };
    }
    let Some(identity) = cookie.and_then(|c| codec.decode(c)) else {
        return (GateState::Unauthenticated, GateDecision::Redirect(LOGIN_PATH));
    };
    if role_owns(identity.role, path) {
        (GateState::AuthenticatedAuthorized, GateDecision::Pass)
    } else {
        (GateState::AuthenticatedWrongRole, GateDecision::Redirect(identity.role.home()))
    }
}

/// Axum middleware running the gate ahead of every handler.
pub async fn access_gate(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_owned();
    if is_ungated(&path) {
        return next.run(req).await;
    }
    let cookie = read_session_cookie(req.headers());
    let (state, decision) = evaluate(&SessionCodec, &path, cookie.as_deref());
    match decision {
        GateDecision::Pass => next.run(req).await,
        GateDecision::Redirect(to) => {
            debug!(target: "gate", path = %path, state = ?state, to = to, "redirect");
            Redirect::to(to).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;

    fn token(role: Role) -> String {
        SessionCodec.encode(&Identity {
            id: 1,
            username: "u".into(),
            role,
            full_name: None,
            is_active: true,
        })
    }

    fn decide(path: &str, cookie: Option<&str>) -> GateDecision {
        evaluate(&SessionCodec, path, cookie).1
    }

    #[test]
    fn public_route_bounces_signed_in_users_home() {
        assert_eq!(decide("/login", Some(&token(Role::Client))), GateDecision::Redirect("/client"));
        assert_eq!(decide("/login", Some(&token(Role::Trainer))), GateDecision::Redirect("/trainer"));
        assert_eq!(decide("/login", Some(&token(Role::Admin))), GateDecision::Redirect("/trainer"));
    }

    #[test]
    fn public_route_renders_without_valid_session() {
        assert_eq!(decide("/login", None), GateDecision::Pass);
        assert_eq!(evaluate(&SessionCodec, "/login", Some("%%garbage")), (GateState::Public, GateDecision::Pass));
    }

    #[test]
    fn protected_routes_require_decodable_session() {
        for p in ["/", "/trainer", "/client", "/trainer/exercises", "/anything"] {
            assert_eq!(evaluate(&SessionCodec, p, None), (GateState::Unauthenticated, GateDecision::Redirect("/login")));
            assert_eq!(decide(p, Some("not-json")), GateDecision::Redirect("/login"));
        }
    }

    #[test]
    fn roles_are_confined_to_their_area() {
        let c = token(Role::Client);
        assert_eq!(evaluate(&SessionCodec, "/trainer", Some(&c)), (GateState::AuthenticatedWrongRole, GateDecision::Redirect("/client")));
        assert_eq!(decide("/trainer/clients/3", Some(&c)), GateDecision::Redirect("/client"));
        assert_eq!(decide("/client", Some(&c)), GateDecision::Pass);
        for r in [Role::Trainer, Role::Admin] {
            let t = token(r);
            assert_eq!(decide("/client", Some(&t)), GateDecision::Redirect("/trainer"));
            assert_eq!(decide("/client/history", Some(&t)), GateDecision::Redirect("/trainer"));
            assert_eq!(evaluate(&SessionCodec, "/trainer", Some(&t)), (GateState::AuthenticatedAuthorized, GateDecision::Pass));
        }
    }

    #[test]
    fn area_match_is_segment_aware() {
        let c = token(Role::Client);
        assert_eq!(decide("/trainers-info", Some(&c)), GateDecision::Pass);
        assert!(!role_owns(Role::Client, "/trainer"));
        assert!(role_owns(Role::Client, "/"));
    }

    #[test]
    fn infrastructure_paths_are_ungated() {
        assert!(is_ungated("/api/auth/login"));
        assert!(is_ungated("/api"));
        assert!(is_ungated("/static/app.css"));
        assert!(is_ungated("/favicon.ico"));
        assert!(!is_ungated("/apiary"));
        assert!(!is_ungated("/login"));
    }
}
