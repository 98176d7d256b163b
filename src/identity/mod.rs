//! Sessions and access control for the trainer and client areas.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod session;
mod cookies;
mod provider;
mod authorizer;

pub use principal::{Identity, Role, CLIENT_HOME, LOGIN_PATH, TRAINER_HOME};
pub use session::{SessionCodec, SessionToken, SESSION_COOKIE, SESSION_TTL};
pub use cookies::{read_session_cookie, SessionCookies};
pub use provider::{LoginFlow, LoginRequest};
pub use authorizer::{access_gate, evaluate, is_public, is_ungated, role_owns, GateDecision, GateState, PUBLIC_ROUTES};
