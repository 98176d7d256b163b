use axum::http::{header, HeaderMap, HeaderValue};
use cookie::time::{Duration as CookieDuration, OffsetDateTime};
use cookie::{Cookie, SameSite};
use std::time::Duration;
use tracing::warn;

use super::session::SESSION_COOKIE;

/// Session cookie reads and writes for one request/response exchange.
///
/// Built from the inbound `Cookie` headers; `set` and `clear` queue a
/// `Set-Cookie` for the response and are visible to later `get` calls on the
/// same value. There is no server-side record: the cookie is the whole session.
#[derive(Debug, Clone)]
pub struct SessionCookies {
    current: Option<String>,
    pending: Option<Cookie<'static>>,
    secure: bool,
}

impl SessionCookies {
    pub fn from_headers(headers: &HeaderMap, secure: bool) -> Self {
        Self { current: read_session_cookie(headers), pending: None, secure }
    }

    pub fn empty(secure: bool) -> Self {
        Self { current: None, pending: None, secure }
    }

    pub fn get(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn set(&mut self, token: &str, ttl: Duration) {
        let ttl = CookieDuration::seconds(ttl.as_secs() as i64);
        let c = Cookie::build((SESSION_COOKIE, token.to_string()))
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .path("/")
            .max_age(ttl)
            .expires(OffsetDateTime::now_utc() + ttl)
            .build();
        self.current = Some(token.to_string());
        self.pending = Some(c);
    }

    pub fn clear(&mut self) {
        let c = Cookie::build((SESSION_COOKIE, ""))
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .path("/")
            .max_age(CookieDuration::ZERO)
            .expires(OffsetDateTime::UNIX_EPOCH)
            .build();
        self.current = None;
        self.pending = Some(c);
    }

    /// Queued `Set-Cookie` value, if `set` or `clear` was called.
    pub fn set_cookie_header(&self) -> Option<HeaderValue> {
        let c = self.pending.as_ref()?;
        match HeaderValue::from_str(&c.to_string()) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(target: "auth", "dropping unencodable session cookie: {}", e);
                None
            }
        }
    }

    pub fn apply(&self, headers: &mut HeaderMap) {
        if let Some(v) = self.set_cookie_header() {
            headers.append(header::SET_COOKIE, v);
        }
    }
}

/// First `gym_session` value across all `Cookie` headers.
pub fn read_session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| Cookie::split_parse(s).filter_map(|c| c.ok()))
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.value().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_cookie(v: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(header::COOKIE, HeaderValue::from_str(v).unwrap());
        h
    }

    #[test]
    fn reads_named_cookie_among_others() {
        let h = headers_with_cookie("theme=dark; gym_session=abc%7B; lang=es");
        assert_eq!(read_session_cookie(&h).as_deref(), Some("abc%7B"));
        assert_eq!(read_session_cookie(&headers_with_cookie("gym=1")), None);
        assert_eq!(read_session_cookie(&HeaderMap::new()), None);
    }

    #[test]
    fn set_emits_session_attributes() {
        let mut jar = SessionCookies::empty(false);
        jar.set("tok", Duration::from_secs(604_800));
        assert_eq!(jar.get(), Some("tok"));
        let v = jar.set_cookie_header().unwrap();
        let s = v.to_str().unwrap();
        assert!(s.starts_with("gym_session=tok"));
        assert!(s.contains("HttpOnly"));
        assert!(s.contains("SameSite=Lax"));
        assert!(s.contains("Path=/"));
        assert!(s.contains("Max-Age=604800"));
        assert!(s.contains("Expires="));
        assert!(!s.contains("Secure"));
    }

    #[test]
    fn secure_flag_follows_environment() {
        let mut jar = SessionCookies::empty(true);
        jar.set("tok", Duration::from_secs(60));
        assert!(jar.set_cookie_header().unwrap().to_str().unwrap().contains("Secure"));
    }

    #[test]
    fn clear_expires_immediately() {
        let mut jar = SessionCookies::from_headers(&headers_with_cookie("gym_session=old"), false);
        assert_eq!(jar.get(), Some("old"));
        jar.clear();
        assert_eq!(jar.get(), None);
        let s = jar.set_cookie_header().unwrap().to_str().unwrap().to_string();
        assert!(s.starts_with("gym_session=;"));
        assert!(s.contains("Max-Age=0"));
        assert!(s.contains("1970"));
    }

    #[test]
    fn untouched_jar_writes_nothing() {
        let jar = SessionCookies::from_headers(&headers_with_cookie("gym_session=abc"), false);
        let mut out = HeaderMap::new();
        jar.apply(&mut out);
        assert!(out.get(header::SET_COOKIE).is_none());
    }
}
