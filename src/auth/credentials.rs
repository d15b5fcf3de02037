//! Reading and writing session credentials on HTTP messages.

use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::{HeaderMap, HeaderValue};

use crate::config::AuthConfig;

/// Session token from `Authorization: Bearer …`, falling back to the session cookie.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    bearer_token(headers).or_else(|| cookie_value(headers, cookie_name))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` value for a new session. `persistent` adds `Max-Age`.
pub fn session_cookie(config: &AuthConfig, token: &str, persistent: bool) -> Option<HeaderValue> {
    let mut cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", config.cookie_name, token);
    if persistent {
        cookie.push_str(&format!("; Max-Age={}", config.session_ttl_secs));
    }
    if config.secure_cookies {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
}

/// `Set-Cookie` value that removes the session cookie.
pub fn clear_cookie(config: &AuthConfig) -> Option<HeaderValue> {
    let mut cookie = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", config.cookie_name);
    if config.secure_cookies {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_static(*value));
        }
        map
    }

    #[test]
    fn test_bearer_wins_over_cookie() {
        let map = headers(&[
            ("authorization", "Bearer abc"),
            ("cookie", "session=def"),
        ]);
        assert_eq!(session_token(&map, "session").as_deref(), Some("abc"));
    }

    #[test]
    fn test_cookie_lookup() {
        let map = headers(&[("cookie", "theme=dark; session=def; other=1")]);
        assert_eq!(session_token(&map, "session").as_deref(), Some("def"));
        assert_eq!(session_token(&map, "missing"), None);

        let map = headers(&[("cookie", "a=1"), ("cookie", "session=xyz")]);
        assert_eq!(session_token(&map, "session").as_deref(), Some("xyz"));
    }

    #[test]
    fn test_rejects_other_schemes_and_empty_values() {
        assert_eq!(session_token(&headers(&[("authorization", "Basic abc")]), "s"), None);
        assert_eq!(session_token(&headers(&[("authorization", "Bearer ")]), "s"), None);
        assert_eq!(session_token(&headers(&[("cookie", "s=")]), "s"), None);
    }

    #[test]
    fn test_cookie_attributes() {
        let mut config = AuthConfig::default();
        config.session_ttl_secs = 60;

        let persistent = session_cookie(&config, "tok", true).unwrap();
        assert_eq!(
            persistent.to_str().unwrap(),
            "reactivities_session=tok; Path=/; HttpOnly; SameSite=Lax; Max-Age=60"
        );

        config.secure_cookies = true;
        let transient = session_cookie(&config, "tok", false).unwrap();
        assert!(!transient.to_str().unwrap().contains("Max-Age"));
        assert!(transient.to_str().unwrap().ends_with("; Secure"));

        assert!(clear_cookie(&config).unwrap().to_str().unwrap().contains("Max-Age=0"));
    }
}
