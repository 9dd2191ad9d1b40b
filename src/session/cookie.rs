use axum::http::{
    header::{COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue,
};
use tracing::{debug, error};

use super::SessionIssuer;
use crate::cli::globals::Environment;

/// Cookie carrying the session token.
pub const SESSION_COOKIE_NAME: &str = "devArthosPortfolio";

/// Cookie lifetime stays at 2 hours even though the token inside expires far
/// sooner; clients re-authenticate to refresh it.
pub const SESSION_COOKIE_MAX_AGE_SECONDS: u32 = 7200;

/// The portfolio client only sends the cookie to the API mount point.
pub const SESSION_COOKIE_PATH: &str = "/graphql";

/// Build the `Set-Cookie` value for a session token.
///
/// `Secure` is appended outside development only, so local HTTP clients keep
/// working.
#[must_use]
pub fn session_cookie(token: &str, environment: Environment) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Max-Age={SESSION_COOKIE_MAX_AGE_SECONDS}; Path={SESSION_COOKIE_PATH}; SameSite=Secure; HttpOnly"
    );
    if !environment.is_development() {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Issue a token for `user_id` and append the session cookie to `headers`.
///
/// Header-write failures are logged and swallowed; the token is still
/// returned. `None` means no token could be issued at all.
pub fn attach(issuer: &SessionIssuer, user_id: &str, headers: &mut HeaderMap) -> Option<String> {
    let token = issuer.issue(user_id)?;

    match HeaderValue::from_str(&session_cookie(&token, issuer.environment())) {
        Ok(value) => {
            headers.append(SET_COOKIE, value);
            debug!("session cookie set");
        }
        Err(err) => {
            error!("Failed to set session cookie: {err}");
        }
    }

    Some(token)
}

/// Extract the session token from a request `Cookie` header, if present.
#[must_use]
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;

    for pair in value.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        if parts.next() == Some(SESSION_COOKIE_NAME) {
            return parts
                .next()
                .map(str::to_string)
                .filter(|token| !token.is_empty());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::globals::GlobalArgs;
    use secrecy::SecretString;

    fn issuer(environment: Environment) -> SessionIssuer {
        let globals = GlobalArgs::new(environment, SecretString::from("secretTesting".to_string()));
        SessionIssuer::new(&globals)
    }

    #[test]
    fn test_cookie_attributes_development() {
        let cookie = session_cookie("abc", Environment::Development);
        assert_eq!(
            cookie,
            "devArthosPortfolio=abc; Max-Age=7200; Path=/graphql; SameSite=Secure; HttpOnly"
        );
    }

    #[test]
    fn test_cookie_attributes_production() {
        let cookie = session_cookie("abc", Environment::Production);
        assert!(cookie.ends_with("; HttpOnly; Secure"));
        assert!(cookie.contains("Max-Age=7200"));
        assert!(cookie.contains("Path=/graphql"));
        assert!(cookie.contains("SameSite=Secure"));
    }

    #[test]
    fn test_attach_sets_header_and_returns_token() {
        let issuer = issuer(Environment::Development);
        let mut headers = HeaderMap::new();

        let token = attach(&issuer, "user-1", &mut headers).expect("token");

        let set_cookie = headers.get(SET_COOKIE).expect("Set-Cookie header");
        let set_cookie = set_cookie.to_str().expect("ascii header");
        assert!(set_cookie.starts_with(&format!("{SESSION_COOKIE_NAME}={token}")));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(!set_cookie.contains("; Secure"));
    }

    #[test]
    fn test_attach_without_user_id_yields_none() {
        let issuer = issuer(Environment::Development);
        let mut headers = HeaderMap::new();

        assert!(attach(&issuer, "", &mut headers).is_none());
        assert!(headers.get(SET_COOKIE).is_none());
    }

    #[test]
    fn test_extract_session_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; devArthosPortfolio=tok123; lang=en"),
        );
        assert_eq!(extract_session_token(&headers).as_deref(), Some("tok123"));
    }

    #[test]
    fn test_extract_session_token_missing_or_empty() {
        let mut headers = HeaderMap::new();
        assert!(extract_session_token(&headers).is_none());

        headers.insert(COOKIE, HeaderValue::from_static("theme=dark"));
        assert!(extract_session_token(&headers).is_none());

        headers.insert(COOKIE, HeaderValue::from_static("devArthosPortfolio="));
        assert!(extract_session_token(&headers).is_none());
    }
}
