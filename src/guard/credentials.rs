//! Credential extraction, independent of transport.
//!
//! Precedence: the `Authentication` cookie first, then the
//! `authentication` header (HTTP header names are case-insensitive, so
//! this also matches `Authentication`). Absence is a normal state for
//! public routes and is reported as `None`, never as an error.

use axum::http::{header::COOKIE, HeaderMap};

pub const CREDENTIAL_COOKIE: &str = "Authentication";
pub const CREDENTIAL_HEADER: &str = "authentication";

/// Pulls the bearer credential out of the request headers, or `None`.
pub fn extract_credential(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = credential_from_cookies(headers) {
        return Some(token);
    }

    headers
        .get(CREDENTIAL_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn credential_from_cookies(headers: &HeaderMap) -> Option<String> {
    // A request may carry several Cookie headers; scan them all.
    for header in headers.get_all(COOKIE) {
        let Ok(raw) = header.to_str() else { continue };

        for pair in raw.split(';') {
            let mut parts = pair.splitn(2, '=');
            let name = parts.next().map(str::trim);
            let value = parts.next().map(str::trim);

            if name == Some(CREDENTIAL_COOKIE) {
                if let Some(value) = value.filter(|v| !v.is_empty()) {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(
                axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn absent_credential_is_none_not_error() {
        assert_eq!(extract_credential(&HeaderMap::new()), None);
    }

    #[test]
    fn reads_authentication_cookie() {
        let headers = headers(&[("cookie", "theme=dark; Authentication=tok123; lang=en")]);
        assert_eq!(extract_credential(&headers).as_deref(), Some("tok123"));
    }

    #[test]
    fn falls_back_to_authentication_header() {
        let headers = headers(&[("authentication", "tok456")]);
        assert_eq!(extract_credential(&headers).as_deref(), Some("tok456"));
    }

    #[test]
    fn header_name_is_case_insensitive() {
        let headers = headers(&[("Authentication", "tok789")]);
        assert_eq!(extract_credential(&headers).as_deref(), Some("tok789"));
    }

    #[test]
    fn cookie_takes_precedence_over_header() {
        let headers = headers(&[
            ("cookie", "Authentication=from-cookie"),
            ("authentication", "from-header"),
        ]);
        assert_eq!(extract_credential(&headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn empty_values_are_treated_as_absent() {
        let headers = headers(&[("cookie", "Authentication="), ("authentication", "  ")]);
        assert_eq!(extract_credential(&headers), None);
    }
}
