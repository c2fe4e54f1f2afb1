//! Auth cookie construction.

use crate::state::CookieSettings;
use cookie::time::OffsetDateTime;
use cookie::{Cookie, SameSite};

/// Http-only cookie carrying `token`
pub fn auth_cookie(settings: &CookieSettings, token: &str) -> Cookie<'static> {
    Cookie::build((settings.name.clone(), token.to_string()))
        .http_only(true)
        .secure(settings.secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(settings.max_age)
        .expires(OffsetDateTime::now_utc() + settings.max_age)
        .build()
}

/// Expired, empty cookie that clears the auth cookie on the client
pub fn removal_cookie(settings: &CookieSettings) -> Cookie<'static> {
    Cookie::build((settings.name.clone(), String::new()))
        .http_only(true)
        .secure(settings.secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(cookie::time::Duration::ZERO)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> CookieSettings {
        CookieSettings {
            name: "authToken".to_string(),
            max_age: cookie::time::Duration::days(7),
            secure: false,
        }
    }

    #[test]
    fn test_auth_cookie() {
        let header = auth_cookie(&settings(), "tok").to_string();
        assert!(header.starts_with("authToken=tok"));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("Path=/"));
        assert!(header.contains("Max-Age=604800"));
        assert!(!header.contains("Secure"));
    }

    #[test]
    fn test_removal_cookie() {
        let header = removal_cookie(&settings()).to_string();
        assert!(header.starts_with("authToken=;"));
        assert!(header.contains("Max-Age=0"));
    }
}
