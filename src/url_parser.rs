//! Extracts the authorization code from the OAuth2 redirect.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use crate::error::{DriveError, Result};

/// Anything that looks like an absolute http(s) URL.
static REDIRECT_URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://").expect("Invalid redirect URL regex"));

/// Live authorization codes are opaque tokens of URL-safe characters.
static CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._!$*-]+$").expect("Invalid code regex"));

/// Extract the authorization code from the redirect URL the browser
/// landed on, or validate a bare code.
///
/// A redirect carrying `error=...` is reported as an authentication error
/// with the server's description.
///
/// # Examples
///
/// ```
/// use sky_drive::url_parser::extract_code;
///
/// let code = extract_code("https://example.com/callback?code=M1a2-b3c4").unwrap();
/// assert_eq!(code, "M1a2-b3c4");
///
/// let code = extract_code("M1a2-b3c4").unwrap();
/// assert_eq!(code, "M1a2-b3c4");
/// ```
pub fn extract_code(url_or_code: &str) -> Result<String> {
    let trimmed = url_or_code.trim();

    if REDIRECT_URL_REGEX.is_match(trimmed) {
        let url = Url::parse(trimmed)?;
        let mut code = None;
        let mut error = None;
        let mut description = None;

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.into_owned()),
                "error" => error = Some(value.into_owned()),
                "error_description" => description = Some(value.into_owned()),
                _ => {}
            }
        }

        if let Some(error) = error {
            return Err(DriveError::AuthenticationError(match description {
                Some(description) => format!("{}: {}", error, description),
                None => error,
            }));
        }

        return code
            .filter(|code| !code.is_empty())
            .ok_or_else(|| DriveError::InvalidAuthorizationCode(url_or_code.to_string()));
    }

    if CODE_REGEX.is_match(trimmed) {
        return Ok(trimmed.to_string());
    }

    Err(DriveError::InvalidAuthorizationCode(url_or_code.to_string()))
}
