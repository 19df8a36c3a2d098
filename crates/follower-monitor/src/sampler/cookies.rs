//! Cookie blob decoding at the browser boundary.

use serde::Deserialize;

use crate::credential::Credential;
use crate::error::SampleError;

/// SameSite policy after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    /// Only first-party requests.
    Strict,
    /// Top-level navigations too.
    Lax,
    /// Always sent.
    #[default]
    None,
}

impl SameSite {
    /// Normalize browser-extension spellings (`no_restriction`, `lax`, ...).
    ///
    /// Anything unrecognized, including a missing value, becomes `None`.
    #[must_use]
    pub fn normalize(raw: Option<&str>) -> Self {
        match raw.map(str::to_ascii_lowercase).as_deref() {
            Some("lax") => Self::Lax,
            Some("strict") => Self::Strict,
            _ => Self::None,
        }
    }
}

/// A cookie as exported by browser extensions.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCookie {
    name: String,
    value: String,
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    secure: bool,
    #[serde(default)]
    http_only: bool,
    #[serde(default)]
    same_site: Option<String>,
    #[serde(default)]
    expiration_date: Option<f64>,
}

/// A cookie ready to be installed in the browser.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    /// Expiry in seconds since the Unix epoch.
    pub expires: Option<f64>,
}

/// Decode a credential into browser cookies.
///
/// Two shapes are accepted: a JSON array of exported cookies, or a raw
/// `Cookie` header (`auth_token=...; ct0=...`). Cookies without a domain
/// get `default_domain`.
pub fn decode(credential: &Credential, default_domain: &str) -> Result<Vec<SessionCookie>, SampleError> {
    let blob = credential.expose().trim();

    let cookies: Vec<SessionCookie> = if blob.starts_with('[') {
        let raw: Vec<RawCookie> = serde_json::from_str(blob)
            .map_err(|e| SampleError::Auth(format!("cookie JSON is invalid: {e}")))?;
        raw.into_iter()
            .map(|c| SessionCookie {
                name: c.name,
                value: c.value,
                domain: c.domain.unwrap_or_else(|| default_domain.to_string()),
                path: c.path.unwrap_or_else(|| "/".to_string()),
                secure: c.secure,
                http_only: c.http_only,
                same_site: SameSite::normalize(c.same_site.as_deref()),
                expires: c.expiration_date,
            })
            .collect()
    } else {
        decode_header(blob, default_domain)?
    };

    if cookies.is_empty() {
        return Err(SampleError::Auth("credential contains no cookies".to_string()));
    }

    tracing::debug!(count = cookies.len(), "Decoded session cookies");
    Ok(cookies)
}

fn decode_header(header: &str, default_domain: &str) -> Result<Vec<SessionCookie>, SampleError> {
    header
        .split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = pair
                .split_once('=')
                .filter(|(name, _)| !name.trim().is_empty())
                .ok_or_else(|| SampleError::Auth("cookie header is malformed".to_string()))?;
            Ok::<_, SampleError>(SessionCookie {
                name: name.trim().to_string(),
                value: value.trim().to_string(),
                domain: default_domain.to_string(),
                path: "/".to_string(),
                secure: true,
                http_only: name.trim() == "auth_token",
                same_site: SameSite::None,
                expires: None,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_site_normalization() {
        assert_eq!(SameSite::normalize(Some("no_restriction")), SameSite::None);
        assert_eq!(SameSite::normalize(Some("lax")), SameSite::Lax);
        assert_eq!(SameSite::normalize(Some("Strict")), SameSite::Strict);
        assert_eq!(SameSite::normalize(Some("unspecified")), SameSite::None);
        assert_eq!(SameSite::normalize(None), SameSite::None);
    }

    #[test]
    fn test_decode_exported_json() {
        let credential = Credential::new(
            r#"[
                {"name": "auth_token", "value": "abc", "domain": ".x.com", "path": "/",
                 "secure": true, "httpOnly": true, "sameSite": "no_restriction",
                 "expirationDate": 1893456000.5},
                {"name": "ct0", "value": "def", "sameSite": "lax"}
            ]"#,
        );

        let cookies = decode(&credential, ".x.com").unwrap();
        assert_eq!(cookies.len(), 2);
        assert!(cookies[0].http_only);
        assert_eq!(cookies[0].expires, Some(1_893_456_000.5));
        assert_eq!(cookies[1].domain, ".x.com");
        assert_eq!(cookies[1].path, "/");
        assert_eq!(cookies[1].same_site, SameSite::Lax);
    }

    #[test]
    fn test_decode_header_string() {
        let credential = Credential::new("auth_token=abc; ct0=def;");
        let cookies = decode(&credential, ".x.com").unwrap();

        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[0].name, "auth_token");
        assert!(cookies[0].http_only);
        assert_eq!(cookies[1].value, "def");
        assert!(!cookies[1].http_only);
    }

    #[test]
    fn test_invalid_blobs_are_auth_errors() {
        for blob in ["[not json", "[]", "no-equals-sign", "=value"] {
            let err = decode(&Credential::new(blob), ".x.com").unwrap_err();
            assert!(matches!(err, SampleError::Auth(_)), "blob {blob:?} gave {err}");
        }
    }
}
