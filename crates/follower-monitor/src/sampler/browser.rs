//! Headless Chromium sampler using chromiumoxide.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{CookieParam, CookieSameSite, TimeSinceEpoch};
use futures::StreamExt;

use super::cookies::{self, SameSite, SessionCookie};
use super::{FollowerCountParser, Sampler};
use crate::credential::Credential;
use crate::error::SampleError;

/// Desktop user agent; the mobile layout hides the follower link text.
const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Configuration for the browser sampler.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Profile to sample (without @).
    pub username: String,
    /// Platform origin, e.g. `https://x.com`.
    pub base_url: String,
    /// Domain applied to cookies that do not carry one.
    pub cookie_domain: String,
    /// Time to let the JS-heavy page render after navigation.
    pub settle: Duration,
    /// Where to dump fetched HTML for inspection.
    pub dump_html: Option<PathBuf>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            base_url: "https://x.com".to_string(),
            cookie_domain: ".x.com".to_string(),
            settle: Duration::from_secs(5),
            dump_html: None,
        }
    }
}

/// Rendered profile page.
struct ProfilePage {
    url: String,
    html: String,
}

/// Sampler that reads the follower count from the rendered profile page.
pub struct BrowserSampler {
    config: SamplerConfig,
}

impl BrowserSampler {
    /// Create a new sampler.
    #[must_use]
    pub fn new(config: SamplerConfig) -> Self {
        Self { config }
    }

    /// URL of the monitored profile.
    #[must_use]
    pub fn profile_url(&self) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.username
        )
    }

    /// Classify a rendered page: login redirect or wall, else the count.
    ///
    /// `url` is the page's final URL when known.
    pub fn inspect_page(username: &str, url: Option<&str>, html: &str) -> Result<u64, SampleError> {
        if let Some(url) = url {
            if url.contains("/login") || url.contains("/i/flow") {
                tracing::error!(url, "Redirected to login - auth cookies are invalid or expired");
                return Err(SampleError::Auth(
                    "redirected to login page, session cookies are invalid or expired".to_string(),
                ));
            }
        }

        if FollowerCountParser::is_login_wall(html) {
            tracing::error!("Not logged in properly. Check your cookies.");
            return Err(SampleError::Auth(
                "profile rendered the logged-out wall, session cookies were rejected".to_string(),
            ));
        }

        Ok(FollowerCountParser::parse(html, username)?)
    }

    /// Launch the browser, install cookies and fetch the profile HTML.
    async fn fetch_profile_page(&self, cookies: Vec<CookieParam>) -> Result<ProfilePage, SampleError> {
        let config = BrowserConfig::builder()
            .arg("--no-sandbox") // Required for containerized environments
            .arg("--disable-dev-shm-usage") // Avoid /dev/shm size issues in containers
            .arg("--disable-gpu")
            .arg(format!("--user-agent={DESKTOP_USER_AGENT}"))
            .window_size(1920, 4200)
            .build()
            .map_err(|e| SampleError::Browser(format!("Failed to build browser config: {e}")))?;

        tracing::info!("Launching browser in headless mode");
        let (mut browser, mut handler) = Browser::launch(config).await.map_err(browser_err)?;

        // Spawn handler task
        let handle = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let result = self.load_profile(&browser, cookies).await;

        if let Err(e) = browser.close().await {
            tracing::warn!(error = %e, "Failed to close browser cleanly");
        }
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "Browser handler task ended abnormally");
        }

        result
    }

    async fn load_profile(
        &self,
        browser: &Browser,
        cookies: Vec<CookieParam>,
    ) -> Result<ProfilePage, SampleError> {
        // Navigate to the origin first to establish domain context for cookies
        tracing::debug!(base_url = %self.config.base_url, "Navigating to origin to set cookies");
        let page = browser
            .new_page(self.config.base_url.as_str())
            .await
            .map_err(browser_err)?;

        tokio::time::sleep(Duration::from_secs(2)).await;

        tracing::debug!(count = cookies.len(), "Setting session cookies");
        page.set_cookies(cookies).await.map_err(browser_err)?;

        let profile_url = self.profile_url();
        tracing::info!(url = %profile_url, "Navigating to profile page");
        page.goto(profile_url.as_str()).await.map_err(browser_err)?;

        // Wait for content to load (X is JS-heavy)
        tokio::time::sleep(self.config.settle).await;

        let url = page.url().await.map_err(browser_err)?.unwrap_or_default();
        let html = page.content().await.map_err(browser_err)?;
        tracing::debug!(url, len = html.len(), "Got page content");

        if let Some(dump_path) = &self.config.dump_html {
            if let Err(e) = std::fs::write(dump_path, &html) {
                tracing::warn!(path = %dump_path.display(), error = %e, "Failed to dump HTML");
            } else {
                tracing::info!(path = %dump_path.display(), "Dumped HTML for inspection");
            }
        }

        Ok(ProfilePage { url, html })
    }
}

#[async_trait]
impl Sampler for BrowserSampler {
    async fn fetch(&self, credential: &Credential) -> Result<u64, SampleError> {
        let cookies = cookies::decode(credential, &self.config.cookie_domain)?
            .iter()
            .map(to_cookie_param)
            .collect::<Result<Vec<_>, _>>()?;

        let page = self.fetch_profile_page(cookies).await?;
        let count = Self::inspect_page(&self.config.username, Some(&page.url), &page.html)?;

        tracing::info!(username = %self.config.username, count, "Sampled follower count");
        Ok(count)
    }
}

/// Convert a decoded cookie into a CDP cookie parameter.
fn to_cookie_param(cookie: &SessionCookie) -> Result<CookieParam, SampleError> {
    let same_site = match cookie.same_site {
        SameSite::Strict => CookieSameSite::Strict,
        SameSite::Lax => CookieSameSite::Lax,
        SameSite::None => CookieSameSite::None,
    };

    let mut builder = CookieParam::builder()
        .name(cookie.name.as_str())
        .value(cookie.value.as_str())
        .domain(cookie.domain.as_str())
        .path(cookie.path.as_str())
        .secure(cookie.secure)
        .http_only(cookie.http_only)
        .same_site(same_site);

    if let Some(expires) = cookie.expires {
        builder = builder.expires(TimeSinceEpoch::new(expires));
    }

    builder
        .build()
        .map_err(|e| SampleError::Auth(format!("Failed to build cookie {}: {e}", cookie.name)))
}

fn browser_err(e: impl std::fmt::Display) -> SampleError {
    SampleError::Browser(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScrapeError;

    const PROFILE: &str = r#"<html><body>
        <a href="/rustlang/verified_followers"><span>1,234</span> <span>Followers</span></a>
    </body></html>"#;

    #[test]
    fn test_profile_url() {
        let sampler = BrowserSampler::new(SamplerConfig {
            username: "rustlang".to_string(),
            base_url: "https://x.com/".to_string(),
            ..SamplerConfig::default()
        });
        assert_eq!(sampler.profile_url(), "https://x.com/rustlang");
    }

    #[test]
    fn test_inspect_page_reads_count() {
        let count =
            BrowserSampler::inspect_page("rustlang", Some("https://x.com/rustlang"), PROFILE).unwrap();
        assert_eq!(count, 1234);
    }

    #[test]
    fn test_inspect_page_login_redirect() {
        let err = BrowserSampler::inspect_page(
            "rustlang",
            Some("https://x.com/i/flow/login?redirect_after_login=%2Frustlang"),
            PROFILE,
        )
        .unwrap_err();
        assert!(matches!(err, SampleError::Auth(_)));
    }

    #[test]
    fn test_inspect_page_login_wall() {
        let html = r#"<html><body><div data-testid="loginButton">Log in</div></body></html>"#;
        let err = BrowserSampler::inspect_page("rustlang", None, html).unwrap_err();
        assert!(matches!(err, SampleError::Auth(_)));
    }

    #[test]
    fn test_inspect_page_layout_change() {
        let err = BrowserSampler::inspect_page("rustlang", None, "<html></html>").unwrap_err();
        assert!(matches!(
            err,
            SampleError::Scrape(ScrapeError::ElementNotFound { .. })
        ));
    }

    #[test]
    fn test_cookie_param_conversion() {
        let cookie = SessionCookie {
            name: "auth_token".to_string(),
            value: "abc".to_string(),
            domain: ".x.com".to_string(),
            path: "/".to_string(),
            secure: true,
            http_only: true,
            same_site: SameSite::Lax,
            expires: Some(1_893_456_000.0),
        };

        let param = to_cookie_param(&cookie).unwrap();
        assert_eq!(param.name, "auth_token");
        assert_eq!(param.domain.as_deref(), Some(".x.com"));
        assert_eq!(param.same_site, Some(CookieSameSite::Lax));
    }
}
