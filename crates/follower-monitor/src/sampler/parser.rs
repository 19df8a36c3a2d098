//! Follower count extraction from profile page HTML.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::ScrapeError;

/// Link suffixes that lead to a profile's follower list.
const FOLLOWER_PATHS: &[&str] = &["followers", "verified_followers"];

/// Markup that only appears when X shows the logged-out wall.
const LOGIN_WALL_SELECTOR: &str =
    "[data-testid='loginButton'], a[href='/login'], a[href='/i/flow/login']";

/// Leading count token: digits with grouping commas and an optional
/// fraction, then a compact suffix only when no lowercase letter follows it
/// (`12.5K`, `12.5KFollowers`, but not the `M` of `10 Mutual`).
static COUNT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d[\d,]*(?:\.\d+)?)(?:([KkMmBb])(?:[^a-z]|$))?")
        .expect("Invalid count pattern")
});

/// Parser for X profile page HTML.
pub struct FollowerCountParser;

impl FollowerCountParser {
    /// Extract the follower count for `username` from a rendered profile page.
    ///
    /// The count comes from the profile's `/<username>/followers` (or
    /// `/verified_followers`) link, whose text reads like `1,234 Followers`.
    pub fn parse(html: &str, username: &str) -> Result<u64, ScrapeError> {
        let document = Html::parse_document(html);
        let link_selector = Selector::parse("a[href]").expect("Invalid link selector");

        let link = document
            .select(&link_selector)
            .find(|el| Self::is_followers_link(el, username));

        let Some(link) = link else {
            tracing::warn!(
                username,
                "No followers link found. The page may not have rendered or X markup may have changed."
            );
            return Err(ScrapeError::ElementNotFound {
                username: username.to_string(),
                selector: format!("a[href='/{username}/followers']"),
            });
        };

        // The number sits in its own span; adjacent label text may follow
        // without whitespace once nodes are joined.
        let text = link
            .text()
            .map(str::trim)
            .find(|node| !node.is_empty())
            .unwrap_or_default();
        tracing::debug!(text, "Found followers link");
        Self::parse_count(text)
    }

    /// Whether the page is the logged-out wall rather than a profile.
    pub fn is_login_wall(html: &str) -> bool {
        let document = Html::parse_document(html);
        let selector = Selector::parse(LOGIN_WALL_SELECTOR).expect("Invalid login wall selector");
        document.select(&selector).next().is_some()
    }

    /// Parse the leading number of a count label.
    ///
    /// Accepts grouping commas (`1,234`) and compact suffixes
    /// (`12.5K`, `1.2M`, `3B`). Label text may follow the number directly
    /// (`1,234Followers`); the whole number is always read.
    pub fn parse_count(text: &str) -> Result<u64, ScrapeError> {
        let not_numeric = || ScrapeError::NotNumeric {
            text: text.trim().to_string(),
        };

        let captures = COUNT_PATTERN.captures(text).ok_or_else(not_numeric)?;

        let digits = captures
            .get(1)
            .map(|m| m.as_str().replace(',', ""))
            .ok_or_else(not_numeric)?;

        let multiplier: u64 = match captures.get(2).map(|m| m.as_str().to_ascii_uppercase()) {
            Some(suffix) if suffix == "K" => 1_000,
            Some(suffix) if suffix == "M" => 1_000_000,
            Some(suffix) if suffix == "B" => 1_000_000_000,
            _ => 1,
        };

        if multiplier == 1 {
            return digits.parse::<u64>().map_err(|_| not_numeric());
        }

        let value: f64 = digits.parse().map_err(|_| not_numeric())?;
        let scaled = (value * multiplier as f64).round();
        if scaled.is_finite() && scaled >= 0.0 && scaled < u64::MAX as f64 {
            Ok(scaled as u64)
        } else {
            Err(not_numeric())
        }
    }

    /// Check whether an anchor points at `username`'s follower list.
    fn is_followers_link(el: &ElementRef<'_>, username: &str) -> bool {
        el.value()
            .attr("href")
            .and_then(Self::split_profile_path)
            .is_some_and(|(user, section)| {
                user.eq_ignore_ascii_case(username) && FOLLOWER_PATHS.contains(&section)
            })
    }

    /// Split `/user/section` (relative or absolute) into its two parts.
    fn split_profile_path(href: &str) -> Option<(&str, &str)> {
        let path = match href.find("://") {
            Some(scheme_end) => {
                let rest = &href[scheme_end + 3..];
                &rest[rest.find('/')?..]
            }
            None => href,
        };
        let path = path.split(['?', '#']).next().unwrap_or(path);

        let mut parts = path.trim_matches('/').split('/');
        let user = parts.next()?;
        let section = parts.next()?;
        if parts.next().is_some() || user.is_empty() {
            return None;
        }
        Some((user, section))
    }
}
