//! Watch page scraping.
//!
//! The watch page embeds the channel's resource id and a generation token
//! as `data-*` attributes on the player element. Some accounts are shown a
//! postcode form instead until a location has been saved, and some
//! channels are only shown to logged in users.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::util::{Transport, TransportError};

pub const UPDATE_URL: &str = "https://tvplayer.com/account/update-detail";

/// Postcode saved when the site asks for one (ITV HQ, London).
pub const FALLBACK_POSTCODE: &str = "SE1 9LT";

const POSTCODE_MARKER: &str = "enter your postcode";
const LOGIN_REQUIRED_MARKER: &str = "need to login";

static DATA_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)data-([A-Za-z0-9_-]+)\s*=\s*(?:"(.*?)"|'(.*?)')"#)
        .expect("data attribute pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageAttributes {
    pub resource: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeOutcome {
    Found(PageAttributes),
    /// The page says the channel is only available to logged in users.
    LoginRequired,
    NoAttributes,
}

#[derive(thiserror::Error, Debug)]
pub enum ScrapeError {
    #[error("could not fetch watch page: {0}")]
    Page(#[source] TransportError),
    #[error("could not submit postcode: {0}")]
    PostcodeUpdate(#[source] TransportError),
}

/// Collect the `data-<name>` attributes listed in `names` from raw markup.
///
/// Tolerates whitespace and line breaks around `=` and inside values, and
/// either quote style. Later occurrences win.
pub fn extract_data_attributes(html: &str, names: &[&str]) -> HashMap<String, String> {
    DATA_ATTR_RE
        .captures_iter(html)
        .filter_map(|c| {
            let name = c.get(1)?.as_str();
            if !names.contains(&name) {
                return None;
            }
            let value = c.get(2).or_else(|| c.get(3))?.as_str();
            Some((name.to_string(), value.trim_matches('"').to_string()))
        })
        .collect()
}

/// The site redirects https watch pages to http, so go there directly.
pub fn normalize_url(url: &Url) -> Url {
    let mut url = url.clone();
    if url.scheme() == "https" && url.set_scheme("http").is_err() {
        warn!("Could not downgrade {} to http", url);
    }
    url
}

pub async fn scrape<T>(transport: &T, page_url: &Url) -> Result<ScrapeOutcome, ScrapeError>
where
    T: Transport + ?Sized,
{
    let url = normalize_url(page_url);
    let mut page = transport
        .get(url.as_str(), &[])
        .await
        .and_then(|resp| resp.error_for_status())
        .map_err(ScrapeError::Page)?;

    if page.body.contains(POSTCODE_MARKER) {
        info!(
            "Setting your postcode to: {}. This can be changed in the settings on tvplayer.com",
            FALLBACK_POSTCODE
        );
        // Redirects back to the watch page, which now has the player.
        page = transport
            .post_form(
                UPDATE_URL,
                &[("return_url", url.as_str())],
                &[("postcode", FALLBACK_POSTCODE)],
                true,
            )
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(ScrapeError::PostcodeUpdate)?;
    }

    let mut attrs = extract_data_attributes(&page.body, &["resource", "token"]);
    match (attrs.remove("resource"), attrs.remove("token")) {
        (Some(resource), Some(token)) => Ok(ScrapeOutcome::Found(PageAttributes { resource, token })),
        _ if page.body.contains(LOGIN_REQUIRED_MARKER) => Ok(ScrapeOutcome::LoginRequired),
        _ => Ok(ScrapeOutcome::NoAttributes),
    }
}
