//! Resolution of a watch page into playable variants.
//!
//! A resolution walks these stages in order, each attempted exactly once:
//!
//! 1. log in, when credentials are given (failure is only a warning)
//! 2. scrape the watch page for the resource id and generation token
//! 3. exchange those for a session context
//! 4. exchange the context for the stream descriptor
//! 5. refuse DRM protected streams, otherwise hand the manifest URL to the
//!    playlist parser
//!
//! Every attempt ends in exactly one of [`Resolution::Resolved`],
//! [`Resolution::Unresolved`] or a [`ResolveError`].

use std::fmt;

use url::Url;

use crate::{
    auth::{self, Credentials},
    context::{self, ContextError},
    hls::{HlsError, HlsVariantParser, PlaylistParser, Variant},
    matcher,
    page::{self, ScrapeError, ScrapeOutcome},
    stream_data::{self, StreamDataError},
    util::{ClientConfig, HttpClient, Transport},
};

pub const DEFAULT_SERVICE_ID: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionRequest {
    pub page_url: Url,
    pub credentials: Option<Credentials>,
    pub service_id: u32,
}

impl ResolutionRequest {
    pub fn new(page_url: Url) -> Self {
        Self {
            page_url,
            credentials: None,
            service_id: DEFAULT_SERVICE_ID,
        }
    }

    /// Parse `url` and check that it is a watch page.
    pub fn parse(url: &str) -> Result<Self, ResolveError> {
        if !matcher::can_handle_url(url) {
            return Err(ResolveError::UnsupportedUrl(url.to_string()));
        }
        let page_url = Url::parse(url).map_err(|_| ResolveError::UnsupportedUrl(url.to_string()))?;
        Ok(Self::new(page_url))
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_service(mut self, service_id: u32) -> Self {
        self.service_id = service_id;
        self
    }
}

/// Expected reasons a page cannot be played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unresolved {
    NeedsLogin,
    DrmProtected,
    NoStreamFound,
}

impl Unresolved {
    pub fn guidance(&self) -> &'static str {
        match self {
            Unresolved::NeedsLogin => "You need to login with a TVPlayer account to view this stream",
            Unresolved::DrmProtected => "This stream is protected by DRM and cannot be played",
            Unresolved::NoStreamFound => "No stream information found on the page",
        }
    }
}

impl fmt::Display for Unresolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Unresolved::NeedsLogin => "needs-login",
            Unresolved::DrmProtected => "drm-protected",
            Unresolved::NoStreamFound => "no-stream-found",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved {
        manifest_url: Url,
        variants: Vec<Variant>,
    },
    Unresolved(Unresolved),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Skipped,
    LoggedIn,
    /// Resolution continues without an account.
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Page,
    PostcodeUpdate,
    Context,
    StreamData,
    Playlist,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Page => "watch page",
            Stage::PostcodeUpdate => "postcode update",
            Stage::Context => "context",
            Stage::StreamData => "stream data",
            Stage::Playlist => "playlist",
        })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
    #[error("not a TVPlayer watch page: {0}")]
    UnsupportedUrl(String),
    #[error(transparent)]
    Scrape(#[from] ScrapeError),
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    StreamData(#[from] StreamDataError),
    #[error(transparent)]
    Playlist(#[from] HlsError),
}

impl ResolveError {
    /// The stage that failed, `None` if nothing was requested.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ResolveError::UnsupportedUrl(_) => None,
            ResolveError::Scrape(ScrapeError::Page(_)) => Some(Stage::Page),
            ResolveError::Scrape(ScrapeError::PostcodeUpdate(_)) => Some(Stage::PostcodeUpdate),
            ResolveError::Context(_) => Some(Stage::Context),
            ResolveError::StreamData(_) => Some(Stage::StreamData),
            ResolveError::Playlist(_) => Some(Stage::Playlist),
        }
    }
}

/// Runs resolutions over one HTTP session. Use a separate resolver per
/// flow unless the flows should share a login.
pub struct Resolver<T, P = HlsVariantParser> {
    transport: T,
    parser: P,
}

impl Resolver<HttpClient, HlsVariantParser> {
    pub fn with_config(config: &ClientConfig) -> reqwest::Result<Self> {
        Ok(Self::new(HttpClient::new(config)?, HlsVariantParser))
    }
}

impl<T, P> Resolver<T, P>
where
    T: Transport,
    P: PlaylistParser,
{
    pub fn new(transport: T, parser: P) -> Self {
        Self { transport, parser }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn authenticate(&self, credentials: Option<&Credentials>) -> AuthOutcome {
        let Some(credentials) = credentials else {
            return AuthOutcome::Skipped;
        };

        let outcome = match auth::login(&self.transport, credentials).await {
            Ok(true) => AuthOutcome::LoggedIn,
            Ok(false) => AuthOutcome::Failed("login was rejected".to_string()),
            Err(e) => AuthOutcome::Failed(e.to_string()),
        };

        match &outcome {
            AuthOutcome::Failed(reason) => {
                warn!("Failed to login as {}: {}", credentials.email, reason)
            }
            _ => debug!("Logged in as {}", credentials.email),
        }

        outcome
    }

    pub async fn resolve(&self, request: &ResolutionRequest) -> Result<Resolution, ResolveError> {
        let url = request.page_url.as_str();
        if !matcher::can_handle_url(url) {
            return Err(ResolveError::UnsupportedUrl(url.to_string()));
        }
        debug!(
            "Resolving {} (channel: {})",
            url,
            matcher::channel_slug(url).unwrap_or("default")
        );

        if let AuthOutcome::Failed(_) = self.authenticate(request.credentials.as_ref()).await {
            debug!("Continuing without an account");
        }

        let attrs = match page::scrape(&self.transport, &request.page_url).await? {
            ScrapeOutcome::Found(attrs) => attrs,
            ScrapeOutcome::LoginRequired => return Ok(unresolved(Unresolved::NeedsLogin)),
            ScrapeOutcome::NoAttributes => return Ok(unresolved(Unresolved::NoStreamFound)),
        };

        let context = context::resolve_context(&self.transport, &attrs.resource, &attrs.token).await?;
        let descriptor = stream_data::fetch_stream_data(
            &self.transport,
            &context,
            &attrs.resource,
            request.service_id,
        )
        .await?;

        if descriptor.is_drm_protected() {
            return Ok(unresolved(Unresolved::DrmProtected));
        }

        debug!("Manifest URL: {}", descriptor.manifest_url);
        let variants = self
            .parser
            .parse_variants(&self.transport, &descriptor.manifest_url)
            .await?;

        Ok(Resolution::Resolved {
            manifest_url: descriptor.manifest_url,
            variants,
        })
    }
}

fn unresolved(reason: Unresolved) -> Resolution {
    warn!("{}", reason.guidance());
    Resolution::Unresolved(reason)
}
