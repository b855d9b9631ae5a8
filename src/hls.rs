use async_trait::async_trait;
use m3u8_rs::{MasterPlaylist, Playlist};
use url::Url;

use crate::util::{Transport, TransportError};

/// One playable rendition of a live channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    /// Short quality label, e.g. `720p` or `1200k`.
    pub name: String,
    pub url: Url,
    pub bandwidth: u64,
    pub resolution: Option<(u64, u64)>,
    pub codecs: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum HlsError {
    #[error("could not fetch playlist: {0}")]
    Transport(#[from] TransportError),
    #[error("could not parse playlist: {0}")]
    Parse(String),
    #[error("invalid variant uri: {0}")]
    InvalidUri(#[from] url::ParseError),
}

/// Turns a manifest URL into the variants a player can pick from.
#[async_trait]
pub trait PlaylistParser: Send + Sync {
    async fn parse_variants(
        &self,
        transport: &dyn Transport,
        manifest_url: &Url,
    ) -> Result<Vec<Variant>, HlsError>;
}

/// Reads `EXT-X-STREAM-INF` entries from an HLS master playlist.
#[derive(Debug, Default, Clone, Copy)]
pub struct HlsVariantParser;

#[async_trait]
impl PlaylistParser for HlsVariantParser {
    async fn parse_variants(
        &self,
        transport: &dyn Transport,
        manifest_url: &Url,
    ) -> Result<Vec<Variant>, HlsError> {
        let resp = transport
            .get(manifest_url.as_str(), &[])
            .await?
            .error_for_status()?;

        variants_from_playlist(&resp.body, manifest_url)
    }
}

pub fn variants_from_playlist(body: &str, manifest_url: &Url) -> Result<Vec<Variant>, HlsError> {
    let playlist = m3u8_rs::parse_playlist_res(body.as_bytes())
        .map_err(|e| HlsError::Parse(e.to_string()))?;

    match playlist {
        Playlist::MasterPlaylist(pl) => master_variants(pl, manifest_url),
        // Already a media playlist, nothing to choose from.
        Playlist::MediaPlaylist(_) => Ok(vec![Variant {
            name: "live".to_string(),
            url: manifest_url.clone(),
            bandwidth: 0,
            resolution: None,
            codecs: None,
        }]),
    }
}

fn master_variants(playlist: MasterPlaylist, base_url: &Url) -> Result<Vec<Variant>, HlsError> {
    let mut variants: Vec<Variant> = Vec::new();

    for stream in playlist.variants.into_iter().filter(|v| !v.is_i_frame) {
        let resolution = stream.resolution.map(|r| (r.width, r.height));
        let mut name = match resolution {
            Some((_, height)) => format!("{}p", height),
            None => format!("{}k", stream.bandwidth / 1000),
        };
        while variants.iter().any(|v| v.name == name) {
            name.push_str("_alt");
        }

        variants.push(Variant {
            name,
            url: base_url.join(&stream.uri)?,
            bandwidth: stream.bandwidth,
            resolution,
            codecs: stream.codecs,
        });
    }

    Ok(variants)
}
