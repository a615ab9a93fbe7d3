//! Spotify Web API HTTP client
//!
//! Authenticates with the client-credentials flow (no user login), which is
//! enough for public tracks, albums and playlists.
//! See: https://developer.spotify.com/documentation/web-api/tutorials/client-credentials-flow
//!
//! The client is an explicit handle: create one per run and pass it to
//! whoever needs catalog access. Tokens are cached on the handle.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;

use super::{adapter, dto};
use crate::catalog::{CatalogError, CatalogRef, parse_catalog_url};
use crate::model::{CatalogEntity, CatalogTrack, EntityKind};

/// Refresh tokens a little before Spotify expires them.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// User agent string
const USER_AGENT: &str = concat!("tunefetch/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Spotify Web API client
pub struct SpotifyClient {
    http_client: reqwest::Client,
    client_id: String,
    client_secret: String,
    api_url: String,
    accounts_url: String,
    token: Mutex<Option<CachedToken>>,
}

impl SpotifyClient {
    /// Create a new client from application credentials
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self, CatalogError> {
        let client_id = client_id.into();
        let client_secret = client_secret.into();
        if client_id.trim().is_empty() || client_secret.trim().is_empty() {
            return Err(CatalogError::MissingCredentials);
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            client_id,
            client_secret,
            api_url: "https://api.spotify.com/v1".to_string(),
            accounts_url: "https://accounts.spotify.com".to_string(),
            token: Mutex::new(None),
        })
    }

    /// Resolve a catalog URL into its title and tracks
    pub async fn fetch_entity(&self, url: &str) -> Result<CatalogEntity, CatalogError> {
        let CatalogRef { kind, id } = parse_catalog_url(url)?;
        tracing::info!(%kind, %id, "Fetching catalog entity");

        let (title, tracks) = match kind {
            EntityKind::Track => {
                let track = self.track(&id).await?;
                (track.name.clone(), vec![track])
            }
            EntityKind::Album => self.album(&id).await?,
            EntityKind::Playlist => self.playlist(&id).await?,
        };

        tracing::info!(%kind, %title, tracks = tracks.len(), "Resolved catalog entity");
        Ok(CatalogEntity {
            kind,
            title,
            tracks,
        })
    }

    /// Look up a single track
    pub async fn track(&self, id: &str) -> Result<CatalogTrack, CatalogError> {
        let url = format!("{}/tracks/{}", self.api_url, id);
        let track: dto::Track = self.get_json(&url).await?;
        adapter::to_catalog_track(track)
            .ok_or_else(|| CatalogError::NotFound(format!("track {} has no usable metadata", id)))
    }

    /// Look up an album and all of its tracks
    pub async fn album(&self, id: &str) -> Result<(String, Vec<CatalogTrack>), CatalogError> {
        let url = format!("{}/albums/{}", self.api_url, id);
        let album: dto::Album = self.get_json(&url).await?;

        let mut items = album.tracks.items;
        let mut next = album.tracks.next;
        while let Some(page_url) = next {
            let page: dto::Paging<dto::Track> = self.get_json(&page_url).await?;
            items.extend(page.items);
            next = page.next;
        }

        let context = adapter::AlbumContext {
            name: &album.name,
            images: &album.images,
        };
        let tracks = items
            .into_iter()
            .filter_map(|t| adapter::to_album_track(t, &context))
            .collect();

        Ok((album.name.clone(), tracks))
    }

    /// Look up a playlist and all of its tracks
    pub async fn playlist(&self, id: &str) -> Result<(String, Vec<CatalogTrack>), CatalogError> {
        let url = format!("{}/playlists/{}", self.api_url, id);
        let playlist: dto::Playlist = self.get_json(&url).await?;

        let mut items = playlist.tracks.items;
        let mut next = playlist.tracks.next;
        while let Some(page_url) = next {
            let page: dto::Paging<dto::PlaylistItem> = self.get_json(&page_url).await?;
            items.extend(page.items);
            next = page.next;
        }

        let tracks = items
            .into_iter()
            .filter_map(adapter::from_playlist_item)
            .collect();

        Ok((playlist.name, tracks))
    }

    /// Send an authenticated GET and parse the JSON body
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, CatalogError> {
        let token = self.access_token().await?;

        let response = self
            .http_client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        let response = check_status(response, url)?;

        response
            .json::<T>()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))
    }

    /// The cached token, if it is still valid
    fn cached_token(&self) -> Option<String> {
        let guard = self.token.lock();
        guard
            .as_ref()
            .filter(|token| token.expires_at > Instant::now())
            .map(|token| token.value.clone())
    }

    /// Return a cached token, requesting a new one when it is missing or stale
    async fn access_token(&self) -> Result<String, CatalogError> {
        if let Some(token) = self.cached_token() {
            return Ok(token);
        }

        let url = format!("{}/api/token", self.accounts_url);
        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body("grant_type=client_credentials")
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST || status == reqwest::StatusCode::UNAUTHORIZED
        {
            return Err(CatalogError::Auth(format!(
                "token request rejected (HTTP {})",
                status
            )));
        }
        let response = check_status(response, &url)?;

        let token: dto::TokenResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        *self.token.lock() = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        tracing::debug!(expires_in = token.expires_in, "Obtained catalog access token");
        Ok(token.access_token)
    }
}

/// Map non-success HTTP statuses to catalog errors
fn check_status(response: reqwest::Response, url: &str) -> Result<reqwest::Response, CatalogError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    Err(match status {
        reqwest::StatusCode::NOT_FOUND => CatalogError::NotFound(url.to_string()),
        reqwest::StatusCode::UNAUTHORIZED => CatalogError::Auth(format!("HTTP {}", status)),
        reqwest::StatusCode::TOO_MANY_REQUESTS => CatalogError::RateLimited,
        _ => CatalogError::Api(format!(
            "HTTP {}: {}",
            status,
            status.canonical_reason().unwrap_or("Unknown")
        )),
    })
}
