use audiopick_core::{AudioServerConfig, AudioSource, AudioSourceProvider, CoreError, Identifier};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Connect timeout, kept short since the audio server runs on the local machine
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Local audio server provider (the server behind `?term=&reading=` lookups)
pub struct LocalAudioProvider {
    client: Client,
    base_url: String,
}

/// Response from the lookup endpoint. Extra fields are ignored.
#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(rename = "audioSources")]
    audio_sources: Vec<AudioSource>,
}

impl LocalAudioProvider {
    /// Create a provider for the configured server with its request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &AudioServerConfig) -> Result<Self, CoreError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(CONNECT_TIMEOUT.min(config.timeout()))
            .build()
            .map_err(|e| CoreError::ConfigInvalid {
                message: format!("cannot create audio server client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    /// Lookup URL for an identifier; `reading` is only sent when present.
    #[must_use]
    pub fn lookup_url(&self, identifier: &Identifier) -> String {
        let mut url = format!(
            "{}/?term={}",
            self.base_url,
            urlencoding::encode(&identifier.word)
        );
        if let Some(reading) = identifier.reading() {
            url.push_str(&format!("&reading={}", urlencoding::encode(reading)));
        }
        url
    }

    /// Parse a lookup response body, keeping the source order as sent.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ProviderBadResponse`] if the body is not JSON or
    /// has no `audioSources` list.
    pub fn parse_sources(body: &str) -> Result<Vec<AudioSource>, CoreError> {
        serde_json::from_str::<LookupResponse>(body)
            .map(|response| response.audio_sources)
            .map_err(|e| CoreError::ProviderBadResponse {
                reason: e.to_string(),
            })
    }
}

impl AudioSourceProvider for LocalAudioProvider {
    fn name(&self) -> &'static str {
        "local"
    }

    fn fetch_sources(&self, identifier: &Identifier) -> Result<Vec<AudioSource>, CoreError> {
        let url = self.lookup_url(identifier);
        info!("Audio server GET: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| CoreError::ProviderUnreachable {
                reason: e.to_string(),
            })?;
        debug!("Audio server response status: {}", response.status());

        if !response.status().is_success() {
            warn!("Audio server returned status: {}", response.status());
            return Err(CoreError::ProviderBadResponse {
                reason: format!("status {}", response.status()),
            });
        }

        let body = response
            .text()
            .map_err(|e| CoreError::ProviderUnreachable {
                reason: e.to_string(),
            })?;
        let sources = Self::parse_sources(&body)?;
        debug!("Audio server returned {} source(s)", sources.len());
        Ok(sources)
    }

    fn fetch_audio(&self, url: &str) -> Result<Vec<u8>, CoreError> {
        let fetch_error = |reason: String| CoreError::Fetch {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| fetch_error(e.to_string()))?;
        if !response.status().is_success() {
            return Err(fetch_error(format!("status {}", response.status())));
        }

        let bytes = response.bytes().map_err(|e| fetch_error(e.to_string()))?;
        debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}
