//! Advice-server HTTP client.
//!
//! Talks to the backend for the known-game catalog and screen analysis.
//! One explicitly configured `reqwest` client, generous timeouts for the
//! image-carrying analysis request.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A catalog entry describing a game the scanner should look for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub process_name: String,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Screen-analysis request payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenAnalysisRequest {
    /// Base64-encoded PNG of the game client area.
    pub image: String,
    pub game_name: String,
    pub prompt: String,
}

/// Screen-analysis result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenAnalysisResponse {
    #[serde(default)]
    pub analysis: String,
    pub success: bool,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone)]
pub enum AdviceError {
    /// Transport-level failure (connect, timeout, TLS).
    Http { message: String },
    /// Non-2xx response from the server.
    Status { code: u16 },
    /// Body could not be decoded.
    Decode { message: String },
    /// Screen capture failed before the request was sent.
    Capture { message: String },
}

impl AdviceError {
    pub fn http(message: impl Into<String>) -> Self {
        Self::Http {
            message: message.into(),
        }
    }

    pub fn capture(message: impl Into<String>) -> Self {
        Self::Capture {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for AdviceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http { message } => write!(f, "request failed: {message}"),
            Self::Status { code } => write!(f, "server returned status {code}"),
            Self::Decode { message } => write!(f, "invalid response: {message}"),
            Self::Capture { message } => write!(f, "screen capture failed: {message}"),
        }
    }
}

impl std::error::Error for AdviceError {}

impl From<reqwest::Error> for AdviceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::decode(err.to_string());
        }
        if let Some(status) = err.status() {
            return Self::Status {
                code: status.as_u16(),
            };
        }
        Self::http(err.to_string())
    }
}

/// Prompt sent along with a captured screen.
pub fn strategy_prompt(game_name: &str) -> String {
    format!(
        "Analyze this {game_name} screenshot and give the player concrete, \
         actionable coaching. Cover: 1) what the current situation is, \
         2) what to do next, 3) one mistake to avoid, 4) how to spend \
         resources (gold, cooldowns, items) right now. Keep it short and \
         specific to what is visible on screen."
    )
}

/// Canned opener matched on the game name. Used before any server
/// round-trip has happened.
pub fn quick_tip(game_name: &str) -> &'static str {
    let name = game_name.to_lowercase();
    if name.contains("league") || name.contains("lol") {
        "Keep an eye on the minimap! Ward the river before objectives spawn."
    } else if name.contains("overwatch") {
        "Stick with your team! Trading one-for-one rarely wins fights."
    } else if name.contains("minecraft") {
        "Never dig straight down! And keep a water bucket handy."
    } else if name.contains("valorant") {
        "Check your economy before buying. A coordinated save beats a half-buy."
    } else if name.contains("steam") {
        "Pick something from your backlog. The best game is the one you play!"
    } else {
        "Take it one step at a time. You've got this!"
    }
}

#[derive(Clone)]
pub struct AdviceClient {
    http: reqwest::Client,
    base_url: String,
}

impl AdviceClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(8)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the known-game catalog. Callers treat a failure as an empty
    /// catalog; tracking simply finds nothing until the next fetch.
    pub async fn fetch_games(&self) -> Result<Vec<Game>, AdviceError> {
        let url = format!("{}/games", self.base_url);
        let response = self.http.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(AdviceError::Status {
                code: response.status().as_u16(),
            });
        }
        Ok(response.json().await?)
    }

    /// Submit a captured screen for analysis.
    pub async fn analyze_screen(
        &self,
        request: &ScreenAnalysisRequest,
    ) -> Result<ScreenAnalysisResponse, AdviceError> {
        let url = format!("{}/advice/screen", self.base_url);
        let response = self.http.post(&url).json(request).send().await?;

        if !response.status().is_success() {
            log::warn!("screen analysis request failed: {}", response.status());
            return Err(AdviceError::Status {
                code: response.status().as_u16(),
            });
        }
        Ok(response.json().await?)
    }
}
