// ABOUTME: CalendarTool - read-only Google Calendar access over REST.
// ABOUTME: Handles the OAuth2 code flow and persists the token as JSON.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::tool::{Tool, ToolResult};

const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const EVENTS_ENDPOINT: &str =
    "https://www.googleapis.com/calendar/v3/calendars/primary/events";
const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";

const MAX_RESULTS_CAP: u32 = 50;

/// Persisted OAuth2 token.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OauthToken {
    access_token: String,
    #[serde(default)]
    token_type: String,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    expiry: Option<DateTime<Utc>>,
}

impl OauthToken {
    fn is_expired(&self) -> bool {
        match self.expiry {
            Some(expiry) => expiry <= Utc::now() + chrono::Duration::seconds(10),
            None => false,
        }
    }
}

/// Token-exchange response from Google's token endpoint.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: String,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<Event>,
}

#[derive(Deserialize)]
struct Event {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    start: EventTime,
}

#[derive(Deserialize, Default)]
struct EventTime {
    #[serde(rename = "dateTime", default)]
    date_time: String,
    // All-day events carry a bare date instead.
    #[serde(default)]
    date: String,
}

/// Tool providing read access to the user's Google Calendar.
pub struct CalendarTool {
    client_id: String,
    client_secret: String,
    redirect_url: String,
    token_file: String,
    http: reqwest::Client,
    token: RwLock<Option<OauthToken>>,
}

impl CalendarTool {
    /// Create a new calendar tool with OAuth client credentials.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_url: impl Into<String>,
        token_file: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_url: redirect_url.into(),
            token_file: token_file.into(),
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("failed to build HTTP client"),
            token: RwLock::new(None),
        }
    }

    /// Load a persisted token if one exists.
    ///
    /// Returns an auth URL if the user still needs to authenticate, None if
    /// already authenticated.
    pub async fn init(&self) -> anyhow::Result<Option<String>> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            anyhow::bail!("GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET are required");
        }

        match self.token_from_file() {
            Ok(token) => {
                *self.token.write().await = Some(token);
                Ok(None)
            }
            Err(_) => Ok(Some(self.auth_url())),
        }
    }

    /// The URL the user visits to authorize calendar access.
    pub fn auth_url(&self) -> String {
        let url = reqwest::Url::parse_with_params(
            AUTH_ENDPOINT,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", CALENDAR_SCOPE),
                ("access_type", "offline"),
                ("state", "state-token"),
            ],
        )
        .expect("static auth endpoint is valid");
        url.to_string()
    }

    /// Finish the OAuth flow with the authorization code.
    pub async fn complete_auth(&self, auth_code: &str) -> anyhow::Result<()> {
        let token = self
            .exchange(&[
                ("code", auth_code),
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
                ("redirect_uri", &self.redirect_url),
                ("grant_type", "authorization_code"),
            ])
            .await?;

        self.save_token(&token)?;
        *self.token.write().await = Some(token);
        info!("calendar authenticated");
        Ok(())
    }

    async fn exchange(&self, form: &[(&str, &str)]) -> anyhow::Result<OauthToken> {
        let response = self.http.post(TOKEN_ENDPOINT).form(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("token exchange failed ({status}): {body}");
        }

        let parsed: TokenResponse = response.json().await?;
        Ok(OauthToken {
            access_token: parsed.access_token,
            token_type: parsed.token_type,
            refresh_token: parsed.refresh_token,
            expiry: parsed
                .expires_in
                .map(|secs| Utc::now() + chrono::Duration::seconds(secs)),
        })
    }

    /// Get a usable access token, refreshing a stale one when possible.
    async fn access_token(&self) -> anyhow::Result<Option<String>> {
        let current = { self.token.read().await.clone() };
        let Some(token) = current else {
            return Ok(None);
        };

        if !token.is_expired() {
            return Ok(Some(token.access_token));
        }
        if token.refresh_token.is_empty() {
            return Ok(None);
        }

        debug!("refreshing calendar token");
        let mut refreshed = self
            .exchange(&[
                ("refresh_token", token.refresh_token.as_str()),
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
                ("grant_type", "refresh_token"),
            ])
            .await?;

        // Google omits the refresh token on refresh responses.
        if refreshed.refresh_token.is_empty() {
            refreshed.refresh_token = token.refresh_token;
        }

        self.save_token(&refreshed)?;
        let access = refreshed.access_token.clone();
        *self.token.write().await = Some(refreshed);
        Ok(Some(access))
    }

    fn token_from_file(&self) -> anyhow::Result<OauthToken> {
        let data = std::fs::read_to_string(&self.token_file)?;
        Ok(serde_json::from_str(&data)?)
    }

    fn save_token(&self, token: &OauthToken) -> anyhow::Result<()> {
        let data = serde_json::to_string(token)?;
        std::fs::write(&self.token_file, data)?;
        Ok(())
    }
}

fn format_events(events: &[Event]) -> String {
    let mut out = format!("Found {} upcoming events:\n\n", events.len());

    for event in events {
        let start = if event.start.date_time.is_empty() {
            &event.start.date
        } else {
            &event.start.date_time
        };

        let when = match DateTime::parse_from_rfc3339(start) {
            Ok(t) => t.format("%a %b %-d, %-I:%M %p").to_string(),
            Err(_) => start.clone(),
        };

        out.push_str(&format!("• {} - {}\n", when, event.summary));
        if !event.location.is_empty() {
            out.push_str(&format!("  📍 {}\n", event.location));
        }
    }

    out
}

#[async_trait]
impl Tool for CalendarTool {
    fn name(&self) -> &str {
        "get_calendar_events"
    }

    fn description(&self) -> &str {
        "Get upcoming events from the user's Google Calendar. Can specify how many events to retrieve (default 10) and how many days ahead to look (default 7)."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "max_results": {
                    "type": "integer",
                    "description": "Maximum number of events to return (default 10, max 50)"
                },
                "days_ahead": {
                    "type": "integer",
                    "description": "How many days ahead to look for events (default 7)"
                }
            },
            "required": []
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<ToolResult, anyhow::Error> {
        let Some(access_token) = self.access_token().await? else {
            return Ok(ToolResult::text(
                "Calendar not authenticated. Run :auth to connect your Google Calendar.",
            ));
        };

        let max_results = params["max_results"]
            .as_u64()
            .map(|v| (v as u32).min(MAX_RESULTS_CAP))
            .unwrap_or(10);
        let days_ahead = params["days_ahead"].as_i64().unwrap_or(7);

        let now = Utc::now();
        let time_min = now.to_rfc3339_opts(SecondsFormat::Secs, true);
        let time_max = (now + chrono::Duration::days(days_ahead))
            .to_rfc3339_opts(SecondsFormat::Secs, true);

        let response = self
            .http
            .get(EVENTS_ENDPOINT)
            .bearer_auth(&access_token)
            .query(&[
                ("singleEvents", "true"),
                ("showDeleted", "false"),
                ("orderBy", "startTime"),
                ("timeMin", &time_min),
                ("timeMax", &time_max),
                ("maxResults", &max_results.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("retrieving events failed ({status}): {body}");
        }

        let events: EventList = response.json().await?;
        if events.items.is_empty() {
            return Ok(ToolResult::text("No upcoming events found."));
        }

        Ok(ToolResult::text(format_events(&events.items)))
    }
}
