//! MyPhoner call-tracking client
//!
//! Agents are matched to workers by email. Call statistics are computed
//! locally from the raw call list of one agent within a date window.

use crewdesk_common::models::{emails_match, round_one_decimal};
use crewdesk_common::time::{self, DateRange, StatsInterval};
use crewdesk_common::StatsCounts;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::{build_http_client, describe_failure};
use crate::config::CallStatsSettings;

/// Lower-cased call outcomes that count as a booked meeting
const MEETING_OUTCOMES: &[&str] = &["meeting", "appointment", "booked", "møte", "avtale"];

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Call-stats client errors
#[derive(Debug, Error)]
pub enum CallStatsError {
    #[error("{0}")]
    Configuration(String),

    #[error("Agent not found in MyPhoner: {0}")]
    NotFound(String),

    #[error("MyPhoner request failed: {0}")]
    Connectivity(String),

    #[error("Unexpected MyPhoner response: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Agent {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Call {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub agent_id: Option<u64>,
    #[serde(default)]
    pub outcome: Option<String>,
    /// Seconds
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Call {
    fn is_meeting(&self) -> bool {
        self.outcome
            .as_deref()
            .map(|o| o.trim().to_lowercase())
            .map_or(false, |o| MEETING_OUTCOMES.contains(&o.as_str()))
    }
}

/// Stats for one agent over one window
#[derive(Debug, Clone, PartialEq)]
pub struct AgentStats {
    pub agent: Agent,
    pub range: DateRange,
    pub counts: StatsCounts,
}

pub struct CallStatsClient {
    http_client: reqwest::Client,
    settings: CallStatsSettings,
}

impl CallStatsClient {
    pub fn new(settings: CallStatsSettings, timeout: Duration) -> Result<Self, CallStatsError> {
        let http_client = build_http_client(timeout)
            .map_err(|e| CallStatsError::Configuration(e.to_string()))?;
        Ok(Self {
            http_client,
            settings,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.settings.api_key.is_some()
    }

    pub async fn fetch_agents(&self) -> Result<Vec<Agent>, CallStatsError> {
        self.get_json("/agents", &[]).await
    }

    pub async fn fetch_calls(&self, agent_id: u64, range: DateRange) -> Result<Vec<Call>, CallStatsError> {
        let agent_id = agent_id.to_string();
        let from = range.from.format("%Y-%m-%d").to_string();
        let to = range.to.format("%Y-%m-%d").to_string();
        self.get_json(
            "/calls",
            &[
                ("agent_id", agent_id.as_str()),
                ("from_date", from.as_str()),
                ("to_date", to.as_str()),
            ],
        )
        .await
    }

    /// Stats for the agent whose email matches, over `interval` ending today
    pub async fn fetch_stats_for_member(
        &self,
        email: &str,
        interval: StatsInterval,
    ) -> Result<AgentStats, CallStatsError> {
        let range = interval.date_range(time::today());
        self.fetch_stats_in_range(email, range).await
    }

    pub async fn fetch_stats_in_range(
        &self,
        email: &str,
        range: DateRange,
    ) -> Result<AgentStats, CallStatsError> {
        let agents = self.fetch_agents().await?;
        let agent = agents
            .into_iter()
            .find(|a| emails_match(&a.email, email))
            .ok_or_else(|| CallStatsError::NotFound(email.to_string()))?;

        let calls = self.fetch_calls(agent.id, range).await?;
        let counts = calculate_stats(&calls);

        debug!(
            agent_id = agent.id,
            email = %email,
            from = %range.from,
            to = %range.to,
            calls = counts.total_calls,
            meetings = counts.meetings_booked,
            "Computed agent stats"
        );

        Ok(AgentStats {
            agent,
            range,
            counts,
        })
    }

    /// Succeeds when the agent listing answers 2xx
    pub async fn test_connection(&self) -> Result<(), CallStatsError> {
        self.fetch_agents().await.map(|_| ())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, CallStatsError> {
        let api_key = self.settings.api_key.as_deref().ok_or_else(|| {
            CallStatsError::Configuration("MyPhoner API key not configured".to_string())
        })?;
        let url = format!("{}{}", self.settings.base_url.trim_end_matches('/'), path);

        let response = self
            .http_client
            .get(&url)
            .query(query)
            .bearer_auth(api_key)
            .send()
            .await
            .map_err(|e| CallStatsError::Connectivity(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CallStatsError::Connectivity(describe_failure(response).await));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| CallStatsError::Parse(e.to_string()))
    }
}

/// Aggregate raw calls into counts
///
/// Hours are total duration over 3600, one decimal. Calls without a
/// duration count as zero seconds.
pub fn calculate_stats(calls: &[Call]) -> StatsCounts {
    let total_seconds: f64 = calls.iter().filter_map(|c| c.duration).sum();
    let meetings = calls.iter().filter(|c| c.is_meeting()).count();

    StatsCounts {
        total_calls: calls.len() as u64,
        meetings_booked: meetings as u64,
        hours_called: round_one_decimal(total_seconds / SECONDS_PER_HOUR),
    }
}
