use std::collections::HashSet;
use std::env;

use chrono::Duration;
use dotenvy::dotenv;

use crate::domains::matching::models::RosterMember;

/// Startup configuration failures. Fatal: no cycle runs without a valid config.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("invalid roster: {0}")]
    Roster(String),

    #[error("invalid timing: {0}")]
    Timing(String),
}

/// Which message template to send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Initial,
    FollowUp,
    ScheduleCheck,
    CompletionCheck,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageTemplates {
    pub initial: String,
    pub follow_up: String,
    pub schedule_check: String,
    pub completion_check: String,
}

impl MessageTemplates {
    pub fn text(&self, kind: MessageKind) -> &str {
        match kind {
            MessageKind::Initial => &self.initial,
            MessageKind::FollowUp => &self.follow_up,
            MessageKind::ScheduleCheck => &self.schedule_check,
            MessageKind::CompletionCheck => &self.completion_check,
        }
    }
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            initial: "Hello! 👋 You've been matched for a coffee chat! Please find a time that works for both of you in the next week.".to_string(),
            follow_up: "Hey there! 👋 Just checking in - have you managed to set a date for your coffee chat?".to_string(),
            schedule_check: "Hi! Have you scheduled your coffee chat? Let me know! 📅".to_string(),
            completion_check: "Hope you had a great chat! Did you complete your coffee meeting? Please let me know! ☕".to_string(),
        }
    }
}

/// Follow-up delays are measured from match creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingConfig {
    pub initial_follow_up: Duration,
    pub schedule_check: Duration,
    pub completion_check: Duration,
    pub match_expiration: Duration,
}

impl TimingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let delays = [
            ("initial follow-up", self.initial_follow_up),
            ("schedule check", self.schedule_check),
            ("completion check", self.completion_check),
            ("match expiration", self.match_expiration),
        ];
        if let Some((name, _)) = delays.iter().find(|(_, d)| *d <= Duration::zero()) {
            return Err(ConfigError::Timing(format!("{name} delay must be positive")));
        }
        if self.initial_follow_up > self.schedule_check
            || self.schedule_check > self.completion_check
        {
            return Err(ConfigError::Timing(
                "delays must satisfy initial follow-up <= schedule check <= completion check"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            initial_follow_up: Duration::days(2),
            schedule_check: Duration::weeks(1),
            completion_check: Duration::weeks(2),
            match_expiration: Duration::days(180),
        }
    }
}

/// Everything the matching domain needs: who, what to say, and when.
#[derive(Debug, Clone)]
pub struct MatchingConfig {
    pub roster: Vec<RosterMember>,
    pub messages: MessageTemplates,
    pub timing: TimingConfig,
}

impl MatchingConfig {
    pub fn new(roster: Vec<RosterMember>) -> Self {
        Self {
            roster,
            messages: MessageTemplates::default(),
            timing: TimingConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_roster(&self.roster)?;
        self.timing.validate()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreConfig {
    Postgres {
        database_url: String,
    },
    EdgeConfig {
        connection_string: String,
        api_token: String,
    },
    Memory,
}

impl StoreConfig {
    /// Load only the store settings (used by `init_store`)
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &'static str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| var(name).ok_or(ConfigError::Missing(name));

        match var("STORE_BACKEND").as_deref().unwrap_or("postgres") {
            "postgres" => Ok(StoreConfig::Postgres {
                database_url: required("DATABASE_URL")?,
            }),
            "edge_config" => Ok(StoreConfig::EdgeConfig {
                connection_string: required("EDGE_CONFIG")?,
                api_token: required("VERCEL_API_TOKEN")?,
            }),
            "memory" => Ok(StoreConfig::Memory),
            other => Err(ConfigError::Invalid {
                name: "STORE_BACKEND",
                reason: format!("unknown backend {other:?} (postgres, edge_config, memory)"),
            }),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub slack_bot_token: String,
    pub store: StoreConfig,
    pub pairing_cron: String,
    pub follow_up_cron: String,
    pub matching: MatchingConfig,
}

/// Monday 09:00
pub const DEFAULT_PAIRING_CRON: &str = "0 0 9 * * Mon";
/// Every 6 hours
pub const DEFAULT_FOLLOW_UP_CRON: &str = "0 0 */6 * * *";

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        let _ = dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &'static str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| var(name).ok_or(ConfigError::Missing(name));

        let port = match var("PORT") {
            Some(port) => port.parse().map_err(|e| ConfigError::Invalid {
                name: "PORT",
                reason: format!("{e}"),
            })?,
            None => 3000,
        };

        let store = StoreConfig::from_lookup(&lookup)?;

        let roster_json = match (var("ROSTER_JSON"), var("ROSTER_PATH")) {
            (Some(json), _) => json,
            (None, Some(path)) => std::fs::read_to_string(&path).map_err(|e| {
                ConfigError::Roster(format!("failed to read roster file {path}: {e}"))
            })?,
            (None, None) => return Err(ConfigError::Missing("ROSTER_PATH or ROSTER_JSON")),
        };

        let defaults = TimingConfig::default();
        let timing = TimingConfig {
            initial_follow_up: hours_var(&var, "INITIAL_FOLLOW_UP_HOURS", defaults.initial_follow_up)?,
            schedule_check: hours_var(&var, "SCHEDULE_CHECK_HOURS", defaults.schedule_check)?,
            completion_check: hours_var(&var, "COMPLETION_CHECK_HOURS", defaults.completion_check)?,
            match_expiration: match var("MATCH_EXPIRATION_DAYS") {
                Some(days) => Duration::days(parse_i64("MATCH_EXPIRATION_DAYS", &days)?),
                None => defaults.match_expiration,
            },
        };

        let default_messages = MessageTemplates::default();
        let messages = MessageTemplates {
            initial: var("MESSAGE_INITIAL").unwrap_or(default_messages.initial),
            follow_up: var("MESSAGE_FOLLOW_UP").unwrap_or(default_messages.follow_up),
            schedule_check: var("MESSAGE_SCHEDULE_CHECK")
                .unwrap_or(default_messages.schedule_check),
            completion_check: var("MESSAGE_COMPLETION_CHECK")
                .unwrap_or(default_messages.completion_check),
        };

        let matching = MatchingConfig {
            roster: parse_roster(&roster_json)?,
            messages,
            timing,
        };
        matching.validate()?;

        Ok(Self {
            port,
            slack_bot_token: required("SLACK_BOT_TOKEN")?,
            store,
            pairing_cron: var("PAIRING_CRON").unwrap_or_else(|| DEFAULT_PAIRING_CRON.to_string()),
            follow_up_cron: var("FOLLOW_UP_CRON")
                .unwrap_or_else(|| DEFAULT_FOLLOW_UP_CRON.to_string()),
            matching,
        })
    }
}

fn parse_i64(name: &'static str, value: &str) -> Result<i64, ConfigError> {
    value.trim().parse().map_err(|e| ConfigError::Invalid {
        name,
        reason: format!("{e}"),
    })
}

fn hours_var<F>(var: &F, name: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    match var(name) {
        Some(hours) => Ok(Duration::hours(parse_i64(name, &hours)?)),
        None => Ok(default),
    }
}

/// Parse a JSON array of `{ "id": ..., "name": ... }` members.
pub fn parse_roster(json: &str) -> Result<Vec<RosterMember>, ConfigError> {
    let roster: Vec<RosterMember> =
        serde_json::from_str(json).map_err(|e| ConfigError::Roster(e.to_string()))?;
    validate_roster(&roster)?;
    Ok(roster)
}

pub fn validate_roster(roster: &[RosterMember]) -> Result<(), ConfigError> {
    if roster.is_empty() {
        return Err(ConfigError::Roster("roster is empty".to_string()));
    }

    let mut seen = HashSet::new();
    for member in roster {
        if member.id.trim().is_empty() {
            return Err(ConfigError::Roster(format!(
                "member {:?} has an empty id",
                member.name
            )));
        }
        if !seen.insert(member.id.as_str()) {
            return Err(ConfigError::Roster(format!(
                "duplicate member id {}",
                member.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const ROSTER: &str = r#"[
        {"id": "U03K1C2RML6", "name": "Craig Dennis"},
        {"id": "U03JEPTK84T", "name": "Alex King"}
    ]"#;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn loads_defaults() {
        let config = load(&[
            ("SLACK_BOT_TOKEN", "xoxb-test"),
            ("STORE_BACKEND", "memory"),
            ("ROSTER_JSON", ROSTER),
        ])
        .unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.store, StoreConfig::Memory);
        assert_eq!(config.matching.roster.len(), 2);
        assert_eq!(config.matching.timing, TimingConfig::default());
        assert_eq!(config.pairing_cron, DEFAULT_PAIRING_CRON);
        assert_eq!(config.follow_up_cron, DEFAULT_FOLLOW_UP_CRON);
    }

    #[test]
    fn postgres_backend_requires_database_url() {
        let err = load(&[("SLACK_BOT_TOKEN", "xoxb-test"), ("ROSTER_JSON", ROSTER)]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn missing_roster_is_fatal() {
        let err = load(&[("SLACK_BOT_TOKEN", "xoxb-test"), ("STORE_BACKEND", "memory")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn timing_overrides_are_hours() {
        let config = load(&[
            ("SLACK_BOT_TOKEN", "xoxb-test"),
            ("STORE_BACKEND", "memory"),
            ("ROSTER_JSON", ROSTER),
            ("INITIAL_FOLLOW_UP_HOURS", "24"),
            ("MATCH_EXPIRATION_DAYS", "90"),
        ])
        .unwrap();

        assert_eq!(config.matching.timing.initial_follow_up, Duration::hours(24));
        assert_eq!(config.matching.timing.match_expiration, Duration::days(90));
    }

    #[test]
    fn out_of_order_delays_are_rejected() {
        let err = load(&[
            ("SLACK_BOT_TOKEN", "xoxb-test"),
            ("STORE_BACKEND", "memory"),
            ("ROSTER_JSON", ROSTER),
            ("SCHEDULE_CHECK_HOURS", "400"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Timing(_)));
    }

    #[test]
    fn duplicate_roster_ids_are_rejected() {
        let err = parse_roster(r#"[{"id": "U1", "name": "A"}, {"id": "U1", "name": "B"}]"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Roster(_)));

        assert!(parse_roster("[]").is_err());
        assert!(parse_roster("not json").is_err());
    }
}
