use crate::counter::CounterPolicy;
use crate::worker::DEFAULT_TOPIC_PREFIX;
use clap::Parser;
use hyper::Uri;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base url {url:?}: {reason}")]
    BaseUrl { url: String, reason: String },
    #[error("token ttl must be between 1 and 87600 hours")]
    TokenTtl,
    #[error("invalid topic prefix {0:?}: only ASCII letters, digits and -._~ are allowed")]
    TopicPrefix(String),
}

pub const MAX_TOKEN_TTL_HOURS: u64 = 24 * 365 * 10;
const SECS_PER_HOUR: u64 = 60 * 60;

/// Opens long-lived SSE subscriptions against a hub, batch by batch.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct LoadGeneratorInputs {
    /// Hub subscription endpoint, e.g. https://hub.example/.well-known/mercure
    #[arg(long, env = "SSE_LOAD_BASE_URL")]
    pub base_url: String,
    /// HMAC secret used to sign the subscriber token
    #[arg(long, env = "SSE_LOAD_SECRET", hide_env_values = true)]
    pub secret: String,
    /// Connections opened before the first prompt
    #[arg(long, env = "SSE_LOAD_INITIAL_CONNECTIONS", default_value_t = 1)]
    pub initial_connections: i64,
    /// Topic name prefix; the connection id is appended
    #[arg(long, env = "SSE_LOAD_TOPIC_PREFIX", default_value = DEFAULT_TOPIC_PREFIX)]
    pub topic_prefix: String,
    /// Subscriber token lifetime
    #[arg(long, env = "SSE_LOAD_TOKEN_TTL_HOURS", default_value_t = 24)]
    pub token_ttl_hours: u64,
    /// Speak HTTP/2 only
    #[arg(long, env = "SSE_LOAD_HTTP2")]
    pub http2: bool,
    /// Release a connection's count when its stream fails after being established
    #[arg(long, env = "SSE_LOAD_BALANCED_COUNTER")]
    pub balanced_counter: bool,
}

impl LoadGeneratorInputs {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bad = |reason: &str| ConfigError::BaseUrl {
            url: self.base_url.clone(),
            reason: reason.to_string(),
        };
        let uri: Uri = self.base_url.parse().map_err(|_| bad("not a uri"))?;
        match uri.scheme_str() {
            Some("http") | Some("https") => {}
            _ => return Err(bad("scheme must be http or https")),
        }
        if uri.host().is_none() {
            return Err(bad("missing host"));
        }
        let ttl_in_range = (1..=MAX_TOKEN_TTL_HOURS).contains(&self.token_ttl_hours);
        if !ttl_in_range || self.token_ttl_hours.checked_mul(SECS_PER_HOUR).is_none() {
            return Err(ConfigError::TokenTtl);
        }
        if !is_query_safe(&self.topic_prefix) {
            return Err(ConfigError::TopicPrefix(self.topic_prefix.clone()));
        }
        Ok(())
    }

    /// Saturates instead of overflowing; [`validate`](Self::validate) bounds
    /// the accepted range.
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_hours.saturating_mul(SECS_PER_HOUR))
    }

    pub fn counter_policy(&self) -> CounterPolicy {
        if self.balanced_counter {
            CounterPolicy::Balanced
        } else {
            CounterPolicy::Faithful
        }
    }
}

/// Topic names end up in the query string unescaped, so only unreserved
/// characters are accepted.
fn is_query_safe(prefix: &str) -> bool {
    prefix
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~'))
}
