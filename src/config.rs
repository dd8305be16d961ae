// src/config.rs

use std::env;
use std::num::NonZeroU64;
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;
use url::Url;

/// How long the correct option stays highlighted after an answer.
pub const DEFAULT_FEEDBACK_WINDOW_MS: u64 = 1500;

/// Period of one countdown tick.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

/// Timeout for every request sent to the remote quiz service.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// How long a finished session stays readable after grading settles.
pub const DEFAULT_RESULT_RETENTION_SECS: u64 = 600;

pub const DEFAULT_RUST_LOG: &str = "info";

/// Lifetime of the bearer tokens the engine issues for its own tests and tooling.
pub const JWT_EXPIRATION_SECS: u64 = 3600;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the remote quiz/grading service, e.g. `http://localhost:5000/api`.
    pub quiz_api_url: Url,
    /// Bearer token forwarded to the remote service, if it requires one.
    pub quiz_api_token: Option<String>,
    pub jwt_secret: String,
    pub listen_addr: String,
    pub timing: SessionTiming,
    pub request_timeout: Duration,
}

/// Timing knobs handed to every session the engine starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    pub tick_interval: Duration,
    pub feedback_window: Duration,
    /// Graded sessions are discarded this long after the result arrives.
    pub result_retention: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
            feedback_window: Duration::from_millis(DEFAULT_FEEDBACK_WINDOW_MS),
            result_retention: Duration::from_secs(DEFAULT_RESULT_RETENTION_SECS),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let quiz_api_url = env::var("QUIZ_API_URL")
            .unwrap_or_else(|_| "http://localhost:5000/api".to_string());
        let quiz_api_url = Url::parse(&quiz_api_url).expect("QUIZ_API_URL must be a valid URL");

        let quiz_api_token = env::var("QUIZ_API_TOKEN").ok().filter(|t| !t.is_empty());

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let listen_addr = env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let timing = SessionTiming {
            tick_interval: Duration::from_millis(non_zero_or(
                "TICK_INTERVAL_MS",
                env::var("TICK_INTERVAL_MS").ok(),
                DEFAULT_TICK_INTERVAL_MS,
            )),
            feedback_window: Duration::from_millis(parse_or("FEEDBACK_WINDOW_MS", DEFAULT_FEEDBACK_WINDOW_MS)),
            result_retention: Duration::from_secs(parse_or(
                "RESULT_RETENTION_SECS",
                DEFAULT_RESULT_RETENTION_SECS,
            )),
        };

        let request_timeout = Duration::from_secs(non_zero_or(
            "REQUEST_TIMEOUT_SECS",
            env::var("REQUEST_TIMEOUT_SECS").ok(),
            DEFAULT_REQUEST_TIMEOUT_SECS,
        ));

        Self {
            quiz_api_url,
            quiz_api_token,
            jwt_secret,
            listen_addr,
            timing,
            request_timeout,
        }
    }
}

/// Log filter for the subscriber, read before the rest of the config so that
/// config warnings are emitted.
pub fn log_filter() -> String {
    env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_RUST_LOG.to_string())
}

/// Reads a numeric variable, falling back to `default` when unset or unparsable.
fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    parse_raw(key, env::var(key).ok(), default)
}

fn parse_raw<T: FromStr>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid value for {}: {:?}", key, raw);
            default
        }),
        None => default,
    }
}

/// Like `parse_raw`, but zero is rejected too. `default` must be non-zero.
fn non_zero_or(key: &str, raw: Option<String>, default: u64) -> u64 {
    let fallback = NonZeroU64::new(default).unwrap_or(NonZeroU64::MIN);
    let value: NonZeroU64 = parse_raw(key, raw, fallback);
    value.get()
}
