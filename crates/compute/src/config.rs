use std::str::FromStr;
use std::time::Duration;

use crate::error::ComputeError;
use crate::retry::RetryPolicy;

/// Header that suppresses the tunnel's browser-warning interstitial. The
/// deployed service sits behind such a tunnel, so every request carries it.
pub const TUNNEL_WARNING_HEADER: (&str, &str) = ("ngrok-skip-browser-warning", "69420");

/// Fixed interval between status queries.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3000);

/// Per-task wall-clock limit applied unless configured otherwise.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Per-request HTTP timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Upper bounds on how long a single task may be polled.
///
/// Both limits are optional; with neither set a task is polled until the
/// service reports a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollLimits {
    /// Maximum number of status queries.
    pub max_attempts: Option<u32>,
    /// Maximum wall-clock time since polling started.
    pub deadline: Option<Duration>,
}

impl PollLimits {
    /// Poll until the task is terminal, however long that takes.
    pub const UNBOUNDED: Self = Self {
        max_attempts: None,
        deadline: None,
    };
}

impl Default for PollLimits {
    fn default() -> Self {
        Self {
            max_attempts: None,
            deadline: Some(DEFAULT_POLL_TIMEOUT),
        }
    }
}

/// Connection and polling settings for one compute service.
#[derive(Debug, Clone)]
pub struct ComputeConfig {
    /// Base URL, e.g. `https://abcd.ngrok-free.app`. No trailing slash.
    pub base_url: String,
    pub poll_interval: Duration,
    /// Headers attached to every request.
    pub headers: Vec<(String, String)>,
    pub poll_limits: PollLimits,
    pub retry: RetryPolicy,
    pub request_timeout: Duration,
}

impl ComputeConfig {
    /// Default settings for a service at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        Self {
            base_url,
            poll_interval: DEFAULT_POLL_INTERVAL,
            headers: vec![(
                TUNNEL_WARNING_HEADER.0.to_string(),
                TUNNEL_WARNING_HEADER.1.to_string(),
            )],
            poll_limits: PollLimits::default(),
            retry: RetryPolicy::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// `url_var` names the variable holding the base URL so several
    /// services can share the polling settings below.
    ///
    /// | Env Var                        | Default  |
    /// |--------------------------------|----------|
    /// | `<url_var>`                    | required |
    /// | `COMPUTE_POLL_INTERVAL_MS`     | `3000`   |
    /// | `COMPUTE_POLL_TIMEOUT_SECS`    | `1800` (`0` = unbounded) |
    /// | `COMPUTE_MAX_POLL_ATTEMPTS`    | unset    |
    /// | `COMPUTE_STATUS_RETRIES`       | `0`      |
    /// | `COMPUTE_REQUEST_TIMEOUT_SECS` | `60`     |
    /// | `COMPUTE_EXTRA_HEADERS`        | unset (`name:value,name:value`) |
    pub fn from_env(url_var: &str) -> Result<Self, ComputeError> {
        Self::from_lookup(url_var, |name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env) but reading from an arbitrary
    /// lookup function.
    pub fn from_lookup<F>(url_var: &str, lookup: F) -> Result<Self, ComputeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(url_var)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ComputeError::Config(format!("{url_var} must be set")))?;

        let mut config = Self::new(base_url);
        config.validate()?;

        let interval_ms: u64 = parse_var(&lookup, "COMPUTE_POLL_INTERVAL_MS", 3000)?;
        config.poll_interval = Duration::from_millis(interval_ms);

        let timeout_secs: u64 = parse_var(
            &lookup,
            "COMPUTE_POLL_TIMEOUT_SECS",
            DEFAULT_POLL_TIMEOUT.as_secs(),
        )?;
        config.poll_limits.deadline = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

        config.poll_limits.max_attempts = match lookup("COMPUTE_MAX_POLL_ATTEMPTS") {
            Some(raw) => Some(parse_value("COMPUTE_MAX_POLL_ATTEMPTS", &raw)?),
            None => None,
        };

        config.retry.max_retries = parse_var(&lookup, "COMPUTE_STATUS_RETRIES", 0)?;

        let request_secs: u64 = parse_var(
            &lookup,
            "COMPUTE_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT.as_secs(),
        )?;
        config.request_timeout = Duration::from_secs(request_secs);

        if let Some(raw) = lookup("COMPUTE_EXTRA_HEADERS") {
            config.headers.extend(parse_headers(&raw)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check invariants the poller and HTTP client rely on.
    pub fn validate(&self) -> Result<(), ComputeError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ComputeError::Config(format!(
                "Base URL '{}' must start with http:// or https://",
                self.base_url
            )));
        }
        if self.poll_interval.is_zero() {
            return Err(ComputeError::Config(
                "Poll interval must be greater than zero".into(),
            ));
        }
        if self.poll_limits.max_attempts == Some(0) {
            return Err(ComputeError::Config(
                "Max poll attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Absolute URL of `path` on this service.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Parse `name:value,name:value` pairs.
fn parse_headers(raw: &str) -> Result<Vec<(String, String)>, ComputeError> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = pair.split_once(':').ok_or_else(|| {
                ComputeError::Config(format!("Header '{pair}' must be in name:value form"))
            })?;
            Ok((name.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ComputeError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => parse_value(name, &raw),
        None => Ok(default),
    }
}

fn parse_value<T: FromStr>(name: &str, raw: &str) -> Result<T, ComputeError> {
    raw.trim()
        .parse()
        .map_err(|_| ComputeError::Config(format!("{name} has invalid value '{raw}'")))
}
