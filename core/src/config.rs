//! Service configuration.
//!
//! A `ServiceConfig` can be deserialized from any serde source (JSON via
//! `from_json`) or read from `RESTFULLY_*` environment variables. Durations
//! accept plain numbers (seconds) or strings with units such as `"1500ms"`,
//! `"30s"` or `"2m"`.

use std::collections::BTreeMap;
use std::time::Duration;

use fundu::{DurationParser, TimeUnit};
use serde::{Deserialize, Deserializer};
use url::Url;

use crate::error::ApiError;
use crate::http::DEFAULT_CONTENT_TYPE;
use crate::service::{ApiService, RequestOptions};

const ENV_PREFIX: &str = "RESTFULLY_";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceConfig {
    /// Absolute base URL of the API, e.g. `https://api.example.com/`.
    pub base_url: String,
    /// Resource path every endpoint starts with.
    #[serde(default)]
    pub path: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    #[serde(default, deserialize_with = "deserialize_optional_duration")]
    pub timeout: Option<Duration>,
    #[serde(default)]
    pub allow_auto_redirect: bool,
    #[serde(default)]
    pub proxy: Option<String>,
    /// Headers sent with every request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_content_type() -> String {
    DEFAULT_CONTENT_TYPE.to_string()
}

impl ServiceConfig {
    pub fn new(base_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            path: path.into(),
            content_type: default_content_type(),
            timeout: None,
            allow_auto_redirect: false,
            proxy: None,
            headers: BTreeMap::new(),
        }
    }

    pub fn from_json(text: &str) -> Result<Self, ApiError> {
        let config: Self = serde_json::from_str(text).map_err(|e| ApiError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read `RESTFULLY_BASE_URL` (required), `RESTFULLY_PATH`,
    /// `RESTFULLY_CONTENT_TYPE`, `RESTFULLY_TIMEOUT`,
    /// `RESTFULLY_ALLOW_AUTO_REDIRECT` and `RESTFULLY_PROXY`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_vars(std::env::vars())
    }

    fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Result<Self, ApiError> {
        let vars: BTreeMap<String, String> = vars
            .into_iter()
            .filter_map(|(key, value)| key.strip_prefix(ENV_PREFIX).map(|k| (k.to_ascii_uppercase(), value)))
            .collect();

        let base_url = vars
            .get("BASE_URL")
            .cloned()
            .ok_or_else(|| ApiError::Config(format!("{ENV_PREFIX}BASE_URL is required")))?;
        let mut config = Self::new(base_url, vars.get("PATH").cloned().unwrap_or_default());
        if let Some(content_type) = vars.get("CONTENT_TYPE") {
            config.content_type = content_type.clone();
        }
        if let Some(timeout) = vars.get("TIMEOUT") {
            config.timeout = Some(parse_duration(timeout).map_err(ApiError::Config)?);
        }
        if let Some(redirect) = vars.get("ALLOW_AUTO_REDIRECT") {
            config.allow_auto_redirect = parse_bool(redirect).ok_or_else(|| {
                ApiError::Config(format!("{ENV_PREFIX}ALLOW_AUTO_REDIRECT must be true or false, got '{redirect}'"))
            })?;
        }
        config.proxy = vars.get("PROXY").filter(|p| !p.is_empty()).cloned();

        config.validate()?;
        Ok(config)
    }

    /// The base URL must be absolute; the proxy, when set, too.
    pub fn validate(&self) -> Result<(), ApiError> {
        self.base_url()?;
        self.proxy()?;
        Ok(())
    }

    pub fn base_url(&self) -> Result<Url, ApiError> {
        parse_absolute(&self.base_url)
    }

    pub fn proxy(&self) -> Result<Option<Url>, ApiError> {
        self.proxy.as_deref().map(parse_absolute).transpose()
    }

    pub fn request_options(&self) -> Result<RequestOptions, ApiError> {
        Ok(RequestOptions {
            content_type: self.content_type.clone(),
            timeout: self.timeout,
            allow_auto_redirect: self.allow_auto_redirect,
            proxy: self.proxy()?,
            headers: self.headers.clone(),
        })
    }
}

impl<C, S> ApiService<C, S> {
    /// Build a service from configuration and its collaborators.
    pub fn from_config(config: &ServiceConfig, client: C, serializer: S) -> Result<Self, ApiError> {
        let service = ApiService::new(config.base_url()?, config.path.clone(), client, serializer);
        Ok(service.with_options(config.request_options()?))
    }
}

fn parse_absolute(value: &str) -> Result<Url, ApiError> {
    let url = Url::parse(value).map_err(|e| ApiError::InvalidUrl(format!("'{value}': {e}")))?;
    if url.cannot_be_a_base() {
        return Err(ApiError::InvalidUrl(format!("'{value}' cannot be used as a base url")));
    }
    Ok(url)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Seconds by default; also milliseconds and minutes. No fractions,
/// exponents or infinity.
const DURATION_PARSER: DurationParser<'static> = DurationParser::builder()
    .time_units(&[TimeUnit::Second, TimeUnit::MilliSecond, TimeUnit::Minute])
    .parse_multiple(None)
    .allow_time_unit_delimiter()
    .disable_infinity()
    .disable_fraction()
    .disable_exponent()
    .default_unit(TimeUnit::Second)
    .build();

fn parse_duration(value: &str) -> Result<Duration, String> {
    DURATION_PARSER
        .parse(value)
        .map_err(|e| format!("invalid duration '{value}': {e}. Examples: '5', '1500ms', '30s', '2m'"))?
        .try_into()
        .map_err(|e| format!("duration '{value}' out of range: {e}"))
}

fn deserialize_optional_duration<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(u64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Seconds(secs)) => Ok(Some(Duration::from_secs(secs))),
        Some(Raw::Text(text)) => parse_duration(&text).map(Some).map_err(serde::de::Error::custom),
    }
}
