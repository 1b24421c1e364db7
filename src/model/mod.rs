//! Configuration model
//!
//! An [`ApiConfig`] is the immutable snapshot parsed from a JSON or YAML
//! pipeline file. Everything that changes during a run (active URL, active
//! environment, token) lives in [`RuntimeState`], which is passed explicitly
//! and returned updated by the credential manager.

mod pipelines;
mod request;

pub use pipelines::{CurrentPipeline, CustomPipelines, NamedPipeline};
pub use request::{
    conventional_status, merge_headers, status_matches, Headers, RequestDescriptor,
    DEFAULT_PROTOCOL,
};

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

use crate::common::{Error, Result};

/// Deployment environment a run targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(Error::UnknownEnvironment(other.to_string())),
        }
    }
}

/// Base URL per environment
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Environments {
    pub development: String,
    pub staging: String,
    pub production: String,
}

impl Environments {
    pub fn url_for(&self, env: Environment) -> &str {
        match env {
            Environment::Development => &self.development,
            Environment::Staging => &self.staging,
            Environment::Production => &self.production,
        }
    }
}

/// Login payload per environment, sent verbatim to the login route
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub development: Value,
    pub staging: Value,
    pub production: Value,
}

impl Credentials {
    pub fn for_env(&self, env: Environment) -> &Value {
        match env {
            Environment::Development => &self.development,
            Environment::Staging => &self.staging,
            Environment::Production => &self.production,
        }
    }
}

/// Where to log in, where to find the token, and how to probe it
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoginDescriptor {
    /// Login endpoint (default: /login)
    pub route: String,
    /// Dot path to the token in the login response (default: data.access_token)
    #[serde(alias = "tokenLocation")]
    pub token_location: String,
    /// Endpoint used to check a cached token (default: /me)
    #[serde(alias = "testingRoute")]
    pub testing_route: String,
}

impl Default for LoginDescriptor {
    fn default() -> Self {
        Self {
            route: "/login".to_string(),
            token_location: "data.access_token".to_string(),
            testing_route: "/me".to_string(),
        }
    }
}

impl LoginDescriptor {
    /// Replace empty fields with their defaults
    pub fn with_defaults(self) -> Self {
        let defaults = Self::default();
        Self {
            route: non_empty_or(self.route, defaults.route),
            token_location: non_empty_or(self.token_location, defaults.token_location),
            testing_route: non_empty_or(self.testing_route, defaults.testing_route),
        }
    }
}

fn non_empty_or(value: String, fallback: String) -> String {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

/// Parsed pipeline configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    #[serde(rename = "baseUrl")]
    pub base_url: Environments,
    pub credentials: Credentials,
    #[serde(rename = "loginDetails")]
    pub login_details: LoginDescriptor,
    pub current_pipeline: CurrentPipeline,
    pub custom_pipelines: CustomPipelines,
}

impl ApiConfig {
    /// Load a configuration file, choosing the parser by extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        match extension.as_str() {
            "json" => Self::from_json_str(&content),
            "yaml" | "yml" => Self::from_yaml_str(&content),
            other => Err(Error::UnsupportedConfigFormat(other.to_string())),
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| Error::ConfigParse(format!("JSON: {}", e)))?;
        Ok(config.normalized())
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| Error::ConfigParse(format!("YAML: {}", e)))?;
        Ok(config.normalized())
    }

    fn normalized(mut self) -> Self {
        self.login_details = self.login_details.with_defaults();
        self
    }
}

/// Mutable per-run state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuntimeState {
    pub active_base_url: String,
    pub active_environment: Environment,
    pub token: String,
}

impl RuntimeState {
    /// Select an environment from the configuration
    pub fn for_environment(config: &ApiConfig, env: Environment) -> Self {
        Self {
            active_base_url: config.base_url.url_for(env).to_string(),
            active_environment: env,
            token: String::new(),
        }
    }

    pub fn with_token(self, token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..self
        }
    }
}
