//! Credential lifecycle
//!
//! ```text
//! NoToken ──load()──► CachedUnverified ──probe 2xx──► Valid
//!    │                       │
//!    │ absent/empty          │ probe non-2xx
//!    ▼                       ▼
//! Fetching ◄─────────────────┘
//!    │ login, extract token at `token_location`
//!    ▼
//! Valid (token may be empty when the response had none)
//! ```
//!
//! A transport failure while probing or logging in ends the login phase
//! only; the run continues with whatever token the state already holds.

use serde_json::Value;

use super::store::TokenStore;
use crate::model::{ApiConfig, RequestDescriptor, RuntimeState};
use crate::report::{LoginEvent, Reporter};
use crate::transport::Dispatch;

/// How the login phase ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The persisted token passed the probe
    CachedTokenValid,
    /// A new token was fetched and persisted
    TokenRefreshed,
    /// Login succeeded but no token was found; calls go out unauthenticated
    NoTokenInResponse,
    /// The probe or login call failed at the transport level
    Aborted,
}

/// Runtime state after the login phase
#[derive(Debug, Clone, PartialEq)]
pub struct Authenticated {
    pub state: RuntimeState,
    pub outcome: LoginOutcome,
}

/// Drives token acquisition and validation
pub struct CredentialManager<'a> {
    dispatcher: &'a dyn Dispatch,
    store: &'a dyn TokenStore,
    reporter: &'a dyn Reporter,
}

impl<'a> CredentialManager<'a> {
    pub fn new(
        dispatcher: &'a dyn Dispatch,
        store: &'a dyn TokenStore,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            dispatcher,
            store,
            reporter,
        }
    }

    /// Make sure `state` carries a usable token
    pub async fn authenticate(&self, config: &ApiConfig, state: RuntimeState) -> Authenticated {
        self.reporter.login_event(LoginEvent::LookingForToken);

        let cached = match self.store.load() {
            Ok(Some(bytes)) => String::from_utf8_lossy(&bytes).trim().to_string(),
            Ok(None) => String::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Could not load persisted token");
                String::new()
            }
        };

        if cached.is_empty() {
            tracing::debug!("No cached token, fetching");
            self.reporter.login_event(LoginEvent::TokenMissing);
            return self.fetch(config, state).await;
        }

        let state = state.with_token(cached);
        let route = &config.login_details.testing_route;
        self.reporter
            .login_event(LoginEvent::TestingToken { route: route.as_str() });

        let probe = RequestDescriptor {
            method: "GET".to_string(),
            endpoint: route.clone(),
            ..Default::default()
        };

        match self.dispatcher.execute(&state, &probe).await {
            Ok(response) if (200..300).contains(&response.status) => {
                tracing::debug!(status = response.status, "Cached token accepted");
                self.reporter.login_event(LoginEvent::TokenValid);
                Authenticated {
                    state,
                    outcome: LoginOutcome::CachedTokenValid,
                }
            }
            Ok(response) => {
                tracing::debug!(status = response.status, "Cached token rejected");
                self.reporter.login_event(LoginEvent::TokenRejected {
                    status: response.status,
                });
                self.fetch(config, state).await
            }
            Err(e) => {
                self.reporter.login_event(LoginEvent::Failed(&e));
                Authenticated {
                    state,
                    outcome: LoginOutcome::Aborted,
                }
            }
        }
    }

    async fn fetch(&self, config: &ApiConfig, state: RuntimeState) -> Authenticated {
        let login = &config.login_details;
        self.reporter.login_event(LoginEvent::FetchingToken {
            route: login.route.as_str(),
        });

        let request = RequestDescriptor {
            method: "POST".to_string(),
            endpoint: login.route.clone(),
            body: config
                .credentials
                .for_env(state.active_environment)
                .clone(),
            ..Default::default()
        };

        let response = match self.dispatcher.execute(&state, &request).await {
            Ok(response) => response,
            Err(e) => {
                self.reporter.login_event(LoginEvent::Failed(&e));
                return Authenticated {
                    state,
                    outcome: LoginOutcome::Aborted,
                };
            }
        };

        match extract_token(&response.body, &login.token_location) {
            Some(token) => {
                if let Err(e) = self.store.save(token.as_bytes()) {
                    tracing::warn!(error = %e, "Could not persist token");
                }
                self.reporter.login_event(LoginEvent::TokenStored);
                Authenticated {
                    state: state.with_token(token),
                    outcome: LoginOutcome::TokenRefreshed,
                }
            }
            None => {
                self.reporter.login_event(LoginEvent::TokenNotInResponse {
                    location: login.token_location.as_str(),
                });
                Authenticated {
                    state: state.with_token(""),
                    outcome: LoginOutcome::NoTokenInResponse,
                }
            }
        }
    }
}

/// Walk a dot path (`data.items.0.token`) and return a non-empty string
pub fn extract_token(body: &Value, path: &str) -> Option<String> {
    let mut current = body;
    if !path.is_empty() {
        for segment in path.split('.') {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
    }
    current
        .as_str()
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}
