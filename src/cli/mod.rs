//! CLI command handling
//!
//! Wires settings, the configuration file, the credential manager and the
//! pipeline runner together for each command.

mod inline;

pub use inline::{parse_header_list, InlineRequest};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;

use crate::auth::{CredentialManager, FileTokenStore, LoginOutcome};
use crate::commands::{Commands, PipelineMode};
use crate::common::config::Settings;
use crate::common::{Error, Result};
use crate::model::{ApiConfig, Environment, RuntimeState};
use crate::report::{ConsoleReporter, Reporter};
use crate::runner::PipelineRunner;
use crate::transport::{Dispatch, TransportDispatcher};

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, verbose: bool) -> Result<()> {
    let settings = Settings::load()?;
    let reporter: Arc<dyn Reporter> = Arc::new(ConsoleReporter::new(verbose));
    let dispatcher = TransportDispatcher::new(
        reporter.clone(),
        Duration::from_secs(settings.websocket.timeout_secs),
    );

    match command {
        Commands::Run {
            file,
            env,
            pipeline,
            name,
            token_file,
        } => {
            let (config, state) = load_session(&settings, file, env)?;

            // Resolve the custom pipeline before any network traffic
            let custom_name = match (pipeline, name) {
                (PipelineMode::Custom, None) => {
                    return Err(Error::Config(
                        "--pipeline custom requires --name <pipeline>".to_string(),
                    ))
                }
                (PipelineMode::Custom, Some(name)) => {
                    if config.custom_pipelines.get(&name).is_none() {
                        return Err(Error::PipelineNotFound(name));
                    }
                    Some(name)
                }
                _ => None,
            };

            let store = FileTokenStore::new(token_file.unwrap_or(settings.defaults.token_file));
            let auth = CredentialManager::new(&dispatcher, &store, reporter.as_ref())
                .authenticate(&config, state)
                .await;

            let runner = PipelineRunner::new(&dispatcher, reporter.as_ref());
            let reports = match custom_name {
                Some(name) => vec![runner.run_named(&config, &auth.state, &name).await?],
                None if pipeline == PipelineMode::All => {
                    runner.run_all_custom(&config, &auth.state).await
                }
                None => vec![runner.run_current(&config, &auth.state).await],
            };

            let halted = reports.iter().filter(|r| !r.passed()).count();
            if halted > 0 {
                return Err(Error::PipelinesHalted(halted));
            }
            Ok(())
        }

        Commands::Login {
            file,
            env,
            token_file,
        } => {
            let (config, state) = load_session(&settings, file, env)?;
            let store = FileTokenStore::new(token_file.unwrap_or(settings.defaults.token_file));
            let auth = CredentialManager::new(&dispatcher, &store, reporter.as_ref())
                .authenticate(&config, state)
                .await;

            match auth.outcome {
                LoginOutcome::CachedTokenValid | LoginOutcome::TokenRefreshed => {
                    println!(
                        "Token for {} stored in {}",
                        auth.state.active_environment,
                        store.path().display()
                    );
                }
                LoginOutcome::NoTokenInResponse => {
                    println!("Logged in, but no token was returned");
                }
                LoginOutcome::Aborted => {
                    println!("Login did not complete");
                }
            }
            Ok(())
        }

        Commands::Inline {
            url,
            method,
            body,
            headers,
            protocol,
            timeout,
            token,
            status_code,
        } => {
            let inline = InlineRequest {
                url,
                method,
                body,
                headers,
                protocol,
                timeout,
                token,
                status_code,
            };
            let (request, state) = inline.build()?;
            let response = dispatcher.execute(&state, &request).await?;

            let body = serde_json::to_string_pretty(&response.body)?;
            println!("{}\n{}", "Response:".cyan(), body);
            Ok(())
        }
    }
}

/// Load the configuration file and select the environment
fn load_session(
    settings: &Settings,
    file: Option<PathBuf>,
    env: Option<String>,
) -> Result<(ApiConfig, RuntimeState)> {
    let path = file.unwrap_or_else(|| settings.defaults.config_file.clone());
    let config = ApiConfig::from_path(&path)?;

    let env: Environment = env
        .as_deref()
        .unwrap_or(&settings.defaults.environment)
        .parse()?;
    tracing::debug!(file = %path.display(), %env, "Loaded configuration");

    let state = RuntimeState::for_environment(&config, env);
    Ok((config, state))
}
