//! Result reporting
//!
//! The core never prints directly: HTTP exchanges, WebSocket traffic, login
//! progress and pipeline outcomes are handed to a [`Reporter`].
//! [`ConsoleReporter`] is the terminal implementation.

use std::time::Duration;

use colored::Colorize;

use crate::common::Error;
use crate::model::{status_matches, RequestDescriptor};
use crate::runner::PipelineReport;
use crate::transport::ApiResponse;

/// A completed HTTP call
#[derive(Debug)]
pub struct HttpExchange<'a> {
    pub request: &'a RequestDescriptor,
    pub url: &'a str,
    pub status: u16,
    pub elapsed: Duration,
}

impl HttpExchange<'_> {
    /// Whether the status satisfies the request's expectation
    pub fn matched(&self) -> bool {
        status_matches(
            self.request.expected_status_code,
            self.request.effective_method(),
            self.status,
        )
    }

    fn expected_label(&self) -> String {
        match self.request.expected_status_code {
            0 => "not given".to_string(),
            code => code.to_string(),
        }
    }
}

/// Direction of a WebSocket text frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WsDirection {
    Sent,
    Received,
}

/// Progress of the credential lifecycle
#[derive(Debug)]
pub enum LoginEvent<'a> {
    /// Looking up the persisted token
    LookingForToken,
    /// Nothing usable was persisted
    TokenMissing,
    /// A persisted token is being probed
    TestingToken { route: &'a str },
    /// The probe rejected the cached token
    TokenRejected { status: u16 },
    /// The cached token was accepted
    TokenValid,
    /// Logging in with the environment's credentials
    FetchingToken { route: &'a str },
    /// A new token was extracted and stored
    TokenStored,
    /// The login response had no string at the token location
    TokenNotInResponse { location: &'a str },
    /// The probe or login call failed; the run continues
    Failed(&'a Error),
}

/// Sink for everything the runner wants the user to see
pub trait Reporter: Send + Sync {
    /// A completed HTTP call
    fn http_exchange(&self, exchange: &HttpExchange<'_>);

    /// A WebSocket text frame
    fn websocket_message(&self, _direction: WsDirection, _text: &str) {}

    /// A credential lifecycle transition
    fn login_event(&self, _event: LoginEvent<'_>) {}

    /// A pipeline is about to run
    fn pipeline_started(&self, _name: &str, _steps: usize) {}

    /// A step returned a response (1-based step number)
    fn step_completed(&self, _step: usize, _response: &ApiResponse) {}

    /// A step failed and the pipeline is halting (1-based step number)
    fn step_failed(&self, _pipeline: &str, _step: usize, _error: &Error) {}

    /// A pipeline finished, successfully or not
    fn pipeline_finished(&self, _report: &PipelineReport) {}
}

/// Coloured terminal output
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Reporter for ConsoleReporter {
    fn http_exchange(&self, exchange: &HttpExchange<'_>) {
        let line = format!(
            "{:<7} {} -> {} (expected {}) {:.2?}",
            exchange.request.effective_method(),
            exchange.url,
            exchange.status,
            exchange.expected_label(),
            exchange.elapsed
        );
        if exchange.matched() {
            println!("  {} {}", "✓".green(), line.green());
        } else {
            println!("  {} {}", "✗".red(), line.red());
        }
    }

    fn websocket_message(&self, direction: WsDirection, text: &str) {
        match direction {
            WsDirection::Sent => println!("  Sent: {}", text),
            WsDirection::Received => println!("  Received: {}", text),
        }
    }

    fn login_event(&self, event: LoginEvent<'_>) {
        match event {
            LoginEvent::LookingForToken => println!("{}", "- Looking for token...".green()),
            LoginEvent::TokenMissing => println!("{}", "- Token not found...".red()),
            LoginEvent::TestingToken { route } => {
                println!("{}", format!("- Token found, testing it against {}...", route).blue())
            }
            LoginEvent::TokenRejected { status } => {
                println!("{}", format!("- Invalid token (status {})...", status).red())
            }
            LoginEvent::TokenValid => println!("{}", "- Valid token found".green().bold()),
            LoginEvent::FetchingToken { route } => println!(
                "{}",
                format!("- Generating and storing new token via {}...", route).green()
            ),
            LoginEvent::TokenStored => println!("{}", "- New token stored".green().bold()),
            LoginEvent::TokenNotInResponse { location } => println!(
                "{}",
                format!(
                    "- No token at '{}' in the login response, continuing without one",
                    location
                )
                .yellow()
            ),
            LoginEvent::Failed(error) => println!(
                "{} {}",
                "- Login failed, continuing with the current token:".red(),
                error
            ),
        }
    }

    fn pipeline_started(&self, name: &str, steps: usize) {
        println!(
            "\n{} {} {}",
            "Running pipeline:".blue().bold(),
            name.white().bold(),
            format!("({} steps)", steps).dimmed()
        );
    }

    fn step_completed(&self, _step: usize, response: &ApiResponse) {
        if self.verbose {
            let body = serde_json::to_string_pretty(&response.body)
                .unwrap_or_else(|_| response.body.to_string());
            println!("{}", body.dimmed());
        }
    }

    fn step_failed(&self, pipeline: &str, step: usize, error: &Error) {
        println!(
            "  {} {} step {}: {}",
            "✗".red(),
            pipeline,
            step,
            error.to_string().red()
        );
    }

    fn pipeline_finished(&self, report: &PipelineReport) {
        if report.passed() {
            println!(
                "{} {} ({}/{} steps, {} status mismatches)",
                "✓".green().bold(),
                report.name.green().bold(),
                report.steps_run,
                report.steps_total,
                report.mismatches()
            );
        } else {
            println!(
                "{} {} halted after {}/{} steps",
                "✗".red().bold(),
                report.name.red().bold(),
                report.steps_run,
                report.steps_total
            );
        }
    }
}
