//! Pipeline execution
//!
//! Steps run strictly one after another. The first dispatch error halts
//! the pipeline; status mismatches are only recorded.

use super::summary::{PipelineReport, StepRecord};
use crate::common::{Error, Result};
use crate::model::{merge_headers, ApiConfig, Headers, RequestDescriptor, RuntimeState};
use crate::report::Reporter;
use crate::transport::Dispatch;

/// Name reported for the current pipeline
pub const CURRENT_PIPELINE: &str = "current";

/// Runs current and custom pipelines through a dispatcher
pub struct PipelineRunner<'a> {
    dispatcher: &'a dyn Dispatch,
    reporter: &'a dyn Reporter,
}

impl<'a> PipelineRunner<'a> {
    pub fn new(dispatcher: &'a dyn Dispatch, reporter: &'a dyn Reporter) -> Self {
        Self {
            dispatcher,
            reporter,
        }
    }

    /// Run the current pipeline in order
    pub async fn run_current(&self, config: &ApiConfig, state: &RuntimeState) -> PipelineReport {
        let current = &config.current_pipeline;
        self.run_sequence(
            CURRENT_PIPELINE,
            current.global_headers.as_ref(),
            &current.pipeline,
            state,
        )
        .await
    }

    /// Run every custom pipeline in file order
    ///
    /// The first halted pipeline stops the whole operation.
    pub async fn run_all_custom(
        &self,
        config: &ApiConfig,
        state: &RuntimeState,
    ) -> Vec<PipelineReport> {
        let custom = &config.custom_pipelines;
        let mut reports = Vec::with_capacity(custom.pipelines.len());

        for pipeline in &custom.pipelines {
            let report = self
                .run_sequence(
                    &pipeline.name,
                    custom.global_headers.as_ref(),
                    &pipeline.steps,
                    state,
                )
                .await;
            let halted = !report.passed();
            reports.push(report);
            if halted {
                tracing::debug!(pipeline = %pipeline.name, "Stopping custom pipelines after failure");
                break;
            }
        }

        reports
    }

    /// Run a single custom pipeline by name
    pub async fn run_named(
        &self,
        config: &ApiConfig,
        state: &RuntimeState,
        name: &str,
    ) -> Result<PipelineReport> {
        let custom = &config.custom_pipelines;
        let pipeline = custom
            .get(name)
            .ok_or_else(|| Error::PipelineNotFound(name.to_string()))?;

        Ok(self
            .run_sequence(
                &pipeline.name,
                custom.global_headers.as_ref(),
                &pipeline.steps,
                state,
            )
            .await)
    }

    async fn run_sequence(
        &self,
        name: &str,
        global_headers: Option<&Headers>,
        steps: &[RequestDescriptor],
        state: &RuntimeState,
    ) -> PipelineReport {
        self.reporter.pipeline_started(name, steps.len());
        let mut report = PipelineReport::new(name, steps.len());

        for (i, step) in steps.iter().enumerate() {
            let step_num = i + 1;
            let request = prepare_step(global_headers, step);
            report.steps_run = step_num;

            match self.dispatcher.execute(state, &request).await {
                Ok(response) => {
                    self.reporter.step_completed(step_num, &response);
                    report
                        .steps
                        .push(StepRecord::new(step_num, &request, response.status));
                }
                Err(e) => {
                    tracing::debug!(pipeline = name, step = step_num, error = %e, "Step failed");
                    self.reporter.step_failed(name, step_num, &e);
                    report.error_kind = Some(e.kind());
                    report.error = Some(e.to_string());
                    break;
                }
            }
        }

        self.reporter.pipeline_finished(&report);
        report
    }
}

/// Apply defaults and merge pipeline-wide headers under the step's own
pub fn prepare_step(global_headers: Option<&Headers>, step: &RequestDescriptor) -> RequestDescriptor {
    let mut request = step.clone().with_defaults();
    request.headers = merge_headers(global_headers, step.headers.as_ref());
    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use crate::common::ErrorKind;
    use crate::report::HttpExchange;
    use crate::transport::ApiResponse;

    /// Answers every call with its expected status, failing on chosen calls
    struct FakeDispatcher {
        fail_on: Vec<usize>,
        seen: Mutex<Vec<RequestDescriptor>>,
    }

    impl FakeDispatcher {
        fn new() -> Self {
            Self::failing_on(vec![])
        }

        fn failing_on(fail_on: Vec<usize>) -> Self {
            Self {
                fail_on,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn endpoints(&self) -> Vec<String> {
            self.seen
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.endpoint.clone())
                .collect()
        }
    }

    #[async_trait]
    impl Dispatch for FakeDispatcher {
        async fn execute(
            &self,
            _state: &RuntimeState,
            request: &RequestDescriptor,
        ) -> Result<ApiResponse> {
            let call = {
                let mut seen = self.seen.lock().unwrap();
                seen.push(request.clone());
                seen.len()
            };
            if self.fail_on.contains(&call) {
                return Err(Error::MissingWebSocketUrl);
            }
            Ok(ApiResponse {
                status: request.expected_status_code,
                body: Value::Null,
            })
        }
    }

    struct Quiet;

    impl Reporter for Quiet {
        fn http_exchange(&self, _exchange: &HttpExchange<'_>) {}
    }

    fn config(json: Value) -> ApiConfig {
        ApiConfig::from_json_str(&json.to_string()).unwrap()
    }

    fn three_step_config() -> ApiConfig {
        config(json!({
            "current_pipeline": {
                "pipeline": [
                    {"endpoint": "/one"},
                    {"endpoint": "/two"},
                    {"endpoint": "/three"}
                ]
            }
        }))
    }

    #[tokio::test]
    async fn test_current_pipeline_runs_in_order() {
        let config = three_step_config();
        let dispatcher = FakeDispatcher::new();
        let runner = PipelineRunner::new(&dispatcher, &Quiet);

        let report = runner.run_current(&config, &RuntimeState::default()).await;

        assert!(report.passed());
        assert_eq!(report.steps_run, 3);
        assert_eq!(report.mismatches(), 0);
        assert_eq!(dispatcher.endpoints(), vec!["/one", "/two", "/three"]);
    }

    #[tokio::test]
    async fn test_error_halts_remaining_steps() {
        let config = three_step_config();
        let dispatcher = FakeDispatcher::failing_on(vec![2]);
        let runner = PipelineRunner::new(&dispatcher, &Quiet);

        let report = runner.run_current(&config, &RuntimeState::default()).await;

        assert!(!report.passed());
        assert_eq!(report.steps_run, 2);
        assert_eq!(report.steps.len(), 1);
        assert_eq!(report.error_kind, Some(ErrorKind::Transport));
        assert_eq!(dispatcher.endpoints(), vec!["/one", "/two"]);
    }

    #[tokio::test]
    async fn test_unknown_protocol_halts_pipeline() {
        let config = config(json!({
            "current_pipeline": {
                "pipeline": [
                    {"endpoint": "/one", "protocol": "GOPHER"},
                    {"endpoint": "/two"}
                ]
            }
        }));

        struct Parsing;

        #[async_trait]
        impl Dispatch for Parsing {
            async fn execute(
                &self,
                _state: &RuntimeState,
                request: &RequestDescriptor,
            ) -> Result<ApiResponse> {
                let _: crate::transport::Protocol = request.protocol.parse()?;
                Ok(ApiResponse {
                    status: 200,
                    body: Value::Null,
                })
            }
        }

        let report = PipelineRunner::new(&Parsing, &Quiet)
            .run_current(&config, &RuntimeState::default())
            .await;
        assert_eq!(report.error_kind, Some(ErrorKind::Protocol));
        assert_eq!(report.steps_run, 1);
    }

    #[tokio::test]
    async fn test_missing_named_pipeline_makes_no_calls() {
        let config = config(json!({
            "custom_pipelines": {"pipelines": {"smoke": [{"endpoint": "/health"}]}}
        }));
        let dispatcher = FakeDispatcher::new();
        let runner = PipelineRunner::new(&dispatcher, &Quiet);

        let result = runner
            .run_named(&config, &RuntimeState::default(), "missing")
            .await;

        assert!(matches!(result, Err(Error::PipelineNotFound(name)) if name == "missing"));
        assert!(dispatcher.endpoints().is_empty());
    }

    #[tokio::test]
    async fn test_named_pipeline_runs_only_its_steps() {
        let config = config(json!({
            "custom_pipelines": {
                "pipelines": {
                    "users": [{"endpoint": "/users"}],
                    "orders": [{"endpoint": "/orders"}, {"endpoint": "/orders/1"}]
                }
            }
        }));
        let dispatcher = FakeDispatcher::new();
        let runner = PipelineRunner::new(&dispatcher, &Quiet);

        let report = runner
            .run_named(&config, &RuntimeState::default(), "orders")
            .await
            .unwrap();

        assert_eq!(report.name, "orders");
        assert_eq!(dispatcher.endpoints(), vec!["/orders", "/orders/1"]);
    }

    #[tokio::test]
    async fn test_all_custom_runs_in_file_order_and_aborts_on_failure() {
        let config = config(json!({
            "custom_pipelines": {
                "pipelines": {
                    "first": [{"endpoint": "/a"}, {"endpoint": "/b"}],
                    "second": [{"endpoint": "/c"}],
                    "third": [{"endpoint": "/d"}]
                }
            }
        }));

        let dispatcher = FakeDispatcher::new();
        let reports = PipelineRunner::new(&dispatcher, &Quiet)
            .run_all_custom(&config, &RuntimeState::default())
            .await;
        assert_eq!(reports.len(), 3);
        assert_eq!(dispatcher.endpoints(), vec!["/a", "/b", "/c", "/d"]);

        let dispatcher = FakeDispatcher::failing_on(vec![3]);
        let reports = PipelineRunner::new(&dispatcher, &Quiet)
            .run_all_custom(&config, &RuntimeState::default())
            .await;
        assert_eq!(reports.len(), 2);
        assert!(reports[0].passed());
        assert!(!reports[1].passed());
        assert_eq!(dispatcher.endpoints(), vec!["/a", "/b", "/c"]);
    }

    #[tokio::test]
    async fn test_steps_are_defaulted_and_headers_merged() {
        let config = config(json!({
            "current_pipeline": {
                "globalHeaders": {"Accept": "text/plain", "X-Env": "dev"},
                "pipeline": [
                    {"method": "POST", "endpoint": "/users", "headers": {"Accept": "application/json"}},
                    {}
                ]
            },
            "custom_pipelines": {
                "globalHeaders": {"Accept": "text/plain"},
                "pipelines": {"p": [{"headers": {"Accept": "application/json"}}]}
            }
        }));
        let dispatcher = FakeDispatcher::new();
        let runner = PipelineRunner::new(&dispatcher, &Quiet);
        runner.run_current(&config, &RuntimeState::default()).await;
        runner
            .run_named(&config, &RuntimeState::default(), "p")
            .await
            .unwrap();

        let seen = dispatcher.seen.lock().unwrap();
        assert_eq!(seen[0].expected_status_code, 201);
        assert_eq!(seen[0].headers.as_ref().unwrap()["Accept"], "application/json");
        assert_eq!(seen[0].headers.as_ref().unwrap()["X-Env"], "dev");

        assert_eq!(seen[1].method, "GET");
        assert_eq!(seen[1].endpoint, "/");
        assert_eq!(seen[1].expected_status_code, 200);
        assert_eq!(seen[1].headers.as_ref().unwrap()["Accept"], "text/plain");

        // Same precedence for custom pipelines
        assert_eq!(seen[2].headers.as_ref().unwrap()["Accept"], "application/json");
    }

    #[tokio::test]
    async fn test_status_mismatch_does_not_halt() {
        let config = three_step_config();

        struct AlwaysTeapot;

        #[async_trait]
        impl Dispatch for AlwaysTeapot {
            async fn execute(
                &self,
                _state: &RuntimeState,
                _request: &RequestDescriptor,
            ) -> Result<ApiResponse> {
                Ok(ApiResponse {
                    status: 418,
                    body: Value::Null,
                })
            }
        }

        let report = PipelineRunner::new(&AlwaysTeapot, &Quiet)
            .run_current(&config, &RuntimeState::default())
            .await;
        assert!(report.passed());
        assert_eq!(report.steps_run, 3);
        assert_eq!(report.mismatches(), 3);
    }
}
