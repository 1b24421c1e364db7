//! Per-pipeline run summaries

use crate::common::ErrorKind;
use crate::model::{status_matches, RequestDescriptor};

/// Outcome of one dispatched step
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    /// 1-based position in the pipeline
    pub step: usize,
    pub method: String,
    pub endpoint: String,
    pub status: u16,
    pub expected_status: u16,
    /// Advisory only; a mismatch never halts the pipeline
    pub matched: bool,
}

impl StepRecord {
    pub fn new(step: usize, request: &RequestDescriptor, status: u16) -> Self {
        Self {
            step,
            method: request.method.clone(),
            endpoint: request.endpoint.clone(),
            status,
            expected_status: request.expected_status_code,
            matched: status_matches(request.expected_status_code, &request.method, status),
        }
    }
}

/// Result of running one pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub name: String,
    pub steps_total: usize,
    /// Steps attempted, including a failing one
    pub steps_run: usize,
    pub steps: Vec<StepRecord>,
    /// Error that halted the pipeline
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
}

impl PipelineReport {
    pub fn new(name: &str, steps_total: usize) -> Self {
        Self {
            name: name.to_string(),
            steps_total,
            steps_run: 0,
            steps: Vec::new(),
            error: None,
            error_kind: None,
        }
    }

    /// True when no step halted the pipeline
    pub fn passed(&self) -> bool {
        self.error.is_none()
    }

    /// Steps whose status differed from the expectation
    pub fn mismatches(&self) -> usize {
        self.steps.iter().filter(|s| !s.matched).count()
    }
}
