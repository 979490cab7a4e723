//! Optional observability helpers for broker flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `xubio_broker.flow` with the `flow` and
//!   `stage` (call site) fields, plus one `flow finished` event per attempt.
//! - Enable `metrics` to increment the `xubio_broker_flow_total` counter for every attempt,
//!   success, and failure (labeled by `flow` + `outcome`) and to record the
//!   `xubio_broker_flow_duration_seconds` histogram for finished attempts.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// std
use std::time::Instant;
// self
use crate::_prelude::*;

/// Broker flows observed by spans and metrics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Client-credentials exchange performed by the token issuer.
	TokenExchange,
	/// Authenticated JSON call to a resource endpoint.
	ApiCall,
	/// Authenticated binary download.
	Download,
	/// Connection probe against the tenant endpoint.
	ConnectionProbe,
	/// Request forwarded by the relay server.
	RelayForward,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::TokenExchange => "token_exchange",
			FlowKind::ApiCall => "api_call",
			FlowKind::Download => "download",
			FlowKind::ConnectionProbe => "connection_probe",
			FlowKind::RelayForward => "relay_forward",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a broker helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}

	/// Maps a finished result onto its outcome label.
	pub fn of<T, E>(result: &std::result::Result<T, E>) -> Self {
		if result.is_ok() { Self::Success } else { Self::Failure }
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs `fut` inside a [`FlowSpan`] and records the attempt, its outcome, and its duration.
pub async fn observe<T, Fut>(kind: FlowKind, stage: &'static str, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = FlowSpan::new(kind, stage);
	let started = Instant::now();

	record_flow_outcome(kind, FlowOutcome::Attempt);

	let result = span.instrument(fut).await;
	let outcome = FlowOutcome::of(&result);

	span.record_outcome(outcome);
	record_flow_outcome(kind, outcome);
	record_flow_duration(kind, outcome, started.elapsed());

	result
}
