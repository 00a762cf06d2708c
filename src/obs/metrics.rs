// self
use crate::{
	_prelude::*,
	obs::{Operation, Outcome},
};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_outcome(operation: Operation, outcome: Outcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_relay_operation_total",
			"operation" => operation.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (operation, outcome);
	}
}

/// Records how long one token-endpoint exchange took, labeled by its final outcome.
///
/// Only [`Outcome::Success`] and [`Outcome::Failure`] are meaningful here.
pub fn record_exchange_duration(outcome: Outcome, elapsed: Duration) {
	#[cfg(feature = "metrics")]
	{
		metrics::histogram!(
			"oauth2_relay_exchange_duration_seconds",
			"outcome" => outcome.as_str()
		)
		.record(elapsed.as_secs_f64());
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (outcome, elapsed);
	}
}
