use tracing::{dispatcher::SetGlobalDefaultError, Dispatch, Level};
use tracing_subscriber::{
	filter::LevelFilter,
	fmt::{format::FmtSpan, Layer as FmtLayer},
	layer::SubscriberExt,
	prelude::*,
};

use crate::prelude::*;

/// Installs the global tracing subscriber. Everything from this crate is
/// logged down to TRACE, filtered by a global level that depends on the
/// running environment.
pub fn initialize(config: &AppConfig) -> Result<(), SetGlobalDefaultError> {
	tracing::dispatcher::set_global_default(Dispatch::new(
		tracing_subscriber::registry().with(
			FmtLayer::new()
				.with_span_events(FmtSpan::NONE)
				.event_format(
					tracing_subscriber::fmt::format()
						.with_ansi(config.environment == RunningEnvironment::Development)
						.with_file(false)
						.compact(),
				)
				.with_filter(
					tracing_subscriber::filter::Targets::new()
						.with_target(env!("CARGO_PKG_NAME"), LevelFilter::TRACE)
						.with_target("tower_http", LevelFilter::DEBUG)
						.with_target("sqlx", LevelFilter::WARN),
				)
				.with_filter(LevelFilter::from_level(
					if config.environment == RunningEnvironment::Development {
						Level::TRACE
					} else {
						Level::INFO
					},
				)),
		),
	))
}
