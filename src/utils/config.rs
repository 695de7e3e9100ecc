use std::{
	fmt::{Display, Formatter},
	net::SocketAddr,
};

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Reads the configuration of the API. Values are read from
/// `config/<environment>.json` and can be overridden by environment variables
/// prefixed with `WAYPOINT_`, such as `WAYPOINT_JWTSECRET`.
#[instrument]
pub fn parse_config() -> Result<AppConfig, ConfigError> {
	trace!("Reading config data...");

	let env = if cfg!(debug_assertions) {
		"dev".to_string()
	} else {
		std::env::var("WAYPOINT_ENV").unwrap_or_else(|_| "prod".into())
	};

	match env.as_ref() {
		"prod" | "production" => Config::builder()
			.add_source(File::with_name("config/prod").required(false))
			.set_default("environment", "production")?,
		"dev" | "development" => Config::builder()
			.add_source(File::with_name("config/dev").required(false))
			.set_default("environment", "development")?,
		unknown => {
			return Err(ConfigError::Message(format!(
				"Unknown running environment found: `{unknown}`"
			)));
		}
	}
	.add_source(Environment::with_prefix("WAYPOINT").separator("_"))
	.build()?
	.try_deserialize()
}

/// The configuration of the API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
	/// The address the server listens on
	#[serde(alias = "bindaddress")]
	pub bind_address: SocketAddr,
	/// The secret all tokens are signed with (HMAC-SHA256)
	#[serde(alias = "jwtsecret")]
	pub jwt_secret: String,
	/// The secret mixed into every password hash
	#[serde(alias = "passwordpepper")]
	pub password_pepper: String,
	/// The environment the application is running in. This is set at runtime
	/// based on an environment variable and if the application is compiled with
	/// debug mode.
	pub environment: RunningEnvironment,
	/// The configuration for the database to connect to
	pub database: DatabaseConfig,
}

/// The environment the application is running in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RunningEnvironment {
	/// The application is running in development mode
	Development,
	/// The application is running in production mode
	Production,
}

impl Display for RunningEnvironment {
	fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
		write!(
			formatter,
			"{}",
			match self {
				RunningEnvironment::Development => "Development",
				RunningEnvironment::Production => "Production",
			}
		)
	}
}

/// The configuration for the database to connect to. This will be the primary
/// data store for all information contained in the API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConfig {
	/// The location of the sqlite database file
	pub file: String,
	/// The maximum number of connections to the database
	#[serde(alias = "connectionlimit")]
	pub connection_limit: u32,
}
