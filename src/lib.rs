//! Authentication and trip-ownership authorization for the Waypoint trip
//! planner API. Requests are authenticated with short lived access tokens, and
//! every resource of a trip (itineraries, days, points, inventories, ...) is
//! only reachable by the travellers of that trip.
#![warn(missing_docs)]

/// The state of the application, the router and the server loop.
pub mod app;
/// The database module contains all the database related functions. Such as
/// initializing the database, looking up principals, etc.
pub mod db;
/// All the types that cross the API boundary: errors, responses, tokens and
/// resource descriptors.
pub mod models;
/// The endpoints owned by this crate, and the gating of the resource endpoints.
pub mod routes;
/// Tokens, password hashing and the ownership graph.
pub mod service;
/// This module contains all the utilities used by the API. This includes things
/// like the config parser, the [`tower::Layer`]s that gate the requests, etc.
pub mod utils;

#[cfg(test)]
mod test_utils;

/// The prelude module contains all the things you need to import to get
/// started with the API.
pub mod prelude {
	pub use sqlx::{query, query_as, query_scalar};
	pub use tracing::{debug, error, info, instrument, trace, warn};
	pub use uuid::Uuid;

	pub use crate::{
		app::AppState,
		models::{ErrorType, ResourceType},
		utils::{config::*, constants},
	};

	/// The type of the database connection. A mutable reference to this should
	/// be used as the parameter for database functions, since it accepts both a
	/// connection and a transaction.
	///
	/// Example:
	/// ```rust
	/// use waypoint::prelude::*;
	///
	/// pub async fn database_fn(connection: &mut DatabaseConnection) {
	///     // Do something with `connection` ....
	/// }
	/// ```
	pub type DatabaseConnection = <DatabaseType as sqlx::Database>::Connection;

	/// The type of the database. This is currently set to [`sqlx::Sqlite`].
	/// A type alias is used here so that it can be referenced everywhere easily
	pub type DatabaseType = sqlx::Sqlite;
}
