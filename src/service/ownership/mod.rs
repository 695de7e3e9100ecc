use std::collections::{hash_map::Entry, HashMap};

use crate::prelude::*;

/// Declarative ownership chains and the resolvers built from them
mod chain;

pub use self::chain::*;

/// Why ownership could not be decided. Callers outside this module only ever
/// see these through [`OwnershipGraph::resolve`], which turns all of them into
/// a denial.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
	/// The graph has no chain for the resource type. This is a programming
	/// error, never a user error
	#[error("no ownership chain is registered for `{0}`")]
	UnregisteredResourceType(ResourceType),
	/// The ownership query failed
	#[error("unable to query ownership: {0}")]
	Database(#[from] sqlx::Error),
}

/// Hops from a `trip` row to the travellers of that trip
const TRIP_TRAVELLERS: &[Hop] = &[Hop::new("id", "user_has_trip", "trip_id")];

/// Hops from an `itinerary` or `inventory` row (anything keyed by `trip_id`)
/// to the travellers of its trip
const TRIP_CHILD_TRAVELLERS: &[Hop] = &[
	Hop::new("trip_id", "trip", "id"),
	Hop::new("id", "user_has_trip", "trip_id"),
];

/// Hops from a `day` row to the travellers of its trip
const DAY_TRAVELLERS: &[Hop] = &[
	Hop::new("itinerary_id", "itinerary", "id"),
	Hop::new("trip_id", "trip", "id"),
	Hop::new("id", "user_has_trip", "trip_id"),
];

/// The column of `user_has_trip` (and of authored rows) holding the
/// principal's internal id
const PRINCIPAL_COLUMN: &str = "user_id";

/// A compiled resolver, kept next to the query it compiles to
#[derive(Debug, Clone)]
struct RegisteredResolver {
	resolver: Resolver,
	sql: String,
}

/// The registry of ownership chains for every protected resource type.
///
/// Entitlement is only recorded directly in the trip membership table
/// (`user_has_trip`); every other resource reaches it by walking its foreign
/// keys upwards. The graph is built once at startup and only read afterwards,
/// so it can be shared freely between requests. Nothing is cached: every
/// decision is computed from the current rows, which means removing a traveller
/// from a trip revokes their access to everything below it immediately.
#[derive(Debug, Clone)]
pub struct OwnershipGraph {
	resolvers: HashMap<ResourceType, RegisteredResolver>,
}

impl OwnershipGraph {
	/// Starts an empty graph
	pub fn builder() -> OwnershipGraphBuilder {
		OwnershipGraphBuilder {
			resolvers: HashMap::new(),
		}
	}

	/// The ownership graph of the trip planner.
	pub fn standard() -> Self {
		Self::builder()
			.register(
				ResourceType::Trip,
				OwnershipChain::anchored_at("trip", "id")
					.then(TRIP_TRAVELLERS)
					.owned_by(PRINCIPAL_COLUMN),
			)
			.register(
				ResourceType::Itinerary,
				OwnershipChain::anchored_at("itinerary", "id")
					.then(TRIP_CHILD_TRAVELLERS)
					.owned_by(PRINCIPAL_COLUMN),
			)
			.register(
				ResourceType::Day,
				OwnershipChain::anchored_at("day", "id")
					.then(DAY_TRAVELLERS)
					.owned_by(PRINCIPAL_COLUMN),
			)
			// Sea and weather rows are keyed by the day they describe
			.register(
				ResourceType::Sea,
				OwnershipChain::anchored_at("sea", "day_id")
					.hop("day_id", "day", "id")
					.then(DAY_TRAVELLERS)
					.owned_by(PRINCIPAL_COLUMN),
			)
			.register(
				ResourceType::Weather,
				OwnershipChain::anchored_at("weather", "day_id")
					.hop("day_id", "day", "id")
					.then(DAY_TRAVELLERS)
					.owned_by(PRINCIPAL_COLUMN),
			)
			.register(
				ResourceType::Point,
				OwnershipChain::anchored_at("point", "id")
					.hop("day_id", "day", "id")
					.then(DAY_TRAVELLERS)
					.owned_by(PRINCIPAL_COLUMN),
			)
			.register(
				ResourceType::Inventory,
				OwnershipChain::anchored_at("inventory", "id")
					.then(TRIP_CHILD_TRAVELLERS)
					.owned_by(PRINCIPAL_COLUMN),
			)
			// An item is reachable through any inventory holding it, and its
			// author can always reach it, even outside of any trip.
			// TODO: confirm with product whether authorship alone should keep
			// granting access once the author leaves every trip holding the item
			.register(
				ResourceType::Item,
				Resolver::AnyOf(vec![
					OwnershipChain::anchored_at("item", "id")
						.hop("id", "inventory_items", "item_id")
						.hop("inventory_id", "inventory", "id")
						.then(TRIP_CHILD_TRAVELLERS)
						.owned_by(PRINCIPAL_COLUMN),
					OwnershipChain::anchored_at("item", "id").owned_by(PRINCIPAL_COLUMN),
				]),
			)
			.register(
				ResourceType::Log,
				OwnershipChain::anchored_at("log", "id").owned_by(PRINCIPAL_COLUMN),
			)
			// Joining through the attachments makes this hold as soon as any
			// attached point is owned
			.register(
				ResourceType::Image,
				OwnershipChain::anchored_at("image", "id")
					.hop("id", "point_has_image", "image_id")
					.hop("point_id", "point", "id")
					.hop("day_id", "day", "id")
					.then(DAY_TRAVELLERS)
					.owned_by(PRINCIPAL_COLUMN),
			)
			.build()
	}

	/// The resolver registered for a resource type, if any
	pub fn resolver(&self, resource_type: ResourceType) -> Option<&Resolver> {
		self.resolvers
			.get(&resource_type)
			.map(|registered| &registered.resolver)
	}

	/// Decides whether the principal owns the resource, reporting why a
	/// decision could not be made.
	#[instrument(skip(self, connection))]
	pub async fn try_resolve(
		&self,
		connection: &mut DatabaseConnection,
		principal_id: i64,
		resource_type: ResourceType,
		resource_id: i64,
	) -> Result<bool, ResolveError> {
		let registered = self
			.resolvers
			.get(&resource_type)
			.ok_or(ResolveError::UnregisteredResourceType(resource_type))?;

		let owned = query_scalar::<_, i64>(&registered.sql)
			.bind(resource_id)
			.bind(principal_id)
			.fetch_one(&mut *connection)
			.await?;

		trace!("Ownership of {resource_type} {resource_id} by {principal_id}: {owned}");
		Ok(owned != 0)
	}

	/// Decides whether the principal owns the resource. This never fails:
	/// unknown ids resolve to `false`, and so does anything that prevents a
	/// decision, such as an unregistered resource type or a database error.
	/// Those are logged for operators.
	pub async fn resolve(
		&self,
		connection: &mut DatabaseConnection,
		principal_id: i64,
		resource_type: ResourceType,
		resource_id: i64,
	) -> bool {
		match self
			.try_resolve(connection, principal_id, resource_type, resource_id)
			.await
		{
			Ok(owned) => owned,
			Err(err @ ResolveError::UnregisteredResourceType(_)) => {
				error!("Ownership graph is misconfigured, denying access: {}", err);
				false
			}
			Err(err @ ResolveError::Database(_)) => {
				error!("Error checking ownership, denying access: {}", err);
				false
			}
		}
	}
}

/// Collects the resolvers of an [`OwnershipGraph`]
#[derive(Debug)]
pub struct OwnershipGraphBuilder {
	resolvers: HashMap<ResourceType, RegisteredResolver>,
}

impl OwnershipGraphBuilder {
	/// Registers the resolver of a resource type.
	///
	/// # Panics
	/// Every resource type has exactly one ownership chain. Registering a type
	/// twice panics, so that the mistake surfaces at startup.
	#[track_caller]
	pub fn register(mut self, resource_type: ResourceType, resolver: impl Into<Resolver>) -> Self {
		let resolver = resolver.into();
		match self.resolvers.entry(resource_type) {
			Entry::Occupied(_) => {
				panic!("Ownership chain for `{resource_type}` already registered");
			}
			Entry::Vacant(entry) => {
				entry.insert(RegisteredResolver {
					sql: resolver.to_sql(),
					resolver,
				});
			}
		}
		self
	}

	/// Finishes the graph
	pub fn build(self) -> OwnershipGraph {
		for resource_type in ResourceType::ALL {
			if !self.resolvers.contains_key(&resource_type) {
				warn!("No ownership chain registered for `{resource_type}`. Access to it will always be denied");
			}
		}
		OwnershipGraph {
			resolvers: self.resolvers,
		}
	}
}
