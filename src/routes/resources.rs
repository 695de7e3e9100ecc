use axum::{
	routing::{MethodFilter, MethodRouter},
	Router,
};

use crate::{
	prelude::*,
	utils::{
		layers::{require_owner, IdSource, OwnerCheck},
		RouterExt,
	},
};

/// What a resource route requires of its caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
	/// Any authenticated caller. Listings use this, and scope their results to
	/// the caller themselves
	Authenticated,
	/// An authenticated caller that owns the named resource
	Owner(OwnerCheck),
}

/// The gating of one resource endpoint
#[derive(Debug, Clone, Copy)]
pub struct AccessRule {
	/// The HTTP method of the endpoint
	pub method: MethodFilter,
	/// The route path, relative to `/api`
	pub path: &'static str,
	/// What the caller must satisfy to reach the handler
	pub gate: Gate,
}

const fn rule(method: MethodFilter, path: &'static str, gate: Gate) -> AccessRule {
	AccessRule { method, path, gate }
}

const fn owner(resource_type: ResourceType, id_source: IdSource) -> Gate {
	Gate::Owner(require_owner(resource_type, id_source))
}

const ID: IdSource = IdSource::Path("id");

/// The gating of every resource endpoint of the trip planner. Creation routes
/// check the parent named in the body, every other route checks the resource
/// named in its path.
pub fn access_rules() -> Vec<AccessRule> {
	use self::Gate::Authenticated;
	use crate::models::ResourceType::*;

	let (get, post, delete) = (MethodFilter::GET, MethodFilter::POST, MethodFilter::DELETE);

	vec![
		// Trips
		rule(get, "/trip/all", Authenticated),
		rule(post, "/trip/create", Authenticated),
		rule(get, "/trip/:id", owner(Trip, ID)),
		rule(post, "/trip/:id/update", owner(Trip, ID)),
		rule(delete, "/trip/:id", owner(Trip, ID)),
		// Itineraries
		rule(get, "/itinerary/all", Authenticated),
		rule(post, "/itinerary/create", owner(Trip, IdSource::Body("trip_id"))),
		rule(get, "/itinerary/:id", owner(Itinerary, ID)),
		rule(post, "/itinerary/:id/update", owner(Itinerary, ID)),
		rule(delete, "/itinerary/:id", owner(Itinerary, ID)),
		// Days
		rule(
			get,
			"/day/itinerary/:itinerary_id",
			owner(Itinerary, IdSource::Path("itinerary_id")),
		),
		rule(post, "/day/by-key", owner(Itinerary, IdSource::Body("itinerary_id"))),
		rule(post, "/day/create", owner(Itinerary, IdSource::Body("itinerary_id"))),
		rule(get, "/day/:id", owner(Day, ID)),
		rule(post, "/day/:id/update", owner(Day, ID)),
		rule(delete, "/day/:id", owner(Day, ID)),
		// Sea and weather conditions, keyed by their day
		rule(post, "/sea/create", owner(Day, IdSource::Body("day_id"))),
		rule(get, "/sea/:day_id", owner(Sea, IdSource::Path("day_id"))),
		rule(post, "/sea/:day_id/update", owner(Sea, IdSource::Path("day_id"))),
		rule(delete, "/sea/:day_id", owner(Sea, IdSource::Path("day_id"))),
		rule(post, "/weather/create", owner(Day, IdSource::Body("day_id"))),
		rule(get, "/weather/:day_id", owner(Weather, IdSource::Path("day_id"))),
		rule(
			post,
			"/weather/:day_id/update",
			owner(Weather, IdSource::Path("day_id")),
		),
		rule(delete, "/weather/:day_id", owner(Weather, IdSource::Path("day_id"))),
		// Points
		rule(get, "/point/pois", Authenticated),
		rule(post, "/point/create", owner(Day, IdSource::Body("day_id"))),
		rule(get, "/point/:id", owner(Point, ID)),
		rule(post, "/point/:id/update", owner(Point, ID)),
		rule(delete, "/point/:id", owner(Point, ID)),
		// Inventories and their items
		rule(get, "/inventory/all", Authenticated),
		rule(post, "/inventory/create", owner(Trip, IdSource::Body("trip_id"))),
		rule(get, "/inventory/:id", owner(Inventory, ID)),
		rule(post, "/inventory/:id/update", owner(Inventory, ID)),
		rule(delete, "/inventory/:id", owner(Inventory, ID)),
		rule(post, "/item/create", owner(Inventory, IdSource::Body("inventory_id"))),
		rule(get, "/item/:id", owner(Item, ID)),
		rule(post, "/item/:id/update", owner(Item, ID)),
		rule(delete, "/item/:id", owner(Item, ID)),
		// Logs
		rule(get, "/log/all", Authenticated),
		rule(get, "/log/endorsed", Authenticated),
		rule(post, "/log/create", Authenticated),
		rule(get, "/log/:id", owner(Log, ID)),
		rule(post, "/log/:id/update", owner(Log, ID)),
		rule(delete, "/log/:id", owner(Log, ID)),
		// Images
		rule(post, "/image/create", owner(Point, IdSource::Body("point_id"))),
		rule(get, "/image/:id", owner(Image, ID)),
		rule(delete, "/image/:id", owner(Image, ID)),
	]
}

/// Mounts the resource endpoints behind their gates. The handlers themselves
/// are supplied by the caller: `handler` is asked once per rule for the
/// [`MethodRouter`] serving that rule's method and path.
#[instrument(skip_all)]
pub fn mount<S, F>(router: Router<S>, state: &AppState, mut handler: F) -> Router<S>
where
	S: Clone + Send + Sync + 'static,
	F: FnMut(&AccessRule) -> MethodRouter<S>,
{
	access_rules()
		.into_iter()
		.fold(router, |router, rule| match rule.gate {
			Gate::Authenticated => router.mount_authenticated(rule.path, handler(&rule), state),
			Gate::Owner(check) => router.mount_owned(rule.path, handler(&rule), check, state),
		})
}
