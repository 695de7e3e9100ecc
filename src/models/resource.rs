use std::{
	fmt::{Display, Formatter},
	str::FromStr,
};

use serde::{Deserialize, Serialize};

/// Every kind of object in the trip planner that an endpoint can act on.
///
/// The set is closed: adding a new kind means adding a variant here and
/// declaring its ownership chain in
/// [`OwnershipGraph::standard`][crate::service::OwnershipGraph::standard].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
	/// A trip, the root that travellers are attached to
	Trip,
	/// The planned route of a trip
	Itinerary,
	/// A single day of an itinerary
	Day,
	/// Sea conditions of a day, keyed by the day
	Sea,
	/// Weather readings of a day, keyed by the day
	Weather,
	/// The inventory carried on a trip
	Inventory,
	/// An item of an inventory
	Item,
	/// A waypoint recorded on a day
	Point,
	/// A sailing log written by a user
	Log,
	/// A picture attached to one or more points
	Image,
}

impl ResourceType {
	/// All resource types, in declaration order
	pub const ALL: [ResourceType; 10] = [
		Self::Trip,
		Self::Itinerary,
		Self::Day,
		Self::Sea,
		Self::Weather,
		Self::Inventory,
		Self::Item,
		Self::Point,
		Self::Log,
		Self::Image,
	];

	/// The lowercase name used on the wire and in the logs
	pub const fn as_str(&self) -> &'static str {
		match self {
			Self::Trip => "trip",
			Self::Itinerary => "itinerary",
			Self::Day => "day",
			Self::Sea => "sea",
			Self::Weather => "weather",
			Self::Inventory => "inventory",
			Self::Item => "item",
			Self::Point => "point",
			Self::Log => "log",
			Self::Image => "image",
		}
	}
}

impl Display for ResourceType {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

impl FromStr for ResourceType {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|resource_type| resource_type.as_str() == s)
			.ok_or_else(|| format!("unknown resource type: `{s}`"))
	}
}

/// Names the object an endpoint acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
	/// The kind of the resource
	pub resource_type: ResourceType,
	/// The primary key of the resource
	pub resource_id: i64,
}

impl Display for ResourceDescriptor {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{} {}", self.resource_type, self.resource_id)
	}
}
