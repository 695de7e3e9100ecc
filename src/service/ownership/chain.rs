use std::fmt::Write;

/// One foreign-key step of an ownership chain: from a column of the previous
/// table to a column of the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hop {
	/// The column on the table the chain is currently at
	pub from_column: &'static str,
	/// The table the hop lands on
	pub table: &'static str,
	/// The column on `table` that `from_column` references (or is referenced
	/// by)
	pub to_column: &'static str,
}

impl Hop {
	/// Creates a hop from `from_column` of the current table to
	/// `table.to_column`
	pub const fn new(from_column: &'static str, table: &'static str, to_column: &'static str) -> Self {
		Self {
			from_column,
			table,
			to_column,
		}
	}
}

/// The path from a resource's own table up to a row that names the principal.
///
/// A chain starts at an anchor (`table.id_column = <resource id>`), walks its
/// hops with inner joins and ends by comparing `principal_column` on the last
/// table it reached against the principal's internal id. Since all joins are
/// inner joins, a missing row anywhere along the way simply yields no match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipChain {
	table: &'static str,
	id_column: &'static str,
	hops: Vec<Hop>,
	principal_column: &'static str,
}

impl OwnershipChain {
	/// Starts a chain at the rows of `table` whose `id_column` equals the
	/// resource id.
	pub fn anchored_at(table: &'static str, id_column: &'static str) -> ChainBuilder {
		ChainBuilder {
			table,
			id_column,
			hops: Vec::new(),
		}
	}

	/// The hops of the chain, in the order they are joined
	pub fn hops(&self) -> &[Hop] {
		&self.hops
	}

	/// The SQL condition `EXISTS(...)` that is true when the principal bound to
	/// `principal_param` reaches the resource bound to `resource_param`.
	pub fn exists_clause(&self, resource_param: &str, principal_param: &str) -> String {
		let mut sql = format!("EXISTS(SELECT 1 FROM {} AS t0", self.table);
		for (index, hop) in self.hops.iter().enumerate() {
			// Writing to a `String` never fails
			let _ = write!(
				sql,
				" INNER JOIN {table} AS t{next} ON t{next}.{to} = t{index}.{from}",
				table = hop.table,
				next = index + 1,
				to = hop.to_column,
				from = hop.from_column,
			);
		}
		let _ = write!(
			sql,
			" WHERE t0.{id} = {resource_param} AND t{last}.{principal} = {principal_param})",
			id = self.id_column,
			last = self.hops.len(),
			principal = self.principal_column,
		);
		sql
	}
}

/// Builds an [`OwnershipChain`] one hop at a time.
#[derive(Debug, Clone)]
pub struct ChainBuilder {
	table: &'static str,
	id_column: &'static str,
	hops: Vec<Hop>,
}

impl ChainBuilder {
	/// Joins `table` on `table.to_column = <current>.from_column`
	pub fn hop(
		mut self,
		from_column: &'static str,
		table: &'static str,
		to_column: &'static str,
	) -> Self {
		self.hops.push(Hop::new(from_column, table, to_column));
		self
	}

	/// Appends the hops of another chain fragment
	pub fn then(mut self, hops: &[Hop]) -> Self {
		self.hops.extend_from_slice(hops);
		self
	}

	/// Finishes the chain: the principal owns the resource when
	/// `principal_column` of the last table equals their id
	pub fn owned_by(self, principal_column: &'static str) -> OwnershipChain {
		OwnershipChain {
			table: self.table,
			id_column: self.id_column,
			hops: self.hops,
			principal_column,
		}
	}
}

/// Decides ownership for one resource type. Resolvers are plain data: they are
/// compiled to a single query when the graph is built, so that deciding
/// ownership costs exactly one round trip no matter how long the chain is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolver {
	/// Ownership follows a single chain
	Chain(OwnershipChain),
	/// Ownership holds if any of the chains holds
	AnyOf(Vec<OwnershipChain>),
}

impl Resolver {
	/// The chains this resolver consists of
	pub fn chains(&self) -> &[OwnershipChain] {
		match self {
			Self::Chain(chain) => std::slice::from_ref(chain),
			Self::AnyOf(chains) => chains,
		}
	}

	/// Compiles the resolver into a query returning a single integer column,
	/// `1` when the principal (`$2`) owns the resource (`$1`) and `0`
	/// otherwise.
	pub fn to_sql(&self) -> String {
		let clauses = self
			.chains()
			.iter()
			.map(|chain| chain.exists_clause("$1", "$2"))
			.collect::<Vec<_>>();

		if clauses.is_empty() {
			// A disjunction over nothing never holds
			"SELECT 0;".to_string()
		} else {
			format!("SELECT {};", clauses.join(" OR "))
		}
	}
}

impl From<OwnershipChain> for Resolver {
	fn from(chain: OwnershipChain) -> Self {
		Self::Chain(chain)
	}
}

#[cfg(test)]
mod tests {
	use super::{OwnershipChain, Resolver};

	#[test]
	fn direct_chain_joins_nothing() {
		let chain = OwnershipChain::anchored_at("log", "id").owned_by("user_id");

		assert_eq!(
			chain.exists_clause("$1", "$2"),
			"EXISTS(SELECT 1 FROM log AS t0 WHERE t0.id = $1 AND t0.user_id = $2)"
		);
	}

	#[test]
	fn hops_are_joined_in_order_with_distinct_aliases() {
		let chain = OwnershipChain::anchored_at("itinerary", "id")
			.hop("trip_id", "trip", "id")
			.hop("id", "user_has_trip", "trip_id")
			.owned_by("user_id");

		assert_eq!(
			chain.exists_clause("$1", "$2"),
			concat!(
				"EXISTS(SELECT 1 FROM itinerary AS t0",
				" INNER JOIN trip AS t1 ON t1.id = t0.trip_id",
				" INNER JOIN user_has_trip AS t2 ON t2.trip_id = t1.id",
				" WHERE t0.id = $1 AND t2.user_id = $2)"
			)
		);
	}

	#[test]
	fn any_of_is_a_single_disjunctive_query() {
		let resolver = Resolver::AnyOf(vec![
			OwnershipChain::anchored_at("item", "id")
				.hop("id", "inventory_items", "item_id")
				.owned_by("inventory_id"),
			OwnershipChain::anchored_at("item", "id").owned_by("user_id"),
		]);

		let sql = resolver.to_sql();
		assert!(sql.starts_with("SELECT EXISTS("));
		assert_eq!(sql.matches("EXISTS(").count(), 2);
		assert!(sql.contains(") OR EXISTS("));
	}

	#[test]
	fn empty_disjunction_never_holds() {
		assert_eq!(Resolver::AnyOf(vec![]).to_sql(), "SELECT 0;");
	}
}
