use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{prelude::*, utils::layers::RequestTransaction};

/// Handlers mounted behind the
/// [`DatabaseTransactionLayer`][crate::utils::layers::DatabaseTransactionLayer]
/// run their queries on the transaction the gate checked ownership on.
#[axum::async_trait]
impl<S> FromRequestParts<S> for RequestTransaction
where
	S: Send + Sync,
{
	type Rejection = ErrorType;

	async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
		parts
			.extensions
			.get::<RequestTransaction>()
			.cloned()
			.ok_or_else(|| {
				error!(
					"No transaction in the request context for `{}`. Is the route mounted without the transaction layer?",
					parts.uri.path()
				);
				ErrorType::server_error("no database transaction for the request")
			})
	}
}
