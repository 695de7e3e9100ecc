use std::{
	convert::Infallible,
	task::{Context, Poll},
};

use axum::{
	body::{Body, Bytes},
	extract::{FromRequestParts, RawPathParams},
	http::{request::Parts, Request},
	response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use http_body_util::LengthLimitError;
use tower::{Layer, Service};

use super::RequestTransaction;
use crate::{
	models::{Principal, ResourceDescriptor},
	prelude::*,
};

/// Where a gated request names the resource it acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdSource {
	/// A parameter of the route path, such as `id` in `/api/day/:id`
	Path(&'static str),
	/// A top level field of the JSON body. Creation requests use this to name
	/// the parent the new resource will be attached to, such as the
	/// `itinerary_id` of a new day
	Body(&'static str),
}

/// The ownership requirement of a route: the caller must own the resource of
/// type `resource_type` whose id is read from `id_source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerCheck {
	/// The type of the resource the caller must own
	pub resource_type: ResourceType,
	/// Where the id of that resource is read from
	pub id_source: IdSource,
}

/// Requires the caller to own the resource of the given type named by
/// `id_source`.
pub const fn require_owner(resource_type: ResourceType, id_source: IdSource) -> OwnerCheck {
	OwnerCheck {
		resource_type,
		id_source,
	}
}

/// The [`tower::Layer`] that enforces an [`OwnerCheck`]. It must run after the
/// [`AuthenticationLayer`][super::AuthenticationLayer], since it reads the
/// principal from the request extensions.
///
/// The resource id is extracted before the database is touched, so a request
/// that does not name its resource is refused without a single query.
#[derive(Clone)]
pub struct OwnershipLayer {
	state: AppState,
	check: OwnerCheck,
}

impl OwnershipLayer {
	/// Creates a layer enforcing `check`, resolved with the ownership graph of
	/// `state`
	pub fn new(state: AppState, check: OwnerCheck) -> Self {
		Self { state, check }
	}
}

impl<S> Layer<S> for OwnershipLayer {
	type Service = OwnershipService<S>;

	fn layer(&self, inner: S) -> Self::Service {
		OwnershipService {
			inner,
			state: self.state.clone(),
			check: self.check,
		}
	}
}

/// The underlying service that runs when the [`OwnershipLayer`] is used.
#[derive(Clone)]
pub struct OwnershipService<S> {
	inner: S,
	state: AppState,
	check: OwnerCheck,
}

impl<S> Service<Request<Body>> for OwnershipService<S>
where
	S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone + Send + 'static,
	S::Future: Send + 'static,
{
	type Error = Infallible;
	type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;
	type Response = Response;

	fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		self.inner.poll_ready(cx)
	}

	#[instrument(skip(self, request), name = "OwnershipService")]
	fn call(&mut self, request: Request<Body>) -> Self::Future {
		let state = self.state.clone();
		let check = self.check;
		let clone = self.inner.clone();
		let mut inner = std::mem::replace(&mut self.inner, clone);
		Box::pin(async move {
			match authorize(&state, check, request).await {
				Ok(request) => inner.call(request).await,
				Err(error) => Ok(error.into_response()),
			}
		})
	}
}

/// Checks the request against `check` and hands it back, rebuilt with the same
/// body, if the caller owns the resource. The checked [`ResourceDescriptor`] is
/// added to the request extensions for the handler. Ownership is resolved on
/// the [`RequestTransaction`], so the handler works on the state it was
/// checked against.
async fn authorize(
	state: &AppState,
	check: OwnerCheck,
	request: Request<Body>,
) -> Result<Request<Body>, ErrorType> {
	let (mut parts, body) = request.into_parts();

	let Some(principal) = parts.extensions.get::<Principal>().cloned() else {
		error!(
			"Ownership of `{}` checked on an unauthenticated request. Is the authentication layer missing?",
			check.resource_type
		);
		return Err(ErrorType::InvalidCredential);
	};

	let (resource_id, body) = match check.id_source {
		IdSource::Path(name) => (id_from_path(&mut parts, name).await?, body),
		IdSource::Body(field) => {
			let bytes = axum::body::to_bytes(body, constants::MAX_BUFFERED_BODY_SIZE)
				.await
				.map_err(|err| {
					let err = err.into_inner();
					if err.is::<LengthLimitError>() {
						debug!(
							"Request body exceeds {} bytes",
							constants::MAX_BUFFERED_BODY_SIZE
						);
						ErrorType::PayloadTooLarge
					} else {
						warn!("Unable to read request body: {}", err);
						ErrorType::WrongParameters
					}
				})?;
			(id_from_body(&bytes, field)?, Body::from(bytes))
		}
	};

	let resource = ResourceDescriptor {
		resource_type: check.resource_type,
		resource_id,
	};

	let Some(transaction) = parts.extensions.get::<RequestTransaction>().cloned() else {
		error!("Ownership checked without a request transaction. Is the transaction layer missing?");
		return Err(ErrorType::OwnershipDenied);
	};
	let mut connection = transaction.connection().await.map_err(|err| {
		error!("Unable to begin the request transaction, denying access: {}", err);
		ErrorType::OwnershipDenied
	})?;

	let owned = state
		.ownership
		.resolve(
			&mut connection,
			principal.id,
			resource.resource_type,
			resource.resource_id,
		)
		.await;
	drop(connection);

	if !owned {
		warn!(
			"Principal {} denied access to {}",
			principal.external_id, resource
		);
		return Err(ErrorType::OwnershipDenied);
	}

	trace!("Principal {} owns {}", principal.external_id, resource);
	parts.extensions.insert(resource);
	Ok(Request::from_parts(parts, body))
}

async fn id_from_path(parts: &mut Parts, name: &str) -> Result<i64, ErrorType> {
	let params = RawPathParams::from_request_parts(parts, &())
		.await
		.map_err(|err| {
			error!("Unable to read path parameters: {}", err);
			ErrorType::MissingResourceIdentifier
		})?;

	let Some((_, value)) = params.iter().find(|(key, _)| *key == name) else {
		error!("Route `{}` has no path parameter `{}`", parts.uri.path(), name);
		return Err(ErrorType::MissingResourceIdentifier);
	};

	value.parse::<i64>().map_err(|err| {
		debug!("Path parameter `{}` is not an id: {}", name, err);
		ErrorType::WrongParameters
	})
}

fn id_from_body(bytes: &Bytes, field: &str) -> Result<i64, ErrorType> {
	if bytes.is_empty() {
		debug!("Empty body, `{}` is missing", field);
		return Err(ErrorType::MissingResourceIdentifier);
	}

	let body = serde_json::from_slice::<serde_json::Value>(bytes).map_err(|err| {
		debug!("Request body is not JSON: {}", err);
		ErrorType::WrongParameters
	})?;

	match body.get(field) {
		None | Some(serde_json::Value::Null) => {
			debug!("Body field `{}` is missing", field);
			Err(ErrorType::MissingResourceIdentifier)
		}
		Some(value) => value
			.as_i64()
			.or_else(|| value.as_str().and_then(|id| id.trim().parse().ok()))
			.ok_or_else(|| {
				debug!("Body field `{}` is not an id: {}", field, value);
				ErrorType::WrongParameters
			}),
	}
}

#[cfg(test)]
mod tests {
	use axum::{
		body::Body,
		http::{Request, StatusCode},
		routing::{get, post},
		Extension, Router,
	};
	use tower::ServiceExt;

	use super::{id_from_body, require_owner, IdSource, OwnershipLayer};
	use crate::{
		models::{ErrorType, Principal, ResourceDescriptor, ResourceType},
		test_utils,
		utils::layers::DatabaseTransactionLayer,
	};

	fn gated(state: &crate::prelude::AppState, principal: &Principal) -> Router {
		let principal = principal.clone();
		Router::new()
			.route(
				"/api/day/:id",
				get(|| async { "handled" }).layer(OwnershipLayer::new(
					state.clone(),
					require_owner(ResourceType::Day, IdSource::Path("id")),
				)),
			)
			.route(
				"/api/day/create",
				post(|body: String| async move { body }).layer(OwnershipLayer::new(
					state.clone(),
					require_owner(ResourceType::Itinerary, IdSource::Body("itinerary_id")),
				)),
			)
			.layer(axum::middleware::map_request(
				move |mut request: Request<Body>| {
					let principal = principal.clone();
					async move {
						request.extensions_mut().insert(principal);
						request
					}
				},
			))
			.layer(DatabaseTransactionLayer::new(state.clone()))
	}

	#[test]
	fn body_ids_must_be_present_and_integral() {
		let id = |body: &'static str| id_from_body(&body.into(), "itinerary_id");

		assert_eq!(id(r#"{"itinerary_id": 4}"#), Ok(4));
		assert_eq!(id(""), Err(ErrorType::MissingResourceIdentifier));
		assert_eq!(id("{}"), Err(ErrorType::MissingResourceIdentifier));
		assert_eq!(
			id(r#"{"itinerary_id": null}"#),
			Err(ErrorType::MissingResourceIdentifier)
		);
		assert_eq!(id(r#"{"itinerary_id": "5"}"#), Ok(5));
		assert_eq!(id(r#"{"itinerary_id": "four"}"#), Err(ErrorType::WrongParameters));
		assert_eq!(id(r#"{"itinerary_id": 4.5}"#), Err(ErrorType::WrongParameters));
		assert_eq!(id("not json"), Err(ErrorType::WrongParameters));
	}

	#[tokio::test]
	async fn owner_reaches_the_handler_with_the_body_intact() {
		let state = test_utils::state().await;
		let owner = test_utils::create_principal(&state, "skipper@example.com").await;
		let tree = test_utils::create_trip_tree(&state, &owner).await;
		let router = gated(&state, &owner);

		let response = router
			.clone()
			.oneshot(
				Request::get(format!("/api/day/{}", tree.day))
					.body(Body::empty())
					.unwrap(),
			)
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::OK);

		let body = format!(r#"{{"itinerary_id": {}, "day_number": 2}}"#, tree.itinerary);
		let response = router
			.oneshot(
				Request::post("/api/day/create")
					.body(Body::from(body.clone()))
					.unwrap(),
			)
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::OK);
		let echoed = axum::body::to_bytes(response.into_body(), usize::MAX)
			.await
			.unwrap();
		assert_eq!(echoed, body.as_bytes());
	}

	#[tokio::test]
	async fn strangers_are_denied() {
		let state = test_utils::state().await;
		let owner = test_utils::create_principal(&state, "skipper@example.com").await;
		let stranger = test_utils::create_principal(&state, "stowaway@example.com").await;
		let tree = test_utils::create_trip_tree(&state, &owner).await;

		let response = gated(&state, &stranger)
			.oneshot(
				Request::get(format!("/api/day/{}", tree.day))
					.body(Body::empty())
					.unwrap(),
			)
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::FORBIDDEN);
	}

	#[tokio::test]
	async fn non_numeric_path_id_is_a_bad_request() {
		let state = test_utils::state().await;
		let owner = test_utils::create_principal(&state, "skipper@example.com").await;

		let response = gated(&state, &owner)
			.oneshot(Request::get("/api/day/tomorrow").body(Body::empty()).unwrap())
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	}

	#[tokio::test]
	async fn missing_identifier_is_refused_without_touching_the_database() {
		let state = test_utils::state().await;
		let owner = test_utils::create_principal(&state, "skipper@example.com").await;
		let tree = test_utils::create_trip_tree(&state, &owner).await;
		let router = gated(&state, &owner);

		// Any query from here on fails, which the gate turns into a 403
		state.database.close().await;

		let response = router
			.clone()
			.oneshot(
				Request::post("/api/day/create")
					.body(Body::from(r#"{"day_number": 2}"#))
					.unwrap(),
			)
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::BAD_REQUEST);

		let response = router
			.oneshot(
				Request::post("/api/day/create")
					.body(Body::from(format!(r#"{{"itinerary_id": {}}}"#, tree.itinerary)))
					.unwrap(),
			)
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::FORBIDDEN);
	}

	#[tokio::test]
	async fn handler_sees_the_checked_resource() {
		let state = test_utils::state().await;
		let owner = test_utils::create_principal(&state, "skipper@example.com").await;
		let tree = test_utils::create_trip_tree(&state, &owner).await;

		let router = Router::new()
			.route(
				"/api/point/:id",
				get(|Extension(resource): Extension<ResourceDescriptor>| async move {
					resource.to_string()
				})
				.layer(OwnershipLayer::new(
					state.clone(),
					require_owner(ResourceType::Point, IdSource::Path("id")),
				)),
			)
			.layer(axum::middleware::map_request(
				move |mut request: Request<Body>| {
					let owner = owner.clone();
					async move {
						request.extensions_mut().insert(owner);
						request
					}
				},
			))
			.layer(DatabaseTransactionLayer::new(state.clone()));

		let response = router
			.oneshot(
				Request::get(format!("/api/point/{}", tree.point))
					.body(Body::empty())
					.unwrap(),
			)
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::OK);
		let body = axum::body::to_bytes(response.into_body(), usize::MAX)
			.await
			.unwrap();
		assert_eq!(body, format!("point {}", tree.point).as_bytes());
	}

	#[tokio::test]
	async fn oversized_bodies_are_refused() {
		let state = test_utils::state().await;
		let owner = test_utils::create_principal(&state, "skipper@example.com").await;
		let tree = test_utils::create_trip_tree(&state, &owner).await;

		let body = format!(
			r#"{{"itinerary_id": {}, "notes": "{}"}}"#,
			tree.itinerary,
			"a".repeat(crate::prelude::constants::MAX_BUFFERED_BODY_SIZE)
		);
		let response = gated(&state, &owner)
			.oneshot(
				Request::post("/api/day/create")
					.body(Body::from(body))
					.unwrap(),
			)
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
	}
}
