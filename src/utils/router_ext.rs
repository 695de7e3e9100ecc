use axum::{routing::MethodRouter, Router};
use tower::ServiceBuilder;

use super::layers::{AuthenticationLayer, DatabaseTransactionLayer, OwnerCheck, OwnershipLayer};
use crate::prelude::AppState;

/// Extension trait for axum Router to mount routes directly behind the
/// authentication and ownership layers. The layers are composed per route,
/// once, when the router is built, and only wrap the methods the route
/// serves. Every gated request runs in one
/// [`RequestTransaction`][super::layers::RequestTransaction], shared by the
/// gate and the handler.
pub trait RouterExt<S>
where
	S: Clone + Send + Sync + 'static,
{
	/// Mounts a route that requires a valid access token. The handler can read
	/// the caller with the [`Principal`][crate::models::Principal] extractor.
	#[track_caller]
	fn mount_authenticated(
		self,
		path: &str,
		method_router: MethodRouter<S>,
		state: &AppState,
	) -> Self;

	/// Mounts a route that requires a valid access token and ownership of the
	/// resource named by the request.
	#[track_caller]
	fn mount_owned(
		self,
		path: &str,
		method_router: MethodRouter<S>,
		check: OwnerCheck,
		state: &AppState,
	) -> Self;
}

impl<S> RouterExt<S> for Router<S>
where
	S: Clone + Send + Sync + 'static,
{
	#[track_caller]
	fn mount_authenticated(
		self,
		path: &str,
		method_router: MethodRouter<S>,
		state: &AppState,
	) -> Self {
		self.route(
			path,
			method_router.route_layer(
				ServiceBuilder::new()
					.layer(DatabaseTransactionLayer::new(state.clone()))
					.layer(AuthenticationLayer::new(state.clone())),
			),
		)
	}

	#[track_caller]
	fn mount_owned(
		self,
		path: &str,
		method_router: MethodRouter<S>,
		check: OwnerCheck,
		state: &AppState,
	) -> Self {
		self.route(
			path,
			method_router.route_layer(
				ServiceBuilder::new()
					.layer(DatabaseTransactionLayer::new(state.clone()))
					.layer(AuthenticationLayer::new(state.clone()))
					.layer(OwnershipLayer::new(state.clone(), check)),
			),
		)
	}
}
