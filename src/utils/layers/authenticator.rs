use std::{
	convert::Infallible,
	task::{Context, Poll},
};

use axum::{
	body::Body,
	http::{HeaderMap, Request},
	response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use headers::{
	authorization::{Authorization, Bearer},
	HeaderMapExt,
};
use tower::{Layer, Service};

use super::RequestTransaction;
use crate::{
	db,
	models::{Principal, TokenKind},
	prelude::*,
	service::TokenVerification,
};

/// The [`tower::Layer`] used to authenticate requests. This will parse the
/// `Authorization: Bearer <token>` header, verify the access token and load
/// the principal it was issued to. If everything checks out, the [`Principal`]
/// is added to the request extensions, where all subsequent layers and the
/// handler read it from. Otherwise the request is answered with an error and
/// never reaches the inner service.
#[derive(Clone)]
pub struct AuthenticationLayer {
	state: AppState,
}

impl AuthenticationLayer {
	/// Helper function to initialize an authentication layer
	pub fn new(state: AppState) -> Self {
		Self { state }
	}
}

impl<S> Layer<S> for AuthenticationLayer {
	type Service = AuthenticationService<S>;

	fn layer(&self, inner: S) -> Self::Service {
		AuthenticationService {
			inner,
			state: self.state.clone(),
		}
	}
}

/// The underlying service that runs when the [`AuthenticationLayer`] is used.
#[derive(Clone)]
pub struct AuthenticationService<S> {
	inner: S,
	state: AppState,
}

impl<S> Service<Request<Body>> for AuthenticationService<S>
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

	#[instrument(skip(self, request), name = "AuthenticationService")]
	fn call(&mut self, mut request: Request<Body>) -> Self::Future {
		let state = self.state.clone();
		let clone = self.inner.clone();
		let mut inner = std::mem::replace(&mut self.inner, clone);
		Box::pin(async move {
			trace!("Authenticating request");
			let Some(transaction) = request.extensions().get::<RequestTransaction>().cloned() else {
				error!("Authentication without a request transaction. Is the transaction layer missing?");
				return Ok(ErrorType::server_error("no database transaction for the request")
					.into_response());
			};

			match authenticate(&state, request.headers(), &transaction).await {
				Ok(principal) => {
					trace!("Request authenticated as {}", principal.external_id);
					request.extensions_mut().insert(principal);
					inner.call(request).await
				}
				Err(error) => Ok(error.into_response()),
			}
		})
	}
}

/// Resolves the principal of a request from its headers.
///
/// A request without an `Authorization` header is refused with
/// [`ErrorType::MissingCredential`]. Every other failure, from a header that is
/// not a bearer token to an account that has been deactivated, is refused with
/// [`ErrorType::InvalidCredential`]. The precise cause is only logged.
///
/// The principal is looked up on `transaction`, the one the rest of the request
/// runs on.
pub async fn authenticate(
	state: &AppState,
	headers: &HeaderMap,
	transaction: &RequestTransaction,
) -> Result<Principal, ErrorType> {
	let authorization = match headers.typed_try_get::<Authorization<Bearer>>() {
		Ok(Some(authorization)) => authorization,
		Ok(None) => {
			debug!("No authorization header provided");
			return Err(ErrorType::MissingCredential);
		}
		Err(err) => {
			warn!("Authorization header is not a bearer token: {}", err);
			return Err(ErrorType::InvalidCredential);
		}
	};

	let claims = match state
		.tokens
		.verify(authorization.token(), TokenKind::Access)
	{
		TokenVerification::Valid(claims) => claims,
		TokenVerification::Expired => {
			info!("Access token has expired");
			return Err(ErrorType::InvalidCredential);
		}
		TokenVerification::Malformed => {
			warn!("Access token is malformed or not signed by us");
			return Err(ErrorType::InvalidCredential);
		}
		TokenVerification::WrongKind { expected, found } => {
			warn!("Expected an {expected} token, but a {found} token was presented");
			return Err(ErrorType::InvalidCredential);
		}
	};

	let mut connection = transaction.connection().await.map_err(|err| {
		error!("Unable to begin the request transaction: {}", err);
		ErrorType::InvalidCredential
	})?;

	let user = db::get_user_by_public_id(&mut connection, &claims.sub)
		.await
		.map_err(|err| {
			error!("Unable to look up principal {}: {}", claims.sub, err);
			ErrorType::InvalidCredential
		})?
		.ok_or_else(|| {
			warn!("Access token issued to unknown principal {}", claims.sub);
			ErrorType::InvalidCredential
		})?;
	drop(connection);

	if !user.active {
		warn!("Access token issued to inactive principal {}", claims.sub);
		return Err(ErrorType::InvalidCredential);
	}

	user.into_principal()
		.map_err(|_| ErrorType::InvalidCredential)
}

#[cfg(test)]
mod tests {
	use axum::{
		body::Body,
		http::{header, Request, StatusCode},
		routing::get,
		Router,
	};
	use time::{Duration, OffsetDateTime};
	use tower::ServiceExt;

	use super::{authenticate, RequestTransaction};
	use crate::{
		db,
		models::{ErrorType, Principal},
		prelude::AppState,
		test_utils,
		utils::RouterExt,
	};

	async fn authenticate_once(
		state: &AppState,
		headers: &axum::http::HeaderMap,
	) -> Result<Principal, ErrorType> {
		let transaction = RequestTransaction::new(state.database.clone());
		authenticate(state, headers, &transaction).await
	}

	fn bearer(token: &str) -> axum::http::HeaderMap {
		let mut headers = axum::http::HeaderMap::new();
		headers.insert(
			header::AUTHORIZATION,
			format!("Bearer {token}").parse().unwrap(),
		);
		headers
	}

	#[tokio::test]
	async fn valid_access_token_resolves_the_principal() {
		let state = test_utils::state().await;
		let principal = test_utils::create_principal(&state, "skipper@example.com").await;
		let token = test_utils::access_token(&state, &principal);

		assert_eq!(
			authenticate_once(&state, &bearer(&token)).await.unwrap(),
			principal
		);
	}

	#[tokio::test]
	async fn missing_header_is_a_missing_credential() {
		let state = test_utils::state().await;

		assert_eq!(
			authenticate_once(&state, &axum::http::HeaderMap::new()).await,
			Err(ErrorType::MissingCredential)
		);
	}

	#[tokio::test]
	async fn non_bearer_headers_are_invalid() {
		let state = test_utils::state().await;
		let principal = test_utils::create_principal(&state, "skipper@example.com").await;
		let token = test_utils::access_token(&state, &principal);

		for value in [token.clone(), format!("Basic {token}"), "Bearer ".to_string()] {
			let mut headers = axum::http::HeaderMap::new();
			headers.insert(header::AUTHORIZATION, value.parse().unwrap());
			assert_eq!(
				authenticate_once(&state, &headers).await,
				Err(ErrorType::InvalidCredential),
				"{value}"
			);
		}
	}

	#[tokio::test]
	async fn refresh_token_is_refused_where_access_is_required() {
		let state = test_utils::state().await;
		let principal = test_utils::create_principal(&state, "skipper@example.com").await;
		let refresh = state
			.tokens
			.generate_refresh_token(principal.external_id)
			.unwrap();

		assert_eq!(
			authenticate_once(&state, &bearer(&refresh)).await,
			Err(ErrorType::InvalidCredential)
		);
	}

	#[tokio::test]
	async fn expired_token_is_invalid() {
		let state = test_utils::state().await;
		let principal = test_utils::create_principal(&state, "skipper@example.com").await;
		let token = state
			.tokens
			.generate_access_token_at(
				principal.external_id,
				&principal.email,
				false,
				OffsetDateTime::now_utc() - Duration::hours(1),
			)
			.unwrap();

		assert_eq!(
			authenticate_once(&state, &bearer(&token)).await,
			Err(ErrorType::InvalidCredential)
		);
	}

	#[tokio::test]
	async fn unknown_and_inactive_principals_are_invalid() {
		let state = test_utils::state().await;
		let stranger = state
			.tokens
			.generate_access_token(uuid::Uuid::new_v4(), "ghost@example.com", false)
			.unwrap();
		assert_eq!(
			authenticate_once(&state, &bearer(&stranger)).await,
			Err(ErrorType::InvalidCredential)
		);

		let principal = test_utils::create_principal(&state, "skipper@example.com").await;
		let token = test_utils::access_token(&state, &principal);
		let mut connection = state.database.acquire().await.unwrap();
		db::set_user_active(&mut connection, principal.id, false)
			.await
			.unwrap();
		drop(connection);

		assert_eq!(
			authenticate_once(&state, &bearer(&token)).await,
			Err(ErrorType::InvalidCredential)
		);
	}

	#[tokio::test]
	async fn layer_short_circuits_unauthenticated_requests() {
		let state = test_utils::state().await;
		let router = Router::new().mount_authenticated(
			"/protected",
			get(|| async { "handled" }),
			&state,
		);

		let response = router
			.clone()
			.oneshot(Request::get("/protected").body(Body::empty()).unwrap())
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::FORBIDDEN);

		let response = router
			.oneshot(
				Request::get("/protected")
					.header(header::AUTHORIZATION, "Bearer not.a.token")
					.body(Body::empty())
					.unwrap(),
			)
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
	}
}
