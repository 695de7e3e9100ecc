use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{models::Principal, prelude::*};

/// Handlers mounted behind the
/// [`AuthenticationLayer`][crate::utils::layers::AuthenticationLayer] read the
/// caller from the request context with this extractor. The principal is put
/// there by the layer, so nothing is looked up again here.
#[axum::async_trait]
impl<S> FromRequestParts<S> for Principal
where
	S: Send + Sync,
{
	type Rejection = ErrorType;

	async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
		parts.extensions.get::<Principal>().cloned().ok_or_else(|| {
			error!(
				"No principal in the request context for `{}`. Is the route mounted without authentication?",
				parts.uri.path()
			);
			ErrorType::InvalidCredential
		})
	}
}

#[cfg(test)]
mod tests {
	use axum::{extract::FromRequestParts, http::Request};
	use uuid::Uuid;

	use crate::models::{ErrorType, Principal};

	#[tokio::test]
	async fn reads_the_principal_from_the_extensions() {
		let principal = Principal {
			id: 7,
			external_id: Uuid::new_v4(),
			email: "skipper@example.com".to_string(),
			active: true,
			admin: false,
		};
		let (mut parts, _) = Request::builder()
			.uri("/api/auth/status")
			.extension(principal.clone())
			.body(())
			.unwrap()
			.into_parts();

		assert_eq!(
			Principal::from_request_parts(&mut parts, &()).await.unwrap(),
			principal
		);
	}

	#[tokio::test]
	async fn missing_context_is_rejected() {
		let (mut parts, _) = Request::builder()
			.uri("/api/auth/status")
			.body(())
			.unwrap()
			.into_parts();

		assert_eq!(
			Principal::from_request_parts(&mut parts, &()).await,
			Err(ErrorType::InvalidCredential)
		);
	}
}
