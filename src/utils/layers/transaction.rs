use std::{
	convert::Infallible,
	sync::Arc,
	task::{Context, Poll},
};

use axum::{
	body::Body,
	http::Request,
	response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use sqlx::{Pool, Transaction};
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use tower::{Layer, Service};

use crate::prelude::*;

/// The database transaction of a single request. The gate layers and the
/// handler all run their queries on it, so the ownership check and the work it
/// guards see the same state.
///
/// The transaction is only begun by the first call to
/// [`connection`][Self::connection], so a request that is refused before it
/// needs the database never touches it.
#[derive(Clone)]
pub struct RequestTransaction {
	database: Pool<DatabaseType>,
	transaction: Arc<Mutex<Option<Transaction<'static, DatabaseType>>>>,
}

impl RequestTransaction {
	/// A transaction on `database` that is yet to be begun
	pub fn new(database: Pool<DatabaseType>) -> Self {
		Self {
			database,
			transaction: Arc::new(Mutex::new(None)),
		}
	}

	/// Locks the connection of the transaction, beginning the transaction if
	/// this is the first use. The lock must be released before the request is
	/// handed to the next layer.
	pub async fn connection(
		&self,
	) -> Result<MappedMutexGuard<'_, DatabaseConnection>, sqlx::Error> {
		let mut transaction = self.transaction.lock().await;
		if transaction.is_none() {
			trace!("Beginning request transaction");
			*transaction = Some(self.database.begin().await?);
		}

		MutexGuard::try_map(transaction, |transaction| transaction.as_deref_mut())
			.map_err(|_| sqlx::Error::Protocol("request transaction was not begun".into()))
	}

	/// Takes the transaction back once every clone handed to the request has
	/// been dropped. Returns `Err` if a clone is still alive.
	fn into_inner(self) -> Result<Option<Transaction<'static, DatabaseType>>, Self> {
		let Self {
			database,
			transaction,
		} = self;
		Arc::try_unwrap(transaction)
			.map(Mutex::into_inner)
			.map_err(|transaction| Self {
				database,
				transaction,
			})
	}
}

/// The [`tower::Layer`] that gives every request a [`RequestTransaction`] in
/// its extensions. Once the inner service has responded, the transaction is
/// committed if the response is not an error, and rolled back otherwise.
///
/// It must wrap the [`AuthenticationLayer`][super::AuthenticationLayer], since
/// both gate stages run their queries on the request transaction.
#[derive(Clone)]
pub struct DatabaseTransactionLayer {
	state: AppState,
}

impl DatabaseTransactionLayer {
	/// Creates the layer, beginning transactions on the pool of `state`
	pub fn new(state: AppState) -> Self {
		Self { state }
	}
}

impl<S> Layer<S> for DatabaseTransactionLayer {
	type Service = DatabaseTransactionService<S>;

	fn layer(&self, inner: S) -> Self::Service {
		DatabaseTransactionService {
			inner,
			state: self.state.clone(),
		}
	}
}

/// The underlying service that runs when the [`DatabaseTransactionLayer`] is
/// used.
#[derive(Clone)]
pub struct DatabaseTransactionService<S> {
	inner: S,
	state: AppState,
}

impl<S> Service<Request<Body>> for DatabaseTransactionService<S>
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

	#[instrument(skip(self, request), name = "DatabaseTransactionService")]
	fn call(&mut self, mut request: Request<Body>) -> Self::Future {
		let transaction = RequestTransaction::new(self.state.database.clone());
		let clone = self.inner.clone();
		let mut inner = std::mem::replace(&mut self.inner, clone);
		Box::pin(async move {
			request.extensions_mut().insert(transaction.clone());

			let response = inner.call(request).await?;

			let transaction = match transaction.into_inner() {
				Ok(Some(transaction)) => transaction,
				Ok(None) => return Ok(response),
				Err(_) => {
					error!("Request transaction outlived the request, rolling it back");
					return Ok(ErrorType::server_error("unable to commit database transaction")
						.into_response());
				}
			};

			let status = response.status();
			if status.is_client_error() || status.is_server_error() {
				debug!("Request failed with {}, rolling back", status);
				if let Err(err) = transaction.rollback().await {
					error!("Failed to roll back database transaction: {}", err);
					return Ok(ErrorType::server_error("unable to rollback database transaction")
						.into_response());
				}
				return Ok(response);
			}

			if let Err(err) = transaction.commit().await {
				error!("Failed to commit database transaction: {}", err);
				return Ok(
					ErrorType::server_error("unable to commit database transaction").into_response(),
				);
			}
			Ok(response)
		})
	}
}
