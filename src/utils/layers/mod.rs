/// Resolves the caller of a request from its bearer token
mod authenticator;
/// Checks that the caller owns the resource a request acts on
mod ownership;
/// Runs every query of a request in one database transaction
mod transaction;

pub use self::{authenticator::*, ownership::*, transaction::*};
