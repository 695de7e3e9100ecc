mod auth;
mod error;
mod principal;
mod resource;
mod response;
mod token_data;

pub use self::{auth::*, error::*, principal::*, resource::*, response::*, token_data::*};
