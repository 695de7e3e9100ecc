//! The authorization core of the API: minting and checking credentials,
//! hashing passwords, and deciding who owns what.

/// Walks resources up to the travellers of their trip
mod ownership;
/// Argon2id hashing of account passwords
mod password;
/// Access and refresh tokens
mod token;

pub use self::{ownership::*, password::*, token::*};
