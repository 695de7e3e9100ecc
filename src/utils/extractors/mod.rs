mod principal;
mod transaction;
