pub mod client;
pub mod types;

pub use client::{RateClientError, RateSource, TiingoClient};
