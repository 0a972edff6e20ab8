pub mod coingecko;
pub mod frankfurter;
pub mod registry;
pub mod traits;
