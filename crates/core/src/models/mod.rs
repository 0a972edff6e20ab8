pub mod category;
pub mod currency;
pub mod holding;
pub mod portfolio;
pub mod settings;
pub mod summary;
pub mod ticker_memory;
