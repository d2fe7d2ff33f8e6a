pub mod registry;
pub mod traits;

// API provider implementations
pub mod google_finance;
pub mod yahoo_finance;
