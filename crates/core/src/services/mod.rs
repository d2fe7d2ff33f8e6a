pub mod earnings;
pub mod quote_service;
pub mod refresh_service;
pub mod valuation_service;
