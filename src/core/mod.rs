pub mod currency;
pub mod error;
pub mod provider;
pub mod quote;
pub mod rates;
