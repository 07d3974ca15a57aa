//! Concrete price history providers

pub mod alpha_vantage;
pub mod memory;
pub mod yahoo;

pub use alpha_vantage::AlphaVantageProvider;
pub use memory::MemoryProvider;
pub use yahoo::YahooProvider;
