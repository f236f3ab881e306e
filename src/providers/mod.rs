pub mod static_markets;

pub use static_markets::StaticMarketProvider;
