pub mod http_provider;
pub mod static_provider;

pub use http_provider::HttpRateSource;
pub use static_provider::StaticRateSource;
