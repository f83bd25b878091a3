mod cors;
mod headers;
mod otel;

pub use cors::cors_policy;
pub use headers::security_headers;
pub use otel::otel_middleware as otel;
