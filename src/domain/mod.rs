// Domain layer: models and the service port. The HTTP client lives in adapters.

pub mod model;
pub mod ports;
