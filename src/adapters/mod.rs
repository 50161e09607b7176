// Adapters layer: concrete implementations for external systems.

pub mod tableau;

pub use tableau::{Credentials, Password, Session, TableauServer};
