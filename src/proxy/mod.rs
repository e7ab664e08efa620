//! Reverse proxy functionality
//!
//! [`Router`] applies the rewrite rules; [`Forwarder`] performs the upstream
//! exchange for whatever destination the router computed.

pub mod router;
pub mod upstream;

pub use router::Router;
pub use upstream::Forwarder;
