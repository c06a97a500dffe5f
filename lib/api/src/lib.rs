//! HTTP adapter for the PeerLink recommendation service.

pub mod rest;

pub use rest::RestApi;
