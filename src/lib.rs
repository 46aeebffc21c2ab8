//! Research hub application library.
//!
//! Owns the composition root: settings in, an app registry and the
//! initialized Firebase handles out.

pub mod hub;

pub use hub::Hub;
