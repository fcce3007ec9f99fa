//! File credentials cache for Kerberos tickets.
//!
//! A cache stores the tickets of a principal so different programs can use
//! them without authenticating again. This crate reads and writes the MIT
//! file format (versions 1 to 4), merges new tickets into the cache and
//! selects the default TGT and the impersonated credential, if any.

pub mod core;
pub mod error;

pub use crate::error::{Error, Result};
