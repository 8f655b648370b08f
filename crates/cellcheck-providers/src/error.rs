//! Provider error types.
//!
//! The error enum lives in `cellcheck-core` so the gateway can classify
//! failures without depending on this crate.

pub use cellcheck_core::error::ProviderError;
