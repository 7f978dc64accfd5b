//! # `cordon-std`
//!
//! "std extensions" shared across `cordon` crates. Anything in here must not
//! depend on anything outside of [`std`], so that every other crate in the
//! workspace can pull it in for free.

pub mod array;
pub mod backoff;
pub mod const_utils;
pub mod ttl_cache;
