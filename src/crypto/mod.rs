//! Cryptographic primitives used while preparing messages and protecting
//! records.
//!
//! Functions here return computed values; callers decide what to log.

mod hash;
mod hkdf;
mod prf;
mod signing;
pub mod srp;

pub use hash::{digest, hmac, Hash};
pub use self::hkdf::hkdf_expand_label;
pub use prf::{key_expansion, prf_tls12};
pub use signing::sign_data;
