//! # IAP
//!
//! Asynchronous in-app purchase broker. Re-exports [`iap_core`] and, with the `in-memory`
//! feature, the [`iap_mem`] backend.

#![deny(missing_docs)]

pub use iap_core::*;

#[cfg(feature = "in-memory")]
/// In-memory store backend.
pub mod mem {
    //! Contains the in-memory payment queue used for tests and development.
    pub use iap_mem::*;
}

pub mod prelude {
    //! The prelude module for the `iap` crate.
    pub use iap_core::prelude::*;

    #[cfg(feature = "in-memory")]
    pub use super::mem::*;
}
