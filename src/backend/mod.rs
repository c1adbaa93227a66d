//! Backend layer: capability contracts, vendor adapters, registry and routing.
//!
//! The pieces stack leaf-first:
//!
//! - [`traits`] - what a text, image or video backend must offer
//! - [`providers`] - one adapter per vendor
//! - [`registry`] - adapters that constructed, per kind, in registration order
//! - [`router`] - which registered adapter serves a given request

pub mod artifacts;
pub mod error;
pub mod providers;
pub mod registry;
pub mod router;
pub mod traits;

pub use error::{BackendFailure, GenerationError, RegistryError, RoutingError};
pub use providers::Vendor;
pub use registry::{Adapter, BackendEntry, Registry};
pub use router::{Router, VIDEO_PRECEDENCE};
pub use traits::{ChatFamily, ContinuationHandle, ImageCapability, TextCapability, VideoCapability};
