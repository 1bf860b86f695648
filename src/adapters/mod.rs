//! Vendor integrations for Aegis.
//!
//! This module turns raw vendor payloads into attribute bags:
//!
//! - [`payload`] - Raw payload shapes (JSON documents, HL7 v2 text)
//! - [`vendor`] - The `VendorAdapter` trait and per-vendor implementations
//! - [`registry`] - Vendor id to adapter lookup
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern**: each vendor owns its field-name
//! mapping table behind a common trait, so the normalizer never branches on
//! vendor.
//!
//! ```rust
//! use aegis::adapters::{AdapterRegistry, RawPayload};
//!
//! let registry = AdapterRegistry::with_builtin();
//! let message = "MSH|^~\\&|LAB|HOSP|||20240301103000||ORU^R01|1|P|2.5\rPID|1||patient-123";
//! let bag = registry
//!     .adapt(&RawPayload::Text(message.to_string()), "hl7v2")
//!     .unwrap();
//! assert_eq!(bag.vendor().as_str(), "hl7v2");
//! ```

pub mod payload;
pub mod registry;
pub mod vendor;

pub use payload::RawPayload;
pub use registry::AdapterRegistry;
pub use vendor::VendorAdapter;

/// Vendor ids with a built-in adapter
pub const BUILTIN_VENDORS: [&str; 4] = [
    vendor::EpicAdapter::VENDOR,
    vendor::CernerAdapter::VENDOR,
    vendor::GenericAdapter::VENDOR,
    vendor::Hl7v2Adapter::VENDOR,
];
