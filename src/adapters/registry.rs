//! Vendor adapter registry
//!
//! Maps vendor ids to adapter implementations. The registry is built once
//! from configuration and shared read-only by every pipeline run.

use super::vendor::{CernerAdapter, EpicAdapter, GenericAdapter, Hl7v2Adapter, VendorAdapter};
use super::RawPayload;
use crate::config::VendorsConfig;
use crate::domain::{AdapterError, AegisError, AttributeBag, Result, VendorId};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Registry of enabled vendor adapters, keyed by canonical vendor id
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: BTreeMap<VendorId, Arc<dyn VendorAdapter>>,
}

impl AdapterRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with every built-in adapter
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(EpicAdapter::new()));
        registry.register(Arc::new(CernerAdapter::new()));
        registry.register(Arc::new(GenericAdapter::new()));
        registry.register(Arc::new(Hl7v2Adapter::new()));
        registry
    }

    /// Creates a registry holding only the vendors enabled in configuration
    ///
    /// # Errors
    ///
    /// Returns `AegisError::Configuration` for an unknown vendor name
    pub fn from_config(config: &VendorsConfig) -> Result<Self> {
        let builtin = Self::with_builtin();
        let mut registry = Self::new();

        for name in &config.enabled {
            let id = VendorId::new(name.as_str()).map_err(AegisError::Configuration)?;
            let adapter = builtin.adapters.get(&id).cloned().ok_or_else(|| {
                AegisError::Configuration(format!("No built-in adapter for vendor '{name}'"))
            })?;
            registry.register(adapter);
        }

        tracing::debug!(vendors = ?registry.vendors(), "Adapter registry built");
        Ok(registry)
    }

    /// Registers an adapter under its vendor id, replacing any previous one
    pub fn register(&mut self, adapter: Arc<dyn VendorAdapter>) {
        self.adapters.insert(adapter.vendor().clone(), adapter);
    }

    /// Looks up the adapter for a vendor id (case-insensitive)
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::UnsupportedVendor` when no adapter is registered
    pub fn get(&self, vendor: &str) -> std::result::Result<Arc<dyn VendorAdapter>, AdapterError> {
        VendorId::new(vendor)
            .ok()
            .and_then(|id| self.adapters.get(&id).cloned())
            .ok_or_else(|| AdapterError::UnsupportedVendor {
                vendor: vendor.to_string(),
            })
    }

    /// Translates a raw payload with the adapter registered for `vendor`
    ///
    /// # Examples
    ///
    /// ```
    /// use aegis::adapters::{AdapterRegistry, RawPayload};
    /// use aegis::domain::AdapterError;
    /// use serde_json::json;
    ///
    /// let registry = AdapterRegistry::with_builtin();
    /// let payload = RawPayload::Json(json!({"PAT_MRN": "patient-123"}));
    ///
    /// assert!(registry.adapt(&payload, "EPIC").is_ok());
    /// assert!(matches!(
    ///     registry.adapt(&payload, "meditech"),
    ///     Err(AdapterError::UnsupportedVendor { .. })
    /// ));
    /// ```
    pub fn adapt(
        &self,
        payload: &RawPayload,
        vendor: &str,
    ) -> std::result::Result<AttributeBag, AdapterError> {
        self.get(vendor)?.adapt(payload)
    }

    /// Registered vendor ids in sorted order
    pub fn vendors(&self) -> Vec<&str> {
        self.adapters.keys().map(VendorId::as_str).collect()
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("vendors", &self.vendors())
            .finish()
    }
}
