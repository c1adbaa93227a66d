//! Backend registry.
//!
//! Holds every successfully constructed adapter, partitioned by capability
//! kind and kept in registration order. Built once when the orchestrator is
//! constructed and never mutated afterwards.

use super::error::RegistryError;
use super::providers::Vendor;
use super::traits::{ImageCapability, TextCapability, VideoCapability};
use crate::config::SwitchboardConfig;
use crate::types::CapabilityKind;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// A live adapter tagged with the contract it implements
#[derive(Debug, Clone)]
pub enum Adapter {
    Text(Arc<dyn TextCapability>),
    Image(Arc<dyn ImageCapability>),
    Video(Arc<dyn VideoCapability>),
}

impl Adapter {
    /// Kind of contract the adapter implements
    pub fn kind(&self) -> CapabilityKind {
        match self {
            Adapter::Text(_) => CapabilityKind::Text,
            Adapter::Image(_) => CapabilityKind::Image,
            Adapter::Video(_) => CapabilityKind::Video,
        }
    }
}

/// Identity plus live adapter
#[derive(Debug, Clone)]
pub struct BackendEntry {
    identity: String,
    adapter: Adapter,
}

impl BackendEntry {
    pub fn new(identity: impl Into<String>, adapter: Adapter) -> Self {
        Self {
            identity: identity.into(),
            adapter,
        }
    }

    /// Convenience constructor for a text backend
    pub fn text(identity: impl Into<String>, adapter: Arc<dyn TextCapability>) -> Self {
        Self::new(identity, Adapter::Text(adapter))
    }

    /// Convenience constructor for an image backend
    pub fn image(identity: impl Into<String>, adapter: Arc<dyn ImageCapability>) -> Self {
        Self::new(identity, Adapter::Image(adapter))
    }

    /// Convenience constructor for a video backend
    pub fn video(identity: impl Into<String>, adapter: Arc<dyn VideoCapability>) -> Self {
        Self::new(identity, Adapter::Video(adapter))
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn kind(&self) -> CapabilityKind {
        self.adapter.kind()
    }

    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    pub fn as_text(&self) -> Option<&Arc<dyn TextCapability>> {
        match &self.adapter {
            Adapter::Text(adapter) => Some(adapter),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&Arc<dyn ImageCapability>> {
        match &self.adapter {
            Adapter::Image(adapter) => Some(adapter),
            _ => None,
        }
    }

    pub fn as_video(&self) -> Option<&Arc<dyn VideoCapability>> {
        match &self.adapter {
            Adapter::Video(adapter) => Some(adapter),
            _ => None,
        }
    }
}

/// Registered backends per capability kind
#[derive(Debug, Clone, Default)]
pub struct Registry {
    partitions: HashMap<CapabilityKind, Vec<BackendEntry>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct every vendor whose precondition the configuration satisfies.
    ///
    /// A vendor that fails to construct is logged and skipped. The video
    /// fallback is registered when no real video vendor made it in.
    pub fn from_config(config: &SwitchboardConfig) -> Self {
        let mut registry = Self::new();

        for vendor in Vendor::ALL.iter().filter(|v| !v.is_fallback()) {
            registry.try_register_vendor(*vendor, config);
        }

        for fallback in Vendor::ALL.iter().filter(|v| v.is_fallback()) {
            if registry.is_empty(fallback.kind()) {
                registry.try_register_vendor(*fallback, config);
            }
        }

        for kind in CapabilityKind::ALL {
            info!(
                kind = %kind,
                backends = ?registry.list_identities(kind),
                "Registry partition ready"
            );
        }
        registry
    }

    fn try_register_vendor(&mut self, vendor: Vendor, config: &SwitchboardConfig) {
        match vendor.build(config) {
            Ok(Some(adapter)) => {
                if let Err(e) = self.register(BackendEntry::new(vendor.identity(), adapter)) {
                    warn!(vendor = %vendor, error = %e, "Skipping vendor");
                }
            }
            Ok(None) => {
                tracing::debug!(vendor = %vendor, "Vendor not configured, skipping");
            }
            Err(e) => {
                warn!(vendor = %vendor, error = %e, "Vendor failed to construct, skipping");
            }
        }
    }

    /// Add an entry to its kind's partition.
    ///
    /// Identities are unique within a partition; a duplicate is rejected and
    /// the existing entry is kept.
    pub fn register(&mut self, entry: BackendEntry) -> Result<(), RegistryError> {
        let kind = entry.kind();
        let partition = self.partitions.entry(kind).or_default();
        if partition.iter().any(|e| e.identity == entry.identity) {
            return Err(RegistryError::DuplicateIdentity {
                kind,
                identity: entry.identity,
            });
        }
        partition.push(entry);
        Ok(())
    }

    /// Identities registered for `kind`, in registration order
    pub fn list_identities(&self, kind: CapabilityKind) -> Vec<String> {
        self.partitions
            .get(&kind)
            .map(|entries| entries.iter().map(|e| e.identity.clone()).collect())
            .unwrap_or_default()
    }

    /// Look up an entry by kind and identity
    pub fn get(&self, kind: CapabilityKind, identity: &str) -> Option<&BackendEntry> {
        self.partitions
            .get(&kind)
            .and_then(|entries| entries.iter().find(|e| e.identity == identity))
    }

    /// Whether `identity` is registered for `kind`
    pub fn contains(&self, kind: CapabilityKind, identity: &str) -> bool {
        self.get(kind, identity).is_some()
    }

    /// Whether `kind` has no registered backend
    pub fn is_empty(&self, kind: CapabilityKind) -> bool {
        self.partitions
            .get(&kind)
            .map_or(true, |entries| entries.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::providers::{DuckDuckGoProvider, PlaceholderVideoProvider};
    use std::path::PathBuf;

    #[test]
    fn test_default_config_registry() {
        let registry = Registry::from_config(&SwitchboardConfig::default());

        assert_eq!(registry.list_identities(CapabilityKind::Text), vec!["duckduckgo"]);
        assert!(registry.list_identities(CapabilityKind::Image).is_empty());
        assert_eq!(registry.list_identities(CapabilityKind::Video), vec!["placeholder"]);
    }

    #[test]
    fn test_registration_order_with_credentials() {
        let mut config = SwitchboardConfig::default();
        config.credentials.xai_api_key = Some("xai-key".into());
        config.credentials.openai_api_key = Some("sk-key".into());
        config.credentials.gemini_api_key = Some("gem-key".into());
        config.credentials.replicate_api_token = Some("r8_key".into());

        let registry = Registry::from_config(&config);
        assert_eq!(
            registry.list_identities(CapabilityKind::Text),
            vec!["openai", "gemini", "grok", "duckduckgo"]
        );
        assert_eq!(registry.list_identities(CapabilityKind::Image), vec!["dalle"]);
        // A real video vendor suppresses the fallback
        assert_eq!(registry.list_identities(CapabilityKind::Video), vec!["replicate"]);
    }

    #[test]
    fn test_duplicate_identity_rejected() {
        let mut registry = Registry::new();
        registry
            .register(BackendEntry::text("duckduckgo", Arc::new(DuckDuckGoProvider::new())))
            .unwrap();

        let err = registry
            .register(BackendEntry::text("duckduckgo", Arc::new(DuckDuckGoProvider::new())))
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateIdentity {
                kind: CapabilityKind::Text,
                identity: "duckduckgo".into()
            }
        );
        assert_eq!(registry.list_identities(CapabilityKind::Text).len(), 1);
    }

    #[test]
    fn test_same_identity_in_different_kinds() {
        let mut registry = Registry::new();
        registry
            .register(BackendEntry::text("shared", Arc::new(DuckDuckGoProvider::new())))
            .unwrap();
        registry
            .register(BackendEntry::video(
                "shared",
                Arc::new(PlaceholderVideoProvider::new(PathBuf::from("unused"))),
            ))
            .unwrap();

        assert!(registry.contains(CapabilityKind::Text, "shared"));
        assert!(registry.contains(CapabilityKind::Video, "shared"));
        assert!(!registry.contains(CapabilityKind::Image, "shared"));
        assert!(registry
            .get(CapabilityKind::Video, "shared")
            .and_then(BackendEntry::as_video)
            .is_some());
    }
}
