//! Backend selection.
//!
//! The router holds the active selection per kind and turns a request
//! (kind plus optional explicit identity) into a registered entry. Video
//! requests without an explicit identity ignore the active selection and walk
//! a fixed precedence list instead.

use super::error::RoutingError;
use super::registry::{BackendEntry, Registry};
use crate::config::DefaultsConfig;
use crate::types::CapabilityKind;
use std::collections::BTreeMap;

/// Video backends in the order they are preferred
pub const VIDEO_PRECEDENCE: [&str; 2] = ["replicate", "placeholder"];

/// Active selection per capability kind
#[derive(Debug, Clone, Default)]
pub struct Router {
    active: BTreeMap<CapabilityKind, String>,
}

impl Router {
    /// Create a router with no active selections
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a router with the configured default text and image backends
    pub fn from_defaults(defaults: &DefaultsConfig) -> Self {
        Self::new()
            .with_selection(CapabilityKind::Text, &defaults.text_provider)
            .with_selection(CapabilityKind::Image, &defaults.image_generator)
    }

    /// Set an initial selection without checking the registry
    pub fn with_selection(mut self, kind: CapabilityKind, identity: impl Into<String>) -> Self {
        self.active.insert(kind, identity.into());
        self
    }

    /// Currently selected identity for `kind`
    pub fn active_selection(&self, kind: CapabilityKind) -> Option<&str> {
        self.active.get(&kind).map(String::as_str)
    }

    /// Pick the entry that should serve a request
    pub fn resolve<'r>(
        &self,
        registry: &'r Registry,
        kind: CapabilityKind,
        requested: Option<&str>,
    ) -> Result<&'r BackendEntry, RoutingError> {
        if let Some(identity) = requested {
            return registry
                .get(kind, identity)
                .ok_or_else(|| RoutingError::UnknownBackend {
                    kind,
                    requested: identity.to_string(),
                    available: registry.list_identities(kind),
                });
        }

        if kind == CapabilityKind::Video {
            return VIDEO_PRECEDENCE
                .iter()
                .find_map(|identity| registry.get(kind, identity))
                .ok_or(RoutingError::NoBackendAvailable { kind });
        }

        let selected = self.active_selection(kind).unwrap_or_default();
        registry
            .get(kind, selected)
            .ok_or_else(|| RoutingError::ActiveSelectionUnavailable {
                kind,
                selected: selected.to_string(),
                available: registry.list_identities(kind),
            })
    }

    /// Switch the active selection. Returns false and leaves the selection
    /// untouched when `identity` is not registered for `kind`.
    pub fn set_active_selection(
        &mut self,
        registry: &Registry,
        kind: CapabilityKind,
        identity: &str,
    ) -> bool {
        self.try_set_active_selection(registry, kind, identity)
            .is_ok()
    }

    /// Switch the active selection, reporting why it was refused
    pub fn try_set_active_selection(
        &mut self,
        registry: &Registry,
        kind: CapabilityKind,
        identity: &str,
    ) -> Result<(), RoutingError> {
        if !registry.contains(kind, identity) {
            return Err(RoutingError::UnknownBackend {
                kind,
                requested: identity.to_string(),
                available: registry.list_identities(kind),
            });
        }
        tracing::info!(kind = %kind, backend = identity, "Active selection changed");
        self.active.insert(kind, identity.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::providers::{DuckDuckGoProvider, PlaceholderVideoProvider};
    use std::path::PathBuf;
    use std::sync::Arc;

    fn registry(text: &[&str], video: &[&str]) -> Registry {
        let mut registry = Registry::new();
        for id in text {
            registry
                .register(BackendEntry::text(*id, Arc::new(DuckDuckGoProvider::new())))
                .unwrap();
        }
        for id in video {
            registry
                .register(BackendEntry::video(
                    *id,
                    Arc::new(PlaceholderVideoProvider::new(PathBuf::from("unused"))),
                ))
                .unwrap();
        }
        registry
    }

    #[test]
    fn test_explicit_identity() {
        let registry = registry(&["alpha", "beta"], &[]);
        let router = Router::new().with_selection(CapabilityKind::Text, "alpha");

        let entry = router
            .resolve(&registry, CapabilityKind::Text, Some("beta"))
            .unwrap();
        assert_eq!(entry.identity(), "beta");

        let err = router
            .resolve(&registry, CapabilityKind::Text, Some("gamma"))
            .unwrap_err();
        assert_eq!(
            err,
            RoutingError::UnknownBackend {
                kind: CapabilityKind::Text,
                requested: "gamma".into(),
                available: vec!["alpha".into(), "beta".into()],
            }
        );
    }

    #[test]
    fn test_active_selection_fallback() {
        let registry = registry(&["alpha"], &[]);

        let router = Router::new().with_selection(CapabilityKind::Text, "alpha");
        let entry = router.resolve(&registry, CapabilityKind::Text, None).unwrap();
        assert_eq!(entry.identity(), "alpha");

        let router = Router::new().with_selection(CapabilityKind::Text, "openai");
        let err = router.resolve(&registry, CapabilityKind::Text, None).unwrap_err();
        assert!(matches!(err, RoutingError::ActiveSelectionUnavailable { .. }));

        let err = Router::new()
            .resolve(&registry, CapabilityKind::Image, None)
            .unwrap_err();
        assert!(matches!(err, RoutingError::ActiveSelectionUnavailable { .. }));
    }

    #[test]
    fn test_video_precedence() {
        let router = Router::new().with_selection(CapabilityKind::Video, "placeholder");

        let both = registry(&[], &["placeholder", "replicate"]);
        let entry = router.resolve(&both, CapabilityKind::Video, None).unwrap();
        assert_eq!(entry.identity(), "replicate");

        let fallback = registry(&[], &["placeholder"]);
        let entry = router.resolve(&fallback, CapabilityKind::Video, None).unwrap();
        assert_eq!(entry.identity(), "placeholder");

        let neither = registry(&[], &["custom"]);
        let err = router.resolve(&neither, CapabilityKind::Video, None).unwrap_err();
        assert_eq!(err, RoutingError::NoBackendAvailable { kind: CapabilityKind::Video });

        // Explicit identities still work for video
        let entry = router
            .resolve(&neither, CapabilityKind::Video, Some("custom"))
            .unwrap();
        assert_eq!(entry.identity(), "custom");
    }

    #[test]
    fn test_set_active_selection() {
        let registry = registry(&["alpha", "beta"], &[]);
        let mut router = Router::new().with_selection(CapabilityKind::Text, "alpha");

        assert!(router.set_active_selection(&registry, CapabilityKind::Text, "beta"));
        assert_eq!(router.active_selection(CapabilityKind::Text), Some("beta"));

        assert!(!router.set_active_selection(&registry, CapabilityKind::Text, "nonexistent"));
        assert_eq!(router.active_selection(CapabilityKind::Text), Some("beta"));

        let err = router
            .try_set_active_selection(&registry, CapabilityKind::Image, "alpha")
            .unwrap_err();
        assert!(matches!(err, RoutingError::UnknownBackend { .. }));
        assert_eq!(router.active_selection(CapabilityKind::Image), None);
    }
}
