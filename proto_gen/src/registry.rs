//! Dual type registry.
//!
//! Maps every qualified schema type to its lowering in both views. The
//! registry is append-only and shared between file resolutions: writes are
//! serialized behind a lock and a batch of registrations is checked in full
//! before any of it is stored, so a conflicting file leaves no trace.

use crate::config::GeneratorConfig;
use crate::error::{ResolveError, Result};
use crate::lowered::LoweredType;
use crate::views::{HostLowering, NativeKind, View, ViewLowering, WireLowering};
use proto_types::QualifiedName;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

type Key = (QualifiedName, View);

pub struct DualTypeRegistry {
    types: RwLock<HashMap<Key, LoweredType>>,
    host: HostLowering,
    wire: WireLowering,
}

impl DualTypeRegistry {
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            types: RwLock::new(HashMap::new()),
            host: HostLowering::new(config),
            wire: WireLowering,
        }
    }

    pub fn lowering(&self, view: View) -> &dyn ViewLowering {
        match view {
            View::Host => &self.host,
            View::Wire => &self.wire,
        }
    }

    /// Idempotent for an equal type; a different type under the same key is a conflict.
    pub fn register(&self, name: QualifiedName, view: View, ty: LoweredType) -> Result<()> {
        self.register_all(vec![(name, view, ty)])
    }

    /// Registers every entry or none of them.
    pub fn register_all(&self, entries: Vec<(QualifiedName, View, LoweredType)>) -> Result<()> {
        let mut types = self.types.write().unwrap_or_else(PoisonError::into_inner);

        let mut pending: HashMap<Key, LoweredType> = HashMap::new();
        for (name, view, ty) in entries {
            let key = (name, view);
            let existing = types.get(&key).or_else(|| pending.get(&key));
            match existing {
                Some(existing) if *existing == ty => continue,
                Some(existing) => {
                    return Err(ResolveError::RegistryConflict {
                        name: key.0.to_string(),
                        view,
                        existing: existing.to_string(),
                        attempted: ty.to_string(),
                    });
                }
                None => {
                    pending.insert(key, ty);
                }
            }
        }

        for ((name, view), ty) in pending {
            debug!(%name, %view, lowered = %ty, "registered type");
            types.insert((name, view), ty);
        }
        Ok(())
    }

    pub fn get(&self, name: &QualifiedName, view: View) -> Result<LoweredType> {
        self.try_get(name, view)
            .ok_or_else(|| ResolveError::UnknownTypeReference(name.to_string()))
    }

    pub fn try_get(&self, name: &QualifiedName, view: View) -> Option<LoweredType> {
        let types = self.types.read().unwrap_or_else(PoisonError::into_inner);
        types.get(&(name.clone(), view)).cloned()
    }

    pub fn contains(&self, name: &QualifiedName, view: View) -> bool {
        self.try_get(name, view).is_some()
    }

    pub fn get_native(&self, view: View, kind: NativeKind) -> LoweredType {
        self.lowering(view).native(kind)
    }

    pub fn array_of(&self, view: View, ty: LoweredType) -> LoweredType {
        self.lowering(view).array_of(ty)
    }

    pub fn fix_field_name(&self, view: View, raw: &str, is_boolean: bool) -> String {
        self.lowering(view).fix_field_name(raw, is_boolean)
    }

    /// Number of registered (name, view) entries.
    pub fn len(&self) -> usize {
        self.types.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DualTypeRegistry {
    fn default() -> Self {
        Self::new(&GeneratorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lowered::TypeKind;
    use assert_matches::assert_matches;
    use std::sync::Arc;

    fn player() -> LoweredType {
        LoweredType::plain("FGame_Player", TypeKind::Struct)
    }

    #[test]
    fn get_returns_registered_type() {
        let registry = DualTypeRegistry::default();
        let name = QualifiedName::new("game", "Player");
        registry.register(name.clone(), View::Host, player()).unwrap();

        assert_eq!(registry.get(&name, View::Host).unwrap(), player());
        assert_matches!(
            registry.get(&name, View::Wire),
            Err(ResolveError::UnknownTypeReference(n)) if n == "game.Player"
        );
    }

    #[test]
    fn equal_reregistration_is_a_no_op() {
        let registry = DualTypeRegistry::default();
        let name = QualifiedName::new("game", "Player");
        registry.register(name.clone(), View::Host, player()).unwrap();
        registry
            .register(QualifiedName::new(String::from("ga") + "me", "Player"), View::Host, player())
            .unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn conflicting_registration_fails() {
        let registry = DualTypeRegistry::default();
        let name = QualifiedName::new("game", "Player");
        registry.register(name.clone(), View::Host, player()).unwrap();

        let err = registry
            .register(name, View::Host, LoweredType::plain("FOther", TypeKind::Struct))
            .unwrap_err();
        assert_matches!(err, ResolveError::RegistryConflict { ref name, view: View::Host, .. } if name == "game.Player");
    }

    #[test]
    fn failed_batch_writes_nothing() {
        let registry = DualTypeRegistry::default();
        registry
            .register(QualifiedName::new("game", "Player"), View::Host, player())
            .unwrap();

        let result = registry.register_all(vec![
            (QualifiedName::new("game", "Fresh"), View::Host, LoweredType::plain("FGame_Fresh", TypeKind::Struct)),
            (QualifiedName::new("game", "Player"), View::Host, LoweredType::plain("FOther", TypeKind::Struct)),
        ]);

        assert!(result.is_err());
        assert!(!registry.contains(&QualifiedName::new("game", "Fresh"), View::Host));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn conflict_inside_one_batch_is_detected() {
        let registry = DualTypeRegistry::default();
        let name = QualifiedName::new("game", "Player");
        let result = registry.register_all(vec![
            (name.clone(), View::Wire, player()),
            (name, View::Wire, player().make_ptr()),
        ]);
        assert_matches!(result, Err(ResolveError::RegistryConflict { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn concurrent_idempotent_registration_succeeds() {
        let registry = Arc::new(DualTypeRegistry::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    registry.register(QualifiedName::new("game", "Player"), View::Host, player())
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap().unwrap();
        }
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn view_specific_helpers() {
        let registry = DualTypeRegistry::default();
        assert_eq!(registry.get_native(View::Host, NativeKind::Void).to_string(), "void");
        assert_eq!(registry.array_of(View::Host, player()).to_string(), "TArray<FGame_Player>");
        assert_eq!(registry.fix_field_name(View::Host, "is_alive", true), "bIsAlive");
        assert_eq!(registry.fix_field_name(View::Wire, "is_alive", true), "is_alive");
    }
}
