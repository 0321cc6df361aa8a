//! Registry of installed help modules.
//!
//! Modules are keyed by [`HelpModule::key`], so localized variants of one
//! module (`id_en`, `id_en_US`) coexist. Lookups fall back from the most
//! specific locale to the base module.

use std::collections::BTreeMap;

use cwf_help_types::HelpModule;
use tracing::{debug, info};

#[derive(Debug, Default, Clone)]
pub struct HelpModuleRegistry {
    modules: BTreeMap<String, HelpModule>,
}

impl HelpModuleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module, replacing any module with the same key.
    pub fn register(&mut self, module: HelpModule) {
        let key = module.key();
        info!("Registered help module {key}");
        if self.modules.insert(key.clone(), module).is_some() {
            debug!("Replaced previous registration of {key}");
        }
    }

    pub fn unregister(&mut self, key: &str) -> Option<HelpModule> {
        self.modules.remove(key)
    }

    /// Find a module by key, stripping trailing `_xx` locale segments until
    /// a match is found (`a_en_US`, then `a_en`, then `a`).
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&HelpModule> {
        let mut key = id;
        loop {
            if let Some(module) = self.modules.get(key) {
                return Some(module);
            }
            key = &key[..key.rfind('_')?];
        }
    }

    /// Find the variant of a module best matching `locale`.
    #[must_use]
    pub fn get_localized(&self, id: &str, locale: &str) -> Option<&HelpModule> {
        if locale.is_empty() {
            self.get(id)
        } else {
            self.get(&format!("{id}_{locale}"))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &HelpModule> {
        self.modules.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl FromIterator<HelpModule> for HelpModuleRegistry {
    fn from_iter<I: IntoIterator<Item = HelpModule>>(iter: I) -> Self {
        let mut registry = Self::new();
        for module in iter {
            registry.register(module);
        }
        registry
    }
}
