use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use cwf_help_types::HelpModule;
use tracing::debug;

use super::{HelpSet, HelpSetFactory};

/// Memoizes help sets by module key. Failed loads are retried on the next request.
#[derive(Debug)]
pub struct HelpSetCache {
    factory: HelpSetFactory,
    help_sets: Mutex<HashMap<String, Arc<HelpSet>>>,
}

impl HelpSetCache {
    #[must_use]
    pub fn new(factory: HelpSetFactory) -> Self {
        Self {
            factory,
            help_sets: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn factory(&self) -> &HelpSetFactory {
        &self.factory
    }

    #[must_use]
    pub fn get(&self, module: &HelpModule) -> Option<Arc<HelpSet>> {
        let key = module.key();

        if let Some(help_set) = self.lock().get(&key) {
            return Some(Arc::clone(help_set));
        }

        let help_set = self.factory.create(module)?;
        debug!("Cached help set {key}");
        Some(Arc::clone(
            self.lock().entry(key).or_insert(help_set),
        ))
    }

    pub fn remove(&self, module: &HelpModule) -> Option<Arc<HelpSet>> {
        self.lock().remove(&module.key())
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<HelpSet>>> {
        self.help_sets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
