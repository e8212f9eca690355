/*!
 * Named session providers.
 */

use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use super::provider::{Provider, VitessProvider, PROVIDER_NAME};
use crate::database::Connector;
use crate::errors::SessionError;

/// Providers available to a session manager, keyed by name
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, Arc<dyn Provider>>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the `vitess` provider
    pub fn with_defaults(connector: Arc<dyn Connector>) -> Self {
        let registry = Self::new();
        registry
            .providers
            .write()
            .insert(PROVIDER_NAME.to_string(), Arc::new(VitessProvider::new(connector)));
        registry
    }

    /// Add a provider under `name`. Names cannot be reused.
    pub fn register(&self, name: &str, provider: Arc<dyn Provider>) -> Result<(), SessionError> {
        let mut providers = self.providers.write();
        if providers.contains_key(name) {
            return Err(SessionError::DuplicateProvider(name.to_string()));
        }
        debug!("Registered session provider `{}`", name);
        providers.insert(name.to_string(), provider);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Provider>, SessionError> {
        self.providers
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| SessionError::UnknownProvider(name.to_string()))
    }

    /// Registered provider names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.read().keys().cloned().collect();
        names.sort();
        names
    }
}
