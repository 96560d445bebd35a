//! Capability registry: capability → Backend Provider, fixed for the life of a
//! vault.
//!
//! Built once from a validated [`BindingTable`] and the provider instances the
//! caller supplies. After construction every capability resolves to exactly one
//! provider; there is no fallback to another backend.

use std::collections::BTreeSet;

use casket_crypto_core::Curve;

use crate::backend::Backend;
use crate::capability::Capability;
use crate::config::BindingTable;
use crate::error::VaultError;
use crate::identity::BackendId;

/// Routing table plus the providers it routes to.
pub struct CapabilityRegistry {
    routes: [BackendId; Capability::COUNT],
    providers: Vec<Box<dyn Backend>>,
}

impl CapabilityRegistry {
    /// Validate `bindings` for `curve` and wire them to `providers`.
    ///
    /// # Errors
    ///
    /// - everything [`BindingTable::validate`] returns
    /// - [`VaultError::Config`] if a bound backend has no provider, a provider
    ///   is supplied twice, or a provider is supplied that nothing is bound to
    /// - [`VaultError::UnsupportedCurve`] if the key provider was built for a
    ///   different curve
    pub fn new(
        bindings: &BindingTable,
        curve: Curve,
        providers: Vec<Box<dyn Backend>>,
    ) -> Result<Self, VaultError> {
        bindings.validate(curve)?;

        let mut routes = [BackendId::HOST_SOFTWARE; Capability::COUNT];
        for capability in Capability::ALL {
            routes[capability.index()] = bindings
                .get(capability)
                .ok_or(VaultError::UnboundCapability(capability))?;
        }

        let mut supplied = BTreeSet::new();
        for provider in &providers {
            if !supplied.insert(provider.id()) {
                return Err(VaultError::Config(format!(
                    "provider for {} supplied twice",
                    provider.id()
                )));
            }
        }
        let referenced = bindings.backends();
        if let Some(missing) = referenced.difference(&supplied).next() {
            return Err(VaultError::Config(format!("no provider supplied for {missing}")));
        }
        if let Some(extra) = supplied.difference(&referenced).next() {
            return Err(VaultError::Config(format!(
                "provider for {extra} is not bound to any capability"
            )));
        }

        let registry = Self { routes, providers };
        let key_backend = registry.provider(Capability::KeyGenerate)?;
        if key_backend.curve() != curve {
            return Err(VaultError::UnsupportedCurve {
                curve,
                backend: key_backend.id(),
            });
        }

        for capability in Capability::ALL {
            tracing::debug!(
                %capability,
                backend = %registry.routes[capability.index()],
                "capability bound"
            );
        }
        Ok(registry)
    }

    /// Identity of the backend serving `capability`.
    ///
    /// # Errors
    ///
    /// [`VaultError::UnsupportedCapability`] if that backend cannot provide it.
    pub fn resolve(&self, capability: Capability) -> Result<BackendId, VaultError> {
        let backend = self.routes[capability.index()];
        if backend.supports(capability) {
            Ok(backend)
        } else {
            Err(VaultError::UnsupportedCapability {
                capability,
                backend,
            })
        }
    }

    /// Provider serving `capability`.
    ///
    /// # Errors
    ///
    /// As [`CapabilityRegistry::resolve`].
    pub fn provider(&self, capability: Capability) -> Result<&dyn Backend, VaultError> {
        let id = self.resolve(capability)?;
        match self.providers.iter().find(|p| p.id() == id) {
            Some(provider) => {
                let provider: &dyn Backend = &**provider;
                Ok(provider)
            }
            None => Err(VaultError::Config(format!("no provider supplied for {id}"))),
        }
    }

    /// Provider serving `capability`, mutably.
    ///
    /// # Errors
    ///
    /// As [`CapabilityRegistry::resolve`].
    pub fn provider_mut(&mut self, capability: Capability) -> Result<&mut dyn Backend, VaultError> {
        let id = self.resolve(capability)?;
        match self.providers.iter_mut().find(|p| p.id() == id) {
            Some(provider) => {
                let provider: &mut dyn Backend = &mut **provider;
                Ok(provider)
            }
            None => Err(VaultError::Config(format!("no provider supplied for {id}"))),
        }
    }

    /// Every provider, with the one bound to `Init` first.
    pub fn providers_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Backend>> {
        let init = self.routes[Capability::Init.index()];
        self.providers.sort_by_key(|p| p.id() != init);
        self.providers.iter_mut()
    }
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for capability in Capability::ALL {
            map.entry(&capability, &self.routes[capability.index()]);
        }
        map.finish()
    }
}
