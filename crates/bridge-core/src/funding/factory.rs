//! Registry of funding-rate publishers, one per enabled provider.
//!
//! The registry itself is built once at startup from validated
//! configuration. Each publisher is constructed on first use, so a
//! provider whose signing key is missing only fails when someone asks for
//! it.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use super::solana::SolanaFundingPublisher;
use super::FundingRatePublisher;
use crate::config::{BridgeConfig, FundingRateConfig};
use crate::error::{BridgeError, Result};
use crate::types::BlockchainProviderType;

type Constructor = Box<dyn Fn() -> Result<Arc<dyn FundingRatePublisher>> + Send + Sync>;

struct Slot {
    constructor: Constructor,
    publisher: OnceCell<Arc<dyn FundingRatePublisher>>,
}

pub struct PublisherFactory {
    enabled: Vec<BlockchainProviderType>,
    primary: BlockchainProviderType,
    slots: HashMap<BlockchainProviderType, Slot>,
}

impl PublisherFactory {
    /// An empty registry for `funding`'s provider list. Register
    /// constructors with [`PublisherFactory::register`].
    pub fn new(funding: &FundingRateConfig) -> Self {
        Self {
            enabled: funding.enabled_providers.clone(),
            primary: funding.primary_provider,
            slots: HashMap::new(),
        }
    }

    /// Registry wired to the built-in publishers.
    ///
    /// Fails when an enabled provider has no publisher implementation.
    pub fn from_config(config: Arc<BridgeConfig>) -> Result<Self> {
        config.validate()?;
        let mut factory = Self::new(&config.blockchain.funding_rate);

        for provider in factory.enabled.clone() {
            factory = match provider {
                BlockchainProviderType::Solana => {
                    let config = Arc::clone(&config);
                    factory.register(provider, move || {
                        let publisher = SolanaFundingPublisher::from_config(&config.solana)?;
                        Ok(Arc::new(publisher) as Arc<dyn FundingRatePublisher>)
                    })
                }
                other => {
                    return Err(BridgeError::Configuration(format!(
                        "provider {other} is enabled but has no funding-rate publisher"
                    )))
                }
            };
        }
        Ok(factory)
    }

    /// Install the constructor for `provider`. Providers that are not
    /// enabled are ignored.
    pub fn register<F>(mut self, provider: BlockchainProviderType, constructor: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn FundingRatePublisher>> + Send + Sync + 'static,
    {
        if !self.enabled.contains(&provider) {
            debug!(%provider, "ignoring publisher for a provider that is not enabled");
            return self;
        }
        self.slots.insert(
            provider,
            Slot {
                constructor: Box::new(constructor),
                publisher: OnceCell::new(),
            },
        );
        self
    }

    pub fn enabled_providers(&self) -> &[BlockchainProviderType] {
        &self.enabled
    }

    pub fn is_provider_available(&self, provider: BlockchainProviderType) -> bool {
        self.slots.contains_key(&provider)
    }

    /// The publisher for `provider`, constructing it on first call.
    pub fn get_publisher(
        &self,
        provider: BlockchainProviderType,
    ) -> Result<Arc<dyn FundingRatePublisher>> {
        let slot = self
            .slots
            .get(&provider)
            .ok_or(BridgeError::NotSupported(provider))?;
        slot.publisher
            .get_or_try_init(|| {
                debug!(%provider, "constructing funding-rate publisher");
                (slot.constructor)()
            })
            .cloned()
    }

    /// The configured primary, else the first enabled provider whose
    /// publisher can be built.
    pub fn get_primary_publisher(&self) -> Result<Arc<dyn FundingRatePublisher>> {
        match self.get_publisher(self.primary) {
            Ok(publisher) => return Ok(publisher),
            Err(e) => warn!(
                provider = %self.primary,
                error_code = e.error_code(),
                error = %e,
                "primary funding-rate publisher unavailable"
            ),
        }

        self.enabled
            .iter()
            .filter(|p| **p != self.primary)
            .find_map(|p| self.get_publisher(*p).ok())
            .ok_or_else(|| {
                BridgeError::Configuration("no funding-rate publisher is available".into())
            })
    }

    /// Every publisher that can be built, in enabled order.
    pub fn get_all_publishers(&self) -> Vec<Arc<dyn FundingRatePublisher>> {
        self.enabled
            .iter()
            .filter_map(|p| match self.get_publisher(*p) {
                Ok(publisher) => Some(publisher),
                Err(e) => {
                    warn!(
                        provider = %p,
                        error_code = e.error_code(),
                        error = %e,
                        "skipping publisher"
                    );
                    None
                }
            })
            .collect()
    }
}
