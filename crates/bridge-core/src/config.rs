//! Runtime configuration.
//!
//! Loaded from an optional TOML file, then overridden from the environment.
//! Every section has defaults so an empty document is valid. Signing keys
//! stay wrapped in [`SecretString`] until the moment they are decoded.

use std::collections::HashSet;
use std::path::Path;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crypto_utils::{decode_seed_or_keypair, SecretSeed};

use crate::error::{BridgeError, Result};
use crate::rpc::Commitment;
use crate::types::BlockchainProviderType;

/// Used when no funding-rate program id is configured.
pub const PLACEHOLDER_FUNDING_RATE_PROGRAM_ID: &str =
    "FundingRate111111111111111111111111111111111";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub solana: SolanaConfig,
    pub radix: RadixConfig,
    pub blockchain: BlockchainConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SolanaConfig {
    pub rpc_url: String,
    pub private_key: Option<SecretString>,
    pub public_key: Option<String>,
    pub funding_rate_program_id: Option<String>,
    pub commitment: Commitment,
    pub request_timeout_secs: u64,
    pub confirm_timeout_secs: u64,
    pub poll_interval_ms: u64,
}

impl Default for SolanaConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://api.devnet.solana.com".into(),
            private_key: None,
            public_key: None,
            funding_rate_program_id: None,
            commitment: Commitment::Confirmed,
            request_timeout_secs: 30,
            confirm_timeout_secs: 60,
            poll_interval_ms: 500,
        }
    }
}

impl SolanaConfig {
    /// Configured program id, or the placeholder.
    pub fn program_id(&self) -> &str {
        self.funding_rate_program_id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(PLACEHOLDER_FUNDING_RATE_PROGRAM_ID)
    }

    pub fn uses_placeholder_program(&self) -> bool {
        self.program_id() == PLACEHOLDER_FUNDING_RATE_PROGRAM_ID
    }

    /// Decode the technical signing key, checking it against `public_key`
    /// when one is configured.
    pub fn signing_key(&self) -> Result<SecretSeed> {
        let encoded = self
            .private_key
            .as_ref()
            .ok_or_else(|| BridgeError::Configuration("solana.private_key is not set".into()))?;
        let seed = decode_seed_or_keypair(encoded.expose_secret())?;

        if let Some(expected) = self.public_key.as_deref() {
            let derived = chain_sol::address_from_seed(seed.as_bytes());
            if derived != expected.trim() {
                return Err(BridgeError::Configuration(format!(
                    "solana.public_key {expected} does not match the private key ({derived})"
                )));
            }
        }
        Ok(seed)
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RadixConfig {
    pub core_api_url: String,
    pub network: String,
    pub private_key: Option<SecretString>,
    /// Account address owned by `private_key`.
    pub public_key: Option<String>,
    pub nft_minter_component: Option<String>,
    pub nft_resource_address: Option<String>,
    pub request_timeout_secs: u64,
    /// How long a mint waits for its intent to commit.
    pub commit_timeout_secs: u64,
    pub poll_interval_ms: u64,
}

impl Default for RadixConfig {
    fn default() -> Self {
        Self {
            core_api_url: "http://localhost:3333/core".into(),
            network: "stokenet".into(),
            private_key: None,
            public_key: None,
            nft_minter_component: None,
            nft_resource_address: None,
            request_timeout_secs: 30,
            commit_timeout_secs: 60,
            poll_interval_ms: 1_000,
        }
    }
}

impl RadixConfig {
    pub fn network(&self) -> Result<chain_radix::RadixNetwork> {
        self.network
            .parse()
            .map_err(|e: chain_radix::RadixError| BridgeError::Configuration(e.to_string()))
    }

    pub fn signing_key(&self) -> Result<SecretSeed> {
        let encoded = self
            .private_key
            .as_ref()
            .ok_or_else(|| BridgeError::Configuration("radix.private_key is not set".into()))?;
        let seed = decode_seed_or_keypair(encoded.expose_secret())?;

        if let Some(expected) = self.public_key.as_deref() {
            let derived = chain_radix::account_address_from_seed(seed.as_bytes(), self.network()?)?;
            if derived != expected.trim() {
                return Err(BridgeError::Configuration(format!(
                    "radix.public_key {expected} does not match the private key ({derived})"
                )));
            }
        }
        Ok(seed)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BlockchainConfig {
    pub funding_rate: FundingRateConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FundingRateConfig {
    pub enabled_providers: Vec<BlockchainProviderType>,
    pub primary_provider: BlockchainProviderType,
}

impl Default for FundingRateConfig {
    fn default() -> Self {
        Self {
            enabled_providers: vec![BlockchainProviderType::Solana],
            primary_provider: BlockchainProviderType::Solana,
        }
    }
}

impl BridgeConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| BridgeError::Configuration(format!("failed to parse config: {e}")))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BridgeError::Configuration(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// File (when given and present), then environment, then validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) if p.exists() => Self::from_file(p)?,
            _ => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup` (normally the process environment).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("SOLANA_RPC_URL") {
            self.solana.rpc_url = v;
        }
        if let Some(v) = get("SOLANA_PRIVATE_KEY") {
            self.solana.private_key = Some(SecretString::from(v));
        }
        if let Some(v) = get("SOLANA_PUBLIC_KEY") {
            self.solana.public_key = Some(v);
        }
        if let Some(v) = get("SOLANA_FUNDING_RATE_PROGRAM_ID") {
            self.solana.funding_rate_program_id = Some(v);
        }
        if let Some(v) = get("RADIX_CORE_API_URL") {
            self.radix.core_api_url = v;
        }
        if let Some(v) = get("RADIX_NETWORK") {
            self.radix.network = v;
        }
        if let Some(v) = get("RADIX_PRIVATE_KEY") {
            self.radix.private_key = Some(SecretString::from(v));
        }
        if let Some(v) = get("RADIX_PUBLIC_KEY") {
            self.radix.public_key = Some(v);
        }
        if let Some(v) = get("BLOCKCHAIN__FUNDING_RATE__ENABLED_PROVIDERS") {
            self.blockchain.funding_rate.enabled_providers = v
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.parse().map_err(BridgeError::Configuration))
                .collect::<Result<_>>()?;
        }
        if let Some(v) = get("BLOCKCHAIN__FUNDING_RATE__PRIMARY_PROVIDER") {
            self.blockchain.funding_rate.primary_provider =
                v.parse().map_err(BridgeError::Configuration)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let funding = &self.blockchain.funding_rate;
        if funding.enabled_providers.is_empty() {
            return Err(BridgeError::Configuration(
                "blockchain.funding_rate.enabled_providers is empty".into(),
            ));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = funding.enabled_providers.iter().find(|p| !seen.insert(**p)) {
            return Err(BridgeError::Configuration(format!(
                "provider {dup} is listed twice"
            )));
        }
        if !funding.enabled_providers.contains(&funding.primary_provider) {
            return Err(BridgeError::Configuration(format!(
                "primary provider {} is not enabled",
                funding.primary_provider
            )));
        }

        check_url("solana.rpc_url", &self.solana.rpc_url)?;
        check_url("radix.core_api_url", &self.radix.core_api_url)?;
        self.radix.network()?;
        chain_sol::decode_address(self.solana.program_id()).map_err(|e| {
            BridgeError::Configuration(format!("solana.funding_rate_program_id: {e}"))
        })?;
        Ok(())
    }
}

fn check_url(field: &str, url: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(BridgeError::Configuration(format!(
            "{field} must start with http:// or https://"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = BridgeConfig::from_toml_str("").unwrap();
        assert_eq!(
            config.blockchain.funding_rate.enabled_providers,
            vec![BlockchainProviderType::Solana]
        );
        assert_eq!(config.blockchain.funding_rate.primary_provider, BlockchainProviderType::Solana);
        assert!(config.solana.uses_placeholder_program());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn toml_sections_parse() {
        let config = BridgeConfig::from_toml_str(
            r#"
            [solana]
            rpc_url = "https://rpc.example"
            commitment = "finalized"

            [radix]
            network = "mainnet"
            commit_timeout_secs = 90

            [blockchain.funding_rate]
            enabled_providers = ["Solana", "Radix"]
            primary_provider = "Radix"
            "#,
        )
        .unwrap();
        assert_eq!(config.solana.rpc_url, "https://rpc.example");
        assert_eq!(config.solana.commitment, Commitment::Finalized);
        assert_eq!(config.radix.network().unwrap(), chain_radix::RadixNetwork::Mainnet);
        assert_eq!(config.radix.commit_timeout_secs, 90);
        assert_eq!(config.radix.poll_interval_ms, 1_000);
        assert_eq!(config.blockchain.funding_rate.primary_provider, BlockchainProviderType::Radix);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = BridgeConfig::default();
        config
            .apply_overrides(env(&[
                ("SOLANA_RPC_URL", "https://override"),
                ("BLOCKCHAIN__FUNDING_RATE__ENABLED_PROVIDERS", "solana, radix"),
                ("BLOCKCHAIN__FUNDING_RATE__PRIMARY_PROVIDER", "Radix"),
            ]))
            .unwrap();
        assert_eq!(config.solana.rpc_url, "https://override");
        assert_eq!(
            config.blockchain.funding_rate.enabled_providers,
            vec![BlockchainProviderType::Solana, BlockchainProviderType::Radix]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_provider_in_env_is_rejected() {
        let mut config = BridgeConfig::default();
        let overrides = env(&[("BLOCKCHAIN__FUNDING_RATE__ENABLED_PROVIDERS", "Solana,Tezos")]);
        let err = config.apply_overrides(overrides).unwrap_err();
        assert_eq!(err.error_code(), "configuration");
    }

    #[test]
    fn primary_must_be_enabled() {
        let mut config = BridgeConfig::default();
        config.blockchain.funding_rate.primary_provider = BlockchainProviderType::Radix;
        assert!(config.validate().is_err());
    }

    #[test]
    fn duplicate_providers_rejected() {
        let mut config = BridgeConfig::default();
        config.blockchain.funding_rate.enabled_providers =
            vec![BlockchainProviderType::Solana, BlockchainProviderType::Solana];
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_url_rejected() {
        let mut config = BridgeConfig::default();
        config.solana.rpc_url = "ftp://nope".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn solana_key_accepts_hex_seed_and_checks_public_key() {
        let seed = [9u8; 32];
        let hex_seed = hex::encode(seed);
        let address = chain_sol::address_from_seed(&seed);
        let mut config = BridgeConfig::default();
        config
            .apply_overrides(env(&[
                ("SOLANA_PRIVATE_KEY", hex_seed.as_str()),
                ("SOLANA_PUBLIC_KEY", address.as_str()),
            ]))
            .unwrap();
        assert_eq!(config.solana.signing_key().unwrap().as_bytes(), &seed);

        config.solana.public_key = Some(chain_sol::address_from_seed(&[1u8; 32]));
        assert!(config.solana.signing_key().is_err());
    }

    #[test]
    fn missing_key_is_a_configuration_error() {
        let err = BridgeConfig::default().solana.signing_key().unwrap_err();
        assert_eq!(err.error_code(), "configuration");
    }

    #[test]
    fn debug_output_hides_keys() {
        let mut config = BridgeConfig::default();
        config.solana.private_key = Some(SecretString::from("deadbeef".to_string()));
        assert!(!format!("{config:?}").contains("deadbeef"));
    }
}
