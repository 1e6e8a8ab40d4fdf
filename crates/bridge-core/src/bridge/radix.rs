use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use tracing::info;

use chain_radix::RadixNetwork;
use crypto_utils::{OsRandom, SecretSeed, SecureRandom};

use super::{ensure_not_technical, funding_shortfall, Bridge};
use crate::amount::{require_positive, to_xrd_string};
use crate::config::RadixConfig;
use crate::error::{Result, ValidationError};
use crate::key_material::KeyMaterial;
use crate::rpc::{submit_manifest, HttpRadixCoreApi, IntentStatus, RadixCoreApi};
use crate::telemetry::observe;
use crate::types::{
    Account, BlockchainProviderType, RestoredKeys, TransactionResult, TransactionStatus,
};

/// XRD locked for fees on every transfer, and the headroom the balance
/// check requires on top of the amount.
pub const LOCK_FEE_XRD: Decimal = Decimal::TEN;

/// Bridge over the Radix Core API. Account "public keys" are virtual
/// account addresses; amounts are XRD.
pub struct RadixBridge {
    api: Arc<dyn RadixCoreApi>,
    network: RadixNetwork,
    technical_key: SecretSeed,
    technical_address: String,
    key_material: KeyMaterial,
    rng: Arc<dyn SecureRandom>,
}

impl RadixBridge {
    pub fn new(
        api: Arc<dyn RadixCoreApi>,
        network: RadixNetwork,
        technical_key: SecretSeed,
        rng: Arc<dyn SecureRandom>,
    ) -> Result<Self> {
        let technical_address =
            chain_radix::account_address_from_seed(technical_key.as_bytes(), network)?;
        Ok(Self {
            api,
            network,
            technical_key,
            technical_address,
            key_material: KeyMaterial::radix(network.id()),
            rng,
        })
    }

    pub fn from_config(config: &RadixConfig) -> Result<Self> {
        let api = HttpRadixCoreApi::from_config(config)?;
        Self::new(
            Arc::new(api),
            config.network()?,
            config.signing_key()?,
            Arc::new(OsRandom),
        )
    }

    pub fn network(&self) -> RadixNetwork {
        self.network
    }

    fn account_address(&self, public_key: &[u8; 32]) -> Result<String> {
        Ok(chain_radix::virtual_account_address(public_key, self.network)?)
    }

    async fn transfer(
        &self,
        amount: Decimal,
        from_key: &SecretSeed,
        from_address: &str,
        to_address: &str,
        cancel: &CancellationToken,
    ) -> Result<TransactionResult> {
        chain_radix::validate_account_address(from_address, self.network)?;
        chain_radix::validate_account_address(to_address, self.network)?;
        require_positive(amount)?;
        let amount_str = to_xrd_string(amount)?;
        let xrd = self.network.xrd_resource_address();

        let balance = self.api.resource_balance(from_address, xrd, cancel).await?;
        if let Some(status) = funding_shortfall(balance, amount, LOCK_FEE_XRD) {
            info!(from = from_address, %balance, %amount, ?status, "transfer not funded");
            return Ok(TransactionResult::insufficient(
                status,
                balance.normalize().to_string(),
                (amount + LOCK_FEE_XRD).normalize().to_string(),
            ));
        }

        let manifest = chain_radix::transfer_manifest(
            self.network,
            from_address,
            to_address,
            xrd,
            &amount_str,
            &LOCK_FEE_XRD.to_string(),
        )?;
        let notarized = submit_manifest(
            self.api.as_ref(),
            self.network,
            manifest,
            from_key,
            self.rng.as_ref(),
            cancel,
        )
        .await?;

        info!(
            from = from_address,
            to = to_address,
            amount = %amount_str,
            transaction_id = %notarized.transaction_id,
            "transfer submitted"
        );
        Ok(TransactionResult::submitted(notarized.transaction_id))
    }
}

/// Map a Core API intent status onto the unified status.
pub fn map_intent_status(status: IntentStatus) -> TransactionStatus {
    match status {
        IntentStatus::CommittedSuccess => TransactionStatus::Completed,
        IntentStatus::CommittedFailure | IntentStatus::PermanentRejection => {
            TransactionStatus::Canceled
        }
        IntentStatus::NotSeen => TransactionStatus::NotFound,
        IntentStatus::InMempool
        | IntentStatus::FateUncertain
        | IntentStatus::FateUncertainButLikelyRejection
        | IntentStatus::LikelyButNotCertainRejection => TransactionStatus::Pending,
    }
}

#[async_trait]
impl Bridge for RadixBridge {
    fn provider(&self) -> BlockchainProviderType {
        BlockchainProviderType::Radix
    }

    fn technical_address(&self) -> &str {
        &self.technical_address
    }

    fn create_account(&self) -> Result<Account> {
        let (seed_phrase, key) = self.key_material.generate(self.rng.as_ref())?;
        Ok(Account {
            public_key: self.account_address(&key.public_key)?,
            private_key: key.private_key,
            seed_phrase,
        })
    }

    fn restore_account(&self, seed_phrase: &str) -> Result<RestoredKeys> {
        let key = self.key_material.restore(seed_phrase)?;
        Ok(RestoredKeys {
            public_key: self.account_address(&key.public_key)?,
            private_key: key.private_key,
        })
    }

    async fn get_account_balance(
        &self,
        address: &str,
        cancel: &CancellationToken,
    ) -> Result<Decimal> {
        observe("radix.get_account_balance", async {
            chain_radix::validate_account_address(address, self.network)?;
            let balance = self
                .api
                .resource_balance(address, self.network.xrd_resource_address(), cancel)
                .await?;
            Ok(balance.normalize())
        })
        .await
    }

    async fn withdraw(
        &self,
        amount: Decimal,
        sender_address: &str,
        sender_private_key: &SecretSeed,
        cancel: &CancellationToken,
    ) -> Result<TransactionResult> {
        observe("radix.withdraw", async {
            ensure_not_technical(sender_address, &self.technical_address)?;
            let owned = chain_radix::account_address_from_seed(
                sender_private_key.as_bytes(),
                self.network,
            )?;
            if owned != sender_address.trim() {
                return Err(ValidationError::InvalidKey(
                    "private key does not belong to the sender address".into(),
                )
                .into());
            }
            self.transfer(
                amount,
                sender_private_key,
                sender_address.trim(),
                &self.technical_address,
                cancel,
            )
            .await
        })
        .await
    }

    async fn deposit(
        &self,
        amount: Decimal,
        receiver_address: &str,
        cancel: &CancellationToken,
    ) -> Result<TransactionResult> {
        observe("radix.deposit", async {
            ensure_not_technical(receiver_address, &self.technical_address)?;
            self.transfer(
                amount,
                &self.technical_key,
                &self.technical_address,
                receiver_address.trim(),
                cancel,
            )
            .await
        })
        .await
    }

    async fn get_transaction_status(
        &self,
        transaction_id: &str,
        cancel: &CancellationToken,
    ) -> Result<TransactionStatus> {
        observe("radix.get_transaction_status", async {
            let status = self.api.transaction_status(transaction_id, cancel).await?;
            Ok(map_intent_status(status))
        })
        .await
    }
}
