use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crypto_utils::{OsRandom, SecretSeed, SecureRandom};

use super::{ensure_not_technical, funding_shortfall, Bridge};
use crate::amount::{lamports_to_sol, sol_to_lamports};
use crate::config::SolanaConfig;
use crate::error::{Result, ValidationError};
use crate::key_material::KeyMaterial;
use crate::rpc::{send_instructions, HttpSolanaRpc, SolanaRpc};
use crate::telemetry::observe;
use crate::types::{
    Account, BlockchainProviderType, RestoredKeys, TransactionResult, TransactionStatus,
};

/// Bridge over Solana JSON-RPC. Amounts are SOL; transfers are single
/// System Program transfers paid by the sender.
pub struct SolanaBridge {
    rpc: Arc<dyn SolanaRpc>,
    technical_key: SecretSeed,
    technical_address: String,
    key_material: KeyMaterial,
    rng: Arc<dyn SecureRandom>,
}

impl SolanaBridge {
    pub fn new(
        rpc: Arc<dyn SolanaRpc>,
        technical_key: SecretSeed,
        rng: Arc<dyn SecureRandom>,
    ) -> Self {
        let technical_address = chain_sol::address_from_seed(technical_key.as_bytes());
        Self {
            rpc,
            technical_key,
            technical_address,
            key_material: KeyMaterial::solana(),
            rng,
        }
    }

    pub fn from_config(config: &SolanaConfig) -> Result<Self> {
        let rpc = HttpSolanaRpc::from_config(config)?;
        Ok(Self::new(Arc::new(rpc), config.signing_key()?, Arc::new(OsRandom)))
    }

    async fn transfer(
        &self,
        amount: Decimal,
        from_key: &SecretSeed,
        from_address: &str,
        to_address: &str,
        cancel: &CancellationToken,
    ) -> Result<TransactionResult> {
        let from = chain_sol::decode_address(from_address)?;
        let to = chain_sol::decode_address(to_address)?;
        let lamports = sol_to_lamports(amount)?;
        if lamports == 0 {
            return Err(ValidationError::InvalidAmount(format!(
                "{amount} SOL is below one lamport"
            ))
            .into());
        }

        let balance = self.rpc.get_balance(from_address, cancel).await?;
        let fee = chain_sol::LAMPORTS_PER_SIGNATURE;
        if let Some(status) =
            funding_shortfall(Decimal::from(balance), Decimal::from(lamports), Decimal::from(fee))
        {
            info!(from = from_address, balance, lamports, ?status, "transfer not funded");
            return Ok(TransactionResult::insufficient(
                status,
                lamports_to_sol(balance).to_string(),
                lamports_to_sol(lamports.saturating_add(fee)).to_string(),
            ));
        }

        let ix = chain_sol::system::transfer(&from, &to, lamports);
        let signature = send_instructions(self.rpc.as_ref(), &[ix], &[from_key], cancel).await?;
        info!(from = from_address, to = to_address, lamports, %signature, "transfer submitted");
        Ok(TransactionResult::submitted(signature))
    }
}

#[async_trait]
impl Bridge for SolanaBridge {
    fn provider(&self) -> BlockchainProviderType {
        BlockchainProviderType::Solana
    }

    fn technical_address(&self) -> &str {
        &self.technical_address
    }

    fn create_account(&self) -> Result<Account> {
        let (seed_phrase, key) = self.key_material.generate(self.rng.as_ref())?;
        Ok(Account {
            public_key: chain_sol::encode_address(&key.public_key),
            private_key: key.private_key,
            seed_phrase,
        })
    }

    fn restore_account(&self, seed_phrase: &str) -> Result<RestoredKeys> {
        let key = self.key_material.restore(seed_phrase)?;
        Ok(RestoredKeys {
            public_key: chain_sol::encode_address(&key.public_key),
            private_key: key.private_key,
        })
    }

    async fn get_account_balance(
        &self,
        address: &str,
        cancel: &CancellationToken,
    ) -> Result<Decimal> {
        observe("solana.get_account_balance", async {
            chain_sol::decode_address(address)?;
            let lamports = self.rpc.get_balance(address, cancel).await?;
            Ok(lamports_to_sol(lamports))
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
        observe("solana.withdraw", async {
            ensure_not_technical(sender_address, &self.technical_address)?;
            let owned = chain_sol::address_from_seed(sender_private_key.as_bytes());
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
        observe("solana.deposit", async {
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
        observe("solana.get_transaction_status", async {
            let status = match self.rpc.get_transaction(transaction_id, cancel).await? {
                None => TransactionStatus::NotFound,
                Some(outcome) if outcome.err.is_some() => TransactionStatus::Canceled,
                Some(_) => TransactionStatus::Completed,
            };
            Ok(status)
        })
        .await
    }
}
