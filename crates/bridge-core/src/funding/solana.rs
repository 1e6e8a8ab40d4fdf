use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crypto_utils::SecretSeed;

use super::address::{AddressDeriver, ProgramDerivedAddress};
use super::codec::{
    decode_funding_account, initialize_instruction, update_instruction, OnChainFundingRate,
    UpdatePayload,
};
use super::{FundingRatePublisher, FundingRateSnapshot, OnChainPublishResult};
use crate::config::SolanaConfig;
use crate::error::Result;
use crate::rpc::{
    send_instructions, wait_for_confirmation, ConfirmOptions, HttpSolanaRpc, SolanaRpc,
};
use crate::telemetry::observe;
use crate::types::BlockchainProviderType;

/// Writes snapshots to per-symbol PDAs of the funding-rate program, signed
/// by the operator key.
pub struct SolanaFundingPublisher {
    rpc: Arc<dyn SolanaRpc>,
    deriver: AddressDeriver,
    authority_key: SecretSeed,
    authority: [u8; 32],
    confirm: ConfirmOptions,
}

impl SolanaFundingPublisher {
    pub fn new(
        rpc: Arc<dyn SolanaRpc>,
        program_id: [u8; 32],
        authority_key: SecretSeed,
        confirm: ConfirmOptions,
    ) -> Self {
        let authority = chain_sol::public_key_from_seed(authority_key.as_bytes());
        Self {
            rpc,
            deriver: AddressDeriver::new(program_id),
            authority_key,
            authority,
            confirm,
        }
    }

    pub fn from_config(config: &SolanaConfig) -> Result<Self> {
        if config.uses_placeholder_program() {
            warn!(
                program_id = config.program_id(),
                "no funding-rate program configured, using the placeholder id"
            );
        }
        let program_id = chain_sol::decode_address(config.program_id())?;
        let rpc = HttpSolanaRpc::from_config(config)?;
        Ok(Self::new(
            Arc::new(rpc),
            program_id,
            config.signing_key()?,
            ConfirmOptions::from_config(config),
        ))
    }

    pub fn authority_address(&self) -> String {
        chain_sol::encode_address(&self.authority)
    }

    async fn send_and_confirm(
        &self,
        instruction: chain_sol::Instruction,
        cancel: &CancellationToken,
    ) -> Result<(String, u32)> {
        let signers = [&self.authority_key];
        let signature =
            send_instructions(self.rpc.as_ref(), &[instruction], &signers, cancel).await?;
        let confirmations =
            wait_for_confirmation(self.rpc.as_ref(), &signature, &self.confirm, cancel).await?;
        Ok((signature, confirmations))
    }

    async fn try_publish(
        &self,
        snapshot: &FundingRateSnapshot,
        pda: &ProgramDerivedAddress,
        cancel: &CancellationToken,
    ) -> Result<(String, u32)> {
        // Reject unrepresentable values before any RPC.
        let payload = UpdatePayload::from_snapshot(snapshot)?;
        let program_id = self.deriver.program_id();

        if self.rpc.get_account_info(&pda.address, cancel).await?.is_none() {
            let ix = initialize_instruction(program_id, pda, &self.authority, &snapshot.symbol)?;
            let (signature, _) = self.send_and_confirm(ix, cancel).await?;
            info!(
                symbol = %snapshot.symbol,
                account = %pda.address,
                %signature,
                "funding-rate account initialised"
            );
        }

        let ix = update_instruction(program_id, pda, &self.authority, &payload)?;
        self.send_and_confirm(ix, cancel).await
    }
}

#[async_trait]
impl FundingRatePublisher for SolanaFundingPublisher {
    fn provider(&self) -> BlockchainProviderType {
        BlockchainProviderType::Solana
    }

    fn get_account_address(&self, symbol: &str) -> Result<ProgramDerivedAddress> {
        self.deriver.funding_rate_address(symbol)
    }

    async fn is_initialized(&self, symbol: &str, cancel: &CancellationToken) -> Result<bool> {
        let pda = self.get_account_address(symbol)?;
        Ok(self.rpc.get_account_info(&pda.address, cancel).await?.is_some())
    }

    async fn publish(
        &self,
        snapshot: &FundingRateSnapshot,
        cancel: &CancellationToken,
    ) -> OnChainPublishResult {
        let pda = match self.get_account_address(&snapshot.symbol) {
            Ok(pda) => pda,
            Err(e) => {
                warn!(
                    symbol = %snapshot.symbol,
                    error_code = e.error_code(),
                    error = %e,
                    "funding-rate publish rejected"
                );
                return OnChainPublishResult::failed(self.provider(), None, &e);
            }
        };

        let outcome =
            observe("solana.funding.publish", self.try_publish(snapshot, &pda, cancel)).await;
        match outcome {
            Ok((signature, confirmations)) => {
                info!(
                    symbol = %snapshot.symbol,
                    account = %pda.address,
                    %signature,
                    confirmations,
                    "funding rate published"
                );
                OnChainPublishResult::published(
                    self.provider(),
                    signature,
                    pda.address,
                    confirmations,
                )
            }
            Err(e) => OnChainPublishResult::failed(self.provider(), Some(pda.address), &e),
        }
    }

    async fn read_funding_rate(
        &self,
        symbol: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<OnChainFundingRate>> {
        let pda = self.get_account_address(symbol)?;
        match self.rpc.get_account_info(&pda.address, cancel).await? {
            Some(account) => Ok(Some(decode_funding_account(&account.data)?)),
            None => Ok(None),
        }
    }
}
