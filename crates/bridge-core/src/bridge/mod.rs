//! One contract for account lifecycle and value transfer across chains.
//!
//! Each chain gets a [`Bridge`] implementation holding the operator's
//! technical signing key. Withdrawals move funds from a client account to
//! the technical account; deposits move them back out. Client keys are
//! passed per call and dropped when the call returns.

pub mod radix;
pub mod solana;

use async_trait::async_trait;
use crypto_utils::SecretSeed;
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, ValidationError};
use crate::types::{
    Account, BlockchainProviderType, RestoredKeys, TransactionResult, TransactionStatus,
};

pub use radix::RadixBridge;
pub use solana::SolanaBridge;

#[async_trait]
pub trait Bridge: Send + Sync {
    fn provider(&self) -> BlockchainProviderType;

    /// Address of the operator account this bridge signs deposits with.
    fn technical_address(&self) -> &str;

    /// Fresh mnemonic and the account it derives.
    fn create_account(&self) -> Result<Account>;

    /// Keys for `seed_phrase`. Malformed phrases fail before any derivation.
    fn restore_account(&self, seed_phrase: &str) -> Result<RestoredKeys>;

    /// Native balance in whole units. Unknown accounts hold zero.
    async fn get_account_balance(
        &self,
        address: &str,
        cancel: &CancellationToken,
    ) -> Result<Decimal>;

    /// Move `amount` from `sender_address` into the technical account.
    async fn withdraw(
        &self,
        amount: Decimal,
        sender_address: &str,
        sender_private_key: &SecretSeed,
        cancel: &CancellationToken,
    ) -> Result<TransactionResult>;

    /// Move `amount` from the technical account to `receiver_address`.
    async fn deposit(
        &self,
        amount: Decimal,
        receiver_address: &str,
        cancel: &CancellationToken,
    ) -> Result<TransactionResult>;

    async fn get_transaction_status(
        &self,
        transaction_id: &str,
        cancel: &CancellationToken,
    ) -> Result<TransactionStatus>;
}

/// Reject transfers whose counterparty is the technical account itself.
pub(crate) fn ensure_not_technical(counterparty: &str, technical: &str) -> Result<()> {
    if counterparty.trim() == technical {
        return Err(ValidationError::SelfTransaction.into());
    }
    Ok(())
}

/// `None` when `balance` covers `amount + fee`; otherwise the matching
/// insufficient-funds status.
pub(crate) fn funding_shortfall(
    balance: Decimal,
    amount: Decimal,
    fee: Decimal,
) -> Option<TransactionStatus> {
    if balance < amount {
        Some(TransactionStatus::InsufficientFunds)
    } else if balance < amount + fee {
        Some(TransactionStatus::InsufficientFundsForFee)
    } else {
        None
    }
}
