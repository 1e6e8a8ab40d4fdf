//! SPL Token and Associated Token Account instructions, built by hand
//! without the `spl-token` crates.

use crate::error::SolError;
use crate::pda::find_program_address;
use crate::system::SYSTEM_PROGRAM_ID;
use crate::transaction::{AccountMeta, Instruction};

/// `TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA`
pub const TOKEN_PROGRAM_ID: [u8; 32] = [
    0x06, 0xdd, 0xf6, 0xe1, 0xd7, 0x65, 0xa1, 0x93, 0xd9, 0xcb, 0xe1, 0x46, 0xce, 0xeb, 0x79, 0xac,
    0x1c, 0xb4, 0x85, 0xed, 0x5f, 0x5b, 0x37, 0x91, 0x3a, 0x8c, 0xf5, 0x85, 0x7e, 0xff, 0x00, 0xa9,
];

/// `ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL`
pub const ASSOCIATED_TOKEN_PROGRAM_ID: [u8; 32] = [
    0x8c, 0x97, 0x25, 0x8f, 0x4e, 0x24, 0x89, 0xf1, 0xbb, 0x3d, 0x10, 0x29, 0x14, 0x8e, 0x0d, 0x83,
    0x0b, 0x5a, 0x13, 0x99, 0xda, 0xff, 0x10, 0x84, 0x04, 0x8e, 0x7b, 0xd8, 0xdb, 0xe9, 0xf8, 0x59,
];

/// Size of an SPL mint account.
pub const MINT_ACCOUNT_LEN: u64 = 82;

const MINT_TO_IX: u8 = 7;
const BURN_IX: u8 = 8;
const CLOSE_ACCOUNT_IX: u8 = 9;
const INITIALIZE_MINT2_IX: u8 = 20;
const CREATE_ATA_IDEMPOTENT_IX: u8 = 1;

/// Associated token account of `wallet` for `mint`.
pub fn derive_associated_token_address(
    wallet: &[u8; 32],
    mint: &[u8; 32],
) -> Result<[u8; 32], SolError> {
    find_program_address(
        &[wallet.as_ref(), &TOKEN_PROGRAM_ID, mint.as_ref()],
        &ASSOCIATED_TOKEN_PROGRAM_ID,
    )
    .map(|(address, _bump)| address)
}

/// `InitializeMint2`: no rent sysvar account required.
pub fn initialize_mint2(
    mint: &[u8; 32],
    decimals: u8,
    mint_authority: &[u8; 32],
    freeze_authority: Option<&[u8; 32]>,
) -> Instruction {
    let mut data = Vec::with_capacity(67);
    data.push(INITIALIZE_MINT2_IX);
    data.push(decimals);
    data.extend_from_slice(mint_authority);
    match freeze_authority {
        Some(key) => {
            data.push(1);
            data.extend_from_slice(key);
        }
        None => data.push(0),
    }

    Instruction {
        program_id: TOKEN_PROGRAM_ID,
        accounts: vec![AccountMeta::writable(*mint, false)],
        data,
    }
}

/// Create the associated token account if it does not exist yet.
pub fn create_associated_token_account_idempotent(
    payer: &[u8; 32],
    wallet: &[u8; 32],
    mint: &[u8; 32],
) -> Result<Instruction, SolError> {
    let ata = derive_associated_token_address(wallet, mint)?;
    Ok(Instruction {
        program_id: ASSOCIATED_TOKEN_PROGRAM_ID,
        accounts: vec![
            AccountMeta::writable(*payer, true),
            AccountMeta::writable(ata, false),
            AccountMeta::readonly(*wallet, false),
            AccountMeta::readonly(*mint, false),
            AccountMeta::readonly(SYSTEM_PROGRAM_ID, false),
            AccountMeta::readonly(TOKEN_PROGRAM_ID, false),
        ],
        data: vec![CREATE_ATA_IDEMPOTENT_IX],
    })
}

pub fn mint_to(
    mint: &[u8; 32],
    destination: &[u8; 32],
    authority: &[u8; 32],
    amount: u64,
) -> Result<Instruction, SolError> {
    nonzero(amount, "mint_to")?;
    Ok(Instruction {
        program_id: TOKEN_PROGRAM_ID,
        accounts: vec![
            AccountMeta::writable(*mint, false),
            AccountMeta::writable(*destination, false),
            AccountMeta::readonly(*authority, true),
        ],
        data: amount_data(MINT_TO_IX, amount),
    })
}

pub fn burn(
    token_account: &[u8; 32],
    mint: &[u8; 32],
    owner: &[u8; 32],
    amount: u64,
) -> Result<Instruction, SolError> {
    nonzero(amount, "burn")?;
    Ok(Instruction {
        program_id: TOKEN_PROGRAM_ID,
        accounts: vec![
            AccountMeta::writable(*token_account, false),
            AccountMeta::writable(*mint, false),
            AccountMeta::readonly(*owner, true),
        ],
        data: amount_data(BURN_IX, amount),
    })
}

/// Close an empty token account, returning its rent to `destination`.
pub fn close_account(
    token_account: &[u8; 32],
    destination: &[u8; 32],
    owner: &[u8; 32],
) -> Instruction {
    Instruction {
        program_id: TOKEN_PROGRAM_ID,
        accounts: vec![
            AccountMeta::writable(*token_account, false),
            AccountMeta::writable(*destination, false),
            AccountMeta::readonly(*owner, true),
        ],
        data: vec![CLOSE_ACCOUNT_IX],
    }
}

fn amount_data(index: u8, amount: u64) -> Vec<u8> {
    let mut data = Vec::with_capacity(9);
    data.push(index);
    data.extend_from_slice(&amount.to_le_bytes());
    data
}

fn nonzero(amount: u64, what: &str) -> Result<(), SolError> {
    if amount == 0 {
        return Err(SolError::TransactionBuildError(format!(
            "{what} amount must be > 0"
        )));
    }
    Ok(())
}
