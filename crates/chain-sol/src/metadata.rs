//! Metaplex Token Metadata instructions and account decoding.
//!
//! Instruction payloads are a one-byte instruction index followed by the
//! Borsh-encoded arguments.

use borsh::{BorshDeserialize, BorshSerialize};

use crate::error::SolError;
use crate::pda::find_program_address;
use crate::spl_token::TOKEN_PROGRAM_ID;
use crate::system::SYSTEM_PROGRAM_ID;
use crate::transaction::{AccountMeta, Instruction};

/// `metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s`
pub const TOKEN_METADATA_PROGRAM_ID: [u8; 32] = [
    0x0b, 0x70, 0x65, 0xb1, 0xe3, 0xd1, 0x7c, 0x45, 0x38, 0x9d, 0x52, 0x7f, 0x6b, 0x04, 0xc3, 0xcd,
    0x58, 0xb8, 0x6c, 0x73, 0x1a, 0xa0, 0xfd, 0xb5, 0x49, 0xb6, 0xd1, 0xbc, 0x03, 0xf8, 0x29, 0x46,
];

pub const MAX_NAME_LENGTH: usize = 32;
pub const MAX_SYMBOL_LENGTH: usize = 10;
pub const MAX_URI_LENGTH: usize = 200;

const CREATE_METADATA_ACCOUNT_V3_IX: u8 = 33;
const CREATE_MASTER_EDITION_V3_IX: u8 = 17;

/// A royalty recipient listed in the metadata account.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Creator {
    pub address: [u8; 32],
    pub verified: bool,
    pub share: u8,
}

/// The `DataV2` payload of `CreateMetadataAccountV3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataArgs {
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub seller_fee_basis_points: u16,
    pub creators: Vec<Creator>,
}

/// Fields read back from an on-chain metadata account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataAccount {
    pub update_authority: [u8; 32],
    pub mint: [u8; 32],
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub seller_fee_basis_points: u16,
    pub creators: Vec<Creator>,
}

#[derive(BorshSerialize)]
struct DataV2<'a> {
    name: &'a str,
    symbol: &'a str,
    uri: &'a str,
    seller_fee_basis_points: u16,
    creators: Option<&'a [Creator]>,
    /// Collection and uses are never set; only their `None` tag is written.
    collection: Option<()>,
    uses: Option<()>,
}

#[derive(BorshSerialize)]
struct CreateMetadataAccountArgsV3<'a> {
    data: DataV2<'a>,
    is_mutable: bool,
    collection_details: Option<()>,
}

#[derive(BorshSerialize)]
struct CreateMasterEditionArgs {
    max_supply: Option<u64>,
}

/// Leading fields of the on-chain `Metadata` account.
#[derive(BorshDeserialize)]
struct MetadataLayout {
    _key: u8,
    update_authority: [u8; 32],
    mint: [u8; 32],
    name: String,
    symbol: String,
    uri: String,
    seller_fee_basis_points: u16,
    creators: Option<Vec<Creator>>,
}

/// Metadata PDA: `["metadata", program, mint]`.
pub fn derive_metadata_address(mint: &[u8; 32]) -> Result<[u8; 32], SolError> {
    find_program_address(
        &[b"metadata", &TOKEN_METADATA_PROGRAM_ID, mint.as_ref()],
        &TOKEN_METADATA_PROGRAM_ID,
    )
    .map(|(address, _)| address)
}

/// Master edition PDA: `["metadata", program, mint, "edition"]`.
pub fn derive_master_edition_address(mint: &[u8; 32]) -> Result<[u8; 32], SolError> {
    find_program_address(
        &[b"metadata", &TOKEN_METADATA_PROGRAM_ID, mint.as_ref(), b"edition"],
        &TOKEN_METADATA_PROGRAM_ID,
    )
    .map(|(address, _)| address)
}

/// `CreateMetadataAccountV3` with `is_mutable = true` and no collection.
pub fn create_metadata_account_v3(
    mint: &[u8; 32],
    mint_authority: &[u8; 32],
    payer: &[u8; 32],
    update_authority: &[u8; 32],
    args: &MetadataArgs,
) -> Result<Instruction, SolError> {
    check_len("name", &args.name, MAX_NAME_LENGTH)?;
    check_len("symbol", &args.symbol, MAX_SYMBOL_LENGTH)?;
    check_len("uri", &args.uri, MAX_URI_LENGTH)?;
    if args.seller_fee_basis_points > 10_000 {
        return Err(SolError::TransactionBuildError(format!(
            "seller fee {} bps exceeds 10000",
            args.seller_fee_basis_points
        )));
    }
    let total_share: u32 = args.creators.iter().map(|c| c.share as u32).sum();
    if !args.creators.is_empty() && total_share != 100 {
        return Err(SolError::TransactionBuildError(
            "creator shares must sum to 100".into(),
        ));
    }

    let payload = CreateMetadataAccountArgsV3 {
        data: DataV2 {
            name: &args.name,
            symbol: &args.symbol,
            uri: &args.uri,
            seller_fee_basis_points: args.seller_fee_basis_points,
            creators: (!args.creators.is_empty()).then_some(args.creators.as_slice()),
            collection: None,
            uses: None,
        },
        is_mutable: true,
        collection_details: None,
    };

    Ok(Instruction {
        program_id: TOKEN_METADATA_PROGRAM_ID,
        accounts: vec![
            AccountMeta::writable(derive_metadata_address(mint)?, false),
            AccountMeta::readonly(*mint, false),
            AccountMeta::readonly(*mint_authority, true),
            AccountMeta::writable(*payer, true),
            AccountMeta::readonly(*update_authority, true),
            AccountMeta::readonly(SYSTEM_PROGRAM_ID, false),
        ],
        data: instruction_data(CREATE_METADATA_ACCOUNT_V3_IX, &payload)?,
    })
}

/// `CreateMasterEditionV3` with `max_supply = Some(0)` (one of one).
pub fn create_master_edition_v3(
    mint: &[u8; 32],
    update_authority: &[u8; 32],
    mint_authority: &[u8; 32],
    payer: &[u8; 32],
) -> Result<Instruction, SolError> {
    let args = CreateMasterEditionArgs {
        max_supply: Some(0),
    };

    Ok(Instruction {
        program_id: TOKEN_METADATA_PROGRAM_ID,
        accounts: vec![
            AccountMeta::writable(derive_master_edition_address(mint)?, false),
            AccountMeta::writable(*mint, false),
            AccountMeta::readonly(*update_authority, true),
            AccountMeta::readonly(*mint_authority, true),
            AccountMeta::writable(*payer, true),
            AccountMeta::writable(derive_metadata_address(mint)?, false),
            AccountMeta::readonly(TOKEN_PROGRAM_ID, false),
            AccountMeta::readonly(SYSTEM_PROGRAM_ID, false),
        ],
        data: instruction_data(CREATE_MASTER_EDITION_V3_IX, &args)?,
    })
}

/// Decode the leading fields of a metadata account.
///
/// The program pads strings with NUL bytes up to their maximum length;
/// the padding is stripped. Bytes after the creators are not read.
pub fn decode_metadata_account(data: &[u8]) -> Result<MetadataAccount, SolError> {
    let layout = MetadataLayout::deserialize(&mut &data[..])
        .map_err(|e| SolError::DecodeError(format!("metadata account: {e}")))?;
    let unpad = |s: String| s.trim_end_matches('\0').to_string();

    Ok(MetadataAccount {
        update_authority: layout.update_authority,
        mint: layout.mint,
        name: unpad(layout.name),
        symbol: unpad(layout.symbol),
        uri: unpad(layout.uri),
        seller_fee_basis_points: layout.seller_fee_basis_points,
        creators: layout.creators.unwrap_or_default(),
    })
}

fn instruction_data(index: u8, args: &impl BorshSerialize) -> Result<Vec<u8>, SolError> {
    let mut data = vec![index];
    args.serialize(&mut data)
        .map_err(|e| SolError::TransactionBuildError(format!("metadata args: {e}")))?;
    Ok(data)
}

fn check_len(field: &str, value: &str, max: usize) -> Result<(), SolError> {
    if value.len() > max {
        return Err(SolError::TransactionBuildError(format!(
            "{field} is {} bytes, max {max}",
            value.len()
        )));
    }
    Ok(())
}
