//! Solana chain support for the bridge.
//!
//! Address handling, program-derived addresses, the legacy transaction wire
//! format and the instruction builders the bridge needs (System, SPL Token,
//! Associated Token Account, Token Metadata and Anchor programs), all without
//! `solana-sdk`.
//!
//! Signing uses `ed25519-dalek`; off-curve checks use `curve25519-dalek`.

pub mod address;
pub mod anchor;
pub mod error;
pub mod metadata;
pub mod pda;
pub mod spl_token;
pub mod system;
pub mod transaction;

pub use address::{
    address_from_seed, decode_address, encode_address, is_valid_address, public_key_from_seed,
};
pub use anchor::{account_discriminator, instruction_discriminator, DISCRIMINATOR_LEN};
pub use error::SolError;
pub use metadata::{
    create_master_edition_v3, create_metadata_account_v3, decode_metadata_account,
    derive_master_edition_address, derive_metadata_address, Creator, MetadataAccount,
    MetadataArgs, TOKEN_METADATA_PROGRAM_ID,
};
pub use pda::{create_program_address, find_program_address, is_on_curve};
pub use spl_token::{
    derive_associated_token_address, ASSOCIATED_TOKEN_PROGRAM_ID, MINT_ACCOUNT_LEN,
    TOKEN_PROGRAM_ID,
};
pub use system::{LAMPORTS_PER_SIGNATURE, SYSTEM_PROGRAM_ID};
pub use transaction::{
    build_and_sign, compile_message, serialize_message, sign_message, AccountMeta,
    Instruction, Message, SignedTransaction, PACKET_DATA_SIZE,
};
