//! V1 transaction intents, hashing and notarisation.
//!
//! The notarised payload is manifest SBOR:
//!
//! ```text
//!   4d 22 03 02                       NotarizedTransactionV1
//!     21 02                           signed intent
//!       21 04                         intent
//!         header                      Tuple(7)
//!         instructions                Array<Enum>
//!         blobs                       Array<Array<U8>>
//!         message                     Enum (None)
//!       intent signatures             Array<Enum> (empty)
//!     notary signature                Enum<Ed25519>([u8; 64])
//! ```
//!
//! Each layer is hashed as `blake2b_256(0x54 || discriminator || child
//! hashes)`, where a child hash is `blake2b_256` of the child's encoded
//! value. The intent hash is the transaction id; the notary signs the
//! signed intent hash.

use ed25519_dalek::{Signer, SigningKey};

use crate::address::encode;
use crate::error::RadixError;
use crate::hash::{blake2b_256, blake2b_256_concat};
use crate::manifest::Manifest;
use crate::network::RadixNetwork;
use crate::sbor::{Encoder, KIND_ARRAY, KIND_ENUM};

/// Epochs a transaction stays valid for after its start epoch.
pub const EPOCH_WINDOW: u64 = 2;

const HASHABLE_PREFIX: u8 = 0x54;
const DISCRIMINATOR_INTENT: u8 = 1;
const DISCRIMINATOR_SIGNED_INTENT: u8 = 2;
const DISCRIMINATOR_NOTARIZED: u8 = 3;

const PUBLIC_KEY_ED25519: u8 = 1;
const SIGNATURE_ED25519: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionHeader {
    pub network: RadixNetwork,
    pub start_epoch_inclusive: u64,
    pub end_epoch_exclusive: u64,
    pub nonce: u32,
    pub notary_public_key: [u8; 32],
    pub notary_is_signatory: bool,
    pub tip_percentage: u16,
}

impl TransactionHeader {
    /// Header notarised by the sender itself, valid from `current_epoch`
    /// for [`EPOCH_WINDOW`] epochs.
    pub fn self_notarized(
        network: RadixNetwork,
        current_epoch: u64,
        nonce: u32,
        notary_public_key: [u8; 32],
    ) -> Self {
        Self {
            network,
            start_epoch_inclusive: current_epoch,
            end_epoch_exclusive: current_epoch.saturating_add(EPOCH_WINDOW),
            nonce,
            notary_public_key,
            notary_is_signatory: true,
            tip_percentage: 0,
        }
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.tuple(7)
            .u8(self.network.id())
            .u64(self.start_epoch_inclusive)
            .u64(self.end_epoch_exclusive)
            .u32(self.nonce)
            .enum_variant(PUBLIC_KEY_ED25519, 1)
            .bytes(&self.notary_public_key)
            .bool(self.notary_is_signatory)
            .u16(self.tip_percentage);
    }
}

#[derive(Debug, Clone)]
pub struct TransactionIntent {
    pub header: TransactionHeader,
    pub manifest: Manifest,
}

/// The encoded children of an intent, in payload order.
struct IntentParts {
    header: Vec<u8>,
    instructions: Vec<u8>,
    blobs: Vec<u8>,
    message: Vec<u8>,
}

impl TransactionIntent {
    fn parts(&self) -> Result<IntentParts, RadixError> {
        let h = &self.header;
        if h.end_epoch_exclusive <= h.start_epoch_inclusive {
            return Err(RadixError::TransactionBuildError(format!(
                "end epoch {} must be after start epoch {}",
                h.end_epoch_exclusive, h.start_epoch_inclusive
            )));
        }
        if self.manifest.network() != h.network {
            return Err(RadixError::TransactionBuildError(format!(
                "manifest is for {}, header is for {}",
                self.manifest.network(),
                h.network
            )));
        }

        let mut header = Encoder::new();
        h.encode(&mut header);
        let mut blobs = Encoder::new();
        blobs.array(KIND_ARRAY, 0);
        let mut message = Encoder::new();
        message.enum_variant(0, 0);

        Ok(IntentParts {
            header: header.finish(),
            instructions: self.manifest.instructions_value(),
            blobs: blobs.finish(),
            message: message.finish(),
        })
    }

    pub fn hash(&self) -> Result<[u8; 32], RadixError> {
        Ok(intent_hash(&self.parts()?))
    }
}

fn layer_hash(discriminator: u8, children: &[&[u8; 32]]) -> [u8; 32] {
    let prefix = [HASHABLE_PREFIX, discriminator];
    let mut parts: Vec<&[u8]> = vec![prefix.as_slice()];
    parts.extend(children.iter().map(|c| c.as_slice()));
    blake2b_256_concat(&parts)
}

fn intent_hash(parts: &IntentParts) -> [u8; 32] {
    // Blobs hash over the concatenated per-blob hashes; there are none.
    let blobs = blake2b_256(b"");
    layer_hash(
        DISCRIMINATOR_INTENT,
        &[
            &blake2b_256(&parts.header),
            &blake2b_256(&parts.instructions),
            &blobs,
            &blake2b_256(&parts.message),
        ],
    )
}

/// A notarised transaction ready for `/transaction/submit`.
#[derive(Debug, Clone)]
pub struct NotarizedTransaction {
    pub intent_hash: [u8; 32],
    pub signed_intent_hash: [u8; 32],
    pub notarized_hash: [u8; 32],
    /// Bech32m intent hash (`txid_...`), the id the status endpoint takes.
    pub transaction_id: String,
    pub payload: Vec<u8>,
}

impl NotarizedTransaction {
    pub fn payload_hex(&self) -> String {
        hex::encode(&self.payload)
    }
}

/// Sign the signed intent hash with the notary seed.
///
/// The seed must belong to the header's notary key.
pub fn notarize(
    intent: &TransactionIntent,
    notary_seed: &[u8; 32],
) -> Result<NotarizedTransaction, RadixError> {
    let key = SigningKey::from_bytes(notary_seed);
    if key.verifying_key().as_bytes() != &intent.header.notary_public_key {
        return Err(RadixError::SigningError(
            "notary key does not match the header".into(),
        ));
    }

    let parts = intent.parts()?;
    let intent_hash = intent_hash(&parts);

    let mut signatures = Encoder::new();
    signatures.array(KIND_ENUM, 0);
    let signatures = signatures.finish();
    let signed_intent_hash = layer_hash(
        DISCRIMINATOR_SIGNED_INTENT,
        &[&intent_hash, &blake2b_256(&signatures)],
    );

    let signature = key.sign(&signed_intent_hash);
    let mut notary_signature = Encoder::new();
    notary_signature
        .enum_variant(SIGNATURE_ED25519, 1)
        .bytes(&signature.to_bytes());
    let notary_signature = notary_signature.finish();
    let notarized_hash = layer_hash(
        DISCRIMINATOR_NOTARIZED,
        &[&signed_intent_hash, &blake2b_256(&notary_signature)],
    );

    let mut payload = Encoder::payload();
    payload
        .enum_variant(DISCRIMINATOR_NOTARIZED, 2)
        .tuple(2)
        .tuple(4)
        .raw(&parts.header)
        .raw(&parts.instructions)
        .raw(&parts.blobs)
        .raw(&parts.message)
        .raw(&signatures)
        .raw(&notary_signature);

    Ok(NotarizedTransaction {
        intent_hash,
        signed_intent_hash,
        notarized_hash,
        transaction_id: intent_hash_id(&intent_hash, intent.header.network)?,
        payload: payload.finish(),
    })
}

pub fn intent_hash_id(hash: &[u8; 32], network: RadixNetwork) -> Result<String, RadixError> {
    encode(&network.intent_hash_hrp(), hash)
}
