//! Compiled transaction manifests.
//!
//! Instructions are encoded straight into manifest SBOR as they are added.
//! The first address or decimal that fails to parse is kept and reported
//! by [`ManifestBuilder::build`].

use crate::address::node_id;
use crate::error::RadixError;
use crate::network::RadixNetwork;
use crate::sbor::{Encoder, KIND_ENUM, KIND_NON_FUNGIBLE_LOCAL_ID};

/// Fractional digits of a Radix `Decimal`.
pub const DECIMAL_PLACES: usize = 18;

const TAKE_FROM_WORKTOP: u8 = 0x00;
const TAKE_ALL_FROM_WORKTOP: u8 = 0x02;
const BURN_RESOURCE: u8 = 0x24;
const CALL_METHOD: u8 = 0x41;

const LOCAL_ID_STRING: u8 = 0;
const LOCAL_ID_INTEGER: u8 = 1;
const LOCAL_ID_BYTES: u8 = 2;
const LOCAL_ID_RUID: u8 = 3;

/// A worktop bucket, numbered from 0 in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket(pub u32);

/// A manifest argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestValue {
    Address(String),
    Decimal(String),
    String(String),
    Bucket(Bucket),
    /// Local ids in their string form: `<name>`, `#1#`, `[00ff]` or `{...}`.
    NonFungibleLocalIds(Vec<String>),
    /// `None` for an optional argument.
    None,
    EntireWorktop,
}

impl ManifestValue {
    fn encode(&self, enc: &mut Encoder, network: RadixNetwork) -> Result<(), RadixError> {
        match self {
            ManifestValue::Address(a) => {
                enc.address(&node_id(a, network)?);
            }
            ManifestValue::Decimal(d) => {
                enc.decimal(&decimal_attos(d)?);
            }
            ManifestValue::String(s) => {
                enc.string(s);
            }
            ManifestValue::Bucket(b) => {
                enc.bucket(b.0);
            }
            ManifestValue::NonFungibleLocalIds(ids) => {
                enc.array(KIND_NON_FUNGIBLE_LOCAL_ID, ids.len());
                for id in ids {
                    encode_local_id(enc, id)?;
                }
            }
            ManifestValue::None => {
                enc.enum_variant(0, 0);
            }
            ManifestValue::EntireWorktop => {
                enc.entire_worktop();
            }
        }
        Ok(())
    }
}

/// A compiled manifest for one network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    network: RadixNetwork,
    count: usize,
    bodies: Vec<u8>,
}

impl Manifest {
    pub fn network(&self) -> RadixNetwork {
        self.network
    }

    pub fn instruction_count(&self) -> usize {
        self.count
    }

    /// The instruction list as a full SBOR value (`Array<Enum>`).
    pub fn instructions_value(&self) -> Vec<u8> {
        let mut enc = Encoder::new();
        enc.array(KIND_ENUM, self.count).raw(&self.bodies);
        enc.finish()
    }
}

/// Builds a manifest one instruction at a time.
#[derive(Debug)]
pub struct ManifestBuilder {
    network: RadixNetwork,
    count: usize,
    bodies: Encoder,
    buckets: u32,
    error: Option<RadixError>,
}

impl ManifestBuilder {
    pub fn new(network: RadixNetwork) -> Self {
        Self {
            network,
            count: 0,
            bodies: Encoder::new(),
            buckets: 0,
            error: None,
        }
    }

    pub fn call_method(self, address: &str, method: &str, args: Vec<ManifestValue>) -> Self {
        let network = self.network;
        self.instruction(CALL_METHOD, 3, |enc| {
            enc.address(&node_id(address, network)?).string(method);
            enc.tuple(args.len());
            for arg in &args {
                arg.encode(enc, network)?;
            }
            Ok(())
        })
    }

    pub fn lock_fee(self, account: &str, amount: &str) -> Self {
        self.call_method(account, "lock_fee", vec![ManifestValue::Decimal(amount.to_string())])
    }

    pub fn withdraw(self, account: &str, resource: &str, amount: &str) -> Self {
        self.call_method(
            account,
            "withdraw",
            vec![
                ManifestValue::Address(resource.to_string()),
                ManifestValue::Decimal(amount.to_string()),
            ],
        )
    }

    pub fn withdraw_non_fungibles(self, account: &str, resource: &str, ids: &[String]) -> Self {
        self.call_method(
            account,
            "withdraw_non_fungibles",
            vec![
                ManifestValue::Address(resource.to_string()),
                ManifestValue::NonFungibleLocalIds(ids.to_vec()),
            ],
        )
    }

    /// `TAKE_FROM_WORKTOP`; returns the builder and the new bucket.
    pub fn take_from_worktop(mut self, resource: &str, amount: &str) -> (Self, Bucket) {
        let network = self.network;
        self = self.instruction(TAKE_FROM_WORKTOP, 2, |enc| {
            enc.address(&node_id(resource, network)?)
                .decimal(&decimal_attos(amount)?);
            Ok(())
        });
        let bucket = self.next_bucket();
        (self, bucket)
    }

    /// `TAKE_ALL_FROM_WORKTOP`; returns the builder and the new bucket.
    pub fn take_all_from_worktop(mut self, resource: &str) -> (Self, Bucket) {
        let network = self.network;
        self = self.instruction(TAKE_ALL_FROM_WORKTOP, 1, |enc| {
            enc.address(&node_id(resource, network)?);
            Ok(())
        });
        let bucket = self.next_bucket();
        (self, bucket)
    }

    pub fn try_deposit_or_abort(self, account: &str, bucket: Bucket) -> Self {
        self.call_method(
            account,
            "try_deposit_or_abort",
            vec![ManifestValue::Bucket(bucket), ManifestValue::None],
        )
    }

    /// Deposit everything left on the worktop.
    pub fn deposit_batch(self, account: &str) -> Self {
        self.call_method(
            account,
            "try_deposit_batch_or_abort",
            vec![ManifestValue::EntireWorktop, ManifestValue::None],
        )
    }

    pub fn burn_resource(self, bucket: Bucket) -> Self {
        self.instruction(BURN_RESOURCE, 1, |enc| {
            enc.bucket(bucket.0);
            Ok(())
        })
    }

    pub fn build(self) -> Result<Manifest, RadixError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if self.count == 0 {
            return Err(RadixError::TransactionBuildError("manifest has no instructions".into()));
        }
        Ok(Manifest {
            network: self.network,
            count: self.count,
            bodies: self.bodies.finish(),
        })
    }

    fn instruction(
        mut self,
        discriminator: u8,
        fields: usize,
        body: impl FnOnce(&mut Encoder) -> Result<(), RadixError>,
    ) -> Self {
        if self.error.is_some() {
            return self;
        }
        let mut enc = Encoder::new();
        enc.enum_body(discriminator, fields);
        match body(&mut enc) {
            Ok(()) => {
                self.bodies.raw(&enc.finish());
                self.count += 1;
            }
            Err(err) => self.error = Some(err),
        }
        self
    }

    fn next_bucket(&mut self) -> Bucket {
        let bucket = Bucket(self.buckets);
        self.buckets += 1;
        bucket
    }
}

/// XRD transfer: lock the fee on `from`, move `amount` of `resource` into `to`.
pub fn transfer_manifest(
    network: RadixNetwork,
    from: &str,
    to: &str,
    resource: &str,
    amount: &str,
    fee: &str,
) -> Result<Manifest, RadixError> {
    let (builder, bucket) = ManifestBuilder::new(network)
        .lock_fee(from, fee)
        .withdraw(from, resource, amount)
        .take_from_worktop(resource, amount);
    builder.try_deposit_or_abort(to, bucket).build()
}

/// Check that `value` is a non-negative decimal with at most 18 fractional
/// digits, e.g. `"1"`, `"0.5"`, `"12.000000000000000001"`.
pub fn validate_decimal(value: &str) -> Result<(), RadixError> {
    let invalid = || RadixError::InvalidDecimal(value.to_string());

    let (whole, fraction) = match value.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (value, None),
    };
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    if let Some(fraction) = fraction {
        if fraction.is_empty()
            || fraction.len() > DECIMAL_PLACES
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
    }
    Ok(())
}

/// `value * 10^18` as a little-endian 192-bit integer.
fn decimal_attos(value: &str) -> Result<[u8; 24], RadixError> {
    validate_decimal(value)?;
    let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
    let attos: u128 = format!("{whole}{fraction:0<width$}", width = DECIMAL_PLACES)
        .parse()
        .map_err(|_| RadixError::InvalidDecimal(value.to_string()))?;

    let mut out = [0u8; 24];
    out[..16].copy_from_slice(&attos.to_le_bytes());
    Ok(out)
}

fn encode_local_id(enc: &mut Encoder, id: &str) -> Result<(), RadixError> {
    let invalid = || RadixError::TransactionBuildError(format!("invalid local id: {id}"));
    let inner = id.get(1..id.len().saturating_sub(1)).ok_or_else(invalid)?;

    match (id.chars().next(), id.chars().last()) {
        (Some('<'), Some('>')) if !inner.is_empty() => {
            enc.raw(&[LOCAL_ID_STRING]).size(inner.len()).raw(inner.as_bytes());
        }
        (Some('#'), Some('#')) if id.len() > 1 => {
            let n: u64 = inner.parse().map_err(|_| invalid())?;
            enc.raw(&[LOCAL_ID_INTEGER]).raw(&n.to_be_bytes());
        }
        (Some('['), Some(']')) => {
            let bytes = hex::decode(inner).map_err(|_| invalid())?;
            if bytes.is_empty() {
                return Err(invalid());
            }
            enc.raw(&[LOCAL_ID_BYTES]).size(bytes.len()).raw(&bytes);
        }
        (Some('{'), Some('}')) => {
            let bytes = hex::decode(inner.replace('-', "")).map_err(|_| invalid())?;
            if bytes.len() != 32 {
                return Err(invalid());
            }
            enc.raw(&[LOCAL_ID_RUID]).raw(&bytes);
        }
        _ => return Err(invalid()),
    }
    Ok(())
}
