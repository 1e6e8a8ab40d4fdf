//! Instruction payloads and account layout of the funding-rate program.
//!
//! ```text
//! initialize: disc(8) | symbol_len u32 | symbol utf8
//! update:     disc(8) | rate i64 | hourly_rate i64 | mark u64 | spot u64
//!             | adjusted_spot u64 | premium i64 | valid_until i64
//! account:    disc(8) | authority(32) | symbol_len u32 | symbol
//!             | <update fields> | bump u8
//! ```
//!
//! Rates are basis points (x 10^4), prices and premium are x 10^8,
//! `valid_until` is Unix seconds. Everything after the discriminator is
//! Borsh.

use borsh::{BorshDeserialize, BorshSerialize};
use chain_sol::{AccountMeta, Instruction, DISCRIMINATOR_LEN, SYSTEM_PROGRAM_ID};
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::address::{validate_symbol, ProgramDerivedAddress};
use super::FundingRateSnapshot;
use crate::amount::{
    from_base_units, from_signed_units, to_base_units, to_signed_units, PRICE_DECIMALS,
    RATE_DECIMALS,
};
use crate::error::{BridgeError, Result, ValidationError};

pub const INITIALIZE_INSTRUCTION: &str = "initialize_funding_rate";
pub const UPDATE_INSTRUCTION: &str = "update_funding_rate";
pub const ACCOUNT_NAME: &str = "FundingRate";

/// The fixed-point fields written by an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct UpdatePayload {
    pub rate_bps: i64,
    pub hourly_rate_bps: i64,
    pub mark_price: u64,
    pub spot_price: u64,
    pub adjusted_spot_price: u64,
    pub premium: i64,
    pub valid_until: i64,
}

impl UpdatePayload {
    pub fn from_snapshot(s: &FundingRateSnapshot) -> std::result::Result<Self, ValidationError> {
        Ok(Self {
            rate_bps: to_signed_units(s.rate, RATE_DECIMALS)?,
            hourly_rate_bps: to_signed_units(s.hourly_rate, RATE_DECIMALS)?,
            mark_price: to_base_units(s.mark_price, PRICE_DECIMALS)?,
            spot_price: to_base_units(s.spot_price, PRICE_DECIMALS)?,
            adjusted_spot_price: to_base_units(s.adjusted_spot_price, PRICE_DECIMALS)?,
            premium: to_signed_units(s.premium, PRICE_DECIMALS)?,
            valid_until: s.valid_until.timestamp(),
        })
    }

    pub fn rate(&self) -> Decimal {
        from_signed_units(self.rate_bps, RATE_DECIMALS)
    }

    pub fn hourly_rate(&self) -> Decimal {
        from_signed_units(self.hourly_rate_bps, RATE_DECIMALS)
    }
}

#[derive(BorshSerialize)]
struct InitializeArgs<'a> {
    symbol: &'a str,
}

/// The funding-rate account body after its discriminator. Trailing
/// account space is ignored.
#[derive(BorshDeserialize)]
struct FundingRateAccount {
    authority: [u8; 32],
    symbol: String,
    fields: UpdatePayload,
    bump: u8,
}

/// `discriminator || borsh(args)`.
fn instruction_data(name: &str, args: &impl BorshSerialize) -> Result<Vec<u8>> {
    let mut data = chain_sol::instruction_discriminator(name).to_vec();
    args.serialize(&mut data)
        .map_err(|e| BridgeError::infrastructure("encode_funding_rate", e))?;
    Ok(data)
}

pub fn encode_initialize(symbol: &str) -> Result<Vec<u8>> {
    validate_symbol(symbol)?;
    instruction_data(INITIALIZE_INSTRUCTION, &InitializeArgs { symbol })
}

pub fn encode_update(payload: &UpdatePayload) -> Result<Vec<u8>> {
    instruction_data(UPDATE_INSTRUCTION, payload)
}

/// Inverse of [`encode_update`].
pub fn decode_update_payload(data: &[u8]) -> Result<UpdatePayload> {
    let body = strip_discriminator(
        data,
        &chain_sol::instruction_discriminator(UPDATE_INSTRUCTION),
        "not an update instruction",
    )?;
    UpdatePayload::try_from_slice(body).map_err(decode_error)
}

/// Accounts: the PDA (writable), the authority (signer, pays rent), System.
pub fn initialize_instruction(
    program_id: &[u8; 32],
    pda: &ProgramDerivedAddress,
    authority: &[u8; 32],
    symbol: &str,
) -> Result<Instruction> {
    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::writable(pda.bytes, false),
            AccountMeta::writable(*authority, true),
            AccountMeta::readonly(SYSTEM_PROGRAM_ID, false),
        ],
        data: encode_initialize(symbol)?,
    })
}

/// Accounts: the PDA (writable), the authority (signer).
pub fn update_instruction(
    program_id: &[u8; 32],
    pda: &ProgramDerivedAddress,
    authority: &[u8; 32],
    payload: &UpdatePayload,
) -> Result<Instruction> {
    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::writable(pda.bytes, false),
            AccountMeta::readonly(*authority, true),
        ],
        data: encode_update(payload)?,
    })
}

/// A funding-rate account as stored on chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnChainFundingRate {
    pub authority: String,
    pub symbol: String,
    pub rate: Decimal,
    pub hourly_rate: Decimal,
    pub mark_price: Decimal,
    pub spot_price: Decimal,
    pub adjusted_spot_price: Decimal,
    pub premium: Decimal,
    pub valid_until: DateTime<Utc>,
    pub bump: u8,
}

pub fn decode_funding_account(data: &[u8]) -> Result<OnChainFundingRate> {
    let mut body = strip_discriminator(
        data,
        &chain_sol::account_discriminator(ACCOUNT_NAME),
        "not a funding-rate account",
    )?;
    let FundingRateAccount {
        authority,
        symbol,
        fields,
        bump,
    } = FundingRateAccount::deserialize(&mut body).map_err(decode_error)?;

    let valid_until = Utc
        .timestamp_opt(fields.valid_until, 0)
        .single()
        .ok_or_else(|| decode_error(format!("valid_until {} out of range", fields.valid_until)))?;

    Ok(OnChainFundingRate {
        authority: chain_sol::encode_address(&authority),
        symbol,
        rate: fields.rate(),
        hourly_rate: fields.hourly_rate(),
        mark_price: from_base_units(fields.mark_price, PRICE_DECIMALS),
        spot_price: from_base_units(fields.spot_price, PRICE_DECIMALS),
        adjusted_spot_price: from_base_units(fields.adjusted_spot_price, PRICE_DECIMALS),
        premium: from_signed_units(fields.premium, PRICE_DECIMALS),
        valid_until,
        bump,
    })
}

fn decode_error(message: impl ToString) -> BridgeError {
    BridgeError::infrastructure("decode_funding_rate", message)
}

fn strip_discriminator<'a>(
    data: &'a [u8],
    expected: &[u8; DISCRIMINATOR_LEN],
    mismatch: &str,
) -> Result<&'a [u8]> {
    match data.split_at_checked(DISCRIMINATOR_LEN) {
        Some((disc, body)) if disc == expected => Ok(body),
        Some(_) => Err(decode_error(mismatch)),
        None => Err(decode_error(format!("truncated at byte {}", data.len()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn snapshot(rate: &str) -> FundingRateSnapshot {
        let calculated_at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        FundingRateSnapshot {
            symbol: "AAPL".into(),
            rate: rate.parse().unwrap(),
            hourly_rate: "0.0125".parse().unwrap(),
            mark_price: "190.25".parse().unwrap(),
            spot_price: "190.00".parse().unwrap(),
            adjusted_spot_price: "190.10".parse().unwrap(),
            premium: "-0.15".parse().unwrap(),
            premium_percentage: "-0.0789".parse().unwrap(),
            factor_breakdown: Default::default(),
            calculated_at,
            valid_until: calculated_at + Duration::hours(1),
        }
    }

    #[test]
    fn ten_percent_is_one_thousand_basis_points() {
        let payload = UpdatePayload::from_snapshot(&snapshot("0.10")).unwrap();
        assert_eq!(payload.rate_bps, 1000);
        let back = decode_update_payload(&encode_update(&payload).unwrap()).unwrap();
        assert_eq!(back.rate_bps, 1000);
        assert!((back.rate() - Decimal::new(10, 2)).abs() < Decimal::new(1, 4));
    }

    #[test]
    fn field_scaling() {
        let payload = UpdatePayload::from_snapshot(&snapshot("-0.0003")).unwrap();
        assert_eq!(payload.rate_bps, -3);
        assert_eq!(payload.hourly_rate_bps, 125);
        assert_eq!(payload.mark_price, 19_025_000_000);
        assert_eq!(payload.spot_price, 19_000_000_000);
        assert_eq!(payload.adjusted_spot_price, 19_010_000_000);
        assert_eq!(payload.premium, -15_000_000);
        assert_eq!(payload.valid_until, 1_772_370_000);
    }

    #[test]
    fn update_layout() {
        let payload = UpdatePayload::from_snapshot(&snapshot("0.10")).unwrap();
        let data = encode_update(&payload).unwrap();
        assert_eq!(data.len(), 8 + 56);
        assert_eq!(&data[..8], &chain_sol::instruction_discriminator("update_funding_rate"));
        assert_eq!(&data[8..16], &1000i64.to_le_bytes());
        assert_eq!(&data[56..64], &1_772_370_000i64.to_le_bytes());
    }

    #[test]
    fn initialize_layout() {
        let data = encode_initialize("AAPL").unwrap();
        assert_eq!(&data[..8], &chain_sol::instruction_discriminator("initialize_funding_rate"));
        assert_eq!(&data[8..12], &4u32.to_le_bytes());
        assert_eq!(&data[12..], b"AAPL");
        assert!(encode_initialize("").is_err());
    }

    #[test]
    fn negative_prices_are_rejected() {
        let mut s = snapshot("0.10");
        s.mark_price = "-1".parse().unwrap();
        let err = UpdatePayload::from_snapshot(&s).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidAmount(_)));
    }

    #[test]
    fn decode_rejects_foreign_and_truncated_data() {
        let payload = UpdatePayload::from_snapshot(&snapshot("0.10")).unwrap();
        let data = encode_update(&payload).unwrap();
        assert!(decode_update_payload(&data[..40]).is_err());
        assert!(decode_update_payload(&data[..4]).is_err());

        let mut wrong = data.clone();
        wrong[0] ^= 0xff;
        assert!(decode_update_payload(&wrong).is_err());

        let mut long = data;
        long.push(0);
        assert!(decode_update_payload(&long).is_err());
    }

    #[test]
    fn account_decodes() {
        let payload = UpdatePayload::from_snapshot(&snapshot("0.10")).unwrap();
        let authority = [3u8; 32];
        let mut data = chain_sol::account_discriminator(ACCOUNT_NAME).to_vec();
        data.extend_from_slice(&authority);
        data.extend_from_slice(&4u32.to_le_bytes());
        data.extend_from_slice(b"AAPL");
        data.extend_from_slice(&borsh::to_vec(&payload).unwrap());
        data.push(254);
        // Unused account space after the fields.
        data.extend_from_slice(&[0u8; 16]);

        let account = decode_funding_account(&data).unwrap();
        assert_eq!(account.symbol, "AAPL");
        assert_eq!(account.authority, chain_sol::encode_address(&authority));
        assert_eq!(account.rate, Decimal::new(1, 1));
        assert_eq!(account.mark_price, "190.25".parse::<Decimal>().unwrap());
        assert_eq!(account.premium, "-0.15".parse::<Decimal>().unwrap());
        assert_eq!(account.bump, 254);
        assert_eq!(account.valid_until.timestamp(), 1_772_370_000);
    }
}
