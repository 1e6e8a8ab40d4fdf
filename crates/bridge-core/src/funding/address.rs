use serde::Serialize;

use crate::error::{Result, ValidationError};

/// First seed of every funding-rate account.
pub const FUNDING_RATE_SEED: &[u8] = b"funding_rate";

/// Longest symbol that still fits in a single PDA seed.
pub const MAX_SYMBOL_LEN: usize = chain_sol::pda::MAX_SEED_LEN;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramDerivedAddress {
    pub address: String,
    #[serde(skip)]
    pub bytes: [u8; 32],
    pub bump: u8,
}

/// Canonical PDA for `seeds` under `program_id`. Pure.
pub fn derive_address(program_id: &[u8; 32], seeds: &[&[u8]]) -> Result<ProgramDerivedAddress> {
    let (bytes, bump) = chain_sol::find_program_address(seeds, program_id)?;
    Ok(ProgramDerivedAddress {
        address: chain_sol::encode_address(&bytes),
        bytes,
        bump,
    })
}

pub fn validate_symbol(symbol: &str) -> std::result::Result<(), ValidationError> {
    if symbol.trim().is_empty() {
        return Err(ValidationError::InvalidSymbol("symbol is empty".into()));
    }
    if symbol.trim() != symbol {
        return Err(ValidationError::InvalidSymbol(format!(
            "'{symbol}' has surrounding whitespace"
        )));
    }
    if symbol.len() > MAX_SYMBOL_LEN {
        return Err(ValidationError::InvalidSymbol(format!(
            "'{symbol}' is longer than {MAX_SYMBOL_LEN} bytes"
        )));
    }
    Ok(())
}

/// Funding-rate account addresses for one program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressDeriver {
    program_id: [u8; 32],
}

impl AddressDeriver {
    pub fn new(program_id: [u8; 32]) -> Self {
        Self { program_id }
    }

    pub fn from_base58(program_id: &str) -> Result<Self> {
        Ok(Self::new(chain_sol::decode_address(program_id)?))
    }

    pub fn program_id(&self) -> &[u8; 32] {
        &self.program_id
    }

    /// `["funding_rate", utf8(symbol)]`.
    pub fn funding_rate_address(&self, symbol: &str) -> Result<ProgramDerivedAddress> {
        validate_symbol(symbol)?;
        derive_address(&self.program_id, &[FUNDING_RATE_SEED, symbol.as_bytes()])
    }

    /// Nothing is allocated here; the publisher creates the account on
    /// first publish.
    pub async fn get_or_create_address(&self, symbol: &str) -> Result<ProgramDerivedAddress> {
        self.funding_rate_address(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PLACEHOLDER_FUNDING_RATE_PROGRAM_ID;

    fn deriver() -> AddressDeriver {
        AddressDeriver::from_base58(PLACEHOLDER_FUNDING_RATE_PROGRAM_ID).unwrap()
    }

    #[test]
    fn derivation_is_deterministic() {
        let a = deriver().funding_rate_address("AAPL").unwrap();
        let b = deriver().funding_rate_address("AAPL").unwrap();
        assert_eq!(a, b);
        assert!(!chain_sol::is_on_curve(&a.bytes));
    }

    #[test]
    fn bump_recreates_the_address() {
        let pda = deriver().funding_rate_address("BTC-PERP").unwrap();
        let recreated = chain_sol::create_program_address(
            &[FUNDING_RATE_SEED, b"BTC-PERP"],
            pda.bump,
            deriver().program_id(),
        )
        .unwrap();
        assert_eq!(recreated, pda.bytes);
    }

    #[test]
    fn symbols_map_to_distinct_accounts() {
        let a = deriver().funding_rate_address("AAPL").unwrap();
        let b = deriver().funding_rate_address("MSFT").unwrap();
        assert_ne!(a.address, b.address);
    }

    #[test]
    fn free_function_matches_deriver() {
        let d = deriver();
        let direct = derive_address(d.program_id(), &[FUNDING_RATE_SEED, b"AAPL"]).unwrap();
        assert_eq!(direct, d.funding_rate_address("AAPL").unwrap());
    }

    #[test]
    fn bad_symbols_are_rejected() {
        let d = deriver();
        assert!(d.funding_rate_address("").is_err());
        assert!(d.funding_rate_address(" AAPL").is_err());
        let err = d.funding_rate_address(&"X".repeat(33)).unwrap_err();
        assert_eq!(err.error_code(), "invalid_symbol");
        assert!(d.funding_rate_address(&"X".repeat(32)).is_ok());
    }

    #[tokio::test]
    async fn get_or_create_is_logical_only() {
        let d = deriver();
        assert_eq!(
            d.get_or_create_address("ETH").await.unwrap(),
            d.funding_rate_address("ETH").unwrap()
        );
    }
}
