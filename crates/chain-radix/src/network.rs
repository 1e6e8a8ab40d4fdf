use std::fmt;
use std::str::FromStr;

use crate::error::RadixError;

/// A Radix network and its address prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RadixNetwork {
    Mainnet,
    Stokenet,
}

impl RadixNetwork {
    pub fn id(&self) -> u8 {
        match self {
            RadixNetwork::Mainnet => 0x01,
            RadixNetwork::Stokenet => 0x02,
        }
    }

    /// Logical name used by the Core API `network` field.
    pub fn logical_name(&self) -> &'static str {
        match self {
            RadixNetwork::Mainnet => "mainnet",
            RadixNetwork::Stokenet => "stokenet",
        }
    }

    pub(crate) fn hrp_suffix(&self) -> &'static str {
        match self {
            RadixNetwork::Mainnet => "rdx",
            RadixNetwork::Stokenet => "tdx_2_",
        }
    }

    pub fn account_hrp(&self) -> String {
        format!("account_{}", self.hrp_suffix())
    }

    pub fn resource_hrp(&self) -> String {
        format!("resource_{}", self.hrp_suffix())
    }

    pub fn component_hrp(&self) -> String {
        format!("component_{}", self.hrp_suffix())
    }

    pub fn intent_hash_hrp(&self) -> String {
        format!("txid_{}", self.hrp_suffix())
    }

    /// Address of the native XRD resource.
    pub fn xrd_resource_address(&self) -> &'static str {
        match self {
            RadixNetwork::Mainnet => {
                "resource_rdx1tknxxxxxxxxxradxrdxxxxxxxxx009923554798xxxxxxxxxradxrd"
            }
            RadixNetwork::Stokenet => {
                "resource_tdx_2_1tknxxxxxxxxxradxrdxxxxxxxxx009923554798xxxxxxxxxtfd2jc"
            }
        }
    }
}

impl fmt::Display for RadixNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.logical_name())
    }
}

impl FromStr for RadixNetwork {
    type Err = RadixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Ok(RadixNetwork::Mainnet),
            "stokenet" | "testnet" => Ok(RadixNetwork::Stokenet),
            other => Err(RadixError::UnknownNetwork(other.to_string())),
        }
    }
}
