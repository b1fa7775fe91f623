use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error as ThisError;

/// Expected length of a wallet address, including the `0x` prefix.
pub const WALLET_ADDRESS_LENGTH: usize = 42;

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum WalletAddressError {
    #[error("wallet address has wrong length (len={len}, expected={expected})")]
    WrongLength { len: usize, expected: usize },
    #[error("wallet address missing 0x prefix")]
    MissingPrefix,
    #[error("wallet address contains non-hex character {got:?}")]
    NonHex { got: char },
}

/// A case-normalized wallet address.
///
/// The wallet address is the unique player identifier, sourced from an
/// external blockchain identity. All document keys embed the normalized
/// (lowercase) form so that two spellings of the same address can never
/// produce two player records.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletAddress(String);

impl WalletAddress {
    pub fn parse(raw: &str) -> Result<Self, WalletAddressError> {
        if raw.len() != WALLET_ADDRESS_LENGTH {
            return Err(WalletAddressError::WrongLength {
                len: raw.len(),
                expected: WALLET_ADDRESS_LENGTH,
            });
        }
        if !raw.starts_with("0x") && !raw.starts_with("0X") {
            return Err(WalletAddressError::MissingPrefix);
        }
        for c in raw[2..].chars() {
            if !c.is_ascii_hexdigit() {
                return Err(WalletAddressError::NonHex { got: c });
            }
        }
        Ok(Self(raw.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
