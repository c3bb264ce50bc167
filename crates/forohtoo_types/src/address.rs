//! Address validation for the oracle's base58 alphabet.
//!
//! Addresses need only be length-bounded and restricted to the oracle's
//! base58 alphabet here; the stronger guarantee that the bytes decode to a
//! valid curve point is deliberately not checked, since that would tie this
//! crate to a specific oracle implementation.

/// Addresses observed in the wild for the supported chain fall in this range;
/// anything outside it is rejected before it reaches the oracle or the store.
pub const MIN_ADDRESS_LEN: usize = 32;
pub const MAX_ADDRESS_LEN: usize = 44;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("address length {0} is outside the allowed range [{MIN_ADDRESS_LEN}, {MAX_ADDRESS_LEN}]")]
    BadLength(usize),
    #[error("address is not valid base58: {0}")]
    NotBase58(String),
}

pub fn validate_address(address: &str) -> Result<(), AddressError> {
    if address.len() < MIN_ADDRESS_LEN || address.len() > MAX_ADDRESS_LEN {
        return Err(AddressError::BadLength(address.len()));
    }
    bs58::decode(address)
        .into_vec()
        .map_err(|e| AddressError::NotBase58(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_well_formed_address() {
        let addr = bs58::encode([7u8; 32]).into_string();
        assert!(validate_address(&addr).is_ok());
    }

    #[test]
    fn rejects_too_short() {
        assert_eq!(validate_address("abc"), Err(AddressError::BadLength(3)));
    }

    #[test]
    fn rejects_non_base58_characters() {
        // '0', 'O', 'I', 'l' are excluded from the base58 alphabet.
        let bad = "0".repeat(40);
        assert!(matches!(validate_address(&bad), Err(AddressError::NotBase58(_))));
    }
}
