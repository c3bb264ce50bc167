//! Deterministic derivation of an associated token account address.
//!
//! The real oracle derives this off-curve, seeded by `(owner, mint)` plus a
//! program-specific constant; callers only rely on the result being a pure,
//! stable function of its inputs (spec.md §3, ATA invariant), so this crate
//! implements that contract directly rather than depending on the oracle's
//! SDK. `forohtoo_rpc_oracle::DeriveTokenAccount` calls straight through to
//! this function.
use sha2::{Digest, Sha256};

const ATA_SEED: &[u8] = b"forohtoo-associated-token-account";

pub fn derive_associated_token_account(owner: &str, mint: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(owner.as_bytes());
    hasher.update(mint.as_bytes());
    hasher.update(ATA_SEED);
    let digest = hasher.finalize();
    bs58::encode(digest).into_string()
}
