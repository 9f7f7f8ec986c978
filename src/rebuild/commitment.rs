//! Replica commitment (CommR) ↔ sealed CID.

use crate::domain::{Cid, CidParts};
use crate::error::AppError;

/// Multicodec `fil-commitment-sealed`.
pub const FIL_COMMITMENT_SEALED: u64 = 0xf102;
/// Multihash `poseidon-bls12_381-a1-fc1`.
pub const POSEIDON_BLS12_381_A1_FC1: u64 = 0xb401;

pub type ReplicaCommitment = [u8; 32];

pub fn cid_to_replica_commitment(sealed: &Cid) -> Result<ReplicaCommitment, AppError> {
    let parts = sealed.decode()?;
    if parts.codec != FIL_COMMITMENT_SEALED {
        return Err(AppError::format(format!(
            "convert to commitment: unexpected codec {:#x} in {sealed}",
            parts.codec
        )));
    }
    if parts.hash_code != POSEIDON_BLS12_381_A1_FC1 {
        return Err(AppError::format(format!(
            "convert to commitment: unexpected multihash {:#x} in {sealed}",
            parts.hash_code
        )));
    }
    parts
        .digest
        .as_slice()
        .try_into()
        .map_err(|_| AppError::format(format!("get {} bytes for commitment", parts.digest.len())))
}

pub fn replica_commitment_to_cid(commr: &ReplicaCommitment) -> Cid {
    Cid::from_parts(&CidParts {
        version: 1,
        codec: FIL_COMMITMENT_SEALED,
        hash_code: POSEIDON_BLS12_381_A1_FC1,
        digest: commr.to_vec(),
    })
}
