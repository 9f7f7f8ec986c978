//! Sealing ticket and interactive seed lookup.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Serialize, Serializer};

use crate::chain::{ChainApi, DomainSeparationTag};
use crate::domain::{ActorId, Address, ChainEpoch, TipSetKey};
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Ticket {
    #[serde(serialize_with = "as_base64")]
    pub ticket: Vec<u8>,
    pub epoch: ChainEpoch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Seed {
    #[serde(serialize_with = "as_base64")]
    pub seed: Vec<u8>,
    pub epoch: ChainEpoch,
}

fn as_base64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&BASE64.encode(bytes))
}

/// CBOR byte-string encoding of the miner's ID address.
pub fn randomness_entropy(miner: ActorId) -> Result<Vec<u8>, AppError> {
    let bytes = Address::new_id(miner).id_bytes()?;
    let mut out = cbor_bytes_header(bytes.len());
    out.extend_from_slice(&bytes);
    Ok(out)
}

fn cbor_bytes_header(len: usize) -> Vec<u8> {
    const MAJOR_BYTES: u8 = 0x40;
    match len {
        0..=23 => vec![MAJOR_BYTES | len as u8],
        24..=0xff => vec![MAJOR_BYTES | 24, len as u8],
        0x100..=0xffff => {
            let mut out = vec![MAJOR_BYTES | 25];
            out.extend_from_slice(&(len as u16).to_be_bytes());
            out
        }
        _ => {
            let mut out = vec![MAJOR_BYTES | 26];
            out.extend_from_slice(&(len as u32).to_be_bytes());
            out
        }
    }
}

pub struct Randomness<'a, C> {
    api: &'a C,
}

impl<'a, C: ChainApi> Randomness<'a, C> {
    pub fn new(api: &'a C) -> Self {
        Self { api }
    }

    /// Randomness is drawn against the head when no tipset is pinned.
    fn resolve(&self, tsk: &TipSetKey) -> Result<TipSetKey, AppError> {
        if tsk.is_empty() {
            Ok(self.api.chain_head()?.key())
        } else {
            Ok(tsk.clone())
        }
    }

    pub fn get_ticket(&self, tsk: &TipSetKey, epoch: ChainEpoch, miner: ActorId) -> Result<Ticket, AppError> {
        let entropy = randomness_entropy(miner)?;
        let tsk = self.resolve(tsk)?;
        let ticket =
            self.api
                .state_get_randomness_from_tickets(DomainSeparationTag::SealRandomness, epoch, &entropy, &tsk)?;
        Ok(Ticket { ticket, epoch })
    }

    pub fn get_seed(&self, tsk: &TipSetKey, epoch: ChainEpoch, miner: ActorId) -> Result<Seed, AppError> {
        let entropy = randomness_entropy(miner)?;
        let tsk = self.resolve(tsk)?;
        let seed = self.api.state_get_randomness_from_beacon(
            DomainSeparationTag::InteractiveSealChallengeSeed,
            epoch,
            &entropy,
            &tsk,
        )?;
        Ok(Seed { seed, epoch })
    }
}
