//! Actor addresses.
//!
//! Only ID addresses (`f0…`) are decoded; the tools never need to derive
//! anything from key-based or actor addresses, so protocols 1–4 are validated
//! and carried as text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::ActorId;
use crate::error::AppError;

const BASE32_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz234567";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    fn prefix(self) -> char {
        match self {
            Network::Mainnet => 'f',
            Network::Testnet => 't',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Payload {
    Id(ActorId),
    Other { protocol: u8, body: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address {
    network: Network,
    payload: Payload,
}

impl Address {
    pub fn new_id(id: ActorId) -> Self {
        Self {
            network: Network::Mainnet,
            payload: Payload::Id(id),
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn protocol(&self) -> u8 {
        match &self.payload {
            Payload::Id(_) => 0,
            Payload::Other { protocol, .. } => *protocol,
        }
    }

    pub fn id(&self) -> Option<ActorId> {
        match self.payload {
            Payload::Id(id) => Some(id),
            Payload::Other { .. } => None,
        }
    }

    /// Binary form of an ID address: protocol byte followed by the uvarint id.
    pub fn id_bytes(&self) -> Result<Vec<u8>, AppError> {
        let id = self
            .id()
            .ok_or_else(|| AppError::format(format!("{self} is not an ID address")))?;
        let mut out = vec![0u8];
        let mut rest = id;
        loop {
            let byte = (rest & 0x7f) as u8;
            rest >>= 7;
            if rest == 0 {
                out.push(byte);
                break;
            }
            out.push(byte | 0x80);
        }
        Ok(out)
    }
}

impl FromStr for Address {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |why: &str| AppError::format(format!("invalid address '{s}': {why}"));

        let mut chars = s.chars();
        let network = match chars.next() {
            Some('f') => Network::Mainnet,
            Some('t') => Network::Testnet,
            Some(_) => return Err(invalid("unknown network prefix")),
            None => return Err(invalid("empty")),
        };
        let protocol = chars
            .next()
            .and_then(|c| c.to_digit(10))
            .filter(|p| *p <= 4)
            .ok_or_else(|| invalid("unknown protocol"))? as u8;
        let body = chars.as_str();
        if body.is_empty() {
            return Err(invalid("missing payload"));
        }

        let payload = if protocol == 0 {
            if !body.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid("id payload must be decimal"));
            }
            Payload::Id(body.parse().map_err(|_| invalid("id out of range"))?)
        } else {
            if !body.chars().all(|c| BASE32_ALPHABET.contains(c)) {
                return Err(invalid("payload is not base32"));
            }
            Payload::Other {
                protocol,
                body: body.to_string(),
            }
        };

        Ok(Self { network, payload })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            Payload::Id(id) => write!(f, "{}0{id}", self.network.prefix()),
            Payload::Other { protocol, body } => write!(f, "{}{protocol}{body}", self.network.prefix()),
        }
    }
}

impl TryFrom<String> for Address {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.to_string()
    }
}

/// Parse a user-supplied address.
///
/// With `allow_actor`, a bare decimal number is taken as an ID address.
pub fn should_address(s: &str, check_empty: bool, allow_actor: bool) -> Result<Address, AppError> {
    if check_empty && s.is_empty() {
        return Err(AppError::format("empty address string"));
    }

    if allow_actor {
        if let Ok(id) = s.parse::<ActorId>() {
            return Ok(Address::new_id(id));
        }
    }

    s.parse()
}

/// Parse a user-supplied address that must resolve to an actor id.
pub fn should_actor(s: &str, check_empty: bool) -> Result<ActorId, AppError> {
    let addr = should_address(s, check_empty, true)?;
    addr.id()
        .ok_or_else(|| AppError::format(format!("get actor id from addr: {addr} is not an ID address")))
}

pub fn should_sector_number(s: &str) -> Result<u64, AppError> {
    s.parse()
        .map_err(|e| AppError::format(format!("parse sector number: {e}")))
}
