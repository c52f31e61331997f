//! Utility functions for minting actor ids

use crate::device::Role;
use bech32::Bech32m;
use uuid7::uuid7;

// construct a unique actor id then encode using bech32, the role is the hrp
pub fn new_actor_id(role: Role) -> anyhow::Result<String> {
    new_uuid_to_bech32(role.as_str())
}

pub fn new_uuid_to_bech32(hrp: &str) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(hrp)?;
    let encode = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())?;
    Ok(encode)
}
