//! Identifier generation

use bech32::Bech32m;
use uuid7::uuid7;

use crate::types::CartId;

pub const CART_ID_PREFIX: &str = "cart_";

// construct a unique id then encode using bech32
pub fn new_uuid_to_bech32(hrp: &str) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(hrp)?;
    let encode = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())?;
    Ok(encode)
}

pub fn new_cart_id() -> anyhow::Result<CartId> {
    let id = new_uuid_to_bech32(CART_ID_PREFIX)?;
    Ok(CartId::new(id)?)
}
