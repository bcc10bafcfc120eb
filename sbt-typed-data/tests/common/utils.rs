use sbt_typed_data::{
    Felt, SoulboundMessage, TypeRegistry, soulbound::DEFAULT_CHAIN_ID, soulbound_domain,
    soulbound_registry,
};

pub const ACCOUNT: Felt =
    Felt::from_hex_unchecked("0x3f5d1bd2a0a5a3a9a9ea3c5e9be1cce29d5bd1d2b7a8ba5dc2ad5f0cbac6bd1");
pub const PRIVATE_KEY: Felt =
    Felt::from_hex_unchecked("0x4070e7abfa479cf8a30d38895e93800a88862c4a65aa00e2b11495998818046");

pub fn registry() -> TypeRegistry {
    soulbound_registry().unwrap()
}

/// Message hash of the claim on soul `soul_id` by [`ACCOUNT`].
pub fn soul_hash(registry: &TypeRegistry, soul_id: u128) -> Felt {
    let domain = soulbound_domain(DEFAULT_CHAIN_ID).unwrap();
    SoulboundMessage::new(ACCOUNT, soul_id)
        .message_hash(registry, &domain)
        .unwrap()
}
