use indexmap::IndexMap;
use starknet::core::types::Felt;

use crate::{
    errors::{HashError, SchemaError},
    hasher::{Domain, TypedDataHasher},
    registry::{DOMAIN_TYPE, Field, TypeRegistry, U256_TYPE, starknet_domain_fields, u256_fields},
    value::{TypedValue, Uint256},
};

/// Primary type of soulbound token claims, also used as the dapp name.
pub const SOULBOUND_TYPE: &str = "WTFSBT1155";
pub const SOULBOUND_VERSION: &str = "1";
pub const DEFAULT_CHAIN_ID: &str = "SN_GOERLI";

/// A claim that `account` owns the soul `soul_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoulboundMessage {
    pub account: Felt,
    pub soul_id: Uint256,
}

impl SoulboundMessage {
    pub fn new(account: Felt, soul_id: impl Into<Uint256>) -> Self {
        Self {
            account,
            soul_id: soul_id.into(),
        }
    }

    pub fn to_value(&self) -> TypedValue {
        TypedValue::structure([
            ("account", self.account.into()),
            ("soulId", self.soul_id.into()),
        ])
    }

    /// Message hash of the claim, bound to `domain` and signed by the claiming
    /// account itself.
    pub fn message_hash(&self, registry: &TypeRegistry, domain: &Domain) -> Result<Felt, HashError> {
        TypedDataHasher::new(registry).message_hash(domain, &self.to_value(), self.account)
    }
}

/// `WTFSBT1155(account:felt,soulId:u256)` with its `u256` and domain types.
pub fn soulbound_registry() -> Result<TypeRegistry, SchemaError> {
    let mut types = IndexMap::new();
    types.insert(DOMAIN_TYPE.to_string(), starknet_domain_fields());
    types.insert(
        SOULBOUND_TYPE.to_string(),
        vec![Field::new("account", "felt"), Field::new("soulId", U256_TYPE)],
    );
    types.insert(U256_TYPE.to_string(), u256_fields());

    TypeRegistry::new(types, SOULBOUND_TYPE)
}

/// Domain of the soulbound dapp on the given network.
pub fn soulbound_domain(chain_id: &str) -> Result<Domain, HashError> {
    Domain::new(SOULBOUND_TYPE, SOULBOUND_VERSION, chain_id)
}
