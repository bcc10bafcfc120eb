use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use starknet::core::types::Felt;

use crate::{
    errors::{SchemaError, TypedDataError},
    hasher::TypedDataHasher,
    registry::{Field, TypeRegistry},
    value::TypedValue,
};

/// A typed-data document as produced by wallets and dapps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedData {
    pub types: IndexMap<String, Vec<Field>>,
    #[serde(rename = "primaryType")]
    pub primary_type: String,
    pub domain: Value,
    pub message: Value,
}

impl TypedData {
    /// Parses a document in the `types`/`primaryType`/`domain`/`message`
    /// layout.
    pub fn from_json_str(raw: &str) -> Result<Self, TypedDataError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Validates the declared types into a [`TypeRegistry`] rooted at
    /// `primaryType`.
    ///
    /// # Returns
    ///
    /// * `Result<TypeRegistry, SchemaError>` - The registry, or why the
    ///   declarations cannot be hashed against.
    pub fn registry(&self) -> Result<TypeRegistry, SchemaError> {
        TypeRegistry::new(self.types.clone(), self.primary_type.clone())
    }

    /// Validates the schema, then hashes the message for `account`.
    pub fn message_hash(&self, account: Felt) -> Result<Felt, TypedDataError> {
        let registry = self.registry()?;
        let domain = TypedValue::from_json(&self.domain)?;
        let message = TypedValue::from_json(&self.message)?;

        let hash = TypedDataHasher::new(&registry).message_hash_with_domain_value(
            &domain,
            &message,
            account,
        )?;
        tracing::debug!(
            primary_type = %self.primary_type,
            hash = %format!("{hash:#x}"),
            "hashed typed data"
        );
        Ok(hash)
    }
}
