use serde::{Deserialize, Serialize};
use starknet::core::{crypto::compute_hash_on_elements, types::Felt};

use crate::{
    errors::HashError,
    registry::{DOMAIN_TYPE, FieldType, TypeRegistry},
    value::{TypedValue, felt_from_str},
};

/// `'StarkNet Message'` as a short string, the first element of every
/// message hash.
pub const MESSAGE_PREFIX: Felt = Felt::from_hex_unchecked("0x537461726b4e6574204d657373616765");

/// The application/network a message is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub name: Felt,
    pub version: Felt,
    #[serde(rename = "chainId")]
    pub chain_id: Felt,
}

impl Domain {
    /// Each part is encoded like any other string value: hex, decimal or
    /// short string.
    pub fn new(name: &str, version: &str, chain_id: &str) -> Result<Self, HashError> {
        Ok(Self {
            name: felt_from_str(name)?,
            version: felt_from_str(version)?,
            chain_id: felt_from_str(chain_id)?,
        })
    }

    pub fn to_value(&self) -> TypedValue {
        TypedValue::structure([
            ("name", self.name.into()),
            ("version", self.version.into()),
            ("chainId", self.chain_id.into()),
        ])
    }
}

/// Hashes values against the types of a registry.
#[derive(Debug, Clone, Copy)]
pub struct TypedDataHasher<'a> {
    registry: &'a TypeRegistry,
}

impl<'a> TypedDataHasher<'a> {
    /// Borrows a validated registry; the hasher holds no other state.
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self { registry }
    }

    /// Hash of the type hash followed by every field encoding, in declaration
    /// order.
    pub fn struct_hash(&self, type_name: &str, value: &TypedValue) -> Result<Felt, HashError> {
        let type_hash = self.registry.type_hash(type_name)?;
        let fields = self
            .registry
            .fields(type_name)
            .ok_or_else(|| HashError::UnknownType(type_name.to_string()))?;

        let TypedValue::Struct(data) = value else {
            return Err(HashError::mismatch(
                type_name,
                format!("expected a struct, got {}", value.kind()),
            ));
        };
        if let Some(extra) = data
            .keys()
            .find(|name| !fields.iter().any(|field| &field.name == *name))
        {
            return Err(HashError::mismatch(
                type_name,
                format!("unexpected field `{extra}`"),
            ));
        }

        let mut elements = Vec::with_capacity(fields.len() + 1);
        elements.push(type_hash);
        for field in fields {
            let value = data.get(&field.name).ok_or_else(|| {
                HashError::mismatch(type_name, format!("missing field `{}`", field.name))
            })?;
            elements.push(self.encode_value(type_name, &field.field_type(), value)?);
        }

        Ok(compute_hash_on_elements(&elements))
    }

    /// Struct hash of the domain against `StarkNetDomain`.
    pub fn domain_separator(&self, domain: &Domain) -> Result<Felt, HashError> {
        self.struct_hash(DOMAIN_TYPE, &domain.to_value())
    }

    /// The hash an account signs for `message`, bound to `domain` and to the
    /// signing account.
    pub fn message_hash(
        &self,
        domain: &Domain,
        message: &TypedValue,
        account: Felt,
    ) -> Result<Felt, HashError> {
        self.message_hash_with_domain_value(&domain.to_value(), message, account)
    }

    /// Same as [`Self::message_hash`] for a domain laid out by a custom
    /// `StarkNetDomain` declaration.
    pub fn message_hash_with_domain_value(
        &self,
        domain: &TypedValue,
        message: &TypedValue,
        account: Felt,
    ) -> Result<Felt, HashError> {
        let domain_separator = self.struct_hash(DOMAIN_TYPE, domain)?;
        let message_hash = self.struct_hash(self.registry.primary_type(), message)?;

        Ok(compute_hash_on_elements(&[
            MESSAGE_PREFIX,
            domain_separator,
            account,
            message_hash,
        ]))
    }

    fn encode_value(
        &self,
        parent: &str,
        field_type: &FieldType<'_>,
        value: &TypedValue,
    ) -> Result<Felt, HashError> {
        match (field_type, value) {
            (FieldType::Felt, TypedValue::Felt(felt)) => Ok(*felt),
            (FieldType::Struct(name), value) => self.struct_hash(name, value),
            (FieldType::Array(inner), TypedValue::Array(items)) => {
                let encoded = items
                    .iter()
                    .map(|item| self.encode_value(parent, inner, item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(compute_hash_on_elements(&encoded))
            }
            (FieldType::Felt, other) => Err(HashError::mismatch(
                parent,
                format!("expected a felt, got {}", other.kind()),
            )),
            (FieldType::Array(_), other) => Err(HashError::mismatch(
                parent,
                format!("expected an array, got {}", other.kind()),
            )),
        }
    }
}

/// One-shot message hash of `message` under `registry`'s primary type.
///
/// # Arguments
///
/// * `domain` - Application and network the message is bound to.
/// * `registry` - Validated declarations, including the primary type.
/// * `message` - Value laid out like the primary type.
/// * `account` - Address of the signing account.
///
/// # Returns
///
/// * `Result<Felt, HashError>` - The hash to sign, or why `message` does not
///   match its declaration.
pub fn hash(
    domain: &Domain,
    registry: &TypeRegistry,
    message: &TypedValue,
    account: Felt,
) -> Result<Felt, HashError> {
    TypedDataHasher::new(registry).message_hash(domain, message, account)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tests::{mail_registry, with_domain};
    use crate::registry::{Field, U256_TYPE, u256_fields};
    use crate::value::Uint256;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const ACCOUNT: &str = "0xcd2a3d9f938e13cd947ec05abc7fe734df8dd826";

    fn person(name: &str, wallet: &str) -> TypedValue {
        TypedValue::structure([
            ("name", felt_from_str(name).unwrap().into()),
            ("wallet", felt_from_str(wallet).unwrap().into()),
        ])
    }

    fn mail() -> TypedValue {
        TypedValue::structure([
            ("from", person("Cow", "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826")),
            ("to", person("Bob", "0xbBbBBBBbbBBBbbbBbbBbbbbBBbBbbbbBbBbbBBbB")),
            ("contents", felt_from_str("Hello, Bob!").unwrap().into()),
        ])
    }

    fn mail_domain() -> Domain {
        Domain::new("StarkNet Mail", "1", "1").unwrap()
    }

    fn account() -> Felt {
        Felt::from_hex(ACCOUNT).unwrap()
    }

    fn soulbound_registry(message_fields: Vec<Field>) -> TypeRegistry {
        let types = with_domain(vec![
            ("WTFSBT1155", message_fields),
            (U256_TYPE, u256_fields()),
        ]);
        TypeRegistry::new(types, "WTFSBT1155").unwrap()
    }

    fn soulbound_message(soul_id: u128) -> TypedValue {
        TypedValue::structure([
            ("account", account().into()),
            ("soulId", Uint256::from(soul_id).into()),
        ])
    }

    fn soulbound_domain() -> Domain {
        Domain::new("WTFSBT1155", "1", "SN_GOERLI").unwrap()
    }

    #[test]
    fn test_message_prefix() {
        assert_eq!(
            MESSAGE_PREFIX,
            starknet::core::utils::cairo_short_string_to_felt("StarkNet Message").unwrap()
        );
    }

    #[test]
    fn test_domain_separator() {
        let registry = mail_registry();
        let result = TypedDataHasher::new(&registry)
            .domain_separator(&mail_domain())
            .unwrap();
        assert_eq!(
            format!("{result:#x}"),
            "0x54833b121883a3e3aebff48ec08a962f5742e5f7b973469c1f8f4f55d470b07"
        );
    }

    #[test]
    fn test_struct_hash_mail() {
        let registry = mail_registry();
        let result = TypedDataHasher::new(&registry)
            .struct_hash("Mail", &mail())
            .unwrap();
        assert_eq!(
            format!("{result:#x}"),
            "0x4758f1ed5e7503120c228cbcaba626f61514559e9ef5ed653b0b885e0f38aec"
        );
    }

    #[test]
    fn test_message_hash_mail() {
        let registry = mail_registry();
        let result = hash(&mail_domain(), &registry, &mail(), account()).unwrap();
        assert_eq!(
            format!("{result:#x}"),
            "0x6fcff244f63e38b9d88b9e3378d44757710d1b244282b435cb472053c8d78d0"
        );
    }

    #[test]
    fn test_message_hash_is_deterministic() {
        let registry = soulbound_registry(vec![
            Field::new("account", "felt"),
            Field::new("soulId", U256_TYPE),
        ]);
        let first = hash(&soulbound_domain(), &registry, &soulbound_message(10), account());
        let second = hash(&soulbound_domain(), &registry, &soulbound_message(10), account());
        assert_eq!(first, second);
        assert!(first.is_ok());
    }

    #[rstest]
    #[case(Domain::new("WTFSBT721", "1", "SN_GOERLI").unwrap())]
    #[case(Domain::new("WTFSBT1155", "2", "SN_GOERLI").unwrap())]
    #[case(Domain::new("WTFSBT1155", "1", "SN_MAIN").unwrap())]
    fn test_domain_separation(#[case] other: Domain) {
        let registry = soulbound_registry(vec![
            Field::new("account", "felt"),
            Field::new("soulId", U256_TYPE),
        ]);
        let message = soulbound_message(10);
        let reference = hash(&soulbound_domain(), &registry, &message, account()).unwrap();
        let separated = hash(&other, &registry, &message, account()).unwrap();
        assert_ne!(reference, separated);
    }

    #[test]
    fn test_field_order_changes_message_hash() {
        let declared = soulbound_registry(vec![
            Field::new("account", "felt"),
            Field::new("soulId", U256_TYPE),
        ]);
        let permuted = soulbound_registry(vec![
            Field::new("soulId", U256_TYPE),
            Field::new("account", "felt"),
        ]);
        let message = soulbound_message(10);

        assert_ne!(
            hash(&soulbound_domain(), &declared, &message, account()).unwrap(),
            hash(&soulbound_domain(), &permuted, &message, account()).unwrap()
        );
    }

    #[test]
    fn test_u256_is_hashed_as_a_struct() {
        let registry = soulbound_registry(vec![
            Field::new("account", "felt"),
            Field::new("soulId", U256_TYPE),
        ]);
        let hasher = TypedDataHasher::new(&registry);
        let soul_id = Uint256::from(10_u128);

        let expected_soul_id = compute_hash_on_elements(&[
            registry.type_hash(U256_TYPE).unwrap(),
            soul_id.low,
            soul_id.high,
        ]);
        let expected = compute_hash_on_elements(&[
            registry.type_hash("WTFSBT1155").unwrap(),
            account(),
            expected_soul_id,
        ]);

        assert_eq!(
            hasher.struct_hash(U256_TYPE, &soul_id.into()).unwrap(),
            expected_soul_id
        );
        assert_eq!(
            hasher
                .struct_hash("WTFSBT1155", &soulbound_message(10))
                .unwrap(),
            expected
        );
    }

    #[test]
    fn test_soul_id_changes_message_hash() {
        let registry = soulbound_registry(vec![
            Field::new("account", "felt"),
            Field::new("soulId", U256_TYPE),
        ]);
        assert_ne!(
            hash(&soulbound_domain(), &registry, &soulbound_message(10), account()).unwrap(),
            hash(&soulbound_domain(), &registry, &soulbound_message(11), account()).unwrap()
        );
    }

    #[test]
    fn test_missing_field() {
        let registry = mail_registry();
        let message = TypedValue::structure([
            ("from", person("Cow", "0x1")),
            ("to", person("Bob", "0x2")),
        ]);
        let err = hash(&mail_domain(), &registry, &message, account()).unwrap_err();
        assert_eq!(
            err,
            HashError::SchemaMismatch {
                type_name: "Mail".into(),
                reason: "missing field `contents`".into(),
            }
        );
    }

    #[test]
    fn test_unexpected_field() {
        let registry = mail_registry();
        let message = TypedValue::structure([
            ("from", person("Cow", "0x1")),
            ("to", person("Bob", "0x2")),
            ("contents", Felt::ONE.into()),
            ("cc", Felt::TWO.into()),
        ]);
        assert!(matches!(
            hash(&mail_domain(), &registry, &message, account()),
            Err(HashError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_wrong_shape() {
        let registry = soulbound_registry(vec![
            Field::new("account", "felt"),
            Field::new("soulId", U256_TYPE),
        ]);
        let message = TypedValue::structure([
            ("account", account().into()),
            ("soulId", Felt::from(10_u8).into()),
        ]);
        let err = hash(&soulbound_domain(), &registry, &message, account()).unwrap_err();
        assert_eq!(
            err,
            HashError::SchemaMismatch {
                type_name: U256_TYPE.into(),
                reason: "expected a struct, got a felt".into(),
            }
        );
    }

    #[test]
    fn test_unknown_type() {
        let registry = mail_registry();
        let err = TypedDataHasher::new(&registry)
            .struct_hash("Post", &mail())
            .unwrap_err();
        assert_eq!(err, HashError::UnknownType("Post".into()));
    }

    #[test]
    fn test_array_encoding() {
        let types = with_domain(vec![
            (
                "Post",
                vec![Field::new("title", "felt"), Field::new("content", "felt")],
            ),
            (
                "Feed",
                vec![Field::new("tags", "felt*"), Field::new("posts", "Post*")],
            ),
        ]);
        let registry = TypeRegistry::new(types, "Feed").unwrap();
        let hasher = TypedDataHasher::new(&registry);

        let post = TypedValue::structure([("title", Felt::ONE.into()), ("content", Felt::TWO.into())]);
        let feed = TypedValue::structure([
            ("tags", TypedValue::Array(vec![Felt::ONE.into(), Felt::THREE.into()])),
            ("posts", TypedValue::Array(vec![post.clone()])),
        ]);

        let post_hash = hasher.struct_hash("Post", &post).unwrap();
        let expected = compute_hash_on_elements(&[
            registry.type_hash("Feed").unwrap(),
            compute_hash_on_elements(&[Felt::ONE, Felt::THREE]),
            compute_hash_on_elements(&[post_hash]),
        ]);
        assert_eq!(hasher.struct_hash("Feed", &feed).unwrap(), expected);
    }
}
