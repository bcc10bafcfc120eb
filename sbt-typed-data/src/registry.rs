use std::collections::{BTreeSet, HashMap};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use starknet::core::{types::Felt, utils::starknet_keccak};

use crate::errors::{HashError, SchemaError};

/// Name of the type every domain is hashed against.
pub const DOMAIN_TYPE: &str = "StarkNetDomain";
/// Name under which 256-bit integers are declared as a `{low, high}` struct.
pub const U256_TYPE: &str = "u256";

const PRIMITIVES: [&str; 2] = ["felt", "felt252"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub r#type: String,
}

impl Field {
    pub fn new(name: impl Into<String>, r#type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            r#type: r#type.into(),
        }
    }

    pub fn field_type(&self) -> FieldType<'_> {
        FieldType::parse(&self.r#type)
    }
}

/// Resolved form of a declared field type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType<'a> {
    /// `felt` or `felt252`, encoded as is.
    Felt,
    /// A declared composite type, encoded by its struct hash.
    Struct(&'a str),
    /// `T*`, encoded as the hash of the element encodings.
    Array(Box<FieldType<'a>>),
}

impl<'a> FieldType<'a> {
    /// Resolves a declared type string. Anything that is neither a primitive
    /// nor an array is taken as a reference to a composite type.
    pub fn parse(type_name: &'a str) -> Self {
        if let Some(inner) = type_name.strip_suffix('*') {
            Self::Array(Box::new(Self::parse(inner)))
        } else if PRIMITIVES.contains(&type_name) {
            Self::Felt
        } else {
            Self::Struct(type_name)
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Self::Felt)
    }

    /// The composite type this field points to, looking through arrays.
    pub fn struct_name(&self) -> Option<&'a str> {
        match self {
            Self::Felt => None,
            Self::Struct(name) => Some(*name),
            Self::Array(inner) => inner.struct_name(),
        }
    }
}

/// `StarkNetDomain(name:felt,version:felt,chainId:felt)`
pub fn starknet_domain_fields() -> Vec<Field> {
    vec![
        Field::new("name", "felt"),
        Field::new("version", "felt"),
        Field::new("chainId", "felt"),
    ]
}

/// `u256(low:felt,high:felt)`
pub fn u256_fields() -> Vec<Field> {
    vec![Field::new("low", "felt"), Field::new("high", "felt")]
}

/// A frozen, validated set of type declarations rooted at a primary type.
///
/// Construction rejects undeclared references and reference cycles, then
/// computes the type hash of every declared type once. The registry is
/// immutable afterwards and can be shared freely between threads.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: IndexMap<String, Vec<Field>>,
    primary_type: String,
    type_hashes: HashMap<String, Felt>,
}

impl TypeRegistry {
    /// Validates and freezes a set of type declarations.
    ///
    /// # Arguments
    ///
    /// * `types` - Declared types with their fields, in declaration order.
    ///   Must include `StarkNetDomain`.
    /// * `primary_type` - Name of the type messages are hashed against.
    ///
    /// # Returns
    ///
    /// * `Result<Self, SchemaError>` - The registry, or the first declaration
    ///   problem found (undeclared primary type, missing domain type,
    ///   duplicate field, unknown reference, cycle).
    pub fn new(
        types: IndexMap<String, Vec<Field>>,
        primary_type: impl Into<String>,
    ) -> Result<Self, SchemaError> {
        let primary_type = primary_type.into();
        if !types.contains_key(&primary_type) {
            return Err(SchemaError::UndeclaredPrimaryType(primary_type));
        }
        if !types.contains_key(DOMAIN_TYPE) {
            return Err(SchemaError::MissingDomainType(DOMAIN_TYPE.to_string()));
        }
        check_declarations(&types)?;
        check_acyclic(&types)?;

        let mut registry = Self {
            types,
            primary_type,
            type_hashes: HashMap::new(),
        };
        registry.type_hashes = registry
            .types
            .keys()
            .map(|name| {
                let encoded = registry.encode_declared(name);
                (name.clone(), starknet_keccak(encoded.as_bytes()))
            })
            .collect();

        tracing::debug!(
            primary_type = %registry.primary_type,
            types = registry.types.len(),
            "type registry ready"
        );
        Ok(registry)
    }

    /// The type messages are hashed against.
    pub fn primary_type(&self) -> &str {
        &self.primary_type
    }

    /// Whether `type_name` is a declared composite type.
    pub fn is_struct(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Fields of `type_name` in declaration order, the order they are hashed
    /// in.
    pub fn fields(&self, type_name: &str) -> Option<&[Field]> {
        self.types.get(type_name).map(Vec::as_slice)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Encodes a type as `Name(field:type,...)` followed by its transitive
    /// dependencies in lexicographic order.
    pub fn encode_type(&self, type_name: &str) -> Result<String, HashError> {
        if !self.is_struct(type_name) {
            return Err(HashError::UnknownType(type_name.to_string()));
        }
        Ok(self.encode_declared(type_name))
    }

    /// `starknet_keccak` of the encoded type.
    pub fn type_hash(&self, type_name: &str) -> Result<Felt, HashError> {
        self.type_hashes
            .get(type_name)
            .copied()
            .ok_or_else(|| HashError::UnknownType(type_name.to_string()))
    }

    fn encode_declared<'a>(&'a self, type_name: &'a str) -> String {
        std::iter::once(type_name)
            .chain(self.dependencies(type_name))
            .map(|dependency| {
                let fields = self
                    .fields(dependency)
                    .unwrap_or_default()
                    .iter()
                    .map(|field| format!("{}:{}", field.name, field.r#type))
                    .collect::<Vec<_>>();
                format!("{dependency}({})", fields.join(","))
            })
            .collect()
    }

    /// Every composite type reachable from `type_name`, itself excluded.
    fn dependencies<'a>(&'a self, type_name: &'a str) -> BTreeSet<&'a str> {
        let mut dependencies = BTreeSet::new();
        let mut pending = vec![type_name];
        while let Some(current) = pending.pop() {
            for field in self.fields(current).unwrap_or_default() {
                let Some(dependency) = field.field_type().struct_name() else {
                    continue;
                };
                if dependency != type_name && dependencies.insert(dependency) {
                    pending.push(dependency);
                }
            }
        }
        dependencies
    }
}

fn check_declarations(types: &IndexMap<String, Vec<Field>>) -> Result<(), SchemaError> {
    for (parent, fields) in types {
        let mut seen = BTreeSet::new();
        for field in fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    type_name: parent.clone(),
                    field: field.name.clone(),
                });
            }
            if let Some(referenced) = field.field_type().struct_name()
                && !types.contains_key(referenced)
            {
                return Err(SchemaError::UnknownType {
                    parent: parent.clone(),
                    field: field.name.clone(),
                    type_name: referenced.to_string(),
                });
            }
        }
    }
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

fn check_acyclic(types: &IndexMap<String, Vec<Field>>) -> Result<(), SchemaError> {
    let mut marks = HashMap::new();
    let mut path = Vec::new();
    for name in types.keys() {
        visit(name, types, &mut marks, &mut path)?;
    }
    Ok(())
}

fn visit<'a>(
    name: &'a str,
    types: &'a IndexMap<String, Vec<Field>>,
    marks: &mut HashMap<&'a str, Mark>,
    path: &mut Vec<&'a str>,
) -> Result<(), SchemaError> {
    match marks.get(name) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::Visiting) => {
            let start = path.iter().position(|p| *p == name).unwrap_or_default();
            let mut cycle: Vec<String> = path[start..].iter().map(ToString::to_string).collect();
            cycle.push(name.to_string());
            return Err(SchemaError::CyclicType(cycle));
        }
        None => {}
    }

    marks.insert(name, Mark::Visiting);
    path.push(name);
    for field in types.get(name).into_iter().flatten() {
        if let Some(dependency) = FieldType::parse(&field.r#type).struct_name() {
            visit(dependency, types, marks, path)?;
        }
    }
    path.pop();
    marks.insert(name, Mark::Done);
    Ok(())
}
