//! Raw provider spec decoding
//!
//! Provider specs arrive as raw JSON bytes. Decoding is strict: a field the
//! schema does not know about, at any depth, fails the decode and every such
//! field is reported. A hand-edited or newer payload must not silently lose
//! settings an operator put there.
//!
//! Unknown fields are found by walking the raw JSON alongside the schemars
//! schema of the target type, so the typed structs remain free to skip empty
//! fields when they are encoded again.

use crate::crd::PlatformType;
use crate::error::{Error, Result};
use schemars::schema::{RootSchema, Schema, SchemaObject, SingleOrVec};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::trace;

/// Decode a raw provider spec into `T`, rejecting unknown fields
pub fn decode<T>(raw: &[u8]) -> Result<T>
where
    T: DeserializeOwned + JsonSchema,
{
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Err(Error::EmptyProviderSpec);
    }

    let value: Value = serde_json::from_slice(raw).map_err(Error::Decode)?;
    if value.is_null() {
        return Err(Error::EmptyProviderSpec);
    }

    let unknown = unknown_fields::<T>(&value);
    if !unknown.is_empty() {
        return Err(Error::UnknownFields { fields: unknown });
    }

    let spec = serde_json::from_value(value).map_err(Error::Decode)?;
    trace!(target_type = std::any::type_name::<T>(), "decoded provider spec");
    Ok(spec)
}

/// Encode a typed provider spec back into its raw JSON form
pub fn encode<T: Serialize>(spec: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(spec)?)
}

/// Map a provider spec `kind` onto the platform it belongs to
pub fn platform_type_from_kind(kind: &str) -> Option<PlatformType> {
    match kind {
        "AWSMachineProviderConfig" => Some(PlatformType::Aws),
        "AzureMachineProviderSpec" => Some(PlatformType::Azure),
        "GCPMachineProviderSpec" => Some(PlatformType::Gcp),
        "OpenstackProviderSpec" => Some(PlatformType::OpenStack),
        "VSphereMachineProviderSpec" => Some(PlatformType::VSphere),
        "NutanixMachineProviderConfig" => Some(PlatformType::Nutanix),
        _ => None,
    }
}

/// Read the `kind` of a raw provider spec without decoding the rest of it
pub fn kind_of(raw: &[u8]) -> Result<String> {
    #[derive(serde::Deserialize)]
    struct TypeMeta {
        #[serde(default)]
        kind: String,
    }

    if raw.iter().all(u8::is_ascii_whitespace) {
        return Err(Error::EmptyProviderSpec);
    }

    let meta: TypeMeta = serde_json::from_slice(raw).map_err(Error::Decode)?;
    Ok(meta.kind)
}

// =============================================================================
// Unknown Field Detection
// =============================================================================

/// Dotted paths of every field in `value` that `T`'s schema does not declare
pub fn unknown_fields<T: JsonSchema>(value: &Value) -> Vec<String> {
    let root = schemars::schema_for!(T);
    let walker = SchemaWalker { root: &root };
    let mut unknown = Vec::new();
    walker.walk_object(value, &root.schema, "", &mut unknown);
    unknown
}

struct SchemaWalker<'a> {
    root: &'a RootSchema,
}

impl<'a> SchemaWalker<'a> {
    fn walk(&self, value: &Value, schema: &Schema, path: &str, unknown: &mut Vec<String>) {
        if let Schema::Object(object) = schema {
            self.walk_object(value, object, path, unknown);
        }
    }

    fn walk_object(
        &self,
        value: &Value,
        schema: &SchemaObject,
        path: &str,
        unknown: &mut Vec<String>,
    ) {
        if let Some(reference) = &schema.reference {
            let name = reference.rsplit('/').next().unwrap_or(reference);
            if let Some(definition) = self.root.definitions.get(name) {
                self.walk(value, definition, path, unknown);
            }
            return;
        }

        // Options and aliased types show up as subschemas
        if let Some(subschemas) = &schema.subschemas {
            let alternatives = [
                &subschemas.all_of,
                &subschemas.any_of,
                &subschemas.one_of,
            ];
            for alternative in alternatives.into_iter().flatten().flatten() {
                self.walk(value, alternative, path, unknown);
            }
        }

        match value {
            Value::Object(fields) => {
                let Some(object) = &schema.object else {
                    return;
                };

                for (key, field) in fields {
                    let field_path = join(path, key);
                    if let Some(property) = object.properties.get(key) {
                        self.walk(field, property, &field_path, unknown);
                        continue;
                    }

                    match object.additional_properties.as_deref() {
                        Some(Schema::Bool(false)) => push_unique(unknown, field_path),
                        Some(additional) => self.walk(field, additional, &field_path, unknown),
                        None if !object.pattern_properties.is_empty() => {}
                        None => push_unique(unknown, field_path),
                    }
                }
            }
            Value::Array(items) => {
                let Some(array) = &schema.array else {
                    return;
                };

                match &array.items {
                    Some(SingleOrVec::Single(item)) => {
                        for (index, element) in items.iter().enumerate() {
                            let element_path = format!("{}[{}]", path, index);
                            self.walk(element, item, &element_path, unknown);
                        }
                    }
                    Some(SingleOrVec::Vec(tuple)) => {
                        for (index, (element, item)) in items.iter().zip(tuple).enumerate() {
                            let element_path = format!("{}[{}]", path, index);
                            self.walk(element, item, &element_path, unknown);
                        }
                    }
                    None => {}
                }
            }
            _ => {}
        }
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn push_unique(unknown: &mut Vec<String>, path: String) {
    if !unknown.contains(&path) {
        unknown.push(path);
    }
}
