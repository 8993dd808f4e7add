use crate::error::FederationError;
use crate::link::federation_spec::{
    fields_argument, key_directive_arguments, override_directive_arguments,
    FEDERATION_EXTERNAL_DIRECTIVE_NAME, FEDERATION_KEY_DIRECTIVE_NAME,
    FEDERATION_OVERRIDE_DIRECTIVE_NAME, FEDERATION_PROVIDES_DIRECTIVE_NAME,
    FEDERATION_REQUIRES_DIRECTIVE_NAME, FEDERATION_SHAREABLE_DIRECTIVE_NAME,
};
use crate::schema::definitions::{resolved_type, TypeDefinition};
use crate::schema::field_set::collect_target_fields_from_field_set;
use crate::schema::position::{ObjectFieldDefinitionPosition, ObjectTypeDefinitionPosition};
use crate::schema::FederationSchema;
use indexmap::{IndexMap, IndexSet};

/// Precomputed federation metadata for one subgraph schema: the key-field and
/// shareable-field predicates, plus the external/provided field sets they are derived from
/// and the `@override` applications. Computed once at subgraph construction.
#[derive(Debug, Clone, Default)]
pub(crate) struct SubgraphMetadata {
    key_fields: IndexSet<ObjectFieldDefinitionPosition>,
    shareable_fields: IndexSet<ObjectFieldDefinitionPosition>,
    external_fields: IndexSet<ObjectFieldDefinitionPosition>,
    provided_fields: IndexSet<ObjectFieldDefinitionPosition>,
    required_fields: IndexSet<ObjectFieldDefinitionPosition>,
    overrides: IndexMap<ObjectFieldDefinitionPosition, String>,
}

impl SubgraphMetadata {
    pub(crate) fn new(schema: &FederationSchema) -> Result<Self, FederationError> {
        let mut metadata = Self::default();
        metadata.collect_external_fields(schema)?;
        metadata.collect_key_fields(schema)?;
        metadata.collect_provided_fields(schema)?;
        metadata.collect_required_fields(schema)?;
        metadata.collect_shareable_fields(schema)?;
        metadata.collect_overrides(schema)?;
        Ok(metadata)
    }

    /// A field is a key field iff it appears in a `@key(fields:)` selection on its parent
    /// type.
    pub(crate) fn is_key_field(&self, position: &ObjectFieldDefinitionPosition) -> bool {
        self.key_fields.contains(position)
    }

    /// A field is shareable iff `@shareable` is applied to it or its parent type, it is a
    /// key field (key fields are implicitly shareable), or it is the `@external` target of a
    /// `@provides` selection.
    pub(crate) fn is_shareable(&self, position: &ObjectFieldDefinitionPosition) -> bool {
        self.shareable_fields.contains(position)
    }

    pub(crate) fn is_external(&self, position: &ObjectFieldDefinitionPosition) -> bool {
        self.external_fields.contains(position)
    }

    pub(crate) fn is_provided(&self, position: &ObjectFieldDefinitionPosition) -> bool {
        self.provided_fields.contains(position)
    }

    pub(crate) fn is_required(&self, position: &ObjectFieldDefinitionPosition) -> bool {
        self.required_fields.contains(position)
    }

    /// The `from:` subgraph name of the `@override` on this field, if any.
    pub(crate) fn override_for(&self, position: &ObjectFieldDefinitionPosition) -> Option<&str> {
        self.overrides.get(position).map(String::as_str)
    }

    pub(crate) fn overrides(
        &self,
    ) -> impl Iterator<Item = (&ObjectFieldDefinitionPosition, &str)> {
        self.overrides
            .iter()
            .map(|(position, from)| (position, from.as_str()))
    }

    fn collect_external_fields(
        &mut self,
        schema: &FederationSchema,
    ) -> Result<(), FederationError> {
        for (type_name, type_) in &schema.types {
            let TypeDefinition::Object(object) = type_ else {
                continue;
            };
            let position = ObjectTypeDefinitionPosition {
                type_name: type_name.clone(),
            };
            // @external on the type marks every field of it external.
            let type_is_external = object.directives.has(&FEDERATION_EXTERNAL_DIRECTIVE_NAME);
            for (field_name, field) in &object.fields {
                if type_is_external
                    || field.directives.has(&FEDERATION_EXTERNAL_DIRECTIVE_NAME)
                {
                    self.external_fields.insert(position.field(field_name.clone()));
                }
            }
        }
        Ok(())
    }

    fn collect_key_fields(&mut self, schema: &FederationSchema) -> Result<(), FederationError> {
        for (type_name, type_) in &schema.types {
            let TypeDefinition::Object(object) = type_ else {
                continue;
            };
            for key_directive in object.directives.get_all(&FEDERATION_KEY_DIRECTIVE_NAME) {
                let arguments = key_directive_arguments(key_directive)?;
                self.key_fields.extend(collect_target_fields_from_field_set(
                    schema,
                    type_name.clone(),
                    arguments.fields,
                )?);
            }
        }
        Ok(())
    }

    fn collect_provided_fields(
        &mut self,
        schema: &FederationSchema,
    ) -> Result<(), FederationError> {
        for (type_name, type_) in &schema.types {
            let TypeDefinition::Object(object) = type_ else {
                continue;
            };
            let position = ObjectTypeDefinitionPosition {
                type_name: type_name.clone(),
            };
            for (field_name, field) in &object.fields {
                for provides_directive in
                    field.directives.get_all(&FEDERATION_PROVIDES_DIRECTIVE_NAME)
                {
                    let fields = fields_argument(provides_directive)?;
                    let field_type_name =
                        resolved_type(&field.ty, position.field(field_name.clone()))?
                            .inner_named_type()
                            .clone();
                    self.provided_fields
                        .extend(collect_target_fields_from_field_set(
                            schema,
                            field_type_name,
                            fields,
                        )?);
                }
            }
        }
        Ok(())
    }

    fn collect_required_fields(
        &mut self,
        schema: &FederationSchema,
    ) -> Result<(), FederationError> {
        for (type_name, type_) in &schema.types {
            let TypeDefinition::Object(object) = type_ else {
                continue;
            };
            for field in object.fields.values() {
                for requires_directive in
                    field.directives.get_all(&FEDERATION_REQUIRES_DIRECTIVE_NAME)
                {
                    let fields = fields_argument(requires_directive)?;
                    self.required_fields
                        .extend(collect_target_fields_from_field_set(
                            schema,
                            type_name.clone(),
                            fields,
                        )?);
                }
            }
        }
        Ok(())
    }

    fn collect_shareable_fields(
        &mut self,
        schema: &FederationSchema,
    ) -> Result<(), FederationError> {
        for (type_name, type_) in &schema.types {
            let TypeDefinition::Object(object) = type_ else {
                continue;
            };
            let position = ObjectTypeDefinitionPosition {
                type_name: type_name.clone(),
            };
            let type_is_shareable = object.directives.has(&FEDERATION_SHAREABLE_DIRECTIVE_NAME);
            for (field_name, field) in &object.fields {
                if type_is_shareable
                    || field.directives.has(&FEDERATION_SHAREABLE_DIRECTIVE_NAME)
                {
                    self.shareable_fields
                        .insert(position.field(field_name.clone()));
                }
            }
        }
        // Key fields are implicitly shareable: they must be resolvable by every subgraph
        // that advertises the key.
        self.shareable_fields.extend(self.key_fields.iter().cloned());
        // So is the @external target of a @provides selection.
        self.shareable_fields.extend(
            self.provided_fields
                .intersection(&self.external_fields)
                .cloned(),
        );
        Ok(())
    }

    fn collect_overrides(&mut self, schema: &FederationSchema) -> Result<(), FederationError> {
        for (type_name, type_) in &schema.types {
            let TypeDefinition::Object(object) = type_ else {
                continue;
            };
            let position = ObjectTypeDefinitionPosition {
                type_name: type_name.clone(),
            };
            for (field_name, field) in &object.fields {
                if let Some(override_directive) =
                    field.directives.get(&FEDERATION_OVERRIDE_DIRECTIVE_NAME)
                {
                    let arguments = override_directive_arguments(override_directive)?;
                    self.overrides
                        .insert(position.field(field_name.clone()), arguments.from.to_owned());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(type_name: &str, field_name: &str) -> ObjectFieldDefinitionPosition {
        ObjectFieldDefinitionPosition {
            type_name: apollo_compiler::schema::Name::new(type_name).unwrap(),
            field_name: apollo_compiler::schema::Name::new(field_name).unwrap(),
        }
    }

    #[test]
    fn key_fields_are_collected_and_implicitly_shareable() {
        let schema = FederationSchema::parse(
            r#"
            type Product @key(fields: "upc") {
              upc: ID
              name: String
            }
            "#,
        )
        .unwrap();
        let metadata = SubgraphMetadata::new(&schema).unwrap();
        assert!(metadata.is_key_field(&field("Product", "upc")));
        assert!(metadata.is_shareable(&field("Product", "upc")));
        assert!(!metadata.is_key_field(&field("Product", "name")));
        assert!(!metadata.is_shareable(&field("Product", "name")));
    }

    #[test]
    fn type_level_shareable_covers_all_fields() {
        let schema = FederationSchema::parse(
            r#"
            type Position @shareable {
              x: Int
              y: Int
            }
            "#,
        )
        .unwrap();
        let metadata = SubgraphMetadata::new(&schema).unwrap();
        assert!(metadata.is_shareable(&field("Position", "x")));
        assert!(metadata.is_shareable(&field("Position", "y")));
    }

    #[test]
    fn provided_external_fields_are_shareable() {
        let schema = FederationSchema::parse(
            r#"
            type Review {
              author: User @provides(fields: "username")
            }

            type User @key(fields: "id") {
              id: ID
              username: String @external
              email: String @external
            }
            "#,
        )
        .unwrap();
        let metadata = SubgraphMetadata::new(&schema).unwrap();
        assert!(metadata.is_provided(&field("User", "username")));
        assert!(metadata.is_shareable(&field("User", "username")));
        // External but not provided: not shareable through clause (d).
        assert!(!metadata.is_shareable(&field("User", "email")));
        assert!(metadata.is_external(&field("User", "email")));
    }

    #[test]
    fn override_applications_are_indexed() {
        let schema = FederationSchema::parse(
            r#"
            type Product @key(fields: "upc") {
              upc: ID
              price: Int @override(from: "Inventory")
            }
            "#,
        )
        .unwrap();
        let metadata = SubgraphMetadata::new(&schema).unwrap();
        assert_eq!(
            metadata.override_for(&field("Product", "price")),
            Some("Inventory")
        );
        assert_eq!(metadata.override_for(&field("Product", "upc")), None);
        let overrides: Vec<_> = metadata.overrides().collect();
        assert_eq!(overrides.len(), 1);
    }
}
