use crate::query_plan::scope::Scope;
use crate::schema::definitions::FieldDefinition;
use apollo_compiler::ast;
use apollo_compiler::schema::Name;
use apollo_compiler::Node;
use std::rc::Rc;

pub mod collect;
pub mod context;
pub mod scope;

/// One entry of a field set: the scope the field was collected under, the field node from
/// the operation (or a synthesized one, for `__typename` in key field sets), and the
/// resolved field definition.
#[derive(Debug, Clone)]
pub struct CollectedField {
    pub scope: Rc<Scope>,
    pub node: Node<ast::Field>,
    pub definition: FieldDefinition,
}

impl CollectedField {
    /// The name this field will have in the response: its alias when present.
    pub fn response_name(&self) -> &Name {
        self.node.alias.as_ref().unwrap_or(&self.node.name)
    }
}

/// An ordered, flat list of collected fields; ordering reflects source selection order.
pub type FieldSet = Vec<CollectedField>;
