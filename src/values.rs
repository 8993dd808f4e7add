use crate::error::{FederationError, SingleFederationError};
use apollo_compiler::ast;
use apollo_compiler::schema::Name;
use indexmap::IndexMap;
use itertools::Itertools;
use std::fmt::{Display, Formatter};

/// A structured GraphQL value, as it appears in directive arguments and default values.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int(i32),
    Float(f64),
    String(String),
    Enum(Name),
    List(Vec<Value>),
    Object(Vec<(Name, Value)>),
    Variable(Name),
}

impl Value {
    pub(crate) fn from_ast(value: &ast::Value) -> Result<Value, FederationError> {
        Ok(match value {
            ast::Value::Null => Value::Null,
            ast::Value::Boolean(value) => Value::Boolean(*value),
            ast::Value::Int(value) => {
                Value::Int(value.try_to_i32().map_err(|_| {
                    SingleFederationError::InvalidGraphQL {
                        message: format!("Int value \"{}\" is out of range", value.as_str()),
                    }
                })?)
            }
            ast::Value::Float(value) => {
                Value::Float(value.try_to_f64().map_err(|_| {
                    SingleFederationError::InvalidGraphQL {
                        message: format!("Float value \"{}\" is out of range", value.as_str()),
                    }
                })?)
            }
            ast::Value::String(value) => Value::String(value.as_str().to_owned()),
            ast::Value::Enum(value) => Value::Enum(value.clone()),
            ast::Value::Variable(value) => Value::Variable(value.clone()),
            ast::Value::List(values) => Value::List(
                values
                    .iter()
                    .map(|value| Value::from_ast(value))
                    .collect::<Result<_, _>>()?,
            ),
            ast::Value::Object(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(name, value)| Ok((name.clone(), Value::from_ast(value)?)))
                    .collect::<Result<_, FederationError>>()?,
            ),
        })
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&Name> {
        match self {
            Value::Enum(value) => Some(value),
            _ => None,
        }
    }

    /// Collects the names of all variables referenced anywhere inside this value.
    pub(crate) fn collect_variables(&self, out: &mut Vec<Name>) {
        match self {
            Value::Variable(name) => out.push(name.clone()),
            Value::List(values) => {
                for value in values {
                    value.collect_variables(out);
                }
            }
            Value::Object(entries) => {
                for (_, value) in entries {
                    value.collect_variables(out);
                }
            }
            _ => {}
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(value) => write!(f, "{}", value),
            Value::Int(value) => write!(f, "{}", value),
            Value::Float(value) => {
                let formatted = value.to_string();
                // A float literal without a fractional or exponent part would re-parse as an Int.
                if formatted.contains(['.', 'e', 'E']) {
                    f.write_str(&formatted)
                } else {
                    write!(f, "{}.0", formatted)
                }
            }
            Value::String(value) => write_string_literal(f, value),
            Value::Enum(value) => write!(f, "{}", value),
            Value::Variable(name) => write!(f, "${}", name),
            Value::List(values) => {
                write!(f, "[{}]", values.iter().map(|v| v.to_string()).join(", "))
            }
            Value::Object(entries) => {
                write!(
                    f,
                    "{{{}}}",
                    entries
                        .iter()
                        .map(|(name, value)| format!("{}: {}", name, value))
                        .join(", ")
                )
            }
        }
    }
}

fn write_string_literal(f: &mut Formatter<'_>, value: &str) -> std::fmt::Result {
    f.write_str("\"")?;
    for c in value.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            _ => write!(f, "{}", c)?,
        }
    }
    f.write_str("\"")
}

/// A directive application: a name plus a map from argument name to value. The name is
/// expected to resolve to a definition in the same schema, but applications are never
/// validated against it here.
///
/// Equality compares names and argument maps; argument order is insignificant (so
/// `@f(a: 1, b: 2)` equals `@f(b: 2, a: 1)`), and [`Directive::canonical_string`] is the
/// matching order-insensitive printed form.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub name: Name,
    pub arguments: IndexMap<Name, Value>,
}

impl Directive {
    pub fn new(name: Name) -> Self {
        Self {
            name,
            arguments: IndexMap::new(),
        }
    }

    pub(crate) fn from_ast(directive: &ast::Directive) -> Result<Self, FederationError> {
        let mut arguments = IndexMap::new();
        for argument in &directive.arguments {
            if arguments
                .insert(argument.name.clone(), Value::from_ast(&argument.value)?)
                .is_some()
            {
                return Err(SingleFederationError::InvalidGraphQL {
                    message: format!(
                        "Duplicate argument \"{}\" on directive \"@{}\"",
                        argument.name, directive.name
                    ),
                }
                .into());
            }
        }
        Ok(Self {
            name: directive.name.clone(),
            arguments,
        })
    }

    pub fn argument(&self, name: &Name) -> Option<&Value> {
        self.arguments.get(name)
    }

    pub fn string_argument(&self, name: &Name) -> Option<&str> {
        self.arguments.get(name).and_then(Value::as_str)
    }

    pub fn boolean_argument(&self, name: &Name) -> Option<bool> {
        self.arguments.get(name).and_then(Value::as_bool)
    }

    pub fn enum_argument(&self, name: &Name) -> Option<&Name> {
        self.arguments.get(name).and_then(Value::as_enum)
    }

    /// The printed form with arguments sorted by name; suitable as a map key where semantic
    /// equality is needed.
    pub fn canonical_string(&self) -> String {
        if self.arguments.is_empty() {
            return format!("@{}", self.name);
        }
        format!(
            "@{}({})",
            self.name,
            self.arguments
                .iter()
                .sorted_by(|(a, _), (b, _)| a.as_str().cmp(b.as_str()))
                .map(|(name, value)| format!("{}: {}", name, value))
                .join(", ")
        )
    }
}

impl Display for Directive {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.name)?;
        if !self.arguments.is_empty() {
            write!(
                f,
                "({})",
                self.arguments
                    .iter()
                    .map(|(name, value)| format!("{}: {}", name, value))
                    .join(", ")
            )?;
        }
        Ok(())
    }
}

/// The list of directives applied to a schema element. Duplicate applications are kept as-is.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DirectiveList(pub Vec<Directive>);

impl DirectiveList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub(crate) fn from_ast(directives: &ast::DirectiveList) -> Result<Self, FederationError> {
        Ok(Self(
            directives
                .iter()
                .map(|directive| Directive::from_ast(directive))
                .collect::<Result<_, _>>()?,
        ))
    }

    pub fn has(&self, name: &Name) -> bool {
        self.0.iter().any(|directive| directive.name == *name)
    }

    pub fn get(&self, name: &Name) -> Option<&Directive> {
        self.0.iter().find(|directive| directive.name == *name)
    }

    pub fn get_all<'list>(
        &'list self,
        name: &'list Name,
    ) -> impl Iterator<Item = &'list Directive> {
        self.0
            .iter()
            .filter(move |directive| directive.name == *name)
    }

    pub fn push(&mut self, directive: Directive) {
        self.0.push(directive);
    }

    pub fn retain(&mut self, predicate: impl FnMut(&Directive) -> bool) {
        self.0.retain(predicate);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Directive> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl Display for DirectiveList {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.iter().map(|d| d.to_string()).join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apollo_compiler::name;

    fn directive(source: &str) -> Directive {
        let document =
            ast::Document::parse(format!("type T {{ f: Int {} }}", source), "test.graphql")
                .expect("valid document");
        let ast::Definition::ObjectTypeDefinition(object) = &document.definitions[0] else {
            panic!("expected object type");
        };
        Directive::from_ast(&object.fields[0].directives[0]).expect("valid directive")
    }

    #[test]
    fn directive_equality_ignores_argument_order() {
        assert_eq!(directive("@f(a: 1, b: 2)"), directive("@f(b: 2, a: 1)"));
        assert_ne!(directive("@f(a: 1, b: 2)"), directive("@f(a: 1, b: 3)"));
        assert_ne!(directive("@f(a: 1)"), directive("@g(a: 1)"));
    }

    #[test]
    fn canonical_string_sorts_arguments() {
        assert_eq!(
            directive("@f(b: 2, a: 1)").canonical_string(),
            directive("@f(a: 1, b: 2)").canonical_string(),
        );
        assert_eq!(
            directive("@f(b: 2, a: 1)").canonical_string(),
            "@f(a: 1, b: 2)"
        );
    }

    #[test]
    fn value_display_round_trips_literal_forms() {
        let directive = directive(r#"@f(s: "a\"b", l: [1, 2], o: {x: true}, e: UP, v: $var)"#);
        assert_eq!(
            directive.to_string(),
            r#"@f(s: "a\"b", l: [1, 2], o: {x: true}, e: UP, v: $var)"#
        );
        assert_eq!(directive.enum_argument(&name!("e")), Some(&name!("UP")));
        assert_eq!(directive.string_argument(&name!("s")), Some("a\"b"));
    }
}
