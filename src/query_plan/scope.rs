use crate::error::FederationError;
use crate::query_plan::context::QueryPlanningContext;
use crate::schema::position::CompositeTypeDefinitionPosition;
use crate::values::Directive;
use apollo_compiler::schema::Name;
use indexmap::IndexSet;
use itertools::Itertools;
use std::cell::OnceCell;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// A chain of type refinements tracking the set of possible runtime object types at one
/// selection point, plus the directives of the fragments that narrowed the set. Scopes are
/// immutable; refinement produces a new scope sharing the tail.
#[derive(Debug)]
pub struct Scope {
    parent_type: CompositeTypeDefinitionPosition,
    directives: Option<Vec<Directive>>,
    enclosing: Option<Rc<Scope>>,
    possible_types: OnceCell<IndexSet<Name>>,
}

impl Scope {
    pub fn create(parent_type: CompositeTypeDefinitionPosition) -> Rc<Scope> {
        Rc::new(Scope {
            parent_type,
            directives: None,
            enclosing: None,
            possible_types: OnceCell::new(),
        })
    }

    pub fn parent_type(&self) -> &CompositeTypeDefinitionPosition {
        &self.parent_type
    }

    pub fn directives(&self) -> Option<&[Directive]> {
        self.directives.as_deref()
    }

    pub fn enclosing(&self) -> Option<&Rc<Scope>> {
        self.enclosing.as_ref()
    }

    /// The chain of refinements, newest first.
    pub fn chain(&self) -> impl Iterator<Item = &Scope> {
        std::iter::successors(Some(self), |scope| scope.enclosing.as_deref())
    }

    /// Pushes a refinement by the given type. An empty directive list counts as absent.
    /// Without directives, a refinement that does not strictly narrow the scope returns the
    /// scope unchanged; and any older directive-less link made redundant by the new type
    /// (its parent being a super-type of it) is pruned from the copied chain.
    pub fn refine(
        self: &Rc<Self>,
        context: &QueryPlanningContext,
        parent_type: CompositeTypeDefinitionPosition,
        directives: Option<Vec<Directive>>,
    ) -> Result<Rc<Scope>, FederationError> {
        let directives = directives.filter(|directives| !directives.is_empty());
        let new_possible = context.possible_types(parent_type.type_name())?;
        if directives.is_none() {
            let mut strictly_refines = true;
            for link in self.chain() {
                let link_possible = context.possible_types(link.parent_type.type_name())?;
                if link_possible.is_subset(&new_possible) {
                    strictly_refines = false;
                    break;
                }
            }
            if !strictly_refines {
                return Ok(Rc::clone(self));
            }
        }

        let mut kept: Vec<(CompositeTypeDefinitionPosition, Option<Vec<Directive>>)> = Vec::new();
        for link in self.chain() {
            if link.directives.is_none() {
                let link_possible = context.possible_types(link.parent_type.type_name())?;
                if new_possible.is_subset(&link_possible) {
                    continue;
                }
            }
            kept.push((link.parent_type.clone(), link.directives.clone()));
        }

        let mut rebuilt: Option<Rc<Scope>> = None;
        for (link_parent, link_directives) in kept.into_iter().rev() {
            rebuilt = Some(Rc::new(Scope {
                parent_type: link_parent,
                directives: link_directives,
                enclosing: rebuilt,
                possible_types: OnceCell::new(),
            }));
        }
        Ok(Rc::new(Scope {
            parent_type,
            directives,
            enclosing: rebuilt,
            possible_types: OnceCell::new(),
        }))
    }

    /// The intersection of the possible runtime types of every refinement in the chain.
    /// Memoized per scope.
    pub fn possible_runtime_types(
        &self,
        context: &QueryPlanningContext,
    ) -> Result<&IndexSet<Name>, FederationError> {
        if self.possible_types.get().is_none() {
            let mut possible = context.possible_types(self.parent_type.type_name())?;
            if let Some(enclosing) = &self.enclosing {
                let outer = enclosing.possible_runtime_types(context)?;
                possible.retain(|name| outer.contains(name));
            }
            let _ = self.possible_types.set(possible);
        }
        Ok(self
            .possible_types
            .get()
            .expect("possible types were just computed"))
    }

    /// A canonical string key with the same equivalence as [`Scope::equals`]. Useful as a
    /// map key where semantic equality is needed.
    pub fn identity_key(&self, context: &QueryPlanningContext) -> Result<String, FederationError> {
        let mut key = self.parent_type.type_name().to_string();
        let possible = self.possible_runtime_types(context)?;
        key.push('(');
        key.push_str(&possible.iter().map(|name| name.as_str()).sorted().join(","));
        key.push(')');
        for link in self.chain() {
            if let Some(directives) = &link.directives {
                key.push('|');
                key.push_str(link.parent_type.type_name().as_str());
                key.push(':');
                key.push_str(
                    &directives
                        .iter()
                        .map(|directive| directive.canonical_string())
                        .join(" "),
                );
            }
        }
        Ok(key)
    }

    /// Structural comparison, walking both chains in lockstep. Directive comparison is
    /// argument-order-insensitive.
    pub fn equals(&self, other: &Scope) -> bool {
        let mut left = Some(self);
        let mut right = Some(other);
        loop {
            match (left, right) {
                (None, None) => return true,
                (Some(l), Some(r)) => {
                    if l.parent_type != r.parent_type || l.directives != r.directives {
                        return false;
                    }
                    left = l.enclosing.as_deref();
                    right = r.enclosing.as_deref();
                }
                _ => return false,
            }
        }
    }

    /// Combines the parent-type name hash with a symmetric hash over the directive strings,
    /// truncated to 32 bits. Consistent with [`Scope::equals`]: equal scopes hash equally.
    pub fn hash_code(&self) -> u32 {
        let mut hasher = DefaultHasher::new();
        self.parent_type.type_name().as_str().hash(&mut hasher);
        let base = hasher.finish();
        let mut directive_hash: u64 = 0;
        if let Some(directives) = &self.directives {
            for directive in directives {
                let mut hasher = DefaultHasher::new();
                directive.canonical_string().hash(&mut hasher);
                directive_hash ^= hasher.finish();
            }
        }
        (base ^ directive_hash) as u32
    }
}

impl PartialEq for Scope {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl Hash for Scope {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.hash_code());
    }
}
