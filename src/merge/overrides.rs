use crate::error::{CompositionError, CompositionHint};
use crate::subgraph::Subgraph;
use apollo_compiler::schema::Name;
use indexmap::IndexMap;
use std::fmt::{Display, Formatter};

/// A field coordinate `Type.field`, the unit override rewriting works on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct FieldCoordinate {
    pub(crate) type_name: Name,
    pub(crate) field_name: Name,
}

impl Display for FieldCoordinate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.type_name, self.field_name)
    }
}

/// A validated `@override`: the winner takes over resolution of the field from the loser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OverrideDecision {
    pub(crate) winner: usize,
    pub(crate) loser: usize,
}

#[derive(Debug, Default)]
pub(crate) struct OverrideAnalysis {
    pub(crate) decisions: IndexMap<FieldCoordinate, OverrideDecision>,
    pub(crate) errors: Vec<CompositionError>,
    pub(crate) hints: Vec<CompositionHint>,
}

/// Validates every `@override` application across the subgraphs and decides which ones take
/// effect. Invalid applications produce composition errors (all of them, not just the
/// first); applications with no effect produce hints.
pub(crate) fn analyze_overrides(subgraphs: &[Subgraph]) -> OverrideAnalysis {
    let mut analysis = OverrideAnalysis::default();
    for (subgraph_index, subgraph) in subgraphs.iter().enumerate() {
        for (position, from) in subgraph.metadata().overrides() {
            let coordinate = FieldCoordinate {
                type_name: position.type_name.clone(),
                field_name: position.field_name.clone(),
            };

            if subgraph.metadata().is_external(position) {
                analysis.errors.push(
                    CompositionError::OverrideCollisionWithAnotherDirective {
                        message: format!(
                            "@override cannot be used on field \"{}\" on subgraph \"{}\" since \"{}\" on \"{}\" is marked with directive \"@external\"",
                            coordinate, subgraph.name, coordinate, subgraph.name,
                        ),
                    },
                );
                continue;
            }

            if from == subgraph.name {
                analysis.errors.push(CompositionError::OverrideFromSelfError {
                    message: format!(
                        "Source and destination subgraphs \"{}\" are the same for overridden field \"{}\"",
                        subgraph.name, coordinate,
                    ),
                });
                continue;
            }

            let Some((source_index, source)) = subgraphs
                .iter()
                .enumerate()
                .find(|(_, other)| other.name == from)
            else {
                analysis.hints.push(CompositionHint {
                    code: "OVERRIDE_DIRECTIVE_CAN_BE_REMOVED",
                    message: format!(
                        "Field \"{}\" on subgraph \"{}\" is marked with @override(from: \"{}\"), but subgraph \"{}\" does not exist; the directive has no effect",
                        coordinate, subgraph.name, from, from,
                    ),
                });
                continue;
            };

            if position.try_get(&source.schema).is_none() {
                analysis.hints.push(CompositionHint {
                    code: "OVERRIDE_DIRECTIVE_CAN_BE_REMOVED",
                    message: format!(
                        "Field \"{}\" on subgraph \"{}\" is not resolved in subgraph \"{}\"; the @override directive can be removed",
                        coordinate, subgraph.name, from,
                    ),
                });
                continue;
            }

            // Emitted once per side: the other side's iteration produces its own copy.
            if source.metadata().override_for(position).is_some() {
                analysis
                    .errors
                    .push(CompositionError::OverrideSourceHasOverride {
                        message: format!(
                            "Field \"{}\" on subgraph \"{}\" is also marked with directive @override in subgraph \"{}\". Only one @override directive is allowed per field.",
                            coordinate, subgraph.name, from,
                        ),
                    });
                continue;
            }

            if source.metadata().is_external(position) {
                analysis.errors.push(
                    CompositionError::OverrideCollisionWithAnotherDirective {
                        message: format!(
                            "@override cannot be used on field \"{}\" on subgraph \"{}\" since \"{}\" on \"{}\" is marked with directive \"@external\"",
                            coordinate, subgraph.name, coordinate, from,
                        ),
                    },
                );
                continue;
            }

            analysis.decisions.insert(
                coordinate.clone(),
                OverrideDecision {
                    winner: subgraph_index,
                    loser: source_index,
                },
            );

            // An overridden field is usually safe to delete from its old subgraph, but not
            // when that subgraph still selects it through @provides or @requires.
            let still_used = source.metadata().is_provided(position)
                || source.metadata().is_required(position);
            if still_used {
                analysis.hints.push(CompositionHint {
                    code: "OVERRIDDEN_FIELD_STILL_USED",
                    message: format!(
                        "Field \"{}\" on subgraph \"{}\" is overridden by subgraph \"{}\", but it is still selected by a @provides or @requires in \"{}\"; mark it @external instead of removing it",
                        coordinate, from, subgraph.name, from,
                    ),
                });
            } else {
                analysis.hints.push(CompositionHint {
                    code: "OVERRIDDEN_FIELD_CAN_BE_REMOVED",
                    message: format!(
                        "Field \"{}\" on subgraph \"{}\" is overridden by subgraph \"{}\"; consider removing it",
                        coordinate, from, subgraph.name,
                    ),
                });
            }
        }
    }
    analysis
}
