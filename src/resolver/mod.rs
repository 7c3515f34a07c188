//! Generation order resolution.
//!
//! Variables reference each other through template syntax in their rule fields.
//! The resolver turns those references into a [`DependencyGraph`] and computes
//! an order in which every variable comes after everything it references.
//!
//! Independent variables are generated in schema declaration order, so command
//! rules with side effects always run in the same sequence.

pub mod dependency_graph;

pub use dependency_graph::DependencyGraph;

use crate::core::EnvgenError;
use crate::schema::EnvSchema;

/// Compute the generation order for `schema`
///
/// # Errors
///
/// Returns [`EnvgenError::CircularDependency`] when the references form a cycle,
/// including a variable that references itself.
pub fn order(schema: &EnvSchema) -> Result<Vec<String>, EnvgenError> {
    DependencyGraph::from_schema(schema).generation_order()
}
