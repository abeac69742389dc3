//! Post-aggregation dependency resolution
//!
//! Walks a post-aggregation tree depth-first, pre-order, and lists the
//! `(name, refer)` edges it depends on. Callers use the edges to work out which
//! aggregations a post-aggregation needs before sending a query.
//!
//! Only arithmetic, field access, javascript and hyperUnique cardinality
//! nodes produce edges. Constants need nothing. Theta sketch nodes are
//! skipped without error, so references below them are not reported.

use super::aggregation::Aggregation;
use super::error::{ModelError, ModelResult};
use super::post_aggregation::PostAggregation;

/// One dependency edge: `name` depends on `refer`.
///
/// An empty `refer` marks `name` as a root the caller supplies directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    pub refer: String,
}

impl Dependency {
    fn new(name: impl Into<String>, refer: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            refer: refer.into(),
        }
    }

    /// True for the `(root, "")` marker
    pub fn is_root(&self) -> bool {
        self.refer.is_empty()
    }
}

impl PostAggregation {
    /// Dependencies of this node treated as a top-level post-aggregation.
    ///
    /// Fails with [`ModelError::MissingParent`] when the node itself is a bare
    /// field accessor or hyperUnique cardinality, which only has meaning
    /// inside a parent expression.
    pub fn dependencies(&self) -> ModelResult<Vec<Dependency>> {
        let mut edges = Vec::new();
        self.collect_dependencies(None, &mut edges)?;
        Ok(edges)
    }

    /// Dependencies of this node as a child of the post-aggregation `parent`
    pub fn dependencies_of(&self, parent: &str) -> ModelResult<Vec<Dependency>> {
        let mut edges = Vec::new();
        self.collect_dependencies(Some(parent), &mut edges)?;
        Ok(edges)
    }

    fn collect_dependencies(
        &self,
        parent: Option<&str>,
        edges: &mut Vec<Dependency>,
    ) -> ModelResult<()> {
        match self {
            PostAggregation::Arithmetic { name, fields, .. } => {
                match parent {
                    Some(parent) => edges.push(Dependency::new(parent, name.as_str())),
                    None => edges.push(Dependency::new(name.as_str(), "")),
                }
                for field in fields {
                    field.collect_dependencies(Some(name), edges)?;
                }
            }
            PostAggregation::FieldAccess { field_name, .. } => {
                let parent = require_parent(parent, "fieldAccess", field_name)?;
                edges.push(Dependency::new(parent, field_name.as_str()));
            }
            PostAggregation::Constant { .. } => {}
            PostAggregation::JavaScript {
                name, field_names, ..
            } => {
                for field_name in field_names {
                    edges.push(Dependency::new(name.as_str(), field_name.as_str()));
                }
            }
            PostAggregation::HyperUniqueCardinality { field_name, .. } => {
                let parent = require_parent(parent, "hyperUniqueCardinality", field_name)?;
                edges.push(Dependency::new(parent, field_name.as_str()));
            }
            PostAggregation::ThetaSketchEstimate { .. }
            | PostAggregation::ThetaSketchSetOp { .. } => {}
        }
        Ok(())
    }
}

fn require_parent<'a>(
    parent: Option<&'a str>,
    kind: &'static str,
    field: &str,
) -> ModelResult<&'a str> {
    parent.ok_or_else(|| ModelError::MissingParent {
        kind,
        field: field.to_string(),
    })
}

/// Names referenced by `post_aggregations` that none of the given
/// aggregations or post-aggregations produce, in first-seen order.
pub fn unresolved_references(
    aggregations: &[Aggregation],
    post_aggregations: &[PostAggregation],
) -> ModelResult<Vec<String>> {
    let mut produced: Vec<&str> = aggregations.iter().map(Aggregation::name).collect();
    produced.extend(post_aggregations.iter().filter_map(PostAggregation::name));

    let mut missing: Vec<String> = Vec::new();
    for post_aggregation in post_aggregations {
        for edge in post_aggregation.dependencies()? {
            if edge.is_root() {
                continue;
            }
            let internal = post_aggregation_names(post_aggregation).contains(&edge.refer.as_str());
            if !internal
                && !produced.contains(&edge.refer.as_str())
                && !missing.contains(&edge.refer)
            {
                missing.push(edge.refer);
            }
        }
    }
    Ok(missing)
}

/// Names of the arithmetic nodes nested inside `root`, which are produced by `root` itself
fn post_aggregation_names(root: &PostAggregation) -> Vec<&str> {
    let mut names = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if let PostAggregation::Arithmetic { name, fields, .. } = node {
            names.push(name.as_str());
            stack.extend(fields.iter());
        }
    }
    names
}
