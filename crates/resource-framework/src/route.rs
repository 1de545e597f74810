//! Route patterns generated from the kind graph.

use crate::handler::HttpMethod;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal collection name, e.g. `clusters`.
    Collection(String),
    /// Id placeholder of a kind, rendered `:cluster_id`.
    Id(String),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Collection(name) => f.write_str(name),
            Segment::Id(kind) => write!(f, ":{}_id", kind),
        }
    }
}

/// An ancestor-prefixed URL template of one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    prefix: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            segments: Vec::new(),
        }
    }

    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub fn with(mut self, segment: Segment) -> Self {
        self.push(segment);
        self
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// True when the pattern addresses a collection (no trailing id).
    pub fn is_collection(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::Collection(_)))
    }

    /// Substitutes `ids` into the placeholders in order; missing ids keep the placeholder.
    pub fn fill<S: AsRef<str>>(&self, ids: &[S]) -> String {
        let mut ids = ids.iter();
        let mut out = self.prefix.clone();
        for segment in &self.segments {
            out.push('/');
            let id = match segment {
                Segment::Id(_) => ids.next(),
                Segment::Collection(_) => None,
            };
            match id {
                Some(id) => out.push_str(id.as_ref()),
                None => out.push_str(&segment.to_string()),
            }
        }
        out
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prefix)?;
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

/// HTTP verb to the set of route patterns it is bound to.
///
/// Ordered containers keep iteration and equality independent of registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceRoute {
    routes: BTreeMap<HttpMethod, BTreeSet<String>>,
}

impl ResourceRoute {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, method: HttpMethod, pattern: &RoutePattern) {
        self.routes
            .entry(method)
            .or_default()
            .insert(pattern.to_string());
    }

    pub fn get(&self, method: HttpMethod) -> Option<&BTreeSet<String>> {
        self.routes.get(&method)
    }

    pub fn methods(&self) -> impl Iterator<Item = HttpMethod> + '_ {
        self.routes.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (HttpMethod, &BTreeSet<String>)> {
        self.routes.iter().map(|(m, p)| (*m, p))
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
