//! External inputs referenced by a filtergraph.
//!
//! The graph builders register inputs here and use the returned stream
//! references, so the order of `-i` arguments and the stream indices inside
//! the graph come from the same list.

use crate::graph::{FilterGraph, StreamRef};

/// What an external input carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputRole {
    /// The source image sequence.
    Sequence,
    /// Generated solid color background.
    ColorSource,
    /// Generated placeholder stream keeping indices aligned.
    NullSource,
    /// Bars asset.
    Bars,
    /// Color bars asset.
    ColorBars,
    /// Company logo.
    Logo,
    /// A previously rendered slate image.
    SlateImage,
}

/// Ordered input registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputRoster {
    roles: Vec<InputRole>,
}

impl InputRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an input and get the stream reference for its video.
    pub fn add(&mut self, role: InputRole) -> StreamRef {
        self.roles.push(role);
        StreamRef::Input(self.roles.len() - 1)
    }

    pub fn roles(&self) -> &[InputRole] {
        &self.roles
    }
}

/// A built graph together with the inputs it expects, in index order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphPlan {
    pub graph: FilterGraph,
    pub inputs: InputRoster,
}

impl GraphPlan {
    /// The `-filter_complex` argument.
    pub fn render(&self) -> String {
        self.graph.render()
    }

    pub fn roles(&self) -> &[InputRole] {
        self.inputs.roles()
    }
}
