use super::{Canvas, Project};
use crate::error::ProjectError;
use crate::graph::{Block, Connection, ConnectorRef, Graph};

/// A trait for project formats that can be turned into a block [`Graph`].
///
/// The built-in [`Project`] document implements it, but any editor format can
/// plug into the compiler by providing its own translation.
///
/// # Example
///
/// ```rust
/// use flipscript::prelude::*;
/// use flipscript::error::ProjectError;
///
/// struct Chain(Vec<(&'static str, &'static str)>);
///
/// impl IntoGraph for Chain {
///     fn into_graph(self) -> std::result::Result<Graph, ProjectError> {
///         let blocks: Vec<Block> = self.0.iter().map(|(id, kind)| Block::new(*id, *kind)).collect();
///         let connections = self
///             .0
///             .windows(2)
///             .map(|pair| Connection::new(pair[0].0, "next", pair[1].0, "in"))
///             .collect();
///         Ok(Graph::new(blocks, connections))
///     }
/// }
///
/// let graph = Chain(vec![("start", "app_on_start"), ("stop", "app_exit")]).into_graph().unwrap();
/// assert_eq!(graph.len(), 2);
/// ```
pub trait IntoGraph {
    /// Consumes the object and converts it into the canonical graph model.
    fn into_graph(self) -> Result<Graph, ProjectError>;
}

impl IntoGraph for Canvas {
    fn into_graph(self) -> Result<Graph, ProjectError> {
        let blocks = self
            .blocks
            .into_iter()
            .map(|record| Block {
                id: record.id,
                kind: record.kind,
                properties: record.properties,
            })
            .collect();

        let connections = self
            .connections
            .into_iter()
            .map(|record| Connection {
                from: ConnectorRef::output(record.from.block, record.from.port),
                to: ConnectorRef::input(record.to.block, record.to.port),
            })
            .collect();

        Ok(Graph::new(blocks, connections))
    }
}

impl IntoGraph for &Project {
    fn into_graph(self) -> Result<Graph, ProjectError> {
        self.canvas.clone().into_graph()
    }
}
