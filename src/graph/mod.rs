//! In-memory model of a block program.
//!
//! Blocks live in an arena and are addressed by [`BlockIdx`]; connections keep
//! the string endpoints they were loaded with so the validator can report
//! dangling references instead of failing construction.

use ahash::AHashMap;
use serde_json::{Map, Value};
use std::fmt;

/// Position of a block in the graph's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockIdx(usize);

impl BlockIdx {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for BlockIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One placed instance of a block kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: String,
    pub kind: String,
    pub properties: Map<String, Value>,
}

impl Block {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            properties: Map::new(),
        }
    }

    pub fn with_property(mut self, name: &str, value: Value) -> Self {
        self.properties.insert(name.to_string(), value);
        self
    }
}

/// Which side of a block a connector sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    In,
    Out,
}

/// A (block, connector) pair as written in the project description.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectorRef {
    pub block: String,
    pub connector: String,
    pub direction: Direction,
}

impl ConnectorRef {
    pub fn output(block: impl Into<String>, connector: impl Into<String>) -> Self {
        Self {
            block: block.into(),
            connector: connector.into(),
            direction: Direction::Out,
        }
    }

    pub fn input(block: impl Into<String>, connector: impl Into<String>) -> Self {
        Self {
            block: block.into(),
            connector: connector.into(),
            direction: Direction::In,
        }
    }
}

impl fmt::Display for ConnectorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.block, self.connector)
    }
}

/// A directed control-flow link from an output connector to an input connector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Connection {
    pub from: ConnectorRef,
    pub to: ConnectorRef,
}

impl Connection {
    pub fn new(from_block: &str, from_port: &str, to_block: &str, to_port: &str) -> Self {
        Self {
            from: ConnectorRef::output(from_block, from_port),
            to: ConnectorRef::input(to_block, to_port),
        }
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Graph {
    blocks: Vec<Block>,
    connections: Vec<Connection>,
    index: AHashMap<String, BlockIdx>,
}

impl Graph {
    /// Builds the arena. When several blocks share an id, the first one wins the
    /// id lookup; the validator reports the others.
    pub fn new(blocks: Vec<Block>, connections: Vec<Connection>) -> Self {
        let mut index = AHashMap::with_capacity(blocks.len());
        for (position, block) in blocks.iter().enumerate() {
            index
                .entry(block.id.clone())
                .or_insert(BlockIdx(position));
        }
        Self {
            blocks,
            connections,
            index,
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn block(&self, idx: BlockIdx) -> &Block {
        &self.blocks[idx.0]
    }

    /// Looks up a block by its user-facing id.
    pub fn find(&self, id: &str) -> Option<BlockIdx> {
        self.index.get(id).copied()
    }

    pub fn indices(&self) -> impl Iterator<Item = BlockIdx> + use<> {
        (0..self.blocks.len()).map(BlockIdx)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
