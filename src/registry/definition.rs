use super::property::PropertyDefinition;
use super::template::{CodeTemplate, ResourceSpec};
use serde::{Deserialize, Serialize};

/// The closed set of control-flow behaviours a block kind can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockRole {
    /// The program's sole starting block.
    Entry,
    /// A straight-line step with a single successor.
    Action,
    /// A block choosing one of several output connectors.
    Branch,
    /// A block that returns from the program.
    Exit,
}

/// A named attachment point on a block.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConnectorDefinition {
    pub id: String,
    #[serde(default)]
    pub description: String,
    /// A merge input accepts one connection per reconverging branch.
    #[serde(default)]
    pub merge: bool,
}

/// The immutable contract of one kind of block.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BlockTypeDefinition {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub role: BlockRole,
    #[serde(default)]
    pub inputs: Vec<ConnectorDefinition>,
    #[serde(default)]
    pub outputs: Vec<ConnectorDefinition>,
    #[serde(default)]
    pub properties: Vec<PropertyDefinition>,
    /// The subsystem this kind initializes.
    #[serde(default)]
    pub provides: Option<String>,
    /// Subsystems whose init block must dominate every block of this kind.
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default)]
    pub resource: Option<ResourceSpec>,
    #[serde(default, alias = "codeTemplate")]
    pub template: CodeTemplate,
}

impl BlockTypeDefinition {
    pub fn input(&self, id: &str) -> Option<&ConnectorDefinition> {
        self.inputs.iter().find(|c| c.id == id)
    }

    pub fn output(&self, id: &str) -> Option<&ConnectorDefinition> {
        self.outputs.iter().find(|c| c.id == id)
    }

    /// Position of an output connector in declaration order.
    pub fn output_position(&self, id: &str) -> Option<usize> {
        self.outputs.iter().position(|c| c.id == id)
    }

    pub fn property(&self, id: &str) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|p| p.id == id)
    }

    pub fn is_branch(&self) -> bool {
        self.role == BlockRole::Branch
    }

    pub fn is_exit(&self) -> bool {
        self.role == BlockRole::Exit
    }
}

/// A palette grouping of block kinds. Passthrough for editors.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BlockCategory {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub description: String,
}

/// Wire format of a block catalog document.
#[derive(Debug, Deserialize)]
pub(super) struct CatalogDocument {
    #[serde(alias = "blockCategories")]
    pub categories: Vec<CatalogCategory>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CatalogCategory {
    #[serde(flatten)]
    pub category: BlockCategory,
    #[serde(default)]
    pub blocks: Vec<BlockTypeDefinition>,
}
