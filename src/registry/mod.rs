//! The block type registry: an immutable catalog of block kinds.
//!
//! The registry is loaded once from a declarative JSON catalog and then shared
//! read-only by every compilation. All per-kind behaviour (connectors, property
//! schema, subsystem ordering rules, resource teardown and code templates) is
//! data in the catalog; nothing in the compiler branches on kind-name strings.
//!
//! ```rust
//! use flipscript::registry::BlockRegistry;
//!
//! let registry = BlockRegistry::standard().unwrap();
//! assert_eq!(registry.entry_kind().unwrap(), "app_on_start");
//! assert!(registry.lookup("wait_for_input").is_ok());
//! ```

mod definition;
mod property;
mod template;

pub use definition::*;
pub use property::*;
pub use template::*;

use crate::error::RegistryError;
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;

/// The catalog shipped with the crate.
const STANDARD_CATALOG: &str = include_str!("catalog.json");

#[derive(Debug, Clone)]
pub struct BlockRegistry {
    kinds: Vec<BlockTypeDefinition>,
    categories: Vec<BlockCategory>,
    index: AHashMap<String, usize>,
    aliases: AHashMap<String, String>,
}

impl BlockRegistry {
    /// Loads the built-in catalog of block kinds.
    pub fn standard() -> Result<Self, RegistryError> {
        Self::from_json(STANDARD_CATALOG)
    }

    /// Loads a catalog document and checks every definition in it.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let document: CatalogDocument = serde_json::from_str(json)
            .map_err(|e| RegistryError::CatalogParse(e.to_string()))?;

        let mut categories = Vec::new();
        let mut kinds = Vec::new();
        for entry in document.categories {
            let category_id = entry.category.id.clone();
            for mut kind in entry.blocks {
                if kind.category.is_empty() {
                    kind.category = category_id.clone();
                }
                kinds.push(kind);
            }
            categories.push(entry.category);
        }
        Self::from_definitions(categories, kinds)
    }

    /// Builds a registry from already parsed definitions.
    pub fn from_definitions(
        categories: Vec<BlockCategory>,
        kinds: Vec<BlockTypeDefinition>,
    ) -> Result<Self, RegistryError> {
        let mut index = AHashMap::new();
        for (position, kind) in kinds.iter().enumerate() {
            if index.insert(kind.id.clone(), position).is_some() {
                return Err(RegistryError::RegistryMisconfigured(format!(
                    "block kind '{}' is defined more than once",
                    kind.id
                )));
            }
            check_definition(kind)?;
        }

        let registry = Self {
            kinds,
            categories,
            index,
            aliases: AHashMap::new(),
        };
        registry.entry_kind()?;
        tracing::debug!(
            kinds = registry.kinds.len(),
            categories = registry.categories.len(),
            "block registry loaded"
        );
        Ok(registry)
    }

    /// Maps a legacy or user-facing kind name onto a registered kind.
    pub fn with_alias(mut self, alias: &str, kind: &str) -> Result<Self, RegistryError> {
        if !self.index.contains_key(kind) {
            return Err(RegistryError::UnknownBlockKind(kind.to_string()));
        }
        if self.index.contains_key(alias) {
            return Err(RegistryError::RegistryMisconfigured(format!(
                "alias '{}' shadows a registered block kind",
                alias
            )));
        }
        self.aliases.insert(alias.to_string(), kind.to_string());
        Ok(self)
    }

    /// Looks up a kind by id (or alias).
    pub fn lookup(&self, kind_id: &str) -> Result<&BlockTypeDefinition, RegistryError> {
        let canonical = self
            .aliases
            .get(kind_id)
            .map(String::as_str)
            .unwrap_or(kind_id);
        self.index
            .get(canonical)
            .map(|&position| &self.kinds[position])
            .ok_or_else(|| RegistryError::UnknownBlockKind(kind_id.to_string()))
    }

    /// The id of the sole kind with the entry role.
    pub fn entry_kind(&self) -> Result<&str, RegistryError> {
        let entries: Vec<&BlockTypeDefinition> = self
            .kinds
            .iter()
            .filter(|k| k.role == BlockRole::Entry)
            .collect();
        match entries.as_slice() {
            [entry] => Ok(&entry.id),
            [] => Err(RegistryError::RegistryMisconfigured(
                "no block kind is marked as entry".to_string(),
            )),
            many => Err(RegistryError::RegistryMisconfigured(format!(
                "several block kinds are marked as entry: {}",
                many.iter().map(|k| k.id.as_str()).join(", ")
            ))),
        }
    }

    /// All kinds, in catalog order.
    pub fn kinds(&self) -> impl Iterator<Item = &BlockTypeDefinition> {
        self.kinds.iter()
    }

    pub fn categories(&self) -> &[BlockCategory] {
        &self.categories
    }

    /// Kinds belonging to one palette category, in catalog order.
    pub fn kinds_in_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a BlockTypeDefinition> + 'a {
        self.kinds.iter().filter(move |k| k.category == category)
    }
}

/// Load-time checks that keep authoring defects out of compilation.
fn check_definition(kind: &BlockTypeDefinition) -> Result<(), RegistryError> {
    let invalid = |message: String| RegistryError::InvalidDefinition {
        kind: kind.id.clone(),
        message,
    };

    for (label, connectors) in [("input", &kind.inputs), ("output", &kind.outputs)] {
        if let Some(dup) = connectors.iter().map(|c| c.id.as_str()).duplicates().next() {
            return Err(invalid(format!("{} connector '{}' is declared twice", label, dup)));
        }
    }
    if let Some(dup) = kind.properties.iter().map(|p| p.id.as_str()).duplicates().next() {
        return Err(invalid(format!("property '{}' is declared twice", dup)));
    }

    match kind.role {
        BlockRole::Entry if !kind.inputs.is_empty() => {
            return Err(invalid("an entry kind cannot have inputs".to_string()));
        }
        BlockRole::Exit if !kind.outputs.is_empty() => {
            return Err(invalid("an exit kind cannot have outputs".to_string()));
        }
        BlockRole::Action | BlockRole::Entry if kind.outputs.len() > 1 => {
            return Err(invalid(
                "only branch kinds may declare several outputs".to_string(),
            ));
        }
        BlockRole::Branch => {
            if kind.outputs.len() < 2 {
                return Err(invalid(
                    "a branch kind needs at least two outputs".to_string(),
                ));
            }
            // The last output may stay unguarded and becomes the `else` arm.
            let guarded = &kind.outputs[..kind.outputs.len() - 1];
            for output in guarded {
                if kind.template.guard_for(&output.id).is_none() {
                    return Err(invalid(format!("output '{}' has no guard", output.id)));
                }
            }
            if let Some(last) = kind.outputs.last() {
                if kind.template.guard_for(&last.id).is_some() {
                    return Err(invalid(format!(
                        "last output '{}' is the fallback arm and cannot carry a guard",
                        last.id
                    )));
                }
            }
        }
        _ => {}
    }
    for guard in &kind.template.guards {
        if kind.output(&guard.output).is_none() {
            return Err(invalid(format!(
                "guard refers to unknown output '{}'",
                guard.output
            )));
        }
    }

    let property_ids: AHashSet<&str> = kind.properties.iter().map(|p| p.id.as_str()).collect();
    let block_lines = kind
        .template
        .statements
        .iter()
        .chain(kind.template.guards.iter().map(|g| &g.condition));
    for line in block_lines {
        for name in placeholders(line).map_err(invalid)? {
            if !BUILTIN_PLACEHOLDERS.contains(&name) && !property_ids.contains(name) {
                return Err(invalid(format!("placeholder '{}' names no property", name)));
            }
        }
    }

    // Declarations and teardowns are shared across blocks, so they may only use builtins.
    let shared_lines = kind
        .template
        .declarations
        .iter()
        .map(|d| &d.text)
        .chain(kind.resource.iter().flat_map(|r| r.teardown.iter()));
    for line in shared_lines {
        for name in placeholders(line).map_err(invalid)? {
            if name != "app" {
                return Err(invalid(format!(
                    "placeholder '{}' is not allowed in declarations or teardowns",
                    name
                )));
            }
        }
    }

    if let Some(resource) = &kind.resource {
        if resource.teardown.is_empty() {
            return Err(invalid(format!(
                "resource '{}' has no teardown",
                resource.key
            )));
        }
    }

    for property in &kind.properties {
        if !property.required && property.default.is_none() {
            return Err(invalid(format!(
                "optional property '{}' needs a default",
                property.id
            )));
        }
        if let Some(default) = &property.default {
            property.check(default).map_err(|violation| {
                invalid(format!(
                    "default of property '{}' is invalid: {}",
                    property.id, violation.message
                ))
            })?;
        }
    }
    Ok(())
}
