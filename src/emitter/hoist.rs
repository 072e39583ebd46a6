use crate::error::EmitError;
use crate::registry::DeclarationSection;
use ahash::AHashMap;
use serde::Serialize;

/// A rendered global declaration, hoisted ahead of the entry function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    pub key: String,
    pub section: DeclarationSection,
    pub text: String,
}

/// Declarations in first-use order, deduplicated by key.
#[derive(Debug, Default)]
pub(super) struct DeclarationTable {
    entries: Vec<Declaration>,
    index: AHashMap<String, usize>,
}

impl DeclarationTable {
    /// Records a declaration. Requesting an existing key again is a no-op when
    /// the text matches and a conflict otherwise.
    pub fn request(&mut self, declaration: Declaration, block_id: &str) -> Result<(), EmitError> {
        if let Some(&position) = self.index.get(&declaration.key) {
            let existing = &self.entries[position];
            if existing.text != declaration.text || existing.section != declaration.section {
                return Err(EmitError::DeclarationConflict {
                    key: declaration.key,
                    block_id: block_id.to_string(),
                });
            }
            return Ok(());
        }
        self.index
            .insert(declaration.key.clone(), self.entries.len());
        self.entries.push(declaration);
        Ok(())
    }

    pub fn section(&self, section: DeclarationSection) -> impl Iterator<Item = &Declaration> {
        self.entries.iter().filter(move |d| d.section == section)
    }

    pub fn into_vec(self) -> Vec<Declaration> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(key: &str, text: &str) -> Declaration {
        Declaration {
            key: key.to_string(),
            section: DeclarationSection::Field,
            text: text.to_string(),
        }
    }

    #[test]
    fn same_key_is_kept_once_in_first_use_order() {
        let mut table = DeclarationTable::default();
        table.request(field("counter", "int32_t counter;"), "a").unwrap();
        table.request(field("gui", "Gui* gui;"), "b").unwrap();
        table.request(field("counter", "int32_t counter;"), "c").unwrap();
        let keys: Vec<_> = table.into_vec().into_iter().map(|d| d.key).collect();
        assert_eq!(keys, vec!["counter", "gui"]);
    }

    #[test]
    fn same_key_with_different_text_conflicts() {
        let mut table = DeclarationTable::default();
        table.request(field("counter", "int32_t counter;"), "a").unwrap();
        let err = table
            .request(field("counter", "uint8_t counter;"), "b")
            .unwrap_err();
        assert_eq!(
            err,
            EmitError::DeclarationConflict {
                key: "counter".to_string(),
                block_id: "b".to_string()
            }
        );
    }
}
