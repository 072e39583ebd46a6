use serde::{Deserialize, Serialize};

/// Placeholders every template may use regardless of the block's schema.
pub const BUILTIN_PLACEHOLDERS: &[&str] = &["app", "block"];

/// Where a hoisted declaration is placed in the generated translation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationSection {
    /// An `#include` line.
    Include,
    /// A field of the application state struct.
    Field,
    /// A file-scope helper such as a callback function.
    Function,
}

/// A global declaration requested by a block template, deduplicated by `key`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeclarationTemplate {
    pub key: String,
    pub section: DeclarationSection,
    pub text: String,
}

/// The condition guarding one output connector of a branching block.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GuardTemplate {
    pub output: String,
    pub condition: String,
}

/// A resource allocated by a block, released by `teardown` before every exit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResourceSpec {
    pub key: String,
    #[serde(default)]
    pub teardown: Vec<String>,
}

/// The code-generation rules of one block kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CodeTemplate {
    #[serde(default)]
    pub statements: Vec<String>,
    #[serde(default)]
    pub declarations: Vec<DeclarationTemplate>,
    #[serde(default)]
    pub guards: Vec<GuardTemplate>,
}

impl CodeTemplate {
    pub fn guard_for(&self, output: &str) -> Option<&str> {
        self.guards
            .iter()
            .find(|g| g.output == output)
            .map(|g| g.condition.as_str())
    }
}

/// A piece of a parsed template line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Placeholder(&'a str),
}

/// Splits a template line into literal text and `${name}` placeholders.
pub fn parse_line(line: &str) -> Result<Vec<Segment<'_>>, String> {
    let mut segments = Vec::new();
    let mut rest = line;
    while let Some(start) = rest.find("${") {
        if start > 0 {
            segments.push(Segment::Text(&rest[..start]));
        }
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .ok_or_else(|| format!("unterminated placeholder in `{}`", line))?;
        let name = &after[..end];
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(format!("invalid placeholder name '{}' in `{}`", name, line));
        }
        segments.push(Segment::Placeholder(name));
        rest = &after[end + 1..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Text(rest));
    }
    Ok(segments)
}

/// All placeholder names used by a template line.
pub fn placeholders(line: &str) -> Result<Vec<&str>, String> {
    Ok(parse_line(line)?
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Placeholder(name) => Some(name),
            Segment::Text(_) => None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_text_and_placeholders() {
        let segments = parse_line("furi_delay_ms(${duration_ms});").unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Text("furi_delay_ms("),
                Segment::Placeholder("duration_ms"),
                Segment::Text(");"),
            ]
        );
    }

    #[test]
    fn rejects_unterminated_placeholders() {
        assert!(parse_line("x = ${value;").is_err());
        assert!(parse_line("x = ${};").is_err());
    }
}
