use crate::error::EmitError;
use crate::registry::{PropertyValue, Segment, parse_line};
use crate::validator::ResolvedProperties;

/// Renders a string as a C string literal.
///
/// Backslashes, quotes, control characters and every non-ASCII byte are
/// escaped, so the literal is valid in any source encoding. Escapes are
/// octal with three digits, which unlike `\x` cannot swallow following
/// characters. `??` is broken up to avoid trigraphs.
pub fn c_string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    let mut previous = '\0';
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '?' if previous == '?' => out.push_str("\\?"),
            c if c.is_ascii_control() || !c.is_ascii() => {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).bytes() {
                    out.push_str(&format!("\\{:03o}", byte));
                }
            }
            c => out.push(c),
        }
        previous = c;
    }
    out.push('"');
    out
}

/// The C spelling of a resolved property value.
pub fn render_value(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Str(s) => c_string_literal(s),
        PropertyValue::Int(n) => n.to_string(),
        PropertyValue::Bool(b) => b.to_string(),
        PropertyValue::Enum(v) => v.clone(),
    }
}

/// Whether `s` can be spelled as a C identifier.
pub fn is_c_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Maps an arbitrary block id onto a C identifier fragment.
pub fn sanitize_identifier(id: &str) -> String {
    let mut out: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert_str(0, "block_");
    }
    out
}

/// Values available to `${...}` placeholders while rendering one line.
pub(super) struct Bindings<'a> {
    pub app: &'a str,
    /// Sanitized id of the block being rendered; absent for shared text.
    pub block: Option<&'a str>,
    pub properties: Option<&'a ResolvedProperties>,
}

impl<'a> Bindings<'a> {
    /// Bindings for declarations and teardowns, which only see the app id.
    pub fn shared(app: &'a str) -> Self {
        Self {
            app,
            block: None,
            properties: None,
        }
    }
}

/// Substitutes every placeholder of a template line.
pub(super) fn render(line: &str, bindings: &Bindings, kind: &str) -> Result<String, EmitError> {
    let template_error = |message: String| EmitError::TemplateError {
        kind: kind.to_string(),
        message,
    };
    let mut out = String::with_capacity(line.len());
    for segment in parse_line(line).map_err(template_error)? {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Placeholder("app") => out.push_str(bindings.app),
            Segment::Placeholder("block") => match bindings.block {
                Some(block) => out.push_str(block),
                None => {
                    return Err(template_error(
                        "`${block}` is only available in block statements".to_string(),
                    ));
                }
            },
            Segment::Placeholder(name) => {
                let value = bindings
                    .properties
                    .and_then(|properties| properties.get(name))
                    .ok_or_else(|| template_error(format!("no value for placeholder '{}'", name)))?;
                out.push_str(&render_value(value));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_quotes_backslashes_and_newlines() {
        assert_eq!(
            c_string_literal("say \"hi\"\\\nbye"),
            r#""say \"hi\"\\\nbye""#
        );
    }

    #[test]
    fn injection_attempt_stays_inside_the_literal() {
        let rendered = c_string_literal("\"); system(\"rm -rf /\"); //");
        assert_eq!(rendered, r#""\"); system(\"rm -rf /\"); //""#);
        let inner = &rendered[1..rendered.len() - 1];
        assert!(!inner.replace("\\\"", "").contains('"'));
    }

    #[test]
    fn non_ascii_and_control_bytes_become_octal() {
        assert_eq!(c_string_literal("é"), r#""\303\251""#);
        assert_eq!(c_string_literal("a\u{7}b"), r#""a\007b""#);
        assert_eq!(c_string_literal("what??!"), r#""what?\?!""#);
    }

    #[test]
    fn recognizes_c_identifiers() {
        assert!(is_c_identifier("app_main"));
        assert!(is_c_identifier("_x9"));
        assert!(!is_c_identifier(""));
        assert!(!is_c_identifier("9lives"));
        assert!(!is_c_identifier("x */ int evil; /*"));
    }

    #[test]
    fn block_ids_become_identifiers() {
        assert_eq!(sanitize_identifier("read-file 1"), "read_file_1");
        assert_eq!(sanitize_identifier("9lives"), "block_9lives");
        assert_eq!(sanitize_identifier(""), "block_");
    }

    #[test]
    fn renders_typed_placeholders() {
        let mut properties = ResolvedProperties::new();
        properties.insert("ms".to_string(), PropertyValue::Int(250));
        properties.insert("text".to_string(), PropertyValue::Str("a\"b".to_string()));
        let bindings = Bindings {
            app: "demo",
            block: Some("wait_1"),
            properties: Some(&properties),
        };
        assert_eq!(
            render("${app}_${block}(${ms}, ${text});", &bindings, "k").unwrap(),
            r#"demo_wait_1(250, "a\"b");"#
        );
        assert!(matches!(
            render("${missing}", &bindings, "k"),
            Err(EmitError::TemplateError { .. })
        ));
        assert!(render("${block}", &Bindings::shared("demo"), "k").is_err());
    }
}
