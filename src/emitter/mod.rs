//! Renders a statement tree into a single C translation unit.
//!
//! Each block statement instantiates its kind's template. Global declarations
//! requested by templates are hoisted and deduplicated, and every resource
//! acquired on a path is released, most recent first, before that path
//! returns. Emission is deterministic: the same tree, graph and manifest always
//! produce the same bytes.

mod hoist;
mod render;
mod resources;

pub use hoist::Declaration;
pub use render::{c_string_literal, is_c_identifier, render_value, sanitize_identifier};

use crate::error::EmitError;
use crate::graph::BlockIdx;
use crate::linearizer::{Branch, Sequence, SequenceEnd, Statement, StatementTree};
use crate::project::Manifest;
use crate::registry::{BlockRegistry, BlockRole, BlockTypeDefinition, DeclarationSection};
use crate::validator::ValidatedGraph;
use hoist::DeclarationTable;
use render::{Bindings, render};
use resources::{PendingRelease, ReleaseStack};

const INDENT: &str = "    ";

/// The generated source and the declarations hoisted into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedProgram {
    pub source: String,
    pub declarations: Vec<Declaration>,
}

/// Accumulates indented lines of the entry function body.
#[derive(Debug, Default)]
struct CodeWriter {
    out: String,
    depth: usize,
}

impl CodeWriter {
    /// Writes `text` at the current depth; embedded newlines keep their
    /// relative indentation.
    fn line(&mut self, text: &str) {
        for line in text.lines() {
            if !line.is_empty() {
                for _ in 0..self.depth {
                    self.out.push_str(INDENT);
                }
                self.out.push_str(line);
            }
            self.out.push('\n');
        }
    }

    fn indent(&mut self) {
        self.depth += 1;
    }

    fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

struct Emitter<'a> {
    graph: &'a ValidatedGraph,
    registry: &'a BlockRegistry,
    app: &'a str,
    declarations: DeclarationTable,
    body: CodeWriter,
}

/// Emits the C source of a linearized program.
pub fn emit(
    tree: &StatementTree,
    graph: &ValidatedGraph,
    registry: &BlockRegistry,
    manifest: &Manifest,
) -> Result<EmittedProgram, EmitError> {
    // Both names are spliced into identifiers and the header comment verbatim.
    for (field, value) in [("appid", &manifest.appid), ("entry_point", &manifest.entry_point)] {
        if !is_c_identifier(value) {
            return Err(EmitError::InvalidIdentifier {
                field: field.to_string(),
                value: value.clone(),
            });
        }
    }

    let mut emitter = Emitter {
        graph,
        registry,
        app: &manifest.appid,
        declarations: DeclarationTable::default(),
        body: CodeWriter {
            out: String::new(),
            depth: 1,
        },
    };
    let mut stack = ReleaseStack::default();
    emitter.sequence(&tree.root, &mut stack, 0)?;

    let source = assemble(manifest, &emitter.declarations, &emitter.body.out);
    tracing::debug!(
        bytes = source.len(),
        lines = source.lines().count(),
        "program emitted"
    );
    Ok(EmittedProgram {
        source,
        declarations: emitter.declarations.into_vec(),
    })
}

impl<'a> Emitter<'a> {
    fn kind(&self, idx: BlockIdx) -> Result<&'a BlockTypeDefinition, EmitError> {
        Ok(self.registry.lookup(self.graph.kind(idx))?)
    }

    /// `region_base` is the release stack depth at the branch whose join ends
    /// this sequence; reaching the join releases everything above it.
    fn sequence(
        &mut self,
        sequence: &Sequence,
        stack: &mut ReleaseStack,
        region_base: usize,
    ) -> Result<(), EmitError> {
        for statement in &sequence.statements {
            match statement {
                Statement::Block(idx) => self.block(*idx, stack)?,
                Statement::Branch(branch) => self.branch(branch, stack, region_base)?,
            }
        }
        match sequence.end {
            SequenceEnd::Exit | SequenceEnd::Split => {}
            SequenceEnd::Join => self.release(stack, region_base),
            SequenceEnd::Open => {
                self.release(stack, 0);
                self.body.line("return 0;");
            }
        }
        Ok(())
    }

    fn release(&mut self, stack: &mut ReleaseStack, base: usize) {
        for line in stack.release_down_to(base) {
            self.body.line(&line);
        }
    }

    /// Hoists the block's declarations and writes its statements.
    fn instantiate(&mut self, idx: BlockIdx, kind: &BlockTypeDefinition) -> Result<(), EmitError> {
        let graph = self.graph;
        let block_id = &graph.graph().block(idx).id;
        let shared = Bindings::shared(self.app);
        for declaration in &kind.template.declarations {
            let text = render(&declaration.text, &shared, &kind.id)?;
            self.declarations.request(
                Declaration {
                    key: declaration.key.clone(),
                    section: declaration.section,
                    text,
                },
                block_id,
            )?;
        }

        let ident = sanitize_identifier(block_id);
        let bindings = Bindings {
            app: self.app,
            block: Some(&ident),
            properties: Some(graph.properties(idx)),
        };
        self.body.line(&format!("// {} {}", kind.id, ident));
        for statement in &kind.template.statements {
            let line = render(statement, &bindings, &kind.id)?;
            self.body.line(&line);
        }
        Ok(())
    }

    fn acquire(
        &self,
        idx: BlockIdx,
        kind: &BlockTypeDefinition,
        stack: &mut ReleaseStack,
    ) -> Result<(), EmitError> {
        let Some(resource) = &kind.resource else {
            return Ok(());
        };
        let shared = Bindings::shared(self.app);
        let teardown = resource
            .teardown
            .iter()
            .map(|line| render(line, &shared, &kind.id))
            .collect::<Result<Vec<_>, _>>()?;
        stack.acquire(PendingRelease {
            key: resource.key.clone(),
            block_id: self.graph.graph().block(idx).id.clone(),
            teardown,
        })
    }

    fn block(&mut self, idx: BlockIdx, stack: &mut ReleaseStack) -> Result<(), EmitError> {
        let kind = self.kind(idx)?;
        if self.graph.role(idx) == BlockRole::Exit {
            self.release(stack, 0);
        }
        self.instantiate(idx, kind)?;
        self.acquire(idx, kind, stack)
    }

    fn branch(
        &mut self,
        branch: &Branch,
        stack: &mut ReleaseStack,
        region_base: usize,
    ) -> Result<(), EmitError> {
        let kind = self.kind(branch.block)?;
        self.instantiate(branch.block, kind)?;
        self.acquire(branch.block, kind, stack)?;

        // Arms that reconverge release their own acquisitions before the join;
        // arms of a branch without a join fall through to the enclosing one.
        let base = if branch.join.is_some() {
            stack.len()
        } else {
            region_base
        };
        let graph = self.graph;
        let ident = sanitize_identifier(&graph.graph().block(branch.block).id);
        let bindings = Bindings {
            app: self.app,
            block: Some(&ident),
            properties: Some(graph.properties(branch.block)),
        };

        let last = branch.arms.len().saturating_sub(1);
        for (position, arm) in branch.arms.iter().enumerate() {
            let header = if position == last {
                "} else {".to_string()
            } else {
                let guard = kind.template.guard_for(&arm.output).ok_or_else(|| {
                    EmitError::TemplateError {
                        kind: kind.id.clone(),
                        message: format!("output '{}' has no guard", arm.output),
                    }
                })?;
                let condition = render(guard, &bindings, &kind.id)?;
                if position == 0 {
                    format!("if({}) {{", condition)
                } else {
                    format!("}} else if({}) {{", condition)
                }
            };
            self.body.line(&header);
            self.body.indent();
            let mut arm_stack = stack.clone();
            self.sequence(&arm.body, &mut arm_stack, base)?;
            self.body.dedent();
        }
        self.body.line("}");
        Ok(())
    }
}

/// Strips characters that could end or escape a C comment.
fn comment_safe(text: &str) -> String {
    text.replace("*/", "* /")
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

fn assemble(manifest: &Manifest, declarations: &DeclarationTable, body: &str) -> String {
    let mut out = String::new();
    out.push_str("/*\n");
    out.push_str(&format!(
        " * {} ({} v{})\n",
        comment_safe(&manifest.name),
        manifest.appid,
        comment_safe(&manifest.version)
    ));
    out.push_str(" * Generated by flipscript. Do not edit by hand.\n");
    out.push_str(" */\n\n");

    for include in declarations.section(DeclarationSection::Include) {
        out.push_str(&include.text);
        out.push('\n');
    }
    out.push('\n');

    out.push_str("typedef struct {\n");
    let mut fields = declarations.section(DeclarationSection::Field).peekable();
    if fields.peek().is_none() {
        out.push_str(INDENT);
        out.push_str("uint8_t reserved;\n");
    }
    for field in fields {
        out.push_str(INDENT);
        out.push_str(&field.text);
        out.push('\n');
    }
    out.push_str(&format!("}} {}_state_t;\n\n", manifest.appid));

    for function in declarations.section(DeclarationSection::Function) {
        out.push_str(&function.text);
        out.push_str("\n\n");
    }

    out.push_str(&format!("int32_t {}(void* p) {{\n", manifest.entry_point));
    out.push_str(body);
    out.push_str("}\n");
    out
}
