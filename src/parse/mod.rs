//! The parse engine: trial-match classification driving a block-structure
//! builder.
//!
//! Parsing is a single top-down pass over the item stream. Each open block
//! pulls items, classifies them against its own candidate kind list, and
//! recurses when a begin-kind matches. Termination is by the block's end
//! statement, by a shared numeric do-label, or (fixed-form legacy only) by
//! the unwrapped-main-program fallback at end of input. Failures are local:
//! unclassifiable lines become opaque leaf nodes and the parse continues.

pub mod block;
pub mod catalog;
pub mod decl;
pub mod exec;
pub mod patterns;
pub mod stmt;
pub mod typedecl;

use crate::config::Config;
use crate::diag::{DiagKind, Diagnostics};
use crate::error::{FatalError, Result};
use crate::parse::block::{BlockKind, BlockNode, Header};
use crate::parse::catalog::{candidates_for, classify, Classified, Ctx};
use crate::parse::stmt::{Stmt, StmtNode};
use crate::parse::typedecl::TypeDeclStmt;
use crate::source::{Dialect, FortranReader, Item, ItemSource, Span};

/// Result of a parse: the file-level tree plus accumulated diagnostics.
#[derive(Debug)]
pub struct Parsed {
    pub root: BlockNode,
    pub diagnostics: Diagnostics,
}

/// Parse source text in the given dialect.
pub fn parse_source(text: &str, dialect: Dialect, cfg: &Config) -> Result<Parsed> {
    let mut reader = FortranReader::from_source(text, dialect);
    parse_items(&mut reader, cfg)
}

/// Parse from any item source.
pub fn parse_items(source: &mut (dyn ItemSource + '_), cfg: &Config) -> Result<Parsed> {
    let mut parser = Parser {
        cfg,
        diags: Diagnostics::new(),
        depth: 0,
    };
    let mut root = BlockNode::new(BlockKind::Unit, "", Header::Unit, Span::line(1));
    parser.fill(source, &mut root)?;
    Ok(Parsed {
        root,
        diagnostics: parser.diags,
    })
}

/// How a block's fill loop ended.
enum FillOutcome {
    /// The block's end statement was consumed.
    Closed,
    /// A labelled statement terminated this do-loop; enclosing loops
    /// expecting the same label close off the same item.
    ClosedByLabel(u32),
    /// End of input.
    Eof,
}

struct Parser<'c> {
    cfg: &'c Config,
    diags: Diagnostics,
    depth: usize,
}

impl Parser<'_> {
    fn fill(
        &mut self,
        source: &mut (dyn ItemSource + '_),
        block: &mut BlockNode,
    ) -> Result<FillOutcome> {
        let end_re = block.kind.end_re();
        let do_endlabel = match &block.header {
            Header::Do { endlabel, .. } => *endlabel,
            _ => None,
        };

        loop {
            let Some(item) = source.next_item()? else {
                if block.kind == BlockKind::Unit {
                    self.finish_unit(source.dialect(), block);
                } else {
                    self.diags.warn(
                        DiagKind::StructuralMismatch,
                        block.span,
                        format!(
                            "{} block starting at line {} is not terminated at end of input",
                            block.kind, block.span.start
                        ),
                    );
                }
                return Ok(FillOutcome::Eof);
            };

            // A statement carrying this do-loop's end label is the loop's
            // final child and terminates it.
            if let Some(el) = do_endlabel {
                if item.label == Some(el) {
                    self.append_classified(source, block, &item);
                    block.span.end = item.span.end;
                    return Ok(FillOutcome::ClosedByLabel(el));
                }
            }

            if let Some(re) = end_re {
                if re.is_match(&item.text) {
                    let end = block::parse_end(block.kind, &item);
                    if let Some(name) = &end.name {
                        if *name != block.name {
                            self.diags.warn(
                                DiagKind::StructuralMismatch,
                                item.span,
                                format!(
                                    "expected end name `{}` for {} but got `{name}`",
                                    block.name, block.kind
                                ),
                            );
                        }
                    }
                    block.span.end = item.span.end;
                    block.end = Some(end);
                    return Ok(FillOutcome::Closed);
                }
            }

            // A CASE arm closes on the next CASE or on END SELECT, which
            // stay with the enclosing select's fill loop.
            if block.kind == BlockKind::Case
                && (patterns::CASE_RE.is_match(&item.text)
                    || patterns::END_SELECT_RE.is_match(&item.text))
            {
                source.push_back(item);
                return Ok(FillOutcome::Closed);
            }

            // Fixed-form legacy: a bare END at file level closes an
            // un-headered main program.
            if block.kind == BlockKind::Unit
                && item.text == "end"
                && source.dialect() == Dialect::Fixed77
            {
                self.diags.warn(
                    DiagKind::StructuralMismatch,
                    item.span,
                    "assuming the end of an unwrapped main program",
                );
                wrap_loose_main(block, item.span);
                continue;
            }

            match self.classify_in(source, block, &item) {
                Classified::Stmt(node) => {
                    block.span.end = node.span.end;
                    block.children.push(node);
                }
                Classified::Begin(mut child) => {
                    self.depth += 1;
                    if self.depth > self.cfg.max_nesting_depth {
                        return Err(FatalError::NestingTooDeep {
                            line: item.span.start,
                            max: self.cfg.max_nesting_depth,
                        }
                        .into());
                    }
                    absorb_pending_header_parts(block, &mut child);
                    let outcome = self.fill(source, &mut child)?;
                    self.depth -= 1;
                    let child_span = child.span;
                    block.span.end = child_span.end;
                    block
                        .children
                        .push(StmtNode::new(child_span, item.label, Stmt::Block(child)));
                    match outcome {
                        FillOutcome::Eof => {
                            if block.kind == BlockKind::Unit {
                                self.finish_unit(source.dialect(), block);
                            } else {
                                self.diags.warn(
                                    DiagKind::StructuralMismatch,
                                    block.span,
                                    format!(
                                        "{} block starting at line {} is not terminated at end of input",
                                        block.kind, block.span.start
                                    ),
                                );
                            }
                            return Ok(FillOutcome::Eof);
                        }
                        FillOutcome::ClosedByLabel(n) if do_endlabel == Some(n) => {
                            block.span.end = child_span.end;
                            return Ok(FillOutcome::ClosedByLabel(n));
                        }
                        _ => {}
                    }
                }
                Classified::Requeued => {}
                Classified::NoMatch => {
                    self.diags.error(
                        DiagKind::SyntaxMismatch,
                        item.span,
                        format!("no statement kind matched `{}`", item.apply_map(&item.text)),
                    );
                    block.children.push(StmtNode::new(
                        item.span,
                        item.label,
                        Stmt::Unparsed {
                            text: item.apply_map(&item.text),
                        },
                    ));
                }
            }
        }
    }

    fn classify_in(
        &mut self,
        source: &mut (dyn ItemSource + '_),
        block: &BlockNode,
        item: &Item,
    ) -> Classified {
        let mut ctx = Ctx {
            source,
            diags: &mut self.diags,
            block_kind: block.kind,
            block_name: &block.name,
        };
        classify(item, candidates_for(block.kind), &mut ctx)
    }

    /// Classify a do-label terminator into its loop; anything that does not
    /// come out as a plain statement is kept as opaque text.
    fn append_classified(
        &mut self,
        source: &mut (dyn ItemSource + '_),
        block: &mut BlockNode,
        item: &Item,
    ) {
        match self.classify_in(source, block, item) {
            Classified::Stmt(node) => block.children.push(node),
            _ => {
                self.diags.error(
                    DiagKind::SyntaxMismatch,
                    item.span,
                    format!(
                        "labelled loop terminator did not parse: `{}`",
                        item.apply_map(&item.text)
                    ),
                );
                block.children.push(StmtNode::new(
                    item.span,
                    item.label,
                    Stmt::Unparsed {
                        text: item.apply_map(&item.text),
                    },
                ));
            }
        }
    }

    /// End-of-input handling at the file level: in fixed-form 77, loose
    /// statements left at the top level belong to an unwrapped main
    /// program.
    fn finish_unit(&mut self, dialect: Dialect, block: &mut BlockNode) {
        if dialect != Dialect::Fixed77 {
            return;
        }
        let has_loose = block.children.iter().any(|c| !is_program_unit_child(c));
        if has_loose {
            self.diags.warn(
                DiagKind::StructuralMismatch,
                Span::line(block.span.end),
                "assuming an unwrapped main program at end of input",
            );
            wrap_loose_main(block, Span::line(block.span.end));
        }
    }
}

fn is_program_unit_child(node: &StmtNode) -> bool {
    matches!(&node.stmt, Stmt::Block(b) if b.kind.is_program_unit())
}

/// Wrap the trailing run of loose (non-program-unit) children of the file
/// block into a synthetic `Program` node.
fn wrap_loose_main(unit: &mut BlockNode, end_span: Span) {
    let split = unit
        .children
        .iter()
        .rposition(is_program_unit_child)
        .map_or(0, |i| i + 1);
    if split >= unit.children.len() {
        return;
    }
    let loose: Vec<StmtNode> = unit.children.drain(split..).collect();
    let start = loose.first().map_or(end_span.start, |n| n.span.start);
    let mut program = BlockNode::new(
        BlockKind::Program,
        "",
        Header::Program,
        Span::new(start, end_span.end),
    );
    program.children = loose;
    program.end = Some(block::EndInfo {
        name: None,
        span: end_span,
    });
    unit.children
        .push(StmtNode::new(program.span, None, Stmt::Block(program)));
}

/// Merge a pending subprogram-prefix statement and a pending single-entity
/// return-type declaration into the header of a freshly opened subprogram
/// block.
fn absorb_pending_header_parts(parent: &mut BlockNode, child: &mut BlockNode) {
    let Header::Subprogram(h) = &mut child.header else {
        return;
    };
    // Return type first (it is queued after the prefix split).
    if let Some(last) = parent.children.last() {
        if let Stmt::TypeDecl(TypeDeclStmt { spec, attrs, entities }) = &last.stmt {
            if attrs.is_empty() && entities.len() == 1 && entities[0] == child.name {
                h.return_type = Some(spec.clone());
                parent.children.pop();
            }
        }
    }
    if let Some(last) = parent.children.last() {
        if let Stmt::SubprogramPrefix { prefix } = &last.stmt {
            h.prefix = if h.prefix.is_empty() {
                prefix.clone()
            } else {
                format!("{prefix} {}", h.prefix)
            };
            parent.children.pop();
        }
    }
}

/// Render the canonical text of a parsed tree, two spaces per nesting
/// level. The file container itself is not rendered.
#[must_use]
pub fn render_tree(root: &BlockNode) -> String {
    let mut out = String::new();
    for child in &root.children {
        render_node(child, 0, &mut out);
    }
    out
}

fn render_node(node: &StmtNode, indent: usize, out: &mut String) {
    let pad = "  ".repeat(indent);
    match &node.stmt {
        Stmt::Block(b) => {
            out.push_str(&pad);
            out.push_str(&b.render_header());
            out.push('\n');
            for child in &b.children {
                render_node(child, indent + 1, out);
            }
            if b.kind != BlockKind::Case {
                out.push_str(&pad);
                out.push_str(&format!("END {}", b.kind));
                if !b.name.is_empty() {
                    out.push(' ');
                    out.push_str(&b.name);
                }
                out.push('\n');
            }
        }
        stmt => {
            out.push_str(&pad);
            if let Some(label) = node.label {
                out.push_str(&format!("{label} "));
            }
            out.push_str(&stmt.render());
            out.push('\n');
        }
    }
}
