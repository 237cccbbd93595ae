//! Code generation
//!
//! `make` walks the tree top-down and concatenates each block's G-code.
//! Generators only read the program; soft failures are collected as notes and
//! written to block statuses once the walk is over.

use gcamkit_camtools::GcodeWriter;
use gcamkit_core::{ProgramConfig, ProgressCallback};
use tracing::{debug, warn};

use crate::block::{Operation, Payload, Tool};
use crate::error::{BlockError, Result};
use crate::program::{BlockId, Program};

/// Status set on blocks that need a tool and have none before them.
pub const NO_TOOL: &str = "No tool";

/// State of one generation pass.
pub(crate) struct Generation<'p> {
    program: &'p Program,
    notes: Vec<(BlockId, String)>,
}

impl<'p> Generation<'p> {
    pub(crate) fn new(program: &'p Program) -> Self {
        Self {
            program,
            notes: Vec::new(),
        }
    }

    pub(crate) fn program(&self) -> &'p Program {
        self.program
    }

    pub(crate) fn config(&self) -> &'p ProgramConfig {
        &self.program.config
    }

    pub(crate) fn writer(&self) -> GcodeWriter {
        GcodeWriter::new(self.program.config.decimals)
    }

    pub(crate) fn note(&mut self, id: BlockId, message: impl Into<String>) {
        self.notes.push((id, message.into()));
    }

    /// The tool in effect for `id`, noting the block when there is none.
    pub(crate) fn require_tool(&mut self, id: BlockId) -> Option<&'p Tool> {
        let tool = self.program.find_enclosing_tool(id);
        if tool.is_none() {
            warn!("block {:?} has no tool before it, skipping", id);
            self.note(id, NO_TOOL);
        }
        tool
    }

    /// G-code of one block and its subtree.
    pub(crate) fn block(&mut self, id: BlockId) -> String {
        let program = self.program;
        let Some(block) = program.get(id) else {
            return String::new();
        };
        if block.is_suppressed() || !block.kind().supports(Operation::Make) {
            return String::new();
        }
        debug!("making {} '{}'", block.kind(), block.comment());

        let config = self.config();
        let comment = block.comment();
        match &block.payload {
            Payload::Begin(begin) => begin.make(config),
            Payload::End(end) => end.make(config),
            Payload::Code(code) => code.make(),
            Payload::Tool(tool) => tool.make(config),
            Payload::Template(template) => template.make(self, id, comment),
            Payload::Sketch(sketch) => sketch.make(self, id, comment),
            Payload::DrillHoles(holes) => holes.make(self, id, comment),
            Payload::BoltHoles(holes) => holes.make(self, id, comment),
            Payload::Image(image) => image.make(self, id, comment),
            Payload::Stl(stl) => stl.make(self, id, comment),
            Payload::Extrusion(_) | Payload::Line(_) | Payload::Arc(_) | Payload::Point(_) => {
                String::new()
            }
        }
    }

    fn finish(self) -> Vec<(BlockId, String)> {
        self.notes
    }
}

impl Program {
    /// Generate the whole program.
    pub fn make(&mut self) -> String {
        self.make_with_progress(&mut |_| true).unwrap_or_default()
    }

    /// Generate the whole program, reporting progress between top-level
    /// blocks. Returns `None` when the callback asks to stop.
    pub fn make_with_progress(&mut self, progress: ProgressCallback<'_>) -> Option<String> {
        let roots = self.roots().to_vec();
        let total = roots.len().max(1) as f64;
        let mut out = String::new();
        let mut cancelled = false;

        let notes = {
            let mut generation = Generation::new(self);
            for (i, root) in roots.iter().enumerate() {
                out.push_str(&generation.block(*root));
                if !progress((i + 1) as f64 / total) {
                    debug!("generation cancelled after {} of {} blocks", i + 1, roots.len());
                    cancelled = true;
                    break;
                }
            }
            generation.finish()
        };
        let scope = self.ids();
        self.apply_notes(scope, notes);

        if cancelled {
            None
        } else {
            Some(out)
        }
    }

    /// Generate one block and its subtree.
    pub fn make_block(&mut self, id: BlockId) -> Result<String> {
        let kind = self.block(id)?.kind();
        if !kind.supports(Operation::Make) {
            return Err(BlockError::Unsupported {
                kind,
                operation: Operation::Make,
            });
        }
        let (code, notes) = {
            let mut generation = Generation::new(self);
            let code = generation.block(id);
            (code, generation.finish())
        };
        let scope = self.descendants(id);
        self.apply_notes(scope, notes);
        Ok(code)
    }

    /// Clear the statuses of `scope`, then record the new notes.
    fn apply_notes(&mut self, scope: Vec<BlockId>, notes: Vec<(BlockId, String)>) {
        for id in scope {
            if let Some(block) = self.get_mut(id) {
                block.set_status("");
            }
        }
        for (id, note) in notes {
            if let Some(block) = self.get_mut(id) {
                block.set_status(note);
            }
        }
    }
}
