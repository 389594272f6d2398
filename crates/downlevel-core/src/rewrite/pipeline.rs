//! Ordered composition of lowering passes
//!
//! The pipeline order is fixed and doubles as the precedence rule between
//! lowerings that match the same declaration: property initializers are
//! stripped before init accessors become setters, records are lowered
//! before nullable annotations inside their generated members are erased,
//! and so on. A pipeline built from a subset of passes keeps that order.

use rowan::GreenNode;
use tracing::debug;

use crate::config::DownlevelConfig;
use crate::cst::tree::same_node;
use crate::diagnostics::Diagnostic;
use crate::result::Result;
use crate::rewrite::passes::{
    ExpressionBodies, GlobalUsings, InitAccessors, Nullable, PatternBindings,
    PropertyInitializers, Records,
};
use crate::rewrite::{Pass, RewriteOptions, run_pass};

/// Every lowering the engine knows, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PassKind {
    ExpressionBodies,
    PropertyInitializers,
    InitAccessors,
    Records,
    PatternBindings,
    Nullable,
    GlobalUsings,
}

impl PassKind {
    pub const ALL: [PassKind; 7] = [
        PassKind::ExpressionBodies,
        PassKind::PropertyInitializers,
        PassKind::InitAccessors,
        PassKind::Records,
        PassKind::PatternBindings,
        PassKind::Nullable,
        PassKind::GlobalUsings,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PassKind::ExpressionBodies => "expression-bodies",
            PassKind::PropertyInitializers => "property-initializers",
            PassKind::InitAccessors => "init-accessors",
            PassKind::Records => "records",
            PassKind::PatternBindings => "pattern-bindings",
            PassKind::Nullable => "nullable",
            PassKind::GlobalUsings => "global-usings",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// A fresh pass; pass state never outlives one file
    fn instantiate(self) -> Box<dyn Pass> {
        match self {
            PassKind::ExpressionBodies => Box::new(ExpressionBodies::new()),
            PassKind::PropertyInitializers => Box::new(PropertyInitializers::new()),
            PassKind::InitAccessors => Box::new(InitAccessors::new()),
            PassKind::Records => Box::new(Records::new()),
            PassKind::PatternBindings => Box::new(PatternBindings::new()),
            PassKind::Nullable => Box::new(Nullable::new()),
            PassKind::GlobalUsings => Box::new(GlobalUsings::new()),
        }
    }
}

/// Result of running the whole pipeline over one tree
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub root: GreenNode,
    pub diagnostics: Vec<Diagnostic>,
    /// Names of the passes that produced a new tree, in order
    pub changed_passes: Vec<&'static str>,
}

impl TransformOutput {
    pub fn changed(&self) -> bool {
        !self.changed_passes.is_empty()
    }
}

/// Sequential pass pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    passes: Vec<PassKind>,
    options: RewriteOptions,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PassKind::ALL.to_vec(), RewriteOptions::default())
    }
}

impl Pipeline {
    /// Pipeline over `passes`, reordered into pipeline order and deduplicated
    pub fn new(mut passes: Vec<PassKind>, options: RewriteOptions) -> Self {
        passes.sort();
        passes.dedup();
        Self { passes, options }
    }

    pub fn from_config(config: &DownlevelConfig) -> Self {
        let passes = PassKind::ALL
            .into_iter()
            .filter(|kind| config.pass_enabled(*kind))
            .collect();
        Self::new(passes, config.rewrite_options())
    }

    pub fn passes(&self) -> &[PassKind] {
        &self.passes
    }

    pub fn options(&self) -> &RewriteOptions {
        &self.options
    }

    /// Run every pass over `root`, each on the tree the previous one produced
    ///
    /// Fails only when a pass meets a construct it cannot lower; the whole
    /// file is abandoned then.
    pub fn run(&self, root: &GreenNode, eol: &'static str) -> Result<TransformOutput> {
        let mut current = root.clone();
        let mut diagnostics = Vec::new();
        let mut changed_passes = Vec::new();

        for kind in &self.passes {
            let mut pass = kind.instantiate();
            let (next, found) = run_pass(pass.as_mut(), &current, eol, &self.options)?;
            let changed = !same_node(&next, &current);
            debug!(
                pass = kind.name(),
                changed,
                diagnostics = found.len(),
                "Pass finished"
            );
            if changed {
                changed_passes.push(kind.name());
            }
            diagnostics.extend(found);
            current = next;
        }

        Ok(TransformOutput {
            root: current,
            diagnostics,
            changed_passes,
        })
    }
}
