//! Text in, text out
//!
//! [`Downgrader`] strings the stages together for one file: the textual
//! namespace conversion, parsing, the pass pipeline and printing. A file
//! that does not parse comes back as [`Outcome::ParseFailed`] and must be
//! left untouched by the caller.

use tracing::{debug, warn};

use crate::config::DownlevelConfig;
use crate::cst::{ParseError, SyntaxNode, parse, trivia};
use crate::diagnostics::Diagnostic;
use crate::pretransform::block_namespace;
use crate::result::Result;
use crate::rewrite::Pipeline;

/// What happened to one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Printed output equals the input
    Unchanged { diagnostics: Vec<Diagnostic> },
    /// The file needs to be written with `text`
    Rewritten {
        text: String,
        diagnostics: Vec<Diagnostic>,
    },
    /// The input is not valid in the supported grammar
    ParseFailed { errors: Vec<ParseError> },
}

impl Outcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, Outcome::Rewritten { .. })
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Outcome::Unchanged { diagnostics } | Outcome::Rewritten { diagnostics, .. } => {
                diagnostics
            }
            Outcome::ParseFailed { .. } => &[],
        }
    }
}

/// Downgrades one file at a time; shareable across threads
#[derive(Debug, Clone)]
pub struct Downgrader {
    pipeline: Pipeline,
    file_scoped_namespaces: bool,
}

impl Default for Downgrader {
    fn default() -> Self {
        Self::new(Pipeline::default())
    }
}

impl Downgrader {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            file_scoped_namespaces: true,
        }
    }

    pub fn from_config(config: &DownlevelConfig) -> Self {
        Self::new(Pipeline::from_config(config))
            .with_file_scoped_namespaces(config.file_scoped_namespaces())
    }

    /// Toggle the `namespace N;` conversion done before parsing
    pub fn with_file_scoped_namespaces(mut self, enabled: bool) -> Self {
        self.file_scoped_namespaces = enabled;
        self
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Downgrade `text`
    ///
    /// Errors only when a pass meets a construct it has no rule for.
    pub fn downgrade(&self, text: &str) -> Result<Outcome> {
        let source = if self.file_scoped_namespaces {
            block_namespace(text)
        } else {
            text.into()
        };

        let parse = parse(&source);
        if !parse.ok() {
            let errors = parse.errors().to_vec();
            warn!(errors = errors.len(), "Parse failed, leaving file untouched");
            return Ok(Outcome::ParseFailed { errors });
        }

        let root = parse.into_green();
        let eol = trivia::detect_eol(&SyntaxNode::new_root(root.clone()));
        let output = self.pipeline.run(&root, eol)?;
        let printed = SyntaxNode::new_root(output.root).to_string();
        debug!(passes = ?output.changed_passes, "Pipeline finished");

        if printed == text {
            Ok(Outcome::Unchanged {
                diagnostics: output.diagnostics,
            })
        } else {
            Ok(Outcome::Rewritten {
                text: printed,
                diagnostics: output.diagnostics,
            })
        }
    }
}
