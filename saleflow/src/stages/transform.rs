//! A stage computed from its inputs without external calls.

use super::{StageExecutor, StageKind};
use crate::context::{format_docs, ContextValue, ContextView};
use crate::errors::StageError;
use async_trait::async_trait;
use std::fmt::{self, Debug};
use std::sync::Arc;

type TransformFn = dyn Fn(&ContextView<'_>) -> Result<ContextValue, StageError> + Send + Sync;

/// A function-based stage.
#[derive(Clone)]
pub struct TransformStage {
    name: String,
    reads: Vec<String>,
    func: Arc<TransformFn>,
}

impl TransformStage {
    /// Creates a transform reading `reads` and applying `func`.
    pub fn new<F>(name: impl Into<String>, reads: &[&str], func: F) -> Self
    where
        F: Fn(&ContextView<'_>) -> Result<ContextValue, StageError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            reads: reads.iter().map(ToString::to_string).collect(),
            func: Arc::new(func),
        }
    }

    /// Joins the documents under `key` into one numbered text block.
    #[must_use]
    pub fn format_documents(key: &str) -> Self {
        let owned = key.to_string();
        Self::new("format_docs", &[key], move |view| {
            Ok(ContextValue::Text(format_docs(view.documents(&owned)?)))
        })
    }
}

impl Debug for TransformStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformStage")
            .field("name", &self.name)
            .field("reads", &self.reads)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl StageExecutor for TransformStage {
    fn kind(&self) -> StageKind {
        StageKind::Transform
    }

    fn reads(&self) -> Vec<String> {
        self.reads.clone()
    }

    async fn run(&self, view: &ContextView<'_>) -> Result<ContextValue, StageError> {
        (self.func)(view)
    }
}
