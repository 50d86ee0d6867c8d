//! Stage executors.
//!
//! An executor wraps exactly one unit of work (a completion call, a search
//! call or a pure transform) behind [`StageExecutor`]. It sees only the
//! context keys it declared and never writes to the context itself; the
//! runner stores its return value.

mod completion;
mod search;
mod selection;
mod template;
mod transform;

pub use crate::context::format_docs;
pub use completion::CompletionStage;
pub use search::SearchStage;
pub use selection::SelectionStage;
pub use template::PromptTemplate;
pub use transform::TransformStage;

use crate::context::{ContextValue, ContextView};
use crate::errors::StageError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

/// What kind of work a stage performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// One text-completion call.
    Completion,
    /// One search call.
    Search,
    /// A pure function of the inputs.
    Transform,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Completion => "completion",
            Self::Search => "search",
            Self::Transform => "transform",
        };
        f.write_str(name)
    }
}

/// The executable part of a stage.
#[async_trait]
pub trait StageExecutor: Send + Sync + Debug {
    /// Returns the kind of work this executor does.
    fn kind(&self) -> StageKind;

    /// Returns every context key the executor reads.
    ///
    /// The pipeline builder rejects a stage whose executor reads a key
    /// that is not among the stage's declared inputs.
    fn reads(&self) -> Vec<String>;

    /// Runs the executor against its projection of the context.
    async fn run(&self, view: &ContextView<'_>) -> Result<ContextValue, StageError>;
}
