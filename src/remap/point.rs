//! Pinned concern points.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::PointContext;

/// A user pin bound to one AST node by its recorded context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcernPoint {
    /// Stable identity of the pin
    pub id: Uuid,
    /// User-facing label
    pub name: String,
    /// File the point was pinned in
    pub file_name: String,
    /// Context recorded at pin time (or at the last accepted relocation)
    pub context: PointContext,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl ConcernPoint {
    /// New pin for a context
    pub fn new(name: impl Into<String>, context: PointContext) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            file_name: context.file.name.clone(),
            context,
            created_at: Utc::now(),
        }
    }

    /// Syntactic type of the pinned node
    pub fn kind(&self) -> &str {
        &self.context.kind
    }

    /// Replace the recorded context after an accepted relocation
    pub fn rebind(&mut self, context: PointContext) {
        self.file_name = context.file.name.clone();
        self.context = context;
    }
}
