//! In-memory document model.
//!
//! A [`Document`] is a tree of [`Element`]s. All mutation happens inside
//! [`Model::change`]: the closure receives a [`Writer`] whose calls apply
//! [`Operation`]s immediately and record a [`Change`] for each. When the
//! closure returns, every registered [`RepairStage`] is asked for corrective
//! operations, which are applied and fed back to the stages until none are
//! produced. Only then is the session committed as one [`Batch`], so
//! observers never see a state the stages would have rejected.

pub mod content;
pub mod document;
pub mod element;
pub mod error;
pub mod operation;
pub mod position;
pub mod schema;
pub mod writer;

pub use content::{Fragment, insert_content};
pub use document::{Document, ROOT_NAME};
pub use element::{AttributeValue, Element, NodeId};
pub use error::ModelError;
pub use operation::{Change, ChangeKind, Operation};
pub use position::{Path, Position, Range};
pub use schema::{ElementDef, ElementKind, Schema};
pub use writer::Writer;

use crate::lists::identity::{IdGenerator, UuidIds};

/// Upper bound on repair rounds per session. Stages converge in one or two
/// rounds; hitting the bound means two stages keep undoing each other.
const MAX_REPAIR_ROUNDS: usize = 16;

/// End-of-session stage that inspects what a session changed and returns
/// operations correcting the document.
///
/// Stages are pure: they read the settled document and never mutate it
/// themselves.
pub trait RepairStage {
    fn name(&self) -> &'static str;

    fn repair(
        &mut self,
        document: &Document,
        schema: &Schema,
        changes: &[Change],
        ids: &mut dyn IdGenerator,
    ) -> Vec<Operation>;
}

/// Operations of one committed session, repairs included.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub version: u64,
    pub operations: Vec<Operation>,
}

/// Document plus schema plus the repair pipeline.
pub struct Model {
    document: Document,
    schema: Schema,
    ids: Box<dyn IdGenerator>,
    stages: Vec<Box<dyn RepairStage>>,
    batches: Vec<Batch>,
    version: u64,
}

impl Model {
    pub fn new(schema: Schema) -> Self {
        Self {
            document: Document::new(),
            schema,
            ids: Box::new(UuidIds),
            stages: Vec::new(),
            batches: Vec::new(),
            version: 0,
        }
    }

    pub fn with_ids(mut self, ids: Box<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn add_stage(&mut self, stage: Box<dyn RepairStage>) {
        self.stages.push(stage);
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Committed sessions, oldest first.
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Replace the document as-is, bypassing sessions and repair.
    pub fn load(&mut self, document: Document) {
        self.document = document;
    }

    /// Run one change session.
    ///
    /// Repair runs even when `f` fails part-way, so the document never stays
    /// in an unrepaired state; the error from `f` is returned afterwards.
    pub fn change<T>(
        &mut self,
        f: impl FnOnce(&mut Writer<'_>) -> Result<T, ModelError>,
    ) -> Result<T, ModelError> {
        let mut writer = Writer::new(&mut self.document, &self.schema, self.ids.as_mut());
        let result = f(&mut writer);
        let (mut operations, changes) = writer.into_parts();

        let repaired = self.repair(changes, &mut operations);

        if !operations.is_empty() {
            self.version += 1;
            self.batches.push(Batch {
                version: self.version,
                operations,
            });
        }
        let value = result?;
        repaired?;
        Ok(value)
    }

    fn repair(
        &mut self,
        mut changes: Vec<Change>,
        operations: &mut Vec<Operation>,
    ) -> Result<(), ModelError> {
        for round in 0..MAX_REPAIR_ROUNDS {
            if changes.is_empty() {
                return Ok(());
            }
            let mut corrections = Vec::new();
            for stage in &mut self.stages {
                let produced =
                    stage.repair(&self.document, &self.schema, &changes, self.ids.as_mut());
                if !produced.is_empty() {
                    log::debug!(
                        "{} produced {} corrections in round {round}",
                        stage.name(),
                        produced.len()
                    );
                }
                corrections.extend(produced);
            }

            changes = Vec::with_capacity(corrections.len());
            for operation in corrections {
                changes.push(self.document.apply(&operation)?);
                operations.push(operation);
            }
        }
        if !changes.is_empty() {
            log::warn!("repair did not settle after {MAX_REPAIR_ROUNDS} rounds");
        }
        Ok(())
    }
}
