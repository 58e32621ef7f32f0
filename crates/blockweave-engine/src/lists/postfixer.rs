//! The list post-fixer.
//!
//! Runs at the end of every change session and rewrites `listIndent`,
//! `listType` and `listItemId` on the runs the session touched so the flat
//! sequence of list blocks encodes a valid nested list again:
//!
//! - the first block of a run sits at indent 0 and no block is more than one
//!   level deeper than the block before it;
//! - items at the same indent inside one branch share a type;
//! - every item has its own id, and blocks sharing an id are contiguous and
//!   agree on indent and type;
//! - elements that may not be list blocks carry no list attributes at all.
//!
//! Repairs only ever emit attribute operations, and only for values that
//! differ from what is stored, so a settled document produces none.

use std::collections::{HashMap, HashSet};

use crate::lists::attributes::{
    self, LIST_ATTRIBUTES, LIST_INDENT, LIST_ITEM_ID, LIST_TYPE, ListType, has_list_attributes,
};
use crate::lists::identity::{IdAllocator, IdGenerator};
use crate::lists::scanner::scan_run;
use crate::lists::trigger::{TouchedSet, classify};
use crate::model::{
    AttributeValue, Change, Document, Element, Operation, Path, RepairStage, Schema,
};

/// Repair stage wiring [`classify`] and [`repair`] into [`Model::change`].
///
/// [`Model::change`]: crate::model::Model::change
#[derive(Debug, Clone, Default)]
pub struct ListPostFixer {
    default_type: ListType,
}

impl ListPostFixer {
    /// `default_type` is given to list items that arrive without a type.
    pub fn new(default_type: ListType) -> Self {
        Self { default_type }
    }
}

impl RepairStage for ListPostFixer {
    fn name(&self) -> &'static str {
        "list-post-fixer"
    }

    fn repair(
        &mut self,
        document: &Document,
        schema: &Schema,
        changes: &[Change],
        ids: &mut dyn IdGenerator,
    ) -> Vec<Operation> {
        match classify(document, schema, changes) {
            Some(touched) => repair(document, schema, &touched, &self.default_type, ids),
            None => Vec::new(),
        }
    }
}

/// Corrective operations for the runs and elements in `touched`.
///
/// Indents and types are fixed per run first. Ids are settled afterwards
/// across all runs: an item the session did not touch keeps its id, and a
/// touched item gets a fresh one when its id also belongs to an untouched
/// item, to an earlier item of this pass, or to a block outside the runs.
pub fn repair(
    document: &Document,
    schema: &Schema,
    touched: &TouchedSet,
    default_type: &ListType,
    ids: &mut dyn IdGenerator,
) -> Vec<Operation> {
    let mut operations = Vec::new();
    // Ids carried by the blocks this pass rewrites or strips.
    let mut in_pass: HashMap<String, usize> = HashMap::new();

    for path in &touched.touched {
        let Some(element) = document.element(path) else {
            continue;
        };
        if strip(element, path, schema, &mut operations) {
            if let Some(id) = attributes::item_id(element) {
                *in_pass.entry(id).or_default() += 1;
            }
        }
    }

    let runs: Vec<PlannedRun<'_>> = touched
        .heads
        .iter()
        .filter_map(|head| {
            plan_run(document, schema, head, touched, default_type)
        })
        .collect();

    let mut claimed: HashSet<&str> = HashSet::new();
    for item in runs.iter().flat_map(|run| &run.items) {
        *in_pass.entry(item.raw_id.clone()).or_default() += item.blocks.len();
        if !item.touched {
            claimed.insert(&item.raw_id);
        }
    }
    let held_outside =
        |id: &str| document.item_id_count(id) > in_pass.get(id).copied().unwrap_or(0);

    let mut ids = IdAllocator::new(ids, document);
    let mut seen: HashSet<String> = HashSet::new();
    for run in &runs {
        let before = operations.len();
        for item in &run.items {
            let copied = item.touched
                && (claimed.contains(item.raw_id.as_str()) || held_outside(&item.raw_id));
            let id = if copied || seen.contains(&item.raw_id) {
                ids.fresh()
            } else {
                item.raw_id.clone()
            };
            for block in &item.blocks {
                block.write(&id, &mut operations);
            }
            seen.insert(id);
        }
        let corrections = operations.len() - before;
        log::trace!("run at {:?}: {corrections} corrections", run.head);
    }

    if !operations.is_empty() {
        log::debug!(
            "list post-fixer: {} corrections over {} runs",
            operations.len(),
            touched.heads.len()
        );
    }
    operations
}

/// Strip every list attribute from an element that may not carry them, or
/// that carries some of them without an item id. Returns whether it did.
fn strip(element: &Element, path: &Path, schema: &Schema, operations: &mut Vec<Operation>) -> bool {
    if !has_list_attributes(element) {
        return false;
    }
    if schema.is_list_capable(&element.name) && element.has_attribute(LIST_ITEM_ID) {
        return false;
    }
    for key in LIST_ATTRIBUTES.iter().filter(|key| element.has_attribute(key)) {
        operations.push(Operation::SetAttribute {
            path: path.clone(),
            key: key.to_string(),
            value: None,
        });
    }
    true
}

/// Indent bookkeeping for one run.
///
/// `max_indent` is the deepest indent the next block may take without being
/// over-indented. The first over-indented block after a valid one sets
/// `shift` to its excess; later ones are pulled back by the same amount,
/// capped at their own indent, so a cascade of deeper items keeps its
/// relative shape.
#[derive(Default)]
struct IndentState {
    max_indent: usize,
    previous: Option<usize>,
    shift: Option<usize>,
}

impl IndentState {
    fn fix(&mut self, raw: usize) -> usize {
        let fixed = if raw <= self.max_indent {
            self.shift = None;
            self.max_indent = raw + 1;
            raw
        } else {
            let shift = match self.shift {
                None => raw - self.max_indent,
                Some(shift) => shift.min(raw),
            };
            self.shift = Some(shift);
            (raw - shift).min(self.previous.map_or(0, |previous| previous + 1))
        };
        self.previous = Some(fixed);
        fixed
    }
}

/// Types of the open branches, one entry per indent level down to the last
/// fixed block.
#[derive(Default)]
struct TypeStack {
    levels: Vec<ListType>,
}

impl TypeStack {
    fn fix(
        &mut self,
        indent: usize,
        declared: Option<ListType>,
        default_type: &ListType,
    ) -> ListType {
        let own = || declared.clone().unwrap_or_else(|| default_type.clone());
        if indent >= self.levels.len() {
            // New sub-list: starts its own type.
            self.levels.truncate(indent);
            let list_type = own();
            self.levels.push(list_type.clone());
            return list_type;
        }
        self.levels.truncate(indent + 1);
        if indent == 0 {
            // Top-level items have no parent branch to agree with.
            let list_type = own();
            self.levels[0] = list_type.clone();
            return list_type;
        }
        self.levels[indent].clone()
    }
}

/// A list block with its indent and type already fixed.
struct PlannedBlock<'a> {
    path: Path,
    element: &'a Element,
    indent: usize,
    list_type: ListType,
}

impl PlannedBlock<'_> {
    fn write(&self, id: &str, operations: &mut Vec<Operation>) {
        let (path, element) = (&self.path, self.element);
        set_if_differs(operations, path, element, LIST_INDENT, self.indent.into());
        let list_type = (&self.list_type).into();
        set_if_differs(operations, path, element, LIST_TYPE, list_type);
        set_if_differs(operations, path, element, LIST_ITEM_ID, id.into());
    }
}

/// Contiguous blocks that form one item once indents and types are fixed.
struct PlannedItem<'a> {
    raw_id: String,
    touched: bool,
    blocks: Vec<PlannedBlock<'a>>,
}

impl PlannedItem<'_> {
    /// Blocks of one item share the stored id and the fixed indent and type.
    fn continues_with(&self, raw_id: &str, block: &PlannedBlock<'_>) -> bool {
        self.blocks.last().is_some_and(|last| {
            self.raw_id == raw_id
                && last.indent == block.indent
                && last.list_type == block.list_type
        })
    }
}

struct PlannedRun<'a> {
    head: &'a Path,
    items: Vec<PlannedItem<'a>>,
}

fn plan_run<'a>(
    document: &'a Document,
    schema: &'a Schema,
    head: &'a Path,
    touched: &TouchedSet,
    default_type: &ListType,
) -> Option<PlannedRun<'a>> {
    let (siblings, index) = document.siblings(head)?;
    let parent = &head[..head.len() - 1];
    let mut indents = IndentState::default();
    let mut types = TypeStack::default();
    let mut items: Vec<PlannedItem<'a>> = Vec::new();

    for block in scan_run(siblings, schema, index) {
        let indent = indents.fix(block.indent.unwrap_or(0));
        let list_type = types.fix(indent, block.list_type.clone(), default_type);
        let mut path = parent.to_vec();
        path.push(block.index);
        let is_touched = touched.touched.contains(&path);
        let planned = PlannedBlock {
            path,
            element: block.element,
            indent,
            list_type,
        };

        match items.last_mut() {
            Some(item) if item.continues_with(&block.item_id, &planned) => {
                item.touched |= is_touched;
                item.blocks.push(planned);
            }
            _ => items.push(PlannedItem {
                raw_id: block.item_id,
                touched: is_touched,
                blocks: vec![planned],
            }),
        }
    }
    Some(PlannedRun { head, items })
}

fn set_if_differs(
    operations: &mut Vec<Operation>,
    path: &Path,
    element: &Element,
    key: &str,
    value: AttributeValue,
) {
    if element.attribute(key) == Some(&value) {
        return;
    }
    operations.push(Operation::SetAttribute {
        path: path.clone(),
        key: key.to_string(),
        value: Some(value),
    });
}
