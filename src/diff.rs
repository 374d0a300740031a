//! Structural comparison of chart content.
//!
//! Name and description are prose and get a line-level text diff. The
//! tags, filter, visual, and calculation payloads are semantically trees,
//! so they get an RFC 6902 structural diff instead — a raw text diff would
//! misreport equivalent key orderings as changes. `Compare(a, b)` reports
//! the changes taking `a` to `b`; applying the structural operations to
//! `a`'s payload reproduces `b`'s.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use similar::{ChangeTag, TextDiff};

use crate::snapshot::ChartContent;

/// JSON Patch operation types (RFC 6902)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Remove,
    Replace,
    Move,
    Copy,
    Test,
}

/// A single JSON Patch operation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    /// Operation type
    pub op: PatchOp,

    /// JSON Pointer path to the target location
    pub path: String,

    /// Value for add, replace, and test operations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    /// Source path for move and copy operations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextOp {
    Added,
    Removed,
}

/// One changed line in a scalar text field
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextChange {
    pub op: TextOp,
    pub line: String,
}

/// Line-level diff of a scalar text field
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TextFieldDiff {
    pub changes: Vec<TextChange>,
}

impl TextFieldDiff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Structural diff of a tree-shaped payload field
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredFieldDiff {
    pub operations: Vec<PatchOperation>,
}

impl StructuredFieldDiff {
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Rebuild the json-patch document for application.
    pub fn to_patch(&self) -> Result<json_patch::Patch, String> {
        operations_to_json_patch(self.operations.clone())
    }

    /// Apply the operations to the `from` side of the comparison,
    /// producing the `to` side. Used to verify a diff is a valid patch.
    pub fn apply_to(&self, from: &Value) -> Result<Value, String> {
        let patch = self.to_patch()?;
        let mut doc = from.clone();
        json_patch::patch(&mut doc, &patch).map_err(|err| err.to_string())?;
        Ok(doc)
    }
}

/// Per-field comparison of two chart content snapshots
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentDiff {
    pub name: TextFieldDiff,
    pub description: TextFieldDiff,
    pub tags: StructuredFieldDiff,
    pub filter: StructuredFieldDiff,
    pub visual: StructuredFieldDiff,
    pub calculation: StructuredFieldDiff,
}

impl ContentDiff {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
            && self.description.is_empty()
            && self.tags.is_empty()
            && self.filter.is_empty()
            && self.visual.is_empty()
            && self.calculation.is_empty()
    }

    /// Count total number of changes across all fields
    pub fn change_count(&self) -> usize {
        self.name.changes.len()
            + self.description.changes.len()
            + self.tags.operations.len()
            + self.filter.operations.len()
            + self.visual.operations.len()
            + self.calculation.operations.len()
    }
}

/// Compute the per-field diff taking `from` to `to`.
pub fn diff_contents(from: &ChartContent, to: &ChartContent) -> ContentDiff {
    ContentDiff {
        name: diff_text(&from.name, &to.name),
        description: diff_text(
            from.description.as_deref().unwrap_or(""),
            to.description.as_deref().unwrap_or(""),
        ),
        tags: diff_structured(
            &Value::from(from.tags.clone()),
            &Value::from(to.tags.clone()),
        ),
        filter: diff_structured(&from.filter, &to.filter),
        visual: diff_structured(&from.visual, &to.visual),
        calculation: diff_structured(&from.calculation, &to.calculation),
    }
}

fn diff_text(from: &str, to: &str) -> TextFieldDiff {
    let diff = TextDiff::from_lines(from, to);

    let mut changes = Vec::new();
    for change in diff.iter_all_changes() {
        let op = match change.tag() {
            ChangeTag::Delete => TextOp::Removed,
            ChangeTag::Insert => TextOp::Added,
            ChangeTag::Equal => continue,
        };
        changes.push(TextChange {
            op,
            line: change.value().trim_end_matches('\n').to_string(),
        });
    }

    TextFieldDiff { changes }
}

fn diff_structured(from: &Value, to: &Value) -> StructuredFieldDiff {
    let patch = json_patch::diff(from, to);
    StructuredFieldDiff {
        operations: json_patch_to_operations(&patch),
    }
}

fn json_patch_to_operations(patch: &json_patch::Patch) -> Vec<PatchOperation> {
    patch
        .0
        .iter()
        .map(|op| match op {
            json_patch::PatchOperation::Add(add_op) => PatchOperation {
                op: PatchOp::Add,
                path: add_op.path.to_string(),
                value: Some(add_op.value.clone()),
                from: None,
            },
            json_patch::PatchOperation::Remove(remove_op) => PatchOperation {
                op: PatchOp::Remove,
                path: remove_op.path.to_string(),
                value: None,
                from: None,
            },
            json_patch::PatchOperation::Replace(replace_op) => PatchOperation {
                op: PatchOp::Replace,
                path: replace_op.path.to_string(),
                value: Some(replace_op.value.clone()),
                from: None,
            },
            json_patch::PatchOperation::Move(move_op) => PatchOperation {
                op: PatchOp::Move,
                path: move_op.path.to_string(),
                value: None,
                from: Some(move_op.from.to_string()),
            },
            json_patch::PatchOperation::Copy(copy_op) => PatchOperation {
                op: PatchOp::Copy,
                path: copy_op.path.to_string(),
                value: None,
                from: Some(copy_op.from.to_string()),
            },
            json_patch::PatchOperation::Test(test_op) => PatchOperation {
                op: PatchOp::Test,
                path: test_op.path.to_string(),
                value: Some(test_op.value.clone()),
                from: None,
            },
        })
        .collect()
}

fn operations_to_json_patch(
    operations: Vec<PatchOperation>,
) -> Result<json_patch::Patch, String> {
    let patch_ops: Result<Vec<json_patch::PatchOperation>, String> = operations
        .into_iter()
        .map(|op| match op.op {
            PatchOp::Add => {
                let value = op
                    .value
                    .ok_or_else(|| "Add operation requires a value".to_string())?;
                Ok(json_patch::PatchOperation::Add(json_patch::AddOperation {
                    path: op.path.parse().map_err(|e| format!("Invalid path: {}", e))?,
                    value,
                }))
            }
            PatchOp::Remove => Ok(json_patch::PatchOperation::Remove(
                json_patch::RemoveOperation {
                    path: op.path.parse().map_err(|e| format!("Invalid path: {}", e))?,
                },
            )),
            PatchOp::Replace => {
                let value = op
                    .value
                    .ok_or_else(|| "Replace operation requires a value".to_string())?;
                Ok(json_patch::PatchOperation::Replace(
                    json_patch::ReplaceOperation {
                        path: op.path.parse().map_err(|e| format!("Invalid path: {}", e))?,
                        value,
                    },
                ))
            }
            PatchOp::Move => {
                let from = op
                    .from
                    .ok_or_else(|| "Move operation requires a from path".to_string())?;
                Ok(json_patch::PatchOperation::Move(
                    json_patch::MoveOperation {
                        path: op.path.parse().map_err(|e| format!("Invalid path: {}", e))?,
                        from: from.parse().map_err(|e| format!("Invalid from path: {}", e))?,
                    },
                ))
            }
            PatchOp::Copy => {
                let from = op
                    .from
                    .ok_or_else(|| "Copy operation requires a from path".to_string())?;
                Ok(json_patch::PatchOperation::Copy(
                    json_patch::CopyOperation {
                        path: op.path.parse().map_err(|e| format!("Invalid path: {}", e))?,
                        from: from.parse().map_err(|e| format!("Invalid from path: {}", e))?,
                    },
                ))
            }
            PatchOp::Test => {
                let value = op
                    .value
                    .ok_or_else(|| "Test operation requires a value".to_string())?;
                Ok(json_patch::PatchOperation::Test(
                    json_patch::TestOperation {
                        path: op.path.parse().map_err(|e| format!("Invalid path: {}", e))?,
                        value,
                    },
                ))
            }
        })
        .collect();

    Ok(json_patch::Patch(patch_ops?))
}
