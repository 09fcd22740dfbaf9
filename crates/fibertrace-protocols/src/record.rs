//! Component records: what the assistant receives as context.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::node::{ElementHandle, SourceLocation, WorkTag};

/// Engine-assigned identity of a logical node.
///
/// Monotonically increasing per engine and never reused for a different
/// logical node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(pub u64);

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fine-grained component kind of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Function,
    Class,
    ForwardRef,
    Memo,
    Host,
    Other,
}

impl From<WorkTag> for ComponentKind {
    fn from(tag: WorkTag) -> Self {
        match tag {
            WorkTag::FUNCTION_COMPONENT | WorkTag::INDETERMINATE_COMPONENT => ComponentKind::Function,
            WorkTag::CLASS_COMPONENT | WorkTag::INCOMPLETE_CLASS_COMPONENT => ComponentKind::Class,
            WorkTag::FORWARD_REF => ComponentKind::ForwardRef,
            WorkTag::MEMO_COMPONENT | WorkTag::SIMPLE_MEMO_COMPONENT => ComponentKind::Memo,
            WorkTag::HOST_COMPONENT | WorkTag::HOST_HOISTABLE | WorkTag::HOST_SINGLETON => {
                ComponentKind::Host
            }
            _ => ComponentKind::Other,
        }
    }
}

/// One captured hook value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookValue {
    pub memoized_value: Value,
    pub base_value: Value,
    pub has_next: bool,
}

/// Semantic facts about one component instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRecord {
    pub id: Identity,
    pub display_name: String,
    pub kind: ComponentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub props: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,
    #[serde(default)]
    pub hooks: Vec<HookValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Identity>,
    #[serde(default)]
    pub children: Vec<Identity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_handle: Option<ElementHandle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceLocation>,
    pub depth: usize,
    pub is_logical_component: bool,
    /// Reads that failed while this record was last extracted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extraction_errors: Vec<String>,
}

impl ComponentRecord {
    /// Whether any field was produced from a failed read.
    pub fn is_partial(&self) -> bool {
        !self.extraction_errors.is_empty()
    }

    /// Highlight label: the display name, optionally with its source location.
    pub fn label(&self, with_source: bool, max_len: usize) -> String {
        let label = match (&self.source, with_source) {
            (Some(source), true) => {
                format!("{} ({}:{})", self.display_name, source.file_name, source.line_number)
            }
            _ => self.display_name.clone(),
        };
        truncate_label(label, max_len)
    }
}

fn truncate_label(label: String, max_len: usize) -> String {
    if max_len == 0 || label.chars().count() <= max_len {
        return label;
    }
    let mut truncated: String = label.chars().take(max_len.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
