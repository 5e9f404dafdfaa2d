//! ISO object id generation.

use std::collections::BTreeMap;

/// Source of document-unique ISO ids.
///
/// Ids are a table prefix followed by a number (`TSK1`, `VPN3`). File names
/// for binary artifacts use a fixed five-digit counter (`GRD00001`).
pub trait IdGenerator {
    /// Next id for an element prefix, e.g. `"TSK"`.
    fn next_id(&mut self, prefix: &str) -> String;

    /// Next file name stem for a binary artifact prefix, e.g. `"GRD"`.
    fn next_file_name(&mut self, prefix: &str) -> String;
}

/// Per-prefix counters starting at 1.
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    ids: BTreeMap<String, u32>,
    files: BTreeMap<String, u32>,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

fn bump(counters: &mut BTreeMap<String, u32>, prefix: &str) -> u32 {
    let counter = counters.entry(prefix.to_string()).or_insert(0);
    *counter += 1;
    *counter
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self, prefix: &str) -> String {
        format!("{}{}", prefix, bump(&mut self.ids, prefix))
    }

    fn next_file_name(&mut self, prefix: &str) -> String {
        format!("{}{:05}", prefix, bump(&mut self.files, prefix))
    }
}
