//! Gate evaluation - deciding whether a node will accept the player.

use crate::state::PlayerState;
use crate::world::{World, WorldError};

/// Result of evaluating a node's entry gate against player state.
///
/// The missing lists preserve the order the node declared its requirements
/// in, so denial reports read the same way the world data does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryCheck {
    pub missing_items: Vec<String>,
    pub missing_flags: Vec<String>,
}

impl EntryCheck {
    /// True when nothing is missing and the node is enterable.
    pub fn ok(&self) -> bool {
        self.missing_items.is_empty() && self.missing_flags.is_empty()
    }
}

impl World {
    /// Evaluate a node's entry gate against the current player state.
    ///
    /// Pure: repeated calls with the same state give the same answer, and no
    /// state is touched. Unknown node ids are an error, not a denial.
    pub fn entry_check(
        &self,
        state: &PlayerState,
        node_id: &str,
    ) -> Result<EntryCheck, WorldError> {
        let node = self.node(node_id)?;
        let missing_items = node
            .entry
            .items
            .iter()
            .filter(|item| !state.inventory.contains(*item))
            .cloned()
            .collect();
        let missing_flags = node
            .entry
            .flags
            .iter()
            .filter(|flag| !state.flags.contains(*flag))
            .cloned()
            .collect();
        Ok(EntryCheck {
            missing_items,
            missing_flags,
        })
    }
}
