//! Player state - the single mutable record the command loop owns.

use std::collections::HashSet;

use crate::world::START_NODE;

/// Handle used when the player does not supply one.
pub const DEFAULT_HANDLE: &str = "ghost";

/// Everything the engine knows about one player.
///
/// The set fields are membership-only; nothing in the engine depends on their
/// iteration order, and anything player-facing or persisted sorts first.
/// `log` is append-only and keeps insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerState {
    pub handle: String,
    pub location: String,
    pub inventory: HashSet<String>,
    pub scripts: HashSet<String>,
    pub flags: HashSet<String>,
    pub discovered: HashSet<String>,
    pub visited: HashSet<String>,
    pub log: Vec<String>,
    pub last_cipher: Option<String>,
    pub ended: bool,
}

impl PlayerState {
    /// A brand new state at the start node, knowing only the start node.
    pub fn fresh(handle: &str) -> Self {
        let handle = handle.trim();
        Self {
            handle: if handle.is_empty() {
                DEFAULT_HANDLE.to_string()
            } else {
                handle.to_string()
            },
            location: START_NODE.to_string(),
            inventory: HashSet::new(),
            scripts: HashSet::new(),
            flags: HashSet::new(),
            discovered: HashSet::from([START_NODE.to_string()]),
            visited: HashSet::new(),
            log: Vec::new(),
            last_cipher: None,
            ended: false,
        }
    }

    /// Append an event to the activity log.
    pub fn record(&mut self, event: impl Into<String>) {
        self.log.push(event.into());
    }

    /// Add node ids to the discovered set, returning only the ones that were
    /// actually new, in input order. Discovery never removes entries.
    pub fn discover<I>(&mut self, node_ids: I) -> Vec<String>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut added = Vec::new();
        for node_id in node_ids {
            let node_id = node_id.into();
            if self.discovered.insert(node_id.clone()) {
                added.push(node_id);
            }
        }
        added
    }

    /// Raise a milestone flag. Flags are monotonic; returns whether the flag
    /// was newly set.
    pub fn raise_flag(&mut self, flag: impl Into<String>) -> bool {
        self.flags.insert(flag.into())
    }

    /// Add an item to the inventory; returns whether it was newly added.
    pub fn grant_item(&mut self, item: impl Into<String>) -> bool {
        self.inventory.insert(item.into())
    }

    /// Add a script to the kit; returns whether it was newly added.
    pub fn add_script(&mut self, script: impl Into<String>) -> bool {
        self.scripts.insert(script.into())
    }

    pub fn has_item(&self, item: &str) -> bool {
        self.inventory.contains(item)
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    pub fn owns_script(&self, script: &str) -> bool {
        self.scripts.contains(script)
    }

    /// Move to a node, marking it visited. Returns true on the first visit.
    ///
    /// Gate checks belong to the caller; this only records the move and keeps
    /// the discovered-set invariant.
    pub fn enter(&mut self, node_id: &str) -> bool {
        self.location = node_id.to_string();
        self.discovered.insert(node_id.to_string());
        self.visited.insert(node_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_state_defaults() {
        let state = PlayerState::fresh("drifter");
        assert_eq!(state.handle, "drifter");
        assert_eq!(state.location, START_NODE);
        assert!(state.inventory.is_empty());
        assert!(state.scripts.is_empty());
        assert!(state.flags.is_empty());
        assert_eq!(state.discovered, HashSet::from([START_NODE.to_string()]));
        assert!(state.visited.is_empty());
        assert!(state.log.is_empty());
        assert!(state.last_cipher.is_none());
        assert!(!state.ended);
    }

    #[test]
    fn test_blank_handle_falls_back_to_ghost() {
        assert_eq!(PlayerState::fresh("").handle, DEFAULT_HANDLE);
        assert_eq!(PlayerState::fresh("   ").handle, DEFAULT_HANDLE);
    }

    #[test]
    fn test_discover_reports_only_new_nodes_in_order() {
        let mut state = PlayerState::fresh("drifter");
        let added = state.discover(["market.node", "perimeter.gate", START_NODE]);
        assert_eq!(added, vec!["market.node", "perimeter.gate"]);
        assert!(state.discovered.contains("market.node"));
    }

    #[test]
    fn test_discover_is_monotonic_and_idempotent() {
        let mut state = PlayerState::fresh("drifter");
        state.discover(["market.node", "perimeter.gate"]);
        let before = state.discovered.clone();

        let added = state.discover(["market.node", "perimeter.gate"]);
        assert!(added.is_empty());
        assert_eq!(state.discovered, before);
    }

    #[test]
    fn test_flags_are_monotonic() {
        let mut state = PlayerState::fresh("drifter");
        assert!(state.raise_flag("trace_open"));
        assert!(!state.raise_flag("trace_open"));
        assert!(state.has_flag("trace_open"));
    }

    #[test]
    fn test_enter_tracks_visits_and_discovery() {
        let mut state = PlayerState::fresh("drifter");
        assert!(state.enter("market.node"));
        assert_eq!(state.location, "market.node");
        assert!(state.discovered.contains("market.node"));

        // Revisits are not "first" anymore.
        assert!(!state.enter("market.node"));
    }

    #[test]
    fn test_record_appends_in_order() {
        let mut state = PlayerState::fresh("drifter");
        state.record("first");
        state.record("second");
        assert_eq!(state.log, vec!["first", "second"]);
    }
}
