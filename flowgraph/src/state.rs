//! Shared run state: JSON object carried through a run, merged incrementally.
//!
//! Nodes produce *partial* states (a subset of keys); [`merge`] folds a delta
//! into the running state key by key. The whole state is never replaced.

use serde_json::{Map, Value};

/// The shared key-value state of one run.
pub type State = Map<String, Value>;

/// Merges `delta` into `state`, key-wise last-write-wins.
pub fn merge(state: &mut State, delta: State) {
    for (key, value) in delta {
        state.insert(key, value);
    }
}
