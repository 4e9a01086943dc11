//! Callback dispatch.
//!
//! Tiles can declare other tiles as inputs. The dispatcher holds that
//! dependency graph, rejects cycles and duplicate registrations, applies a
//! per-output debounce window, and answers which downstream tiles need to
//! be invalidated when an output re-renders.

mod error;

pub use error::DispatchError;

use crate::config::TileConfig;
use dashmap::DashMap;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Callback {
    inputs: Vec<String>,
    debounce: Duration,
}

/// Decision for a single callback invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchDecision {
    /// Proceed with the render; the debounce window has been re-armed.
    Proceed,
    /// Suppressed; the previous invocation was too recent.
    Debounced {
        /// Time left until the window reopens
        remaining: Duration,
    },
}

/// Registry of callbacks keyed by their output tile.
#[derive(Debug)]
pub struct Dispatcher {
    callbacks: DashMap<String, Callback>,
    last_fired: DashMap<String, Instant>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            callbacks: DashMap::new(),
            last_fired: DashMap::new(),
        }
    }

    /// Build the dispatcher from tile configs. Every tile with declared
    /// inputs becomes a callback output. Fails on cycles.
    pub fn from_tiles(tiles: &[TileConfig]) -> Result<Self, DispatchError> {
        let dispatcher = Self::new();
        for tile in tiles {
            if tile.inputs.is_empty() {
                continue;
            }
            dispatcher.register(
                &tile.id,
                tile.inputs.clone(),
                Duration::from_millis(tile.debounce_ms),
            )?;
        }
        dispatcher.check_cycles()?;
        Ok(dispatcher)
    }

    /// Register a callback for an output tile. One callback per output.
    pub fn register(
        &self,
        output: &str,
        inputs: Vec<String>,
        debounce: Duration,
    ) -> Result<(), DispatchError> {
        if self.callbacks.contains_key(output) {
            return Err(DispatchError::DuplicateOutput(output.to_string()));
        }
        self.callbacks
            .insert(output.to_string(), Callback { inputs, debounce });
        Ok(())
    }

    /// Decide whether an invocation for `output` should render now.
    ///
    /// The first invocation always proceeds. A later one within the
    /// output's debounce window is suppressed; once the window elapses the
    /// next invocation proceeds and re-arms it.
    pub fn dispatch(&self, output: &str) -> Result<DispatchDecision, DispatchError> {
        let callback = self
            .callbacks
            .get(output)
            .ok_or_else(|| DispatchError::UnknownOutput(output.to_string()))?;
        let debounce = callback.debounce;
        drop(callback);

        if debounce.is_zero() {
            return Ok(DispatchDecision::Proceed);
        }

        let now = Instant::now();
        // Entry lock makes the check-then-arm atomic per output.
        match self.last_fired.entry(output.to_string()) {
            dashmap::Entry::Occupied(mut entry) => {
                let elapsed = now.duration_since(*entry.get());
                if elapsed < debounce {
                    return Ok(DispatchDecision::Debounced {
                        remaining: debounce - elapsed,
                    });
                }
                entry.insert(now);
            }
            dashmap::Entry::Vacant(entry) => {
                entry.insert(now);
            }
        }
        Ok(DispatchDecision::Proceed)
    }

    /// Inputs declared for an output, if it is registered.
    pub fn inputs_of(&self, output: &str) -> Option<Vec<String>> {
        self.callbacks.get(output).map(|c| c.inputs.clone())
    }

    /// Outputs that list `tile_id` as an input. These are the tiles whose
    /// cached fragments go stale when `tile_id` re-renders.
    pub fn dependents(&self, tile_id: &str) -> Vec<String> {
        let mut outputs: Vec<String> = self
            .callbacks
            .iter()
            .filter(|entry| entry.inputs.iter().any(|i| i == tile_id))
            .map(|entry| entry.key().clone())
            .collect();
        outputs.sort();
        outputs
    }

    pub fn callback_count(&self) -> usize {
        self.callbacks.len()
    }

    /// Detect cycles in the registered graph with an iterative DFS.
    fn check_cycles(&self) -> Result<(), DispatchError> {
        let graph: HashMap<String, Vec<String>> = self
            .callbacks
            .iter()
            .map(|entry| (entry.key().clone(), entry.inputs.clone()))
            .collect();

        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }
        let mut marks: HashMap<&str, Mark> = HashMap::new();

        for start in graph.keys() {
            if marks.contains_key(start.as_str()) {
                continue;
            }
            let mut stack: Vec<(&str, usize)> = vec![(start.as_str(), 0)];
            marks.insert(start.as_str(), Mark::Visiting);
            while let Some((node, next)) = stack.pop() {
                let edges = graph.get(node).map(|v| v.as_slice()).unwrap_or(&[]);
                if next < edges.len() {
                    stack.push((node, next + 1));
                    let child = edges[next].as_str();
                    match marks.get(child) {
                        Some(Mark::Visiting) => {
                            return Err(DispatchError::CircularDependency {
                                tile: child.to_string(),
                            });
                        }
                        Some(Mark::Done) => {}
                        None => {
                            if graph.contains_key(child) {
                                marks.insert(child, Mark::Visiting);
                                stack.push((child, 0));
                            } else {
                                // Input with no callback of its own is a leaf
                                marks.insert(child, Mark::Done);
                            }
                        }
                    }
                } else {
                    marks.insert(node, Mark::Done);
                }
            }
        }
        Ok(())
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{TileConfig, TileKind};

    fn tile(id: &str, inputs: &[&str], debounce_ms: u64) -> TileConfig {
        TileConfig {
            id: id.to_string(),
            title: id.to_string(),
            kind: TileKind::Table,
            source: "fixture".to_string(),
            refresh_seconds: 0,
            debounce_ms,
            max_rows: 100,
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_from_tiles_skips_tiles_without_inputs() {
        let dispatcher =
            Dispatcher::from_tiles(&[tile("a", &[], 0), tile("b", &["a"], 0)]).unwrap();
        assert_eq!(dispatcher.callback_count(), 1);
        assert!(dispatcher.inputs_of("b").is_some());
        assert!(dispatcher.inputs_of("a").is_none());
    }

    #[test]
    fn test_duplicate_output_rejected() {
        let dispatcher = Dispatcher::new();
        dispatcher
            .register("b", vec!["a".to_string()], Duration::ZERO)
            .unwrap();
        let err = dispatcher
            .register("b", vec!["c".to_string()], Duration::ZERO)
            .unwrap_err();
        assert!(matches!(err, DispatchError::DuplicateOutput(_)));
    }

    #[test]
    fn test_unknown_output() {
        let dispatcher = Dispatcher::new();
        let err = dispatcher.dispatch("ghost").unwrap_err();
        assert!(matches!(err, DispatchError::UnknownOutput(_)));
    }

    #[test]
    fn test_cycle_detected() {
        let err = Dispatcher::from_tiles(&[
            tile("a", &["b"], 0),
            tile("b", &["c"], 0),
            tile("c", &["a"], 0),
        ])
        .unwrap_err();
        assert!(matches!(err, DispatchError::CircularDependency { .. }));
    }

    #[test]
    fn test_self_cycle_detected() {
        let err = Dispatcher::from_tiles(&[tile("a", &["a"], 0)]).unwrap_err();
        assert!(matches!(err, DispatchError::CircularDependency { .. }));
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        // a and b both feed c and d; shared inputs are fine
        let dispatcher = Dispatcher::from_tiles(&[
            tile("c", &["a", "b"], 0),
            tile("d", &["a", "b"], 0),
        ])
        .unwrap();
        assert_eq!(dispatcher.callback_count(), 2);
    }

    #[test]
    fn test_dependents() {
        let dispatcher = Dispatcher::from_tiles(&[
            tile("chart", &["filter"], 0),
            tile("summary", &["filter", "chart"], 0),
        ])
        .unwrap();
        assert_eq!(dispatcher.dependents("filter"), vec!["chart", "summary"]);
        assert_eq!(dispatcher.dependents("chart"), vec!["summary"]);
        assert!(dispatcher.dependents("summary").is_empty());
    }

    #[test]
    fn test_zero_debounce_always_proceeds() {
        let dispatcher = Dispatcher::from_tiles(&[tile("b", &["a"], 0)]).unwrap();
        for _ in 0..3 {
            assert_eq!(dispatcher.dispatch("b").unwrap(), DispatchDecision::Proceed);
        }
    }

    #[test]
    fn test_debounce_suppresses_rapid_invocations() {
        let dispatcher = Dispatcher::from_tiles(&[tile("b", &["a"], 60_000)]).unwrap();
        assert_eq!(dispatcher.dispatch("b").unwrap(), DispatchDecision::Proceed);
        match dispatcher.dispatch("b").unwrap() {
            DispatchDecision::Debounced { remaining } => {
                assert!(remaining <= Duration::from_millis(60_000));
            }
            other => panic!("expected debounce, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_debounce_window_reopens() {
        let dispatcher = Dispatcher::from_tiles(&[tile("b", &["a"], 20)]).unwrap();
        assert_eq!(dispatcher.dispatch("b").unwrap(), DispatchDecision::Proceed);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(dispatcher.dispatch("b").unwrap(), DispatchDecision::Proceed);
    }
}
