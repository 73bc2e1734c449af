//! Navigation engine implementation

use super::{NavigationError, NavigationEvent, NavigationState, NavigationSubscriber};
use crate::dataset::BlankInfo;
use std::sync::{Arc, Weak};
use parking_lot::RwLock;

/// Navigation state stored internally, paired with the active dataset's numbering
#[derive(Debug, Clone)]
struct EngineState {
    navigation: NavigationState,
    blank_info: BlankInfo,
}

/// The main navigation engine.
///
/// Events are applied one at a time under the write lock, so each request
/// sees the result of the previous one in full.
pub struct NavigationEngine {
    state: Arc<RwLock<EngineState>>,
    subscribers: Arc<RwLock<Vec<Weak<dyn NavigationSubscriber>>>>,
}

impl NavigationEngine {
    /// Create a new navigation engine with no dataset
    pub fn new(rows_per_page: usize) -> Self {
        let state = EngineState {
            navigation: NavigationState::new(0, rows_per_page),
            blank_info: BlankInfo::default(),
        };

        Self {
            state: Arc::new(RwLock::new(state)),
            subscribers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Switch to a new dataset's numbering and reset the state
    pub fn load_dataset(&self, blank_info: BlankInfo) -> NavigationState {
        let mut state = self.state.write();
        state.blank_info = blank_info;
        let reset = state
            .navigation
            .apply(&NavigationEvent::OnCoilOrFileChange, &state.blank_info);
        if let Ok(navigation) = reset {
            state.navigation = navigation;
        }
        let snapshot = state.navigation.clone();

        drop(state);
        self.notify_subscribers();
        snapshot
    }

    /// Apply one navigation event.
    ///
    /// Rejected events leave the state untouched and notify nobody.
    pub fn dispatch(&self, event: NavigationEvent) -> Result<NavigationState, NavigationError> {
        let mut state = self.state.write();

        let next = state.navigation.apply(&event, &state.blank_info)?;
        let changed = next != state.navigation;
        if changed {
            tracing::debug!(
                "Navigation {:?}: {:?} -> {:?}",
                event,
                state.navigation.current_row(),
                next.current_row()
            );
            state.navigation = next.clone();
        }

        drop(state);
        if changed {
            self.notify_subscribers();
        }
        Ok(next)
    }

    /// Get the current navigation state
    pub fn snapshot(&self) -> NavigationState {
        self.state.read().navigation.clone()
    }

    /// Blank info number of the selected row
    pub fn current_blank_info(&self) -> Option<u64> {
        let state = self.state.read();
        state
            .navigation
            .current_row()
            .and_then(|row| state.blank_info.get(row))
    }

    /// Add a subscriber
    pub fn add_subscriber(&self, subscriber: Arc<dyn NavigationSubscriber>) {
        let mut subscribers = self.subscribers.write();
        subscribers.push(Arc::downgrade(&subscriber));
    }

    /// Notify all subscribers of a navigation change
    fn notify_subscribers(&self) {
        let snapshot = self.snapshot();
        let mut subscribers = self.subscribers.write();

        // Remove any dead weak references
        subscribers.retain(|weak| weak.strong_count() > 0);

        for weak in subscribers.iter() {
            if let Some(subscriber) = weak.upgrade() {
                subscriber.on_navigation_change(&snapshot);
            }
        }
    }
}

impl Default for NavigationEngine {
    fn default() -> Self {
        Self::new(super::DEFAULT_ROWS_PER_PAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        rows: Mutex<Vec<Option<usize>>>,
    }

    impl NavigationSubscriber for Recorder {
        fn on_navigation_change(&self, state: &NavigationState) {
            self.rows.lock().push(state.current_row());
        }
    }

    #[test]
    fn test_dispatch_updates_and_notifies() {
        let engine = NavigationEngine::new(5);
        let recorder = Arc::new(Recorder::default());
        engine.add_subscriber(recorder.clone());

        engine.load_dataset(BlankInfo::contiguous(1, 12));
        engine.dispatch(NavigationEvent::SelectRow(3)).unwrap();
        engine.dispatch(NavigationEvent::Next).unwrap();

        assert_eq!(engine.snapshot().current_row(), Some(4));
        assert_eq!(engine.current_blank_info(), Some(5));
        assert_eq!(*recorder.rows.lock(), vec![None, Some(3), Some(4)]);
    }

    #[test]
    fn test_rejected_event_keeps_state() {
        let engine = NavigationEngine::new(5);
        engine.load_dataset(BlankInfo::contiguous(13, 8));
        engine.dispatch(NavigationEvent::SelectRow(6)).unwrap();

        let before = engine.snapshot();
        let result = engine.dispatch(NavigationEvent::JumpToBlankInfo(1));
        assert_eq!(result, Err(NavigationError::BlankInfoNotFound(1)));
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn test_dead_subscribers_are_dropped() {
        let engine = NavigationEngine::default();
        {
            let recorder: Arc<dyn NavigationSubscriber> = Arc::new(Recorder::default());
            engine.add_subscriber(recorder);
        }
        engine.load_dataset(BlankInfo::contiguous(1, 2));
        assert!(engine.subscribers.read().is_empty());
    }
}
