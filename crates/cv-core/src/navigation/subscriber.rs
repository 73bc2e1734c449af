//! Navigation subscriber trait

use super::NavigationState;

/// Trait for components that need to respond to row/page/view changes
pub trait NavigationSubscriber: Send + Sync {
    /// Called after an event changed the navigation state
    fn on_navigation_change(&self, state: &NavigationState);
}
