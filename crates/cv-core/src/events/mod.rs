use std::any::{Any, TypeId};
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::Mutex;

/// Session-wide event bus
pub struct EventBus {
    handlers: Arc<Mutex<AHashMap<TypeId, Vec<Box<dyn EventHandler>>>>>,
}

/// Event trait that all events must implement
pub trait Event: Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
}

/// Handler trait for event handlers
pub trait EventHandler: Send + Sync {
    fn handle(&mut self, event: &dyn Event);
}

/// Domain events raised while opening sources and loading coils
pub mod events {
    use super::Event;
    use crate::dataset::DataKind;

    /// A source was opened and its coils listed
    #[derive(Debug, Clone)]
    pub struct SourceOpened {
        pub source_name: String,
        pub coils: Vec<String>,
    }

    /// A coil dataset became the active dataset
    #[derive(Debug, Clone)]
    pub struct DatasetLoaded {
        pub source_name: String,
        pub coil: String,
        pub row_count: usize,
        pub kinds: Vec<DataKind>,
        pub first_blank_info: Option<u64>,
    }

    /// A data kind was left out of a dataset
    #[derive(Debug, Clone)]
    pub struct DataKindMissing {
        pub coil: String,
        pub kind: DataKind,
    }

    /// A reference curve was synthesized from measured data
    #[derive(Debug, Clone)]
    pub struct SyntheticReferenceUsed {
        pub coil: String,
        pub kind: DataKind,
    }

    /// Loading a coil failed as a whole
    #[derive(Debug, Clone)]
    pub struct CoilLoadFailed {
        pub source_name: String,
        pub coil: String,
        pub error: String,
    }

    macro_rules! impl_event {
        ($($t:ty),*) => {
            $(
                impl Event for $t {
                    fn as_any(&self) -> &dyn std::any::Any {
                        self
                    }
                }
            )*
        }
    }

    impl_event!(
        SourceOpened,
        DatasetLoaded,
        DataKindMissing,
        SyntheticReferenceUsed,
        CoilLoadFailed
    );
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Mutex::new(AHashMap::new())),
        }
    }

    /// Subscribe to events of a specific type
    pub fn subscribe<E: Event>(&self, handler: Box<dyn EventHandler>) {
        let mut handlers = self.handlers.lock();
        handlers.entry(TypeId::of::<E>()).or_default().push(handler);
    }

    /// Publish an event; returns how many handlers saw it
    pub fn publish<E: Event>(&self, event: E) -> usize {
        let mut handlers = self.handlers.lock();

        match handlers.get_mut(&TypeId::of::<E>()) {
            Some(event_handlers) => {
                for handler in event_handlers.iter_mut() {
                    handler.handle(&event);
                }
                event_handlers.len()
            }
            None => 0,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Event handler backed by a closure
pub struct ClosureEventHandler<F> {
    handler: F,
}

impl<F> EventHandler for ClosureEventHandler<F>
where
    F: FnMut(&dyn Event) + Send + Sync,
{
    fn handle(&mut self, event: &dyn Event) {
        (self.handler)(event);
    }
}

/// Create an event handler from a closure
pub fn handler_from_fn<F>(f: F) -> Box<dyn EventHandler>
where
    F: FnMut(&dyn Event) + Send + Sync + 'static,
{
    Box::new(ClosureEventHandler { handler: f })
}

#[cfg(test)]
mod tests {
    use super::events::{CoilLoadFailed, DatasetLoaded};
    use super::*;

    #[test]
    fn test_publish_reaches_typed_handlers_only() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        bus.subscribe::<DatasetLoaded>(handler_from_fn(move |event| {
            if let Some(loaded) = event.as_any().downcast_ref::<DatasetLoaded>() {
                sink.lock().push(loaded.coil.clone());
            }
        }));

        let delivered = bus.publish(DatasetLoaded {
            source_name: "test.h5".to_string(),
            coil: "coil50".to_string(),
            row_count: 12,
            kinds: Vec::new(),
            first_blank_info: Some(1),
        });
        let ignored = bus.publish(CoilLoadFailed {
            source_name: "test.h5".to_string(),
            coil: "coil51".to_string(),
            error: "no data".to_string(),
        });

        assert_eq!(delivered, 1);
        assert_eq!(ignored, 0);
        assert_eq!(*seen.lock(), vec!["coil50".to_string()]);
    }
}
