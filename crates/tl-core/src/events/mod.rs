use std::sync::Arc;
use parking_lot::Mutex;
use ahash::AHashMap;

/// Event bus the visual reports its lifecycle on
pub struct EventBus {
    handlers: Arc<Mutex<AHashMap<std::any::TypeId, Vec<SharedHandler>>>>,
}

type SharedHandler = Arc<Mutex<Box<dyn EventHandler>>>;

/// Event trait that all events must implement
pub trait Event: Send + Sync + 'static {
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Handler trait for event handlers
pub trait EventHandler: Send + Sync {
    fn handle(&mut self, event: &dyn Event);
}

/// Events published by the timeline visual
pub mod events {
    use super::Event;

    /// An update cycle rendered a fresh item set
    #[derive(Debug, Clone)]
    pub struct TimelineRendered {
        pub update_count: u64,
        pub item_count: usize,
        pub group_count: usize,
        pub invalid_range_count: usize,
    }

    /// An update arrived before the host supplied a container
    #[derive(Debug, Clone)]
    pub struct UpdateSkipped {
        pub update_count: u64,
    }

    /// An update cycle was abandoned; the previous render stays visible
    #[derive(Debug, Clone)]
    pub struct UpdateAborted {
        pub update_count: u64,
        pub reason: String,
    }

    /// A click on a rendered item was forwarded to the host
    #[derive(Debug, Clone)]
    pub struct ItemSelected {
        pub selection_key: String,
    }

    // Implement Event trait for all event types
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
        TimelineRendered,
        UpdateSkipped,
        UpdateAborted,
        ItemSelected
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
        let type_id = std::any::TypeId::of::<E>();
        let mut handlers = self.handlers.lock();
        handlers
            .entry(type_id)
            .or_insert_with(Vec::new)
            .push(Arc::new(Mutex::new(handler)));
    }

    /// Subscribe a closure that receives the concrete event type
    pub fn on<E, F>(&self, mut f: F)
    where
        E: Event,
        F: FnMut(&E) + Send + Sync + 'static,
    {
        self.subscribe::<E>(handler_from_fn(move |event| {
            if let Some(event) = event.as_any().downcast_ref::<E>() {
                f(event);
            }
        }));
    }

    /// Publish an event
    ///
    /// Handlers are taken out of the bus before they run, so they may publish
    /// other events or subscribe.
    pub fn publish<E: Event>(&self, event: E) {
        let type_id = std::any::TypeId::of::<E>();
        let handlers = match self.handlers.lock().get(&type_id) {
            Some(handlers) => handlers.clone(),
            None => return,
        };

        for handler in handlers {
            handler.lock().handle(&event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper struct for creating event handlers from closures
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
    use super::*;
    use super::events::{ItemSelected, UpdateSkipped};

    #[test]
    fn test_typed_subscription() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        bus.on::<ItemSelected, _>(move |event| sink.lock().push(event.selection_key.clone()));

        bus.publish(ItemSelected { selection_key: "row#1".to_string() });
        bus.publish(UpdateSkipped { update_count: 1 });

        assert_eq!(*seen.lock(), vec!["row#1".to_string()]);
    }

    #[test]
    fn test_handler_may_publish_and_subscribe() {
        let bus = Arc::new(EventBus::new());
        let skipped = Arc::new(Mutex::new(Vec::new()));

        let sink = skipped.clone();
        bus.on::<UpdateSkipped, _>(move |event| sink.lock().push(event.update_count));

        let inner = bus.clone();
        bus.on::<ItemSelected, _>(move |_| {
            inner.publish(UpdateSkipped { update_count: 7 });
            inner.on::<UpdateSkipped, _>(|_| {});
        });

        bus.publish(ItemSelected { selection_key: "row#0".to_string() });
        assert_eq!(*skipped.lock(), vec![7]);

        // The handler added above now runs too
        bus.publish(UpdateSkipped { update_count: 8 });
        assert_eq!(*skipped.lock(), vec![7, 8]);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::default();
        bus.publish(UpdateSkipped { update_count: 3 });
    }
}
