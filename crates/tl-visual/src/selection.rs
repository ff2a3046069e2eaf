//! Selection bridge: clicks on rendered items to host selection requests
//!
//! Every listener is a closure capturing the element it was attached to and
//! the bridge's binding table. On a click it looks its own element up in the
//! table and forwards the handle to the host. The clicked target the document
//! reports is ignored, so a click bubbling up from a child element still
//! resolves to the item it belongs to.

use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use parking_lot::RwLock;
use tl_core::events::events::ItemSelected;
use tl_core::{EventBus, SelectionHandle, SelectionManager};
use tl_data::Item;
use tl_render::{ClickListener, Document, ElementId, RenderedFrame};
use tracing::debug;

type Bindings = Arc<RwLock<AHashMap<ElementId, SelectionHandle>>>;

pub struct SelectionBridge {
    manager: Arc<dyn SelectionManager>,
    bindings: Bindings,
    /// Elements that already carry one of our listeners
    attached: AHashSet<ElementId>,
    document: Option<Arc<Document>>,
    events: Option<Arc<EventBus>>,
}

impl SelectionBridge {
    pub fn new(manager: Arc<dyn SelectionManager>) -> Self {
        Self {
            manager,
            bindings: Arc::new(RwLock::new(AHashMap::new())),
            attached: AHashSet::new(),
            document: None,
            events: None,
        }
    }

    /// Publish [`ItemSelected`] on `events` for every forwarded click
    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    /// Bind the items of a fresh render and attach missing listeners
    ///
    /// The binding table is replaced as a whole. Elements that survived from
    /// an earlier attach keep their single listener. Returns the number of
    /// listeners added.
    pub fn attach(&mut self, document: &Arc<Document>, frame: &RenderedFrame, items: &[Item]) -> usize {
        let same_document = self
            .document
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, document));
        if !same_document {
            // Element ids are only unique within one document
            self.attached.clear();
            self.document = Some(document.clone());
        }
        self.attached.retain(|element| document.contains(*element));

        let bindings: AHashMap<ElementId, SelectionHandle> = frame
            .items
            .iter()
            .filter_map(|rendered| {
                let item = items.get(rendered.index)?;
                Some((rendered.element, item.selection.clone()))
            })
            .collect();
        *self.bindings.write() = bindings;

        let mut added = 0;
        for rendered in &frame.items {
            if !self.attached.insert(rendered.element) {
                continue;
            }
            if document.add_click_listener(rendered.element, self.listener_for(rendered.element)) {
                added += 1;
            } else {
                self.attached.remove(&rendered.element);
            }
        }

        debug!(
            "Selection bridge bound {} items, {} new listeners",
            frame.items.len(),
            added
        );
        added
    }

    /// Handle bound to `element` by the latest attach
    pub fn resolve(&self, element: ElementId) -> Option<SelectionHandle> {
        self.bindings.read().get(&element).cloned()
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.read().len()
    }

    fn listener_for(&self, element: ElementId) -> ClickListener {
        let bindings = self.bindings.clone();
        let manager = self.manager.clone();
        let events = self.events.clone();

        Arc::new(move |_target: ElementId| {
            let handle = bindings.read().get(&element).cloned();
            let Some(handle) = handle else {
                debug!("Click on {:?} has no selection binding, ignored", element);
                return;
            };

            debug!("Requesting selection of {}", handle);
            manager.request_select(&handle);
            if let Some(events) = &events {
                events.publish(ItemSelected {
                    selection_key: handle.key().to_string(),
                });
            }
        })
    }
}

impl std::fmt::Debug for SelectionBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionBridge")
            .field("bindings", &self.binding_count())
            .field("attached", &self.attached.len())
            .finish()
    }
}
