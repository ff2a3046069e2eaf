//! Host element tree
//!
//! A retained tree of elements the host owns and the visual renders into.
//! Element ids are never reused, so an id held after its element was removed
//! can only miss, never alias a newer element.
//!
//! All mutation goes through [`Document::batch`], which holds the write lock
//! for the whole closure: readers and click dispatch observe either the tree
//! before the batch or after it, never a half-built state.

use std::sync::Arc;

use ahash::AHashMap;
use indexmap::IndexMap;
use parking_lot::RwLock;

/// Identifier of an element within one [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// One node of the tree
#[derive(Debug, Clone, Default)]
pub struct Element {
    pub tag: String,
    pub classes: Vec<String>,
    pub text: Option<String>,
    pub attributes: IndexMap<String, String>,
    pub parent: Option<ElementId>,
    pub children: Vec<ElementId>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Default::default()
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Click listener; receives the element the click originated on
pub type ClickListener = Arc<dyn Fn(ElementId) + Send + Sync>;

struct DocumentInner {
    elements: AHashMap<ElementId, Element>,
    listeners: AHashMap<ElementId, Vec<ClickListener>>,
    next_id: u64,
}

/// Element tree shared between the host and the visual
pub struct Document {
    inner: RwLock<DocumentInner>,
    body: ElementId,
}

impl Document {
    /// Create a document holding only its `body` element
    pub fn new() -> Self {
        let mut inner = DocumentInner {
            elements: AHashMap::new(),
            listeners: AHashMap::new(),
            next_id: 0,
        };
        let body = inner.create("body");
        Self {
            inner: RwLock::new(inner),
            body,
        }
    }

    pub fn body(&self) -> ElementId {
        self.body
    }

    /// Run several mutations under one write lock
    pub fn batch<R>(&self, f: impl FnOnce(&mut DomBatch<'_>) -> R) -> R {
        let mut inner = self.inner.write();
        let mut batch = DomBatch { inner: &mut *inner };
        f(&mut batch)
    }

    /// Create a detached element
    pub fn create_element(&self, tag: &str) -> ElementId {
        self.batch(|dom| dom.create_element(tag))
    }

    pub fn append_child(&self, parent: ElementId, child: ElementId) -> bool {
        self.batch(|dom| dom.append_child(parent, child))
    }

    /// Remove an element with its subtree and listeners
    pub fn remove(&self, id: ElementId) -> bool {
        self.batch(|dom| dom.remove(id))
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.inner.read().elements.contains_key(&id)
    }

    /// Snapshot of one element
    pub fn element(&self, id: ElementId) -> Option<Element> {
        self.inner.read().elements.get(&id).cloned()
    }

    pub fn children(&self, id: ElementId) -> Vec<ElementId> {
        self.inner
            .read()
            .elements
            .get(&id)
            .map(|e| e.children.clone())
            .unwrap_or_default()
    }

    /// Descendants of `root` carrying `class`, in document order
    pub fn descendants_with_class(&self, root: ElementId, class: &str) -> Vec<ElementId> {
        let inner = self.inner.read();
        let mut found = Vec::new();
        let mut stack = vec![root];

        while let Some(id) = stack.pop() {
            let Some(element) = inner.elements.get(&id) else {
                continue;
            };
            if id != root && element.has_class(class) {
                found.push(id);
            }
            stack.extend(element.children.iter().rev().copied());
        }

        found
    }

    pub fn element_count(&self) -> usize {
        self.inner.read().elements.len()
    }

    /// Attach a click listener; fails for elements not in the document
    pub fn add_click_listener(&self, id: ElementId, listener: ClickListener) -> bool {
        let mut inner = self.inner.write();
        if !inner.elements.contains_key(&id) {
            return false;
        }
        inner.listeners.entry(id).or_default().push(listener);
        true
    }

    pub fn listener_count(&self, id: ElementId) -> usize {
        self.inner.read().listeners.get(&id).map(Vec::len).unwrap_or(0)
    }

    /// Deliver a click on `target`, bubbling through its ancestors
    ///
    /// Listeners are collected first and invoked after the lock is released,
    /// so a listener may read or mutate the document. Returns the number of
    /// listeners invoked.
    pub fn dispatch_click(&self, target: ElementId) -> usize {
        let listeners: Vec<ClickListener> = {
            let inner = self.inner.read();
            let mut collected = Vec::new();
            let mut current = inner.elements.contains_key(&target).then_some(target);
            while let Some(id) = current {
                if let Some(attached) = inner.listeners.get(&id) {
                    collected.extend(attached.iter().cloned());
                }
                current = inner.elements.get(&id).and_then(|e| e.parent);
            }
            collected
        };

        for listener in &listeners {
            listener(target);
        }
        listeners.len()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("body", &self.body)
            .field("elements", &self.element_count())
            .finish()
    }
}

/// Mutable view of the document inside [`Document::batch`]
pub struct DomBatch<'a> {
    inner: &'a mut DocumentInner,
}

impl DomBatch<'_> {
    pub fn create_element(&mut self, tag: &str) -> ElementId {
        self.inner.create(tag)
    }

    /// Create an element with classes and append it to `parent`
    pub fn append_new(&mut self, parent: ElementId, tag: &str, classes: &[&str]) -> ElementId {
        let id = self.inner.create(tag);
        for class in classes {
            self.add_class(id, class);
        }
        self.append_child(parent, id);
        id
    }

    /// Move `child` under `parent`; both must exist and `child` must not be an ancestor of `parent`
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) -> bool {
        if parent == child
            || !self.inner.elements.contains_key(&parent)
            || !self.inner.elements.contains_key(&child)
            || self.inner.is_ancestor(child, parent)
        {
            return false;
        }

        self.inner.detach(child);
        if let Some(element) = self.inner.elements.get_mut(&child) {
            element.parent = Some(parent);
        }
        if let Some(element) = self.inner.elements.get_mut(&parent) {
            element.children.push(child);
        }
        true
    }

    pub fn add_class(&mut self, id: ElementId, class: &str) {
        if let Some(element) = self.inner.elements.get_mut(&id) {
            if !class.is_empty() && !element.has_class(class) {
                element.classes.push(class.to_string());
            }
        }
    }

    pub fn set_text(&mut self, id: ElementId, text: impl Into<String>) {
        if let Some(element) = self.inner.elements.get_mut(&id) {
            element.text = Some(text.into());
        }
    }

    pub fn set_attribute(&mut self, id: ElementId, name: &str, value: impl Into<String>) {
        if let Some(element) = self.inner.elements.get_mut(&id) {
            element.attributes.insert(name.to_string(), value.into());
        }
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.inner.elements.contains_key(&id)
    }

    /// Remove an element with its subtree and listeners
    pub fn remove(&mut self, id: ElementId) -> bool {
        if !self.inner.elements.contains_key(&id) {
            return false;
        }
        self.inner.detach(id);
        self.inner.drop_subtree(id);
        true
    }

    /// Remove every child subtree of `id`, keeping `id` itself
    pub fn remove_children(&mut self, id: ElementId) {
        let children = match self.inner.elements.get_mut(&id) {
            Some(element) => std::mem::take(&mut element.children),
            None => return,
        };
        for child in children {
            self.inner.drop_subtree(child);
        }
    }
}

impl DocumentInner {
    fn create(&mut self, tag: &str) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.elements.insert(id, Element::new(tag));
        id
    }

    fn is_ancestor(&self, candidate: ElementId, of: ElementId) -> bool {
        let mut current = self.elements.get(&of).and_then(|e| e.parent);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.elements.get(&id).and_then(|e| e.parent);
        }
        false
    }

    fn detach(&mut self, id: ElementId) {
        let parent = self.elements.get_mut(&id).and_then(|e| e.parent.take());
        if let Some(parent) = parent.and_then(|p| self.elements.get_mut(&p)) {
            parent.children.retain(|c| *c != id);
        }
    }

    fn drop_subtree(&mut self, root: ElementId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            self.listeners.remove(&id);
            if let Some(element) = self.elements.remove(&id) {
                stack.extend(element.children);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_tree_building() {
        let doc = Document::new();
        let (list, first, second) = doc.batch(|dom| {
            let list = dom.append_new(doc.body(), "ul", &["list"]);
            let first = dom.append_new(list, "li", &["entry"]);
            let second = dom.append_new(list, "li", &["entry", "last"]);
            dom.set_text(second, "two");
            dom.set_attribute(second, "data-id", "2");
            (list, first, second)
        });

        assert_eq!(doc.children(list), vec![first, second]);
        assert_eq!(doc.descendants_with_class(doc.body(), "entry"), vec![first, second]);
        let element = doc.element(second).unwrap();
        assert!(element.has_class("last"));
        assert_eq!(element.text.as_deref(), Some("two"));
        assert_eq!(element.attribute("data-id"), Some("2"));
        assert_eq!(element.parent, Some(list));
    }

    #[test]
    fn test_remove_drops_subtree_and_listeners() {
        let doc = Document::new();
        let (list, item) = doc.batch(|dom| {
            let list = dom.append_new(doc.body(), "ul", &[]);
            let item = dom.append_new(list, "li", &[]);
            (list, item)
        });
        assert!(doc.add_click_listener(item, Arc::new(|_: ElementId| {})));

        assert!(doc.remove(list));
        assert!(!doc.contains(item));
        assert_eq!(doc.listener_count(item), 0);
        assert!(doc.children(doc.body()).is_empty());
        assert!(!doc.add_click_listener(item, Arc::new(|_: ElementId| {})));
        assert_eq!(doc.element_count(), 1);
    }

    #[test]
    fn test_ids_are_not_reused() {
        let doc = Document::new();
        let first = doc.create_element("div");
        doc.remove(first);
        let second = doc.create_element("div");
        assert_ne!(first, second);
    }

    #[test]
    fn test_append_rejects_cycles() {
        let doc = Document::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("div");
        assert!(doc.append_child(outer, inner));
        assert!(!doc.append_child(inner, outer));
        assert!(!doc.append_child(outer, outer));
    }

    #[test]
    fn test_click_bubbles_with_clicked_target() {
        let doc = Document::new();
        let (outer, inner) = doc.batch(|dom| {
            let outer = dom.append_new(doc.body(), "div", &[]);
            let inner = dom.append_new(outer, "span", &[]);
            (outer, inner)
        });

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        doc.add_click_listener(outer, Arc::new(move |target: ElementId| {
            assert_eq!(target, inner);
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(doc.dispatch_click(inner), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listener_may_mutate_document() {
        let doc = Arc::new(Document::new());
        let button = doc.batch(|dom| dom.append_new(doc.body(), "button", &[]));

        let handle = doc.clone();
        doc.add_click_listener(button, Arc::new(move |target: ElementId| {
            handle.remove(target);
        }));

        assert_eq!(doc.dispatch_click(button), 1);
        assert!(!doc.contains(button));
        assert_eq!(doc.dispatch_click(button), 0);
    }
}
