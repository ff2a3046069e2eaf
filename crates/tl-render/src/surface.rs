//! Timeline surface: the one container the visual renders into
//!
//! The surface keeps an owned reference to its container instead of looking
//! it up in the document, so several visuals can share a document without
//! stepping on each other.

use std::sync::Arc;

use tl_core::{AxisOrientation, RenderOptions};
use tl_data::{Group, Item};
use tracing::{debug, info, warn};

use crate::dom::{Document, DomBatch, ElementId};
use crate::layout::{lay_out, LaneLayout, TimelineLayout};

pub const CONTAINER_CLASS: &str = "vis-timeline";
pub const AXIS_CLASS: &str = "vis-time-axis";
pub const ITEMSET_CLASS: &str = "vis-itemset";
pub const GROUP_CLASS: &str = "vis-group";
pub const ITEM_CLASS: &str = "vis-item";
pub const RANGE_CLASS: &str = "vis-range";
pub const INVALID_RANGE_CLASS: &str = "vis-invalid-range";

/// An element supplied by the host, e.g. the visual's root element
#[derive(Debug, Clone)]
pub struct HostElement {
    document: Arc<Document>,
    id: ElementId,
}

impl HostElement {
    pub fn new(document: Arc<Document>, id: ElementId) -> Self {
        Self { document, id }
    }

    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    fn same_as(&self, other: &HostElement) -> bool {
        Arc::ptr_eq(&self.document, &other.document) && self.id == other.id
    }
}

/// A rendered item element and the index of the item it shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderedItem {
    pub element: ElementId,
    pub index: usize,
}

/// Result of one render pass
#[derive(Debug, Clone)]
pub struct RenderedFrame {
    pub container: ElementId,
    pub items: Vec<RenderedItem>,
    pub lanes: usize,
}

#[derive(Debug)]
struct Mounted {
    parent: HostElement,
    container: ElementId,
}

/// Owns the mounted container and the live item elements
#[derive(Debug, Default)]
pub struct TimelineSurface {
    mounted: Option<Mounted>,
    live: Vec<RenderedItem>,
    render_count: u64,
}

impl TimelineSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    pub fn container(&self) -> Option<ElementId> {
        self.mounted.as_ref().map(|m| m.container)
    }

    pub fn document(&self) -> Option<&Arc<Document>> {
        self.mounted.as_ref().map(|m| m.parent.document())
    }

    /// Item elements of the latest render
    pub fn live_items(&self) -> &[RenderedItem] {
        &self.live
    }

    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    /// Attach a container under `parent`
    ///
    /// Absent parents are ignored. Mounting again under the same parent keeps
    /// the existing container and its content until the next render; a
    /// different parent gets a fresh container and the old one is removed.
    pub fn mount(&mut self, parent: Option<&HostElement>) -> Option<ElementId> {
        let Some(parent) = parent else {
            debug!("No container parent yet, mount skipped");
            return self.container();
        };

        if !parent.document.contains(parent.id) {
            warn!("Container parent {:?} is not in its document, mount skipped", parent.id);
            return self.container();
        }

        if let Some(mounted) = self.mounted.take() {
            if mounted.parent.same_as(parent) && parent.document.contains(mounted.container) {
                let container = mounted.container;
                self.mounted = Some(mounted);
                return Some(container);
            }
            mounted.parent.document.remove(mounted.container);
        }

        self.live.clear();
        let container = parent.document.batch(|dom| dom.append_new(parent.id, "div", &[CONTAINER_CLASS]));
        self.mounted = Some(Mounted {
            parent: parent.clone(),
            container,
        });

        info!("Mounted timeline container {:?}", container);
        Some(container)
    }

    /// Clear everything rendered into the container
    pub fn reset(&mut self) {
        self.live.clear();
        if let Some(mounted) = &self.mounted {
            mounted.parent.document.batch(|dom| dom.remove_children(mounted.container));
        }
    }

    /// Replace the rendered content with `items`
    ///
    /// Teardown and rebuild happen in one document batch. Returns `None` when
    /// nothing is mounted.
    pub fn render(&mut self, items: &[Item], groups: &[Group], options: &RenderOptions) -> Option<RenderedFrame> {
        let Some(mounted) = &self.mounted else {
            debug!("Render skipped, no container mounted");
            return None;
        };

        if !mounted.parent.document.contains(mounted.container) {
            // The host cleared our container; put a new one under the same parent
            let parent = mounted.parent.clone();
            self.mounted = None;
            self.mount(Some(&parent))?;
        }

        let mounted = self.mounted.as_ref()?;
        let layout = lay_out(items, groups, options);
        let container = mounted.container;

        let frame = mounted.parent.document.batch(|dom| {
            dom.remove_children(container);
            build(dom, container, items, &layout, options)
        });

        self.live = frame.items.clone();
        self.render_count += 1;
        debug!(
            "Rendered {} items in {} lanes (render #{})",
            frame.items.len(),
            frame.lanes,
            self.render_count
        );

        Some(frame)
    }
}

fn build(
    dom: &mut DomBatch<'_>,
    container: ElementId,
    items: &[Item],
    layout: &TimelineLayout,
    options: &RenderOptions,
) -> RenderedFrame {
    dom.set_attribute(container, "data-orientation", options.orientation.as_str());
    dom.set_attribute(container, "data-stack", options.stack_items.to_string());
    dom.set_attribute(container, "data-editable", options.editable.to_string());
    dom.set_attribute(container, "data-item-margin", options.item_margin.to_string());
    dom.set_attribute(container, "data-axis-margin", options.axis_margin.to_string());

    let axis_first = options.orientation == AxisOrientation::Top;
    if axis_first {
        build_axis(dom, container, layout);
    }

    let itemset = dom.append_new(container, "div", &[ITEMSET_CLASS]);
    let mut rendered = Vec::with_capacity(items.len());
    for lane in &layout.lanes {
        build_lane(dom, itemset, lane, items, &mut rendered);
    }

    if !axis_first {
        build_axis(dom, container, layout);
    }

    RenderedFrame {
        container,
        items: rendered,
        lanes: layout.lanes.len(),
    }
}

fn build_axis(dom: &mut DomBatch<'_>, container: ElementId, layout: &TimelineLayout) {
    let axis = dom.append_new(container, "div", &[AXIS_CLASS]);
    if let Some((start, end)) = layout.window {
        dom.set_attribute(axis, "data-view-start", start.to_rfc3339());
        dom.set_attribute(axis, "data-view-end", end.to_rfc3339());
    }
}

fn build_lane(
    dom: &mut DomBatch<'_>,
    itemset: ElementId,
    lane: &LaneLayout,
    items: &[Item],
    rendered: &mut Vec<RenderedItem>,
) {
    let lane_element = dom.append_new(itemset, "div", &[GROUP_CLASS]);
    dom.set_attribute(lane_element, "data-group", lane.group.clone().unwrap_or_default());
    dom.set_attribute(lane_element, "data-label", lane.label.clone());
    dom.set_attribute(lane_element, "data-levels", lane.levels.to_string());

    for placed in &lane.items {
        let item = &items[placed.index];
        let element = dom.append_new(lane_element, "div", &[ITEM_CLASS, RANGE_CLASS]);
        for class in item.style_class.split_whitespace() {
            dom.add_class(element, class);
        }
        if !item.has_valid_range() {
            dom.add_class(element, INVALID_RANGE_CLASS);
        }
        dom.set_text(element, item.content.clone());
        dom.set_attribute(element, "data-id", item.id.clone());
        dom.set_attribute(element, "data-start", item.start.to_attribute());
        dom.set_attribute(element, "data-end", item.end.to_attribute());
        dom.set_attribute(element, "data-level", placed.level.to_string());
        dom.set_attribute(element, "data-top", placed.top.to_string());

        rendered.push(RenderedItem {
            element,
            index: placed.index,
        });
    }
}
