//! The timeline visual: drives one full re-render per host update
//!
//! Each update re-reads the settings, maps the whole snapshot, replaces the
//! rendered content and rebinds selection. Nothing is diffed against the
//! previous snapshot, and no failure is returned to the host: problems end
//! up in the log and in the returned [`UpdateOutcome`].

use std::sync::Arc;

use serde_json::Value;
use tl_core::events::events::{TimelineRendered, UpdateAborted, UpdateSkipped};
use tl_core::{EventBus, SelectionHandleFactory, SelectionManager, VisualSettings};
use tl_data::{CategoricalView, DataError, Item, MappedTimeline, RowMapper};
use tl_render::{HostElement, TimelineSurface};
use tracing::{debug, info, warn};

use crate::selection::SelectionBridge;

/// Services the host provides when it constructs the visual
#[derive(Clone)]
pub struct HostServices {
    pub selection_factory: Arc<dyn SelectionHandleFactory>,
    pub selection_manager: Arc<dyn SelectionManager>,
}

/// One update notification from the host
#[derive(Debug, Clone, Default)]
pub struct VisualUpdate {
    pub dataset: Option<CategoricalView>,
    /// Element to mount under; may be absent early in the host's lifecycle
    pub container_parent: Option<HostElement>,
    /// Property-pane values as stored by the host
    pub config: Option<Value>,
}

impl VisualUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(mut self, dataset: CategoricalView) -> Self {
        self.dataset = Some(dataset);
        self
    }

    pub fn with_parent(mut self, parent: HostElement) -> Self {
        self.container_parent = Some(parent);
        self
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = Some(config);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualState {
    /// No container mounted yet
    Uninitialized,
    Ready,
}

/// What an update did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// No container parent yet; nothing rendered
    Deferred,
    Rendered { items: usize, lanes: usize },
    /// Input was missing; an empty timeline is shown
    RenderedEmpty,
    /// The cycle was abandoned and the previous render is still shown
    Aborted(String),
}

pub struct TimelineVisual {
    factory: Arc<dyn SelectionHandleFactory>,
    mapper: RowMapper,
    surface: TimelineSurface,
    bridge: SelectionBridge,
    settings: VisualSettings,
    state: VisualState,
    update_count: u64,
    live: MappedTimeline,
    events: Arc<EventBus>,
}

impl TimelineVisual {
    pub fn new(host: HostServices) -> Self {
        let events = Arc::new(EventBus::new());
        Self {
            factory: host.selection_factory,
            mapper: RowMapper::new(),
            surface: TimelineSurface::new(),
            bridge: SelectionBridge::new(host.selection_manager).with_events(events.clone()),
            settings: VisualSettings::default(),
            state: VisualState::Uninitialized,
            update_count: 0,
            live: MappedTimeline::default(),
            events,
        }
    }

    pub fn with_mapper(mut self, mapper: RowMapper) -> Self {
        self.mapper = mapper;
        self
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn state(&self) -> VisualState {
        self.state
    }

    /// Number of update notifications received so far
    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    pub fn settings(&self) -> &VisualSettings {
        &self.settings
    }

    pub fn surface(&self) -> &TimelineSurface {
        &self.surface
    }

    pub fn bridge(&self) -> &SelectionBridge {
        &self.bridge
    }

    /// Items currently shown
    pub fn items(&self) -> &[Item] {
        &self.live.items
    }

    /// Handle one update notification
    pub fn update(&mut self, update: VisualUpdate) -> UpdateOutcome {
        self.update_count += 1;
        let cycle = self.update_count;

        match VisualSettings::parse(update.config.as_ref()) {
            Ok(settings) => self.settings = settings,
            Err(err) => warn!("Update {}: ignoring invalid settings: {}", cycle, err),
        }

        if self.state == VisualState::Uninitialized {
            if self.surface.mount(update.container_parent.as_ref()).is_none() {
                debug!("Update {}: no container parent, waiting", cycle);
                self.events.publish(UpdateSkipped { update_count: cycle });
                return UpdateOutcome::Deferred;
            }
            self.state = VisualState::Ready;
            info!("Update {}: timeline visual ready", cycle);
        }

        let mapped = match &update.dataset {
            Some(dataset) => self.mapper.map(dataset, self.factory.as_ref()),
            None => Err(DataError::MissingInput("no dataset in update".to_string())),
        };

        let (mapped, empty) = match mapped {
            Ok(mapped) => (mapped, false),
            Err(DataError::MissingInput(reason)) => {
                debug!("Update {}: {}, rendering empty timeline", cycle, reason);
                (MappedTimeline::default(), true)
            }
            Err(err) => return self.abort(cycle, err.to_string()),
        };

        // Same parent keeps its container; render replaces the content in one batch
        if let Some(parent) = &update.container_parent {
            self.surface.mount(Some(parent));
        }

        let Some(frame) = self.surface.render(&mapped.items, &mapped.groups, &self.settings.timeline) else {
            self.state = VisualState::Uninitialized;
            return self.abort(cycle, "container is no longer available".to_string());
        };

        if let Some(document) = self.surface.document().cloned() {
            self.bridge.attach(&document, &frame, &mapped.items);
        }

        self.events.publish(TimelineRendered {
            update_count: cycle,
            item_count: frame.items.len(),
            group_count: mapped.groups.len(),
            invalid_range_count: mapped.invalid_range_count(),
        });
        self.live = mapped;

        if empty {
            UpdateOutcome::RenderedEmpty
        } else {
            UpdateOutcome::Rendered {
                items: frame.items.len(),
                lanes: frame.lanes,
            }
        }
    }

    fn abort(&self, cycle: u64, reason: String) -> UpdateOutcome {
        warn!("Update {} aborted, keeping previous render: {}", cycle, reason);
        self.events.publish(UpdateAborted {
            update_count: cycle,
            reason: reason.clone(),
        });
        UpdateOutcome::Aborted(reason)
    }
}

impl std::fmt::Debug for TimelineVisual {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimelineVisual")
            .field("state", &self.state)
            .field("update_count", &self.update_count)
            .field("items", &self.live.items.len())
            .field("surface", &self.surface)
            .field("bridge", &self.bridge)
            .finish()
    }
}
