//! Desktop host for the timeline visual
//!
//! Plays the part of the report host: owns the document, issues selection
//! handles, collects selection requests and feeds the visual updates.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use chrono::{TimeZone, Utc};
use eframe::egui::{self, Context};
use parking_lot::Mutex;
use tracing::{error, info};

use tl_core::events::events::{ItemSelected, TimelineRendered, UpdateAborted};
use tl_core::{
    AxisOrientation, RenderOptions, RowSelectionFactory, SelectionHandle, SelectionManager,
    VisualSettings,
};
use tl_data::sources::{dispatch_sample, load_csv_path, SampleSpec};
use tl_data::CategoricalView;
use tl_render::{Document, HostElement};
use tl_visual::{HostServices, TimelineVisual, VisualUpdate};

mod canvas;

/// Counts the selection requests the visual issues
#[derive(Default)]
struct HostSelection {
    requests: AtomicUsize,
}

impl SelectionManager for HostSelection {
    fn request_select(&self, handle: &SelectionHandle) {
        info!("Host selected {}", handle);
        self.requests.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Debug, Default)]
struct Status {
    last_render: Option<TimelineRendered>,
    last_abort: Option<String>,
    last_selected: Option<String>,
}

enum DataSource {
    Csv(PathBuf),
    Sample(u64),
}

struct TimelineApp {
    document: Arc<Document>,
    visual: TimelineVisual,
    selection: Arc<HostSelection>,
    source: DataSource,
    options: RenderOptions,
    /// Set when the visual needs a fresh update on the next frame
    needs_update: bool,
    status: Arc<Mutex<Status>>,
}

impl TimelineApp {
    fn new(_cc: &eframe::CreationContext<'_>, csv: Option<PathBuf>) -> Self {
        let selection = Arc::new(HostSelection::default());
        let visual = TimelineVisual::new(HostServices {
            selection_factory: Arc::new(RowSelectionFactory::new()),
            selection_manager: selection.clone(),
        });

        let status = Arc::new(Mutex::new(Status::default()));
        let sink = status.clone();
        visual
            .events()
            .on::<TimelineRendered, _>(move |e| sink.lock().last_render = Some(e.clone()));
        let sink = status.clone();
        visual
            .events()
            .on::<UpdateAborted, _>(move |e| sink.lock().last_abort = Some(e.reason.clone()));
        let sink = status.clone();
        visual
            .events()
            .on::<ItemSelected, _>(move |e| sink.lock().last_selected = Some(e.selection_key.clone()));

        Self {
            document: Arc::new(Document::new()),
            visual,
            selection,
            source: csv.map_or(DataSource::Sample(42), DataSource::Csv),
            options: RenderOptions::default(),
            needs_update: true,
            status,
        }
    }

    fn load_dataset(&self) -> Option<CategoricalView> {
        match &self.source {
            DataSource::Csv(path) => match load_csv_path(path) {
                Ok(view) => Some(view),
                Err(e) => {
                    error!("Failed to load {}: {}", path.display(), e);
                    None
                }
            },
            DataSource::Sample(seed) => {
                let origin = Utc.with_ymd_and_hms(2024, 1, 1, 6, 0, 0).single()?;
                Some(dispatch_sample(&SampleSpec::new(origin).with_seed(*seed)))
            }
        }
    }

    fn push_update(&mut self) {
        let config = VisualSettings {
            timeline: self.options.clone(),
        }
        .to_value();
        let mut update = VisualUpdate::new()
            .with_parent(HostElement::new(self.document.clone(), self.document.body()))
            .with_config(config);
        if let Some(dataset) = self.load_dataset() {
            update = update.with_dataset(dataset);
        }

        let outcome = self.visual.update(update);
        info!("Update {}: {:?}", self.visual.update_count(), outcome);
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let reload_label = match self.source {
                DataSource::Csv(_) => "Reload CSV",
                DataSource::Sample(_) => "New sample",
            };
            if ui.button(reload_label).clicked() {
                if let DataSource::Sample(seed) = &mut self.source {
                    *seed = seed.wrapping_add(1);
                }
                self.needs_update = true;
            }

            ui.separator();
            if ui.checkbox(&mut self.options.stack_items, "Stack items").changed() {
                self.needs_update = true;
            }

            let mut bottom = self.options.orientation == AxisOrientation::Bottom;
            if ui.checkbox(&mut bottom, "Axis at bottom").changed() {
                self.options.orientation = if bottom {
                    AxisOrientation::Bottom
                } else {
                    AxisOrientation::Top
                };
                self.needs_update = true;
            }

            ui.separator();
            ui.label("Item margin");
            if ui
                .add(egui::Slider::new(&mut self.options.item_margin, 0.0..=30.0))
                .changed()
            {
                self.needs_update = true;
            }
        });
    }

    fn status_bar(&self, ui: &mut egui::Ui) {
        let status = self.status.lock();
        ui.horizontal(|ui| {
            ui.label(format!("Updates: {}", self.visual.update_count()));
            if let Some(render) = &status.last_render {
                ui.separator();
                ui.label(format!(
                    "{} items, {} groups, {} without a valid range",
                    render.item_count, render.group_count, render.invalid_range_count
                ));
            }
            if let Some(reason) = &status.last_abort {
                ui.separator();
                ui.colored_label(egui::Color32::YELLOW, format!("Last aborted update: {}", reason));
            }
            ui.separator();
            match &status.last_selected {
                Some(key) => ui.label(format!(
                    "Selected: {} ({} requests)",
                    key,
                    self.selection.requests.load(Ordering::Relaxed)
                )),
                None => ui.label("Nothing selected"),
            };
        });
    }
}

impl eframe::App for TimelineApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        // Updates are only issued here, never from inside a click dispatch
        if self.needs_update {
            self.needs_update = false;
            self.push_update();
        }

        egui::TopBottomPanel::top("controls").show(ctx, |ui| self.controls(ui));
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| self.status_bar(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(container) = self.visual.surface().container() else {
                ui.label("Waiting for a container");
                return;
            };
            let Some(frame) = canvas::read_frame(&self.document, container) else {
                return;
            };

            egui::ScrollArea::vertical().show(ui, |ui| {
                if let Some(element) = canvas::paint(ui, &frame) {
                    self.document.dispatch_click(element);
                }
            });
        });
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let csv = std::env::args().nth(1).map(PathBuf::from);
    match &csv {
        Some(path) => info!("Starting timeline visual with {}", path.display()),
        None => info!("Starting timeline visual with generated dispatch data"),
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 700.0])
            .with_min_inner_size([640.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Timeline Visual",
        options,
        Box::new(move |cc| Box::new(TimelineApp::new(cc, csv))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run app: {}", e))?;

    Ok(())
}
