//! Paints the rendered element tree with egui
//!
//! The visual only produces elements and attributes; this module reads them
//! back and draws lanes and item bars. Clicks are routed into the document so
//! they reach the listeners the visual attached.

use chrono::{DateTime, Utc};
use egui::{Align2, Color32, FontId, Pos2, Rect, Rounding, Sense, Stroke, Ui, Vec2};
use tl_render::surface::{AXIS_CLASS, GROUP_CLASS, INVALID_RANGE_CLASS, ITEM_CLASS};
use tl_render::{Document, Element, ElementId, ITEM_HEIGHT};

const LANE_LABEL_WIDTH: f32 = 90.0;
const AXIS_HEIGHT: f32 = 24.0;
const MIN_BAR_WIDTH: f32 = 4.0;

#[derive(Debug, Clone, PartialEq)]
pub struct CanvasItem {
    pub element: ElementId,
    pub text: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub top: f32,
    pub invalid: bool,
    pub style: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanvasLane {
    pub label: String,
    pub height: f32,
    pub items: Vec<CanvasItem>,
}

/// Snapshot of one rendered container
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CanvasFrame {
    pub window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub axis_on_top: bool,
    pub lanes: Vec<CanvasLane>,
}

fn parse_time(value: Option<&str>) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value?).ok().map(|t| t.with_timezone(&Utc))
}

fn parse_f32(element: &Element, name: &str) -> f32 {
    element.attribute(name).and_then(|v| v.parse().ok()).unwrap_or(0.0)
}

/// Read the container's rendered content back out of the document
pub fn read_frame(document: &Document, container: ElementId) -> Option<CanvasFrame> {
    let root = document.element(container)?;
    let item_margin = parse_f32(&root, "data-item-margin");
    let axis_margin = parse_f32(&root, "data-axis-margin");

    let window = document
        .descendants_with_class(container, AXIS_CLASS)
        .first()
        .and_then(|&axis| document.element(axis))
        .and_then(|axis| {
            let start = parse_time(axis.attribute("data-view-start"))?;
            let end = parse_time(axis.attribute("data-view-end"))?;
            Some((start, end))
        });

    let lanes = document
        .descendants_with_class(container, GROUP_CLASS)
        .into_iter()
        .filter_map(|lane| {
            let element = document.element(lane)?;
            let levels = element
                .attribute("data-levels")
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(1);
            let items = document
                .descendants_with_class(lane, ITEM_CLASS)
                .into_iter()
                .filter_map(|id| {
                    let item = document.element(id)?;
                    Some(CanvasItem {
                        element: id,
                        text: item.text.clone().unwrap_or_default(),
                        start: parse_time(item.attribute("data-start")),
                        end: parse_time(item.attribute("data-end")),
                        top: parse_f32(&item, "data-top"),
                        invalid: item.has_class(INVALID_RANGE_CLASS),
                        style: item.classes.get(2).filter(|c| c.as_str() != INVALID_RANGE_CLASS).cloned(),
                    })
                })
                .collect();
            Some(CanvasLane {
                label: element.attribute("data-label").unwrap_or_default().to_string(),
                height: axis_margin + levels as f32 * (ITEM_HEIGHT + item_margin),
                items,
            })
        })
        .collect();

    Some(CanvasFrame {
        window,
        axis_on_top: root.attribute("data-orientation") != Some("bottom"),
        lanes,
    })
}

/// Stable colour for a style class
fn style_color(style: Option<&str>) -> Color32 {
    const PALETTE: [Color32; 6] = [
        Color32::from_rgb(86, 156, 214),
        Color32::from_rgb(214, 157, 86),
        Color32::from_rgb(106, 190, 120),
        Color32::from_rgb(197, 112, 192),
        Color32::from_rgb(220, 110, 110),
        Color32::from_rgb(150, 150, 210),
    ];
    let Some(style) = style else {
        return PALETTE[0];
    };
    let hash = style.bytes().fold(0usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize));
    PALETTE[hash % PALETTE.len()]
}

/// Draw `frame` and return the element under a click, if any
pub fn paint(ui: &mut Ui, frame: &CanvasFrame) -> Option<ElementId> {
    let lanes_height: f32 = frame.lanes.iter().map(|l| l.height).sum();
    let size = Vec2::new(ui.available_width(), lanes_height + AXIS_HEIGHT);
    let (response, painter) = ui.allocate_painter(size, Sense::click());
    let rect = response.rect;
    let visuals = ui.visuals().clone();

    let (axis_rect, mut lane_top) = if frame.axis_on_top {
        let axis = Rect::from_min_size(rect.min, Vec2::new(rect.width(), AXIS_HEIGHT));
        (axis, rect.top() + AXIS_HEIGHT)
    } else {
        let axis = Rect::from_min_size(
            Pos2::new(rect.left(), rect.bottom() - AXIS_HEIGHT),
            Vec2::new(rect.width(), AXIS_HEIGHT),
        );
        (axis, rect.top())
    };

    let track_left = rect.left() + LANE_LABEL_WIDTH;
    let track_width = (rect.right() - track_left).max(1.0);
    let x_of = |t: DateTime<Utc>| -> Option<f32> {
        let (start, end) = frame.window?;
        let span = (end - start).num_milliseconds().max(1) as f32;
        let offset = (t - start).num_milliseconds() as f32;
        Some(track_left + offset / span * track_width)
    };

    painter.rect_filled(axis_rect, Rounding::ZERO, visuals.faint_bg_color);
    if let Some((start, end)) = frame.window {
        let font = FontId::proportional(11.0);
        let color = visuals.text_color();
        painter.text(
            Pos2::new(track_left, axis_rect.center().y),
            Align2::LEFT_CENTER,
            start.format("%Y-%m-%d %H:%M").to_string(),
            font.clone(),
            color,
        );
        painter.text(
            Pos2::new(rect.right() - 4.0, axis_rect.center().y),
            Align2::RIGHT_CENTER,
            end.format("%Y-%m-%d %H:%M").to_string(),
            font,
            color,
        );
    }

    let pointer = if response.clicked() {
        response.interact_pointer_pos()
    } else {
        None
    };
    let mut clicked = None;

    for lane in &frame.lanes {
        let lane_rect = Rect::from_min_size(Pos2::new(rect.left(), lane_top), Vec2::new(rect.width(), lane.height));
        painter.line_segment(
            [lane_rect.left_bottom(), lane_rect.right_bottom()],
            Stroke::new(1.0, visuals.widgets.noninteractive.bg_stroke.color),
        );
        painter.text(
            Pos2::new(rect.left() + 4.0, lane_rect.center().y),
            Align2::LEFT_CENTER,
            &lane.label,
            FontId::proportional(12.0),
            visuals.strong_text_color(),
        );

        for item in &lane.items {
            let y = lane_top + item.top;
            let (x0, x1) = match (item.start.and_then(x_of), item.end.and_then(x_of)) {
                (Some(a), Some(b)) => (a.min(b), a.max(b).max(a.min(b) + MIN_BAR_WIDTH)),
                // Items without a valid range sit at the left edge
                _ => (track_left, track_left + MIN_BAR_WIDTH * 3.0),
            };
            let bar = Rect::from_min_max(Pos2::new(x0, y), Pos2::new(x1, y + ITEM_HEIGHT));

            if item.invalid {
                painter.rect_stroke(bar, Rounding::same(3.0), Stroke::new(1.0, Color32::RED));
            } else {
                painter.rect_filled(bar, Rounding::same(3.0), style_color(item.style.as_deref()));
            }
            if bar.width() > 30.0 {
                painter.with_clip_rect(bar).text(
                    Pos2::new(bar.left() + 3.0, bar.center().y),
                    Align2::LEFT_CENTER,
                    &item.text,
                    FontId::proportional(11.0),
                    Color32::WHITE,
                );
            }

            if pointer.is_some_and(|p| bar.contains(p)) {
                clicked = Some(item.element);
            }
        }
        lane_top += lane.height;
    }

    clicked
}
