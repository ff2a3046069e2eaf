//! Lane assignment, stacking levels and the visible window

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tl_core::RenderOptions;
use tl_data::{Group, Item};

/// Height of one item row in logical pixels
pub const ITEM_HEIGHT: f32 = 20.0;

/// An item's position within its lane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedItem {
    /// Index into the rendered item slice
    pub index: usize,
    pub level: usize,
    pub top: f32,
}

/// One horizontal lane
#[derive(Debug, Clone, PartialEq)]
pub struct LaneLayout {
    /// `None` for the implicit lane holding ungrouped items
    pub group: Option<String>,
    pub label: String,
    pub items: Vec<PlacedItem>,
    pub levels: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineLayout {
    pub lanes: Vec<LaneLayout>,
    pub window: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

/// Place items into lanes and compute their levels
///
/// Lanes follow `groups` order. Items without a known group share an
/// implicit lane, which comes last; with no groups it is the only lane.
pub fn lay_out(items: &[Item], groups: &[Group], options: &RenderOptions) -> TimelineLayout {
    let mut members: IndexMap<Option<&str>, (String, Vec<usize>)> = IndexMap::new();
    for group in groups {
        members.insert(Some(group.id.as_str()), (group.content.clone(), Vec::new()));
    }

    for (index, item) in items.iter().enumerate() {
        let key = item.group.as_deref().filter(|g| members.contains_key(&Some(*g)));
        members
            .entry(key)
            .or_insert_with(|| (String::new(), Vec::new()))
            .1
            .push(index);
    }

    if members.is_empty() {
        members.insert(None, (String::new(), Vec::new()));
    }

    let lanes = members
        .into_iter()
        .map(|(group, (label, indices))| {
            let levels = assign_levels(items, &indices, options.stack_items);
            let level_count = levels.iter().copied().max().map_or(1, |m| m + 1);
            LaneLayout {
                group: group.map(str::to_string),
                label,
                items: indices
                    .iter()
                    .zip(levels)
                    .map(|(&index, level)| PlacedItem {
                        index,
                        level,
                        top: item_top(level, options),
                    })
                    .collect(),
                levels: level_count,
            }
        })
        .collect();

    TimelineLayout {
        lanes,
        window: visible_window(items, options),
    }
}

/// Vertical offset of a level within its lane
pub fn item_top(level: usize, options: &RenderOptions) -> f32 {
    options.axis_margin + level as f32 * (ITEM_HEIGHT + options.item_margin)
}

/// Greedy first-fit levels for the items at `indices`, returned in `indices` order
///
/// Without stacking, or for items lacking a valid range, the level is 0.
fn assign_levels(items: &[Item], indices: &[usize], stack: bool) -> Vec<usize> {
    let mut levels = vec![0; indices.len()];
    if !stack {
        return levels;
    }

    let mut ranged: Vec<(usize, DateTime<Utc>, DateTime<Utc>)> = indices
        .iter()
        .enumerate()
        .filter_map(|(slot, &index)| {
            let (a, b) = items[index].range()?;
            Some((slot, a.min(b), a.max(b)))
        })
        .collect();
    ranged.sort_by_key(|&(slot, start, _)| (start, slot));

    let mut level_ends: Vec<DateTime<Utc>> = Vec::new();
    for (slot, start, end) in ranged {
        match level_ends.iter().position(|&free_at| free_at <= start) {
            Some(level) => {
                level_ends[level] = end;
                levels[slot] = level;
            }
            None => {
                level_ends.push(end);
                levels[slot] = level_ends.len() - 1;
            }
        }
    }

    levels
}

/// Configured window, with absent bounds fitted to the valid items
fn visible_window(items: &[Item], options: &RenderOptions) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let ranges = items.iter().filter_map(Item::range);
    let extent = ranges.fold(None, |acc: Option<(DateTime<Utc>, DateTime<Utc>)>, (a, b)| {
        let (lo, hi) = (a.min(b), a.max(b));
        Some(match acc {
            Some((start, end)) => (start.min(lo), end.max(hi)),
            None => (lo, hi),
        })
    });

    let start = options.view_start.or(extent.map(|(s, _)| s))?;
    let end = options.view_end.or(extent.map(|(_, e)| e))?;
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tl_core::SelectionHandle;
    use tl_data::TimeValue;

    fn hour(h: u32) -> TimeValue {
        TimeValue::At(Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap())
    }

    fn item(row: usize, start: TimeValue, end: TimeValue, group: Option<&str>) -> Item {
        Item {
            id: row.to_string(),
            start,
            end,
            content: format!("Order {}", row),
            style_class: String::new(),
            group: group.map(str::to_string),
            row,
            selection: SelectionHandle::from_host_key(format!("row#{}", row)),
        }
    }

    fn group(id: &str) -> Group {
        Group {
            id: id.to_string(),
            content: id.to_string(),
        }
    }

    #[test]
    fn test_single_implicit_lane() {
        let items = vec![item(0, hour(0), hour(2), None), item(1, hour(1), hour(3), None)];
        let layout = lay_out(&items, &[], &RenderOptions::default());

        assert_eq!(layout.lanes.len(), 1);
        assert_eq!(layout.lanes[0].group, None);
        assert_eq!(layout.lanes[0].levels, 1);
        assert!(layout.lanes[0].items.iter().all(|p| p.level == 0));
    }

    #[test]
    fn test_empty_items_still_have_a_lane() {
        let layout = lay_out(&[], &[], &RenderOptions::default());
        assert_eq!(layout.lanes.len(), 1);
        assert!(layout.lanes[0].items.is_empty());
        assert_eq!(layout.window, None);
    }

    #[test]
    fn test_stacking_levels_overlaps_only() {
        let items = vec![
            item(0, hour(0), hour(2), None),
            item(1, hour(1), hour(3), None),
            item(2, hour(2), hour(4), None),
            item(3, hour(1), TimeValue::Malformed("?".into()), None),
        ];
        let options = RenderOptions {
            stack_items: true,
            ..Default::default()
        };
        let layout = lay_out(&items, &[], &options);

        let levels: Vec<usize> = layout.lanes[0].items.iter().map(|p| p.level).collect();
        assert_eq!(levels, vec![0, 1, 0, 0]);
        assert_eq!(layout.lanes[0].levels, 2);
        assert_eq!(layout.lanes[0].items[1].top, 5.0 + 20.0 + 10.0);
    }

    #[test]
    fn test_group_lanes_and_ungrouped_last() {
        let items = vec![
            item(0, hour(0), hour(1), Some("Truck 2")),
            item(1, hour(0), hour(1), None),
            item(2, hour(0), hour(1), Some("Truck 1")),
            item(3, hour(0), hour(1), Some("Unknown")),
        ];
        let groups = vec![group("Truck 1"), group("Truck 2")];
        let layout = lay_out(&items, &groups, &RenderOptions::default());

        let lanes: Vec<Option<&str>> = layout.lanes.iter().map(|l| l.group.as_deref()).collect();
        assert_eq!(lanes, vec![Some("Truck 1"), Some("Truck 2"), None]);
        let ungrouped: Vec<usize> = layout.lanes[2].items.iter().map(|p| p.index).collect();
        assert_eq!(ungrouped, vec![1, 3]);
    }

    #[test]
    fn test_window_fits_items_unless_configured() {
        let items = vec![item(0, hour(3), hour(5), None), item(1, hour(1), hour(2), None)];
        let fitted = lay_out(&items, &[], &RenderOptions::default());
        assert_eq!(fitted.window, Some((hour(1).timestamp().unwrap(), hour(5).timestamp().unwrap())));

        let options = RenderOptions {
            view_start: hour(0).timestamp(),
            ..Default::default()
        };
        let configured = lay_out(&items, &[], &options);
        assert_eq!(configured.window, Some((hour(0).timestamp().unwrap(), hour(5).timestamp().unwrap())));
    }
}
