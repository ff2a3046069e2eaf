//! Sample dispatch data: trucks carrying consecutive orders
//!
//! Each truck gets its own lane. Orders on a truck follow each other with a
//! random gap of up to four hours and last between two and five whole hours.

use std::sync::Arc;

use arrow::array::{ArrayRef, Int64Array, StringArray, TimestampMillisecondArray};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::dataset::CategoricalView;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Shape of the generated dataset
#[derive(Debug, Clone)]
pub struct SampleSpec {
    pub trucks: usize,
    pub orders_per_truck: usize,
    /// Departure of every truck's first order window
    pub origin: DateTime<Utc>,
    pub seed: u64,
}

impl SampleSpec {
    pub fn new(origin: DateTime<Utc>) -> Self {
        Self {
            trucks: 4,
            orders_per_truck: 25,
            origin,
            seed: 0,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Generate a dispatch dataset bound as id, start, end, label, style, truck
pub fn dispatch_sample(spec: &SampleSpec) -> CategoricalView {
    let mut rng = StdRng::seed_from_u64(spec.seed);
    let capacity = spec.trucks * spec.orders_per_truck;

    let mut ids = Vec::with_capacity(capacity);
    let mut starts = Vec::with_capacity(capacity);
    let mut ends = Vec::with_capacity(capacity);
    let mut labels = Vec::with_capacity(capacity);
    let mut styles = Vec::with_capacity(capacity);
    let mut trucks = Vec::with_capacity(capacity);

    let mut order: i64 = 1;
    for truck in 1..=spec.trucks {
        let mut cursor = spec.origin;
        for _ in 0..spec.orders_per_truck {
            let gap = rng.gen::<f64>() * 4.0 * MILLIS_PER_HOUR;
            let start = cursor + Duration::milliseconds(gap as i64);
            let end = start + Duration::hours(2 + rng.gen_range(0..4));

            ids.push(order);
            starts.push(start.timestamp_millis());
            ends.push(end.timestamp_millis());
            labels.push(format!("Order {}", order));
            styles.push(format!("truck-{}", truck));
            trucks.push(format!("Truck {}", truck));

            cursor = end;
            order += 1;
        }
    }

    CategoricalView::from_arrays(vec![
        ("Order", Arc::new(Int64Array::from(ids)) as ArrayRef),
        ("Start", Arc::new(TimestampMillisecondArray::from(starts)) as ArrayRef),
        ("End", Arc::new(TimestampMillisecondArray::from(ends)) as ArrayRef),
        ("Label", Arc::new(StringArray::from(labels)) as ArrayRef),
        ("Style", Arc::new(StringArray::from(styles)) as ArrayRef),
        ("Truck", Arc::new(StringArray::from(trucks)) as ArrayRef),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::RowMapper;
    use chrono::TimeZone;
    use tl_core::RowSelectionFactory;

    fn origin() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 6, 0, 0).unwrap()
    }

    #[test]
    fn test_default_shape() {
        let view = dispatch_sample(&SampleSpec::new(origin()));
        let mapped = RowMapper::new().map(&view, &RowSelectionFactory::new()).unwrap();

        assert_eq!(mapped.items.len(), 100);
        assert_eq!(mapped.groups.len(), 4);
        assert_eq!(mapped.groups[0].id, "Truck 1");
        assert_eq!(mapped.items[99].content, "Order 100");
        assert_eq!(mapped.invalid_range_count(), 0);
    }

    #[test]
    fn test_orders_on_a_truck_do_not_overlap() {
        let view = dispatch_sample(&SampleSpec::new(origin()).with_seed(7));
        let mapped = RowMapper::new().map(&view, &RowSelectionFactory::new()).unwrap();

        for pair in mapped.items.windows(2) {
            if pair[0].group != pair[1].group {
                continue;
            }
            let (_, previous_end) = pair[0].range().unwrap();
            let (next_start, next_end) = pair[1].range().unwrap();
            assert!(previous_end <= next_start);
            let hours = (next_end - next_start).num_hours();
            assert!((2..=5).contains(&hours));
        }
    }

    #[test]
    fn test_same_seed_same_data() {
        let spec = SampleSpec::new(origin()).with_seed(42);
        let factory = RowSelectionFactory::new();
        let a = RowMapper::new().map(&dispatch_sample(&spec), &factory).unwrap();
        let b = RowMapper::new().map(&dispatch_sample(&spec), &factory).unwrap();
        assert_eq!(a.items, b.items);
    }
}
