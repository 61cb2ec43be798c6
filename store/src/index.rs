use std::collections::HashMap;

use crate::structures::{PixelEvent, Rect};
use crate::timestamp::Timestamp;

/// Per-cell index into a timestamp-sorted event slice.
///
/// Each cell's vec holds indices in ascending timestamp order (ties in log
/// order), so latest-at-or-before is a binary search over one cell's
/// placements, not a scan of the whole log. u32 indices are plenty for one
/// canvas history.
#[derive(Debug, Default)]
pub(crate) struct PositionIndex {
    cells: HashMap<(u16, u16), Vec<u32>>,
}

impl PositionIndex {
    /// `events` must already be sorted by timestamp.
    pub fn build(events: &[PixelEvent]) -> Self {
        let mut cells: HashMap<(u16, u16), Vec<u32>> = HashMap::new();
        for (i, event) in events.iter().enumerate() {
            cells.entry((event.x, event.y)).or_default().push(i as u32);
        }
        PositionIndex { cells }
    }

    pub fn latest_at_or_before<'e>(
        &self,
        events: &'e [PixelEvent],
        x: u16,
        y: u16,
        t: Timestamp,
    ) -> Option<&'e PixelEvent> {
        let cell = self.cells.get(&(x, y))?;
        let n = cell.partition_point(|&i| events[i as usize].timestamp <= t);
        if n == 0 {
            None
        } else {
            Some(&events[cell[n - 1] as usize])
        }
    }
}

/// All events in `rect` with timestamp in the half-open range
/// `(t_start, t_end]`, ascending. `events` must be sorted by timestamp.
pub(crate) fn events_in<'e>(
    events: &'e [PixelEvent],
    rect: Rect,
    t_start: Timestamp,
    t_end: Timestamp,
) -> impl Iterator<Item = &'e PixelEvent> {
    let lo = events.partition_point(|e| e.timestamp <= t_start);
    let hi = events.partition_point(|e| e.timestamp <= t_end);
    events[lo..hi]
        .iter()
        .filter(move |e| rect.contains(e.x, e.y))
}

#[cfg(test)]
mod tests {
    use super::{events_in, PositionIndex};
    use crate::structures::{PixelEvent, Rect};
    use crate::timestamp::Timestamp;

    fn event(micros: i64, x: u16, y: u16, color_id: u16) -> PixelEvent {
        PixelEvent {
            timestamp: Timestamp::from_micros(micros),
            actor_id: 0,
            color_id,
            x,
            y,
        }
    }

    #[test]
    fn finds_latest_at_or_before() {
        let events = vec![event(10, 3, 3, 0), event(20, 3, 3, 1), event(30, 3, 3, 2)];
        let index = PositionIndex::build(&events);

        let at = |micros| {
            index
                .latest_at_or_before(&events, 3, 3, Timestamp::from_micros(micros))
                .map(|e| e.color_id)
        };
        assert_eq!(at(5), None);
        assert_eq!(at(10), Some(0));
        assert_eq!(at(25), Some(1));
        assert_eq!(at(1000), Some(2));
    }

    #[test]
    fn equal_timestamps_resolve_to_log_order() {
        let events = vec![event(10, 1, 1, 7), event(10, 1, 1, 8)];
        let index = PositionIndex::build(&events);
        let found = index
            .latest_at_or_before(&events, 1, 1, Timestamp::from_micros(10))
            .unwrap();
        assert_eq!(found.color_id, 8);
    }

    #[test]
    fn range_is_exclusive_start_inclusive_end() {
        let events = vec![event(10, 0, 0, 0), event(20, 0, 0, 1), event(30, 0, 0, 2)];
        let rect = Rect::new(0, 0, 1, 1);
        let picked: Vec<u16> = events_in(
            &events,
            rect,
            Timestamp::from_micros(10),
            Timestamp::from_micros(30),
        )
        .map(|e| e.color_id)
        .collect();
        assert_eq!(picked, vec![1, 2]);
    }

    #[test]
    fn range_filters_by_rect() {
        let events = vec![event(10, 0, 0, 0), event(20, 5, 5, 1)];
        let rect = Rect::new(0, 0, 2, 2);
        let picked: Vec<u16> = events_in(
            &events,
            rect,
            Timestamp::from_micros(0),
            Timestamp::from_micros(100),
        )
        .map(|e| e.color_id)
        .collect();
        assert_eq!(picked, vec![0]);
    }
}
