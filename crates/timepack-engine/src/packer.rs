//! Event packing for timeline views.
//!
//! Packing lays out one day's events so that events overlapping in time sit
//! side by side instead of on top of each other:
//!
//! 1. Events are sorted by start, then by end. When two events share a start
//!    the shorter one sorts first and seeds a column first.
//! 2. A single sweep collects overlap groups. A group closes as soon as an
//!    event starts at or after the latest end seen in the group.
//! 3. Inside a group each event goes into the first column whose last event
//!    it does not overlap, or into a new column.
//! 4. When a group closes every event stretches right across the following
//!    columns until it reaches one holding an overlapping event, and is then
//!    converted to pixels.

use chrono::{NaiveDateTime, NaiveTime};
use tracing::{debug, trace};

use crate::config::LayoutConfig;
use crate::event::{intervals_overlap, Event, PackedEvent};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Fractional hours from `from` to `to`. Negative if `to` is earlier.
pub fn hours_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    (to - from).num_milliseconds() as f64 / MILLIS_PER_HOUR
}

/// Lays out events using a fixed set of pixel constants.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Packer {
    layout: LayoutConfig,
}

impl Packer {
    /// Create a packer with the given constants.
    pub fn new(layout: LayoutConfig) -> Self {
        Self { layout }
    }

    /// The constants this packer uses.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Position `events` inside an event area `total_width` pixels wide.
    ///
    /// An event starting at `day_start_hour` gets `top == 0`. The result has
    /// one entry per input event, ordered by overlap group and column rather
    /// than input order; use [`PackedEvent::index`] to map back.
    pub fn pack<T>(
        &self,
        events: Vec<Event<T>>,
        total_width: f64,
        day_start_hour: f64,
    ) -> Vec<PackedEvent<T>> {
        let mut slots: Vec<Slot<T>> = events
            .into_iter()
            .enumerate()
            .map(|(index, event)| Slot::new(index, event))
            .collect();
        slots.sort_by(|a, b| a.start.cmp(&b.start).then(a.end.cmp(&b.end)));

        let area = Area {
            layout: &self.layout,
            total_width,
            day_start_hour,
        };
        let mut packed = Vec::with_capacity(slots.len());
        let mut group = Group::new();
        let mut groups = 0usize;

        for slot in slots {
            if group.closed_by(&slot) {
                std::mem::replace(&mut group, Group::new()).flush(&area, &mut packed);
                groups += 1;
            }
            group.place(slot);
        }

        if !group.is_empty() {
            group.flush(&area, &mut packed);
            groups += 1;
        }

        debug!(events = packed.len(), groups, "Packed events");
        packed
    }
}

/// Pack with the default constants (100 px per hour, 10 px gutter).
pub fn pack_events<T>(
    events: Vec<Event<T>>,
    total_width: f64,
    day_start_hour: f64,
) -> Vec<PackedEvent<T>> {
    Packer::default().pack(events, total_width, day_start_hour)
}

/// An input event tagged with its original index and resolved end.
struct Slot<T> {
    index: usize,
    start: NaiveDateTime,
    end: NaiveDateTime,
    event: Event<T>,
}

impl<T> Slot<T> {
    fn new(index: usize, event: Event<T>) -> Self {
        Self {
            index,
            start: event.start,
            end: event.end_or_default(),
            event,
        }
    }

    fn overlaps(&self, other: &Self) -> bool {
        intervals_overlap((self.start, self.end), (other.start, other.end))
    }
}

/// A set of transitively overlapping events being laid out together.
struct Group<T> {
    columns: Vec<Vec<Slot<T>>>,
    /// Latest end seen in the group; `None` until the first event is placed.
    watermark: Option<NaiveDateTime>,
}

impl<T> Group<T> {
    fn new() -> Self {
        Self {
            columns: Vec::new(),
            watermark: None,
        }
    }

    fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Whether `slot` starts after everything in the group has ended.
    fn closed_by(&self, slot: &Slot<T>) -> bool {
        self.watermark.is_some_and(|end| slot.start >= end)
    }

    fn place(&mut self, slot: Slot<T>) {
        let end = slot.end;
        let free = self.columns.iter().position(|column| {
            column
                .last()
                .is_some_and(|last| !last.overlaps(&slot))
        });

        match free {
            Some(column) => {
                trace!(index = slot.index, column, "Placed event in existing column");
                self.columns[column].push(slot);
            }
            None => {
                trace!(index = slot.index, column = self.columns.len(), "Opened column");
                self.columns.push(vec![slot]);
            }
        }

        self.watermark = Some(self.watermark.map_or(end, |mark| mark.max(end)));
    }

    /// Columns `slot` may cover starting at its own, scanning right only and
    /// stopping at the first column holding any overlapping event.
    fn column_span(&self, column: usize, slot: &Slot<T>) -> usize {
        1 + self.columns[column + 1..]
            .iter()
            .take_while(|other| !other.iter().any(|o| o.overlaps(slot)))
            .count()
    }

    fn flush(self, area: &Area<'_>, out: &mut Vec<PackedEvent<T>>) {
        let column_count = self.columns.len();
        let spans: Vec<Vec<usize>> = self
            .columns
            .iter()
            .enumerate()
            .map(|(column, slots)| {
                slots
                    .iter()
                    .map(|slot| self.column_span(column, slot))
                    .collect()
            })
            .collect();

        debug!(
            columns = column_count,
            events = spans.iter().map(Vec::len).sum::<usize>(),
            "Flushing overlap group"
        );

        for (column, (slots, spans)) in self.columns.into_iter().zip(spans).enumerate() {
            for (slot, span) in slots.into_iter().zip(spans) {
                out.push(area.position(slot, column, span, column_count));
            }
        }
    }
}

/// Geometry inputs shared by every group in one pack call.
struct Area<'a> {
    layout: &'a LayoutConfig,
    total_width: f64,
    day_start_hour: f64,
}

impl Area<'_> {
    fn position<T>(
        &self,
        slot: Slot<T>,
        column: usize,
        column_span: usize,
        column_count: usize,
    ) -> PackedEvent<T> {
        let columns = column_count as f64;
        let left = column as f64 / columns * self.total_width;
        let mut width =
            self.total_width * column_span as f64 / columns - self.layout.right_margin;

        let midnight = slot.start.date().and_time(NaiveTime::MIN);
        let top = (hours_between(midnight, slot.start) - self.day_start_hour)
            * self.layout.hour_height;
        let mut height = hours_between(slot.start, slot.end) * self.layout.hour_height;

        if self.layout.clamp_negative {
            width = width.max(0.0);
            height = height.max(0.0);
        }

        PackedEvent {
            event: slot.event,
            top,
            height,
            left,
            width,
            index: slot.index,
            column,
            column_span,
            column_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 12)
            .unwrap()
            .and_hms_opt(hour, min, 0)
            .unwrap()
    }

    fn named(name: &'static str, start: NaiveDateTime, end: NaiveDateTime) -> Event<&'static str> {
        Event::new(start, Some(end), name)
    }

    type Named = PackedEvent<&'static str>;

    fn find<'a>(packed: &'a [Named], name: &str) -> &'a Named {
        packed
            .iter()
            .find(|p| p.event.data == name)
            .unwrap_or_else(|| panic!("missing event {name}"))
    }

    fn approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_empty_input() {
        let packed = pack_events(Vec::<Event<()>>::new(), 300.0, 0.0);
        assert!(packed.is_empty());
    }

    #[test]
    fn test_single_event_fills_width() {
        let packed = pack_events(vec![named("solo", at(14, 0), at(15, 30))], 320.0, 0.0);
        assert_eq!(packed.len(), 1);

        let solo = &packed[0];
        assert_eq!(solo.column_span, 1);
        assert_eq!(solo.column_count, 1);
        approx(solo.left, 0.0);
        approx(solo.width, 310.0);
        approx(solo.top, 1400.0);
        approx(solo.height, 150.0);
    }

    #[test]
    fn test_two_overlapping_events_split_width() {
        let packed = pack_events(
            vec![
                named("a", at(9, 0), at(10, 0)),
                named("b", at(9, 30), at(10, 30)),
            ],
            300.0,
            0.0,
        );

        let a = find(&packed, "a");
        let b = find(&packed, "b");
        assert_eq!((a.column, b.column), (0, 1));
        assert_eq!((a.column_span, b.column_span), (1, 1));
        approx(a.left, 0.0);
        approx(b.left, 150.0);
        approx(a.width, 140.0);
        approx(b.width, 140.0);
        approx(a.top, 900.0);
        approx(b.top, 950.0);
    }

    #[test]
    fn test_duplicates_get_own_columns_and_later_event_new_group() {
        let packed = pack_events(
            vec![
                named("first", at(9, 0), at(10, 0)),
                named("second", at(9, 0), at(10, 0)),
                named("later", at(11, 0), at(12, 0)),
            ],
            200.0,
            0.0,
        );
        assert_eq!(packed.len(), 3);

        let first = find(&packed, "first");
        let second = find(&packed, "second");
        assert_eq!(first.column_count, 2);
        assert_eq!(second.column_count, 2);
        assert_ne!(first.column, second.column);
        approx(first.left.min(second.left), 0.0);
        approx(first.left.max(second.left), 100.0);
        approx(first.width, 90.0);
        approx(second.width, 90.0);

        let later = find(&packed, "later");
        assert_eq!(later.column_count, 1);
        approx(later.left, 0.0);
        approx(later.width, 190.0);
    }

    #[test]
    fn test_day_start_shifts_top() {
        let packed = pack_events(vec![named("x", at(10, 0), at(11, 0))], 300.0, 8.0);
        approx(packed[0].top, 200.0);
        approx(packed[0].height, 100.0);

        let at_origin = pack_events(vec![named("y", at(8, 0), at(8, 45))], 300.0, 8.0);
        approx(at_origin[0].top, 0.0);
        approx(at_origin[0].height, 75.0);
    }

    #[test]
    fn test_back_to_back_events_share_column() {
        let packed = pack_events(
            vec![
                named("long", at(9, 0), at(11, 0)),
                named("early", at(9, 0), at(10, 0)),
                named("next", at(10, 0), at(11, 0)),
            ],
            300.0,
            0.0,
        );

        let early = find(&packed, "early");
        let long = find(&packed, "long");
        let next = find(&packed, "next");
        assert_eq!(early.column, 0);
        assert_eq!(long.column, 1);
        assert_eq!(next.column, 0);
        assert_eq!(next.column_count, 2);
    }

    #[test]
    fn test_adjacent_events_form_separate_groups() {
        let packed = pack_events(
            vec![
                named("morning", at(9, 0), at(10, 0)),
                named("after", at(10, 0), at(11, 0)),
            ],
            300.0,
            0.0,
        );
        for p in &packed {
            assert_eq!(p.column_count, 1);
            approx(p.width, 290.0);
        }
    }

    #[test]
    fn test_shorter_event_seeds_first_column() {
        let packed = pack_events(
            vec![
                named("long", at(9, 0), at(11, 0)),
                named("short", at(9, 0), at(10, 0)),
            ],
            400.0,
            0.0,
        );

        let short = find(&packed, "short");
        let long = find(&packed, "long");
        assert_eq!(short.column, 0);
        assert_eq!(long.column, 1);
        assert_eq!(short.column_span, 1);
        assert_eq!(short.index, 1);
        assert_eq!(long.index, 0);
    }

    #[test]
    fn test_span_stops_at_first_overlapping_column() {
        // col 0: a, d   col 1: b   col 2: c   col 3: e
        let packed = pack_events(
            vec![
                named("a", at(9, 0), at(10, 0)),
                named("b", at(9, 0), at(10, 30)),
                named("c", at(9, 30), at(11, 30)),
                named("e", at(9, 45), at(10, 15)),
                named("d", at(11, 0), at(12, 0)),
            ],
            400.0,
            0.0,
        );

        let columns: Vec<usize> = ["a", "b", "c", "e", "d"]
            .iter()
            .map(|name| find(&packed, name).column)
            .collect();
        assert_eq!(columns, vec![0, 1, 2, 3, 0]);

        // d is clear of b in column 1 but hits c in column 2; column 3 is
        // free again but never reached.
        let d = find(&packed, "d");
        assert_eq!(d.column_count, 4);
        assert_eq!(d.column_span, 2);
        approx(d.left, 0.0);
        approx(d.width, 190.0);

        assert_eq!(find(&packed, "b").column_span, 1);
        assert_eq!(find(&packed, "e").column_span, 1);
    }

    #[test]
    fn test_span_reaches_last_column() {
        // col 0: long   col 1: b, c   col 2: x; x ends before c starts
        let packed = pack_events(
            vec![
                named("long", at(8, 50), at(12, 0)),
                named("b", at(9, 0), at(9, 30)),
                named("x", at(9, 10), at(9, 40)),
                named("c", at(10, 0), at(10, 30)),
            ],
            300.0,
            0.0,
        );

        let c = find(&packed, "c");
        assert_eq!(c.column, 1);
        assert_eq!(c.column_count, 3);
        assert_eq!(c.column_span, 2);
        approx(c.left, 100.0);
        approx(c.width, 190.0);

        // Expansion never reaches left, even though column 0 is busy anyway.
        assert_eq!(find(&packed, "long").column_span, 1);
    }

    #[test]
    fn test_missing_end_defaults_to_an_hour() {
        let packed = pack_events(
            vec![
                Event::new(at(9, 0), None, "open"),
                named("inside", at(9, 30), at(9, 45)),
            ],
            200.0,
            0.0,
        );

        let open = find(&packed, "open");
        approx(open.height, 100.0);
        assert_eq!(open.column_count, 2);
        assert_eq!(open.event.end, None);
    }

    #[test]
    fn test_event_past_midnight_keeps_start_day_origin() {
        let next_day = NaiveDate::from_ymd_opt(2024, 3, 13)
            .unwrap()
            .and_hms_opt(1, 0, 0)
            .unwrap();
        let packed = pack_events(vec![named("late", at(23, 0), next_day)], 300.0, 0.0);
        approx(packed[0].top, 2300.0);
        approx(packed[0].height, 200.0);
    }

    #[test]
    fn test_degenerate_input_is_not_rejected() {
        let packed = pack_events(
            vec![
                named("backwards", at(10, 0), at(9, 0)),
                named("empty", at(12, 0), at(12, 0)),
            ],
            5.0,
            0.0,
        );
        assert_eq!(packed.len(), 2);
        approx(find(&packed, "backwards").height, -100.0);
        approx(find(&packed, "empty").height, 0.0);
        approx(find(&packed, "empty").width, -5.0);
    }

    #[test]
    fn test_clamp_negative_geometry() {
        let packer = Packer::new(LayoutConfig {
            clamp_negative: true,
            ..LayoutConfig::default()
        });
        let packed = packer.pack(vec![named("backwards", at(10, 0), at(9, 0))], 5.0, 0.0);
        approx(packed[0].height, 0.0);
        approx(packed[0].width, 0.0);
    }

    #[test]
    fn test_custom_layout_constants() {
        let packer = Packer::new(LayoutConfig {
            hour_height: 60.0,
            right_margin: 2.0,
            ..LayoutConfig::default()
        });
        let packed = packer.pack(vec![named("x", at(9, 30), at(10, 0))], 100.0, 9.0);
        approx(packed[0].top, 30.0);
        approx(packed[0].height, 30.0);
        approx(packed[0].width, 98.0);
    }

    #[test]
    fn test_hours_between_is_fractional() {
        approx(hours_between(at(9, 0), at(10, 30)), 1.5);
        approx(hours_between(at(10, 30), at(9, 0)), -1.5);
    }
}
