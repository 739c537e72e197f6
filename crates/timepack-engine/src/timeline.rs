//! Timeline view model.
//!
//! The non-visual half of a day timeline: the visible hour window, total
//! scroll height, the width left for events once the hour sidebar is drawn,
//! and the initial scroll position.

use crate::config::Config;
use crate::event::{Event, PackedEvent};
use crate::packer::Packer;

/// A day timeline configured with a visible window and layout constants.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Timeline {
    config: Config,
}

impl Timeline {
    /// Create a timeline from a configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// The configuration this timeline was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Hours shown between the first and last visible hour.
    pub fn visible_hours(&self) -> u32 {
        self.config.visible_hours()
    }

    /// Total height of the scrollable day.
    pub fn calendar_height(&self) -> f64 {
        f64::from(self.visible_hours()) * self.config.layout.hour_height
    }

    /// Width available for event blocks on a screen `screen_width` wide.
    pub fn event_area_width(&self, screen_width: f64) -> f64 {
        screen_width - self.config.layout.sidebar_width
    }

    /// Pack `events` for a screen `screen_width` wide.
    pub fn pack<T>(&self, events: Vec<Event<T>>, screen_width: f64) -> Vec<PackedEvent<T>> {
        Packer::new(self.config.layout).pack(
            events,
            self.event_area_width(screen_width),
            f64::from(self.config.day_start),
        )
    }

    /// Where to scroll when the view opens.
    ///
    /// Only set when `scroll_to_first` is enabled. Leaves one hour of context
    /// above the earliest event and returns `None` when that lands at the top.
    pub fn initial_scroll_offset<T>(&self, packed: &[PackedEvent<T>]) -> Option<f64> {
        if !self.config.scroll_to_first {
            return None;
        }

        let first_top = packed
            .iter()
            .map(|p| p.top)
            .min_by(f64::total_cmp)
            .unwrap_or(0.0);
        let hour = self.calendar_height() / f64::from(self.visible_hours().max(1));
        let offset = (first_top - hour).max(0.0);

        (offset > 0.0).then_some(offset)
    }

    /// The input event a packed event was laid out from.
    pub fn original_event<'a, T, U>(
        events: &'a [Event<T>],
        packed: &PackedEvent<U>,
    ) -> Option<&'a Event<T>> {
        events.get(packed.index)
    }
}
