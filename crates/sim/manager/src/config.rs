//! Configuration options for SIM sessions

/// Configuration options for a [`Sim`](crate::Sim) session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    /// Buffer size of the event channel; slow subscribers lag beyond it
    pub event_capacity: usize,

    /// Read the CPHS information file during bring-up
    pub read_cphs_information: bool,

    /// Re-read subscriber numbers when the file client reports a change
    pub watch_subscriber_numbers: bool,

    /// Keep rendered icons until the card is removed
    pub cache_icons: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            event_capacity: 32,
            read_cphs_information: true,
            watch_subscriber_numbers: true,
            cache_icons: true,
        }
    }
}

impl SimConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the event channel capacity
    pub const fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Set whether to read CPHS information
    pub const fn with_cphs_information(mut self, enabled: bool) -> Self {
        self.read_cphs_information = enabled;
        self
    }

    /// Set whether to watch subscriber numbers for changes
    pub const fn with_subscriber_number_watch(mut self, enabled: bool) -> Self {
        self.watch_subscriber_numbers = enabled;
        self
    }

    /// Set whether to cache rendered icons
    pub const fn with_icon_cache(mut self, enabled: bool) -> Self {
        self.cache_icons = enabled;
        self
    }
}
