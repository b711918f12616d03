/// How long the driver keeps polling the write-in-progress bit
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollLimit {
    /// Poll until the chip reports ready, however long that takes
    #[default]
    Unbounded,
    /// Give up with `Error::Timeout` after this many status reads.
    /// The chip finishes the cycle on its own either way.
    Attempts(u32),
}

impl PollLimit {
    pub(crate) fn allows(self, attempts: u32) -> bool {
        match self {
            PollLimit::Unbounded => true,
            PollLimit::Attempts(max) => attempts < max,
        }
    }
}

/// Driver configuration
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub poll_limit: PollLimit,
    /// Send write disable after every self-timed cycle. The chip already
    /// clears the latch on completion, this only pins the state down.
    pub disable_after_cycle: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_limit: PollLimit::Unbounded,
            disable_after_cycle: true,
        }
    }
}

impl Config {
    pub fn with_poll_limit(mut self, poll_limit: PollLimit) -> Self {
        self.poll_limit = poll_limit;
        self
    }

    pub fn with_disable_after_cycle(mut self, enabled: bool) -> Self {
        self.disable_after_cycle = enabled;
        self
    }
}
