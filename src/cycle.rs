use crate::{
    config::{Config, PollLimit},
    error::Error,
    lowlevel::M25PLowLevel,
    register::StatusRegister,
    transport::Transport,
};

/// Where the driver believes the chip is in the write protocol.
///
/// The chip holds the real state; this is only the driver's side of the
/// handshake, used to decide whether a status poll is owed before the next
/// mutating command.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    /// No cycle running
    Idle,
    /// Write enable sent, the next mutating command will be accepted
    WriteEnabled,
    /// A self-timed cycle was started, or may have been, and has not been
    /// seen to finish
    InProgress,
}

/// Write enable, mutate, poll until done.
pub(crate) struct WriteCycle {
    state: CycleState,
    config: Config,
}

impl WriteCycle {
    pub fn new(config: Config) -> Self {
        Self {
            state: CycleState::Idle,
            config,
        }
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs one mutating instruction through the full handshake.
    ///
    /// `issue` must send exactly one mutating instruction. The transaction
    /// right before it on the bus is always the write enable.
    pub fn run<T, E, F>(&mut self, ll: &mut M25PLowLevel<T>, issue: F) -> Result<(), Error<E>>
    where
        T: Transport<Error = E>,
        F: FnOnce(&mut M25PLowLevel<T>) -> Result<(), Error<E>>,
    {
        if self.state == CycleState::InProgress {
            #[cfg(feature = "defmt")]
            defmt::debug!("Previous cycle unfinished, polling first");
            self.wait_idle(ll)?;
        }

        ll.write_enable()?;
        self.state = CycleState::WriteEnabled;

        let issued = issue(ll);
        // The chip may have started even if the transfer reported an error.
        self.state = CycleState::InProgress;
        issued?;

        self.wait_idle(ll)?;

        if self.config.disable_after_cycle {
            ll.write_disable()?;
        }
        Ok(())
    }

    /// Polls the status register until the write-in-progress bit clears.
    ///
    /// With a bounded [`PollLimit`] this returns `Error::Timeout` and keeps the
    /// cycle marked as in progress; the next mutating call polls again first.
    pub fn wait_idle<T, E>(&mut self, ll: &mut M25PLowLevel<T>) -> Result<StatusRegister, Error<E>>
    where
        T: Transport<Error = E>,
    {
        let mut attempts = 0u32;
        loop {
            if !self.config.poll_limit.allows(attempts) {
                #[cfg(feature = "defmt")]
                defmt::warn!("Busy poll gave up after {=u32} reads", attempts);
                self.state = CycleState::InProgress;
                return Err(Error::Timeout);
            }
            attempts += 1;

            let status = ll.read_status()?;
            if !status.wip_bit {
                #[cfg(feature = "defmt")]
                defmt::trace!("Ready after {=u32} reads", attempts);
                self.state = CycleState::Idle;
                return Ok(status);
            }
        }
    }

    pub fn set_poll_limit(&mut self, poll_limit: PollLimit) {
        self.config.poll_limit = poll_limit;
    }
}
