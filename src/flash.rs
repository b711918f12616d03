use core::ops::Range;

use crate::{
    address::{Address, Page, Sector},
    config::{Config, PollLimit},
    cycle::{CycleState, WriteCycle},
    error::Error,
    lowlevel::M25PLowLevel,
    profile::{DeviceProfile, Variant},
    register::*,
    transport::Transport,
};

/// The higher level driver.
///
/// Checks bounds before touching the bus, sets the write enable latch before
/// every mutating instruction and blocks until the chip's self-timed cycle is
/// over. Must not be shared between execution contexts without an outer lock.
pub struct M25P<T> {
    ll: M25PLowLevel<T>,
    profile: DeviceProfile,
    cycle: WriteCycle,
    powered_down: bool,
}

impl<T, E> M25P<T>
where
    T: Transport<Error = E>,
{
    /// Create a new instance with the default configuration. No bus activity.
    pub fn new(transport: T, variant: Variant) -> Self {
        Self::with_config(transport, variant, Config::default())
    }

    pub fn with_config(transport: T, variant: Variant, config: Config) -> Self {
        Self {
            ll: M25PLowLevel::new(transport),
            profile: variant.profile(),
            cycle: WriteCycle::new(config),
            powered_down: false,
        }
    }

    /// Driver for an M25P16
    pub fn m25p16(transport: T) -> Self {
        Self::new(transport, Variant::M25P16)
    }

    /// Driver for an M25PX16
    pub fn m25px16(transport: T) -> Self {
        Self::new(transport, Variant::M25PX16)
    }

    /// Give back the transport
    pub fn release(self) -> T {
        self.ll.release()
    }

    /// Bring up the transport, wake the chip in case a previous session left
    /// it in deep power down, and wait for any cycle left over to finish.
    pub fn init(&mut self) -> Result<(), Error<E>> {
        self.ll.init()?;
        self.ll.release_from_deep_power_down()?;
        self.powered_down = false;
        self.cycle.wait_idle(&mut self.ll)?;
        #[cfg(feature = "defmt")]
        defmt::debug!("Flash ready: {}", self.profile);
        Ok(())
    }

    /// Geometry and capabilities of the chip
    pub fn info(&self) -> DeviceProfile {
        self.profile
    }

    pub fn config(&self) -> &Config {
        self.cycle.config()
    }

    pub fn set_poll_limit(&mut self, poll_limit: PollLimit) {
        self.cycle.set_poll_limit(poll_limit);
    }

    /// The driver's view of the write handshake
    pub fn cycle_state(&self) -> CycleState {
        self.cycle.state()
    }

    /// Poll until the chip is idle. Useful after a `Timeout`.
    pub fn wait_idle(&mut self) -> Result<StatusRegister, Error<E>> {
        self.awake()?;
        self.cycle.wait_idle(&mut self.ll)
    }

    /// A powered down chip never answers a status read, polling it would not
    /// end.
    fn awake(&self) -> Result<(), Error<E>> {
        if self.powered_down {
            #[cfg(feature = "defmt")]
            defmt::warn!("Chip is in deep power down");
            return Err(Error::PoweredDown);
        }
        Ok(())
    }

    /// The chip rejects most instructions while a cycle runs, so one that
    /// timed out earlier is waited for first.
    fn settle(&mut self) -> Result<(), Error<E>> {
        self.awake()?;
        if self.cycle.state() == CycleState::InProgress {
            self.cycle.wait_idle(&mut self.ll)?;
        }
        Ok(())
    }

    /// Erase a sector, setting all its bits to 1
    pub fn erase_sector(&mut self, index: u32) -> Result<(), Error<E>> {
        let addr = self.profile.sector_address(Sector(index))?;
        #[cfg(feature = "defmt")]
        defmt::debug!("Erase sector {=u32}", index);
        self.awake()?;
        self.cycle.run(&mut self.ll, |ll| ll.sector_erase(addr))
    }

    /// Program a page.
    ///
    /// Only clears bits: the page ends up holding the bitwise AND of its old
    /// content and `data`, so erase it first.
    pub fn write_page(&mut self, index: u32, data: &[u8]) -> Result<(), Error<E>> {
        let addr = self.profile.page_address(Page(index))?;
        if data.len() > self.profile.page_bytes as usize {
            return Err(Error::TooLarge);
        }
        self.program(addr, data)
    }

    /// Read the start of a page into `buff`
    pub fn read_page(&mut self, index: u32, buff: &mut [u8]) -> Result<(), Error<E>> {
        let addr = self.profile.page_address(Page(index))?;
        if buff.len() > self.profile.page_bytes as usize {
            return Err(Error::TooLarge);
        }
        self.read(addr, buff)
    }

    /// Program bytes that stay within one page, starting anywhere in it
    pub fn program(&mut self, addr: Address, data: &[u8]) -> Result<(), Error<E>> {
        self.profile.check_range(addr, data.len())?;
        let page_bytes = self.profile.page_bytes;
        if (addr.0 % page_bytes) as usize + data.len() > page_bytes as usize {
            return Err(Error::TooLarge);
        }
        if data.is_empty() {
            return Ok(());
        }
        #[cfg(feature = "defmt")]
        defmt::debug!("Program {=usize} bytes at {=u32:#x}", data.len(), addr.0);
        self.awake()?;
        self.cycle.run(&mut self.ll, |ll| ll.page_program(addr, data))
    }

    /// Read n bytes from any address. Never touches the write enable latch.
    pub fn read(&mut self, addr: Address, buff: &mut [u8]) -> Result<(), Error<E>> {
        self.profile.check_range(addr, buff.len())?;
        if buff.is_empty() {
            return Ok(());
        }
        self.settle()?;
        self.ll.read_data(addr, buff)
    }

    /// Erase the whole chip. Silently ignored by the chip while any block
    /// protect bit is set.
    pub fn bulk_erase(&mut self) -> Result<(), Error<E>> {
        #[cfg(feature = "defmt")]
        defmt::debug!("Bulk erase");
        self.awake()?;
        self.cycle.run(&mut self.ll, |ll| ll.bulk_erase())
    }

    /// Read the status register, always from the chip
    pub fn read_status(&mut self) -> Result<StatusRegister, Error<E>> {
        self.awake()?;
        self.ll.read_status()
    }

    /// Write the status register. WIP and WEL are read only on the chip.
    pub fn write_status(&mut self, status: StatusRegister) -> Result<(), Error<E>> {
        self.awake()?;
        self.cycle.run(&mut self.ll, |ll| ll.write_status(status))
    }

    /// Set BP2..BP0, keeping the SRWD bit as it is
    pub fn set_block_protect(&mut self, protected_block: u8) -> Result<(), Error<E>> {
        if protected_block > 0x07 {
            return Err(Error::Value);
        }
        self.settle()?;
        let mut status = self.ll.read_status()?;
        status.protected_block = protected_block;
        status.write_enable_latch = false;
        status.wip_bit = false;
        self.write_status(status)
    }

    /// Sectors currently covered by the block protect bits
    pub fn protected_sectors(&mut self) -> Result<Range<u32>, Error<E>> {
        self.awake()?;
        let status = self.ll.read_status()?;
        Ok(self.profile.protected_sectors(status.protected_block))
    }

    /// Read the identification of the device
    pub fn identify(&mut self) -> Result<Identification, Error<E>> {
        self.settle()?;
        self.ll.read_identification()
    }

    /// Put the chip in deep power down. Everything but
    /// [`Self::release_from_deep_power_down`] and `init` then fails with
    /// `PoweredDown`.
    pub fn deep_power_down(&mut self) -> Result<(), Error<E>> {
        if self.powered_down {
            return Ok(());
        }
        self.settle()?;
        self.ll.deep_power_down()?;
        self.powered_down = true;
        Ok(())
    }

    pub fn release_from_deep_power_down(&mut self) -> Result<(), Error<E>> {
        self.ll.release_from_deep_power_down()?;
        self.powered_down = false;
        Ok(())
    }

    /// Whether the driver put the chip in deep power down
    pub fn is_powered_down(&self) -> bool {
        self.powered_down
    }

    /// Sector lock registers, `None` on chips without them
    pub fn lock_registers(&mut self) -> Option<LockRegisters<'_, T>> {
        if self.profile.supports_lock_register {
            Some(LockRegisters { flash: self })
        } else {
            None
        }
    }
}

/// Access to the per sector lock registers of the M25PX16
pub struct LockRegisters<'a, T> {
    flash: &'a mut M25P<T>,
}

impl<T, E> LockRegisters<'_, T>
where
    T: Transport<Error = E>,
{
    /// Lock register of the sector holding `addr`
    pub fn read(&mut self, addr: Address) -> Result<LockRegister, Error<E>> {
        self.flash.profile.sector_of(addr)?;
        self.flash.settle()?;
        self.flash.ll.read_lock_register(addr)
    }

    /// Write the lock register of the sector holding `addr`.
    ///
    /// Fails with `LockedDown`, without writing, once the register's lock-down
    /// bit reads back as set: only a power cycle clears it.
    pub fn write(&mut self, addr: Address, reg: LockRegister) -> Result<(), Error<E>> {
        let current = self.read(addr)?;
        let Some(next) = current.transition(reg) else {
            #[cfg(feature = "defmt")]
            defmt::warn!("Sector at {=u32:#x} is locked down", addr.0);
            return Err(Error::LockedDown);
        };

        let flash = &mut *self.flash;
        flash
            .cycle
            .run(&mut flash.ll, |ll| ll.write_lock_register(addr, next))
    }
}
