use crate::{
    address::Address,
    command::{Command, Opcode},
    error::Error,
    register::*,
    transaction,
    transport::Transport,
};

/// The low level M25P driver.
///
/// Every method is exactly one bus transaction. Nothing here sets the write
/// enable latch or waits for a cycle to finish; see [`crate::flash::M25P`]
/// for that.
pub struct M25PLowLevel<T> {
    transport: T,
}

impl<T, E> M25PLowLevel<T>
where
    T: Transport<Error = E>,
{
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Give back the transport
    pub fn release(self) -> T {
        self.transport
    }

    /// Bring up the transport
    pub fn init(&mut self) -> Result<(), Error<E>> {
        self.transport.init().map_err(Error::Transport)
    }

    fn execute(&mut self, cmd: Command<'_>) -> Result<(), Error<E>> {
        #[cfg(feature = "defmt")]
        defmt::trace!("{} ({=usize} bytes)", cmd.opcode, cmd.frame_len());
        transaction::execute(&mut self.transport, cmd).map_err(Error::Transport)
    }

    fn command_write(&mut self, opcode: Opcode) -> Result<(), Error<E>> {
        self.execute(Command::new(opcode))
    }

    /// Set the write enable latch
    pub fn write_enable(&mut self) -> Result<(), Error<E>> {
        self.command_write(Opcode::WriteEnable)
    }

    /// Clear the write enable latch
    pub fn write_disable(&mut self) -> Result<(), Error<E>> {
        self.command_write(Opcode::WriteDisable)
    }

    /// Read the status register
    pub fn read_status(&mut self) -> Result<StatusRegister, Error<E>> {
        let mut status = [0u8; 1];
        self.execute(Command::new(Opcode::ReadStatus).read(&mut status))?;
        Ok(status[0].into())
    }

    /// Write the status register. Write must be enabled, see `write_enable`
    pub fn write_status(&mut self, status: StatusRegister) -> Result<(), Error<E>> {
        let val: u8 = status.into();
        self.execute(Command::new(Opcode::WriteStatus).write(&[val]))
    }

    /// Read the identification of the device.
    ///
    /// The chip announces how many factory data bytes follow; at most 16 are
    /// clocked in.
    pub fn read_identification(&mut self) -> Result<Identification, Error<E>> {
        let mut head = [0u8; 4];
        let mut cfd = [0u8; CFD_MAX];

        self.transport.begin_transaction().map_err(Error::Transport)?;
        let res = shift_identification(&mut self.transport, &mut head, &mut cfd);
        let released = self.transport.end_transaction();
        res.map_err(Error::Transport)?;
        released.map_err(Error::Transport)?;

        Ok(Identification::new([head[0], head[1], head[2]], head[3], cfd))
    }

    /// Read n bytes from an address. The chip wraps to address 0 past the end.
    pub fn read_data(&mut self, addr: Address, buff: &mut [u8]) -> Result<(), Error<E>> {
        self.execute(Command::new(Opcode::ReadData).at(addr).read(buff))
    }

    /// Program up to a page. Write must be enabled, see `write_enable`.
    ///
    /// Bits can only go from 1 to 0, and bytes past the end of the page wrap to
    /// its start.
    pub fn page_program(&mut self, addr: Address, buff: &[u8]) -> Result<(), Error<E>> {
        self.execute(Command::new(Opcode::PageProgram).at(addr).write(buff))
    }

    /// Erase the sector holding `addr`. Write must be enabled, see `write_enable`
    pub fn sector_erase(&mut self, addr: Address) -> Result<(), Error<E>> {
        self.execute(Command::new(Opcode::SectorErase).at(addr))
    }

    /// Erase the whole chip. Write must be enabled, see `write_enable`.
    /// Ignored by the chip if any block protect bit is set.
    pub fn bulk_erase(&mut self) -> Result<(), Error<E>> {
        self.command_write(Opcode::BulkErase)
    }

    /// Deep powerdown the chip. Only `release_from_deep_power_down` is
    /// accepted afterwards.
    pub fn deep_power_down(&mut self) -> Result<(), Error<E>> {
        self.command_write(Opcode::DeepPowerDown)
    }

    /// Wake the chip from deep power down
    pub fn release_from_deep_power_down(&mut self) -> Result<(), Error<E>> {
        self.command_write(Opcode::ReleaseFromDeepPowerDown)
    }

    /// Write the lock register of the sector holding `addr` (M25PX16 only).
    /// Write must be enabled, see `write_enable`
    pub fn write_lock_register(&mut self, addr: Address, reg: LockRegister) -> Result<(), Error<E>> {
        let val: u8 = reg.into();
        self.execute(Command::new(Opcode::WriteLockRegister).at(addr).write(&[val]))
    }

    /// Read the lock register of the sector holding `addr` (M25PX16 only)
    pub fn read_lock_register(&mut self, addr: Address) -> Result<LockRegister, Error<E>> {
        let mut reg = [0u8; 1];
        self.execute(Command::new(Opcode::ReadLockRegister).at(addr).read(&mut reg))?;
        Ok(reg[0].into())
    }
}

fn shift_identification<T: Transport>(
    transport: &mut T,
    head: &mut [u8; 4],
    cfd: &mut [u8; CFD_MAX],
) -> Result<(), T::Error> {
    transport.transfer_byte(Opcode::ReadIdentification as u8)?;
    for slot in head.iter_mut() {
        *slot = transport.transfer_byte(0x00)?;
    }
    let len = (head[3] as usize).min(CFD_MAX);
    for slot in cfd[..len].iter_mut() {
        *slot = transport.transfer_byte(0x00)?;
    }
    Ok(())
}
