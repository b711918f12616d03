use bit::BitIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManufacturerId(pub u8);
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryType(pub u8);
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryCapacity(pub u8);

/// Maximum customized factory data bytes the chip can return
pub const CFD_MAX: usize = 16;

/// Snapshot of the status register.
///
/// Reflects the chip at the moment of the read only; the driver never caches it.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRegister {
    /// SRWD, works together with the W# pin to freeze the register
    pub write_protect_disable: bool,
    /// BP2..BP0
    pub protected_block: u8,
    pub write_enable_latch: bool,
    pub wip_bit: bool,
}

impl From<u8> for StatusRegister {
    fn from(val: u8) -> StatusRegister {
        StatusRegister {
            write_protect_disable: val.bit(7),
            protected_block: val.bit_range(2..5),
            write_enable_latch: val.bit(1),
            wip_bit: val.bit(0),
        }
    }
}

impl From<StatusRegister> for u8 {
    fn from(sr: StatusRegister) -> u8 {
        let mut val = 0u8;
        val.set_bit(7, sr.write_protect_disable);
        val.set_bit_range(2..5, sr.protected_block & 0x07);
        val.set_bit(1, sr.write_enable_latch);
        val.set_bit(0, sr.wip_bit);
        val
    }
}

/// Answer to the read identification instruction
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identification {
    pub manufacturer: u8,
    pub memory_type: u8,
    pub memory_capacity: u8,
    cfd_len: u8,
    cfd: [u8; CFD_MAX],
}

impl Identification {
    pub(crate) fn new(jedec: [u8; 3], cfd_len: u8, cfd: [u8; CFD_MAX]) -> Self {
        Self {
            manufacturer: jedec[0],
            memory_type: jedec[1],
            memory_capacity: jedec[2],
            cfd_len: cfd_len.min(CFD_MAX as u8),
            cfd,
        }
    }

    /// The three JEDEC bytes as typed values
    pub fn jedec(&self) -> (ManufacturerId, MemoryType, MemoryCapacity) {
        (
            ManufacturerId(self.manufacturer),
            MemoryType(self.memory_type),
            MemoryCapacity(self.memory_capacity),
        )
    }

    /// Customized factory data, at most 16 bytes
    pub fn cfd(&self) -> &[u8] {
        &self.cfd[..self.cfd_len as usize]
    }
}

/// Per sector lock register of the M25PX16.
///
/// The lock-down bit is a one way latch: once it reads back as set, neither
/// bit of this sector's register can change until the chip is power cycled.
/// [`LockRegister::transition`] encodes that rule, so the only reachable moves
/// out of a locked down register are refusals.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LockRegister {
    /// Program and erase in the sector are ignored
    pub write_lock: bool,
    /// Freezes both bits until power cycle
    pub lock_down: bool,
}

impl LockRegister {
    pub const UNLOCKED: LockRegister = LockRegister {
        write_lock: false,
        lock_down: false,
    };

    pub fn is_locked_down(&self) -> bool {
        self.lock_down
    }

    /// Value a write of `requested` leaves in the register, or `None` when the
    /// register is locked down and the write would be ignored.
    pub fn transition(self, requested: LockRegister) -> Option<LockRegister> {
        if self.lock_down {
            None
        } else {
            Some(requested)
        }
    }
}

impl From<u8> for LockRegister {
    fn from(val: u8) -> LockRegister {
        LockRegister {
            write_lock: val.bit(0),
            lock_down: val.bit(1),
        }
    }
}

impl From<LockRegister> for u8 {
    fn from(reg: LockRegister) -> u8 {
        let mut val = 0u8;
        val.set_bit(0, reg.write_lock);
        val.set_bit(1, reg.lock_down);
        val
    }
}
