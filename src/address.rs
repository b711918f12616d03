/// Largest value a 24-bit address can hold
pub const ADDRESS_MAX: u32 = 0x00FF_FFFF;

/// A page index, the program and read granularity
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Page(pub u32);

/// A sector index, the erase granularity
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Sector(pub u32);

/// A byte offset in the linear address space of the chip.
///
/// Only the low 24 bits go on the wire.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Address(pub u32);

impl Address {
    /// Start of a page for the given page size, `None` past 24 bits.
    pub fn from_page(page: Page, page_bytes: u32) -> Option<Self> {
        Self::scaled(page.0, page_bytes)
    }

    /// Start of a sector for the given sector size, `None` past 24 bits.
    pub fn from_sector(sector: Sector, sector_bytes: u32) -> Option<Self> {
        Self::scaled(sector.0, sector_bytes)
    }

    fn scaled(index: u32, size: u32) -> Option<Self> {
        index
            .checked_mul(size)
            .filter(|a| *a <= ADDRESS_MAX)
            .map(Address)
    }

    /// Address bytes in transmission order, most significant first.
    pub fn to_be_bytes(self) -> [u8; 3] {
        [(self.0 >> 16) as u8, (self.0 >> 8) as u8, self.0 as u8]
    }

    /// Returns the address `offset` bytes further, if it still fits in 24 bits.
    pub fn checked_add(self, offset: u32) -> Option<Self> {
        self.0
            .checked_add(offset)
            .filter(|a| *a <= ADDRESS_MAX)
            .map(Address)
    }
}

impl From<u32> for Page {
    fn from(page_id: u32) -> Page {
        Page(page_id)
    }
}

impl From<u32> for Sector {
    fn from(sector_id: u32) -> Sector {
        Sector(sector_id)
    }
}

impl From<Address> for u32 {
    fn from(addr: Address) -> u32 {
        addr.0
    }
}
