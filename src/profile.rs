use core::ops::Range;

use crate::{
    address::{Address, Page, Sector},
    error::Error,
    register::Identification,
    PAGE_SIZE, SECTOR_SIZE,
};

/// Supported chips
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Micron M25P16, 16Mb
    M25P16,
    /// Micron M25PX16, 16Mb with per sector lock registers
    M25PX16,
}

impl Variant {
    pub const fn profile(self) -> DeviceProfile {
        match self {
            Variant::M25P16 => DeviceProfile {
                page_count: 8192,
                page_bytes: PAGE_SIZE,
                sector_count: 32,
                sector_bytes: SECTOR_SIZE,
                supports_lock_register: false,
                jedec: [0x20, 0x20, 0x15],
            },
            Variant::M25PX16 => DeviceProfile {
                page_count: 8192,
                page_bytes: PAGE_SIZE,
                sector_count: 32,
                sector_bytes: SECTOR_SIZE,
                supports_lock_register: true,
                jedec: [0x20, 0x71, 0x15],
            },
        }
    }
}

/// Geometry and capabilities of the attached chip.
///
/// `page_count * page_bytes == sector_count * sector_bytes` always holds.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceProfile {
    pub page_count: u32,
    pub page_bytes: u32,
    pub sector_count: u32,
    pub sector_bytes: u32,
    pub supports_lock_register: bool,
    /// Expected manufacturer, memory type and capacity bytes
    pub jedec: [u8; 3],
}

impl DeviceProfile {
    /// Total addressable bytes
    pub const fn capacity(&self) -> u32 {
        self.page_count * self.page_bytes
    }

    /// Start address of a page, or `OutOfBounds` past the last page
    pub fn page_address<E>(&self, page: Page) -> Result<Address, Error<E>> {
        if page.0 >= self.page_count {
            return Err(Error::OutOfBounds);
        }
        Address::from_page(page, self.page_bytes).ok_or(Error::OutOfBounds)
    }

    /// Start address of a sector, or `OutOfBounds` past the last sector
    pub fn sector_address<E>(&self, sector: Sector) -> Result<Address, Error<E>> {
        if sector.0 >= self.sector_count {
            return Err(Error::OutOfBounds);
        }
        Address::from_sector(sector, self.sector_bytes).ok_or(Error::OutOfBounds)
    }

    /// Sector holding a byte address
    pub fn sector_of<E>(&self, addr: Address) -> Result<Sector, Error<E>> {
        if addr.0 >= self.capacity() {
            return Err(Error::OutOfBounds);
        }
        Ok(Sector(addr.0 / self.sector_bytes))
    }

    /// Checks that `len` bytes starting at `addr` lie inside the array
    pub fn check_range<E>(&self, addr: Address, len: usize) -> Result<(), Error<E>> {
        let capacity = self.capacity();
        let len = u32::try_from(len).map_err(|_| Error::OutOfBounds)?;
        if len > capacity || addr.0 > capacity - len {
            return Err(Error::OutOfBounds);
        }
        Ok(())
    }

    /// Sectors covered by the block protect bits BP2..BP0.
    ///
    /// The protected area grows down from the top of the array: 1/32, 1/16,
    /// 1/8, 1/4, 1/2 of it, then everything for the two highest settings.
    pub fn protected_sectors(&self, protected_block: u8) -> Range<u32> {
        let count = match protected_block & 0x07 {
            0 => 0,
            bp @ 1..=5 => (self.sector_count >> (6 - bp)).max(1),
            _ => self.sector_count,
        };
        self.sector_count - count..self.sector_count
    }

    pub fn matches(&self, id: &Identification) -> bool {
        [id.manufacturer, id.memory_type, id.memory_capacity] == self.jedec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_consistent() {
        for variant in [Variant::M25P16, Variant::M25PX16] {
            let p = variant.profile();
            assert_eq!(p.page_count * p.page_bytes, p.sector_count * p.sector_bytes);
            assert_eq!(p.capacity(), 2_097_152);
        }
        assert!(!Variant::M25P16.profile().supports_lock_register);
        assert!(Variant::M25PX16.profile().supports_lock_register);
    }

    #[test]
    fn address_translation() {
        let p = Variant::M25P16.profile();
        assert_eq!(p.page_address::<()>(Page(10)), Ok(Address(2560)));
        assert_eq!(p.page_address::<()>(Page(8191)), Ok(Address(8191 * 256)));
        assert_eq!(p.page_address::<()>(Page(8192)), Err(Error::OutOfBounds));
        assert_eq!(p.sector_address::<()>(Sector(31)), Ok(Address(31 * 65536)));
        assert_eq!(p.sector_address::<()>(Sector(32)), Err(Error::OutOfBounds));
        assert_eq!(p.sector_of::<()>(Address(0x1F_FFFF)), Ok(Sector(31)));
        assert_eq!(p.sector_of::<()>(Address(0x20_0000)), Err(Error::OutOfBounds));
    }

    #[test]
    fn range_check() {
        let p = Variant::M25P16.profile();
        assert!(p.check_range::<()>(Address(0), 2_097_152).is_ok());
        assert!(p.check_range::<()>(Address(0x1F_FFFF), 1).is_ok());
        assert!(p.check_range::<()>(Address(0x1F_FFFF), 2).is_err());
        assert!(p.check_range::<()>(Address(0x20_0000), 0).is_ok());
        assert!(p.check_range::<()>(Address(0x20_0001), 0).is_err());
    }

    #[test]
    fn block_protect_table() {
        let p = Variant::M25P16.profile();
        assert_eq!(p.protected_sectors(0), 32..32);
        assert_eq!(p.protected_sectors(1), 31..32);
        assert_eq!(p.protected_sectors(2), 30..32);
        assert_eq!(p.protected_sectors(3), 28..32);
        assert_eq!(p.protected_sectors(4), 24..32);
        assert_eq!(p.protected_sectors(5), 16..32);
        assert_eq!(p.protected_sectors(6), 0..32);
        assert_eq!(p.protected_sectors(7), 0..32);
    }
}
