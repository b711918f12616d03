//! Implementation of the `NorFlash` traits of the `embedded_storage` crate.
//! Writes are split at page boundaries and every call blocks until the chip is
//! done.

use core::fmt::Debug;

use embedded_storage::nor_flash::{
    check_erase, check_read, check_write, ErrorType, MultiwriteNorFlash, NorFlash, NorFlashError,
    NorFlashErrorKind, ReadNorFlash,
};

use crate::{address::Address, error::Error, flash::M25P, transport::Transport, PAGE_SIZE, SECTOR_SIZE};

impl<E> From<NorFlashErrorKind> for Error<E> {
    fn from(e: NorFlashErrorKind) -> Self {
        match e {
            NorFlashErrorKind::NotAligned => Error::NotAligned,
            NorFlashErrorKind::OutOfBounds => Error::OutOfBounds,
            _ => Error::Value,
        }
    }
}

impl<E> NorFlashError for Error<E>
where
    E: Debug,
{
    fn kind(&self) -> NorFlashErrorKind {
        match self {
            Error::OutOfBounds => NorFlashErrorKind::OutOfBounds,
            Error::NotAligned => NorFlashErrorKind::NotAligned,
            _ => NorFlashErrorKind::Other,
        }
    }
}

impl<T, E> ErrorType for M25P<T>
where
    T: Transport<Error = E>,
    E: Debug,
{
    type Error = Error<E>;
}

impl<T, E> ReadNorFlash for M25P<T>
where
    T: Transport<Error = E>,
    E: Debug,
{
    const READ_SIZE: usize = 1;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        check_read(self, offset, bytes.len())?;
        M25P::read(self, Address(offset), bytes)
    }

    fn capacity(&self) -> usize {
        self.info().capacity() as usize
    }
}

impl<T, E> NorFlash for M25P<T>
where
    T: Transport<Error = E>,
    E: Debug,
{
    const WRITE_SIZE: usize = 1;
    const ERASE_SIZE: usize = SECTOR_SIZE as usize;

    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        check_erase(self, from, to)?;
        for sector in from / SECTOR_SIZE..to / SECTOR_SIZE {
            self.erase_sector(sector)?;
        }
        Ok(())
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        check_write(self, offset, bytes.len())?;

        let mut cursor = offset;
        let mut bytes = bytes;
        while !bytes.is_empty() {
            // Never cross a page boundary, the chip would wrap to the page start
            let page_remain = (PAGE_SIZE - cursor % PAGE_SIZE) as usize;
            let (now, later) = bytes.split_at(page_remain.min(bytes.len()));
            self.program(Address(cursor), now)?;
            cursor += now.len() as u32;
            bytes = later;
        }
        Ok(())
    }
}

impl<T, E> MultiwriteNorFlash for M25P<T>
where
    T: Transport<Error = E>,
    E: Debug,
{
}
