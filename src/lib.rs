#![no_std]
//! This is a platform agnostic library for the Micron M25P16 and M25PX16 serial NOR flash.
//!
//! Multiple chips are supported:
//! * M25P16, 16Mb, 32 sectors of 64kB
//! * M25PX16, same array with an additional lock register per sector
//!
//! The bus is reached through the [`transport::Transport`] trait. Use
//! [`transport::SpiTransport`] to run on any [embedded-hal](https://github.com/rust-embedded/embedded-hal)
//! SPI bus with a chip select pin, or provide your own.
//!
//! ```ignore
//! let mut flash = M25P::m25p16(SpiTransport::new(spi, cs));
//! flash.init()?;
//! flash.erase_sector(0)?;
//! flash.write_page(0, &[0x42; 256])?;
//! ```

pub mod address;
pub mod command;
pub mod config;
pub mod cycle;
pub mod error;
pub mod flash;
pub mod lowlevel;
pub mod profile;
pub mod register;
mod storage;
mod transaction;
pub mod transport;

pub use crate::{
    config::{Config, PollLimit},
    error::Error,
    flash::{LockRegisters, M25P},
    profile::{DeviceProfile, Variant},
};

pub const SECTOR_SIZE: u32 = 0x010000;
pub const PAGE_SIZE: u32 = 0x100;
