//! Simulated M25P16/M25PX16 behind the `Transport` trait.
//!
//! Decodes each transaction when chip select is released, the way the real
//! chip does, and records every transmitted frame for inspection.

#![allow(dead_code)]

use std::collections::VecDeque;

use m25p::transport::Transport;

pub const CAPACITY: usize = 2 * 1024 * 1024;
pub const SECTOR: usize = 0x10000;
pub const PAGE: usize = 0x100;
pub const SECTORS: usize = CAPACITY / SECTOR;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    NotSelected,
    Injected,
}

pub struct SimChip {
    pub memory: Vec<u8>,
    pub lockable: bool,
    pub jedec: [u8; 3],
    pub cfd: Vec<u8>,
    /// Lock register per sector, bit 0 write lock, bit 1 lock down
    pub locks: [u8; SECTORS],
    /// SRWD and BP bits
    pub status: u8,
    pub wel: bool,
    /// Status reads still reporting busy for the running cycle
    pub busy_reads: usize,
    /// Busy reads each new cycle takes
    pub cycle_reads: usize,
    /// Raw bytes to answer status reads with, before the live value
    pub status_script: VecDeque<u8>,
    pub powered_down: bool,
    /// Fail the n-th byte transfer from now on
    pub fail_after: Option<usize>,

    pub frames: Vec<Vec<u8>>,
    pub transfers: usize,
    pub inits: usize,
    selected: bool,
    current: Vec<u8>,
}

impl SimChip {
    pub fn m25p16() -> Self {
        Self::new(false, [0x20, 0x20, 0x15])
    }

    pub fn m25px16() -> Self {
        Self::new(true, [0x20, 0x71, 0x15])
    }

    fn new(lockable: bool, jedec: [u8; 3]) -> Self {
        Self {
            memory: vec![0xFF; CAPACITY],
            lockable,
            jedec,
            cfd: vec![0x00; 16],
            locks: [0; SECTORS],
            status: 0,
            wel: false,
            busy_reads: 0,
            cycle_reads: 2,
            status_script: VecDeque::new(),
            powered_down: false,
            fail_after: None,
            frames: Vec::new(),
            transfers: 0,
            inits: 0,
            selected: false,
            current: Vec::new(),
        }
    }

    /// Forget recorded frames
    pub fn clear_log(&mut self) {
        self.frames.clear();
        self.transfers = 0;
    }

    /// Opcodes of the recorded frames, in order
    pub fn opcodes(&self) -> Vec<u8> {
        self.frames.iter().map(|f| f[0]).collect()
    }

    /// Every transmitted byte, frames concatenated
    pub fn stream(&self) -> Vec<u8> {
        self.frames.concat()
    }

    fn status_byte(&self) -> u8 {
        let mut sr = self.status & 0b1001_1100;
        if self.wel {
            sr |= 0b10;
        }
        if self.busy_reads > 0 {
            sr |= 0b01;
        }
        sr
    }

    fn busy(&self) -> bool {
        self.busy_reads > 0
    }

    fn bp_protected(&self, addr: usize) -> bool {
        let bp = (self.status >> 2) & 0x07;
        let count = match bp {
            0 => 0,
            1..=5 => SECTORS >> (6 - bp),
            _ => SECTORS,
        };
        addr / SECTOR >= SECTORS - count
    }

    fn write_locked(&self, addr: usize) -> bool {
        self.lockable && self.locks[addr / SECTOR] & 0b01 != 0
    }

    fn address(frame: &[u8]) -> Option<usize> {
        if frame.len() < 4 {
            return None;
        }
        Some((frame[1] as usize) << 16 | (frame[2] as usize) << 8 | frame[3] as usize)
    }

    /// Byte the chip drives at position `idx` of the current frame
    fn respond(&mut self, idx: usize) -> u8 {
        if self.powered_down || idx == 0 {
            return 0xFF;
        }
        let opcode = self.current[0];
        match opcode {
            0x05 => match self.status_script.pop_front() {
                Some(scripted) => scripted,
                None => {
                    let sr = self.status_byte();
                    self.busy_reads = self.busy_reads.saturating_sub(1);
                    sr
                }
            },
            0x9F => match idx {
                1..=3 => self.jedec[idx - 1],
                4 => self.cfd.len() as u8,
                n => self.cfd.get(n - 5).copied().unwrap_or(0),
            },
            0x03 if idx >= 4 && !self.busy() => {
                let addr = Self::address(&self.current).unwrap_or(0);
                self.memory[(addr + idx - 4) % CAPACITY]
            }
            0xE8 if self.lockable && idx == 4 && !self.busy() => {
                let addr = Self::address(&self.current).unwrap_or(0);
                self.locks[(addr % CAPACITY) / SECTOR]
            }
            _ => 0xFF,
        }
    }

    /// Apply a completed frame, as on the rising chip select edge
    fn execute(&mut self, frame: &[u8]) {
        let opcode = frame[0];
        if self.powered_down {
            if opcode == 0xAB {
                self.powered_down = false;
            }
            return;
        }
        if self.busy() && opcode != 0x05 {
            // rejected while a cycle runs
            return;
        }
        match opcode {
            0x06 if frame.len() == 1 => self.wel = true,
            0x04 if frame.len() == 1 => self.wel = false,
            0xB9 if frame.len() == 1 => self.powered_down = true,
            0x01 if self.wel && frame.len() == 2 => {
                self.status = frame[1] & 0b1001_1100;
                self.start_cycle();
            }
            0x02 if self.wel && frame.len() > 4 => {
                let addr = Self::address(frame).unwrap_or(0) % CAPACITY;
                if !self.bp_protected(addr) && !self.write_locked(addr) {
                    let base = addr & !(PAGE - 1);
                    let data = &frame[4..];
                    // only the last 256 bytes count
                    let data = &data[data.len().saturating_sub(PAGE)..];
                    for (i, byte) in data.iter().enumerate() {
                        let at = base + ((addr + i) % PAGE);
                        self.memory[at] &= byte;
                    }
                }
                self.start_cycle();
            }
            0xD8 if self.wel && frame.len() == 4 => {
                let addr = Self::address(frame).unwrap_or(0) % CAPACITY;
                if !self.bp_protected(addr) && !self.write_locked(addr) {
                    let base = addr & !(SECTOR - 1);
                    self.memory[base..base + SECTOR].fill(0xFF);
                }
                self.start_cycle();
            }
            0xC7 if self.wel && frame.len() == 1 => {
                if self.status & 0b0001_1100 == 0 {
                    self.memory.fill(0xFF);
                }
                self.start_cycle();
            }
            0xE5 if self.lockable && self.wel && frame.len() == 5 => {
                let sector = (Self::address(frame).unwrap_or(0) % CAPACITY) / SECTOR;
                if self.locks[sector] & 0b10 == 0 {
                    self.locks[sector] = frame[4] & 0b11;
                }
                // volatile, no timed cycle
                self.wel = false;
            }
            _ => {}
        }
    }

    fn start_cycle(&mut self) {
        self.busy_reads = self.cycle_reads;
        // the real chip clears the latch before the cycle ends
        self.wel = false;
    }
}

impl Transport for SimChip {
    type Error = SimError;

    fn init(&mut self) -> Result<(), SimError> {
        self.inits += 1;
        Ok(())
    }

    fn begin_transaction(&mut self) -> Result<(), SimError> {
        self.selected = true;
        self.current.clear();
        Ok(())
    }

    fn end_transaction(&mut self) -> Result<(), SimError> {
        if !self.selected {
            return Err(SimError::NotSelected);
        }
        self.selected = false;
        let frame = std::mem::take(&mut self.current);
        if !frame.is_empty() {
            self.execute(&frame);
            self.frames.push(frame);
        }
        Ok(())
    }

    fn transfer_byte(&mut self, out: u8) -> Result<u8, SimError> {
        if !self.selected {
            return Err(SimError::NotSelected);
        }
        if let Some(n) = self.fail_after.as_mut() {
            if *n == 0 {
                return Err(SimError::Injected);
            }
            *n -= 1;
        }
        self.transfers += 1;
        let idx = self.current.len();
        self.current.push(out);
        Ok(self.respond(idx))
    }
}
