use crate::address::Address;

/// Instruction opcodes understood by the M25P16 and M25PX16
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    WriteEnable = 0x06,
    WriteDisable = 0x04,
    ReadIdentification = 0x9F,
    ReadStatus = 0x05,
    WriteStatus = 0x01,
    ReadData = 0x03,
    PageProgram = 0x02,
    SectorErase = 0xD8,
    BulkErase = 0xC7,
    DeepPowerDown = 0xB9,
    ReleaseFromDeepPowerDown = 0xAB,
    /// M25PX16 only
    WriteLockRegister = 0xE5,
    /// M25PX16 only
    ReadLockRegister = 0xE8,
}

impl Opcode {
    /// Commands that start a self-timed cycle or change protection state, and
    /// therefore need the write enable latch set beforehand.
    pub fn is_mutating(self) -> bool {
        matches!(
            self,
            Opcode::PageProgram
                | Opcode::SectorErase
                | Opcode::BulkErase
                | Opcode::WriteStatus
                | Opcode::WriteLockRegister
        )
    }
}

/// What follows the opcode and address on the bus
#[derive(Debug)]
pub enum Payload<'a> {
    None,
    /// Bytes shifted out after the header
    Out(&'a [u8]),
    /// Bytes captured after the header, one per clocked byte
    In(&'a mut [u8]),
}

/// One chip instruction, ready to be framed in a single transaction
#[derive(Debug)]
pub struct Command<'a> {
    pub opcode: Opcode,
    pub address: Option<Address>,
    pub payload: Payload<'a>,
}

/// Opcode plus optional address, at most four bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    bytes: [u8; 4],
    len: usize,
}

impl Header {
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

impl<'a> Command<'a> {
    pub fn new(opcode: Opcode) -> Self {
        Self {
            opcode,
            address: None,
            payload: Payload::None,
        }
    }

    pub fn at(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    pub fn write(mut self, data: &'a [u8]) -> Self {
        self.payload = Payload::Out(data);
        self
    }

    pub fn read(mut self, buff: &'a mut [u8]) -> Self {
        self.payload = Payload::In(buff);
        self
    }

    /// The opcode followed by the 24-bit address, most significant byte first.
    pub fn header(&self) -> Header {
        let mut bytes = [self.opcode as u8, 0, 0, 0];
        let len = match self.address {
            Some(addr) => {
                bytes[1..].copy_from_slice(&addr.to_be_bytes());
                4
            }
            None => 1,
        };
        Header { bytes, len }
    }

    /// Number of bytes to capture after the header.
    pub fn response_len(&self) -> usize {
        match &self.payload {
            Payload::In(buff) => buff.len(),
            _ => 0,
        }
    }

    /// Total bytes clocked on the bus for this command.
    pub fn frame_len(&self) -> usize {
        let payload = match &self.payload {
            Payload::None => 0,
            Payload::Out(data) => data.len(),
            Payload::In(buff) => buff.len(),
        };
        self.header().len + payload
    }
}
