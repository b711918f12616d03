use crate::{
    command::{Command, Payload},
    transport::Transport,
};

/// Run one command as one chip select transaction.
///
/// The header and any outgoing payload are shifted out byte by byte. For an
/// incoming payload a zero byte is shifted out per captured byte. Chip select
/// is released even when a transfer fails; the first error wins.
pub(crate) fn execute<T: Transport>(transport: &mut T, cmd: Command<'_>) -> Result<(), T::Error> {
    transport.begin_transaction()?;
    let res = shift(transport, cmd);
    let released = transport.end_transaction();

    #[cfg(feature = "defmt")]
    if res.is_err() || released.is_err() {
        defmt::error!("Transaction failed");
    }

    res?;
    released
}

fn shift<T: Transport>(transport: &mut T, cmd: Command<'_>) -> Result<(), T::Error> {
    let header = cmd.header();
    for &byte in header.as_slice() {
        transport.transfer_byte(byte)?;
    }

    match cmd.payload {
        Payload::None => {}
        Payload::Out(data) => {
            for &byte in data {
                transport.transfer_byte(byte)?;
            }
        }
        Payload::In(buff) => {
            for slot in buff.iter_mut() {
                *slot = transport.transfer_byte(0x00)?;
            }
        }
    }
    Ok(())
}
