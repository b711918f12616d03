/// All possible errors emitted by the driver
///
/// Geometry and size errors are raised before any bus activity.
///
/// A program or erase aimed at a region covered by the block-protect bits or
/// a sector write lock is accepted by the chip and completes a normal busy/ready
/// cycle without changing the array. No variant reports this: the status
/// register looks the same as after a successful write, so callers that need
/// certainty must read the data back and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<TransportError> {
    /// Transport failure, passed through unchanged
    Transport(TransportError),

    /// Page, sector or address outside of the chip geometry
    OutOfBounds,

    /// Payload larger than a page
    TooLarge,

    /// Invalid value passed
    Value,

    /// Address not aligned
    NotAligned,

    /// The busy poll gave up before the write-in-progress bit cleared.
    /// The chip keeps running the cycle regardless.
    Timeout,

    /// The chip is in deep power down and ignores everything but the release
    /// instruction
    PoweredDown,

    /// The sector lock register has its lock-down bit set and cannot change
    /// until the next power cycle
    LockedDown,
}
