//! Platform power-off primitive.

/// Requests an immediate platform power-off.
///
/// The call may return — some platforms take time to actually drop power, and
/// a request can be lost. Callers that depend on the machine halting must
/// retry in a loop rather than assume a single call suffices.
pub trait SystemPower {
    /// Request platform power-off. May return; retry if it does.
    fn power_off(&mut self);
}
