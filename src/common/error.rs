// src/common/error.rs

/// Unified error type for the driver and the acquisition service.
///
/// `E` is the transport implementation's own error type; it only needs
/// `Debug` so it can be carried through the `Bus` variant and printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Aht21Error<E = ()>
where
    E: core::fmt::Debug,
{
    /// Underlying bus error reported by the transport implementation.
    #[error("bus error: {0:?}")]
    Bus(E),

    /// A bus primitive kept reporting `WouldBlock` past its deadline.
    #[error("bus operation timed out")]
    Timeout,

    /// A required transport/timebase capability is absent from a
    /// function-pointer table. Construction-time, fatal to that attempt.
    #[error("required capability `{0}` is missing")]
    MissingCapability(&'static str),

    /// The device did not answer at the fixed bus address (0x38).
    #[error("device did not answer at its fixed bus address")]
    IdentityMismatch,

    /// Operation invoked on a handle with no transport binding.
    #[error("sensor handle is not bound")]
    NotBound,

    /// Operation invoked before the power-up handshake completed.
    #[error("sensor has not been initialized")]
    NotInitialized,

    /// The handle latched a fault (identity mismatch or transport failure)
    /// and must be unbound and rebound before further use.
    #[error("sensor handle is faulted")]
    Faulted,

    /// The busy bit was set when the measurement frame was read. Recoverable:
    /// retry the measurement cycle.
    #[error("measurement not finished (busy bit set)")]
    MeasurementNotReady,

    /// The request selects neither temperature nor humidity.
    #[error("request selects no data")]
    InvalidRequest,

    /// The acquisition lock could not be taken within the caller's budget.
    /// Surfaced to the waiting caller only; the cache is untouched.
    #[error("timed out waiting for the acquisition lock")]
    LockTimeout,
}

// Allow mapping from the underlying transport error with `?`.
impl<E: core::fmt::Debug> From<E> for Aht21Error<E> {
    fn from(e: E) -> Self {
        Aht21Error::Bus(e)
    }
}
