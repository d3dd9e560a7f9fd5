//! Driver error type and exit codes

use core::fmt;

/// Exit code reported for a successful operation
pub const SUCCESS: i8 = 0;

/// Errors returned by caller-context operations
///
/// Bus faults are not reported here. They happen inside the interrupt
/// handler and are recorded for [`crate::TwiSlave::last_error`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Receive finished with fewer bytes than requested
    ProtocolError,
    /// A transaction is already in progress
    Busy,
    /// Data is absent or the configuration is invalid
    InvalidArgument,
    /// Requested size exceeds the buffer capacity
    TooLarge,
    /// The wait policy gave up before the transfer completed
    Timeout,
    /// `initialize` has not been called
    NotInitialized,
}

impl Error {
    /// Signed exit code (negative = failure)
    pub const fn code(self) -> i8 {
        match self {
            Error::ProtocolError => -1,
            Error::Busy => -2,
            Error::InvalidArgument => -3,
            Error::TooLarge => -6,
            Error::Timeout => -7,
            Error::NotInitialized => -8,
        }
    }

    /// Collapse an operation result into its exit code
    pub fn exit_code(result: Result<(), Error>) -> i8 {
        match result {
            Ok(()) => SUCCESS,
            Err(e) => e.code(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Error::ProtocolError => "incomplete transfer",
            Error::Busy => "transaction in progress",
            Error::InvalidArgument => "invalid argument",
            Error::TooLarge => "request exceeds buffer capacity",
            Error::Timeout => "timed out waiting for transfer",
            Error::NotInitialized => "driver not initialized",
        };
        f.write_str(msg)
    }
}
