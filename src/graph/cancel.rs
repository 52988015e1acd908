use std::{
    fmt,
    sync::{atomic::{AtomicU8, Ordering}, Arc},
};

/// Why a scan stopped before visiting every row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum CancelReason {
    /// [`CancelToken::cancel`] was called.
    Requested = 1,
    /// The configured timeout elapsed.
    Timeout = 2,
    /// More predicate failures than the configured limit.
    PredicateFailures = 3,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Requested => "cancellation requested",
            Self::Timeout => "timeout elapsed",
            Self::PredicateFailures => "too many predicate failures",
        })
    }
}

/// Shared cancellation flag, polled by workers between outer rows.
///
/// Cloning shares the flag. The first reason recorded wins.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicU8>);

impl CancelToken {
    pub fn new() -> Self { Self::default() }

    /// Request that the scan stop after the rows currently in flight.
    pub fn cancel(&self) { self.cancel_with(CancelReason::Requested); }

    pub(crate) fn cancel_with(&self, reason: CancelReason) {
        let _ = self.0.compare_exchange(0, reason as u8, Ordering::AcqRel, Ordering::Acquire);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool { self.0.load(Ordering::Acquire) != 0 }

    /// The reason recorded by the first cancellation, if any.
    pub fn reason(&self) -> Option<CancelReason> {
        match self.0.load(Ordering::Acquire) {
            1 => Some(CancelReason::Requested),
            2 => Some(CancelReason::Timeout),
            3 => Some(CancelReason::PredicateFailures),
            _ => None,
        }
    }
}
