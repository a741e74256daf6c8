//! Interfaces the engine consumes from the rest of the platform.

pub mod clock;
pub mod guests;
pub mod notify;

pub use clock::{Clock, ManualClock, SystemClock};
pub use guests::{GuestDirectory, MemoryGuestDirectory, PgGuestDirectory};
pub use notify::{LogNotifier, Notifier, NotifyError};
