pub mod actor;
pub mod guest;
pub mod reservation;
pub mod room;

pub use actor::Actor;
pub use guest::{Guest, GuestIdentity};
pub use reservation::{
    BookingConfirmation, BookingRequest, CancellationOutcome, PaymentStatus, Reservation,
    ReservationStatus, ReservationUpdate, StayDates,
};
pub use room::{NewRoom, Room, RoomChanges, RoomFilter, RoomStatus, RoomType};
