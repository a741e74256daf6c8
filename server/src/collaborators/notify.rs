use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Reservation;

#[derive(Debug, Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

/// Guest-facing messages about a reservation. Rendering and delivery live
/// outside the engine.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_booking_confirmation(&self, reservation: &Reservation) -> Result<(), NotifyError>;

    async fn send_booking_cancellation(&self, reservation: &Reservation) -> Result<(), NotifyError>;
}

/// Writes the notification to the log instead of delivering it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_booking_confirmation(&self, reservation: &Reservation) -> Result<(), NotifyError> {
        tracing::info!(
            reference = %reservation.reference,
            guest_id = %reservation.guest_id,
            "Booking confirmation queued"
        );
        Ok(())
    }

    async fn send_booking_cancellation(&self, reservation: &Reservation) -> Result<(), NotifyError> {
        tracing::info!(
            reference = %reservation.reference,
            guest_id = %reservation.guest_id,
            "Booking cancellation queued"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Notice {
    Confirmation,
    Cancellation,
}

/// Fire-and-forget delivery. Failures are logged and go nowhere else.
pub(crate) fn dispatch(notifier: Arc<dyn Notifier>, notice: Notice, reservation: Reservation) {
    tokio::spawn(async move {
        let result = match notice {
            Notice::Confirmation => notifier.send_booking_confirmation(&reservation).await,
            Notice::Cancellation => notifier.send_booking_cancellation(&reservation).await,
        };
        if let Err(e) = result {
            tracing::warn!(
                error = %e,
                reference = %reservation.reference,
                notice = ?notice,
                "Notification failed; reservation unaffected"
            );
        }
    });
}
