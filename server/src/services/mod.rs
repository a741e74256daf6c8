//! The room reservation and availability engine.

use std::sync::Arc;

use crate::collaborators::{Clock, GuestDirectory, Notifier};
use crate::store::ReservationStore;

pub mod availability;
pub mod booking;
pub mod inventory;
pub mod ledger;
pub mod lifecycle;
pub mod policy;

#[cfg(test)]
pub(crate) mod testing;

pub use availability::{AvailabilityQuery, AvailabilityResolver, RoomAvailability};
pub use booking::BookingOrchestrator;
pub use inventory::RoomInventory;
pub use ledger::ReservationLedger;
pub use lifecycle::LifecycleManager;
pub use policy::{BookingPolicy, Pricing, Quote};

/// All engine components wired to one store, clock and set of collaborators.
#[derive(Clone)]
pub struct ReservationEngine {
    pub inventory: RoomInventory,
    pub availability: AvailabilityResolver,
    pub booking: BookingOrchestrator,
    pub lifecycle: LifecycleManager,
    pub ledger: ReservationLedger,
}

impl ReservationEngine {
    pub fn new(
        store: Arc<dyn ReservationStore>,
        guests: Arc<dyn GuestDirectory>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::with_policy(store, guests, notifier, clock, BookingPolicy::default())
    }

    pub fn with_policy(
        store: Arc<dyn ReservationStore>,
        guests: Arc<dyn GuestDirectory>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        policy: BookingPolicy,
    ) -> Self {
        Self {
            inventory: RoomInventory::new(Arc::clone(&store), Arc::clone(&clock)),
            availability: AvailabilityResolver::new(Arc::clone(&store), Arc::clone(&clock), policy),
            booking: BookingOrchestrator::new(
                Arc::clone(&store),
                guests,
                Arc::clone(&notifier),
                Arc::clone(&clock),
                policy,
            ),
            lifecycle: LifecycleManager::new(Arc::clone(&store), notifier, clock, policy),
            ledger: ReservationLedger::new(store),
        }
    }
}
