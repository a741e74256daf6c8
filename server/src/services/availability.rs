use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::policy::{BookingPolicy, Pricing};
use crate::collaborators::Clock;
use crate::error::{ReservationError, Result};
use crate::models::{Room, RoomFilter, RoomType, StayDates};
use crate::store::ReservationStore;

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityQuery {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub room_type: Option<RoomType>,
    pub min_capacity: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomAvailability {
    pub room: Room,
    pub nights: i64,
    pub pricing: Pricing,
}

/// Today is still bookable; anything earlier is not.
pub(crate) fn ensure_not_past(stay: &StayDates, now: DateTime<Utc>) -> Result<()> {
    let today = now.date_naive();
    if stay.check_in() < today {
        return Err(ReservationError::CheckInInPast {
            check_in: stay.check_in(),
            today,
        });
    }
    Ok(())
}

/// Read-only availability search. Nothing is held between a search and a
/// booking; the booking flow checks again under the room lock.
#[derive(Clone)]
pub struct AvailabilityResolver {
    store: Arc<dyn ReservationStore>,
    clock: Arc<dyn Clock>,
    policy: BookingPolicy,
}

impl AvailabilityResolver {
    pub fn new(store: Arc<dyn ReservationStore>, clock: Arc<dyn Clock>, policy: BookingPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    pub async fn find_available_rooms(&self, query: &AvailabilityQuery) -> Result<Vec<RoomAvailability>> {
        let stay = StayDates::new(query.check_in, query.check_out)?;
        ensure_not_past(&stay, self.clock.now())?;
        if let Some(min) = query.min_capacity {
            if min < 1 {
                return Err(ReservationError::Validation(format!(
                    "minimum capacity must be at least 1, got {min}"
                )));
            }
        }

        let filter = RoomFilter {
            room_type: query.room_type,
            min_capacity: query.min_capacity,
        };
        let candidates = self.store.rooms(&filter).await?;
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let room_ids: Vec<Uuid> = candidates.iter().map(|room| room.id).collect();
        let booked: HashSet<Uuid> = self
            .store
            .overlapping_reservations(&room_ids, &stay)
            .await?
            .into_iter()
            .map(|reservation| reservation.room_id)
            .collect();

        let available: Vec<RoomAvailability> = candidates
            .into_iter()
            .filter(|room| !booked.contains(&room.id))
            .map(|room| {
                let quote = self.policy.quote(room.price_per_night, &stay)?;
                Ok(RoomAvailability {
                    room,
                    nights: quote.nights,
                    pricing: quote.pricing,
                })
            })
            .collect::<Result<_>>()?;

        tracing::debug!(
            check_in = %stay.check_in(),
            check_out = %stay.check_out(),
            candidates = room_ids.len(),
            available = available.len(),
            "Availability resolved"
        );
        Ok(available)
    }
}
