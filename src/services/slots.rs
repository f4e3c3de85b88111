//! Slot generation: which start times can take a booking of a given length
//!
//! Conflict rule between a candidate `[s, e)` and a booked `[b.start, b.end)`:
//! they conflict when the half-open ranges overlap, and also when the
//! candidate starts exactly at `b.start`, starts exactly at `b.end`, or ends
//! exactly at `b.end`. A candidate ending exactly at `b.start` is free. This
//! touch rule blocks back-to-back bookings after an existing appointment and
//! is kept for compatibility with the booking bot's existing schedule.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{working_hours::day_of_week, Appointment},
    services::{
        calendar::{local_to_utc, CalendarService},
        catalog::CatalogService,
        ledger::Ledger,
    },
};

/// A booked time range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl From<&Appointment> for Interval {
    fn from(a: &Appointment) -> Self {
        Self {
            start: a.start_time,
            end: a.end_time,
        }
    }
}

/// Whether a candidate range collides with a booked one
pub fn conflicts(start: DateTime<Utc>, end: DateTime<Utc>, booked: &Interval) -> bool {
    let overlap = start < booked.end && end > booked.start;
    let touches = start == booked.start || start == booked.end || end == booked.end;
    overlap || touches
}

/// Step through `[window_start, window_end)` every `granularity` for a free range of `duration`
///
/// Returns ascending start times. `duration` and `granularity` must be positive;
/// otherwise nothing is offered.
pub fn compute_slots(
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    duration: Duration,
    granularity: Duration,
    booked: &[Interval],
) -> Vec<DateTime<Utc>> {
    let mut slots = Vec::new();
    if duration <= Duration::zero() || granularity <= Duration::zero() {
        return slots;
    }

    let mut cursor = window_start;
    while cursor + duration <= window_end {
        let end = cursor + duration;
        if !booked.iter().any(|b| conflicts(cursor, end, b)) {
            slots.push(cursor);
        }
        cursor += granularity;
    }
    slots
}

/// Read-only slot generator over catalog, calendar and ledger
#[derive(Clone)]
pub struct SlotService {
    catalog: CatalogService,
    calendar: CalendarService,
    ledger: Ledger,
    tz: Tz,
    granularity: Duration,
}

impl SlotService {
    pub fn new(
        catalog: CatalogService,
        calendar: CalendarService,
        ledger: Ledger,
        tz: Tz,
        granularity_minutes: i64,
    ) -> Self {
        Self {
            catalog,
            calendar,
            ledger,
            tz,
            granularity: Duration::minutes(granularity_minutes),
        }
    }

    /// Bookable start times on `date` for the combined duration of `service_ids`
    ///
    /// A closed day yields an empty list. Past dates are computed like any other.
    pub async fn available_slots(
        &self,
        service_ids: &[Uuid],
        date: NaiveDate,
    ) -> AppResult<Vec<DateTime<Utc>>> {
        let window = match self.calendar.window_for(day_of_week(date)).await {
            Ok(window) => window,
            Err(AppError::NoWindowConfigured(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let selection = self.catalog.resolve_bookable(service_ids).await?;

        let booked: Vec<Interval> = self
            .ledger
            .appointments_on(date)
            .await?
            .iter()
            .filter(|a| a.status.blocks_slots())
            .map(Interval::from)
            .collect();

        let (Some(open), Some(close)) = (
            local_to_utc(&self.tz, date, window.start_time),
            local_to_utc(&self.tz, date, window.end_time),
        ) else {
            tracing::warn!("Operating window for {} falls into a DST gap", date);
            return Ok(Vec::new());
        };

        let slots = compute_slots(
            open,
            close,
            Duration::minutes(selection.total_minutes),
            self.granularity,
            &booked,
        );

        tracing::debug!(
            "Computed {} slots on {} for {} min ({} booked)",
            slots.len(),
            date,
            selection.total_minutes,
            booked.len()
        );
        Ok(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 6, 3, h, m, 0).unwrap()
    }

    fn interval(from: (u32, u32), to: (u32, u32)) -> Interval {
        Interval {
            start: at(from.0, from.1),
            end: at(to.0, to.1),
        }
    }

    fn hhmm(slots: &[DateTime<Utc>]) -> Vec<String> {
        slots.iter().map(|s| s.format("%H:%M").to_string()).collect()
    }

    #[test]
    fn test_empty_ledger_offers_every_step() {
        let slots = compute_slots(
            at(9, 0),
            at(12, 0),
            Duration::minutes(60),
            Duration::minutes(30),
            &[],
        );
        assert_eq!(hhmm(&slots), vec!["09:00", "09:30", "10:00", "10:30", "11:00"]);
    }

    #[test]
    fn test_scenario_one_booking_midday() {
        let booked = [interval((12, 0), (13, 0))];
        let slots = compute_slots(
            at(9, 0),
            at(18, 0),
            Duration::minutes(60),
            Duration::minutes(30),
            &booked,
        );
        assert_eq!(
            hhmm(&slots),
            vec![
                "09:00", "09:30", "10:00", "10:30", "11:00", "13:30", "14:00", "14:30", "15:00",
                "15:30", "16:00", "16:30", "17:00"
            ]
        );
    }

    #[test]
    fn test_touch_rule() {
        let booked = interval((12, 0), (13, 0));
        // ends exactly at booked start: free
        assert!(!conflicts(at(11, 0), at(12, 0), &booked));
        // starts exactly at booked end
        assert!(conflicts(at(13, 0), at(14, 0), &booked));
        // same start
        assert!(conflicts(at(12, 0), at(12, 15), &booked));
        // same end, starting inside
        assert!(conflicts(at(12, 30), at(13, 0), &booked));
        // plain overlap
        assert!(conflicts(at(11, 30), at(12, 30), &booked));
        // well clear
        assert!(!conflicts(at(14, 0), at(15, 0), &booked));
    }

    #[test]
    fn test_no_slot_overlaps_or_touches_booking() {
        let booked = [interval((10, 15), (11, 0)), interval((14, 0), (15, 30))];
        let duration = Duration::minutes(45);
        let slots = compute_slots(at(9, 0), at(18, 0), duration, Duration::minutes(15), &booked);

        assert!(!slots.is_empty());
        for s in &slots {
            for b in &booked {
                assert!(!(*s < b.end && *s + duration > b.start));
                assert_ne!(*s, b.start);
                assert_ne!(*s + duration, b.end);
            }
        }
        assert!(slots.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_duration_longer_than_window() {
        let slots = compute_slots(
            at(9, 0),
            at(10, 0),
            Duration::minutes(90),
            Duration::minutes(30),
            &[],
        );
        assert!(slots.is_empty());
    }

    #[test]
    fn test_last_slot_ends_at_close() {
        let slots = compute_slots(
            at(9, 0),
            at(10, 0),
            Duration::minutes(60),
            Duration::minutes(30),
            &[],
        );
        assert_eq!(hhmm(&slots), vec!["09:00"]);
    }

    #[test]
    fn test_non_positive_inputs_offer_nothing() {
        assert!(compute_slots(at(9, 0), at(18, 0), Duration::zero(), Duration::minutes(30), &[])
            .is_empty());
        assert!(compute_slots(at(9, 0), at(18, 0), Duration::minutes(30), Duration::zero(), &[])
            .is_empty());
    }
}
