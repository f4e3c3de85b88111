//! Operating calendar: working hours and bookable dates

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::{
    error::{AppError, AppResult},
    models::{
        working_hours::{day_of_week, UpsertOperatingWindow},
        OperatingWindow,
    },
    repository::Repository,
};

/// Convert a local wall-clock time to UTC; `None` inside a DST gap
pub fn local_to_utc(tz: &Tz, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// `[start, end)` of a local calendar day, in UTC
pub fn day_bounds(tz: &Tz, date: NaiveDate) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
    let start = local_day_start(tz, date)?;
    let next = date
        .succ_opt()
        .ok_or_else(|| AppError::Validation(format!("date {} out of range", date)))?;
    let end = local_day_start(tz, next)?;
    Ok((start, end))
}

fn local_day_start(tz: &Tz, date: NaiveDate) -> AppResult<DateTime<Utc>> {
    // Some zones skip midnight on DST days; the first valid hour starts the day
    (0..3)
        .filter_map(|h| NaiveTime::from_hms_opt(h, 0, 0))
        .find_map(|t| local_to_utc(tz, date, t))
        .ok_or_else(|| AppError::Internal(format!("no local midnight for {} in {}", date, tz)))
}

/// The calendar date of a UTC instant in the operating timezone
pub fn local_date(tz: &Tz, at: DateTime<Utc>) -> NaiveDate {
    at.with_timezone(tz).date_naive()
}

#[derive(Clone)]
pub struct CalendarService {
    repository: Repository,
    tz: Tz,
}

impl CalendarService {
    pub fn new(repository: Repository, tz: Tz) -> Self {
        Self { repository, tz }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// The single active window for a weekday (0=Sunday)
    pub async fn window_for(&self, day: i16) -> AppResult<OperatingWindow> {
        let mut windows = self.repository.calendar.active_windows_for_day(day).await?;
        match windows.len() {
            0 => Err(AppError::NoWindowConfigured(day)),
            1 => Ok(windows.remove(0)),
            _ => Err(AppError::AmbiguousWindow(day)),
        }
    }

    pub async fn list_windows(&self) -> AppResult<Vec<OperatingWindow>> {
        self.repository.calendar.list_windows().await
    }

    /// Replace the active window of a weekday
    ///
    /// The previous active window for that day, if any, is deactivated in the
    /// same write, so saving an inactive window closes the day.
    pub async fn set_window(&self, data: &UpsertOperatingWindow) -> AppResult<OperatingWindow> {
        let (start, end) = data.parse_times()?;
        let mut window = OperatingWindow::new(data.day_of_week, start, end)?;
        window.is_active = data.is_active.unwrap_or(true);

        self.repository.calendar.replace_window(&window).await?;
        tracing::info!(
            "Working hours for day {} set to {}-{} (active: {})",
            window.day_of_week,
            window.start_time,
            window.end_time,
            window.is_active
        );
        Ok(window)
    }

    /// Open days in the next `horizon_days` days starting today, at opening time
    pub async fn candidate_dates(&self, horizon_days: u32) -> AppResult<Vec<DateTime<Utc>>> {
        let today = local_date(&self.tz, Utc::now());
        self.candidate_dates_from(today, horizon_days).await
    }

    pub async fn candidate_dates_from(
        &self,
        today: NaiveDate,
        horizon_days: u32,
    ) -> AppResult<Vec<DateTime<Utc>>> {
        let windows = self.repository.calendar.list_windows().await?;

        let mut dates = Vec::new();
        for offset in 0..i64::from(horizon_days) {
            let date = today + Duration::days(offset);
            let day = day_of_week(date);
            let mut active = windows.iter().filter(|w| w.is_active && w.day_of_week == day);
            let window = match (active.next(), active.next()) {
                (None, _) => continue,
                (Some(w), None) => w,
                (Some(_), Some(_)) => return Err(AppError::AmbiguousWindow(day)),
            };
            if let Some(opening) = local_to_utc(&self.tz, date, window.start_time) {
                dates.push(opening);
            }
        }
        Ok(dates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory::MemoryStore;
    use chrono::{Datelike, Timelike};

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn service_with(windows: Vec<OperatingWindow>) -> CalendarService {
        let store = MemoryStore::new();
        for w in windows {
            store.insert_window_unchecked(w).unwrap();
        }
        CalendarService::new(Repository::in_memory(store), chrono_tz::UTC)
    }

    #[tokio::test]
    async fn test_window_for_closed_day() {
        let calendar = service_with(vec![OperatingWindow::new(1, hm(9, 0), hm(18, 0)).unwrap()]);
        assert!(calendar.window_for(1).await.is_ok());
        let err = calendar.window_for(0).await.unwrap_err();
        assert!(matches!(err, AppError::NoWindowConfigured(0)));
    }

    #[tokio::test]
    async fn test_window_for_ignores_inactive() {
        let mut off = OperatingWindow::new(3, hm(9, 0), hm(12, 0)).unwrap();
        off.is_active = false;
        let calendar = service_with(vec![off]);
        assert!(matches!(
            calendar.window_for(3).await,
            Err(AppError::NoWindowConfigured(3))
        ));
    }

    #[tokio::test]
    async fn test_window_for_rejects_ambiguous_config() {
        let calendar = service_with(vec![
            OperatingWindow::new(2, hm(9, 0), hm(12, 0)).unwrap(),
            OperatingWindow::new(2, hm(13, 0), hm(18, 0)).unwrap(),
        ]);
        assert!(matches!(
            calendar.window_for(2).await,
            Err(AppError::AmbiguousWindow(2))
        ));
    }

    #[tokio::test]
    async fn test_candidate_dates_skip_closed_days() {
        // Open Monday (1) and Wednesday (3) only
        let calendar = service_with(vec![
            OperatingWindow::new(1, hm(9, 0), hm(18, 0)).unwrap(),
            OperatingWindow::new(3, hm(10, 30), hm(16, 0)).unwrap(),
        ]);
        // 2024-09-01 is a Sunday
        let today = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
        let dates = calendar.candidate_dates_from(today, 14).await.unwrap();

        let days: Vec<u32> = dates.iter().map(|d| d.date_naive().day()).collect();
        assert_eq!(days, vec![2, 4, 9, 11]);
        assert_eq!((dates[0].hour(), dates[0].minute()), (9, 0));
        assert_eq!((dates[1].hour(), dates[1].minute()), (10, 30));
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_set_window_replaces_active() {
        let calendar = service_with(vec![OperatingWindow::new(5, hm(9, 0), hm(18, 0)).unwrap()]);
        let updated = calendar
            .set_window(&UpsertOperatingWindow {
                day_of_week: 5,
                start_time: "10:00".to_string(),
                end_time: "14:00".to_string(),
                is_active: None,
            })
            .await
            .unwrap();

        let window = calendar.window_for(5).await.unwrap();
        assert_eq!(window.id, updated.id);
        assert_eq!(window.start_time, hm(10, 0));
        assert_eq!(calendar.list_windows().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_inactive_window_closes_day() {
        let calendar = service_with(vec![OperatingWindow::new(6, hm(9, 0), hm(18, 0)).unwrap()]);
        calendar
            .set_window(&UpsertOperatingWindow {
                day_of_week: 6,
                start_time: "09:00".to_string(),
                end_time: "18:00".to_string(),
                is_active: Some(false),
            })
            .await
            .unwrap();

        assert!(matches!(
            calendar.window_for(6).await,
            Err(AppError::NoWindowConfigured(6))
        ));
        let windows = calendar.list_windows().await.unwrap();
        assert_eq!(windows.len(), 2);
        assert!(windows.iter().all(|w| !w.is_active));
    }

    #[test]
    fn test_day_bounds_follow_timezone() {
        let tz: Tz = "Asia/Yekaterinburg".parse().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();
        let (start, end) = day_bounds(&tz, date).unwrap();
        // UTC+5, no DST
        assert_eq!(start.hour(), 19);
        assert_eq!(end - start, Duration::hours(24));
        assert_eq!(local_date(&tz, start), date);
    }
}
