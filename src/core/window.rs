use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

/// One calendar-month backfill window. Bounds cover the whole month in UTC:
/// first instant of day 1 through 23:59:59 on the last day, with the last
/// day derived from the calendar (leap years included).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    pub year: i32,
    pub month: u32,
}

impl MonthWindow {
    pub fn new(year: i32, month: u32) -> Self {
        debug_assert!((1..=12).contains(&month), "month out of range: {month}");
        Self { year, month }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or_else(|| panic!("invalid window {}-{}", self.year, self.month))
    }

    pub fn last_day(&self) -> NaiveDate {
        let next = self.succ();
        next.first_day() - Duration::days(1)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.first_day()
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always valid")
            .and_utc()
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.last_day()
            .and_hms_opt(23, 59, 59)
            .expect("23:59:59 is always valid")
            .and_utc()
    }

    /// The next calendar month, rolling December into January of the
    /// following year.
    pub fn succ(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Whether this window lies entirely after the given date, i.e. a
    /// backfill that reached it has caught up to the present.
    pub fn starts_after(&self, today: NaiveDate) -> bool {
        (self.year, self.month) > (today.year(), today.month())
    }
}
