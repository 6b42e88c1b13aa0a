// src/common/calendar.rs
//
// Cálculo dos intervalos de datas exibidos pelo calendário (dia, semana, mês).
// As semanas começam na segunda-feira.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::common::error::AppError;

/// Maior intervalo aceito numa consulta explícita `start..=end`
pub const MAX_RANGE_DAYS: i64 = 62;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CalendarView {
    Day,
    Week,
    Month,
}

/// Intervalo inclusivo de datas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn for_view(view: CalendarView, date: NaiveDate) -> Self {
        match view {
            CalendarView::Day => Self { start: date, end: date },
            CalendarView::Week => Self {
                start: week_start(date),
                end: week_end(date),
            },
            CalendarView::Month => {
                let first = date.with_day(1).unwrap_or(date);
                let last = first
                    .checked_add_months(Months::new(1))
                    .and_then(|next| next.pred_opt())
                    .unwrap_or(date);
                Self {
                    start: week_start(first),
                    end: week_end(last),
                }
            }
        }
    }

    pub fn explicit(start: NaiveDate, end: NaiveDate) -> Result<Self, AppError> {
        if end < start || (end - start).num_days() + 1 > MAX_RANGE_DAYS {
            return Err(AppError::InvalidDateRange);
        }
        Ok(Self { start, end })
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Limites em UTC: `[início do primeiro dia, início do dia seguinte ao último)`
    pub fn utc_bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let from = self.start.and_time(NaiveTime::default()).and_utc();
        let to = self
            .end
            .checked_add_days(Days::new(1))
            .unwrap_or(self.end)
            .and_time(NaiveTime::default())
            .and_utc();
        (from, to)
    }
}

fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = date.weekday().num_days_from_monday() as u64;
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

fn week_end(date: NaiveDate) -> NaiveDate {
    let offset = 6 - date.weekday().num_days_from_monday() as u64;
    date.checked_add_days(Days::new(offset)).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn day_view_is_a_single_day() {
        let r = DateRange::for_view(CalendarView::Day, d(2024, 3, 14));
        assert_eq!(r.start, r.end);
        assert_eq!(r.days(), 1);
    }

    #[test]
    fn week_view_runs_monday_to_sunday() {
        // 2024-03-14 é uma quinta-feira
        let r = DateRange::for_view(CalendarView::Week, d(2024, 3, 14));
        assert_eq!(r.start, d(2024, 3, 11));
        assert_eq!(r.end, d(2024, 3, 17));
        assert_eq!(r.start.weekday(), Weekday::Mon);
        assert_eq!(r.end.weekday(), Weekday::Sun);
    }

    #[test]
    fn week_view_on_a_sunday_stays_in_that_week() {
        let r = DateRange::for_view(CalendarView::Week, d(2024, 3, 17));
        assert_eq!(r.start, d(2024, 3, 11));
    }

    #[test]
    fn month_view_covers_full_grid_weeks() {
        // Fevereiro de 2024: começa numa quinta e termina numa quinta (bissexto)
        let r = DateRange::for_view(CalendarView::Month, d(2024, 2, 20));
        assert_eq!(r.start, d(2024, 1, 29));
        assert_eq!(r.end, d(2024, 3, 3));
        assert_eq!(r.days() % 7, 0);
    }

    #[test]
    fn month_view_handles_december() {
        let r = DateRange::for_view(CalendarView::Month, d(2023, 12, 31));
        assert_eq!(r.start, d(2023, 11, 27));
        assert_eq!(r.end, d(2023, 12, 31));
    }

    #[test]
    fn explicit_range_rejects_inverted_and_oversized() {
        assert!(DateRange::explicit(d(2024, 1, 2), d(2024, 1, 1)).is_err());
        assert!(DateRange::explicit(d(2024, 1, 1), d(2024, 3, 31)).is_err());
        let ok = DateRange::explicit(d(2024, 1, 1), d(2024, 1, 31)).unwrap();
        assert_eq!(ok.days(), 31);
    }

    #[test]
    fn explicit_range_counts_both_ends() {
        let longest = DateRange::explicit(d(2024, 1, 1), d(2024, 3, 2)).unwrap();
        assert_eq!(longest.days(), MAX_RANGE_DAYS);
        assert!(matches!(
            DateRange::explicit(d(2024, 1, 1), d(2024, 3, 3)),
            Err(AppError::InvalidDateRange)
        ));
    }

    #[test]
    fn utc_bounds_are_half_open() {
        let r = DateRange::explicit(d(2024, 1, 1), d(2024, 1, 1)).unwrap();
        let (from, to) = r.utc_bounds();
        assert_eq!((to - from).num_hours(), 24);
    }
}
