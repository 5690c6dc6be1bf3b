//! View-mode resolution, missing-day interpolation, and period navigation.
//!
//! Browsing is bounded by the date window running from the first recorded
//! entry to today; days outside it are never synthesized and periods outside
//! it get no navigation links.

use std::collections::HashSet;
use std::ops::RangeInclusive;

use chrono::{Datelike, Months, NaiveDate};

use crate::article::Article;

/// Granularity of a browse request, resolved from the query parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewMode {
    Year(i32),
    Month(i32, u32),
    Day(NaiveDate),
}

impl ViewMode {
    /// Resolve the requested view from optional query components.
    ///
    /// A missing component defaults to today's; the finest component given
    /// decides the granularity (day over month over year). No components at
    /// all means the current month. Returns `None` when the combination does
    /// not name a real calendar date.
    pub fn resolve(
        year: Option<i32>,
        month: Option<u32>,
        day: Option<u32>,
        today: NaiveDate,
    ) -> Option<ViewMode> {
        match (year, month, day) {
            (None, None, None) => Some(ViewMode::Month(today.year(), today.month())),
            (Some(year), None, None) => {
                NaiveDate::from_ymd_opt(year, 1, 1).map(|_| ViewMode::Year(year))
            }
            (year, month, None) => {
                let year = year.unwrap_or_else(|| today.year());
                let month = month.unwrap_or_else(|| today.month());
                NaiveDate::from_ymd_opt(year, month, 1).map(|_| ViewMode::Month(year, month))
            }
            (year, month, Some(day)) => {
                let year = year.unwrap_or_else(|| today.year());
                let month = month.unwrap_or_else(|| today.month());
                NaiveDate::from_ymd_opt(year, month, day).map(ViewMode::Day)
            }
        }
    }

    /// First and last calendar day of the period.
    pub fn span(&self) -> Option<(NaiveDate, NaiveDate)> {
        match *self {
            ViewMode::Year(year) => Some((
                NaiveDate::from_ymd_opt(year, 1, 1)?,
                NaiveDate::from_ymd_opt(year, 12, 31)?,
            )),
            ViewMode::Month(year, month) => {
                let first = NaiveDate::from_ymd_opt(year, month, 1)?;
                Some((first, last_day_of_month(first)?))
            }
            ViewMode::Day(date) => Some((date, date)),
        }
    }

    pub fn prev(&self) -> Option<ViewMode> {
        match *self {
            ViewMode::Year(year) => Some(ViewMode::Year(year.checked_sub(1)?)),
            ViewMode::Month(year, month) => {
                let first = NaiveDate::from_ymd_opt(year, month, 1)?;
                let prev = first.checked_sub_months(Months::new(1))?;
                Some(ViewMode::Month(prev.year(), prev.month()))
            }
            ViewMode::Day(date) => date.pred_opt().map(ViewMode::Day),
        }
    }

    pub fn next(&self) -> Option<ViewMode> {
        match *self {
            ViewMode::Year(year) => Some(ViewMode::Year(year.checked_add(1)?)),
            ViewMode::Month(year, month) => {
                let first = NaiveDate::from_ymd_opt(year, month, 1)?;
                let next = first.checked_add_months(Months::new(1))?;
                Some(ViewMode::Month(next.year(), next.month()))
            }
            ViewMode::Day(date) => date.succ_opt().map(ViewMode::Day),
        }
    }

    pub fn href(&self) -> String {
        match *self {
            ViewMode::Year(year) => format!("/?year={year}"),
            ViewMode::Month(year, month) => format!("/?year={year}&month={month}"),
            ViewMode::Day(date) => format!(
                "/?year={}&month={}&day={}",
                date.year(),
                date.month(),
                date.day()
            ),
        }
    }

    pub fn label(&self) -> String {
        match *self {
            ViewMode::Year(year) => year.to_string(),
            ViewMode::Month(year, month) => match NaiveDate::from_ymd_opt(year, month, 1) {
                Some(first) => first.format("%B %Y").to_string(),
                None => format!("{year}-{month:02}"),
            },
            ViewMode::Day(date) => date.format("%B %-d, %Y").to_string(),
        }
    }
}

/// Inclusive range of dates eligible for interpolation.
#[derive(Clone, Copy, Debug)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Window from the first recorded entry (today when the diary is empty)
    /// up to today.
    pub fn new(first_entry: Option<NaiveDate>, today: NaiveDate) -> Self {
        DateWindow {
            start: first_entry.unwrap_or(today).min(today),
            end: today,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Day numbers of the given month that fall inside the window, or `None`
    /// when the month and the window do not overlap.
    pub fn month_days(&self, year: i32, month: u32) -> Option<RangeInclusive<u32>> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let last = last_day_of_month(first)?;
        if last < self.start || first > self.end {
            return None;
        }
        let lo = if self.start > first { self.start.day() } else { 1 };
        let hi = if self.end < last { self.end.day() } else { last.day() };
        Some(lo..=hi)
    }
}

/// Fill one month's articles with blank placeholders for every in-window day
/// that has no stored row, sorted by day ascending.
pub fn interpolate(
    mut articles: Vec<Article>,
    year: i32,
    month: u32,
    window: &DateWindow,
) -> Vec<Article> {
    if let Some(days) = window.month_days(year, month) {
        let present: HashSet<u32> = articles.iter().map(|article| article.day).collect();
        for day in days {
            if !present.contains(&day) {
                articles.push(Article::blank(year, month, day));
            }
        }
    }
    articles.sort_by_key(|article| article.day);
    articles
}

#[derive(Clone, Debug)]
pub struct NavLink {
    pub href: String,
    pub label: String,
}

/// Previous/next period links, present only when the target period overlaps
/// the date window.
#[derive(Clone, Debug, Default)]
pub struct Nav {
    pub prev: Option<NavLink>,
    pub next: Option<NavLink>,
}

pub fn nav(mode: &ViewMode, window: &DateWindow) -> Nav {
    let in_window = |mode: &ViewMode| {
        mode.span()
            .is_some_and(|(first, last)| last >= window.start && first <= window.end)
    };
    let link = |mode: ViewMode| NavLink {
        href: mode.href(),
        label: mode.label(),
    };
    Nav {
        prev: mode.prev().filter(in_window).map(link),
        next: mode.next().filter(in_window).map(link),
    }
}

fn last_day_of_month(first: NaiveDate) -> Option<NaiveDate> {
    first.checked_add_months(Months::new(1))?.pred_opt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn resolve_defaults_to_current_month() {
        let today = date(2026, 8, 28);
        assert_eq!(
            ViewMode::resolve(None, None, None, today),
            Some(ViewMode::Month(2026, 8))
        );
    }

    #[test]
    fn resolve_year_only_gives_year_view() {
        let today = date(2026, 8, 28);
        assert_eq!(
            ViewMode::resolve(Some(2025), None, None, today),
            Some(ViewMode::Year(2025))
        );
    }

    #[test]
    fn resolve_month_without_year_uses_current_year() {
        let today = date(2026, 8, 28);
        assert_eq!(
            ViewMode::resolve(None, Some(3), None, today),
            Some(ViewMode::Month(2026, 3))
        );
    }

    #[test]
    fn resolve_day_fills_missing_components_from_today() {
        let today = date(2026, 8, 28);
        assert_eq!(
            ViewMode::resolve(None, None, Some(5), today),
            Some(ViewMode::Day(date(2026, 8, 5)))
        );
        assert_eq!(
            ViewMode::resolve(Some(2025), None, Some(5), today),
            Some(ViewMode::Day(date(2025, 8, 5)))
        );
    }

    #[test]
    fn resolve_rejects_impossible_dates() {
        let today = date(2026, 8, 28);
        assert_eq!(ViewMode::resolve(Some(2026), Some(13), None, today), None);
        assert_eq!(
            ViewMode::resolve(Some(2026), Some(2), Some(30), today),
            None
        );
    }

    #[test]
    fn month_days_clamps_to_window() {
        let window = DateWindow {
            start: date(2026, 3, 10),
            end: date(2026, 8, 28),
        };
        assert_eq!(window.month_days(2026, 3), Some(10..=31));
        assert_eq!(window.month_days(2026, 4), Some(1..=30));
        assert_eq!(window.month_days(2026, 8), Some(1..=28));
        assert_eq!(window.month_days(2026, 2), None);
        assert_eq!(window.month_days(2026, 9), None);
    }

    #[test]
    fn interpolate_fills_missing_days_in_order() {
        let window = DateWindow {
            start: date(2026, 1, 1),
            end: date(2026, 4, 30),
        };
        let stored = vec![
            Article {
                year: 2026,
                month: 2,
                day: 14,
                message: "hello".to_string(),
            },
            Article {
                year: 2026,
                month: 2,
                day: 3,
                message: "world".to_string(),
            },
        ];
        let filled = interpolate(stored, 2026, 2, &window);
        assert_eq!(filled.len(), 28);
        assert!(filled
            .windows(2)
            .all(|pair| pair[0].day < pair[1].day));
        assert_eq!(filled[2].message, "world");
        assert_eq!(filled[13].message, "hello");
        assert!(filled[0].is_blank());
    }

    #[test]
    fn interpolate_current_month_stops_at_today() {
        let today = date(2026, 8, 28);
        let window = DateWindow::new(Some(date(2026, 1, 1)), today);
        let filled = interpolate(Vec::new(), 2026, 8, &window);
        assert_eq!(filled.len(), 28);
        assert_eq!(filled.last().map(|article| article.day), Some(28));
    }

    #[test]
    fn interpolate_outside_window_keeps_stored_only() {
        let window = DateWindow {
            start: date(2026, 3, 1),
            end: date(2026, 8, 28),
        };
        let stored = vec![Article {
            year: 2026,
            month: 9,
            day: 1,
            message: "future".to_string(),
        }];
        let filled = interpolate(stored, 2026, 9, &window);
        assert_eq!(filled.len(), 1);
    }

    #[test]
    fn nav_clamps_both_ends_of_the_window() {
        let window = DateWindow {
            start: date(2026, 3, 10),
            end: date(2026, 8, 28),
        };

        let first_month = nav(&ViewMode::Month(2026, 3), &window);
        assert!(first_month.prev.is_none());
        assert!(first_month.next.is_some());

        let current = nav(&ViewMode::Month(2026, 8), &window);
        assert!(current.prev.is_some());
        assert!(current.next.is_none());

        let middle = nav(&ViewMode::Month(2026, 5), &window);
        assert_eq!(middle.prev.map(|link| link.href), Some("/?year=2026&month=4".to_string()));
        assert_eq!(middle.next.map(|link| link.href), Some("/?year=2026&month=6".to_string()));
    }

    #[test]
    fn nav_day_view_steps_one_day() {
        let window = DateWindow {
            start: date(2026, 3, 10),
            end: date(2026, 8, 28),
        };
        let at_end = nav(&ViewMode::Day(date(2026, 8, 28)), &window);
        assert_eq!(
            at_end.prev.map(|link| link.href),
            Some("/?year=2026&month=8&day=27".to_string())
        );
        assert!(at_end.next.is_none());
    }

    #[test]
    fn nav_year_view_steps_one_year() {
        let window = DateWindow {
            start: date(2024, 6, 1),
            end: date(2026, 8, 28),
        };
        let middle = nav(&ViewMode::Year(2025), &window);
        assert_eq!(middle.prev.map(|link| link.label), Some("2024".to_string()));
        assert_eq!(middle.next.map(|link| link.label), Some("2026".to_string()));
    }

    #[test]
    fn month_nav_crosses_year_boundaries() {
        let mode = ViewMode::Month(2026, 1);
        assert_eq!(mode.prev(), Some(ViewMode::Month(2025, 12)));
        assert_eq!(mode.next(), Some(ViewMode::Month(2026, 2)));
    }

    #[test]
    fn empty_diary_window_collapses_to_today() {
        let today = date(2026, 8, 28);
        let window = DateWindow::new(None, today);
        let filled = interpolate(Vec::new(), 2026, 8, &window);
        assert_eq!(filled.len(), 1);
        assert_eq!(filled[0].day, 28);
    }
}
