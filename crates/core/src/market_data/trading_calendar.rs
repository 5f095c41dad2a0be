//! Weekday-based trading calendar with optional per-exchange holidays.

use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::{HashMap, HashSet};

use super::market_data_traits::TradingCalendarTrait;

/// Treats Monday through Friday as trading days, minus configured holidays.
#[derive(Debug, Clone, Default)]
pub struct WeekdayCalendar {
    holidays: HashMap<String, HashSet<NaiveDate>>,
}

impl WeekdayCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds market holidays for an exchange.
    pub fn with_holidays<I>(mut self, exchange: &str, dates: I) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        self.holidays
            .entry(exchange.to_string())
            .or_default()
            .extend(dates);
        self
    }

    fn is_holiday(&self, date: NaiveDate, exchange: &str) -> bool {
        self.holidays
            .get(exchange)
            .is_some_and(|days| days.contains(&date))
    }
}

impl TradingCalendarTrait for WeekdayCalendar {
    fn is_trading_day(&self, date: NaiveDate, exchange: &str) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.is_holiday(date, exchange)
    }

    fn next_trading_day(&self, date: NaiveDate, exchange: &str) -> NaiveDate {
        let mut current = date;
        while let Some(next) = current.succ_opt() {
            current = next;
            if self.is_trading_day(current, exchange) {
                return current;
            }
        }
        // Only reachable at NaiveDate::MAX; callers detect the stall.
        current
    }
}
