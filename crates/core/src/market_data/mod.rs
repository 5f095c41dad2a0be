//! Market data module - price lookup and trading calendar seams.

mod market_data_errors;
mod market_data_model;
mod market_data_traits;
mod memory_price_lookup;
mod trading_calendar;

// Re-export the public interface
pub use market_data_model::{PriceBar, ResolvedPrice};
pub use market_data_traits::{PriceLookupTrait, TradingCalendarTrait};
pub use memory_price_lookup::InMemoryPriceLookup;
pub use trading_calendar::WeekdayCalendar;

// Re-export error types for convenience
pub use market_data_errors::MarketDataError;
