/// Default exchange used to decide which days are trading days.
pub const DEFAULT_EXCHANGE: &str = "XNYS";
