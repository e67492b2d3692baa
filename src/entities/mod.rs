mod quote;
mod rate_table;
mod trip;

pub use quote::PriceQuote;
pub use rate_table::{Multipliers, RateCard, RateTable, DEFAULT_CURRENCY};
pub use trip::{TripRequest, Urgency};

pub(crate) use quote::money;
