pub mod coingecko;
pub mod ledger;
pub mod util;
