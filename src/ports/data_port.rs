//! Data provider port trait.

use crate::domain::error::SmacrossError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Daily bars for `ticker` within `[start_date, end_date]`, ascending by date.
    ///
    /// Fails with `SmacrossError::DataFetch` when the ticker is unknown or the
    /// source is unreachable; an empty vector means the source answered but
    /// had no bars in range.
    fn fetch_ohlcv(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SmacrossError>;

    /// Short label for log output.
    fn name(&self) -> &str;
}
