//! Configuration access port trait.

use crate::domain::error::SmacrossError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// `default` when the key is missing or blank; `ConfigInvalid` when it is
    /// present but not an integer.
    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, SmacrossError>;

    /// `default` when the key is missing or blank; `ConfigInvalid` when it is
    /// present but not a number.
    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, SmacrossError>;

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// Trimmed value, `None` when missing or blank.
    fn get_non_empty(&self, section: &str, key: &str) -> Option<String> {
        self.get_string(section, key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}
