//! Configuration access port trait.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    /// `None` when the key is absent, empty or not a number.
    fn get_opt_double(&self, section: &str, key: &str) -> Option<f64>;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;
}
