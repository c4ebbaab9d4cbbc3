//! Configuration access port trait.
//!
//! Every value is read as a string and parsed by the domain, so a malformed
//! value is reported instead of silently replaced by a default.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    fn has_key(&self, section: &str, key: &str) -> bool {
        self.get_string(section, key).is_some()
    }
}
