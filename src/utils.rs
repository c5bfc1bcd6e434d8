//! Utility functions for floweval.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::OnceLock;

/// Global set of warned messages (for warn_once).
static WARNED_MESSAGES: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();

/// Log a warning message only once.
///
/// Subsequent calls with the same message are ignored.
pub fn warn_once(message: &str) {
    let warned = WARNED_MESSAGES.get_or_init(|| Mutex::new(HashSet::new()));
    let mut guard = warned.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if guard.insert(message.to_string()) {
        log::warn!("{}", message);
    }
}

/// Arithmetic mean, or `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Whether `name` contains any of `markers`.
pub fn contains_any<S: AsRef<str>>(name: &str, markers: &[S]) -> bool {
    markers.iter().any(|m| name.contains(m.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[0.2, 0.6]).map(|m| (m * 1e12).round() / 1e12), Some(0.4));
        assert_eq!(mean(&[3.0]), Some(3.0));
    }

    #[test]
    fn test_contains_any() {
        assert!(contains_any("IM01_hDyn", &["_hDyn"]));
        assert!(!contains_any("IM01", &["_hDyn"]));
        assert!(!contains_any::<&str>("IM01", &[]));
        assert!(contains_any("IM05_dyn", &["_x", "_dyn"]));
    }

    #[test]
    fn test_warn_once_does_not_panic() {
        warn_once("repeated warning");
        warn_once("repeated warning");
    }
}
