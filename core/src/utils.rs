use std::any::Any;
use std::sync::{Mutex, MutexGuard};

use rand::{distributions::Alphanumeric, Rng};

use crate::constants::MAX_URL_LEN;

/// Lock a mutex, recovering the guard if a previous holder panicked.
///
/// Callbacks run under `catch_unwind`, so a poisoned lock only means some
/// extension misbehaved; the protected data is still consistent.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Best-effort text for a caught panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Endpoint check applied before every transport attempt.
pub fn is_valid_url(url: &str) -> bool {
    (url.starts_with("http://") || url.starts_with("https://"))
        && url.len() < MAX_URL_LEN
        && url::Url::parse(url).is_ok()
}

/// Short random id (`[A-Za-z0-9]{len}`), used for session trace ids.
pub fn random_id(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_check_requires_http_scheme() {
        assert!(is_valid_url("https://collect.example.com/r"));
        assert!(is_valid_url("http://localhost:8080/r"));
        assert!(!is_valid_url("ftp://example.com"));
        assert!(!is_valid_url(""));
        assert!(!is_valid_url("https://"));
    }

    #[test]
    fn url_check_rejects_long_urls() {
        let long = format!("https://example.com/{}", "a".repeat(MAX_URL_LEN));
        assert!(!is_valid_url(&long));
    }

    #[test]
    fn random_id_has_requested_length() {
        let id = random_id(10);
        assert_eq!(id.len(), 10);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn panic_message_reads_str_and_string() {
        let a: Box<dyn Any + Send> = Box::new("boom");
        let b: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(a.as_ref()), "boom");
        assert_eq!(panic_message(b.as_ref()), "bang");
    }
}
