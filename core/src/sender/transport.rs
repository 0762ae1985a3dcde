use serde_json::Value;

use crate::types::TransportError;

/// One way of getting a payload to the collector.
pub trait Transport: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this transport can work in the current environment. An
    /// unsupported primary is skipped straight to the fallback.
    fn is_supported(&self) -> bool {
        true
    }

    fn send(&self, url: &str, payload: &Value) -> Result<(), TransportError>;
}

/// `url?data=<json>` for the tracking-pixel GET. The serialized payload must
/// fit in `max_chars`.
pub fn pixel_url(url: &str, payload: &Value, max_chars: usize) -> Result<String, TransportError> {
    let json = serde_json::to_string(payload)?;
    let have = json.chars().count();
    if have > max_chars {
        return Err(TransportError::PayloadTooLarge { have, max: max_chars });
    }

    let mut target = url::Url::parse(url).map_err(|_| TransportError::InvalidUrl(url.to_string()))?;
    target.query_pairs_mut().append_pair("data", &json);
    Ok(target.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pixel_url_encodes_payload_as_data_param() {
        let out = pixel_url("https://c.example/p.gif", &json!({"type": "error"}), 2000).unwrap();
        let parsed = url::Url::parse(&out).unwrap();
        let data = parsed.query_pairs().find(|(k, _)| k == "data").map(|(_, v)| v.into_owned());
        assert_eq!(data.as_deref(), Some(r#"{"type":"error"}"#));
    }

    #[test]
    fn pixel_url_rejects_oversized_payload() {
        let payload = json!({ "blob": "x".repeat(64) });
        let err = pixel_url("https://c.example/p.gif", &payload, 16).unwrap_err();
        assert!(matches!(err, TransportError::PayloadTooLarge { max: 16, .. }));
    }
}
