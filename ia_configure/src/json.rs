use serde_json::{Map, Value};

pub const REDACTED: &str = "REDACTED";

/// Returns a copy of `config` with the IA-S3 secret and the logged-in signature
/// replaced by a placeholder. `config` itself is left untouched.
pub fn redacted_config(config: &Map<String, Value>) -> Map<String, Value> {
    let mut redacted = config.clone();
    redact(&mut redacted, "s3", "secret");
    redact(&mut redacted, "cookies", "logged-in-sig");
    redacted
}

fn redact(config: &mut Map<String, Value>, section: &str, key: &str) {
    if let Some(Value::Object(section)) = config.get_mut(section) {
        if let Some(value) = section.get_mut(key) {
            *value = Value::String(REDACTED.to_owned());
        }
    }
}
