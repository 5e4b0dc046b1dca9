use crate::core::kernel::LineCodec;
use crate::core::types::ClassifiedRecord;
use serde_json::Value;

/// Classifies lines of the statuses/filter stream
///
/// Blank lines are keep-alives, objects carrying a `limit` field are
/// rate-limit notices, every other JSON value is a tweet. Anything that does
/// not decode (including a bare `null`) is reported as invalid.
#[derive(Debug, Clone, Copy, Default)]
pub struct TwitterCodec;

impl LineCodec for TwitterCodec {
    type Record = ClassifiedRecord;

    fn decode_line(&self, line: &[u8]) -> ClassifiedRecord {
        let Ok(text) = std::str::from_utf8(line) else {
            return ClassifiedRecord::Invalid(line.to_vec());
        };

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return ClassifiedRecord::EmptyKeepAlive;
        }

        match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Null) | Err(_) => ClassifiedRecord::Invalid(line.to_vec()),
            Ok(value) if value.get("limit").is_some() => ClassifiedRecord::Limit(value),
            Ok(value) => ClassifiedRecord::Tweet(value),
        }
    }
}
