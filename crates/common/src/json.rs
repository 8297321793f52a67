//! JSON extraction from tool output
//!
//! Node tools frequently print log lines before or after the JSON document they
//! were asked for. These helpers cut the document out of the surrounding noise
//! before handing it to serde_json.

use serde_json::Value;
use tracing::{error, info};

use crate::error::{Error, Result};

/// Return the outermost `{...}` or `[...]` span of `data`.
///
/// When both kinds of bracket are present, the span whose closing bracket
/// comes last wins, so an array of objects yields the whole array and an
/// object containing arrays yields the whole object. Returns an empty string
/// when no complete span exists.
pub fn filter_json_object_or_array(data: &str) -> &str {
    let object = span(data, '{', '}');
    let array = span(data, '[', ']');

    let chosen = match (object, array) {
        (None, None) => None,
        (Some(object), None) => Some(object),
        (None, Some(array)) => Some(array),
        (Some(object), Some(array)) => {
            if array.1 < object.1 {
                Some(object)
            } else {
                Some(array)
            }
        }
    };

    match chosen {
        Some((start, end)) => &data[start..=end],
        None => "",
    }
}

fn span(data: &str, open: char, close: char) -> Option<(usize, usize)> {
    let start = data.find(open)?;
    let end = data.rfind(close)?;
    (start <= end).then_some((start, end))
}

/// Extract and parse the JSON document embedded in `raw`.
///
/// Parse failures are always logged together with the raw and extracted
/// text. An empty extraction is only logged when `silent_errors` is false.
pub fn to_json(raw: &str, trace: bool, silent_errors: bool) -> Result<Value> {
    let extracted = filter_json_object_or_array(raw);
    if trace {
        info!("RAW > {}", raw);
        info!("JSON> {}", extracted);
    }

    if extracted.is_empty() {
        if !silent_errors {
            error!("ERROR: {}", Error::EmptyJson);
            error!("RAW > {}", raw);
        }
        return Err(Error::EmptyJson);
    }

    serde_json::from_str(extracted).map_err(|e| {
        error!("{}", e);
        error!("RAW > {}", raw);
        error!("JSON> {}", extracted);
        Error::Json(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case("garbage {\"a\":1,\"b\":[1,2]} trailing", "{\"a\":1,\"b\":[1,2]}" ; "object with nested array")]
    #[test_case("info: done\n[{\"n\":1},{\"n\":2}]\n", "[{\"n\":1},{\"n\":2}]" ; "array of objects")]
    #[test_case("[1, 2, 3] done", "[1, 2, 3]" ; "array only")]
    #[test_case("no json here", "" ; "no brackets")]
    #[test_case("} backwards {", "" ; "reversed braces")]
    fn test_filter(input: &str, expected: &str) {
        assert_eq!(filter_json_object_or_array(input), expected);
    }

    #[test]
    fn test_to_json_strips_noise() {
        let value = to_json("garbage {\"a\":1,\"b\":[1,2]} trailing", false, true).unwrap();
        assert_eq!(value, json!({"a": 1, "b": [1, 2]}));
    }

    #[test]
    fn test_to_json_empty() {
        assert!(matches!(to_json("warning only", false, true), Err(Error::EmptyJson)));
        assert!(matches!(to_json("", true, false), Err(Error::EmptyJson)));
    }

    #[test]
    fn test_to_json_malformed() {
        assert!(matches!(to_json("x {\"a\": } y", false, false), Err(Error::Json(_))));
    }
}
