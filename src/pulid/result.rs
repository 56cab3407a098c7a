use crate::{
    error::{RelayError, Result},
    models::CompletionBuffer,
};
use serde_json::Value;

/// Reads the generated image path out of a completion record.
///
/// The record must be a JSON array whose first element is an object with a
/// string `path`; anything else is a [`RelayError::PayloadShape`].
pub fn extract_image_path(buffer: &CompletionBuffer) -> Result<String> {
    parse_image_path(&buffer.joined())
}

pub fn parse_image_path(record: &str) -> Result<String> {
    let value: Value = serde_json::from_str(record)?;

    match value.as_array().and_then(|items| items.first()) {
        Some(Value::Object(first)) => match first.get("path") {
            Some(Value::String(path)) => Ok(path.clone()),
            _ => Err(RelayError::PayloadShape),
        },
        _ => Err(RelayError::PayloadShape),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_first_path() {
        assert_eq!(
            parse_image_path(r#"[{"path": "images/out123.png"}]"#).unwrap(),
            "images/out123.png"
        );
        assert_eq!(
            parse_image_path(r#"[{"path": "/tmp/gradio/a.webp", "url": null}, "seed: 7"]"#)
                .unwrap(),
            "/tmp/gradio/a.webp"
        );
    }

    #[test]
    fn reads_multi_line_buffer() {
        let mut buffer = CompletionBuffer::new();
        buffer.push("[{\"path\":");
        buffer.push("\"imgs/foo.png\"}]");
        assert_eq!(extract_image_path(&buffer).unwrap(), "imgs/foo.png");
    }

    #[test]
    fn wrong_shapes_are_rejected() {
        let records = [
            r#"{}"#,
            r#"[]"#,
            r#"[{"nopath": 1}]"#,
            r#""not json""#,
            r#"[{"path": 5}]"#,
            r#"["a.png"]"#,
        ];

        for record in records {
            assert!(
                matches!(parse_image_path(record), Err(RelayError::PayloadShape)),
                "{} should be a shape error",
                record
            );
        }
    }

    #[test]
    fn invalid_json_is_a_decode_error() {
        assert!(matches!(
            parse_image_path("not json"),
            Err(RelayError::PayloadDecode(_))
        ));
        assert!(matches!(
            parse_image_path(""),
            Err(RelayError::PayloadDecode(_))
        ));
    }
}
