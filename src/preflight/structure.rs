// Structural validator and transcoder. JSON is parsed as-is; YAML and RAML
// are converted to JSON, and the JSON text is parsed once more before it is
// handed back.

use serde_json::Value;

use super::encoding::ByteOrderMark;
use super::format::AssetFormat;
use super::PreflightError;

/// Leading marker every RAML document must start with.
pub const RAML_MARKER: &[u8] = b"#%RAML";

/// Validate `content` against `format`. On success returns the JSON
/// transcoding for YAML/RAML input and `None` for JSON input.
pub fn validate(
    content: &[u8],
    bom: Option<ByteOrderMark>,
    format: AssetFormat,
) -> Result<Option<Vec<u8>>, PreflightError> {
    match format {
        AssetFormat::Json => {
            serde_json::from_slice::<Value>(content)
                .map_err(|e| PreflightError::InvalidJson(e.to_string()))?;
            Ok(None)
        }
        AssetFormat::Raml => {
            if !content.starts_with(RAML_MARKER) {
                return Err(PreflightError::InvalidRaml);
            }
            yaml_to_json(content, bom).map(Some)
        }
        AssetFormat::Yaml => yaml_to_json(content, bom).map(Some),
    }
}

/// Convert YAML to an equivalent JSON document. In a multi-document
/// stream only the first document is converted. JSON has no non-finite
/// numbers, so `.inf`, `-.inf` and `.nan` come out as those strings.
pub fn yaml_to_json(
    content: &[u8],
    bom: Option<ByteOrderMark>,
) -> Result<Vec<u8>, PreflightError> {
    let text = yaml_text(content, bom)?;
    let documents: Vec<Value> = serde_saphyr::from_multiple(&text)
        .map_err(|e| PreflightError::InvalidYaml(e.to_string()))?;
    let value = documents.into_iter().next().unwrap_or(Value::Null);
    let json = serde_json::to_vec(&value).map_err(|e| PreflightError::InvalidJson(e.to_string()))?;

    // Should never fail after a successful conversion.
    serde_json::from_slice::<Value>(&json)
        .map_err(|e| PreflightError::InvalidJson(format!("after YAML conversion: {e}")))?;
    Ok(json)
}

fn yaml_text(content: &[u8], bom: Option<ByteOrderMark>) -> Result<String, PreflightError> {
    match bom {
        Some(bom) => bom.decode(content).ok_or_else(|| {
            PreflightError::InvalidYaml(format!("content is not valid {bom:?} text"))
        }),
        None => String::from_utf8(content.to_vec())
            .map_err(|e| PreflightError::InvalidEncoding(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_value(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    #[test]
    fn json_is_not_transcoded() {
        let out = validate(br#"[1, 2, 3]"#, None, AssetFormat::Json).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn scalars_are_accepted() {
        assert!(validate(b"42", None, AssetFormat::Json).is_ok());
        assert!(validate(b"\"text\"", None, AssetFormat::Json).is_ok());
        assert!(validate(b"just text", None, AssetFormat::Yaml).is_ok());
    }

    #[test]
    fn raml_marker_is_case_sensitive_and_anchored() {
        let err = validate(b"#%raml 1.0\ntitle: x", None, AssetFormat::Raml).unwrap_err();
        assert_eq!(err, PreflightError::InvalidRaml);
        let err = validate(b" #%RAML 1.0\ntitle: x", None, AssetFormat::Raml).unwrap_err();
        assert_eq!(err, PreflightError::InvalidRaml);
    }

    #[test]
    fn raml_transcodes_body() {
        let out = validate(b"#%RAML 1.0\ntitle: My API\nversion: v1", None, AssetFormat::Raml)
            .unwrap()
            .unwrap();
        assert_eq!(as_value(&out), json!({"title": "My API", "version": "v1"}));
    }

    #[test]
    fn broken_yaml_reports_parser_message() {
        let err = validate(b"foo: [unclosed\n", None, AssetFormat::Yaml).unwrap_err();
        match err {
            PreflightError::InvalidYaml(msg) => assert!(!msg.is_empty()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn utf16_yaml_is_decoded() {
        let mut content = vec![0xff, 0xfe];
        for unit in "a: 1".encode_utf16() {
            content.extend_from_slice(&unit.to_le_bytes());
        }
        let out = validate(&content, Some(ByteOrderMark::Utf16Le), AssetFormat::Yaml)
            .unwrap()
            .unwrap();
        assert_eq!(as_value(&out), json!({"a": 1}));
    }

    #[test]
    fn undecodable_marked_yaml_is_invalid_yaml() {
        let err = validate(&[0xff, 0xfe, 0xfd], Some(ByteOrderMark::Utf16Le), AssetFormat::Yaml)
            .unwrap_err();
        assert!(matches!(err, PreflightError::InvalidYaml(_)));
    }

    #[test]
    fn marked_json_is_left_to_the_json_parser() {
        let err = validate(&[0xfe, 0xff, 0, b'1'], Some(ByteOrderMark::Utf16Be), AssetFormat::Json)
            .unwrap_err();
        assert!(matches!(err, PreflightError::InvalidJson(_)));
    }

    #[test]
    fn first_yaml_document_wins() {
        let out = validate(b"a: 1\n---\nb: 2\n", None, AssetFormat::Yaml)
            .unwrap()
            .unwrap();
        assert_eq!(as_value(&out), json!({"a": 1}));
    }

    #[test]
    fn non_finite_floats_become_strings() {
        let out = validate(b"a: .inf\nb: -.inf\nc: .nan\nd: 1.5\n", None, AssetFormat::Yaml)
            .unwrap()
            .unwrap();
        assert_eq!(
            as_value(&out),
            json!({"a": ".inf", "b": "-.inf", "c": ".nan", "d": 1.5})
        );
    }
}
