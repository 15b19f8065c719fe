// Format classifier: the file name's suffix alone decides how an asset is
// parsed. There is no error path; unknown suffixes are treated as JSON.

use std::fmt;

/// Intended format of an asset, derived from its file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetFormat {
    Json,
    Yaml,
    Raml,
}

impl AssetFormat {
    /// Classify a file designator by its (case-insensitive) suffix.
    pub fn classify(file: &str) -> Self {
        let lower = file.to_ascii_lowercase();
        if lower.ends_with(".yml") || lower.ends_with(".yaml") {
            AssetFormat::Yaml
        } else if lower.ends_with(".raml") {
            AssetFormat::Raml
        } else {
            AssetFormat::Json
        }
    }

    /// MIME type announced in the upload envelope.
    pub fn mime_type(self) -> &'static str {
        match self {
            AssetFormat::Json => "application/json",
            AssetFormat::Yaml => "application/x-yaml",
            AssetFormat::Raml => "application/raml+yaml",
        }
    }
}

impl fmt::Display for AssetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssetFormat::Json => "JSON",
            AssetFormat::Yaml => "YAML",
            AssetFormat::Raml => "RAML",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_suffixes() {
        assert_eq!(AssetFormat::classify("api.yml"), AssetFormat::Yaml);
        assert_eq!(AssetFormat::classify("dir/api.YAML"), AssetFormat::Yaml);
        assert_eq!(AssetFormat::classify("api.Yml"), AssetFormat::Yaml);
    }

    #[test]
    fn raml_suffix() {
        assert_eq!(AssetFormat::classify("api.raml"), AssetFormat::Raml);
        assert_eq!(AssetFormat::classify("API.RAML"), AssetFormat::Raml);
    }

    #[test]
    fn everything_else_is_json() {
        for name in ["", "mock.json", "notes.txt", "yaml", "api.yaml.bak", "x.ramls"] {
            assert_eq!(AssetFormat::classify(name), AssetFormat::Json, "{name}");
        }
    }
}
