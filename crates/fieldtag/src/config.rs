//! Engine configuration

use serde::{Deserialize, Serialize};

/// Annotation names and walk options.
///
/// Deserializes from partial documents; missing keys take their defaults.
///
/// ```rust,ignore
/// let config: fieldtag::Config = serde_json::from_str(r#"{"name_tag": null}"#)?;
/// assert_eq!(config.validate_tag, "validate");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Annotation holding validation rules.
    pub validate_tag: String,

    /// Annotation whose first comma-separated segment names a field in
    /// failure paths. `None` always uses the Rust field name.
    pub name_tag: Option<String>,

    /// Annotation controlling descent: `-` or a false boolean stops it.
    pub walk_tag: String,

    /// Run nested structures' own validation after their fields pass.
    pub self_validate: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            validate_tag: "validate".to_string(),
            name_tag: Some("json".to_string()),
            walk_tag: "walk".to_string(),
            self_validate: true,
        }
    }
}
