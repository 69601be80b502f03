use serde::{Deserialize, Deserializer, Serialize};

/// Text format code for HTML content
pub const FORMAT_HTML: i32 = 1;

/// Rich text value: the text plus its format code
///
/// Backups may carry either a bare string (format defaults to HTML) or a
/// `{text, format}` object; both deserialize into this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RichText {
    pub text: String,
    pub format: i32,
}

impl RichText {
    /// HTML-formatted rich text
    pub fn html(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: FORMAT_HTML,
        }
    }
}

impl Default for RichText {
    fn default() -> Self {
        Self::html(String::new())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RichTextRepr {
    Plain(String),
    Full {
        #[serde(default)]
        text: String,
        #[serde(default = "default_format", deserialize_with = "super::lenient::int")]
        format: i32,
    },
}

fn default_format() -> i32 {
    FORMAT_HTML
}

impl<'de> Deserialize<'de> for RichText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match RichTextRepr::deserialize(deserializer)? {
            RichTextRepr::Plain(text) => RichText::html(text),
            RichTextRepr::Full { text, format } => RichText { text, format },
        })
    }
}
