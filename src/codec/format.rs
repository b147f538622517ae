/// Target encoding for the transform pipeline.
///
/// A closed enum over the four supported codecs, plus a pass-through
/// fallback: an unrecognized `format` query value does not fail the request,
/// it re-encodes the decoded pixels in the detected source format while the
/// response is still labeled with the raw requested value. Carried over from
/// the original service as a documented quirk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFormat {
    WebP,
    Avif,
    Jpeg,
    Png,
    /// Holds the raw requested value, echoed in Content-Type, the JSON
    /// `format` field and the artifact extension.
    Passthrough(String),
}

impl OutputFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "webp" => Self::WebP,
            "avif" => Self::Avif,
            "jpeg" | "jpg" => Self::Jpeg,
            "png" => Self::Png,
            _ => Self::Passthrough(s.to_string()),
        }
    }

    /// The value used for `image/<label>` content types, artifact file
    /// extensions and the url-mode `format` field.
    pub fn label(&self) -> &str {
        match self {
            Self::WebP => "webp",
            Self::Avif => "avif",
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Passthrough(raw) => raw,
        }
    }

    pub fn content_type(&self) -> String {
        format!("image/{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_formats() {
        assert_eq!(OutputFormat::parse("webp"), OutputFormat::WebP);
        assert_eq!(OutputFormat::parse("avif"), OutputFormat::Avif);
        assert_eq!(OutputFormat::parse("jpeg"), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::parse("png"), OutputFormat::Png);
    }

    #[test]
    fn test_parse_is_case_insensitive_and_accepts_jpg_alias() {
        assert_eq!(OutputFormat::parse("WebP"), OutputFormat::WebP);
        assert_eq!(OutputFormat::parse("JPG"), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::parse("jpg"), OutputFormat::Jpeg);
    }

    #[test]
    fn test_parse_unknown_falls_through() {
        let format = OutputFormat::parse("bmp");
        assert_eq!(format, OutputFormat::Passthrough("bmp".to_string()));
        assert_eq!(format.label(), "bmp");
        assert_eq!(format.content_type(), "image/bmp");
    }

    #[test]
    fn test_content_type() {
        assert_eq!(OutputFormat::WebP.content_type(), "image/webp");
        assert_eq!(OutputFormat::Avif.content_type(), "image/avif");
        assert_eq!(OutputFormat::Jpeg.content_type(), "image/jpeg");
        assert_eq!(OutputFormat::Png.content_type(), "image/png");
    }
}
