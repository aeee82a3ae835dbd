use encoding_rs::UTF_8;

/// How received bytes are turned into printable text.
///
/// `Latin1` is the default: every byte value 0-255 maps directly to the
/// Unicode code point of the same value, so decoding is infallible and
/// lossless for arbitrary binary chunks.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TextEncoding {
    #[default]
    Latin1,
    Ascii,
    Utf8,
    Auto,
}

impl std::str::FromStr for TextEncoding {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "ISO-8859-1" | "LATIN-1" | "LATIN1" => Self::Latin1,
            "ASCII" => Self::Ascii,
            "UTF-8" => Self::Utf8,
            "AUTO" => Self::Auto,
            _ => return Err(()),
        })
    }
}

impl TextEncoding {
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            Self::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
            Self::Ascii => bytes.iter().map(|&b| if b < 128 { b as char } else { '?' }).collect(),
            Self::Utf8 => UTF_8.decode(bytes).0.into_owned(),
            Self::Auto => detect_and_decode(bytes),
        }
    }
}

fn detect_and_decode(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return String::new();
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);

    encoding.decode(bytes).0.into_owned()
}
