//! Classification of decoded currency payloads.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use url::Url;

/// Standard alphabet, padding optional.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// What a currency TXT record points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedPayload {
    /// An address or currency URI, interpreted without further network access
    DirectAddress(String),
    /// An HTTP(S) endpoint that serves the final payment target
    IndirectionUrl(Url),
}

impl DecodedPayload {
    /// Decode the value of a `_<currency>._wallet.<label>.` TXT record.
    ///
    /// Whitespace is ignored before base64 decoding. If the value is not
    /// base64 of printable UTF-8 text, the raw value is used as the payload.
    /// Only decoded text that forms a well-formed `http`/`https` URL with a
    /// host is treated as an indirection.
    #[must_use]
    pub fn decode(raw: &str) -> Self {
        let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();

        let decoded = LENIENT_BASE64
            .decode(compact.as_bytes())
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty() && !text.chars().any(char::is_control));

        match decoded {
            Some(text) => parse_indirection_url(&text)
                .map_or_else(|| Self::DirectAddress(text), Self::IndirectionUrl),
            None => Self::DirectAddress(raw.trim().to_string()),
        }
    }

    /// True if the payload requires an endpoint fetch
    #[must_use]
    pub const fn is_indirection(&self) -> bool {
        matches!(self, Self::IndirectionUrl(_))
    }
}

fn parse_indirection_url(text: &str) -> Option<Url> {
    let url = Url::parse(text).ok()?;
    let web = matches!(url.scheme(), "https" | "http");
    (web && url.host_str().is_some_and(|h| !h.is_empty())).then_some(url)
}
