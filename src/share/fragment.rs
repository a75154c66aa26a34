use std::fmt;

const PASTE_PREFIX: &str = "id=";
const COMPRESSED_PREFIX: &str = "cdata=";
const LEGACY_PREFIX: &str = "data=";

/// The payload carried after `#` in a share link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareFragment {
    /// `#id=<pasteId>`: the compressed payload lives on the paste host.
    PasteId(String),
    /// `#cdata=<base64url(gzip(json))>`
    Compressed(String),
    /// `#data=<base64(json)>`
    Legacy(String),
}

impl ShareFragment {
    /// Parses a full URL or a bare fragment (with or without `#`).
    #[must_use]
    pub fn parse(url_or_fragment: &str) -> Option<Self> {
        let fragment = match url_or_fragment.split_once('#') {
            Some((_, fragment)) => fragment,
            None => url_or_fragment,
        };

        let parsed = if let Some(rest) = fragment.strip_prefix(PASTE_PREFIX) {
            Self::PasteId(rest.trim().to_string())
        } else if let Some(rest) = fragment.strip_prefix(COMPRESSED_PREFIX) {
            Self::Compressed(rest.trim().to_string())
        } else if let Some(rest) = fragment.strip_prefix(LEGACY_PREFIX) {
            Self::Legacy(rest.trim().to_string())
        } else {
            return None;
        };

        (!parsed.payload().is_empty()).then_some(parsed)
    }

    #[must_use]
    pub fn payload(&self) -> &str {
        match self {
            Self::PasteId(s) | Self::Compressed(s) | Self::Legacy(s) => s,
        }
    }

    /// Appends this fragment to `base_url`, replacing any fragment already there.
    #[must_use]
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}#{self}", strip_fragment(base_url))
    }
}

impl fmt::Display for ShareFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PasteId(id) => write!(f, "{PASTE_PREFIX}{id}"),
            Self::Compressed(payload) => write!(f, "{COMPRESSED_PREFIX}{payload}"),
            Self::Legacy(payload) => write!(f, "{LEGACY_PREFIX}{payload}"),
        }
    }
}

/// The URL without its fragment, so a reload does not import again.
#[must_use]
pub fn strip_fragment(url: &str) -> &str {
    url.split_once('#').map_or(url, |(base, _)| base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prefixes() {
        assert_eq!(
            ShareFragment::parse("https://wiki.example.com/#id=abc123"),
            Some(ShareFragment::PasteId("abc123".into()))
        );
        assert_eq!(
            ShareFragment::parse("#cdata=H4sI"),
            Some(ShareFragment::Compressed("H4sI".into()))
        );
        assert_eq!(
            ShareFragment::parse("data=eyJ9"),
            Some(ShareFragment::Legacy("eyJ9".into()))
        );
    }

    #[test]
    fn test_cdata_not_mistaken_for_data() {
        assert!(matches!(
            ShareFragment::parse("#cdata=xyz"),
            Some(ShareFragment::Compressed(_))
        ));
    }

    #[test]
    fn test_parse_rejects_other_fragments() {
        assert_eq!(ShareFragment::parse("https://wiki.example.com/"), None);
        assert_eq!(ShareFragment::parse("https://wiki.example.com/#characters"), None);
        assert_eq!(ShareFragment::parse("#id="), None);
    }

    #[test]
    fn test_to_url_replaces_fragment() {
        let fragment = ShareFragment::PasteId("xyz".into());
        assert_eq!(
            fragment.to_url("https://wiki.example.com/app#old"),
            "https://wiki.example.com/app#id=xyz"
        );
    }

    #[test]
    fn test_strip_fragment() {
        assert_eq!(strip_fragment("http://a/b#id=1"), "http://a/b");
        assert_eq!(strip_fragment("http://a/b"), "http://a/b");
    }
}
