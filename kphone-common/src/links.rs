//! Link building for the plot image, playback, deep-link and share targets

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;

/// Characters left alone by JavaScript's `encodeURIComponent`
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const SHARE_ENDPOINT: &str = "http://twitter.com/intent/tweet";

/// Percent-encode a single URL component (`encodeURIComponent` semantics)
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// Plot image source for an identifier
pub fn image_url(id: &str) -> String {
    format!("/img/{}", id)
}

/// Playback (and download) path for a selection; the scale is encoded
pub fn playback_url(id: &str, scale: &str, speed: u32) -> String {
    format!("/keplerphone/{}/{}/{}", id, encode_component(scale), speed)
}

/// Address-bar form of a selection: `{origin}/{id}/{scale}/{speed}`
pub fn canonical_url(origin: &str, id: &str, scale: &str, speed: u32) -> String {
    format!("{}/{}/{}/{}", origin.trim_end_matches('/'), id, scale, speed)
}

/// Message posted with the share link and shown while listening
pub fn listening_message(id: &str) -> String {
    format!("Listening to KIC{} on The KeplerPhone", id)
}

/// Social-share link carrying `text`, a hashtag and the canonical URL
pub fn share_link(text: &str, hashtag: &str, canonical: &str) -> String {
    format!(
        "{}?text={}&hashtags={}&url={}",
        SHARE_ENDPOINT,
        encode_component(text),
        encode_component(hashtag),
        encode_component(canonical)
    )
}

/// Every link derived from the current selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareState {
    pub canonical_url: String,
    pub download_href: String,
    pub share_href: String,
}

impl ShareState {
    pub fn build(origin: &str, hashtag: &str, id: &str, scale: &str, speed: u32) -> Self {
        let canonical_url = canonical_url(origin, id, scale, speed);
        let share_href = share_link(&listening_message(id), hashtag, &canonical_url);
        Self {
            download_href: playback_url(id, scale, speed),
            share_href,
            canonical_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_component_matches_uri_component_rules() {
        assert_eq!(encode_component("C major"), "C%20major");
        assert_eq!(encode_component("jazz_minor"), "jazz_minor");
        assert_eq!(encode_component("a/b?c&d=e"), "a%2Fb%3Fc%26d%3De");
        assert_eq!(encode_component("-_.!~*'()"), "-_.!~*'()");
        assert_eq!(encode_component("é"), "%C3%A9");
    }

    #[test]
    fn test_image_url() {
        assert_eq!(image_url("12345"), "/img/12345");
    }

    #[test]
    fn test_playback_url_encodes_scale() {
        assert_eq!(playback_url("12345", "C major", 4), "/keplerphone/12345/C%20major/4");
    }

    #[test]
    fn test_canonical_url_form() {
        assert_eq!(
            canonical_url("http://host", "K00752.01", "major", 4),
            "http://host/K00752.01/major/4"
        );
        assert_eq!(
            canonical_url("http://host/", "K00752.01", "major", 4),
            "http://host/K00752.01/major/4"
        );
    }

    #[test]
    fn test_share_state_encodes_scale_everywhere() {
        let share = ShareState::build("http://host", "keplerphone", "12345", "C major", 4);

        assert_eq!(share.canonical_url, "http://host/12345/C major/4");
        assert_eq!(share.download_href, "/keplerphone/12345/C%20major/4");
        assert!(share.share_href.contains("C%20major"));
        assert_eq!(
            share.share_href,
            "http://twitter.com/intent/tweet\
             ?text=Listening%20to%20KIC12345%20on%20The%20KeplerPhone\
             &hashtags=keplerphone\
             &url=http%3A%2F%2Fhost%2F12345%2FC%20major%2F4"
        );
    }
}
