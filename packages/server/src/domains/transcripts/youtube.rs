//! YouTube URL handling.

use url::Url;

/// Extract a video id from the YouTube URL forms users paste:
/// `watch?v=`, `/embed/`, `/v/`, and `youtu.be` short links.
pub fn extract_video_id(raw_url: &str) -> Option<String> {
    let url = Url::parse(raw_url).ok()?;
    let host = url.host_str()?;

    if host == "youtu.be" {
        let id = url.path().trim_start_matches('/');
        return non_empty(id);
    }

    if host.ends_with("youtube.com") {
        if url.path() == "/watch" {
            return url
                .query_pairs()
                .find(|(k, _)| k == "v")
                .and_then(|(_, v)| non_empty(&v));
        }
        let mut segments = url.path_segments()?;
        match segments.next() {
            Some("embed") | Some("v") => return segments.next().and_then(non_empty),
            _ => return None,
        }
    }

    None
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_watch_url_with_extra_params() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?t=42&v=abc123"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn test_embed_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/embed/abc123"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn test_legacy_v_url() {
        assert_eq!(
            extract_video_id("https://youtube.com/v/abc123"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn test_short_link() {
        assert_eq!(
            extract_video_id("https://youtu.be/abc123"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn test_invalid_urls() {
        assert_eq!(extract_video_id("https://example.com/watch?v=abc"), None);
        assert_eq!(extract_video_id("https://www.youtube.com/watch"), None);
        assert_eq!(extract_video_id("https://youtu.be/"), None);
        assert_eq!(extract_video_id("not a url"), None);
    }
}
