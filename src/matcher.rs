use once_cell::sync::Lazy;
use regex::Regex;

static WATCH_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://(?:www\.)?tvplayer\.com/watch(?:/(?P<channel>[^/?#]*)/?)?(?:[?#].*)?$")
        .expect("watch url pattern is valid")
});

/// Lives under `/watch/` but is the context API, not a channel.
const CONTEXT_SLUG: &str = "context";

/// Whether `url` is a TVPlayer watch page. Does no I/O.
pub fn can_handle_url(url: &str) -> bool {
    match WATCH_URL_RE.captures(url) {
        Some(c) => c.name("channel").map(|m| m.as_str()) != Some(CONTEXT_SLUG),
        None => false,
    }
}

/// Channel slug of a watch page URL, e.g. `bbcone` for
/// `https://tvplayer.com/watch/bbcone`. `None` for the bare watch page.
pub fn channel_slug(url: &str) -> Option<&str> {
    if !can_handle_url(url) {
        return None;
    }
    WATCH_URL_RE
        .captures(url)?
        .name("channel")
        .map(|m| m.as_str())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_watch_pages() {
        for url in [
            "http://tvplayer.com/watch",
            "https://tvplayer.com/watch/",
            "https://www.tvplayer.com/watch",
            "https://www.tvplayer.com/watch/bbcone",
            "http://tvplayer.com/watch/itv/",
            "https://tvplayer.com/watch/dave?autoplay=1",
        ] {
            assert!(can_handle_url(url), "should accept {}", url);
        }
    }

    #[test]
    fn rejects_other_urls() {
        for url in [
            "https://tvplayer.com/",
            "https://tvplayer.com/account/login",
            "https://tvplayer.com/account/update-detail",
            "https://tvplayer.com/watchlist",
            "http://tvplayer.com/watch/context",
            "https://tvplayer.com/watch/context/?resource=R1",
            "https://tvplayer.com/watch/context/extra",
            "https://api.tvplayer.com/watch/bbcone",
            "https://tvplayer.co.uk/watch/bbcone",
            "https://wwwxtvplayer.com/watch",
            "ftp://tvplayer.com/watch",
            "tvplayer.com/watch",
        ] {
            assert!(!can_handle_url(url), "should reject {}", url);
        }
    }

    #[test]
    fn channel_slug_from_url() {
        assert_eq!(channel_slug("https://tvplayer.com/watch/bbcone"), Some("bbcone"));
        assert_eq!(channel_slug("https://tvplayer.com/watch/itv/?x=1"), Some("itv"));
        assert_eq!(channel_slug("https://tvplayer.com/watch/"), None);
        assert_eq!(channel_slug("https://tvplayer.com/watch"), None);
        assert_eq!(channel_slug("https://tvplayer.com/account"), None);
        assert_eq!(channel_slug("http://tvplayer.com/watch/context"), None);
    }
}
