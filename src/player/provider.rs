use url::Url;

/// Playback backend kind for a video URL.
///
/// `NativeFile` is a directly playable media file with reliable play, pause,
/// seek and position events. `PollingWidget` is an embedded third-party
/// player exposing only an imperative query API plus coarse state callbacks.
/// `OpaqueEmbed` has no progress contract at all; it is rendered as a
/// pass-through frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    NativeFile,
    PollingWidget,
    OpaqueEmbed,
}

/// Classify a video URL by its host. Unmatched and unparseable URLs default
/// to `NativeFile`.
pub fn classify(raw_url: &str) -> Provider {
    let Ok(url) = Url::parse(raw_url) else {
        return Provider::NativeFile;
    };
    let Some(host) = url.host_str() else {
        return Provider::NativeFile;
    };
    let host = host.strip_prefix("www.").unwrap_or(host);

    match host {
        "youtube.com" | "youtu.be" | "vimeo.com" => Provider::PollingWidget,
        "prezi.com" => Provider::OpaqueEmbed,
        _ => Provider::NativeFile,
    }
}

/// Extract the widget's own video id from a URL, for the hosts that carry
/// one. Supports the watch, short-link and embed URL shapes.
pub fn widget_video_id(raw_url: &str) -> Option<String> {
    let url = Url::parse(raw_url).ok()?;
    let host = url.host_str()?.strip_prefix("www.").unwrap_or(url.host_str()?);
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());

    match host {
        "youtube.com" => match segments.next()? {
            "watch" => url
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned()),
            "embed" => segments.next().map(str::to_string),
            _ => None,
        },
        "youtu.be" => segments.next().map(str::to_string),
        "vimeo.com" => segments
            .find(|s| *s != "video")
            .filter(|s| s.chars().all(|c| c.is_ascii_digit()))
            .map(str::to_string),
        _ => None,
    }
}

/// Build the embeddable form of a widget or opaque-embed URL. Returns `None`
/// when no id can be extracted, in which case the host shows an empty state.
pub fn embed_url(raw_url: &str) -> Option<String> {
    let url = Url::parse(raw_url).ok()?;
    let host = url.host_str()?.strip_prefix("www.").unwrap_or(url.host_str()?);

    match host {
        "youtube.com" | "youtu.be" => widget_video_id(raw_url)
            .map(|id| format!("https://www.youtube.com/embed/{id}?enablejsapi=1&rel=0")),
        "vimeo.com" => widget_video_id(raw_url)
            .map(|id| format!("https://player.vimeo.com/video/{id}?api=1&byline=0&portrait=0")),
        "prezi.com" => {
            if raw_url.contains("/p/embed/") {
                return Some(raw_url.to_string());
            }
            let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
            match segments.next()? {
                "p" | "v" => segments
                    .next()
                    .map(|id| format!("https://prezi.com/p/embed/{id}/")),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Parse a duration string to seconds. Accepts `H:MM:SS`, `M:SS` and the
/// free-form `"Xh Ymin"` shape the legacy catalog uses. Unparseable input
/// yields 0.
pub fn parse_duration(text: &str) -> f64 {
    let text = text.trim();
    if text.is_empty() {
        return 0.0;
    }

    let parts: Vec<&str> = text.split(':').collect();
    if parts.len() == 2 || parts.len() == 3 {
        let numbers: Option<Vec<u64>> = parts.iter().map(|p| p.trim().parse().ok()).collect();
        if let Some(numbers) = numbers {
            return match numbers.as_slice() {
                [h, m, s] => (h * 3600 + m * 60 + s) as f64,
                [m, s] => (m * 60 + s) as f64,
                _ => 0.0,
            };
        }
    }

    // "1h 30min", "45 min", "2h"
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let mut total: u64 = 0;
    let mut digits = String::new();
    for c in compact.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        if digits.is_empty() {
            continue;
        }
        let value: u64 = digits.parse().unwrap_or(0);
        match c.to_ascii_lowercase() {
            'h' => total += value * 3600,
            'm' => total += value * 60,
            _ => {}
        }
        digits.clear();
    }
    total as f64
}

/// Render seconds as `H:MM:SS` or `M:SS`, zero-padding sub-minute
/// components. Zero and negative input render `"0:00"`.
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }
    let total = seconds as u64;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}
