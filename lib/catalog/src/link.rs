//! Video link resolution.
//!
//! Admins paste links from several hosting providers. [`resolve`] turns any
//! such string into an [`EmbedDescriptor`] using one ordered rule table, first
//! match wins:
//!
//! 1. YouTube (`youtube.com/watch?v=`, `/embed/`, `/v/`, `youtu.be/`)
//! 2. Google Drive (`/d/<id>/` path segment, else `id=` query parameter)
//! 3. Dropbox (`?dl=0` flipped to `?raw=1` for direct streaming)
//! 4. Mega (`mega.nz/file/`, opened externally, never embedded)
//! 5. Direct `.mp4` / `.webm` / `.ogg` files, absolute or root-relative
//! 6. Anything else is `Unsupported`
//!
//! Providers are matched on the parsed host, never on a substring of the whole
//! link, so a redirect wrapper carrying another provider's URL in its query
//! string resolves as unsupported.
//!
//! Resolution is total: malformed input yields `Unsupported`, never an error.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static SCHEME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://").expect("scheme pattern is valid")
});

static YOUTUBE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)").expect("youtube id pattern is valid")
});

static DRIVE_PATH_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/d/([A-Za-z0-9_-]+)/").expect("drive path pattern is valid")
});

static DRIVE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("drive id pattern is valid"));

const DIRECT_FILE_EXTENSIONS: [&str; 3] = [".mp4", ".webm", ".ogg"];

/// Normalized, provider-tagged representation of a video link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmbedDescriptor {
    /// A YouTube video, by its 11-character id.
    #[serde(rename = "youtube")]
    YouTube { id: String },
    /// A Google Drive file, by its file id.
    Drive { id: String },
    /// A Dropbox share link, rewritten for direct streaming.
    Dropbox { url: String },
    /// A Mega file link. Mega has no inline embed.
    Mega { url: String },
    /// A plain video file served over HTTP.
    DirectFile { url: String },
    /// No provider matched.
    Unsupported { url: String },
}

/// Provider kind of an [`EmbedDescriptor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedKind {
    #[serde(rename = "youtube")]
    YouTube,
    Drive,
    Dropbox,
    Mega,
    DirectFile,
    Unsupported,
}

impl EmbedKind {
    /// Returns the kind name used in stored descriptors.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::YouTube => "youtube",
            Self::Drive => "drive",
            Self::Dropbox => "dropbox",
            Self::Mega => "mega",
            Self::DirectFile => "direct_file",
            Self::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for EmbedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a descriptor must be put on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presentation {
    /// Provider player in an inline frame.
    Frame,
    /// Native `<video>` element with the URL as its source.
    NativePlayer,
    /// A link that opens the provider in a new tab.
    ExternalLink,
    /// A static "unsupported link" notice. Never a broken player.
    Notice,
}

impl EmbedDescriptor {
    /// Returns the provider kind.
    #[must_use]
    pub fn kind(&self) -> EmbedKind {
        match self {
            Self::YouTube { .. } => EmbedKind::YouTube,
            Self::Drive { .. } => EmbedKind::Drive,
            Self::Dropbox { .. } => EmbedKind::Dropbox,
            Self::Mega { .. } => EmbedKind::Mega,
            Self::DirectFile { .. } => EmbedKind::DirectFile,
            Self::Unsupported { .. } => EmbedKind::Unsupported,
        }
    }

    /// Returns how the descriptor is rendered.
    #[must_use]
    pub fn presentation(&self) -> Presentation {
        match self {
            Self::YouTube { .. } | Self::Drive { .. } => Presentation::Frame,
            Self::Dropbox { .. } | Self::DirectFile { .. } => Presentation::NativePlayer,
            Self::Mega { .. } => Presentation::ExternalLink,
            Self::Unsupported { .. } => Presentation::Notice,
        }
    }

    /// Returns the URL the player (or external link) points at.
    ///
    /// `None` for unsupported links.
    #[must_use]
    pub fn embed_url(&self) -> Option<String> {
        match self {
            Self::YouTube { id } => Some(format!(
                "https://www.youtube.com/embed/{id}?rel=0&modestbranding=1"
            )),
            Self::Drive { id } => Some(format!("https://drive.google.com/file/d/{id}/preview")),
            Self::Dropbox { url } | Self::Mega { url } | Self::DirectFile { url } => {
                Some(url.clone())
            }
            Self::Unsupported { .. } => None,
        }
    }

    /// Returns true if the descriptor renders as a player.
    #[must_use]
    pub fn is_playable(&self) -> bool {
        matches!(
            self.presentation(),
            Presentation::Frame | Presentation::NativePlayer
        )
    }
}

/// Resolves a raw link into an embed descriptor.
#[must_use]
pub fn resolve(raw: &str) -> EmbedDescriptor {
    let raw = raw.trim();
    let link = ParsedLink::parse(raw);

    if let Some(id) = youtube_id(&link) {
        return EmbedDescriptor::YouTube { id: id.to_string() };
    }
    if let Some(id) = drive_id(&link) {
        return EmbedDescriptor::Drive { id: id.to_string() };
    }
    if host_is(&link.host, "dropbox.com") {
        return EmbedDescriptor::Dropbox {
            url: dropbox_stream_url(raw),
        };
    }
    if host_is(&link.host, "mega.nz") && link.path.starts_with("/file/") {
        return EmbedDescriptor::Mega {
            url: raw.to_string(),
        };
    }
    // A host, or a root-relative path served by this site.
    if (!link.host.is_empty() || raw.starts_with('/')) && is_direct_file(link.path) {
        return EmbedDescriptor::DirectFile {
            url: raw.to_string(),
        };
    }

    EmbedDescriptor::Unsupported {
        url: raw.to_string(),
    }
}

/// The pieces of a link the rule table looks at.
#[derive(Debug)]
struct ParsedLink<'a> {
    host: String,
    path: &'a str,
    query: &'a str,
}

impl<'a> ParsedLink<'a> {
    fn parse(raw: &'a str) -> Self {
        let rest = match SCHEME.find(raw) {
            Some(m) => &raw[m.end()..],
            None => raw.strip_prefix("//").unwrap_or(raw),
        };

        let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
        let (authority, tail) = rest.split_at(authority_end);
        let host = authority.rsplit('@').next().unwrap_or(authority);
        let host = host.split(':').next().unwrap_or(host).to_ascii_lowercase();

        let path_end = tail.find(['?', '#']).unwrap_or(tail.len());
        let (path, after_path) = tail.split_at(path_end);
        let query = after_path
            .strip_prefix('?')
            .map(|q| q.split('#').next().unwrap_or(q))
            .unwrap_or("");

        Self { host, path, query }
    }

    /// Returns the value of a real query parameter (`?name=` or `&name=`).
    fn query_param(&self, name: &str) -> Option<&'a str> {
        self.query
            .split('&')
            .find_map(|pair| pair.strip_prefix(name)?.strip_prefix('='))
    }
}

fn host_is(host: &str, domain: &str) -> bool {
    host.strip_suffix(domain)
        .is_some_and(|prefix| prefix.is_empty() || prefix.ends_with('.'))
}

fn leading_youtube_id(s: &str) -> Option<&str> {
    YOUTUBE_ID
        .captures(s)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

fn youtube_id<'a>(link: &ParsedLink<'a>) -> Option<&'a str> {
    if host_is(&link.host, "youtu.be") {
        return link.path.strip_prefix('/').and_then(leading_youtube_id);
    }
    if !host_is(&link.host, "youtube.com") {
        return None;
    }
    if link.path.trim_end_matches('/') == "/watch" {
        return link.query_param("v").and_then(leading_youtube_id);
    }
    link.path
        .strip_prefix("/embed/")
        .or_else(|| link.path.strip_prefix("/v/"))
        .and_then(leading_youtube_id)
}

fn drive_id<'a>(link: &ParsedLink<'a>) -> Option<&'a str> {
    if !(host_is(&link.host, "drive.google.com") || host_is(&link.host, "docs.google.com")) {
        return None;
    }
    if let Some(m) = DRIVE_PATH_ID.captures(link.path).and_then(|c| c.get(1)) {
        return Some(m.as_str());
    }
    link.query_param("id").filter(|id| DRIVE_ID.is_match(id))
}

fn dropbox_stream_url(raw: &str) -> String {
    if let Some(prefix) = raw.strip_suffix("?dl=0") {
        format!("{prefix}?raw=1")
    } else if let Some(prefix) = raw.strip_suffix("&dl=0") {
        format!("{prefix}&raw=1")
    } else {
        raw.to_string()
    }
}

fn is_direct_file(path: &str) -> bool {
    let path = path.to_ascii_lowercase();
    DIRECT_FILE_EXTENSIONS
        .iter()
        .any(|ext| path.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn youtube(id: &str) -> EmbedDescriptor {
        EmbedDescriptor::YouTube { id: id.to_string() }
    }

    #[test]
    fn youtube_short_link() {
        let descriptor = resolve("https://youtu.be/dQw4w9WgXcQ");
        assert_eq!(descriptor, youtube("dQw4w9WgXcQ"));
        assert_eq!(
            descriptor.embed_url().as_deref(),
            Some("https://www.youtube.com/embed/dQw4w9WgXcQ?rel=0&modestbranding=1")
        );
        assert_eq!(descriptor.presentation(), Presentation::Frame);
    }

    #[test]
    fn drive_view_link() {
        let descriptor = resolve("https://drive.google.com/file/d/1A2B3C/view?usp=sharing");
        assert_eq!(
            descriptor,
            EmbedDescriptor::Drive {
                id: "1A2B3C".to_string()
            }
        );
        assert_eq!(
            descriptor.embed_url().as_deref(),
            Some("https://drive.google.com/file/d/1A2B3C/preview")
        );
    }

    #[test]
    fn youtube_link_forms() {
        let cases = [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ&t=42",
            "https://m.youtube.com/watch?v=dQw4w9WgXcQ#comments",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/v/dQw4w9WgXcQ?version=3",
            "youtu.be/dQw4w9WgXcQ?si=abc",
            "  https://youtu.be/dQw4w9WgXcQ  ",
        ];
        for case in cases {
            assert_eq!(resolve(case), youtube("dQw4w9WgXcQ"), "{case}");
        }
    }

    #[test]
    fn youtube_id_must_be_exactly_eleven_chars() {
        assert_eq!(
            resolve("https://youtu.be/dQw4w9WgXcQX").kind(),
            EmbedKind::Unsupported
        );
        assert_eq!(
            resolve("https://youtu.be/dQw4w9").kind(),
            EmbedKind::Unsupported
        );
    }

    #[test]
    fn youtube_v_must_be_a_real_parameter() {
        assert_eq!(
            resolve("https://www.youtube.com/watch?xv=dQw4w9WgXcQ").kind(),
            EmbedKind::Unsupported
        );
    }

    #[test]
    fn drive_id_query_parameter() {
        assert_eq!(
            resolve("https://drive.google.com/open?id=1A2B3C_-x"),
            EmbedDescriptor::Drive {
                id: "1A2B3C_-x".to_string()
            }
        );
        assert_eq!(
            resolve("https://docs.google.com/uc?export=download&id=XYZ"),
            EmbedDescriptor::Drive {
                id: "XYZ".to_string()
            }
        );
    }

    #[test]
    fn dropbox_download_flag_is_flipped() {
        let descriptor = resolve("https://www.dropbox.com/s/abc123/lesson1.mp4?dl=0");
        assert_eq!(
            descriptor,
            EmbedDescriptor::Dropbox {
                url: "https://www.dropbox.com/s/abc123/lesson1.mp4?raw=1".to_string()
            }
        );
        assert_eq!(descriptor.presentation(), Presentation::NativePlayer);

        assert_eq!(
            resolve("https://www.dropbox.com/scl/fi/x/a.mp4?rlkey=k&dl=0"),
            EmbedDescriptor::Dropbox {
                url: "https://www.dropbox.com/scl/fi/x/a.mp4?rlkey=k&raw=1".to_string()
            }
        );
    }

    #[test]
    fn dropbox_without_flag_passes_through() {
        let url = "https://dropbox.com/s/abc123/lesson1.mp4";
        assert_eq!(
            resolve(url),
            EmbedDescriptor::Dropbox {
                url: url.to_string()
            }
        );
    }

    #[test]
    fn resolving_a_canonical_url_is_stable() {
        let inputs = [
            "https://www.dropbox.com/s/abc123/lesson1.mp4?dl=0",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://drive.google.com/file/d/1A2B3C/view",
            "https://mega.nz/file/abc#key",
            "https://cdn.example.com/a.webm",
        ];
        for input in inputs {
            let first = resolve(input);
            let canonical = first.embed_url().expect("playable or linkable");
            let second = resolve(&canonical);
            assert_eq!(first.kind(), second.kind(), "{input}");
        }
    }

    #[test]
    fn mega_opens_externally() {
        let descriptor = resolve("https://mega.nz/file/AbCdEf#key");
        assert_eq!(descriptor.kind(), EmbedKind::Mega);
        assert_eq!(descriptor.presentation(), Presentation::ExternalLink);
        assert!(!descriptor.is_playable());
        assert_eq!(
            resolve("https://mega.nz/folder/AbCdEf").kind(),
            EmbedKind::Unsupported
        );
    }

    #[test]
    fn direct_files_by_extension() {
        for url in [
            "https://cdn.example.com/lessons/01.mp4",
            "https://cdn.example.com/lessons/01.WEBM?token=abc",
            "http://example.org/a/b.ogg#t=10",
            "/media/lesson.mp4",
        ] {
            let descriptor = resolve(url);
            assert_eq!(
                descriptor,
                EmbedDescriptor::DirectFile {
                    url: url.to_string()
                }
            );
            assert_eq!(descriptor.embed_url().as_deref(), Some(url));
        }
        assert_eq!(
            resolve("https://example.com/video.mp4.html").kind(),
            EmbedKind::Unsupported
        );
        assert_eq!(resolve("lesson.mp4").kind(), EmbedKind::Unsupported);
    }

    #[test]
    fn provider_inside_query_string_does_not_match() {
        for url in [
            "https://example.com/redirect?to=https://youtu.be/dQw4w9WgXcQ",
            "https://example.com/?u=dropbox.com/s/x",
            "https://evil.example/?next=mega.nz/file/x",
            "https://notyoutube.com/watch?v=dQw4w9WgXcQ",
        ] {
            assert_eq!(resolve(url).kind(), EmbedKind::Unsupported, "{url}");
        }
    }

    #[test]
    fn unsupported_keeps_trimmed_input() {
        let descriptor = resolve("  not a link ");
        assert_eq!(
            descriptor,
            EmbedDescriptor::Unsupported {
                url: "not a link".to_string()
            }
        );
        assert_eq!(descriptor.embed_url(), None);
        assert_eq!(descriptor.presentation(), Presentation::Notice);
        assert_eq!(resolve("").kind(), EmbedKind::Unsupported);
    }

    #[test]
    fn descriptor_serializes_with_kind_tag() {
        let json = serde_json::to_value(youtube("dQw4w9WgXcQ")).unwrap();
        assert_eq!(json["kind"], "youtube");
        assert_eq!(json["id"], "dQw4w9WgXcQ");

        let json = serde_json::to_value(EmbedDescriptor::DirectFile {
            url: "https://x/a.mp4".to_string(),
        })
        .unwrap();
        assert_eq!(json["kind"], "direct_file");

        let back: EmbedDescriptor = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind(), EmbedKind::DirectFile);
        assert_eq!(back.kind().to_string(), "direct_file");
    }

    /// Deterministic xorshift generator so failures are reproducible.
    struct XorShift(u64);

    impl XorShift {
        fn next_u64(&mut self) -> u64 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            self.0
        }

        fn string(&mut self, alphabet: &[char], max_len: u64) -> String {
            let len = self.next_u64() % max_len;
            (0..len)
                .map(|_| alphabet[(self.next_u64() % alphabet.len() as u64) as usize])
                .collect()
        }
    }

    #[test]
    fn resolve_is_total_over_random_input() {
        let alphabet: Vec<char> = "abcdefghijklmnopqrstuvwxyzABCXYZ0123456789_-./:?&=#@% é😀"
            .chars()
            .collect();
        let fragments = [
            "", "https://", "youtu.be/", "youtube.com/watch?v=", "drive.google.com/d/",
            "dropbox.com/", "mega.nz/file/", ".mp4", "?dl=0",
        ];
        let mut rng = XorShift(0x9E37_79B9_7F4A_7C15);

        for _ in 0..1000 {
            let prefix = fragments[(rng.next_u64() % fragments.len() as u64) as usize];
            let input = format!("{prefix}{}", rng.string(&alphabet, 48));
            let descriptor = resolve(&input);
            assert_eq!(
                descriptor.embed_url().is_none(),
                descriptor.kind() == EmbedKind::Unsupported,
                "{input}"
            );
        }
    }

    #[test]
    fn random_strings_without_hosts_are_unsupported() {
        let alphabet: Vec<char> = "abcdefghijklmnopqrstuvwxyz0123456789_-/?&=# "
            .chars()
            .collect();
        let mut rng = XorShift(0x2545_F491_4F6C_DD1D);

        for _ in 0..1000 {
            let input = rng.string(&alphabet, 64);
            assert_eq!(resolve(&input).kind(), EmbedKind::Unsupported, "{input}");
        }
    }
}
