//! Distribution records parsed from upload announcement subjects
//!
//! Subjects look like `CPAN Upload: S/SK/SKAJI/Perl6/Foo-Bar-0.0.1.tar.gz`.
//! Raku distributions live in the author's `Perl6/` directory.

use serde::Serialize;

const SUBJECT_PREFIX: &str = "CPAN Upload:";

/// Directory under an author's PAUSE dir holding Raku uploads
const RAKU_DIR: &str = "Perl6";

const ARCHIVE_EXTENSIONS: [&str; 5] = [".tar.gz", ".tgz", ".tar.bz2", ".tar.xz", ".zip"];

/// One uploaded release announced by the feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Distribution {
    /// Article number assigned by the feed
    pub id: u64,
    pub pause_id: String,
    /// Path under `authors/id/`, e.g. `S/SK/SKAJI/Perl6/Foo-Bar-0.0.1.tar.gz`
    pub path: String,
    /// Distribution name, e.g. `Foo-Bar`
    pub name: String,
    pub version: String,
    /// Guessed from `name` until corrected from the META file
    pub main_module: String,
    pub is_raku: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Subject is not an upload announcement
    NotUpload(String),
    /// Path lacks the `X/XY/AUTHOR/` layout
    BadPath(String),
    /// File name has no archive extension or version
    BadFilename(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotUpload(s) => write!(f, "not an upload announcement: {s:?}"),
            Self::BadPath(s) => write!(f, "unexpected upload path: {s}"),
            Self::BadFilename(s) => write!(f, "cannot split name and version: {s}"),
        }
    }
}

impl std::error::Error for ParseError {}

impl Distribution {
    /// Parse an article subject into a distribution record.
    pub fn parse(id: u64, subject: &str) -> Result<Self, ParseError> {
        let path = subject
            .trim()
            .strip_prefix(SUBJECT_PREFIX)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ParseError::NotUpload(subject.to_string()))?;

        let segments: Vec<&str> = path.split('/').collect();
        let [initial, prefix, pause_id, .., filename] = segments.as_slice() else {
            return Err(ParseError::BadPath(path.to_string()));
        };
        if initial.len() != 1
            || !prefix.starts_with(initial)
            || prefix.len() != 2
            || !pause_id.starts_with(prefix)
        {
            return Err(ParseError::BadPath(path.to_string()));
        }
        let is_raku = segments.len() >= 5 && segments[3] == RAKU_DIR;

        let stem = strip_archive_ext(filename)
            .ok_or_else(|| ParseError::BadFilename(filename.to_string()))?;
        let (name, version) =
            split_version(stem).ok_or_else(|| ParseError::BadFilename(filename.to_string()))?;

        Ok(Self {
            id,
            pause_id: pause_id.to_string(),
            path: path.to_string(),
            name: name.to_string(),
            version: version.to_string(),
            main_module: name.replace('-', "::"),
            is_raku,
        })
    }

    /// META file URL on `mirror`: the archive path with `.meta` in place of
    /// the archive extension.
    pub fn meta_url(&self, mirror: &str) -> String {
        let stem = strip_archive_ext(&self.path).unwrap_or(&self.path);
        format!("{}/authors/id/{stem}.meta", mirror.trim_end_matches('/'))
    }

    /// Archive download URL on `mirror`
    pub fn download_url(&self, mirror: &str) -> String {
        format!("{}/authors/id/{}", mirror.trim_end_matches('/'), self.path)
    }

    /// JSON debug representation for logging
    pub fn as_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("<unserializable: {e}>"))
    }
}

fn strip_archive_ext(s: &str) -> Option<&str> {
    ARCHIVE_EXTENSIONS
        .iter()
        .find_map(|ext| s.strip_suffix(ext))
        .filter(|stem| !stem.is_empty())
}

/// Split `Foo-Bar-0.0.1` at the last `-` followed by a digit or `v<digit>`.
fn split_version(stem: &str) -> Option<(&str, &str)> {
    stem.rmatch_indices('-').find_map(|(i, _)| {
        let (name, version) = (&stem[..i], &stem[i + 1..]);
        let bytes = version.as_bytes();
        let versionish = match bytes {
            [b'v', d, ..] => d.is_ascii_digit(),
            [d, ..] => d.is_ascii_digit(),
            [] => false,
        };
        (versionish && !name.is_empty()).then_some((name, version))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_raku_upload() {
        let d = Distribution::parse(1001, "CPAN Upload: S/SK/SKAJI/Perl6/Foo-Bar-0.0.1.tar.gz")
            .unwrap();
        assert_eq!(d.id, 1001);
        assert_eq!(d.pause_id, "SKAJI");
        assert_eq!(d.name, "Foo-Bar");
        assert_eq!(d.version, "0.0.1");
        assert_eq!(d.main_module, "Foo::Bar");
        assert!(d.is_raku);
    }

    #[test]
    fn parse_perl_upload_is_not_raku() {
        let d = Distribution::parse(7, "CPAN Upload: E/ET/ETHER/Moose-2.2207.tar.gz").unwrap();
        assert!(!d.is_raku);
        assert_eq!(d.main_module, "Moose");
        assert_eq!(d.version, "2.2207");
    }

    #[test]
    fn parse_subdirectory_other_than_perl6() {
        let d = Distribution::parse(8, "CPAN Upload: A/AB/ABC/misc/Foo-1.0.zip").unwrap();
        assert!(!d.is_raku);
        assert_eq!(d.name, "Foo");
    }

    #[test]
    fn parse_v_version_and_dashed_name() {
        let d = Distribution::parse(9, "CPAN Upload: T/TI/TIMOTIMO/Perl6/JSON-Fast-Hyper-v0.3.tgz")
            .unwrap();
        assert_eq!(d.name, "JSON-Fast-Hyper");
        assert_eq!(d.version, "v0.3");
        assert_eq!(d.main_module, "JSON::Fast::Hyper");
    }

    #[test]
    fn version_may_contain_dashes() {
        let (name, version) = split_version("App-Mi6-1.0-TRIAL").unwrap();
        assert_eq!(name, "App-Mi6");
        assert_eq!(version, "1.0-TRIAL");
    }

    #[test]
    fn reject_non_upload_subject() {
        assert!(matches!(
            Distribution::parse(1, "Re: something else"),
            Err(ParseError::NotUpload(_))
        ));
        assert!(matches!(
            Distribution::parse(1, "CPAN Upload:   "),
            Err(ParseError::NotUpload(_))
        ));
    }

    #[test]
    fn reject_bad_path() {
        assert!(matches!(
            Distribution::parse(1, "CPAN Upload: Foo-1.0.tar.gz"),
            Err(ParseError::BadPath(_))
        ));
        assert!(matches!(
            Distribution::parse(1, "CPAN Upload: S/XX/SKAJI/Foo-1.0.tar.gz"),
            Err(ParseError::BadPath(_))
        ));
    }

    #[test]
    fn reject_missing_version_or_extension() {
        assert!(matches!(
            Distribution::parse(1, "CPAN Upload: S/SK/SKAJI/Perl6/Foo.tar.gz"),
            Err(ParseError::BadFilename(_))
        ));
        assert!(matches!(
            Distribution::parse(1, "CPAN Upload: S/SK/SKAJI/Perl6/Foo-1.0.rar"),
            Err(ParseError::BadFilename(_))
        ));
    }

    #[test]
    fn meta_url_replaces_extension() {
        let d = Distribution::parse(1, "CPAN Upload: S/SK/SKAJI/Perl6/Foo-Bar-0.0.1.tar.gz")
            .unwrap();
        assert_eq!(
            d.meta_url("https://www.cpan.org/"),
            "https://www.cpan.org/authors/id/S/SK/SKAJI/Perl6/Foo-Bar-0.0.1.meta"
        );
        assert_eq!(
            d.download_url("https://www.cpan.org"),
            "https://www.cpan.org/authors/id/S/SK/SKAJI/Perl6/Foo-Bar-0.0.1.tar.gz"
        );
    }

    #[test]
    fn as_json_contains_fields() {
        let d = Distribution::parse(1001, "CPAN Upload: S/SK/SKAJI/Perl6/Foo-Bar-0.0.1.tar.gz")
            .unwrap();
        let v: serde_json::Value = serde_json::from_str(&d.as_json()).unwrap();
        assert_eq!(v["id"], 1001);
        assert_eq!(v["main_module"], "Foo::Bar");
        assert_eq!(v["is_raku"], true);
    }
}
