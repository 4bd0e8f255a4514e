//! Remote and local firmware listings.
//!
//! A firmware name starts with `esp32-`, ends with `.bin` and has no path
//! separators, quotes, angle brackets or whitespace in between. The same rule
//! applies to names found on the listing page and in the target folder.

use std::collections::{BTreeSet, HashSet};
use std::io::ErrorKind;
use std::path::Path;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::config::ListingKind;
use crate::downloader::Downloader;
use crate::error::{FetchError, Result};

static FIRMWARE_IN_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(esp32-[^\s"'<>/\\]*\.bin)(?:[\s"'<>/\\]|$)"#).expect("firmware regex is valid")
});

static FIRMWARE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^esp32-[^\s"'<>/\\]*\.bin$"#).expect("firmware name regex is valid")
});

static ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<a\b[^>]*>(.*?)</a\s*>").expect("anchor regex is valid")
});

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag regex is valid"));

/// True if `name` is an `esp32-*.bin` firmware filename.
pub fn is_firmware_name(name: &str) -> bool {
    FIRMWARE_NAME.is_match(name)
}

/// Every firmware name occurring anywhere in `text`, first occurrence order.
///
/// A name must be followed by a delimiter or the end of the text, so
/// `esp32-x.bin.sha256` is not read as `esp32-x.bin`.
pub fn scan_text(text: &str) -> Vec<String> {
    unique(
        FIRMWARE_IN_TEXT
            .captures_iter(text)
            .filter_map(|cap| cap.get(1))
            .map(|m| m.as_str()),
    )
}

/// Firmware names that appear as the text of `<a>` elements in `html`.
pub fn scan_anchors(html: &str) -> Vec<String> {
    let texts: Vec<String> = ANCHOR
        .captures_iter(html)
        .map(|cap| TAG.replace_all(&cap[1], "").trim().to_owned())
        .collect();
    unique(
        texts
            .iter()
            .map(String::as_str)
            .filter(|text| is_firmware_name(text)),
    )
}

fn unique<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .filter(|name| seen.insert(*name))
        .map(str::to_owned)
        .collect()
}

/// Source of the remote firmware names.
#[async_trait]
pub trait ListingProvider: Send + Sync {
    /// Short name used in log lines.
    fn label(&self) -> &str;

    /// Firmware names advertised remotely, in page order without repeats.
    async fn remote_names(&self) -> Result<Vec<String>>;
}

/// Scans the raw listing page text.
pub struct PatternListing {
    downloader: Downloader,
    webpage: String,
}

impl PatternListing {
    pub fn new(downloader: Downloader, webpage: &str) -> Self {
        Self {
            downloader,
            webpage: webpage.to_owned(),
        }
    }
}

#[async_trait]
impl ListingProvider for PatternListing {
    fn label(&self) -> &str {
        "pattern"
    }

    async fn remote_names(&self) -> Result<Vec<String>> {
        let page = self.downloader.fetch_page(&self.webpage).await?;
        Ok(scan_text(&page))
    }
}

/// Reads the text of the listing page's links.
pub struct AnchorListing {
    downloader: Downloader,
    webpage: String,
}

impl AnchorListing {
    pub fn new(downloader: Downloader, webpage: &str) -> Self {
        Self {
            downloader,
            webpage: webpage.to_owned(),
        }
    }
}

#[async_trait]
impl ListingProvider for AnchorListing {
    fn label(&self) -> &str {
        "anchor"
    }

    async fn remote_names(&self) -> Result<Vec<String>> {
        let page = self.downloader.fetch_page(&self.webpage).await?;
        Ok(scan_anchors(&page))
    }
}

/// Build the provider selected by `kind`.
pub fn provider_for(
    kind: ListingKind,
    downloader: Downloader,
    webpage: &str,
) -> Box<dyn ListingProvider> {
    match kind {
        ListingKind::Pattern => Box::new(PatternListing::new(downloader, webpage)),
        ListingKind::Anchor => Box::new(AnchorListing::new(downloader, webpage)),
    }
}

/// Firmware files already present in `folder`.
///
/// A folder that does not exist yet has no firmware in it.
pub fn local_names(folder: &Path) -> Result<BTreeSet<String>> {
    let entries = match std::fs::read_dir(folder) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("{} does not exist yet", folder.display());
            return Ok(BTreeSet::new());
        }
        Err(e) => return Err(FetchError::io(folder, e)),
    };

    let mut names = BTreeSet::new();
    for entry in entries {
        let entry = entry.map_err(|e| FetchError::io(folder, e))?;
        if !entry.path().is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if is_firmware_name(name) {
                names.insert(name.to_owned());
            }
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
        <h1>Firmware for ESP32</h1>
        <ul>
          <li><a href="/resources/firmware/esp32-20210202-v1.14.bin">esp32-20210202-v1.14.bin</a></li>
          <li><a href="/resources/firmware/esp32-20210211-unstable-v1.14-77.bin"><strong>esp32-20210211-unstable-v1.14-77.bin</strong></a></li>
          <li><a href="/resources/firmware/otherfile.bin">otherfile.bin</a></li>
          <li><a href="/resources/firmware/esp32-20210202-v1.14.elf">esp32-20210202-v1.14.elf</a></li>
        </ul>
        </body></html>
    "#;

    #[test]
    fn name_rule() {
        assert!(is_firmware_name("esp32-x.bin"));
        assert!(is_firmware_name("esp32-20210211-unstable-v1.14-77.bin"));
        assert!(!is_firmware_name("otherfile.bin"));
        assert!(!is_firmware_name("esp32-x.binary"));
        assert!(!is_firmware_name("esp32-x.elf"));
        assert!(!is_firmware_name("sub/esp32-x.bin"));
        assert!(!is_firmware_name("esp32-a b.bin"));
    }

    #[test]
    fn text_scan_finds_only_firmware() {
        assert_eq!(
            scan_text(PAGE),
            vec![
                "esp32-20210202-v1.14.bin".to_owned(),
                "esp32-20210211-unstable-v1.14-77.bin".to_owned(),
            ]
        );
    }

    #[test]
    fn anchor_scan_matches_text_scan() {
        assert_eq!(scan_anchors(PAGE), scan_text(PAGE));
    }

    #[test]
    fn text_scan_ignores_other_files() {
        let page = r#"<a href="esp32-x.bin">esp32-x.bin</a> <a href="otherfile.bin">otherfile.bin</a>"#;
        assert_eq!(scan_text(page), vec!["esp32-x.bin".to_owned()]);
        assert_eq!(scan_anchors(page), vec!["esp32-x.bin".to_owned()]);
    }

    #[test]
    fn text_scan_does_not_span_lines_or_tags() {
        let page = "esp32-a.txt\n<b>esp32-b.bin</b> esp32-c.binary";
        assert_eq!(scan_text(page), vec!["esp32-b.bin".to_owned()]);
    }

    #[test]
    fn anchor_scan_skips_links_with_other_text() {
        let page = r#"<a href="esp32-x.bin">download</a><A HREF="esp32-y.bin"> esp32-y.bin </A>"#;
        assert_eq!(scan_anchors(page), vec!["esp32-y.bin".to_owned()]);
    }

    #[test]
    fn checksum_sidecars_are_not_firmware() {
        let page = r#"<a href="esp32-x.bin.sha256">esp32-x.bin.sha256</a>
            <a href="esp32-x.bin.md5">esp32-x.bin.md5</a>"#;
        assert!(scan_text(page).is_empty());
        assert_eq!(scan_text(page), scan_anchors(page));
    }

    #[test]
    fn text_scan_takes_the_whole_name() {
        let page = r#"<a href="esp32-a.bin.bin">esp32-a.bin.bin</a>"#;
        assert_eq!(scan_text(page), vec!["esp32-a.bin.bin".to_owned()]);
        assert_eq!(scan_text(page), scan_anchors(page));
    }

    #[test]
    fn text_scan_handles_adjacent_names_and_end_of_text() {
        let text = "esp32-a.bin esp32-b.bin\nesp32-c.bin";
        assert_eq!(
            scan_text(text),
            vec![
                "esp32-a.bin".to_owned(),
                "esp32-b.bin".to_owned(),
                "esp32-c.bin".to_owned(),
            ]
        );
    }

    #[test]
    fn local_listing_filters_and_tolerates_missing_folder() {
        let dir = std::env::temp_dir().join(format!("fwfetch_local_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        assert!(local_names(&dir).unwrap().is_empty());

        std::fs::create_dir_all(dir.join("esp32-dir.bin")).unwrap();
        std::fs::write(dir.join("esp32-b.bin"), b"b").unwrap();
        std::fs::write(dir.join("esp32-a.bin"), b"a").unwrap();
        std::fs::write(dir.join("notes.txt"), b"").unwrap();
        std::fs::write(dir.join("otherfile.bin"), b"").unwrap();

        let names: Vec<String> = local_names(&dir).unwrap().into_iter().collect();
        assert_eq!(names, vec!["esp32-a.bin".to_owned(), "esp32-b.bin".to_owned()]);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
