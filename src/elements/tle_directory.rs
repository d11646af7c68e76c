use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::elements::error::ElementsError;
use crate::elements::tle::{parse_multi_tle, TleLines};
use crate::elements::ElementSource;

/// Offline element source: a folder of `.tle` / `.txt` files, re-read on every fetch.
#[derive(Debug, Clone)]
pub struct TleDirectorySource {
    tle_dir: PathBuf,
}

impl TleDirectorySource {
    pub fn new(tle_dir: PathBuf) -> Self {
        Self { tle_dir }
    }

    /// Load all TLE files from the directory, keyed by catalog number
    pub fn load_all(&self) -> Result<HashMap<u32, TleLines>, ElementsError> {
        if !self.tle_dir.exists() {
            return Err(ElementsError::DirectoryNotFound(
                self.tle_dir.display().to_string(),
            ));
        }

        let mut satellites = HashMap::new();
        for entry in fs::read_dir(&self.tle_dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let is_tle = path
                .extension()
                .map(|ext| ext == "tle" || ext == "txt")
                .unwrap_or(false);
            if !is_tle {
                continue;
            }

            match parse_tle_file(&path) {
                Ok(entries) => satellites.extend(entries),
                Err(e) => {
                    log::warn!("Failed to parse TLE file {}: {}", path.display(), e);
                }
            }
        }

        Ok(satellites)
    }
}

/// Parse a single TLE file (may contain multiple satellites)
fn parse_tle_file(path: &Path) -> Result<Vec<(u32, TleLines)>, ElementsError> {
    let content = fs::read_to_string(path)?;

    parse_multi_tle(&content)
        .into_iter()
        .map(|(name, lines)| {
            let (elements, _) = lines.to_sgp4(name)?;
            let norad_id = u32::try_from(elements.norad_id)
                .map_err(|_| ElementsError::InvalidTle(format!("NORAD id {}", elements.norad_id)))?;
            Ok((norad_id, lines))
        })
        .collect()
}

#[async_trait]
impl ElementSource for TleDirectorySource {
    async fn fetch_elements(&self, norad_id: u32) -> Result<TleLines, ElementsError> {
        let source = self.clone();
        let satellites = tokio::task::spawn_blocking(move || source.load_all())
            .await
            .map_err(|e| ElementsError::FileRead(std::io::Error::other(e)))??;

        satellites
            .get(&norad_id)
            .cloned()
            .ok_or(ElementsError::NotFound(norad_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISS: &str = "ISS (ZARYA)\n\
        1 25544U 98067A   20194.88612269 -.00002218  00000-0 -31515-4 0  9992\n\
        2 25544  51.6461 221.2784 0001413  89.1723 280.4612 15.49507896236008\n";

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pass-o-mat-tle-{}-{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn finds_satellite_by_catalog_number() {
        let dir = temp_dir("found");
        fs::write(dir.join("stations.tle"), ISS).unwrap();
        fs::write(dir.join("notes.md"), "not a tle").unwrap();

        let source = TleDirectorySource::new(dir.clone());
        let tle = source.fetch_elements(25544).await.unwrap();
        assert!(tle.line1.starts_with("1 25544U"));

        let err = source.fetch_elements(43013).await.unwrap_err();
        assert!(matches!(err, ElementsError::NotFound(43013)));

        let _ = fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn broken_files_are_skipped() {
        let dir = temp_dir("broken");
        fs::write(dir.join("good.txt"), ISS).unwrap();
        fs::write(
            dir.join("bad.tle"),
            "BROKEN\n1 99999U bad line\n2 99999 bad line\n",
        )
        .unwrap();

        let loaded = TleDirectorySource::new(dir.clone()).load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains_key(&25544));

        let _ = fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let source = TleDirectorySource::new(PathBuf::from("/nonexistent/pass-o-mat/tle"));
        let err = source.fetch_elements(25544).await.unwrap_err();
        assert!(matches!(err, ElementsError::DirectoryNotFound(_)));
    }
}
