//! Installs the WordNet index files on first use.
//!
//! The archive is the WordNet 3.0 corpus as packaged for NLTK; only the
//! `index.*` and `*.exc` files are kept.

use std::fs;
use std::io::{self, Cursor};
use std::path::Path;
use std::time::Duration;

use tracing::info;

use crate::error::{PortraitError, PortraitResult};
use crate::utils::http::get_http_client;
use crate::utils::timing::log_call_timing;

const DOWNLOAD_TIMEOUT_SECONDS: u64 = 120;

const INDEX_FILES: [&str; 4] = ["index.noun", "index.verb", "index.adj", "index.adv"];
const EXCEPTION_FILES: [&str; 4] = ["noun.exc", "verb.exc", "adj.exc", "adv.exc"];

fn is_wanted(file_name: &str) -> bool {
    INDEX_FILES.contains(&file_name) || EXCEPTION_FILES.contains(&file_name)
}

pub fn is_installed(dir: &Path) -> bool {
    INDEX_FILES.iter().all(|name| dir.join(name).is_file())
}

/// Copies the index and exception files out of a zip archive into `dir`,
/// flattening whatever folder they sit in. Returns how many were written.
pub fn extract_wordnet(archive: &[u8], dir: &Path) -> io::Result<usize> {
    let mut zip = zip::ZipArchive::new(Cursor::new(archive)).map_err(io::Error::other)?;
    fs::create_dir_all(dir)?;

    let mut written = 0;
    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(io::Error::other)?;
        if !entry.is_file() {
            continue;
        }
        let Some(file_name) = Path::new(entry.name())
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
        else {
            continue;
        };
        if !is_wanted(&file_name) {
            continue;
        }

        let mut target = fs::File::create(dir.join(&file_name))?;
        io::copy(&mut entry, &mut target)?;
        written += 1;
    }

    if !is_installed(dir) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "archive does not contain the WordNet index files",
        ));
    }
    Ok(written)
}

/// Downloads and unpacks WordNet into `dir` unless the index files are
/// already there.
pub async fn ensure_wordnet(dir: &Path, url: &str) -> PortraitResult<()> {
    if is_installed(dir) {
        return Ok(());
    }

    info!(
        "WordNet index files not found in {}; downloading {}",
        dir.display(),
        url
    );
    let archive = log_call_timing("wordnet", "download", None, || async {
        let response = get_http_client()
            .get(url)
            .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECONDS))
            .send()
            .await
            .map_err(|err| PortraitError::Lexicon(format!("WordNet download failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PortraitError::Lexicon(format!(
                "WordNet download failed with status {status}"
            )));
        }

        response
            .bytes()
            .await
            .map_err(|err| PortraitError::Lexicon(format!("WordNet download failed: {err}")))
    })
    .await?;

    let target = dir.to_path_buf();
    let written = tokio::task::spawn_blocking(move || extract_wordnet(&archive, &target))
        .await
        .map_err(|err| PortraitError::Lexicon(format!("WordNet extraction task failed: {err}")))?
        .map_err(|err| PortraitError::Lexicon(format!("Failed to unpack WordNet: {err}")))?;
    info!("Installed {} WordNet files into {}", written, dir.display());
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    use super::*;
    use crate::text::lexicon::tests::{ADJ_INDEX, ADV_INDEX, NOUN_INDEX, VERB_INDEX};

    pub(crate) fn scratch_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "wordnet_{label}_{}_{}",
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ))
    }

    pub(crate) fn write_index_files(dir: &Path) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("index.noun"), NOUN_INDEX).unwrap();
        fs::write(dir.join("index.verb"), VERB_INDEX).unwrap();
        fs::write(dir.join("index.adj"), ADJ_INDEX).unwrap();
        fs::write(dir.join("index.adv"), ADV_INDEX).unwrap();
    }

    fn archive(files: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, contents) in files {
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn extracts_index_and_exception_files() {
        let dir = scratch_dir("extract");
        let bytes = archive(&[
            ("wordnet/index.noun", NOUN_INDEX),
            ("wordnet/index.verb", VERB_INDEX),
            ("wordnet/index.adj", ADJ_INDEX),
            ("wordnet/index.adv", ADV_INDEX),
            ("wordnet/verb.exc", "fought fight\n"),
            ("wordnet/data.noun", "unused"),
            ("wordnet/LICENSE", "unused"),
        ]);

        assert_eq!(extract_wordnet(&bytes, &dir).unwrap(), 5);
        assert!(is_installed(&dir));
        assert!(dir.join("verb.exc").is_file());
        assert!(!dir.join("data.noun").exists());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn incomplete_archive_is_rejected() {
        let dir = scratch_dir("incomplete");
        let bytes = archive(&[("wordnet/index.noun", NOUN_INDEX)]);

        assert!(extract_wordnet(&bytes, &dir).is_err());
        assert!(!is_installed(&dir));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn garbage_is_not_an_archive() {
        let dir = scratch_dir("garbage");
        assert!(extract_wordnet(b"definitely not a zip", &dir).is_err());
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn installed_files_skip_the_download() {
        let dir = scratch_dir("installed");
        write_index_files(&dir);

        ensure_wordnet(&dir, "http://127.0.0.1:9/wordnet.zip").await.unwrap();

        fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn unreachable_source_is_a_lexicon_error() {
        let dir = scratch_dir("unreachable");
        let err = ensure_wordnet(&dir, "http://127.0.0.1:9/wordnet.zip")
            .await
            .unwrap_err();
        assert!(matches!(err, PortraitError::Lexicon(_)));
        assert!(!is_installed(&dir));
    }
}
