//! Room image storage
//!
//! Uploaded images are written to a directory on disk under a randomized
//! name and referenced from rooms by their public path
//! (`rooms-imgs/<name>`), which the router serves statically.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// URL prefix (without leading slash) under which stored images are served
pub const PUBLIC_PREFIX: &str = "rooms-imgs";

/// Maximum number of image files per request
pub const MAX_IMAGES_PER_REQUEST: usize = 20;

/// Fresh suffixes tried before giving up on a crowded stem
const MAX_NAME_ATTEMPTS: usize = 16;

static IMAGE_EXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(jpg|jpeg|png|gif)$").expect("invalid image regex"));

/// Upload error
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Only image files are allowed!")]
    NotAnImage { file_name: String },

    #[error("at most {max} images may be uploaded at once")]
    TooManyFiles { max: usize },

    #[error("failed to store image: {0}")]
    Io(#[from] std::io::Error),
}

/// Directory-backed image store
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reject anything that is not a jpg/jpeg/png/gif by name.
    pub fn check(file_name: &str) -> Result<(), UploadError> {
        if IMAGE_EXT_RE.is_match(base_name(file_name)) {
            Ok(())
        } else {
            Err(UploadError::NotAnImage {
                file_name: file_name.to_owned(),
            })
        }
    }

    /// Write one image and return its public path.
    ///
    /// Never overwrites: a name already on disk is retried with a fresh suffix.
    pub async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<String, UploadError> {
        Self::check(file_name)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        for _ in 0..MAX_NAME_ATTEMPTS {
            let stored = stored_name(file_name, &random_suffix());
            let mut file = match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(self.dir.join(&stored))
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    tracing::debug!(stored = %stored, "stored name taken, retrying");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            file.write_all(bytes).await?;
            file.flush().await?;

            tracing::debug!(original = file_name, stored = %stored, size = bytes.len(), "image stored");
            return Ok(format!("{}/{}", PUBLIC_PREFIX, stored));
        }

        Err(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free stored name for '{}'", base_name(file_name)),
        )
        .into())
    }

    /// Best-effort removal of images previously returned by `save`.
    pub async fn discard(&self, public_paths: &[String]) {
        for path in public_paths {
            let Some(name) = path
                .strip_prefix(PUBLIC_PREFIX)
                .and_then(|p| p.strip_prefix('/'))
                .filter(|n| !n.contains(['/', '\\']) && *n != "..")
            else {
                continue;
            };

            if let Err(e) = tokio::fs::remove_file(self.dir.join(name)).await {
                tracing::warn!(path = %path, "failed to discard image: {}", e);
            }
        }
    }
}

/// Last path component of a client-supplied name.
fn base_name(file_name: &str) -> &str {
    file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
}

/// `<stem>-<suffix><ext>`: stem is everything before the first dot,
/// ext is everything from the last dot.
fn stored_name(file_name: &str, suffix: &str) -> String {
    let base = base_name(file_name);
    let stem = base.split('.').next().unwrap_or_default();
    let stem = if stem.is_empty() { "image" } else { stem };
    let ext = base.rfind('.').map(|i| &base[i..]).unwrap_or_default();
    format!("{}-{}{}", stem, suffix, ext)
}

fn random_suffix() -> String {
    format!("{:04x}", rand::thread_rng().gen::<u16>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn accepts_images_any_case() {
        for name in ["a.jpg", "a.JPEG", "b.png", "c.Gif", "dir/d.jpeg"] {
            assert!(ImageStore::check(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn rejects_other_files() {
        for name in ["a.txt", "a.jpg.exe", "png", "a.webp"] {
            assert!(
                matches!(ImageStore::check(name), Err(UploadError::NotAnImage { .. })),
                "{name}"
            );
        }
    }

    #[test]
    fn stored_name_keeps_stem_and_extension() {
        assert_eq!(stored_name("room.jpg", "beef"), "room-beef.jpg");
        assert_eq!(stored_name("suite.front.png", "0001"), "suite-0001.png");
        assert_eq!(stored_name("../../etc/view.gif", "abcd"), "view-abcd.gif");
        assert_eq!(stored_name("C:\\pics\\lobby.jpeg", "abcd"), "lobby-abcd.jpeg");
        assert_eq!(stored_name(".png", "abcd"), "image-abcd.png");
    }

    #[test]
    fn suffix_is_four_hex_chars() {
        let suffix = random_suffix();
        assert_eq!(suffix.len(), 4);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn save_writes_file_and_returns_public_path() {
        let tmp = TempDir::new().unwrap();
        let store = ImageStore::new(tmp.path().join("imgs"));

        let path = store.save("lobby.png", b"fake png").await.unwrap();
        assert!(path.starts_with("rooms-imgs/lobby-"));
        assert!(path.ends_with(".png"));

        let file_name = path.trim_start_matches("rooms-imgs/");
        let written = std::fs::read(store.dir().join(file_name)).unwrap();
        assert_eq!(written, b"fake png");
    }

    #[tokio::test]
    async fn same_name_never_shares_a_file() {
        let tmp = TempDir::new().unwrap();
        let store = ImageStore::new(tmp.path());

        let mut saved = Vec::new();
        for i in 0u32..2000 {
            let path = store.save("room.jpg", &i.to_le_bytes()).await.unwrap();
            saved.push((path, i));
        }

        assert_eq!(std::fs::read_dir(store.dir()).unwrap().count(), saved.len());
        for (path, i) in saved {
            let written = std::fs::read(store.dir().join(path.trim_start_matches("rooms-imgs/"))).unwrap();
            assert_eq!(written, i.to_le_bytes(), "{path}");
        }
    }

    #[tokio::test]
    async fn discard_ignores_foreign_paths() {
        let tmp = TempDir::new().unwrap();
        let store = ImageStore::new(tmp.path().join("imgs"));
        std::fs::write(tmp.path().join("keep.png"), b"x").unwrap();

        let saved = store.save("room.jpg", b"jpg").await.unwrap();
        store
            .discard(&[saved, "rooms-imgs/../keep.png".into(), "elsewhere/keep.png".into()])
            .await;

        assert_eq!(std::fs::read_dir(store.dir()).unwrap().count(), 0);
        assert!(tmp.path().join("keep.png").exists());
    }

    #[tokio::test]
    async fn save_rejects_non_image() {
        let tmp = TempDir::new().unwrap();
        let store = ImageStore::new(tmp.path());

        let err = store.save("notes.txt", b"hi").await.unwrap_err();
        assert_eq!(err.to_string(), "Only image files are allowed!");
    }
}
