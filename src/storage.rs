// SPDX-License-Identifier: GPL-3.0-only

//! Storage roots and output file writing

use crate::constants::{DEFAULT_APP_NAME, DEFAULT_PUBLIC_FOLDER};
use crate::errors::TransformError;
use crate::profiles::{Destination, OutputProfile};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Maps a profile destination to a directory supplied by the host
pub trait DestinationResolver: Send + Sync {
    /// Directory for `destination`, or `None` when the host has none
    fn root(&self, destination: Destination) -> Option<PathBuf>;
}

/// Explicit set of storage roots, one per destination
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageRoots {
    pub cache: Option<PathBuf>,
    pub private: Option<PathBuf>,
    pub public: Option<PathBuf>,
}

impl StorageRoots {
    /// Use the same parent for all three roots (`cache/`, `private/`, `public/`)
    pub fn under(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        Self {
            cache: Some(base.join(Destination::Cache.as_str())),
            private: Some(base.join(Destination::Private.as_str())),
            public: Some(base.join(Destination::Public.as_str())),
        }
    }

    /// Resolve roots from the platform's user directories
    ///
    /// Cache and private roots are namespaced by `app_name`; the public root
    /// is a folder in the user's pictures directory.
    pub fn from_system(app_name: &str) -> Self {
        let app_name = if app_name.trim().is_empty() {
            DEFAULT_APP_NAME
        } else {
            app_name
        };

        let roots = Self {
            cache: dirs::cache_dir().map(|d| d.join(app_name)),
            private: dirs::data_local_dir().map(|d| d.join(app_name)),
            public: dirs::picture_dir()
                .or_else(|| dirs::home_dir().map(|h| h.join("Pictures")))
                .map(|d| d.join(DEFAULT_PUBLIC_FOLDER)),
        };

        debug!(?roots, "Resolved system storage roots");
        roots
    }
}

impl DestinationResolver for StorageRoots {
    fn root(&self, destination: Destination) -> Option<PathBuf> {
        match destination {
            Destination::Cache => self.cache.clone(),
            Destination::Private => self.private.clone(),
            Destination::Public => self.public.clone(),
        }
    }
}

/// Absolute output path for a profile
pub fn output_path(
    resolver: &dyn DestinationResolver,
    profile: &OutputProfile,
) -> Result<PathBuf, TransformError> {
    profile.validate()?;
    let root = resolver.root(profile.destination).ok_or_else(|| {
        TransformError::NoDestination(format!(
            "no {} directory for profile '{}'",
            profile.destination,
            profile.name()
        ))
    })?;

    let path = root.join(profile.file_name());
    Ok(std::path::absolute(&path).unwrap_or(path))
}

/// Write `data` to `path`, replacing any existing file
///
/// The parent directory is created if needed. The file is flushed and synced
/// before returning; on any error the handle is dropped (closed) as well.
pub fn write_file(path: &Path, data: &[u8]) -> Result<(), TransformError> {
    let write_error = |e: std::io::Error| TransformError::Write {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_error)?;
    }

    let file = File::create(path).map_err(write_error)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(data).map_err(write_error)?;
    writer.flush().map_err(write_error)?;
    writer.get_ref().sync_all().map_err(write_error)?;

    debug!(path = %path.display(), bytes = data.len(), "Output written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_per_destination() {
        let roots = StorageRoots::under("/data/app");
        let mut profile = OutputProfile::named("thumb");

        assert_eq!(
            output_path(&roots, &profile).unwrap(),
            PathBuf::from("/data/app/cache/thumb.jpg")
        );

        profile.destination = Destination::Public;
        assert_eq!(
            output_path(&roots, &profile).unwrap(),
            PathBuf::from("/data/app/public/thumb.jpg")
        );
    }

    #[test]
    fn test_output_path_missing_root() {
        let roots = StorageRoots {
            cache: Some(PathBuf::from("/c")),
            ..Default::default()
        };
        let mut profile = OutputProfile::named("x");
        profile.destination = Destination::Private;

        assert!(matches!(
            output_path(&roots, &profile),
            Err(TransformError::NoDestination(_))
        ));
    }

    #[test]
    fn test_output_path_stays_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let roots = StorageRoots::under(dir.path());

        let escaping = other.path().join("escaped");
        for name in ["/abs/x", "../x", escaping.to_str().unwrap()] {
            assert!(
                matches!(
                    output_path(&roots, &OutputProfile::named(name)),
                    Err(TransformError::InvalidProfile(_))
                ),
                "{name} escaped the root"
            );
        }

        let path = output_path(&roots, &OutputProfile::named("inside")).unwrap();
        assert!(path.starts_with(dir.path()));
    }

    #[test]
    fn test_write_file_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.jpg");

        write_file(&path, b"first version").unwrap();
        write_file(&path, b"second").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"second");
    }

    #[test]
    fn test_write_file_unwritable_parent() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let result = write_file(&blocker.join("out.jpg"), b"data");
        assert!(matches!(result, Err(TransformError::Write { .. })));
    }
}
