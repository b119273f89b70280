use std::{
    fs::{self, File},
    io::{self, BufReader, Read},
    path::{Path, PathBuf},
};

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use tar::Archive;
use tracing::{info, warn};
use xz2::read::XzDecoder;
use zip::read::ZipArchive;

use super::{
    error::{IoContext, Result, ZooError},
    merge::merge_into,
};
use crate::core::events::DownloadObserver;

const STAGING_DIR: &str = "tmp";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Tar,
    Zip,
}

impl ArchiveFormat {
    /// Guesses the container from the file name alone. Any name mentioning
    /// `tar` is a tarball, whatever its compression; otherwise `zip` marks a
    /// zip file.
    #[must_use]
    pub fn classify(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy();
        if name.contains("tar") {
            Some(ArchiveFormat::Tar)
        } else if name.contains("zip") {
            Some(ArchiveFormat::Zip)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TarCompression {
    Plain,
    Gzip,
    Bzip2,
    Xz,
}

impl TarCompression {
    fn sniff(path: &Path) -> Result<Self> {
        let file = File::open(path).io_context("open archive", path)?;
        let mut magic = Vec::with_capacity(6);
        file.take(6)
            .read_to_end(&mut magic)
            .io_context("read archive header", path)?;
        Ok(match magic.as_slice() {
            [0x1f, 0x8b, ..] => TarCompression::Gzip,
            [b'B', b'Z', b'h', ..] => TarCompression::Bzip2,
            [0xfd, b'7', b'z', b'X', b'Z', 0x00] => TarCompression::Xz,
            _ => TarCompression::Plain,
        })
    }
}

/// Unpacks `archive` next to itself and removes it afterwards.
///
/// Contents are first unpacked into a `tmp` directory beside the archive and
/// then merged entry by entry into the archive's directory with
/// [`merge_into`]. Returns the directory that received the contents.
pub fn extract(archive: &Path, observer: &mut dyn DownloadObserver) -> Result<PathBuf> {
    let format = ArchiveFormat::classify(archive).ok_or_else(|| ZooError::UnsupportedArchive {
        path: archive.to_path_buf(),
    })?;

    let parent = archive
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    let staging = parent.join(STAGING_DIR);

    info!("Decompressing {}...", archive.display());
    observer.extract_started(archive);

    prepare_staging(&staging)?;

    match format {
        ArchiveFormat::Tar => extract_tar(archive, &staging)?,
        ArchiveFormat::Zip => extract_zip(archive, &staging)?,
    }

    let staged = fs::read_dir(&staging)
        .io_context("read staging directory", &staging)?
        .collect::<io::Result<Vec<_>>>()
        .io_context("read entry in", &staging)?;
    for entry in staged {
        merge_into(&entry.path(), &parent.join(entry.file_name()))?;
    }

    fs::remove_dir_all(&staging).io_context("remove staging directory", &staging)?;
    fs::remove_file(archive).io_context("remove archive", archive)?;

    observer.extract_finished(&parent);
    Ok(parent)
}

fn prepare_staging(staging: &Path) -> Result<()> {
    if staging.exists() {
        warn!("Removing leftover staging directory {}", staging.display());
        fs::remove_dir_all(staging).io_context("remove staging directory", staging)?;
    }
    fs::create_dir_all(staging).io_context("create staging directory", staging)
}

fn extract_tar(archive_path: &Path, staging: &Path) -> Result<()> {
    let compression = TarCompression::sniff(archive_path)?;
    let file = BufReader::new(File::open(archive_path).io_context("open archive", archive_path)?);
    match compression {
        TarCompression::Plain => unpack_tar(file, archive_path, staging),
        TarCompression::Gzip => unpack_tar(GzDecoder::new(file), archive_path, staging),
        TarCompression::Bzip2 => unpack_tar(BzDecoder::new(file), archive_path, staging),
        TarCompression::Xz => unpack_tar(XzDecoder::new(file), archive_path, staging),
    }
}

fn unpack_tar<R: Read>(reader: R, archive_path: &Path, staging: &Path) -> Result<()> {
    let mut archive = Archive::new(reader);
    for entry in archive
        .entries()
        .io_context("iterate tar entries in", archive_path)?
    {
        let mut entry = entry.io_context("read tar entry in", archive_path)?;
        let unpacked = entry
            .unpack_in(staging)
            .io_context("unpack tar entry into", staging)?;
        if !unpacked {
            let name = entry
                .path()
                .map(|path| path.display().to_string())
                .unwrap_or_default();
            warn!("Skipping tar entry outside the archive root: {name}");
        }
    }
    Ok(())
}

fn extract_zip(archive_path: &Path, staging: &Path) -> Result<()> {
    let file = File::open(archive_path).io_context("open archive", archive_path)?;
    let mut archive = ZipArchive::new(file)
        .map_err(io::Error::from)
        .io_context("open zip archive", archive_path)?;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(io::Error::from)
            .io_context("read zip entry in", archive_path)?;
        let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
            warn!("Skipping zip entry outside the archive root: {}", entry.name());
            continue;
        };
        let dest = staging.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&dest).io_context("create zip dir", &dest)?;
        } else {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).io_context("create zip file parent", parent)?;
            }
            let mut outfile = File::create(&dest).io_context("create zip file", &dest)?;
            io::copy(&mut entry, &mut outfile).io_context("write zip file", &dest)?;
        }
    }
    Ok(())
}
