/// Persists finished STL buffers to disk
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use terrastl_core::StlBuffer;
use tracing::debug;

/// Writes `buffer` next to `path` and renames it into place, so readers
/// never see a half-written file.
pub fn save_stl(path: &Path, buffer: &StlBuffer) -> io::Result<()> {
    let tmp = temp_path(path)?;

    if let Err(e) = write_file(&tmp, buffer).and_then(|()| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }

    debug!(path = %path.display(), bytes = buffer.len(), "saved STL");
    Ok(())
}

fn write_file(path: &Path, buffer: &StlBuffer) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    buffer.write_to(&mut writer)?;
    writer.flush()?;
    writer.into_inner().map_err(|e| e.into_error())?.sync_all()
}

fn temp_path(path: &Path) -> io::Result<PathBuf> {
    let name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("`{}` does not name a file", path.display()),
        )
    })?;

    let mut tmp: OsString = name.to_os_string();
    tmp.push(".tmp");
    Ok(path.with_file_name(tmp))
}
