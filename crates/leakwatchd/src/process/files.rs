use std::fs::Permissions;
use std::io::{self, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use tempfile::Builder;

/// Writes the provided bytes to the path without replacing an existing file.
///
/// Data is flushed and fsync'd before the temporary file is linked into place
/// so readers never observe a partially written payload. When the target
/// already exists the call fails with [`io::ErrorKind::AlreadyExists`].
pub(super) fn atomic_write_new(path: &Path, directory: &Path, contents: &[u8]) -> io::Result<()> {
    let mut builder = Builder::new();
    builder.prefix(
        path.file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(env!("CARGO_PKG_NAME")),
    );
    builder.permissions(Permissions::from_mode(0o644));

    let mut file = builder.tempfile_in(directory)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist_noclobber(path).map_err(|error| error.error)?;
    Ok(())
}
