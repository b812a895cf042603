//! On-disk text format helpers.
//!
//! Every FlatStore file is line oriented. Structural sections are delimited
//! by sentinel lines:
//!
//! ```text
//! catalog:   <banner>\n#substores\n<name>\n...
//! records:   #records\n<v1 v2 ...>\n...
//! metadata:  <field[tags] ...>\n#hashes\n<field k1 k2 ...>\n...#endhashes\n
//! ```

use crate::error::{Error, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Start of the sub-store list in a catalog file
pub const SUB_STORES_START: &str = "#substores";
/// Start of the data lines in a record file
pub const RECORDS_START: &str = "#records";
/// Start of the key-set section in a metadata file
pub const KEY_SETS_START: &str = "#hashes";
/// End of the key-set section in a metadata file
pub const KEY_SETS_END: &str = "#endhashes";

/// Extension of record files
pub const RECORD_FILE_EXT: &str = "sbstore";
/// Suffix appended to a record file path to get its metadata file
pub const META_FILE_SUFFIX: &str = ".meta";
/// Suffix appended to a file path for its rewrite temp file
pub const TEMP_FILE_SUFFIX: &str = ".temp";

/// Durability of file writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// `sync_all` every written file before it becomes visible
    #[default]
    Sync,
    /// Leave flushing to the OS (fastest, unsafe for power loss)
    None,
}

/// `path` with `suffix` appended to its file name.
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Metadata file belonging to a record file.
pub fn meta_path(record_path: &Path) -> PathBuf {
    with_suffix(record_path, META_FILE_SUFFIX)
}

/// Temp file used while rewriting `path`.
pub fn temp_path(path: &Path) -> PathBuf {
    with_suffix(path, TEMP_FILE_SUFFIX)
}

/// Line content without its terminator.
pub fn trim_line_end(line: &str) -> &str {
    line.trim_end_matches(&['\n', '\r'][..])
}

/// Reads the next line, `None` at end of file. The terminator is kept.
pub fn next_line<R: BufRead>(reader: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        Ok(None)
    } else {
        Ok(Some(line))
    }
}

/// Reads raw lines up to (not including) the `sentinel` line.
///
/// The sentinel itself is consumed. Fails if the file ends first.
pub fn read_until_sentinel<R: BufRead>(reader: &mut R, sentinel: &str) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    loop {
        match next_line(reader)? {
            Some(line) if trim_line_end(&line) == sentinel => return Ok(lines),
            Some(line) => lines.push(line),
            None => {
                return Err(Error::Malformed(format!(
                    "sentinel line {} not found",
                    sentinel
                )))
            }
        }
    }
}

/// Skips everything up to and including the `sentinel` line.
pub fn seek_to_sentinel<R: BufRead>(reader: &mut R, sentinel: &str) -> Result<()> {
    read_until_sentinel(reader, sentinel).map(|_| ())
}

/// Writes `line` followed by a newline, normalising any existing terminator.
pub fn write_line<W: Write>(writer: &mut W, line: &str) -> Result<()> {
    writer.write_all(trim_line_end(line).as_bytes())?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Flushes per the sync mode.
pub fn sync_file(file: &File, sync_mode: SyncMode) -> Result<()> {
    if sync_mode == SyncMode::Sync {
        file.sync_all()?;
    }
    Ok(())
}

/// Opens `path` for appending, adding a newline first if the file does not
/// already end with one.
pub fn open_for_append(path: &Path) -> Result<File> {
    let mut file = OpenOptions::new().read(true).append(true).open(path)?;
    let len = file.metadata()?.len();
    if len > 0 {
        let mut last = [0u8; 1];
        file.seek(SeekFrom::Start(len - 1))?;
        file.read_exact(&mut last)?;
        if last[0] != b'\n' {
            file.write_all(b"\n")?;
        }
    }
    Ok(file)
}

/// Moves a fully written `temp` file over `target`.
///
/// `rename` replaces the target in one step, so readers see either the old
/// or the new contents under the canonical name, never a partial file. With
/// [`SyncMode::Sync`] the parent directory is synced so the rename itself
/// survives a crash.
pub fn replace_file(target: &Path, temp: &Path, sync_mode: SyncMode) -> Result<()> {
    fs::rename(temp, target)?;
    if sync_mode == SyncMode::Sync {
        sync_parent_dir(target)?;
    }
    Ok(())
}

/// Syncs the directory entry of `path`. No-op where directories cannot be
/// opened as files.
#[cfg(unix)]
pub fn sync_parent_dir(path: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    File::open(parent)?.sync_all()?;
    Ok(())
}

/// Syncs the directory entry of `path`. No-op where directories cannot be
/// opened as files.
#[cfg(not(unix))]
pub fn sync_parent_dir(_path: &Path) -> Result<()> {
    Ok(())
}

/// Writes `contents` to a temp file next to `target`, then replaces `target`.
pub fn write_atomic(target: &Path, contents: &str, sync_mode: SyncMode) -> Result<()> {
    let temp = temp_path(target);
    {
        let mut file = File::create(&temp)?;
        file.write_all(contents.as_bytes())?;
        sync_file(&file, sync_mode)?;
    }
    replace_file(target, &temp, sync_mode)
}
