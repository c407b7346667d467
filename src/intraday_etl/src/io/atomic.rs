use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

/// Writes `contents` to `dir/file_name` without ever exposing a partial file.
///
/// The bytes go to a hidden temporary file in the same directory, which is
/// then renamed into place. The rename refuses to replace an existing file, so
/// a prior artifact is never overwritten or truncated. On any failure the
/// temporary file is removed when it is dropped.
pub(crate) fn write_new_file(dir: &Path, file_name: &str, contents: &[u8]) -> io::Result<PathBuf> {
    let target = dir.join(file_name);

    let mut tmp = tempfile::Builder::new()
        .prefix(".tmp-")
        .suffix(".partial")
        .tempfile_in(dir)?;
    tmp.write_all(contents)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist_noclobber(&target).map_err(|err| err.error)?;

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_and_refuses_to_clobber() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_new_file(dir.path(), "a.json", b"[1]").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"[1]");

        let err = write_new_file(dir.path(), "a.json", b"[2]").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(std::fs::read(&path).unwrap(), b"[1]");

        // no temporary leftovers
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("a.json")]);
    }
}
