//! Artifact file helpers.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use devutils_models::{OutputMode, SessionId};

/// Path the compiler is asked to write the artifact to.
///
/// Unique per session and not derived from the source file name.
pub fn artifact_path(dir: &Path, session: &SessionId, mode: OutputMode) -> PathBuf {
    dir.join(format!("devutils-{}.{}", session, mode.extension()))
}

/// Copies `source` into a new file in `dir` without its empty lines.
///
/// Preprocessors emit long runs of blank lines; dropping them keeps the
/// artifact navigable. Returns the path of the copy, which the caller owns.
pub fn strip_empty_lines(source: &Path, dir: &Path) -> io::Result<PathBuf> {
    let bytes = fs::read(source)?;
    let text = String::from_utf8_lossy(&bytes);

    fs::create_dir_all(dir)?;
    let file = tempfile::Builder::new()
        .prefix("devutils-clean-")
        .suffix(".cpp")
        .tempfile_in(dir)?;

    {
        let mut out = BufWriter::new(file.as_file());
        for line in text.lines().filter(|l| !l.is_empty()) {
            writeln!(out, "{}", line)?;
        }
        out.flush()?;
    }

    let (_, path) = file.keep().map_err(|e| e.error)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_artifact_path_is_per_session() {
        let dir = Path::new("/tmp/out");
        let a = artifact_path(dir, &SessionId::from_string("sess-a"), OutputMode::Assembly);
        let b = artifact_path(dir, &SessionId::from_string("sess-b"), OutputMode::Preprocessed);

        assert_eq!(a, PathBuf::from("/tmp/out/devutils-sess-a.asm"));
        assert_eq!(b, PathBuf::from("/tmp/out/devutils-sess-b.cpp"));
    }

    #[test]
    fn test_strip_empty_lines() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("raw.i");
        fs::write(&source, "#line 1 \"a.cpp\"\n\n\n\nint x;\r\n\r\n  \nint y;\n").unwrap();

        let cleaned = strip_empty_lines(&source, dir.path()).unwrap();

        assert_ne!(cleaned, source);
        assert_eq!(
            fs::read_to_string(&cleaned).unwrap(),
            "#line 1 \"a.cpp\"\nint x;\n  \nint y;\n"
        );
    }

    #[test]
    fn test_strip_missing_source() {
        let dir = tempdir().unwrap();
        assert!(strip_empty_lines(&dir.path().join("missing.i"), dir.path()).is_err());
    }
}
