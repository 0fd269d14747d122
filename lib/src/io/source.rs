use std::{fs, io};
use std::path::{Path, PathBuf};
use std::fmt::Debug;

use crate::error::{Result, Chainable};
use crate::fstree::Entry;
use crate::io::Sink;

/// Something that can be read in full as UTF-8 text.
pub trait Source: Debug {
    fn read(self) -> Result<String>;

    fn path(&self) -> Option<&Path> {
        None
    }

    #[inline]
    fn read_to<S: Sink>(self, sink: S) -> Result<()> where Self: Sized {
        sink.write(&self.read()?)
    }
}

impl Source for String {
    fn read(self) -> Result<String> {
        Ok(self)
    }
}

impl Source for &str {
    fn read(self) -> Result<String> {
        Ok(self.to_owned())
    }
}

impl Source for &fs::File {
    fn read(self) -> Result<String> {
        use io::Read;

        let mut data = Vec::new();
        io::BufReader::new(self).read_to_end(&mut data)?;
        String::from_utf8(data).map_err(|e| error! {
            "file contents are not valid UTF-8",
            "invalid byte offset" => e.utf8_error().valid_up_to(),
        })
    }
}

impl Source for &Path {
    fn read(self) -> Result<String> {
        let file = fs::File::open(self).chain(error! {
            "failed to open file for reading",
            "file path" => self.display()
        })?;

        file.read().chain_with(|| error! {
            "failed to read file",
            "file path" => self.display()
        })
    }

    fn path(&self) -> Option<&Path> {
        Some(self)
    }
}

impl Source for &PathBuf {
    fn read(self) -> Result<String> {
        self.as_path().read()
    }

    fn path(&self) -> Option<&Path> {
        Some(self.as_path())
    }
}

impl Source for &Entry {
    fn read(self) -> Result<String> {
        (&*self.path).read()
    }

    fn path(&self) -> Option<&Path> {
        Some(&*self.path)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use crate::io::Source;

    #[test]
    fn non_utf8_is_rejected_with_path_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("binary.html");
        fs::write(&path, [b'<', 0xff, 0xfe, b'>']).unwrap();

        let error = path.as_path().read().unwrap_err();
        let rendered = error.to_string();
        assert!(rendered.contains("failed to read file"));
        assert!(rendered.contains("not valid UTF-8"));
        assert!(rendered.contains("binary.html"));
    }

    #[test]
    fn missing_file_reports_open_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.html");
        let error = (&path).read().unwrap_err();
        assert_eq!(error.message(), "failed to open file for reading");
    }
}
