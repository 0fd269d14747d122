use std::{fs, io};
use std::path::{Path, PathBuf};
use std::fmt::Debug;

use crate::error::{Result, Chainable};
use crate::fstree::Entry;

/// Something that text can be written to, replacing what was there.
pub trait Sink: Debug {
    fn write(&self, text: &str) -> Result<()>;
}

impl Sink for fs::File {
    fn write(&self, text: &str) -> Result<()> {
        use io::Write;

        let mut file = io::BufWriter::new(self);
        file.write_all(text.as_bytes())?;
        Ok(file.flush()?)
    }
}

impl Sink for &Path {
    fn write(&self, text: &str) -> Result<()> {
        fs::File::create(self)
            .chain(error! {
                "failed to open/create file for writing",
                "file path" => self.display()
            })?
            .write(text)
            .chain_with(|| error! {
                "failed to write file",
                "file path" => self.display()
            })
    }
}

impl Sink for PathBuf {
    fn write(&self, text: &str) -> Result<()> {
        <&Path as Sink>::write(&self.as_path(), text)
    }
}

impl Sink for Entry {
    fn write(&self, text: &str) -> Result<()> {
        <&Path as Sink>::write(&&*self.path, text)
    }
}

impl<T: Sink> Sink for &T {
    fn write(&self, text: &str) -> Result<()> {
        <T as Sink>::write(self, text)
    }
}
