//! Output sinks for task data artifacts.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::debug;

use crate::error::CodecResult;

/// File name of the task data document written by [`DirectorySink`].
pub const TASKDATA_FILE_NAME: &str = "TASKDATA.XML";

/// Root element wrapping the fragments written by [`DirectorySink`].
pub const TASKDATA_ROOT: &str = "ISO11783_TaskData";

/// Destination for the XML fragments and binary grids of a document.
///
/// Writes for one prescription happen back to back and are never interleaved
/// with another prescription's writes.
pub trait TaskDataSink {
    /// Append an XML fragment to the task data document.
    fn write_xml(&mut self, xml: &str) -> CodecResult<()>;

    /// Store a binary artifact next to the document.
    ///
    /// # Arguments
    /// * `name` - File name including extension, e.g. `GRD00001.BIN`
    /// * `data` - Raw payload
    fn write_binary(&mut self, name: &str, data: &[u8]) -> CodecResult<()>;
}

impl<S: TaskDataSink + ?Sized> TaskDataSink for &mut S {
    fn write_xml(&mut self, xml: &str) -> CodecResult<()> {
        (**self).write_xml(xml)
    }

    fn write_binary(&mut self, name: &str, data: &[u8]) -> CodecResult<()> {
        (**self).write_binary(name, data)
    }
}

/// Keeps everything in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    xml: String,
    binaries: Vec<(String, Bytes)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All XML written so far, concatenated.
    pub fn xml(&self) -> &str {
        &self.xml
    }

    /// Binary artifact by file name.
    pub fn binary(&self, name: &str) -> Option<&Bytes> {
        self.binaries
            .iter()
            .find(|(stored, _)| stored == name)
            .map(|(_, data)| data)
    }

    /// Binary artifacts in write order.
    pub fn binaries(&self) -> impl Iterator<Item = (&str, &Bytes)> {
        self.binaries.iter().map(|(name, data)| (name.as_str(), data))
    }

    pub fn binary_count(&self) -> usize {
        self.binaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xml.is_empty() && self.binaries.is_empty()
    }
}

impl TaskDataSink for MemorySink {
    fn write_xml(&mut self, xml: &str) -> CodecResult<()> {
        self.xml.push_str(xml);
        Ok(())
    }

    fn write_binary(&mut self, name: &str, data: &[u8]) -> CodecResult<()> {
        self.binaries
            .push((name.to_string(), Bytes::copy_from_slice(data)));
        Ok(())
    }
}

/// Writes binaries straight into a directory and the XML document on
/// [`DirectorySink::finish`].
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    xml: String,
}

impl DirectorySink {
    /// Create the sink, creating `dir` if needed.
    pub fn create(dir: impl AsRef<Path>) -> CodecResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            xml: String::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `TASKDATA.XML` and return its path.
    pub fn finish(self) -> CodecResult<PathBuf> {
        let path = self.dir.join(TASKDATA_FILE_NAME);
        let document = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<{root} VersionMajor=\"4\" VersionMinor=\"0\" DataTransferOrigin=\"1\">{body}</{root}>\n",
            root = TASKDATA_ROOT,
            body = self.xml,
        );
        std::fs::write(&path, document)?;
        debug!(path = %path.display(), "Wrote task data document");
        Ok(path)
    }
}

impl TaskDataSink for DirectorySink {
    fn write_xml(&mut self, xml: &str) -> CodecResult<()> {
        self.xml.push_str(xml);
        Ok(())
    }

    fn write_binary(&mut self, name: &str, data: &[u8]) -> CodecResult<()> {
        let path = self.dir.join(name);
        std::fs::write(&path, data)?;
        debug!(path = %path.display(), bytes = data.len(), "Wrote binary grid");
        Ok(())
    }
}
