//! File-level reader.
//!
//! [`GgufFile`] pairs a decoded [`Container`] with the stream it came from
//! so tensor payloads can be read without re-decoding the header.

use crate::container::Container;
use crate::header::GGUF_MAGIC;
use crate::locator::TensorSection;
use ggufscope_core::{DecodeConfig, GgufError, Result};
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

/// Initial buffer capacity for [`GgufFile::read_tensor`]; the buffer grows
/// with the bytes actually read past this.
const PREALLOC_LIMIT: usize = 1 << 20;

/// A decoded GGUF file and its underlying stream.
///
/// # Example
///
/// ```rust,no_run
/// use ggufscope::GgufFile;
///
/// let mut file = GgufFile::open_path("model.gguf")?;
/// println!("{} tensors", file.container().tensor_count());
/// let bytes = file.read_tensor("token_embd.weight")?;
/// # Ok::<(), ggufscope::GgufError>(())
/// ```
#[derive(Debug)]
pub struct GgufFile<R> {
    source: R,
    container: Container,
}

impl GgufFile<BufReader<File>> {
    /// Open and decode a file on disk.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_path_with_config(path, &DecodeConfig::default())
    }

    pub fn open_path_with_config<P: AsRef<Path>>(path: P, config: &DecodeConfig) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Opening GGUF file");
        let file = File::open(path)?;
        Self::open_with_config(BufReader::new(file), config)
    }
}

impl<R: Read + Seek> GgufFile<R> {
    /// Decode the header of `source`, which is rewound to offset 0 first.
    pub fn open(source: R) -> Result<Self> {
        Self::open_with_config(source, &DecodeConfig::default())
    }

    pub fn open_with_config(mut source: R, config: &DecodeConfig) -> Result<Self> {
        source.seek(SeekFrom::Start(0))?;
        let container = Container::open_with_config(&mut source, config)?;
        Ok(Self { source, container })
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Bounded reader over the first tensor named `name`.
    pub fn tensor_section(&mut self, name: &str) -> Result<TensorSection<'_, R>> {
        let range = self.container.byte_range(name)?;
        TensorSection::new(&mut self.source, range)
    }

    /// Read the full payload of the first tensor named `name`.
    ///
    /// A stream that ends before the payload does is a
    /// [`GgufError::TruncatedRead`].
    pub fn read_tensor(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut section = self.tensor_section(name)?;
        let length = usize::try_from(section.len()).map_err(|_| {
            GgufError::InvalidFormat(format!("tensor {:?} is too large to buffer", name))
        })?;

        let mut data = Vec::with_capacity(length.min(PREALLOC_LIMIT));
        let read = section.read_to_end(&mut data)?;
        if read != length {
            return Err(GgufError::TruncatedRead(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("tensor {:?}: expected {} bytes, got {}", name, length, read),
            )));
        }
        Ok(data)
    }

    /// Copy the payload of the first tensor named `name` into `writer`,
    /// returning the number of bytes written.
    pub fn copy_tensor<W: io::Write>(&mut self, name: &str, writer: &mut W) -> Result<u64> {
        let mut section = self.tensor_section(name)?;
        let expected = section.len();
        let copied = io::copy(&mut section, writer)?;
        if copied != expected {
            return Err(GgufError::TruncatedRead(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("tensor {:?}: expected {} bytes, got {}", name, expected, copied),
            )));
        }
        Ok(copied)
    }

    /// Give back the underlying stream.
    pub fn into_inner(self) -> R {
        self.source
    }

    pub fn into_parts(self) -> (R, Container) {
        (self.source, self.container)
    }
}

/// Check whether a file starts with the GGUF magic.
pub fn is_gguf<P: AsRef<Path>>(path: P) -> bool {
    let Ok(mut file) = File::open(path.as_ref()) else {
        return false;
    };
    let mut magic = [0u8; 4];
    file.read_exact(&mut magic).is_ok() && magic == GGUF_MAGIC
}
