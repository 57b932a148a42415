//! Stream provider backed by the in-memory repository.

use std::io::{self, Cursor, Write};
use std::sync::Arc;

use crate::core::{BoxError, InputStream, OutputStream, StreamProvider};
use crate::infra::repository::InMemoryRepository;

/// Provider that reads input from a byte buffer and writes output into an
/// [`InMemoryRepository`] file at the current output path.
///
/// Opening the output stream creates the file empty, so a run that writes
/// nothing leaves a zero-byte artifact behind.
#[derive(Debug)]
pub struct InMemoryStreamProvider {
    repository: Arc<InMemoryRepository>,
    input: Vec<u8>,
    output_path: String,
    input_error: Option<String>,
    output_error: Option<String>,
}

impl InMemoryStreamProvider {
    /// Provider writing to `output_path` in `repository`.
    pub fn new(repository: Arc<InMemoryRepository>, output_path: impl Into<String>) -> Self {
        Self {
            repository,
            input: Vec::new(),
            output_path: output_path.into(),
            input_error: None,
            output_error: None,
        }
    }

    /// Bytes served by the input stream.
    #[must_use]
    pub fn with_input(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.input = input.into();
        self
    }

    /// Make input-stream acquisition fail with `message`.
    #[must_use]
    pub fn with_input_error(mut self, message: impl Into<String>) -> Self {
        self.input_error = Some(message.into());
        self
    }

    /// Make output-stream acquisition fail with `message`.
    #[must_use]
    pub fn with_output_error(mut self, message: impl Into<String>) -> Self {
        self.output_error = Some(message.into());
        self
    }
}

impl StreamProvider for InMemoryStreamProvider {
    fn input_stream(&mut self) -> Result<InputStream, BoxError> {
        if let Some(message) = &self.input_error {
            return Err(message.clone().into());
        }
        Ok(Box::new(Cursor::new(self.input.clone())))
    }

    fn output_stream(&mut self) -> Result<OutputStream, BoxError> {
        if let Some(message) = &self.output_error {
            return Err(message.clone().into());
        }
        self.repository.put_file(&self.output_path, &[]);
        Ok(Box::new(RepositoryWriter {
            repository: Arc::clone(&self.repository),
            path: self.output_path.clone(),
        }))
    }

    fn output_path(&self) -> Result<String, BoxError> {
        Ok(self.output_path.clone())
    }

    fn set_output_path(&mut self, path: String) {
        self.output_path = path;
    }
}

/// Writer appending to a file in an [`InMemoryRepository`].
#[derive(Debug)]
pub struct RepositoryWriter {
    repository: Arc<InMemoryRepository>,
    path: String,
}

impl Write for RepositoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.repository.append(&self.path, buf) {
            Ok(buf.len())
        } else {
            Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("output file `{}` no longer exists", self.path),
            ))
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
