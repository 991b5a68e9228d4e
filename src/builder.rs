use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use log::info;

use crate::{
    errors::{ConvertError, ConvertResult},
    parsers::prelude::*,
    qif::QifWriter,
    types::{Conversion, ConvertOptions, DatePolicy},
};

/// Configures and runs an OFX to QIF conversion.
///
/// Parsing always runs to completion before any output is written, so a
/// malformed document never leaves a half-written QIF file behind.
#[derive(Default)]
pub struct ConverterBuilder {
    content: Option<String>,
    filepath: Option<String>,
    options: ConvertOptions,
}

impl ConverterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, content: &str) -> Self {
        self.content = Some(content.to_string());
        self
    }

    /// Input path. Read only when no content was given, but always used for
    /// format detection. The file's bytes are decoded with the charset its
    /// OFX header declares.
    pub fn filename(mut self, filename: &str) -> Self {
        self.filepath = Some(filename.to_string());
        self
    }

    pub fn options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }

    pub fn date_policy(mut self, policy: DatePolicy) -> Self {
        self.options.date_policy = policy;
        self
    }

    pub fn transaction_aggregate(mut self, name: &str) -> Self {
        self.options.transaction_aggregate = name.to_string();
        self
    }

    /// Runs the parse pass only.
    pub fn parse(self) -> ConvertResult<Conversion> {
        let content = self.content.map(Ok).unwrap_or_else(|| {
            self.filepath
                .as_deref()
                .ok_or(ConvertError::MissingContentAndFilepath)
                .and_then(|path| fs::read(path).map_err(Into::into))
                .map(|bytes| decode_content(&bytes).into_owned())
        })?;

        if !OfxReader::is_supported(self.filepath.as_deref(), &content) {
            return Err(ConvertError::UnsupportedFormat);
        }
        if let Some(dialect) = Dialect::detect(&content) {
            info!("Reading {dialect:?} OFX document");
        }

        let mut tracker = AggregateTracker::new(self.options);
        OfxReader::parse(&content, &mut tracker)?;
        tracker.finish()
    }

    /// Parses, then writes the QIF statement into `sink`.
    pub fn convert_to<W: Write>(self, sink: W) -> ConvertResult<Conversion> {
        let conversion = self.parse()?;
        QifWriter::new(sink).write_statement(&conversion.transactions)?;
        Ok(conversion)
    }

    /// Parses, then creates `output` and writes the QIF statement to it.
    pub fn convert_file(self, output: impl AsRef<Path>) -> ConvertResult<Conversion> {
        let conversion = self.parse()?;

        let output = output.as_ref();
        let file = File::create(output)?;
        QifWriter::new(BufWriter::new(file)).write_statement(&conversion.transactions)?;
        info!(
            "Wrote {} transaction(s) to {}",
            conversion.transactions.len(),
            output.display()
        );
        Ok(conversion)
    }
}
