//! Codec service: encode descriptions, decode and verify buffers

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::codec::{Decoder, Encoder};
use crate::config::Settings;
use crate::domain::{TreeBuilder, WidgetTree};

/// Outcome of a successful round-trip check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    pub nodes: usize,
    pub depth: usize,
    pub bytes: usize,
}

/// Encodes and decodes with the configured format and limits.
#[derive(Debug, Clone)]
pub struct CodecService {
    settings: Settings,
}

impl CodecService {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn encoder(&self) -> Encoder {
        Encoder::new(self.settings.format)
    }

    pub fn decoder(&self) -> Decoder {
        Decoder::new(self.settings.format).with_max_nodes(self.settings.max_nodes)
    }

    pub fn encode(&self, tree: &WidgetTree) -> String {
        self.encoder().encode(tree)
    }

    /// Builds a tree from a TOML description and encodes it.
    #[instrument(level = "debug", skip(self, description))]
    pub fn encode_description(&self, description: &str) -> ApplicationResult<String> {
        let tree = TreeBuilder::from_toml(description)?.build()?;
        Ok(self.encode(&tree))
    }

    #[instrument(level = "debug", skip(self, buffer))]
    pub fn decode(&self, buffer: &str) -> ApplicationResult<WidgetTree> {
        Ok(self.decoder().decode(trim_buffer(buffer))?)
    }

    /// Decodes `buffer`, re-encodes the result and requires the exact same bytes.
    #[instrument(level = "debug", skip(self, buffer))]
    pub fn verify(&self, buffer: &str) -> ApplicationResult<VerifyReport> {
        let buffer = trim_buffer(buffer);
        let tree = self.decoder().decode(buffer)?;
        let reencoded = self.encode(&tree);
        if reencoded != buffer {
            let offset = reencoded
                .bytes()
                .zip(buffer.bytes())
                .position(|(a, b)| a != b)
                .unwrap_or_else(|| reencoded.len().min(buffer.len()));
            return Err(ApplicationError::RoundTripMismatch { offset });
        }
        debug!("verified {} nodes", tree.len());
        Ok(VerifyReport {
            nodes: tree.len(),
            depth: tree.depth(),
            bytes: buffer.len(),
        })
    }

    #[instrument(level = "debug", skip(self))]
    pub fn read_buffer(&self, path: &Path) -> ApplicationResult<String> {
        fs::read_to_string(path).with_path_context("read buffer", path)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn read_description(&self, path: &Path) -> ApplicationResult<String> {
        fs::read_to_string(path).with_path_context("read description", path)
    }

    /// Verifies several buffer files in parallel; results keep input order.
    #[instrument(level = "debug", skip(self))]
    pub fn verify_files(&self, paths: &[PathBuf]) -> Vec<(PathBuf, ApplicationResult<VerifyReport>)> {
        let results: Vec<_> = paths
            .par_iter()
            .map(|path| {
                let report = self
                    .read_buffer(path)
                    .and_then(|buffer| self.verify(&buffer));
                (path.clone(), report)
            })
            .collect();
        info!(
            "verified {} files, {} failed",
            results.len(),
            results.iter().filter(|(_, r)| r.is_err()).count()
        );
        results
    }
}

/// Line endings after the final terminator come from files, not the encoder.
fn trim_buffer(buffer: &str) -> &str {
    buffer.trim_end_matches(['\n', '\r'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Format;
    use crate::domain::demo_tree;

    fn service(format: Format) -> CodecService {
        CodecService::new(Settings {
            format,
            ..Settings::default()
        })
    }

    #[test]
    fn given_buffer_with_newline_when_verifying_then_ok() {
        let svc = service(Format::Positional);
        let buffer = format!("{}\n", svc.encode(&demo_tree()));
        let report = svc.verify(&buffer).unwrap();
        assert_eq!(report.nodes, 7);
        assert_eq!(report.depth, 3);
    }

    #[test]
    fn given_non_canonical_buffer_when_verifying_then_mismatch() {
        // Leading zero in the max length decodes fine but re-encodes as "7"
        let svc = service(Format::Positional);
        let err = svc.verify("00/w//20/07//").unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::RoundTripMismatch { offset: 9 }
        ));
    }

    #[test]
    fn given_invalid_description_when_encoding_then_domain_error() {
        let err = service(Format::Indexed)
            .encode_description("title = 1")
            .unwrap_err();
        assert!(matches!(err, ApplicationError::Domain(_)));
    }
}
