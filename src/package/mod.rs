//! Document package (ZIP container) handling.
//!
//! Selected XML parts are read, cleaned with [`accept_revisions`] and written
//! back; every other entry is copied raw so it stays byte-identical. A package
//! is only rewritten once every selected part has been cleaned.
//!
//! # Example
//!
//! ```no_run
//! use untrack::package::{accept_package, PackageOptions};
//!
//! let bytes = std::fs::read("contract.docx")?;
//! let result = accept_package(&bytes, &PackageOptions::new().discover_parts())?;
//! std::fs::write("contract.clean.docx", &result.bytes)?;
//! # Ok::<(), untrack::Error>(())
//! ```

mod options;

pub use options::{
    is_content_part, MissingPartPolicy, PackageOptions, PartSelection, MAIN_DOCUMENT_PART,
};

use crate::accept::{accept_revisions, AcceptOptions, RevisionWarning};
use crate::detect::is_package_bytes;
use crate::error::{Error, Result};
use crate::model::Revisions;
use crate::parser::extract_revisions;
use rayon::prelude::*;
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Outcome for one selected part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartStatus {
    /// Part was rewritten
    Cleaned,
    /// Part was not in the package and was skipped
    Missing,
}

/// Report for one selected part.
#[derive(Debug, Clone)]
pub struct PartReport {
    /// Part name inside the package
    pub name: String,
    /// What happened to it
    pub status: PartStatus,
    /// Revision warnings, if requested
    pub warnings: Vec<RevisionWarning>,
}

/// Result of cleaning a package.
#[derive(Debug, Clone)]
pub struct PackageResult {
    /// The rewritten package
    pub bytes: Vec<u8>,
    /// One report per selected part
    pub parts: Vec<PartReport>,
}

impl PackageResult {
    /// Number of parts that were rewritten.
    pub fn cleaned_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|p| p.status == PartStatus::Cleaned)
            .count()
    }

    /// All warnings across parts, as `(part, warning)` pairs.
    pub fn warnings(&self) -> impl Iterator<Item = (&str, &RevisionWarning)> {
        self.parts
            .iter()
            .flat_map(|p| p.warnings.iter().map(move |w| (p.name.as_str(), w)))
    }
}

/// Accept every tracked change in the selected parts of a package.
pub fn accept_package(bytes: &[u8], options: &PackageOptions) -> Result<PackageResult> {
    let mut archive = open_archive(bytes)?;
    let available: Vec<String> = archive.file_names().map(str::to_string).collect();
    let targets = options
        .parts
        .resolve(available.iter().map(String::as_str));

    let mut inputs: Vec<(String, Vec<u8>)> = Vec::with_capacity(targets.len());
    let mut reports: Vec<PartReport> = Vec::new();
    for name in targets {
        match read_entry(&mut archive, &name)? {
            Some(data) => inputs.push((name, data)),
            None => {
                missing_part(&name, options.missing_parts)?;
                reports.push(PartReport {
                    name,
                    status: PartStatus::Missing,
                    warnings: Vec::new(),
                });
            }
        }
    }

    let accept_options = AcceptOptions::new().with_warnings(options.collect_warnings);
    let clean = |(name, data): &(String, Vec<u8>)| -> Result<(String, Vec<u8>, Vec<RevisionWarning>)> {
        log::debug!("accepting revisions in {}", name);
        let result = accept_revisions(data, &accept_options)?;
        Ok((name.clone(), result.xml, result.warnings))
    };
    let cleaned: Vec<(String, Vec<u8>, Vec<RevisionWarning>)> = if options.parallel {
        inputs.par_iter().map(clean).collect::<Result<_>>()?
    } else {
        inputs.iter().map(clean).collect::<Result<_>>()?
    };

    if cleaned.is_empty() {
        log::debug!("no selected part present, package left unchanged");
        return Ok(PackageResult {
            bytes: bytes.to_vec(),
            parts: reports,
        });
    }

    let mut replacements: HashMap<String, Vec<u8>> = HashMap::with_capacity(cleaned.len());
    for (name, xml, warnings) in cleaned {
        for warning in &warnings {
            log::warn!(
                "{}: {} {} element(s) remain in revision history",
                name,
                warning.count,
                warning.element
            );
        }
        reports.push(PartReport {
            name: name.clone(),
            status: PartStatus::Cleaned,
            warnings,
        });
        replacements.insert(name, xml);
    }

    let bytes = rewrite(&mut archive, &replacements, bytes.len())?;
    Ok(PackageResult {
        bytes,
        parts: reports,
    })
}

/// Extract revision records from the selected parts of a package.
///
/// Missing parts contribute nothing; a present but malformed part is an error.
pub fn extract_package_revisions(bytes: &[u8], parts: &PartSelection) -> Result<Revisions> {
    let mut archive = open_archive(bytes)?;
    let available: Vec<String> = archive.file_names().map(str::to_string).collect();

    let mut revisions = Revisions::new();
    for name in parts.resolve(available.iter().map(String::as_str)) {
        match read_entry(&mut archive, &name)? {
            Some(data) => revisions.extend(extract_revisions(&data)?),
            None => log::debug!("part {} not in package, no revisions", name),
        }
    }
    Ok(revisions)
}

/// Read one part, `None` if the package does not contain it.
pub fn read_part(bytes: &[u8], name: &str) -> Result<Option<Vec<u8>>> {
    let mut archive = open_archive(bytes)?;
    read_entry(&mut archive, name)
}

/// Names of all entries in a package, in archive order.
pub fn list_parts(bytes: &[u8]) -> Result<Vec<String>> {
    let archive = open_archive(bytes)?;
    Ok(archive.file_names().map(str::to_string).collect())
}

fn open_archive(bytes: &[u8]) -> Result<ZipArchive<Cursor<&[u8]>>> {
    if !is_package_bytes(bytes) {
        return Err(Error::UnsupportedInput(
            "input is not a ZIP document package".to_string(),
        ));
    }
    ZipArchive::new(Cursor::new(bytes)).map_err(|err| match err {
        ZipError::InvalidArchive(reason) => {
            Error::UnsupportedInput(format!("invalid document package: {}", reason))
        }
        other => Error::Zip(other),
    })
}

fn read_entry<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<Vec<u8>>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let mut data = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut data)?;
    Ok(Some(data))
}

fn missing_part(name: &str, policy: MissingPartPolicy) -> Result<()> {
    match policy {
        MissingPartPolicy::Skip => {
            log::debug!("part {} not in package, skipping", name);
            Ok(())
        }
        MissingPartPolicy::Fail => Err(Error::MissingPart(name.to_string())),
    }
}

/// Write a new archive with `replacements` substituted, copying the rest raw.
fn rewrite<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    replacements: &HashMap<String, Vec<u8>>,
    size_hint: usize,
) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(size_hint)));

    for index in 0..archive.len() {
        let file = archive.by_index_raw(index)?;
        match replacements.get(file.name()) {
            Some(data) => {
                let method = match file.compression() {
                    CompressionMethod::Stored => CompressionMethod::Stored,
                    _ => CompressionMethod::Deflated,
                };
                let name = file.name().to_string();
                drop(file);
                writer.start_file(name, SimpleFileOptions::default().compression_method(method))?;
                writer.write_all(data)?;
            }
            None => writer.raw_copy_file(file)?,
        }
    }

    Ok(writer.finish()?.into_inner())
}
