use crate::error::Error;
use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Parser turning Rust source files into `syn` syntax trees.
///
/// # Example
///
/// ```no_run
/// use openapi_synth::parser::AstParser;
/// use std::path::Path;
///
/// let parsed = AstParser::parse_file(Path::new("src/users/controller.rs")).unwrap();
/// println!("Parsed {} items", parsed.syntax_tree.items.len());
/// ```
pub struct AstParser;

/// A successfully parsed Rust file with its abstract syntax tree.
#[derive(Debug)]
pub struct ParsedFile {
    /// Path to the source file
    pub path: PathBuf,
    /// The parsed abstract syntax tree
    pub syntax_tree: syn::File,
}

impl AstParser {
    /// Parses a single Rust source file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the Rust source file
    ///
    /// # Returns
    ///
    /// A `ParsedFile` holding the path and its syntax tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid Rust syntax.
    pub fn parse_file(path: &Path) -> Result<ParsedFile> {
        debug!("Parsing file: {}", path.display());

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        Self::parse_source(path, &content)
            .with_context(|| format!("Failed to parse Rust syntax in file: {}", path.display()))
    }

    /// Parses source text that is already in memory, attributing it to `path`.
    ///
    /// # Arguments
    ///
    /// * `path` - The file the text came from, recorded in the result and in errors
    /// * `content` - Rust source text
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] naming `path` and carrying the `syn` message.
    pub fn parse_source(path: &Path, content: &str) -> crate::error::Result<ParsedFile> {
        let syntax_tree = syn::parse_file(content).map_err(|e| Error::ParseError {
            file: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Ok(ParsedFile {
            path: path.to_path_buf(),
            syntax_tree,
        })
    }

    /// Parses multiple files, continuing past failures.
    ///
    /// # Arguments
    ///
    /// * `paths` - Paths of the files to parse
    ///
    /// # Returns
    ///
    /// One result per input path, in input order. Failures are logged as
    /// warnings as they occur.
    pub fn parse_files(paths: &[PathBuf]) -> Vec<Result<ParsedFile>> {
        debug!("Parsing {} files", paths.len());

        let results: Vec<Result<ParsedFile>> = paths
            .iter()
            .map(|path| {
                Self::parse_file(path).inspect_err(|e| {
                    warn!("Failed to parse {}: {:#}", path.display(), e);
                })
            })
            .collect();

        let success_count = results.iter().filter(|r| r.is_ok()).count();
        debug!(
            "Parsing complete: {} succeeded, {} failed",
            success_count,
            results.len() - success_count
        );

        results
    }

    /// Parses multiple files and keeps only the ones that parsed.
    ///
    /// The relative order of the surviving files is preserved.
    pub fn parse_all(paths: &[PathBuf]) -> Vec<ParsedFile> {
        Self::parse_files(paths)
            .into_iter()
            .filter_map(Result::ok)
            .collect()
    }
}
