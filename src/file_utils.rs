use anyhow::{Context, Result, anyhow};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::formats::ResourceFormat;

// @module: File and directory utilities

// @pattern: JSON file name already carrying a language code, with optional culture subtags (app.pt-BR.json)
static JSON_LANGUAGE_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<base>.+)\.[a-z]{2}(?:[-_][A-Za-z0-9]{2,8})*\.json$").expect("Invalid JSON language suffix regex")
});

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// Recursively find .resx and .json files, sorted for a stable run order
    pub fn find_resource_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() && ResourceFormat::from_path(path).is_some() {
                result.push(path.to_path_buf());
            }
        }

        result.sort();
        Ok(result)
    }

    /// Copy a file from one location to another, ensuring the target directory exists.
    ///
    /// Copying a file onto itself is a no-op.
    pub fn copy_file<P1: AsRef<Path>, P2: AsRef<Path>>(from: P1, to: P2) -> Result<()> {
        let from = from.as_ref();
        let to = to.as_ref();

        if !from.exists() {
            return Err(anyhow!("Source file does not exist: {:?}", from));
        }
        if from == to {
            return Ok(());
        }

        if let Some(parent) = to.parent() {
            Self::ensure_dir(parent)?;
        }

        fs::copy(from, to).with_context(|| format!("Failed to copy {:?} to {:?}", from, to))?;
        Ok(())
    }

    // @generates: Translated file name for a source file
    // @rules: .resx -> <stem>.<lang>.resx; .json -> replace a trailing .xx or .xx-YY code or insert .<lang>
    pub fn output_file_name<P: AsRef<Path>>(source: P, target_language: &str) -> Result<String> {
        let source = source.as_ref();
        let file_name = source
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("Invalid file name: {:?}", source))?;
        let format = ResourceFormat::from_path(source)
            .ok_or_else(|| anyhow!("Unsupported resource file: {:?}", source))?;

        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = source
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();

        let name = match format {
            ResourceFormat::Resx => format!("{}.{}.{}", stem, target_language, extension),
            ResourceFormat::Json => match JSON_LANGUAGE_SUFFIX.captures(file_name) {
                Some(captures) => format!("{}.{}.json", &captures["base"], target_language),
                None => format!("{}.{}.{}", stem, target_language, extension),
            },
        };
        Ok(name)
    }

    // @generates: Sibling output path for a single input file
    pub fn output_path_for<P: AsRef<Path>>(source: P, target_language: &str) -> Result<PathBuf> {
        let source = source.as_ref();
        let name = Self::output_file_name(source, target_language)?;
        Ok(source.with_file_name(name))
    }

    // @generates: <dir>_<lang> next to the input directory
    pub fn output_dir_for<P: AsRef<Path>>(input_dir: P, target_language: &str) -> Result<PathBuf> {
        let input_dir = input_dir.as_ref();
        // "." and "dir/.." have no usable file name until resolved
        let resolved = match input_dir.file_name() {
            Some(_) => input_dir.to_path_buf(),
            None => input_dir
                .canonicalize()
                .with_context(|| format!("Failed to resolve directory: {:?}", input_dir))?,
        };
        let name = resolved
            .file_name()
            .ok_or_else(|| anyhow!("Cannot derive an output directory from {:?}", input_dir))?;

        let mut output_name = name.to_os_string();
        output_name.push(format!("_{}", target_language));
        Ok(resolved.with_file_name(output_name))
    }

    // @generates: Output path mirroring the source's place under the input root
    pub fn mirrored_output_path<P1: AsRef<Path>, P2: AsRef<Path>, P3: AsRef<Path>>(
        source: P1,
        input_root: P2,
        output_root: P3,
        target_language: &str,
    ) -> Result<PathBuf> {
        let source = source.as_ref();
        let relative = source
            .strip_prefix(input_root.as_ref())
            .with_context(|| format!("{:?} is not under {:?}", source, input_root.as_ref()))?;
        let name = Self::output_file_name(source, target_language)?;

        let mut output = output_root.as_ref().to_path_buf();
        if let Some(parent) = relative.parent() {
            output.push(parent);
        }
        output.push(name);
        Ok(output)
    }
}
