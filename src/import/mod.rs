use crate::models::Activity;
use anyhow::Result;
use std::path::Path;
use tracing::{info, warn};

pub mod csv;
pub mod json;

/// Trait for importing activity data from different file formats
pub trait ImportFormat {
    /// Check if this importer can handle the given file
    fn can_import(&self, file_path: &Path) -> bool;

    /// Import activity data from the file
    fn import_file(&self, file_path: &Path) -> Result<Vec<Activity>>;

    /// Get the format name for this importer
    fn get_format_name(&self) -> &'static str;
}

/// Manager for coordinating different import formats
pub struct ImportManager {
    importers: Vec<Box<dyn ImportFormat>>,
}

impl ImportManager {
    /// Create a new import manager with all available importers
    pub fn new() -> Self {
        let importers: Vec<Box<dyn ImportFormat>> = vec![
            Box::new(json::JsonImporter::new()),
            Box::new(csv::CsvImporter::new()),
        ];

        Self { importers }
    }

    /// Import a single file or every importable file in a directory
    pub fn import_path(&self, path: &Path) -> Result<Vec<Activity>> {
        if path.is_dir() {
            self.import_directory(path)
        } else {
            self.import_file(path)
        }
    }

    /// Import a single file, auto-detecting the format
    pub fn import_file(&self, file_path: &Path) -> Result<Vec<Activity>> {
        for importer in &self.importers {
            if importer.can_import(file_path) {
                info!(
                    file = %file_path.display(),
                    format = importer.get_format_name(),
                    "Importing activities"
                );
                return importer.import_file(file_path);
            }
        }

        anyhow::bail!("No importer found for file: {}", file_path.display());
    }

    /// Import all files from a directory
    pub fn import_directory(&self, dir_path: &Path) -> Result<Vec<Activity>> {
        let mut all_activities = Vec::new();

        let files = self.collect_importable_files(dir_path)?;
        if files.is_empty() {
            warn!(dir = %dir_path.display(), "No importable files found");
            return Ok(all_activities);
        }

        for file_path in files {
            match self.import_file(&file_path) {
                Ok(mut activities) => {
                    info!(
                        file = %file_path.display(),
                        count = activities.len(),
                        "Imported"
                    );
                    all_activities.append(&mut activities);
                }
                Err(e) => {
                    warn!(file = %file_path.display(), error = %e, "Import failed");
                }
            }
        }

        Ok(all_activities)
    }

    /// Collect all files that can be imported from a directory
    fn collect_importable_files(&self, dir_path: &Path) -> Result<Vec<std::path::PathBuf>> {
        let mut files = Vec::new();

        if !dir_path.is_dir() {
            anyhow::bail!("Path is not a directory: {}", dir_path.display());
        }

        for entry in std::fs::read_dir(dir_path)? {
            let entry = entry?;
            let path = entry.path();

            if path.is_file() && self.can_import_file(&path) {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }

    /// Check if any importer can handle a given file
    pub fn can_import_file(&self, file_path: &Path) -> bool {
        self.importers
            .iter()
            .any(|importer| importer.can_import(file_path))
    }
}

impl Default for ImportManager {
    fn default() -> Self {
        Self::new()
    }
}
