use std::path::Path;

use crate::core::error::{MutationError, Result};

/// Suffix the annotation tool gives its per-sample exonic output
pub const DEFAULT_ANNOTATION_SUFFIX: &str = "exonic_variant_function";

/// Derives a sample identifier from an annotation file path
pub trait SampleNaming: Sync {
    fn sample_id(&self, path: &Path) -> Result<String>;
}

/// Takes one dot-delimited field of the file name as the sample identifier.
///
/// The default matches `<prefix>.<sample_id>.<anything>.exonic_variant_function`.
#[derive(Debug, Clone)]
pub struct DottedField {
    field: usize,
    min_fields: usize,
    suffix: Option<String>,
}

impl Default for DottedField {
    fn default() -> Self {
        Self {
            field: 1,
            min_fields: 4,
            suffix: Some(DEFAULT_ANNOTATION_SUFFIX.to_string()),
        }
    }
}

impl DottedField {
    pub fn new(field: usize, min_fields: usize, suffix: Option<String>) -> Self {
        Self {
            field,
            min_fields: min_fields.max(field + 1),
            suffix,
        }
    }

    /// Same convention with a different required suffix
    pub fn with_suffix(suffix: impl Into<String>) -> Self {
        Self {
            suffix: Some(suffix.into()),
            ..Self::default()
        }
    }

    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }
}

impl SampleNaming for DottedField {
    fn sample_id(&self, path: &Path) -> Result<String> {
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .ok_or_else(|| MutationError::InvalidSampleFileName {
                file_name: path.display().to_string(),
                reason: "path has no UTF-8 file name".to_string(),
            })?;

        let invalid = |reason: String| MutationError::InvalidSampleFileName {
            file_name: file_name.to_string(),
            reason,
        };

        if let Some(suffix) = self.suffix.as_deref() {
            if !file_name.ends_with(suffix) {
                return Err(invalid(format!("expected suffix '{}'", suffix)));
            }
        }

        let fields: Vec<&str> = file_name.split('.').collect();
        if fields.len() < self.min_fields {
            return Err(invalid(format!(
                "expected at least {} dot-separated fields, found {}",
                self.min_fields,
                fields.len()
            )));
        }

        let sample = fields[self.field].trim();
        if sample.is_empty() {
            return Err(invalid(format!("field {} is empty", self.field + 1)));
        }

        Ok(sample.to_string())
    }
}

impl<F> SampleNaming for F
where
    F: Fn(&Path) -> Result<String> + Sync,
{
    fn sample_id(&self, path: &Path) -> Result<String> {
        self(path)
    }
}
