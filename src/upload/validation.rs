use crate::upload::error::{InvalidReason, UploadError};
use crate::upload::types::FileDescriptor;
use crate::utils::file_size::MIB;

pub const DEFAULT_EXTENSIONS: [&str; 4] = ["pdf", "docx", "txt", "md"];
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * MIB;

/// Which files may enter an upload run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRules {
    accepted_extensions: Vec<String>,
    max_file_size: u64,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self::new(
            DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()),
            DEFAULT_MAX_FILE_SIZE,
        )
    }
}

impl ValidationRules {
    pub fn new(extensions: impl IntoIterator<Item = String>, max_file_size: u64) -> Self {
        Self {
            accepted_extensions: extensions
                .into_iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            max_file_size,
        }
    }

    pub fn accepted_extensions(&self) -> &[String] {
        &self.accepted_extensions
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    pub fn accepts_extension(&self, extension: &str) -> bool {
        let extension = extension.to_lowercase();
        self.accepted_extensions.iter().any(|ext| *ext == extension)
    }

    pub fn check(&self, file: &FileDescriptor) -> Result<(), InvalidReason> {
        if !self.accepts_extension(&file.extension) {
            return Err(InvalidReason::UnsupportedType(file.extension.clone()));
        }
        if file.size > self.max_file_size {
            return Err(InvalidReason::TooLarge {
                size: file.size,
                limit: self.max_file_size,
            });
        }
        Ok(())
    }

    /// Checks the whole batch; the first offending file in batch order is reported.
    pub fn check_batch(&self, files: &[FileDescriptor]) -> Result<(), UploadError> {
        if files.is_empty() {
            return Err(UploadError::EmptySelection);
        }
        for file in files {
            self.check(file).map_err(|reason| UploadError::InvalidFile {
                file: file.name.clone(),
                reason,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::types::FileSource;
    use std::path::PathBuf;

    fn file(name: &str, size: u64) -> FileDescriptor {
        FileDescriptor::new(name, size, FileSource::Path(PathBuf::from(name)))
    }

    #[test]
    fn accepts_supported_types_case_insensitively() {
        let rules = ValidationRules::default();
        for name in ["a.pdf", "b.DOCX", "c.Txt", "d.md"] {
            assert!(rules.check(&file(name, 10)).is_ok(), "{name} should pass");
        }
    }

    #[test]
    fn rejects_unsupported_type() {
        let rules = ValidationRules::default();
        assert_eq!(
            rules.check(&file("setup.exe", 10)),
            Err(InvalidReason::UnsupportedType("exe".to_string()))
        );
    }

    #[test]
    fn size_limit_is_inclusive() {
        let rules = ValidationRules::default();
        assert!(rules.check(&file("big.pdf", DEFAULT_MAX_FILE_SIZE)).is_ok());
        assert_eq!(
            rules.check(&file("big.pdf", DEFAULT_MAX_FILE_SIZE + 1)),
            Err(InvalidReason::TooLarge {
                size: DEFAULT_MAX_FILE_SIZE + 1,
                limit: DEFAULT_MAX_FILE_SIZE
            })
        );
    }

    #[test]
    fn batch_reports_first_invalid_file() {
        let rules = ValidationRules::default();
        let files = vec![
            file("ok.pdf", 1),
            file("bad.exe", 1),
            file("huge.txt", DEFAULT_MAX_FILE_SIZE * 2),
        ];
        match rules.check_batch(&files) {
            Err(UploadError::InvalidFile { file, .. }) => assert_eq!(file, "bad.exe"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn empty_batch_is_rejected() {
        assert_eq!(
            ValidationRules::default().check_batch(&[]),
            Err(UploadError::EmptySelection)
        );
    }

    #[test]
    fn configured_extensions_are_normalized() {
        let rules = ValidationRules::new(vec![".PDF".to_string()], 5);
        assert!(rules.accepts_extension("pdf"));
        assert!(!rules.accepts_extension("md"));
    }
}
