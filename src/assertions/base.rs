use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr};
use log::info;
use tempfile::TempDir;

use super::error::{AssertionFailure, path_field, render_template};
use crate::cfg::env::{is_debug_mode, seed_from_env};
use crate::executor::command::CommandResult;

/// Per-test state shared by every grading case
///
/// Holds the debug switch, the random seed and, when requested, a scratch
/// directory. In debug mode the scratch directory survives the case so it
/// can be inspected afterwards.
#[derive(Debug)]
pub struct BaseCase {
    debug: bool,
    seed: u64,
    temporary_dir: Option<TempDir>,
}

impl BaseCase {
    pub fn new() -> Self {
        Self {
            debug: is_debug_mode(),
            seed: seed_from_env(),
            temporary_dir: None,
        }
    }

    /// Case with a scratch directory under the current directory
    pub fn with_temporary_dir() -> Result<Self> {
        Self::with_temporary_dir_in(".")
    }

    pub fn with_temporary_dir_in(parent: impl AsRef<Path>) -> Result<Self> {
        let parent = parent.as_ref();
        let temporary_dir = TempDir::new_in(parent)
            .wrap_err_with(|| format!("Failed to create temporary directory in {}", parent.display()))?;

        Ok(Self {
            debug: is_debug_mode(),
            seed: seed_from_env(),
            temporary_dir: Some(temporary_dir),
        })
    }

    pub fn is_debug_mode(&self) -> bool {
        self.debug
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn temporary_dir_path(&self) -> Option<&Path> {
        self.temporary_dir.as_ref().map(TempDir::path)
    }

    pub fn assert_file_exists(&self, path: impl AsRef<Path>) -> Result<(), AssertionFailure> {
        let path = path.as_ref();
        if path.exists() {
            return Ok(());
        }
        Err(AssertionFailure::MissingFile {
            path: path.to_path_buf(),
        })
    }

    /// Like [`BaseCase::assert_file_exists`], rendering `{path}` into `template`
    pub fn assert_file_exists_with(&self, path: impl AsRef<Path>, template: &str) -> Result<(), AssertionFailure> {
        let path = path.as_ref();
        self.assert_file_exists(path)
            .map_err(|_| AssertionFailure::Custom(render_template(template, &[("path", &path_field(path))])))
    }

    /// Every path must exist and be a regular file
    pub fn assert_all_files_exist<P: AsRef<Path>>(&self, paths: &[P]) -> Result<(), AssertionFailure> {
        let mut missing = Vec::new();
        for path in paths {
            let path = path.as_ref();
            if !path.exists() {
                missing.push(path.to_path_buf());
            } else if !path.is_file() {
                return Err(AssertionFailure::NotAFile {
                    path: path.to_path_buf(),
                });
            }
        }

        if missing.is_empty() {
            return Ok(());
        }
        Err(AssertionFailure::MissingFiles {
            expected: paths.iter().map(|p| p.as_ref().to_path_buf()).collect(),
            missing,
        })
    }

    pub fn assert_command_successful(&self, result: &CommandResult) -> Result<(), AssertionFailure> {
        if result.success {
            return Ok(());
        }
        Err(AssertionFailure::CommandFailed { result: result.clone() })
    }

    /// Renders `{command}` and `{output}` into `template` on failure
    pub fn assert_command_successful_with(&self, result: &CommandResult, template: &str) -> Result<(), AssertionFailure> {
        self.assert_command_successful(result).map_err(|_| {
            AssertionFailure::Custom(render_template(
                template,
                &[("command", &result.command), ("output", &result.output)],
            ))
        })
    }

    pub fn assert_command_output_equal(&self, result: &CommandResult, expected_output: &str) -> Result<(), AssertionFailure> {
        if result.output == expected_output {
            return Ok(());
        }
        Err(AssertionFailure::UnexpectedOutput {
            result: result.clone(),
            expected_output: expected_output.to_string(),
        })
    }

    /// Renders `{expected_output}`, `{command}` and `{output}` into `template` on failure
    pub fn assert_command_output_equal_with(
        &self,
        result: &CommandResult,
        expected_output: &str,
        template: &str,
    ) -> Result<(), AssertionFailure> {
        self.assert_command_output_equal(result, expected_output).map_err(|_| {
            AssertionFailure::Custom(render_template(
                template,
                &[
                    ("expected_output", expected_output),
                    ("command", &result.command),
                    ("output", &result.output),
                ],
            ))
        })
    }

    pub(crate) fn scratch_or(&self, fallback: &Path) -> PathBuf {
        self.temporary_dir_path().unwrap_or(fallback).to_path_buf()
    }
}

impl Default for BaseCase {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BaseCase {
    fn drop(&mut self) {
        if self.debug
            && let Some(dir) = self.temporary_dir.take()
        {
            let kept = dir.keep();
            info!("Keeping temporary directory {}", kept.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn case_in(dir: &TempDir) -> BaseCase {
        let mut case = BaseCase::with_temporary_dir_in(dir.path()).unwrap();
        case.debug = false;
        case
    }

    fn result(success: bool, output: &str) -> CommandResult {
        CommandResult {
            success,
            command: "make -f answer.mk all".to_string(),
            output: output.to_string(),
        }
    }

    #[test]
    fn test_temporary_dir_is_created_and_removed() {
        let parent = TempDir::new().unwrap();
        let case = case_in(&parent);
        let path = case.temporary_dir_path().unwrap().to_path_buf();

        assert!(path.is_dir());
        assert!(path.starts_with(parent.path()));
        drop(case);
        assert!(!path.exists());
    }

    #[test]
    fn test_no_temporary_dir_by_default() {
        assert!(BaseCase::new().temporary_dir_path().is_none());
    }

    #[test]
    fn test_assert_file_exists() {
        let parent = TempDir::new().unwrap();
        let case = case_in(&parent);
        let file = parent.path().join("main.cpp");

        assert_eq!(
            case.assert_file_exists(&file),
            Err(AssertionFailure::MissingFile { path: file.clone() })
        );
        fs::write(&file, "int main() {}").unwrap();
        assert!(case.assert_file_exists(&file).is_ok());
    }

    #[test]
    fn test_assert_file_exists_with_template() {
        let case = BaseCase::new();
        let failure = case.assert_file_exists_with("nowhere.txt", "Create {path} first").unwrap_err();
        assert_eq!(failure.to_string(), "Create nowhere.txt first");
    }

    #[test]
    fn test_assert_all_files_exist() {
        let parent = TempDir::new().unwrap();
        let case = case_in(&parent);
        let a = parent.path().join("a.txt");
        let b = parent.path().join("b.txt");
        fs::write(&a, "").unwrap();

        match case.assert_all_files_exist(&[&a, &b]) {
            Err(AssertionFailure::MissingFiles { missing, .. }) => assert_eq!(missing, vec![b.clone()]),
            other => panic!("unexpected {other:?}"),
        }

        fs::write(&b, "").unwrap();
        assert!(case.assert_all_files_exist(&[&a, &b]).is_ok());
    }

    #[test]
    fn test_assert_all_files_exist_rejects_directories() {
        let parent = TempDir::new().unwrap();
        let case = case_in(&parent);

        assert!(matches!(
            case.assert_all_files_exist(&[parent.path()]),
            Err(AssertionFailure::NotAFile { .. })
        ));
    }

    #[test]
    fn test_assert_command_successful() {
        let case = BaseCase::new();

        assert!(case.assert_command_successful(&result(true, "")).is_ok());
        let failure = case.assert_command_successful(&result(false, "No rule to make target")).unwrap_err();
        assert!(failure.to_string().contains("'make -f answer.mk all'"));
        assert!(failure.to_string().ends_with("No rule to make target"));
    }

    #[test]
    fn test_assert_command_output_equal() {
        let case = BaseCase::new();

        assert!(case.assert_command_output_equal(&result(true, "hi\n"), "hi\n").is_ok());
        let failure = case
            .assert_command_output_equal_with(&result(true, "bye\n"), "hi\n", "{command}: wanted {expected_output}")
            .unwrap_err();
        assert_eq!(failure.to_string(), "make -f answer.mk all: wanted hi\n");
    }
}
