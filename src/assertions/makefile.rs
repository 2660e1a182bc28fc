use std::ops::Deref;
use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr};
use log::debug;

use super::base::BaseCase;
use super::error::{AssertionFailure, render_template};
use crate::makefile::invoke::DEFAULT_MAKEFILE_NAME;
use crate::makefile::{Makefile, Rule, Targets};

/// Grading case built around a student's Makefile
#[derive(Debug)]
pub struct MakefileCase {
    base: BaseCase,
    makefile_path: PathBuf,
    makefile: Makefile,
}

impl MakefileCase {
    /// Parse the Makefile at `path`
    ///
    /// A missing file is reported as [`AssertionFailure::MissingMakefile`] so
    /// the student sees which file is expected.
    pub fn load(base: BaseCase, path: impl Into<PathBuf>) -> Result<Self> {
        let makefile_path = path.into();
        if !makefile_path.exists() {
            return Err(AssertionFailure::MissingMakefile { path: makefile_path }.into());
        }

        let makefile = Makefile::from_path(&makefile_path)?;
        debug!("Loaded {} rules from {}", makefile.rules().len(), makefile_path.display());

        Ok(Self {
            base,
            makefile_path,
            makefile,
        })
    }

    pub fn makefile(&self) -> &Makefile {
        &self.makefile
    }

    pub fn makefile_path(&self) -> &Path {
        &self.makefile_path
    }

    /// The Makefile must declare exactly `target`
    pub fn assert_has_rule_for_target(&self, target: impl Into<Targets>) -> Result<&Rule, AssertionFailure> {
        let target = target.into();
        match self.makefile.get_rule(target.clone()) {
            Some(rule) => Ok(rule),
            None => Err(AssertionFailure::MissingRule { target }),
        }
    }

    /// Renders `{target_name}` into `template` on failure
    pub fn assert_has_rule_for_target_with(
        &self,
        target: impl Into<Targets>,
        template: &str,
    ) -> Result<&Rule, AssertionFailure> {
        let target = target.into();
        self.assert_has_rule_for_target(target.clone())
            .map_err(|_| custom(template, &target))
    }

    /// The rule for `target` must exist and have no recipe lines
    pub fn assert_rule_recipe_is_empty(&self, target: impl Into<Targets>) -> Result<(), AssertionFailure> {
        let target = target.into();
        let rule = self.assert_has_rule_for_target(target.clone())?;
        if rule.is_empty() {
            return Ok(());
        }
        Err(AssertionFailure::NonEmptyRecipe { target })
    }

    /// Renders `{target_name}` into `template` when the recipe is not empty;
    /// a missing rule keeps its default message
    pub fn assert_rule_recipe_is_empty_with(&self, target: impl Into<Targets>, template: &str) -> Result<(), AssertionFailure> {
        let target = target.into();
        match self.assert_rule_recipe_is_empty(target.clone()) {
            Err(AssertionFailure::NonEmptyRecipe { .. }) => Err(custom(template, &target)),
            other => other,
        }
    }

    /// Copy the student's Makefile as `as_name` into `dest`
    ///
    /// Without `dest` the copy goes to the case's temporary directory, or
    /// next to the original when there is none.
    pub fn copy_makefile(&self, dest: Option<&Path>, as_name: Option<&str>) -> Result<PathBuf> {
        let dir = match dest {
            Some(dir) => dir.to_path_buf(),
            None => {
                let beside = self.makefile_path.parent().unwrap_or(Path::new("."));
                self.base.scratch_or(beside)
            }
        };
        let target = dir.join(as_name.unwrap_or(DEFAULT_MAKEFILE_NAME));

        std::fs::copy(&self.makefile_path, &target).wrap_err_with(|| {
            format!(
                "Failed to copy {} to {}",
                self.makefile_path.display(),
                target.display()
            )
        })?;
        debug!("Copied {} to {}", self.makefile_path.display(), target.display());
        Ok(target)
    }
}

impl Deref for MakefileCase {
    type Target = BaseCase;

    fn deref(&self) -> &BaseCase {
        &self.base
    }
}

fn custom(template: &str, target: &Targets) -> AssertionFailure {
    AssertionFailure::Custom(render_template(template, &[("target_name", &target.to_string())]))
}
