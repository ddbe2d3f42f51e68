use bundlesync_core::{AppResult, NonEmptyString};

/// Identity of one release bundle version inside a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseBundleRef {
    name: NonEmptyString,
    version: NonEmptyString,
    project_key: NonEmptyString,
    repository_key: NonEmptyString,
}

impl ReleaseBundleRef {
    /// Creates a validated bundle reference.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        project_key: impl Into<String>,
        repository_key: impl Into<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            name: NonEmptyString::new(name)?,
            version: NonEmptyString::new(version)?,
            project_key: NonEmptyString::new(project_key)?,
            repository_key: NonEmptyString::new(repository_key)?,
        })
    }

    /// Returns the bundle name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the bundle version.
    #[must_use]
    pub fn version(&self) -> &str {
        self.version.as_str()
    }

    /// Returns the owning project key.
    #[must_use]
    pub fn project_key(&self) -> &str {
        self.project_key.as_str()
    }

    /// Returns the release bundle repository key.
    #[must_use]
    pub fn repository_key(&self) -> &str {
        self.repository_key.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::ReleaseBundleRef;

    #[test]
    fn bundle_ref_requires_every_part() {
        assert!(ReleaseBundleRef::new("app", "1.0.0", "default", "release-bundles-v2").is_ok());
        assert!(ReleaseBundleRef::new("app", " ", "default", "release-bundles-v2").is_err());
        assert!(ReleaseBundleRef::new("app", "1.0.0", "", "release-bundles-v2").is_err());
    }
}
