use std::path::Path;
use std::sync::Arc;

use crate::config::ActivityConfig;
use crate::persistence::{ActivityPersistence, FileActivityPersistence};

/// Decides which persistence a lookup resolves to.
///
/// Components that need persistence take a provider instead of calling
/// [`lookup`](crate::persistence::lookup) themselves. Production code passes
/// [`PersistenceProvider::Directory`]; tests pass [`PersistenceProvider::Fixed`]
/// to route every lookup to one prepared instance. The override reaches exactly
/// the code the provider value is handed to.
#[derive(Debug, Clone, Default)]
pub enum PersistenceProvider {
    /// A fresh file-backed instance per lookup.
    #[default]
    Directory,
    /// The same instance for every lookup; directory and config are ignored.
    Fixed(Arc<dyn ActivityPersistence>),
}

impl PersistenceProvider {
    #[must_use]
    pub fn fixed(persistence: impl ActivityPersistence + 'static) -> Self {
        Self::Fixed(Arc::new(persistence))
    }

    #[must_use]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::Fixed(_))
    }

    #[must_use]
    pub fn lookup(&self, directory: impl AsRef<Path>) -> Arc<dyn ActivityPersistence> {
        self.lookup_with_config(directory, Arc::new(ActivityConfig::default()))
    }

    #[must_use]
    pub fn lookup_with_config(
        &self,
        directory: impl AsRef<Path>,
        config: Arc<ActivityConfig>,
    ) -> Arc<dyn ActivityPersistence> {
        match self {
            Self::Fixed(persistence) => {
                tracing::trace!(
                    activity.dir = %directory.as_ref().display(),
                    "lookup served by fixed persistence"
                );
                Arc::clone(persistence)
            }
            Self::Directory => Arc::new(FileActivityPersistence::new(directory, config)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::in_memory;

    #[test]
    fn fixed_provider_ignores_directory_and_config() {
        let provider = PersistenceProvider::fixed(in_memory());
        let a = provider.lookup("/srv/partition-a");
        let b = provider.lookup_with_config("/srv/partition-b", Arc::default());
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.directory().is_none());
    }

    #[test]
    fn directory_provider_builds_independent_instances() {
        let provider = PersistenceProvider::default();
        assert!(!provider.is_fixed());
        let a = provider.lookup("/srv/partition-a");
        let b = provider.lookup("/srv/partition-a");
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a.directory(), Some(Path::new("/srv/partition-a")));
    }
}
