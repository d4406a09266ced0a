use std::path::Path;

/// Access-control collaborator guarding an external reference's readable
/// lifetime. Sandboxed platforms hand out security-scoped references that
/// must be explicitly opened and closed around every read.
pub trait AccessControl: Send + Sync {
    /// Returns false when the reference cannot be opened for reading.
    fn acquire_access(&self, reference: &Path) -> bool;

    /// Called exactly once for every successful `acquire_access`.
    fn release_access(&self, reference: &Path);
}

/// Access control for platforms without scoped grants. Always grants.
pub struct UnscopedAccess;

impl AccessControl for UnscopedAccess {
    fn acquire_access(&self, _reference: &Path) -> bool {
        true
    }

    fn release_access(&self, _reference: &Path) {}
}

/// A held access grant. The grant is released when this guard is dropped.
pub struct AccessGrant<'a> {
    access: &'a dyn AccessControl,
    reference: &'a Path,
}

impl<'a> AccessGrant<'a> {
    /// Returns `None` if the collaborator refused the grant.
    pub fn acquire(access: &'a dyn AccessControl, reference: &'a Path) -> Option<Self> {
        if access.acquire_access(reference) {
            tracing::debug!("Access granted for {}", reference.display());
            Some(Self { access, reference })
        } else {
            None
        }
    }
}

impl Drop for AccessGrant<'_> {
    fn drop(&mut self) {
        self.access.release_access(self.reference);
        tracing::debug!("Access released for {}", self.reference.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingAccess {
        grant: bool,
        acquired: AtomicUsize,
        released: AtomicUsize,
    }

    impl AccessControl for CountingAccess {
        fn acquire_access(&self, _reference: &Path) -> bool {
            self.acquired.fetch_add(1, Ordering::SeqCst);
            self.grant
        }

        fn release_access(&self, _reference: &Path) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_grant_released_on_drop() {
        let access = CountingAccess {
            grant: true,
            ..Default::default()
        };
        let path = Path::new("/tmp/log.xml");

        {
            let grant = AccessGrant::acquire(&access, path);
            assert!(grant.is_some());
            assert_eq!(access.released.load(Ordering::SeqCst), 0);
        }

        assert_eq!(access.acquired.load(Ordering::SeqCst), 1);
        assert_eq!(access.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_refused_grant_is_not_released() {
        let access = CountingAccess::default();
        let grant = AccessGrant::acquire(&access, Path::new("/tmp/log.xml"));
        assert!(grant.is_none());
        assert_eq!(access.released.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unscoped_access_always_grants() {
        assert!(UnscopedAccess.acquire_access(Path::new("/anything")));
    }
}
