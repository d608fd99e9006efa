//! Process-wide memo of compiled entity tables.
//!
//! Each entity type's declaration functions run at most once per process in
//! the common case. Two threads that miss at the same time may both compile;
//! the declarations are pure, so whichever result lands first is kept and the
//! other is dropped.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use super::{Entity, Matrix, Schemes};

/// The compiled chains of one entity type.
#[derive(Debug)]
pub(crate) struct Tables {
    pub(crate) matrix: Matrix,
    pub(crate) schemes: Schemes,
}

type Registry = RwLock<HashMap<TypeId, Arc<Tables>>>;

static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// Returns the tables for `E`, compiling them on first use.
pub(crate) fn tables<E: Entity>() -> Arc<Tables> {
    let registry = REGISTRY.get_or_init(Registry::default);
    let id = TypeId::of::<E>();

    // A panic while holding the lock cannot leave a half-written entry, so a
    // poisoned lock is still safe to read.
    if let Some(found) = registry
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
    {
        return Arc::clone(found);
    }

    let compiled = Arc::new(Tables {
        matrix: E::normalization_matrix(),
        schemes: E::sanitization_schemes(),
    });
    tracing::debug!(
        entity = E::NAME,
        properties = compiled.matrix.len(),
        schemes = compiled.schemes.len(),
        "compiled entity tables"
    );

    let mut guard = registry.write().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(guard.entry(id).or_insert(compiled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Chain;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    static DECLARATIONS: AtomicUsize = AtomicUsize::new(0);

    struct Counted;

    impl Entity for Counted {
        const NAME: &'static str = "Counted";

        fn normalization_matrix() -> Matrix {
            DECLARATIONS.fetch_add(1, Ordering::SeqCst);
            Matrix::from([("field", Chain::identity())])
        }
    }

    struct Other;

    impl Entity for Other {
        const NAME: &'static str = "Other";

        fn normalization_matrix() -> Matrix {
            Matrix::new()
        }
    }

    #[test]
    fn tables_are_memoized_per_type() {
        let first = tables::<Counted>();
        let second = tables::<Counted>();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(DECLARATIONS.load(Ordering::SeqCst), 1);
        assert!(first.matrix.contains_key("field"));
    }

    #[test]
    fn types_do_not_share_tables() {
        assert!(tables::<Other>().matrix.is_empty());
    }

    #[test]
    fn concurrent_lookups_agree() {
        let handles: Vec<_> = (0..8).map(|_| thread::spawn(tables::<Other>)).collect();
        let results: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().expect("lookup thread panicked"))
            .collect();

        for pair in results.windows(2) {
            assert!(Arc::ptr_eq(&pair[0], &pair[1]));
        }
    }
}
