//! Poison-tolerant lock acquisition.

use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

fn recover<G>(poisoned: PoisonError<G>, owner: &'static str, op: &'static str, kind: &str) -> G {
    warn!(
        op,
        owner,
        lock_kind = kind,
        result = "poisoned_recovered",
        "Recovered from poisoned lock"
    );
    poisoned.into_inner()
}

pub(crate) fn rw_read<'a, T>(
    lock: &'a RwLock<T>,
    owner: &'static str,
    op: &'static str,
) -> RwLockReadGuard<'a, T> {
    lock.read()
        .unwrap_or_else(|poisoned| recover(poisoned, owner, op, "rwlock.read"))
}

pub(crate) fn rw_write<'a, T>(
    lock: &'a RwLock<T>,
    owner: &'static str,
    op: &'static str,
) -> RwLockWriteGuard<'a, T> {
    lock.write()
        .unwrap_or_else(|poisoned| recover(poisoned, owner, op, "rwlock.write"))
}

pub(crate) fn mutex_lock<'a, T>(
    lock: &'a Mutex<T>,
    owner: &'static str,
    op: &'static str,
) -> MutexGuard<'a, T> {
    lock.lock()
        .unwrap_or_else(|poisoned| recover(poisoned, owner, op, "mutex.lock"))
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;

    #[test]
    fn mutex_recovers_after_panic() {
        let lock = Mutex::new(1_u32);
        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = lock.lock().expect("lock should be acquired");
            panic!("poison mutex");
        }));

        *mutex_lock(&lock, "tests", "write") += 1;
        assert_eq!(*mutex_lock(&lock, "tests", "read"), 2);
    }

    #[test]
    fn rwlock_recovers_after_panic() {
        let lock = RwLock::new(String::from("before"));
        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = lock.write().expect("write lock should be acquired");
            panic!("poison rwlock");
        }));

        rw_write(&lock, "tests", "write").push_str("-after");
        assert_eq!(rw_read(&lock, "tests", "read").as_str(), "before-after");
    }
}
