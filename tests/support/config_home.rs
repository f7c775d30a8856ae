use std::path::Path;
use std::sync::{Mutex, MutexGuard, OnceLock};

use specgram::app_dirs::CONFIG_HOME_ENV;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Points `SPECGRAM_CONFIG_HOME` at a directory until dropped.
pub struct ConfigHomeGuard {
    previous: Option<std::ffi::OsString>,
    _lock: MutexGuard<'static, ()>,
}

impl ConfigHomeGuard {
    pub fn set(path: &Path) -> Self {
        let lock = ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|err| err.into_inner());
        let previous = std::env::var_os(CONFIG_HOME_ENV);
        // SAFETY: env mutation is serialized by ENV_LOCK.
        unsafe {
            std::env::set_var(CONFIG_HOME_ENV, path);
        }
        Self {
            previous,
            _lock: lock,
        }
    }
}

impl Drop for ConfigHomeGuard {
    fn drop(&mut self) {
        // SAFETY: env mutation is serialized by ENV_LOCK.
        unsafe {
            match self.previous.take() {
                Some(value) => std::env::set_var(CONFIG_HOME_ENV, value),
                None => std::env::remove_var(CONFIG_HOME_ENV),
            }
        }
    }
}
