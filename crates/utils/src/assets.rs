use std::path::PathBuf;

use directories::ProjectDirs;

const PROJECT_ROOT: &str = env!("CARGO_MANIFEST_DIR");

/// Root directory for runtime data (database, logs).
///
/// Debug builds keep everything inside the workspace under `dev_assets/`.
pub fn asset_dir() -> PathBuf {
    let path = if cfg!(debug_assertions) {
        PathBuf::from(PROJECT_ROOT).join("../../dev_assets")
    } else {
        ProjectDirs::from("org", "record-portal", "record-portal")
            .expect("OS didn't give us a home directory")
            .data_dir()
            .to_path_buf()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).expect("Failed to create asset directory");
    }

    path
}

/// Get the database file path.
///
/// Respects `PORTAL_DATABASE_PATH`, with tilde expansion.
///
/// Default: `{asset_dir}/db.sqlite`
pub fn database_path() -> PathBuf {
    if let Ok(path) = std::env::var("PORTAL_DATABASE_PATH") {
        return crate::path::expand_tilde(&path);
    }
    asset_dir().join("db.sqlite")
}

/// Get the log directory path.
///
/// Respects `PORTAL_LOG_DIR`, with tilde expansion.
///
/// Default: `{asset_dir}/logs`
pub fn log_dir() -> PathBuf {
    if let Ok(path) = std::env::var("PORTAL_LOG_DIR") {
        return crate::path::expand_tilde(&path);
    }
    asset_dir().join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_database_path_default() {
        // SAFETY: Tests run serially via #[serial] attribute
        unsafe { env::remove_var("PORTAL_DATABASE_PATH") };
        let path = database_path();
        assert!(path.ends_with("db.sqlite"));
    }

    #[test]
    #[serial]
    fn test_database_path_env_override() {
        // SAFETY: Tests run serially via #[serial] attribute
        unsafe { env::set_var("PORTAL_DATABASE_PATH", "/custom/path/portal.db") };
        let path = database_path();
        unsafe { env::remove_var("PORTAL_DATABASE_PATH") };
        assert_eq!(path, PathBuf::from("/custom/path/portal.db"));
    }

    #[test]
    #[serial]
    fn test_database_path_tilde_expansion() {
        // SAFETY: Tests run serially via #[serial] attribute
        unsafe { env::set_var("PORTAL_DATABASE_PATH", "~/record-portal/db.sqlite") };
        let path = database_path();
        unsafe { env::remove_var("PORTAL_DATABASE_PATH") };
        assert!(!path.to_string_lossy().contains('~'));
        assert!(path.is_absolute());
    }

    #[test]
    #[serial]
    fn test_log_dir_env_override() {
        let temp = tempfile::tempdir().unwrap();
        let custom = temp.path().join("logs");
        // SAFETY: Tests run serially via #[serial] attribute
        unsafe { env::set_var("PORTAL_LOG_DIR", custom.to_str().unwrap()) };
        let dir = log_dir();
        unsafe { env::remove_var("PORTAL_LOG_DIR") };
        assert_eq!(dir, custom);
    }
}
