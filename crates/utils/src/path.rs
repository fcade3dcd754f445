use std::path::PathBuf;

/// Expand a leading `~` to the current user's home directory.
///
/// Paths without a leading tilde, and `~user` forms, are returned unchanged.
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(path));
    }
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_tilde_home_prefix() {
        let expanded = expand_tilde("~/portal/db.sqlite");
        assert!(!expanded.to_string_lossy().contains('~'));
        assert!(expanded.ends_with("portal/db.sqlite"));
    }

    #[test]
    fn test_expand_tilde_leaves_absolute_paths() {
        assert_eq!(expand_tilde("/srv/portal"), PathBuf::from("/srv/portal"));
    }

    #[test]
    fn test_expand_tilde_ignores_other_users() {
        assert_eq!(expand_tilde("~other/db"), PathBuf::from("~other/db"));
    }
}
