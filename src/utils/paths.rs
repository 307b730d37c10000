use std::path::{Path, PathBuf};

/// Expand a leading `~` to the user's home directory
pub fn expand_tilde(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_tilde() {
        let plain = PathBuf::from("/var/games");
        assert_eq!(expand_tilde(&plain), plain);

        let relative = PathBuf::from("games/~x");
        assert_eq!(expand_tilde(&relative), relative);

        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde(Path::new("~/go/games")), home.join("go/games"));
            assert_eq!(expand_tilde(Path::new("~")), home);
        }
    }
}
