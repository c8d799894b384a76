use std::path::PathBuf;

const CONFIG_FILE: &str = ".gh-card.toml";

/// Candidate config locations, most specific first
fn candidates() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE)];
    if let Some(home) = std::env::var_os("HOME") {
        paths.push(PathBuf::from(home).join(CONFIG_FILE));
    }
    paths
}

/// Content of the first readable `.gh-card.toml`, looking in the working
/// directory and then in `$HOME`
pub fn load_config_file() -> Option<String> {
    candidates().into_iter().find_map(|path| {
        let content = std::fs::read_to_string(&path).ok()?;
        log::debug!("Loaded config from {}", path.display());
        Some(content)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_working_directory_is_searched_first() {
        let paths = candidates();
        assert_eq!(paths[0], PathBuf::from(CONFIG_FILE));
        assert!(paths.iter().all(|p| p.ends_with(CONFIG_FILE)));
    }
}
