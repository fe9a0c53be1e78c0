use std::env;
use std::path::PathBuf;

fn fallback_dotenv_path(config_dir: Option<PathBuf>, home_dir: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(dir) = config_dir {
        return Some(dir.join("longbox/.env"));
    }
    Some(home_dir?.join(".config/longbox/.env"))
}

pub fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let fallback = fallback_dotenv_path(
        env::var_os("LONGBOX_CONFIG_DIR").map(PathBuf::from),
        dirs::home_dir(),
    );

    let Some(path) = fallback else {
        return;
    };
    if path.is_file() {
        let _ = dotenvy::from_path(&path);
    }
}

#[cfg(test)]
mod tests {
    use super::fallback_dotenv_path;
    use std::path::PathBuf;

    #[test]
    fn fallback_prefers_explicit_config_dir() {
        let got = fallback_dotenv_path(
            Some(PathBuf::from("/etc/xdg")),
            Some(PathBuf::from("/home/alice")),
        );

        let want = Some(PathBuf::from("/etc/xdg/longbox/.env"));
        assert_eq!(got, want);
    }

    #[test]
    fn fallback_uses_home_when_config_dir_unset() {
        let got = fallback_dotenv_path(None, Some(PathBuf::from("/home/alice")));
        let want = Some(PathBuf::from("/home/alice/.config/longbox/.env"));
        assert_eq!(got, want);
    }
}
