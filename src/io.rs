use std::path::Path;

pub(crate) fn load_string(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|err| format!("asset load failed: {:?}: {}", path, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn missing_file_reports_asset_load_failure() {
        let err = load_string(&PathBuf::from("does/not/exist.json")).unwrap_err();
        assert!(err.contains("asset load failed"));
    }
}
