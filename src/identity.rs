//! Local operator identity
//!
//! A node installation keeps its settings in `~/node.ini`, including a
//! `local-op-callsign:<CALL>` line. When no callsign is configured we log
//! in with that one.

use std::path::{Path, PathBuf};

const CALLSIGN_KEY: &str = "local-op-callsign:";

/// Default location of the node settings file
pub fn node_ini_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join("node.ini"))
}

/// Callsign from `~/node.ini`, if there is one.
pub fn discover_callsign() -> Option<String> {
    let path = node_ini_path()?;
    let callsign = callsign_from_node_ini(&path);
    match &callsign {
        Some(call) => tracing::info!(path = %path.display(), callsign = %call, "Found local callsign"),
        None => tracing::debug!(path = %path.display(), "No local callsign found"),
    }
    callsign
}

/// Read the callsign from a node settings file. A missing file or key is
/// `None`.
pub fn callsign_from_node_ini(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    parse_callsign(&content)
}

fn parse_callsign(content: &str) -> Option<String> {
    content
        .lines()
        .filter_map(|line| line.trim().strip_prefix(CALLSIGN_KEY))
        .map(str::trim)
        .find(|call| !call.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_callsign() {
        let ini = "node-name:HOME\nlocal-op-callsign:G4ABC\nlocal-node:G4ABC-7\n";
        assert_eq!(parse_callsign(ini), Some("G4ABC".to_string()));
    }

    #[test]
    fn test_parse_callsign_trims_and_skips_empty() {
        assert_eq!(
            parse_callsign("local-op-callsign:\r\n  local-op-callsign: M0XYZ \r\n"),
            Some("M0XYZ".to_string())
        );
        assert_eq!(parse_callsign("other:value\n"), None);
        assert_eq!(parse_callsign(""), None);
    }

    #[test]
    fn test_callsign_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.ini");
        std::fs::write(&path, "local-op-callsign:N0CALL\n").unwrap();

        assert_eq!(callsign_from_node_ini(&path), Some("N0CALL".to_string()));
        assert_eq!(callsign_from_node_ini(&dir.path().join("missing.ini")), None);
    }
}
