//! Device health classification

/// Strip a leading `<n>:` prefix from a sysfs state, e.g. `5: LinkUp` → `LinkUp`
///
/// Text without a colon is returned unchanged.
pub fn clean_state(raw: &str) -> String {
    match raw.find(':') {
        Some(idx) => raw[idx + 1..].trim().to_string(),
        None => raw.to_string(),
    }
}

/// A port is healthy when it is physically up and logically active
pub fn is_healthy(phys_state: &str, state: &str) -> bool {
    phys_state.contains("LinkUp") && state.contains("ACTIVE")
}
