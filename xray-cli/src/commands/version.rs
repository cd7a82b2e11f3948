//! `xray version` command handler

/// Print the build version string.
pub fn execute() {
    println!("{}", version_string());
}

fn version_string() -> String {
    format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_carries_package_version() {
        let s = version_string();
        assert!(s.starts_with("xray-cli "));
        assert!(s.contains(env!("CARGO_PKG_VERSION")));
    }
}
