use std::fmt;

use serde::Serialize;

/// Compile-time information about the build, captured by `build.rs`.
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub package_version: &'static str,
    pub build_profile: &'static str,
    pub build_features: &'static str,
    pub build_timestamp: &'static str,
    pub rust_version: &'static str,
    pub build_target: &'static str,
    pub build_host: &'static str,
}

/// Build information for this crate.
pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("TREESEAL_REPO_VERSION"),
        package_version: env!("CARGO_PKG_VERSION"),
        build_profile: env!("TREESEAL_BUILD_PROFILE"),
        build_features: env!("TREESEAL_BUILD_FEATURES"),
        build_timestamp: env!("TREESEAL_BUILD_TIMESTAMP"),
        rust_version: env!("TREESEAL_RUST_VERSION"),
        build_target: env!("TREESEAL_BUILD_TARGET"),
        build_host: env!("TREESEAL_BUILD_HOST"),
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "treeseal {} ({})", self.package_version, self.version)?;
        writeln!(f, "profile:   {}", self.build_profile)?;
        writeln!(f, "features:  {}", self.build_features)?;
        writeln!(f, "built at:  {}", self.build_timestamp)?;
        writeln!(f, "rustc:     {}", self.rust_version)?;
        write!(f, "target:    {} (host {})", self.build_target, self.build_host)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_build_info_display() {
        let info = build_info();
        let rendered = info.to_string();
        assert!(rendered.starts_with("treeseal "));
        assert!(rendered.contains(info.package_version));
        assert!(!info.build_profile.is_empty());
    }
}
