use std::fmt;

use serde::Serialize;

/// Compile-time build details, populated by `build.rs`.
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub build_profile: &'static str,
    pub build_features: &'static str,
    pub build_timestamp: &'static str,
    pub version: &'static str,
    pub rust_version: &'static str,
    pub target: Option<&'static str>,
}

pub fn build_info() -> BuildInfo {
    BuildInfo {
        build_profile: env!("BUILD_PROFILE"),
        build_features: env!("BUILD_FEATURES"),
        build_timestamp: env!("BUILD_TIMESTAMP"),
        version: env!("REPO_VERSION"),
        rust_version: env!("RUST_VERSION"),
        target: option_env!("BUILD_TARGET"),
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sealdrop {} ({} build, {}, built {})",
            self.version, self.build_profile, self.rust_version, self.build_timestamp
        )?;
        if let Some(target) = self.target {
            write!(f, " for {}", target)?;
        }
        Ok(())
    }
}
