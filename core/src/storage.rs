use anyhow::Context;
use log::{info, warn};
use serde::Serialize;
use std::path::Path;

use crate::types::AthleteProfile;

/// Leser inn profil fra disk (JSON).
/// Hvis filen ikke finnes, returneres en default-profil.
pub fn load_profile<P: AsRef<Path>>(path: P) -> anyhow::Result<AthleteProfile> {
    let path = path.as_ref();
    if path.exists() {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading profile {}", path.display()))?;
        let mut de = serde_json::Deserializer::from_str(&contents);
        let profile: AthleteProfile = serde_path_to_error::deserialize(&mut de)
            .with_context(|| format!("parsing profile {}", path.display()))?;
        info!(
            "📂 Profil lastet fra {} (max_hr={}, ftp={})",
            path.display(),
            profile.max_hr,
            profile.ftp
        );
        Ok(profile)
    } else {
        warn!(
            "⚠️ Fant ikke profil på {}, returnerer default",
            path.display()
        );
        Ok(AthleteProfile::default())
    }
}

/// Lagrer profil til disk som JSON (pretty-print).
pub fn save_profile<P: AsRef<Path>>(profile: &AthleteProfile, path: P) -> anyhow::Result<()> {
    save_json(profile, path.as_ref())?;
    info!(
        "✅ Profil lagret til {} (max_hr={}, ftp={})",
        path.as_ref().display(),
        profile.max_hr,
        profile.ftp
    );
    Ok(())
}

/// Skriv vilkårlig rapport som pretty JSON.
pub fn save_json<T: Serialize + ?Sized, P: AsRef<Path>>(value: &T, path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
