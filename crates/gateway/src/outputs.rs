//! Artifact file persistence
//!
//! Generated artifacts are write-once files under the outputs directory,
//! named `{artifact}_{timestamp}.{ext}` and returned to clients as a
//! download reference.

use serde::Serialize;
use std::path::PathBuf;
use studyforge_common::errors::Result;

fn stamped_name(prefix: &str, ext: &str) -> String {
    format!(
        "{}_{}.{}",
        prefix,
        chrono::Local::now().format("%Y%m%d_%H%M%S"),
        ext
    )
}

/// Persist a text artifact; returns the written path
pub async fn write_text(outputs_dir: &str, prefix: &str, content: &str) -> Result<String> {
    let path = PathBuf::from(outputs_dir).join(stamped_name(prefix, "txt"));
    tokio::fs::create_dir_all(outputs_dir).await?;
    tokio::fs::write(&path, content).await?;
    Ok(path.display().to_string())
}

/// Persist a JSON artifact; returns the written path
pub async fn write_json<T: Serialize>(outputs_dir: &str, prefix: &str, value: &T) -> Result<String> {
    let path = PathBuf::from(outputs_dir).join(stamped_name(prefix, "json"));
    tokio::fs::create_dir_all(outputs_dir).await?;
    let body = serde_json::to_vec_pretty(value)?;
    tokio::fs::write(&path, body).await?;
    Ok(path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stamped_name_shape() {
        let name = stamped_name("mcq", "txt");
        assert!(name.starts_with("mcq_"));
        assert!(name.ends_with(".txt"));
        // mcq_YYYYMMDD_HHMMSS.txt
        assert_eq!(name.len(), "mcq_".len() + 15 + ".txt".len());
    }
}
