use std::path::{Path, PathBuf};

/// Keeps ASCII alphanumerics, `.`, `-` and `_`; everything else becomes `-`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('.').to_string();

    if cleaned.is_empty() {
        String::from("file")
    } else {
        cleaned
    }
}

/// Unique on-disk name that keeps the original extension.
pub fn stored_name_for(original: &str) -> String {
    let clean = sanitize_file_name(original);
    match Path::new(&clean).extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}.{}", uuid::Uuid::new_v4(), ext.to_ascii_lowercase()),
        None => uuid::Uuid::new_v4().to_string(),
    }
}

pub async fn store_upload(dir: &Path, stored_name: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(stored_name);
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}

pub async fn discard_upload(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
