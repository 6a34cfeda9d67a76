use anyhow::{Context, Result};
use std::path::Path;

/// Uploaded image bytes with the client-side file name.
#[derive(Debug, Clone, Default)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// `.ext` taken from the original file name, empty when it has none.
    fn suffix(&self) -> String {
        self.file_name
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default()
    }
}

/// Writes the upload under `dir` with a generated `image*` name and returns
/// that name. Empty uploads store nothing.
pub fn save_entry_image(upload: &ImageUpload, dir: &Path) -> Result<Option<String>> {
    if upload.is_empty() {
        return Ok(None);
    }
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create image dir: {}", dir.display()))?;
    let suffix = upload.suffix();
    let file = tempfile::Builder::new()
        .prefix("image")
        .suffix(&suffix)
        .tempfile_in(dir)
        .with_context(|| format!("failed to create image file in {}", dir.display()))?;
    std::fs::write(file.path(), &upload.bytes).with_context(|| "failed to write image file")?;
    let path = file
        .into_temp_path()
        .keep()
        .with_context(|| "failed to persist image file")?;
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .with_context(|| format!("image path has no file name: {}", path.display()))?;
    Ok(Some(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn image_is_written_with_generated_name_and_extension() {
        let dir = tempdir().expect("tempdir");
        let upload = ImageUpload {
            file_name: Some("photo.PNG".to_string()),
            bytes: vec![1, 2, 3],
        };
        let name = save_entry_image(&upload, &dir.path().join("images"))
            .expect("save")
            .expect("name");
        assert!(name.starts_with("image"));
        assert!(name.ends_with(".PNG"));
        let stored = std::fs::read(dir.path().join("images").join(&name)).expect("read");
        assert_eq!(stored, vec![1, 2, 3]);
    }

    #[test]
    fn empty_upload_stores_nothing() {
        let dir = tempdir().expect("tempdir");
        let upload = ImageUpload {
            file_name: Some("photo.png".to_string()),
            bytes: Vec::new(),
        };
        assert_eq!(save_entry_image(&upload, dir.path()).expect("save"), None);
        assert_eq!(std::fs::read_dir(dir.path()).expect("list").count(), 0);
    }

    #[test]
    fn name_without_extension_has_no_suffix() {
        let upload = ImageUpload {
            file_name: Some("photo".to_string()),
            bytes: vec![1],
        };
        assert_eq!(upload.suffix(), "");
    }
}
