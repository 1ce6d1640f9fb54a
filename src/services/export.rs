use futures::future::BoxFuture;

use super::ServiceError;

/// Writes the board's bitmap bytes to local user-visible storage.
/// Feature-detected; absent on platforms without file access.
pub trait FileExporter: Send + Sync {
    fn export(&self, name: &str, png: &[u8]) -> Result<(), ServiceError>;
}

/// Uploads a named bitmap to an external drive/notebook service.
pub trait NotebookExporter: Send + Sync {
    fn upload(&self, name: &str, png: Vec<u8>) -> BoxFuture<'static, Result<(), ServiceError>>;
}

/// Exporter writing PNG files into a target directory.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct DiskExporter {
    dir: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl DiskExporter {
    pub fn new(dir: impl Into<std::path::PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl FileExporter for DiskExporter {
    fn export(&self, name: &str, png: &[u8]) -> Result<(), ServiceError> {
        // Board names are user input; keep the file name flat.
        let safe: String = name
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{safe}.png"));
        std::fs::write(&path, png)?;
        log::info!("exported board to {}", path.display());
        Ok(())
    }
}
