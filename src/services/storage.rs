// src/services/storage.rs

use async_trait::async_trait;
use rand::Rng;
use std::path::PathBuf;

use crate::common::error::AppError;

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const RANDOM_SUFFIX_LEN: usize = 6;

// Únicas extensões gravadas; o ServeDir deduz o Content-Type por elas
const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "webp", "gif", "avif"];

// ---
// Porta de armazenamento das imagens de imóveis
// ---
/// Recebe o arquivo já validado e devolve a URL pública.
/// Não existe remoção: tirar a imagem de um imóvel só limpa o image_url.
#[async_trait]
pub trait ImageStorage: Send + Sync {
    async fn upload(&self, object_name: &str, content_type: &str, bytes: Vec<u8>) -> Result<String, AppError>;
}

/// Adaptador padrão: grava num diretório local servido como estático.
pub struct LocalDiskStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalDiskStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }
}

#[async_trait]
impl ImageStorage for LocalDiskStorage {
    async fn upload(&self, object_name: &str, content_type: &str, bytes: Vec<u8>) -> Result<String, AppError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AppError::UploadFailed(e.to_string()))?;

        let path = self.root.join(object_name);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| AppError::UploadFailed(e.to_string()))?;

        tracing::info!(object_name, content_type, size = bytes.len(), "Imagem armazenada");

        Ok(format!("{}/{}", self.public_base_url.trim_end_matches('/'), object_name))
    }
}

// ---
// Regras do upload
// ---
pub fn validate_image(content_type: Option<&str>, size: usize) -> Result<(), AppError> {
    let content_type = content_type.unwrap_or_default();
    let mime = content_type.to_ascii_lowercase();
    // SVG carrega script e seria servido inline pela API
    if !mime.starts_with("image/") || mime.starts_with("image/svg") {
        return Err(AppError::InvalidImageType(content_type.to_string()));
    }
    if size > MAX_IMAGE_BYTES {
        return Err(AppError::ImageTooLarge(size));
    }
    Ok(())
}

/// "<unix-millis>-<aleatório base36>.<extensão>", sempre uma extensão de imagem conhecida (ou "bin")
pub fn object_name(original_filename: Option<&str>, content_type: &str, unix_millis: i64) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..RANDOM_SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();

    format!("{}-{}.{}", unix_millis, suffix, extension(original_filename, content_type))
}

// Extensão do nome original se for de imagem; senão o subtipo do MIME ("image/png" -> "png")
fn extension(original_filename: Option<&str>, content_type: &str) -> &'static str {
    let from_name = original_filename
        .and_then(|name| name.rsplit_once('.'))
        .and_then(|(_, ext)| allowed_extension(&sanitize(ext)));

    from_name.unwrap_or_else(|| {
        let subtype = content_type.split('/').nth(1).unwrap_or_default();
        let subtype = subtype.split(['+', ';']).next().unwrap_or_default();
        allowed_extension(&sanitize(subtype)).unwrap_or("bin")
    })
}

fn allowed_extension(ext: &str) -> Option<&'static str> {
    IMAGE_EXTENSIONS.into_iter().find(|allowed| *allowed == ext)
}

fn sanitize(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(10)
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_images_up_to_five_megabytes() {
        assert!(validate_image(Some("image/jpeg"), 1024).is_ok());
        assert!(validate_image(Some("image/png"), MAX_IMAGE_BYTES).is_ok());
        assert!(matches!(
            validate_image(Some("image/png"), MAX_IMAGE_BYTES + 1),
            Err(AppError::ImageTooLarge(_))
        ));
        assert!(matches!(
            validate_image(Some("application/pdf"), 10),
            Err(AppError::InvalidImageType(_))
        ));
        assert!(matches!(validate_image(None, 10), Err(AppError::InvalidImageType(_))));
        assert!(matches!(
            validate_image(Some("image/svg+xml"), 10),
            Err(AppError::InvalidImageType(_))
        ));
        assert!(validate_image(Some("Image/SVG+xml"), 10).is_err());
    }

    #[test]
    fn test_object_name_keeps_extension() {
        let name = object_name(Some("fachada.final.JPG"), "image/jpeg", 1_700_000_000_000);
        let (stem, ext) = name.rsplit_once('.').unwrap();
        let (millis, suffix) = stem.split_once('-').unwrap();

        assert_eq!(ext, "jpg");
        assert_eq!(millis, "1700000000000");
        assert_eq!(suffix.len(), RANDOM_SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_extension_falls_back_to_mime_subtype() {
        assert!(object_name(None, "image/png", 1).ends_with(".png"));
        assert!(object_name(Some("sin_extension"), "image/webp", 1).ends_with(".webp"));
        assert!(object_name(None, "image/x-icon", 1).ends_with(".bin"));
    }

    #[test]
    fn test_non_image_extension_is_never_stored() {
        let name = object_name(Some("evil.html"), "image/png", 1);
        assert!(name.ends_with(".png"), "{}", name);

        let name = object_name(Some("pagina.HTM"), "text/html", 1);
        assert!(name.ends_with(".bin"), "{}", name);

        let name = object_name(Some("logo.svg"), "image/jpeg", 1);
        assert!(name.ends_with(".jpeg"), "{}", name);
    }

    #[test]
    fn test_names_do_not_repeat() {
        let a = object_name(Some("a.png"), "image/png", 42);
        let b = object_name(Some("a.png"), "image/png", 42);
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_local_disk_upload_returns_public_url() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path().join("property-images"), "http://localhost:3000/storage/property-images/");

        let url = storage.upload("1-abc.png", "image/png", vec![1, 2, 3]).await.unwrap();

        assert_eq!(url, "http://localhost:3000/storage/property-images/1-abc.png");
        let written = std::fs::read(dir.path().join("property-images").join("1-abc.png")).unwrap();
        assert_eq!(written, vec![1, 2, 3]);
    }
}
