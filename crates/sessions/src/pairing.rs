use std::time::{SystemTime, UNIX_EPOCH};

use {
    base64::{Engine, engine::general_purpose::STANDARD},
    qrcode::{QrCode, render::svg},
    serde::Serialize,
    tracing::warn,
};

#[derive(Debug, thiserror::Error)]
pub enum PairingRenderError {
    #[error("pairing code cannot be encoded as a QR code: {0}")]
    Encode(#[from] qrcode::types::QrError),
}

/// A pairing code rendered for display, plus when it was issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairingArtifact {
    code: String,
    /// `data:image/svg+xml;base64,...` QR image, absent if rendering failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    created_at_ms: u64,
}

impl PairingArtifact {
    /// Render `code` into a QR image. A code that cannot be rendered still
    /// yields an artifact carrying the raw code.
    pub fn render(code: &str) -> Self {
        let image = match qr_data_url(code) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(error = %e, "failed to render pairing code, keeping raw code");
                None
            },
        };
        Self {
            code: code.to_string(),
            image,
            created_at_ms: now_ms(),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn image_data_url(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn created_at_ms(&self) -> u64 {
        self.created_at_ms
    }
}

fn qr_data_url(code: &str) -> Result<String, PairingRenderError> {
    let svg = QrCode::new(code.as_bytes())?
        .render::<svg::Color<'_>>()
        .min_dimensions(300, 300)
        .build();
    Ok(format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg)))
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Holds at most one pairing artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PairingCodeCache(Option<PairingArtifact>);

impl PairingCodeCache {
    /// Replace any cached artifact.
    pub fn set(&mut self, artifact: PairingArtifact) {
        self.0 = Some(artifact);
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }

    pub fn get(&self) -> Option<&PairingArtifact> {
        self.0.as_ref()
    }

    pub fn is_present(&self) -> bool {
        self.0.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_svg_data_url() {
        let artifact = PairingArtifact::render("2@abcDEF123,xyz==,ref==");
        assert_eq!(artifact.code(), "2@abcDEF123,xyz==,ref==");
        let url = artifact.image_data_url().unwrap();
        assert!(url.starts_with("data:image/svg+xml;base64,"));

        let svg = STANDARD
            .decode(url.trim_start_matches("data:image/svg+xml;base64,"))
            .unwrap();
        let svg = String::from_utf8(svg).unwrap();
        assert!(svg.contains("<svg"));
        assert!(artifact.created_at_ms() > 0);
    }

    #[test]
    fn oversized_code_keeps_raw_text() {
        // Beyond the capacity of the largest QR version.
        let code = "x".repeat(8000);
        let artifact = PairingArtifact::render(&code);
        assert_eq!(artifact.code(), code);
        assert!(artifact.image_data_url().is_none());
    }

    #[test]
    fn cache_holds_at_most_one() {
        let mut cache = PairingCodeCache::default();
        assert!(cache.get().is_none());

        cache.set(PairingArtifact::render("first"));
        cache.set(PairingArtifact::render("second"));
        assert_eq!(cache.get().map(PairingArtifact::code), Some("second"));

        cache.clear();
        assert!(!cache.is_present());
        cache.clear();
        assert!(cache.get().is_none());
    }
}
