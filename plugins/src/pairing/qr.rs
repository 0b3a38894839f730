use std::io::Cursor;

use base64::Engine;
use chatbridge_core::api::{PairingConfig, PairingRenderer, RenderError};
use image::{ImageBuffer, ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};

fn parse_ec_level(raw: &str) -> EcLevel {
    match raw.trim().to_ascii_uppercase().as_str() {
        "L" => EcLevel::L,
        "Q" => EcLevel::Q,
        "H" => EcLevel::H,
        _ => EcLevel::M,
    }
}

/// Renders pairing codes as PNG QR images wrapped in a data URL.
#[derive(Debug, Clone)]
pub struct QrRenderer {
    scale: u32,
    margin: u32,
    ec_level: EcLevel,
}

impl QrRenderer {
    pub fn from_config(cfg: &PairingConfig) -> Self {
        Self {
            scale: cfg.scale.max(1),
            margin: cfg.margin,
            ec_level: parse_ec_level(&cfg.error_correction),
        }
    }

    fn png(&self, code: &str) -> Result<Vec<u8>, RenderError> {
        let qr = QrCode::with_error_correction_level(code.as_bytes(), self.ec_level)
            .map_err(|e| RenderError(e.to_string()))?;
        let modules = qr
            .render::<Luma<u8>>()
            .quiet_zone(false)
            .module_dimensions(self.scale, self.scale)
            .build();

        // The renderer's own quiet zone is fixed at four modules.
        let pad = self.margin * self.scale;
        let mut canvas = ImageBuffer::from_pixel(
            modules.width() + 2 * pad,
            modules.height() + 2 * pad,
            Luma([255u8]),
        );
        image::imageops::overlay(&mut canvas, &modules, i64::from(pad), i64::from(pad));

        let mut out = Cursor::new(Vec::new());
        canvas
            .write_to(&mut out, ImageFormat::Png)
            .map_err(|e| RenderError(e.to_string()))?;
        Ok(out.into_inner())
    }
}

impl Default for QrRenderer {
    fn default() -> Self {
        Self::from_config(&PairingConfig::default())
    }
}

impl PairingRenderer for QrRenderer {
    fn render(&self, code: &str) -> Result<String, RenderError> {
        if code.is_empty() {
            return Err(RenderError("empty pairing code".into()));
        }
        let png = self.png(code)?;
        Ok(format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(png)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

    #[test]
    fn renders_png_data_url() {
        let url = QrRenderer::default()
            .render("2@AbCdEf,ghIjKl==,MnOpQr==,StUvWx==")
            .unwrap();
        let b64 = url.strip_prefix("data:image/png;base64,").unwrap();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(b64)
            .unwrap();
        assert!(bytes.starts_with(PNG_MAGIC));
    }

    #[test]
    fn margin_and_scale_set_image_size() {
        let renderer = QrRenderer::from_config(&PairingConfig {
            scale: 4,
            margin: 2,
            error_correction: "L".into(),
        });
        let png = renderer.png("hello").unwrap();
        let img = image::load_from_memory_with_format(&png, ImageFormat::Png).unwrap();

        let width = QrCode::with_error_correction_level(b"hello", EcLevel::L)
            .unwrap()
            .width() as u32;
        assert_eq!(img.width(), (width + 4) * 4);
        assert_eq!(img.height(), img.width());
    }

    #[test]
    fn empty_code_fails() {
        assert!(QrRenderer::default().render("").is_err());
    }

    #[test]
    fn unknown_level_falls_back_to_medium() {
        assert_eq!(parse_ec_level("x"), EcLevel::M);
        assert_eq!(parse_ec_level("h"), EcLevel::H);
    }
}
