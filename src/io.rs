use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat, ImageOutputFormat};

use crate::error::{Error, Result};
use crate::raster::Raster;
use crate::{log_info, log_warn};

pub const DEFAULT_JPEG_QUALITY: u8 = 90;

// ============================================================================
// DECODING
// ============================================================================

/// Decode any format the `image` crate understands into a [`Raster`].
pub fn decode_file(path: &Path) -> Result<Raster> {
    if !path.is_file() {
        log_warn!("decode: '{}' does not exist", path.display());
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    let bytes = fs::read(path)?;
    let img = image::load_from_memory(&bytes).map_err(|e| {
        log_warn!("decode: '{}' failed: {}", path.display(), e);
        Error::Decode(format!("{}: {}", path.display(), e))
    })?;
    let rgba = img.to_rgba8();
    log_info!("decode: '{}' ({}×{})", path.display(), rgba.width(), rgba.height());
    Ok(Raster::from_rgba_image(&rgba))
}

// ============================================================================
// EXPORT FORMATS
// ============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
    Gif,
    Webp,
    Bmp,
}

impl ExportFormat {
    pub fn all() -> &'static [ExportFormat] {
        &[Self::Png, Self::Jpeg, Self::Gif, Self::Webp, Self::Bmp]
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::Webp => "webp",
            Self::Bmp => "bmp",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
            Self::Bmp => "image/bmp",
        }
    }

    /// Infer the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| Error::invalid(format!("'{}' has no file extension", path.display())))?;
        ext.parse()
    }

    /// Whether the encoded file keeps an alpha channel.
    pub fn supports_alpha(&self) -> bool {
        !matches!(self, Self::Jpeg | Self::Bmp)
    }

    fn output_format(&self, quality: Option<u8>) -> ImageOutputFormat {
        match self {
            Self::Png => ImageOutputFormat::Png,
            Self::Jpeg => ImageOutputFormat::Jpeg(quality.unwrap_or(DEFAULT_JPEG_QUALITY).clamp(1, 100)),
            Self::Gif => ImageOutputFormat::Gif,
            // Fails with an unsupported-format error when no WebP encoder is compiled in.
            Self::Webp => ImageOutputFormat::from(ImageFormat::WebP),
            Self::Bmp => ImageOutputFormat::Bmp,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
            Self::Gif => "GIF",
            Self::Webp => "WebP",
            Self::Bmp => "BMP",
        };
        f.write_str(name)
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "gif" => Ok(Self::Gif),
            "webp" => Ok(Self::Webp),
            "bmp" => Ok(Self::Bmp),
            other => Err(Error::invalid(format!("unknown export format '{}'", other))),
        }
    }
}

// ============================================================================
// EXPORTER
// ============================================================================

/// Encodes a flattened raster into files, byte buffers or `data:` URLs.
#[derive(Clone, Debug)]
pub struct ImageExporter {
    raster: Raster,
}

impl ImageExporter {
    pub fn new(raster: Raster) -> Self {
        Self { raster }
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    /// Encode into memory. `quality` only affects JPEG.
    pub fn as_binary_data(&self, format: ExportFormat, quality: Option<u8>) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.encode_into(&mut cursor, format, quality)?;
        Ok(cursor.into_inner())
    }

    pub fn as_file(&self, path: &Path, format: ExportFormat, quality: Option<u8>) -> Result<()> {
        let bytes = self.as_binary_data(format, quality)?;
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&bytes)?;
        writer.flush()?;
        log_info!("export: wrote {} ({} bytes) to '{}'", format, bytes.len(), path.display());
        Ok(())
    }

    pub fn as_data_url(&self, format: ExportFormat, quality: Option<u8>) -> Result<String> {
        let bytes = self.as_binary_data(format, quality)?;
        Ok(format!("data:{};base64,{}", format.mime_type(), STANDARD.encode(bytes)))
    }

    fn encode_into(&self, out: &mut Cursor<Vec<u8>>, format: ExportFormat, quality: Option<u8>) -> Result<()> {
        let rgba = self.raster.to_export_image();
        let img = if format.supports_alpha() {
            DynamicImage::ImageRgba8(rgba)
        } else {
            DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(rgba).to_rgb8())
        };
        img.write_to(out, format.output_format(quality)).map_err(|e| {
            log_warn!("export: {} encoding failed: {}", format, e);
            Error::Encode(format!("{}: {}", format, e))
        })
    }
}
