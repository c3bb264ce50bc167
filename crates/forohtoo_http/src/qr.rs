use std::io::Cursor;

use image::{ImageFormat, Luma};
use qrcode::QrCode;
use tracing::warn;

/// Renders `data` (the invoice's `payment_url`) as a base64-encoded PNG for
/// `Invoice.qr_code_data` (spec.md §6). A render failure degrades to an
/// empty string rather than failing the request — the invoice is still
/// usable without a QR code.
pub fn render_qr_png_base64(data: &str) -> String {
    match try_render(data) {
        Ok(encoded) => encoded,
        Err(e) => {
            warn!(error = %e, "failed to render invoice QR code");
            String::new()
        }
    }
}

fn try_render(data: &str) -> Result<String, Box<dyn std::error::Error>> {
    let code = QrCode::new(data.as_bytes())?;
    let image = code.render::<Luma<u8>>().module_dimensions(4, 4).build();
    let mut bytes = Vec::new();
    image::DynamicImage::ImageLuma8(image).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(base64::encode(bytes))
}
