//! Cheap, synchronous decode of a camera frame.

use tracing::debug;

const SOURCE: &str = "intake::decoder";

/// Extracts the QR payload from a frame, if one is visible.
pub trait LocalDecoder: Send + Sync {
    fn decode(&self, frame: &[u8]) -> Option<String>;
}

/// Treats the frame as text a QR reader already pulled off the image.
///
/// Surrounding whitespace is ignored; empty or non-UTF-8 frames hold nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextPayloadDecoder;

impl LocalDecoder for TextPayloadDecoder {
    fn decode(&self, frame: &[u8]) -> Option<String> {
        let text = std::str::from_utf8(frame).ok()?.trim();
        (!text.is_empty()).then(|| text.to_owned())
    }
}

/// Reads a QR code off an encoded camera image (PNG or JPEG).
///
/// The frame is converted to greyscale and handed to the `rqrr` grid
/// detector. The first grid that decodes to non-blank text wins. Frames that
/// are not images, or images without a readable code, hold nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageQrDecoder;

impl LocalDecoder for ImageQrDecoder {
    fn decode(&self, frame: &[u8]) -> Option<String> {
        let image = match image::load_from_memory(frame) {
            Ok(image) => image.to_luma8(),
            Err(err) => {
                debug!(target_module = SOURCE, error = %err, "frame is not a readable image");
                return None;
            }
        };

        let (width, height) = image.dimensions();
        let mut prepared =
            rqrr::PreparedImage::prepare_from_greyscale(width as usize, height as usize, |x, y| {
                image.get_pixel(x as u32, y as u32).0[0]
            });

        prepared
            .detect_grids()
            .into_iter()
            .find_map(|grid| match grid.decode() {
                Ok((_, content)) => {
                    let content = content.trim();
                    (!content.is_empty()).then(|| content.to_owned())
                }
                Err(err) => {
                    debug!(target_module = SOURCE, error = %err, "QR grid failed to decode");
                    None
                }
            })
    }
}
