//! Request-driven background image loader.
//!
//! Receives decode jobs keyed by (slot, generation), decodes and downscales
//! off-thread, and returns RGBA8 frames without ever blocking the render
//! loop. The generation key lets the controller discard replies that were
//! overtaken by an index advance instead of applying them out of order.

use std::{path::PathBuf, thread};

use crossbeam_channel::{Receiver, Sender};
use image::GenericImageView;
use tracing::{debug, warn};

use crate::session::SlotId;

/// Message sent to the background loader thread.
pub enum LoaderMsg {
    /// Decode this path for the given slot, bounded by the target size.
    Decode {
        source: PathBuf,
        slot: SlotId,
        generation: u64,
        target: (u32, u32),
    },
    /// Stop the loader.
    Quit,
}

/// Loader reply. A failed decode still reports its slot so the controller
/// can fall back to the square default aspect ratio.
pub enum LoaderReply {
    Decoded(DecodedImage),
    Failed {
        slot: SlotId,
        generation: u64,
        source: PathBuf,
    },
}

/// An image decoded and resized on CPU, ready for GPU upload.
pub struct DecodedImage {
    pub slot: SlotId,
    pub generation: u64,
    /// Decoded dimensions after the bounded, aspect-preserving resize.
    pub size: (u32, u32),
    /// RGBA8 pixel buffer, `size.0 * size.1 * 4` bytes.
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn aspect_ratio(&self) -> f32 {
        self.size.0 as f32 / self.size.1.max(1) as f32
    }
}

/// Spawn the request-driven loader. The thread exits on [`LoaderMsg::Quit`]
/// or when the request channel is dropped; replies sent after the receiver
/// is gone vanish harmlessly.
pub fn spawn_loader(rx: Receiver<LoaderMsg>, tx: Sender<LoaderReply>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        while let Ok(msg) = rx.recv() {
            match msg {
                LoaderMsg::Quit => break,
                LoaderMsg::Decode {
                    source,
                    slot,
                    generation,
                    target,
                } => match image::open(&source) {
                    Ok(img) => {
                        // Downscale within the target bounds, keeping the
                        // aspect ratio intact for the fit computation.
                        let (max_w, max_h) = (target.0.max(1), target.1.max(1));
                        let (w, h) = img.dimensions();
                        let img = if w > max_w || h > max_h {
                            img.resize(max_w, max_h, image::imageops::Triangle)
                        } else {
                            img
                        };
                        let size = img.dimensions();
                        debug!(
                            source = %source.display(),
                            width = size.0,
                            height = size.1,
                            generation,
                            "decoded slide"
                        );
                        let _ = tx.send(LoaderReply::Decoded(DecodedImage {
                            slot,
                            generation,
                            size,
                            pixels: img.to_rgba8().into_vec(),
                        }));
                    }
                    Err(err) => {
                        warn!(
                            source = %source.display(),
                            error = %err,
                            "failed to decode slide; slot stays unset"
                        );
                        let _ = tx.send(LoaderReply::Failed {
                            slot,
                            generation,
                            source,
                        });
                    }
                },
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn replies_after_receiver_drop_are_harmless() {
        let (tx_req, rx_req) = unbounded::<LoaderMsg>();
        let (tx_res, rx_res) = unbounded::<LoaderReply>();
        let handle = spawn_loader(rx_req, tx_res);
        drop(rx_res);

        // Both replies land in a dropped channel; the loader must shrug
        // them off and keep serving until Quit.
        for name in ["/nonexistent/a.jpg", "/nonexistent/b.jpg"] {
            tx_req
                .send(LoaderMsg::Decode {
                    source: PathBuf::from(name),
                    slot: SlotId::Next,
                    generation: 0,
                    target: (64, 64),
                })
                .unwrap();
        }
        tx_req.send(LoaderMsg::Quit).unwrap();
        handle.join().expect("loader thread exited cleanly");
    }

    #[test]
    fn dropped_request_channel_stops_the_loader() {
        let (tx_req, rx_req) = unbounded::<LoaderMsg>();
        let (tx_res, _rx_res) = unbounded::<LoaderReply>();
        let handle = spawn_loader(rx_req, tx_res);
        drop(tx_req);
        handle.join().expect("loader thread exited cleanly");
    }
}
