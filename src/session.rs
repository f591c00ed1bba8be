use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::fit::FitParams;

/// Texture slot addressed by loader requests and replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotId {
    Current,
    Next,
    /// Displacement map, loaded once and never rotated.
    Map,
}

/// One live image: its source, resolved aspect ratio and fit parameters.
///
/// The aspect ratio stays at 1.0 until a decode resolves it; a failed decode
/// leaves it there so the pipeline never blocks on a broken file.
#[derive(Debug, Clone)]
pub struct ImageSlot {
    pub source: PathBuf,
    pub aspect_ratio: f32,
    pub fit: FitParams,
}

impl ImageSlot {
    fn pending(source: PathBuf) -> Self {
        Self {
            source,
            aspect_ratio: 1.0,
            fit: FitParams::IDENTITY,
        }
    }
}

/// Owns the ordered playlist, the two live slots and the load-request
/// generation counter.
///
/// `current_index` advances exactly once per completed transition, modulo
/// the playlist length. The generation counter keys in-flight decode
/// requests: a reply whose generation no longer matches is stale and must be
/// discarded instead of applied.
pub struct SliderSession {
    sources: Vec<PathBuf>,
    current_index: usize,
    generation: u64,
    current: ImageSlot,
    next: ImageSlot,
}

impl SliderSession {
    pub fn new(sources: Vec<PathBuf>) -> Result<Self, Error> {
        let first = sources.first().cloned().ok_or(Error::EmptyPlaylist)?;
        let second = sources[1 % sources.len()].clone();
        Ok(Self {
            sources,
            current_index: 0,
            generation: 0,
            current: ImageSlot::pending(first),
            next: ImageSlot::pending(second),
        })
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn current(&self) -> &ImageSlot {
        &self.current
    }

    pub fn next(&self) -> &ImageSlot {
        &self.next
    }

    /// Source for the slide that becomes `next` after an advance.
    fn upcoming_source(&self) -> &Path {
        &self.sources[(self.current_index + 2) % self.sources.len()]
    }

    /// Rotates the playlist after a completed transition: next becomes
    /// current, a fresh pending slot takes its place, and the generation is
    /// bumped so replies for the old pair become stale.
    ///
    /// Returns the generation that keys the decode request for the new next
    /// slide.
    pub fn advance(&mut self) -> u64 {
        let upcoming = self.upcoming_source().to_path_buf();
        self.current = std::mem::replace(&mut self.next, ImageSlot::pending(upcoming));
        self.current_index = (self.current_index + 1) % self.sources.len();
        self.generation += 1;
        self.generation
    }

    /// Applies a resolved aspect ratio to a slot, unless the reply is stale.
    /// Returns whether the reply was applied. The map slot never rotates, so
    /// its reply is accepted regardless of how many advances it took to
    /// decode.
    pub fn resolve_aspect(&mut self, slot: SlotId, generation: u64, aspect_ratio: f32) -> bool {
        let slot = match slot {
            SlotId::Map => return true,
            _ if generation != self.generation => return false,
            SlotId::Current => &mut self.current,
            SlotId::Next => &mut self.next,
        };
        slot.aspect_ratio = aspect_ratio;
        true
    }

    /// Recomputes fit parameters for both live slots against the viewport
    /// aspect ratio. Called after any aspect resolution or viewport resize.
    pub fn refit(&mut self, container_ar: f32) {
        self.current.fit = crate::fit::fit(self.current.aspect_ratio, container_ar);
        self.next.fit = crate::fit::fit(self.next.aspect_ratio, container_ar);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources(n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("img-{i}.jpg"))).collect()
    }

    #[test]
    fn empty_playlist_is_rejected() {
        assert!(matches!(
            SliderSession::new(Vec::new()),
            Err(Error::EmptyPlaylist)
        ));
    }

    #[test]
    fn index_advances_modulo_length() {
        let mut session = SliderSession::new(sources(3)).unwrap();
        for k in 1..=7 {
            session.advance();
            assert_eq!(session.current_index(), k % 3);
        }
    }

    #[test]
    fn single_image_cycles_to_itself() {
        let mut session = SliderSession::new(sources(1)).unwrap();
        assert_eq!(session.current().source, session.next().source);
        session.advance();
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.next().source, PathBuf::from("img-0.jpg"));
    }

    #[test]
    fn advance_promotes_next_slot() {
        let mut session = SliderSession::new(sources(3)).unwrap();
        session.resolve_aspect(SlotId::Next, 0, 2.0);
        session.advance();
        assert!((session.current().aspect_ratio - 2.0).abs() < f32::EPSILON);
        // The fresh next slot starts over at the square default.
        assert!((session.next().aspect_ratio - 1.0).abs() < f32::EPSILON);
        assert_eq!(session.next().source, PathBuf::from("img-2.jpg"));
    }

    #[test]
    fn stale_generation_is_discarded() {
        let mut session = SliderSession::new(sources(3)).unwrap();
        let stale = session.generation();
        session.advance();
        assert!(!session.resolve_aspect(SlotId::Next, stale, 2.0));
        assert!((session.next().aspect_ratio - 1.0).abs() < f32::EPSILON);
        assert!(session.resolve_aspect(SlotId::Next, session.generation(), 2.0));
    }

    #[test]
    fn map_reply_survives_an_advance() {
        // The map is requested once at startup; a decode that finishes after
        // the playlist has rotated must still be accepted.
        let mut session = SliderSession::new(sources(3)).unwrap();
        let startup = session.generation();
        session.advance();
        assert!(session.resolve_aspect(SlotId::Map, startup, 1.5));
        // Live slots still reject the stale generation.
        assert!(!session.resolve_aspect(SlotId::Next, startup, 1.5));
    }

    #[test]
    fn refit_tracks_both_slots() {
        let mut session = SliderSession::new(sources(2)).unwrap();
        session.resolve_aspect(SlotId::Current, 0, 2.0);
        session.resolve_aspect(SlotId::Next, 0, 0.5);
        session.refit(1.0);
        assert!((session.current().fit.scale_x - 0.5).abs() < f32::EPSILON);
        assert!((session.next().fit.scale_y - 0.5).abs() < f32::EPSILON);
    }
}
