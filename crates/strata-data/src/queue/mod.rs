// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Render Queue
//!
//! A fixed-capacity buffer of draw commands that any number of threads can append
//! to during a frame, without locks, while one consumer reads a fully written prefix.
//!
//! ## Publish protocol
//!
//! Every push goes through three steps:
//!
//! 1. **Claim**: `fetch_add` on the `claimed` counter hands out an exclusive slot
//!    index. An index past capacity is counted as dropped and the push fails.
//! 2. **Write**: the command is stored into the claimed slot. No other thread
//!    touches that slot until the next frame.
//! 3. **Publish**: the slot's readiness marker is set to the current epoch, then the
//!    shared `published` frontier is advanced with a compare-and-swap loop past
//!    every contiguous slot whose marker matches the epoch.
//!
//! [`RenderQueue::size`] returns the frontier, so a reader never sees a slot that
//! is claimed but not yet written, and visibility always follows index order no
//! matter which producer finished first.
//!
//! [`RenderQueue::begin_frame`] takes `&mut self`: starting a frame requires every
//! producer to be done, which the borrow checker enforces.

mod command;
mod sort_key;
mod sprite;

pub use command::{Command, Op, Payload, TextSpan};
pub use sort_key::SortKey;
pub use sprite::SpriteView;

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use strata_core::gfx::Rgba8;
use thiserror::Error;

/// Default number of command slots.
pub const DEFAULT_COMMAND_CAPACITY: usize = 8192;

/// Default size of the per-frame text arena, in bytes.
pub const DEFAULT_TEXT_ARENA_BYTES: usize = 16 * 1024;

/// Why a push was dropped. Drops are counted by the queue and never block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PushError {
    /// Every command slot of this frame is taken.
    #[error("render queue is full")]
    QueueFull,
    /// The text does not fit in what is left of this frame's text arena.
    #[error("text arena is full")]
    TextArenaFull,
}

struct Slot {
    /// Epoch of the frame in which this slot was last published.
    ready: AtomicU64,
    cmd: UnsafeCell<Command>,
}

impl Slot {
    fn new() -> Self {
        Self {
            ready: AtomicU64::new(0),
            cmd: UnsafeCell::new(Command::default()),
        }
    }
}

/// The multi-producer render command queue.
pub struct RenderQueue {
    slots: Box<[Slot]>,
    epoch: u64,
    claimed: AtomicUsize,
    published: AtomicUsize,
    dropped: AtomicUsize,
    text: Box<[UnsafeCell<u8>]>,
    text_offset: AtomicUsize,
    text_dropped: AtomicUsize,
}

// SAFETY: every slot is written by exactly one producer (the one that claimed it)
// and only read after its publication has been observed through `published`.
// Text arena ranges are reserved exclusively by CAS and only read through spans
// created after the bytes were written. `begin_frame` needs `&mut self`.
unsafe impl Sync for RenderQueue {}

impl Default for RenderQueue {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_CAPACITY, DEFAULT_TEXT_ARENA_BYTES)
    }
}

impl RenderQueue {
    /// Allocates a queue with `capacity` command slots and `text_capacity` bytes of
    /// text arena. Nothing is allocated after this.
    pub fn new(capacity: usize, text_capacity: usize) -> Self {
        let slots = (0..capacity).map(|_| Slot::new()).collect();
        let text = (0..text_capacity).map(|_| UnsafeCell::new(0)).collect();
        log::debug!(
            "RenderQueue created: {capacity} command slots, {text_capacity} text bytes."
        );
        Self {
            slots,
            // Slot markers start at 0, so epoch 0 is never current.
            epoch: 1,
            claimed: AtomicUsize::new(0),
            published: AtomicUsize::new(0),
            dropped: AtomicUsize::new(0),
            text,
            text_offset: AtomicUsize::new(0),
            text_dropped: AtomicUsize::new(0),
        }
    }

    /// Starts a new frame: bumps the epoch and resets every counter.
    ///
    /// Commands of the previous frame become invisible. No memory is touched
    /// beyond the counters.
    pub fn begin_frame(&mut self) {
        self.epoch += 1;
        *self.claimed.get_mut() = 0;
        *self.published.get_mut() = 0;
        *self.dropped.get_mut() = 0;
        *self.text_offset.get_mut() = 0;
        *self.text_dropped.get_mut() = 0;
        log::trace!("RenderQueue: frame epoch {}", self.epoch);
    }

    // --- Push protocol ---

    fn claim(&self) -> Result<usize, PushError> {
        let index = self.claimed.fetch_add(1, Ordering::Relaxed);
        if index >= self.slots.len() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return Err(PushError::QueueFull);
        }
        Ok(index)
    }

    /// # Safety
    ///
    /// `index` must have been returned by `claim` during the current frame and not
    /// be written again before the next `begin_frame`.
    unsafe fn write(&self, index: usize, cmd: Command) {
        *self.slots[index].cmd.get() = cmd;
    }

    fn publish(&self, index: usize) {
        // SeqCst on the marker store and on the marker loads below: two producers
        // that each store their own marker and then read the other's must not both
        // miss the other's store, or the frontier could stall short of a ready slot.
        self.slots[index].ready.store(self.epoch, Ordering::SeqCst);

        let mut frontier = self.published.load(Ordering::SeqCst);
        while frontier < self.slots.len()
            && self.slots[frontier].ready.load(Ordering::SeqCst) == self.epoch
        {
            match self.published.compare_exchange_weak(
                frontier,
                frontier + 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => frontier += 1,
                Err(actual) => frontier = actual,
            }
        }
    }

    /// Appends `cmd`. Fails (and counts the drop) when every slot is taken.
    ///
    /// A `Text` payload whose span does not belong to this frame is kept as is
    /// and simply resolves to no text when rasterized.
    pub fn push(&self, cmd: Command) -> Result<(), PushError> {
        let index = self.claim()?;
        // SAFETY: `index` was just claimed by this call and is written once.
        unsafe { self.write(index, cmd) };
        self.publish(index);
        Ok(())
    }

    fn reserve_text(&self, len: usize) -> Result<usize, PushError> {
        let capacity = self.text.len();
        let mut current = self.text_offset.load(Ordering::Relaxed);
        loop {
            let end = match current.checked_add(len) {
                Some(end) if end <= capacity => end,
                _ => {
                    self.text_dropped.fetch_add(1, Ordering::Relaxed);
                    return Err(PushError::TextArenaFull);
                }
            };
            match self.text_offset.compare_exchange_weak(
                current,
                end,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Ok(current),
                Err(actual) => current = actual,
            }
        }
    }

    // --- Push helpers ---

    /// Overwrites the whole target with `color`.
    pub fn clear(&self, color: Rgba8, key: SortKey) -> Result<(), PushError> {
        self.push(Command::new(Op::Clear, color, key))
    }

    /// Writes one pixel.
    pub fn put_pixel(&self, x: i32, y: i32, color: Rgba8, key: SortKey) -> Result<(), PushError> {
        self.push(Command::new(Op::PutPixel, color, key).with_coords(x, y, 0, 0))
    }

    /// Fills the `w` x `h` rectangle at (`x`, `y`).
    pub fn fill_rect(
        &self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        color: Rgba8,
        key: SortKey,
    ) -> Result<(), PushError> {
        self.push(Command::new(Op::FillRect, color, key).with_coords(x, y, w, h))
    }

    /// Fills the `w` x `h` rectangle at (`x`, `y`) with source-over blending.
    pub fn blend_rect(
        &self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        color: Rgba8,
        key: SortKey,
    ) -> Result<(), PushError> {
        self.push(Command::new(Op::BlendRect, color, key).with_coords(x, y, w, h))
    }

    /// Strokes the inner border of the `w` x `h` rectangle at (`x`, `y`).
    #[allow(clippy::too_many_arguments)]
    pub fn rect_outline(
        &self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        thickness: i32,
        color: Rgba8,
        key: SortKey,
    ) -> Result<(), PushError> {
        self.push(
            Command::new(Op::RectOutline, color, key)
                .with_coords(x, y, w, h)
                .with_param(thickness),
        )
    }

    /// Horizontal line from `x0` to `x1` (inclusive) at row `y`.
    pub fn hline(&self, x0: i32, x1: i32, y: i32, color: Rgba8, key: SortKey) -> Result<(), PushError> {
        self.push(Command::new(Op::HLine, color, key).with_coords(x0, y, x1, 0))
    }

    /// Vertical line from `y0` to `y1` (inclusive) at column `x`.
    pub fn vline(&self, x: i32, y0: i32, y1: i32, color: Rgba8, key: SortKey) -> Result<(), PushError> {
        self.push(Command::new(Op::VLine, color, key).with_coords(x, y0, 0, y1))
    }

    /// Line from (`x0`, `y0`) to (`x1`, `y1`), both ends included.
    pub fn line(
        &self,
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        color: Rgba8,
        key: SortKey,
    ) -> Result<(), PushError> {
        self.push(Command::new(Op::Line, color, key).with_coords(x0, y0, x1, y1))
    }

    /// Filled circle of `radius` around (`cx`, `cy`).
    pub fn fill_circle(
        &self,
        cx: i32,
        cy: i32,
        radius: i32,
        color: Rgba8,
        key: SortKey,
    ) -> Result<(), PushError> {
        self.push(
            Command::new(Op::FillCircle, color, key)
                .with_coords(cx, cy, 0, 0)
                .with_param(radius),
        )
    }

    /// One-pixel circle outline of `radius` around (`cx`, `cy`).
    pub fn circle(&self, cx: i32, cy: i32, radius: i32, color: Rgba8, key: SortKey) -> Result<(), PushError> {
        self.push(
            Command::new(Op::Circle, color, key)
                .with_coords(cx, cy, 0, 0)
                .with_param(radius),
        )
    }

    /// Blits `sprite` with its top-left corner at (`x`, `y`), multiplied by `tint`.
    ///
    /// The pixels are not copied; see [`SpriteView`] for the lifetime contract.
    pub fn sprite(
        &self,
        x: i32,
        y: i32,
        sprite: SpriteView,
        tint: Rgba8,
        key: SortKey,
    ) -> Result<(), PushError> {
        self.push(
            Command::new(Op::Sprite, tint, key)
                .with_coords(x, y, 0, 0)
                .with_payload(Payload::Sprite(sprite)),
        )
    }

    /// Draws `text` in the debug font at (`x`, `y`), magnified by `scale`.
    ///
    /// The bytes are copied into the frame's text arena.
    pub fn text(
        &self,
        x: i32,
        y: i32,
        scale: i32,
        text: &str,
        color: Rgba8,
        key: SortKey,
    ) -> Result<(), PushError> {
        let bytes = text.as_bytes();
        let len = u32::try_from(bytes.len()).map_err(|_| {
            self.text_dropped.fetch_add(1, Ordering::Relaxed);
            PushError::TextArenaFull
        })?;
        let offset = self.reserve_text(bytes.len())?;

        if !bytes.is_empty() {
            // SAFETY: `offset..offset + len` was reserved exclusively by this call and
            // lies inside the arena. `UnsafeCell<u8>` has the layout of `u8`.
            unsafe {
                let dst = UnsafeCell::raw_get(self.text.as_ptr().add(offset));
                std::ptr::copy_nonoverlapping(bytes.as_ptr(), dst, bytes.len());
            }
        }

        let span = TextSpan {
            epoch: self.epoch,
            offset: offset as u32,
            len,
        };
        self.push(
            Command::new(Op::Text, color, key)
                .with_coords(x, y, 0, 0)
                .with_param(scale)
                .with_payload(Payload::Text(span)),
        )
    }

    // --- Accessors ---

    /// Number of published commands. Slots `0..size()` are fully written.
    pub fn size(&self) -> usize {
        self.published.load(Ordering::Acquire)
    }

    /// Whether no command is published.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Number of command slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Size of the text arena in bytes.
    pub fn text_capacity(&self) -> usize {
        self.text.len()
    }

    /// Text arena bytes used this frame.
    pub fn text_used(&self) -> usize {
        self.text_offset.load(Ordering::Relaxed).min(self.text.len())
    }

    /// The current frame epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Push attempts this frame, including dropped ones.
    pub fn claimed(&self) -> usize {
        self.claimed.load(Ordering::Relaxed)
    }

    /// Pushes dropped this frame because every slot was taken.
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Text pushes dropped this frame because the arena was full.
    pub fn text_dropped(&self) -> usize {
        self.text_dropped.load(Ordering::Relaxed)
    }

    /// The published command at `index`.
    pub fn get(&self, index: usize) -> Option<Command> {
        if index >= self.size() {
            return None;
        }
        // SAFETY: `index < published`, so the slot was written before its marker
        // was stored, and the acquire load of `published` orders that write before
        // this read. No producer writes a published slot again this frame.
        Some(unsafe { *self.slots[index].cmd.get() })
    }

    /// Iterates over the commands published when the call is made, in index order.
    pub fn iter(&self) -> impl Iterator<Item = Command> + '_ {
        let size = self.size();
        // SAFETY: as in `get`, every index below a loaded frontier is published.
        (0..size).map(move |i| unsafe { *self.slots[i].cmd.get() })
    }

    /// The arena bytes of a `Text` command from this frame.
    pub fn text_payload(&self, cmd: &Command) -> Option<&[u8]> {
        let Payload::Text(span) = cmd.payload else {
            return None;
        };
        if span.epoch != self.epoch {
            return None;
        }
        let offset = span.offset as usize;
        let len = span.len as usize;
        if offset.checked_add(len)? > self.text.len() {
            return None;
        }
        if len == 0 {
            return Some(&[]);
        }
        // SAFETY: spans are only created after their bytes are written, and a range
        // is never written twice within one epoch. The span reached this thread by
        // some synchronizing path, which orders the write before this read.
        Some(unsafe {
            std::slice::from_raw_parts(UnsafeCell::raw_get(self.text.as_ptr().add(offset)), len)
        })
    }

    /// The sprite view of a `Sprite` command.
    pub fn sprite_payload(&self, cmd: &Command) -> Option<SpriteView> {
        match cmd.payload {
            Payload::Sprite(view) => Some(view),
            _ => None,
        }
    }
}

impl std::fmt::Debug for RenderQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderQueue")
            .field("epoch", &self.epoch)
            .field("size", &self.size())
            .field("capacity", &self.capacity())
            .field("dropped", &self.dropped())
            .field("text_used", &self.text_used())
            .field("text_dropped", &self.text_dropped())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(order: u16) -> SortKey {
        SortKey::new(0, order, 0)
    }

    #[test]
    fn test_pushes_are_visible_in_index_order() {
        let queue = RenderQueue::new(8, 0);
        queue.clear(Rgba8::BLACK, key(0)).unwrap();
        queue.put_pixel(1, 2, Rgba8::RED, key(1)).unwrap();
        queue.fill_rect(0, 0, 4, 3, Rgba8::BLUE, key(2)).unwrap();

        assert_eq!(queue.size(), 3);
        let ops: Vec<Op> = queue.iter().map(|c| c.op).collect();
        assert_eq!(ops, vec![Op::Clear, Op::PutPixel, Op::FillRect]);

        let rect = queue.get(2).unwrap();
        assert_eq!((rect.x0, rect.y0, rect.x1, rect.y1), (0, 0, 4, 3));
        assert_eq!(rect.rgba(), Rgba8::BLUE);
        assert!(queue.get(3).is_none());
    }

    #[test]
    fn test_overflow_drops_and_counts() {
        let queue = RenderQueue::new(4, 0);
        let results: Vec<_> = (0..6).map(|i| queue.put_pixel(i, 0, Rgba8::WHITE, key(0))).collect();

        assert!(results[..4].iter().all(Result::is_ok));
        assert_eq!(results[4], Err(PushError::QueueFull));
        assert_eq!(results[5], Err(PushError::QueueFull));
        assert_eq!(queue.size(), 4);
        assert_eq!(queue.dropped(), 2);
        assert_eq!(queue.claimed(), 6);
    }

    #[test]
    fn test_begin_frame_resets_counters() {
        let mut queue = RenderQueue::new(2, 4);
        let first_epoch = queue.epoch();
        for _ in 0..3 {
            let _ = queue.clear(Rgba8::BLACK, key(0));
        }
        let _ = queue.text(0, 0, 1, "too long", Rgba8::WHITE, key(0));
        assert_eq!(queue.dropped(), 1);
        assert_eq!(queue.text_dropped(), 1);

        queue.begin_frame();

        assert_eq!(queue.epoch(), first_epoch + 1);
        assert_eq!(queue.size(), 0);
        assert_eq!(queue.claimed(), 0);
        assert_eq!(queue.dropped(), 0);
        assert_eq!(queue.text_dropped(), 0);
        assert_eq!(queue.text_used(), 0);
        assert!(queue.get(0).is_none());
    }

    #[test]
    fn test_frontier_waits_for_contiguous_slots() {
        let queue = RenderQueue::new(4, 0);
        let a = queue.claim().unwrap();
        let b = queue.claim().unwrap();
        assert_eq!((a, b), (0, 1));

        // Slot 1 finishes first: nothing is visible yet.
        unsafe { queue.write(b, Command::new(Op::PutPixel, Rgba8::RED, key(1))) };
        queue.publish(b);
        assert_eq!(queue.size(), 0);

        // Slot 0 completes the run; the frontier moves past both.
        unsafe { queue.write(a, Command::new(Op::Clear, Rgba8::BLACK, key(0))) };
        queue.publish(a);
        assert_eq!(queue.size(), 2);
        assert_eq!(queue.get(0).unwrap().op, Op::Clear);
    }

    #[test]
    fn test_stale_markers_are_not_ready() {
        let mut queue = RenderQueue::new(2, 0);
        queue.clear(Rgba8::BLACK, key(0)).unwrap();
        queue.clear(Rgba8::BLACK, key(0)).unwrap();
        queue.begin_frame();

        // Slot 0 still carries last frame's marker; publishing slot 1 alone must
        // not expose it.
        let a = queue.claim().unwrap();
        let b = queue.claim().unwrap();
        unsafe { queue.write(b, Command::new(Op::PutPixel, Rgba8::RED, key(0))) };
        queue.publish(b);
        assert_eq!(queue.size(), 0);

        unsafe { queue.write(a, Command::new(Op::PutPixel, Rgba8::RED, key(0))) };
        queue.publish(a);
        assert_eq!(queue.size(), 2);
    }

    #[test]
    fn test_text_is_copied_into_arena() {
        let queue = RenderQueue::new(4, 8);
        let mut owned = String::from("hello");
        queue.text(1, 2, 2, &owned, Rgba8::GREEN, key(0)).unwrap();
        owned.clear();

        let cmd = queue.get(0).unwrap();
        assert_eq!(cmd.op, Op::Text);
        assert_eq!(cmd.param, 2);
        assert_eq!(queue.text_payload(&cmd), Some(&b"hello"[..]));
        assert_eq!(queue.text_used(), 5);

        assert_eq!(
            queue.text(0, 0, 1, "world", Rgba8::GREEN, key(0)),
            Err(PushError::TextArenaFull)
        );
        assert_eq!(queue.text_dropped(), 1);
        // The failed text never claimed a slot.
        assert_eq!(queue.size(), 1);
        assert_eq!(queue.dropped(), 0);
    }

    #[test]
    fn test_text_span_from_previous_frame_resolves_to_nothing() {
        let mut queue = RenderQueue::new(4, 16);
        queue.text(0, 0, 1, "old", Rgba8::WHITE, key(0)).unwrap();
        let old = queue.get(0).unwrap();

        queue.begin_frame();
        queue.text(0, 0, 1, "new", Rgba8::WHITE, key(0)).unwrap();

        assert_eq!(queue.text_payload(&old), None);
        let fresh = queue.get(0).unwrap();
        assert_eq!(queue.text_payload(&fresh), Some(&b"new"[..]));
    }

    #[test]
    fn test_sprite_payload_is_not_copied() {
        static PIXELS: [u32; 4] = [1, 2, 3, 4];
        let view = SpriteView::from_static(&PIXELS, 2, 2, 2).unwrap();
        let queue = RenderQueue::new(2, 0);
        queue.sprite(5, 6, view, Rgba8::WHITE, key(0)).unwrap();

        let cmd = queue.get(0).unwrap();
        let got = queue.sprite_payload(&cmd).unwrap();
        assert_eq!(got, view);
        assert_eq!(got.row(1), Some(&PIXELS[2..4]));
        assert!(queue.text_payload(&cmd).is_none());
    }
}
