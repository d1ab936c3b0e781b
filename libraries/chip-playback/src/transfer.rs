//! Bounded transfer buffer between the render thread and the audio callback
//!
//! A fixed-capacity circular frame queue with asymmetric blocking behavior:
//! the producing render thread may wait for space, the consuming hardware
//! callback never waits for data. The callback's critical section is a short
//! memcpy under the mutex; the producer parks on a condvar while the buffer
//! is full and is woken by every take.

use chip_core::Frame;
use std::sync::{Condvar, Mutex};

/// Bounded SPSC frame queue bridging rendering and hardware playback
///
/// `put` blocks while full; `take` reads what exists and treats shortfall as
/// silence so the audio driver is never stalled; `clear` resets both cursors
/// atomically with respect to the other side.
pub struct TransferBuffer {
    inner: Mutex<Inner>,
    space_available: Condvar,
}

struct Inner {
    buf: Vec<Frame>,
    /// Index of the oldest stored frame
    read: usize,
    /// Number of stored frames
    len: usize,
}

impl Inner {
    fn capacity(&self) -> usize {
        self.buf.len()
    }

    fn free(&self) -> usize {
        self.capacity() - self.len
    }

    /// Copy `frames` in at the write cursor; caller guarantees capacity
    fn push(&mut self, frames: &[Frame]) {
        let capacity = self.capacity();
        let mut write = (self.read + self.len) % capacity;
        for &frame in frames {
            self.buf[write] = frame;
            write = (write + 1) % capacity;
        }
        self.len += frames.len();
    }

    /// Copy up to `out.len()` frames out; returns the number copied
    fn pop(&mut self, out: &mut [Frame]) -> usize {
        let count = out.len().min(self.len);
        let capacity = self.capacity();
        for slot in out.iter_mut().take(count) {
            *slot = self.buf[self.read];
            self.read = (self.read + 1) % capacity;
        }
        self.len -= count;
        count
    }
}

impl TransferBuffer {
    /// Create a buffer holding `capacity` frames
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "transfer buffer capacity must be non-zero");
        Self {
            inner: Mutex::new(Inner {
                buf: vec![Frame::SILENCE; capacity],
                read: 0,
                len: 0,
            }),
            space_available: Condvar::new(),
        }
    }

    /// Total frame capacity
    pub fn capacity(&self) -> usize {
        self.inner.lock().unwrap().capacity()
    }

    /// Number of frames currently buffered
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len
    }

    /// Whether the buffer holds no frames
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append all of `frames`, blocking while the buffer is full
    ///
    /// Writes in chunks as capacity frees up, so slices larger than the
    /// buffer itself are legal. Called only from the render thread.
    pub fn put(&self, frames: &[Frame]) {
        let mut remaining = frames;
        let mut inner = self.inner.lock().unwrap();
        while !remaining.is_empty() {
            while inner.free() == 0 {
                inner = self.space_available.wait(inner).unwrap();
            }
            let chunk = remaining.len().min(inner.free());
            inner.push(&remaining[..chunk]);
            remaining = &remaining[chunk..];
        }
    }

    /// Fill `out` from the buffer, zero-filling any shortfall
    ///
    /// Never waits: invoked from the hardware callback context, where a
    /// stall would be an audible glitch.
    pub fn take(&self, out: &mut [Frame]) {
        let read = {
            let mut inner = self.inner.lock().unwrap();
            inner.pop(out)
        };
        for slot in &mut out[read..] {
            *slot = Frame::SILENCE;
        }
        self.space_available.notify_one();
    }

    /// Fill an interleaved stereo f32 slice, zero-filling any shortfall
    ///
    /// Convenience for hardware callbacks handing out raw `[L, R, L, R, ..]`
    /// buffers; an odd trailing sample is zeroed.
    pub fn take_interleaved(&self, out: &mut [f32]) {
        let frames = out.len() / 2;
        let read = {
            let mut inner = self.inner.lock().unwrap();
            let count = frames.min(inner.len);
            let capacity = inner.capacity();
            for i in 0..count {
                let frame = inner.buf[inner.read];
                inner.read = (inner.read + 1) % capacity;
                out[i * 2] = frame.left;
                out[i * 2 + 1] = frame.right;
            }
            inner.len -= count;
            count
        };
        for sample in &mut out[read * 2..] {
            *sample = 0.0;
        }
        self.space_available.notify_one();
    }

    /// Drop all buffered frames
    ///
    /// Used when stopping playback so stale audio is not replayed on the
    /// next start. A producer blocked in `put` observes the freed capacity
    /// and completes.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.read = 0;
        inner.len = 0;
        self.space_available.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(v: f32) -> Frame {
        Frame::new(v, -v)
    }

    #[test]
    fn fifo_order() {
        let buffer = TransferBuffer::new(8);
        buffer.put(&[frame(1.0), frame(2.0), frame(3.0)]);

        let mut out = [Frame::SILENCE; 3];
        buffer.take(&mut out);
        assert_eq!(out, [frame(1.0), frame(2.0), frame(3.0)]);
    }

    #[test]
    fn shortfall_is_silence() {
        let buffer = TransferBuffer::new(8);
        buffer.put(&[frame(1.0)]);

        let mut out = [frame(9.0); 4];
        buffer.take(&mut out);
        assert_eq!(out[0], frame(1.0));
        assert_eq!(&out[1..], &[Frame::SILENCE; 3]);
    }

    #[test]
    fn take_on_empty_returns_immediately() {
        let buffer = TransferBuffer::new(8);
        let mut out = [frame(9.0); 8];
        buffer.take(&mut out);
        assert_eq!(out, [Frame::SILENCE; 8]);
    }

    #[test]
    fn wraps_around_capacity() {
        let buffer = TransferBuffer::new(4);
        buffer.put(&[frame(1.0), frame(2.0), frame(3.0)]);

        let mut out = [Frame::SILENCE; 2];
        buffer.take(&mut out);
        assert_eq!(out, [frame(1.0), frame(2.0)]);

        // Write cursor wraps past the end of the backing store
        buffer.put(&[frame(4.0), frame(5.0), frame(6.0)]);
        let mut out = [Frame::SILENCE; 4];
        buffer.take(&mut out);
        assert_eq!(out, [frame(3.0), frame(4.0), frame(5.0), frame(6.0)]);
    }

    #[test]
    fn clear_empties_buffer() {
        let buffer = TransferBuffer::new(4);
        buffer.put(&[frame(1.0), frame(2.0)]);
        buffer.clear();
        assert!(buffer.is_empty());

        let mut out = [frame(9.0); 2];
        buffer.take(&mut out);
        assert_eq!(out, [Frame::SILENCE; 2]);
    }

    #[test]
    fn interleaved_take_matches_frames() {
        let buffer = TransferBuffer::new(8);
        buffer.put(&[frame(0.25), frame(0.5)]);

        let mut out = [9.0f32; 6];
        buffer.take_interleaved(&mut out);
        assert_eq!(out, [0.25, -0.25, 0.5, -0.5, 0.0, 0.0]);
    }

    #[test]
    fn put_blocks_until_space() {
        use std::sync::Arc;
        use std::thread;
        use std::time::Duration;

        let buffer = Arc::new(TransferBuffer::new(4));
        buffer.put(&[frame(1.0); 4]);

        let producer = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || {
                // Blocks: the buffer is full until the consumer takes
                buffer.put(&[frame(2.0); 4]);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!producer.is_finished());

        let mut out = [Frame::SILENCE; 4];
        buffer.take(&mut out);
        assert_eq!(out, [frame(1.0); 4]);

        producer.join().unwrap();
        let mut out = [Frame::SILENCE; 4];
        buffer.take(&mut out);
        assert_eq!(out, [frame(2.0); 4]);
    }

    #[test]
    fn oversized_put_streams_through() {
        use std::sync::Arc;
        use std::thread;

        let buffer = Arc::new(TransferBuffer::new(4));
        // Non-zero values, so shortfall silence is distinguishable
        let frames: Vec<Frame> = (1..=64).map(|i| frame(i as f32)).collect();

        let producer = {
            let buffer = Arc::clone(&buffer);
            let frames = frames.clone();
            thread::spawn(move || buffer.put(&frames))
        };

        let mut collected = Vec::new();
        while collected.len() < frames.len() {
            let mut out = [Frame::SILENCE; 3];
            buffer.take(&mut out);
            collected.extend(out.into_iter().filter(|f| *f != Frame::SILENCE));
        }
        producer.join().unwrap();
        assert_eq!(collected, frames);
    }
}
