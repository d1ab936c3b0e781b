//! Property tests for the transfer buffer
//!
//! FIFO integrity: for any sequence of puts and a compatible sequence of
//! takes, the frames coming out equal the frames going in, in order, delayed
//! only by buffering.

use chip_core::Frame;
use chip_playback::TransferBuffer;
use proptest::prelude::*;
use std::collections::VecDeque;

fn frame(value: u32) -> Frame {
    // Distinct, never-silent payload per sequence number
    Frame::new(value as f32 + 1.0, -(value as f32 + 1.0))
}

proptest! {
    #[test]
    fn takes_return_puts_in_order(
        chunk_lens in prop::collection::vec(1usize..50, 1..20),
        take_len in 1usize..64,
    ) {
        let total: usize = chunk_lens.iter().sum();
        // Capacity covers every put, so the single-threaded producer
        // never blocks
        let buffer = TransferBuffer::new(total);

        let mut next = 0u32;
        let mut expected = Vec::new();
        for len in &chunk_lens {
            let chunk: Vec<Frame> = (0..*len).map(|_| {
                let f = frame(next);
                next += 1;
                f
            }).collect();
            expected.extend_from_slice(&chunk);
            buffer.put(&chunk);
        }

        let mut collected = Vec::new();
        while collected.len() < total {
            let mut out = vec![Frame::SILENCE; take_len];
            buffer.take(&mut out);
            let remaining = total - collected.len();
            let real = remaining.min(take_len);
            collected.extend_from_slice(&out[..real]);
            // Shortfall past the buffered data must be silence
            for f in &out[real..] {
                prop_assert_eq!(*f, Frame::SILENCE);
            }
        }
        prop_assert_eq!(collected, expected);
    }

    #[test]
    fn interleaved_ops_match_queue_model(
        ops in prop::collection::vec((any::<bool>(), 1usize..16), 1..200),
    ) {
        const CAPACITY: usize = 32;
        let buffer = TransferBuffer::new(CAPACITY);
        let mut model: VecDeque<Frame> = VecDeque::new();
        let mut next = 0u32;

        for (is_put, len) in ops {
            if is_put {
                // Clamp to free space so a single-threaded put cannot block
                let len = len.min(CAPACITY - model.len());
                if len == 0 {
                    continue;
                }
                let chunk: Vec<Frame> = (0..len).map(|_| {
                    let f = frame(next);
                    next += 1;
                    f
                }).collect();
                model.extend(chunk.iter().copied());
                buffer.put(&chunk);
            } else {
                let mut out = vec![Frame::SILENCE; len];
                buffer.take(&mut out);
                for slot in out {
                    let expected = model.pop_front().unwrap_or(Frame::SILENCE);
                    prop_assert_eq!(slot, expected);
                }
            }
        }
        prop_assert_eq!(buffer.len(), model.len());
    }
}
