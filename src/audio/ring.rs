use std::sync::Mutex;

/// Fixed-capacity sample store, overwritten from the oldest end once full.
///
/// The capture pump writes continuously for the whole session; clip
/// extraction reads the trailing `n` samples behind the current write head.
/// There is exactly one writer and one concurrent reader. The lock is held
/// only for the duration of a single write or extraction, and correctness
/// of extraction additionally relies on the capacity (ten minutes of audio)
/// vastly exceeding any single clip: a writer that laps an in-progress
/// extraction would corrupt it, but cannot catch up within one lock hold.
pub struct SampleRing {
    inner: Mutex<RingState>,
    capacity: usize,
}

struct RingState {
    /// Zero-initialized backing store, length == capacity. Reads that
    /// precede a full fill therefore return silence.
    samples: Vec<i16>,
    /// Total samples ever written; the write head is this value reduced
    /// modulo capacity.
    total_written: u64,
}

impl SampleRing {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring capacity must be nonzero");
        Self {
            inner: Mutex::new(RingState {
                samples: vec![0i16; capacity],
                total_written: 0,
            }),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total samples ever written through this ring.
    pub fn total_written(&self) -> u64 {
        self.inner.lock().unwrap().total_written
    }

    /// Append samples, overwriting the oldest data once the ring is full.
    pub fn write(&self, data: &[i16]) {
        if data.is_empty() {
            return;
        }
        let cap = self.capacity;
        let mut state = self.inner.lock().unwrap();

        // A single write larger than the ring keeps only its trailing
        // window; the head still advances by the full length.
        let keep = if data.len() > cap {
            &data[data.len() - cap..]
        } else {
            data
        };
        let skipped = (data.len() - keep.len()) as u64;

        let start = ((state.total_written + skipped) % cap as u64) as usize;
        let first = keep.len().min(cap - start);
        state.samples[start..start + first].copy_from_slice(&keep[..first]);
        let rest = keep.len() - first;
        if rest > 0 {
            state.samples[..rest].copy_from_slice(&keep[first..]);
        }
        state.total_written += data.len() as u64;
    }

    /// The last `n` samples ending at the current write head, in
    /// chronological order. `n` larger than the capacity is clamped.
    pub fn tail(&self, n: usize) -> Vec<i16> {
        let cap = self.capacity;
        let n = n.min(cap);
        if n == 0 {
            return Vec::new();
        }
        let state = self.inner.lock().unwrap();

        let head = (state.total_written % cap as u64) as usize;
        let start = (head + cap - n) % cap;
        let mut out = Vec::with_capacity(n);
        if start + n <= cap {
            // Contiguous read.
            out.extend_from_slice(&state.samples[start..start + n]);
        } else {
            // Wraparound: tail segment first, then the head segment.
            out.extend_from_slice(&state.samples[start..cap]);
            out.extend_from_slice(&state.samples[..n - (cap - start)]);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_before_full_fill_returns_silence_prefix() {
        let ring = SampleRing::new(8);
        ring.write(&[1, 2, 3]);

        assert_eq!(ring.tail(5), vec![0, 0, 1, 2, 3]);
    }

    #[test]
    fn tail_reads_across_the_boundary_in_order() {
        let ring = SampleRing::new(8);
        ring.write(&[1, 2, 3, 4, 5, 6]);
        ring.write(&[7, 8, 9, 10]); // head wraps past the end

        assert_eq!(ring.tail(6), vec![5, 6, 7, 8, 9, 10]);
    }

    #[test]
    fn tail_equal_to_capacity_returns_whole_window() {
        let ring = SampleRing::new(4);
        ring.write(&[1, 2, 3, 4, 5]);

        assert_eq!(ring.tail(4), vec![2, 3, 4, 5]);
    }

    #[test]
    fn tail_clamps_to_capacity() {
        let ring = SampleRing::new(4);
        ring.write(&[1, 2, 3, 4]);

        assert_eq!(ring.tail(100), vec![1, 2, 3, 4]);
    }

    #[test]
    fn oversized_write_keeps_trailing_window() {
        let ring = SampleRing::new(4);
        ring.write(&[1, 2, 3, 4, 5, 6, 7, 8, 9]);

        assert_eq!(ring.total_written(), 9);
        assert_eq!(ring.tail(4), vec![6, 7, 8, 9]);
    }

    #[test]
    fn write_after_many_laps_stays_consistent() {
        let ring = SampleRing::new(16);
        for chunk_start in (0..160).step_by(10) {
            let chunk: Vec<i16> = (chunk_start..chunk_start + 10).collect();
            ring.write(&chunk);
        }

        assert_eq!(ring.total_written(), 160);
        assert_eq!(ring.tail(4), vec![156, 157, 158, 159]);
    }
}
