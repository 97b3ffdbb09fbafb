use std::sync::Arc;
use std::time::Duration;

/// A single captured video frame: contiguous pixel bytes in row-major order.
///
/// The blink pipeline never looks at pixels itself; they are handed to the
/// landmark detector as-is. `index` is the monotonically increasing sequence
/// number assigned by the frame source and `timestamp` the capture time
/// relative to the start of the stream.
///
/// Pixels are shared, so cloning a frame never copies the buffer.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Arc<[u8]>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
    timestamp: Duration,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data: data.into(),
            width,
            height,
            channels,
            index,
            timestamp: Duration::ZERO,
        }
    }

    pub fn with_timestamp(mut self, timestamp: Duration) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn timestamp(&self) -> Duration {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 3, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.data(), &data[..]);
        assert_eq!(frame.timestamp(), Duration::ZERO);
    }

    #[test]
    fn test_with_timestamp() {
        let frame = Frame::new(vec![0u8; 4], 2, 2, 1, 0).with_timestamp(Duration::from_millis(33));
        assert_eq!(frame.timestamp(), Duration::from_millis(33));
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        let data = vec![0u8; 10]; // wrong size for 2x2x3
        Frame::new(data, 2, 2, 3, 0);
    }

    #[test]
    fn test_clone_shares_pixels() {
        let frame = Frame::new(vec![7u8; 16], 4, 4, 1, 0);
        let copy = frame.clone();
        assert!(std::ptr::eq(frame.data().as_ptr(), copy.data().as_ptr()));
        assert_eq!(copy.data(), frame.data());
    }
}
