/// Codec trait for classifying newline-delimited records
///
/// The framing itself (buffering partial lines across chunk boundaries) lives
/// in [`FrameParser`]; a codec only sees complete lines.
pub trait LineCodec: Send + Sync + 'static {
    /// The type representing classified records from this stream
    type Record: Send;

    /// Classify one complete line
    ///
    /// # Arguments
    /// * `line` - The raw line with its terminator removed
    fn decode_line(&self, line: &[u8]) -> Self::Record;
}

/// Incremental newline framer
///
/// Chunk boundaries may fall anywhere, including inside a record or between
/// `\r` and `\n`; only bytes up to and including a `\n` are ever handed to
/// the codec.
#[derive(Debug)]
pub struct FrameParser<C: LineCodec> {
    codec: C,
    buffer: Vec<u8>,
    /// Prefix of `buffer` already known to hold no `\n`
    scanned: usize,
}

impl<C: LineCodec> FrameParser<C> {
    pub fn new(codec: C) -> Self {
        Self {
            codec,
            buffer: Vec::new(),
            scanned: 0,
        }
    }

    /// Feed a chunk and return every record completed by it, in line order
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<C::Record> {
        if chunk.is_empty() {
            return Vec::new();
        }

        self.buffer.extend_from_slice(chunk);

        let mut records = Vec::new();
        let mut start = 0;
        let mut search_from = self.scanned;
        while let Some(offset) = self.buffer[search_from..].iter().position(|&b| b == b'\n') {
            let end = search_from + offset;
            let line = strip_carriage_return(&self.buffer[start..end]);
            records.push(self.codec.decode_line(line));
            start = end + 1;
            search_from = start;
        }
        self.buffer.drain(..start);
        self.scanned = self.buffer.len();

        records
    }

    /// Take the trailing unterminated line, leaving the buffer empty
    pub fn take_partial(&mut self) -> Vec<u8> {
        self.scanned = 0;
        std::mem::take(&mut self.buffer)
    }

    /// Size of the partial line currently held back
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }
}

fn strip_carriage_return(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}
