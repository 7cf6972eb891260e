use std::io::{self, BufRead, BufReader, Read};

/// Yields the logical lines of a byte stream.
///
/// A line longer than the reader's internal buffer is reassembled before it
/// is returned. Line terminators (`\n` or `\r\n`) are stripped, empty lines
/// are yielded as empty strings and a final line without terminator is still
/// returned. Bytes are decoded lossily so that locale-specific tool output
/// never aborts a parse.
pub struct LineSource<R> {
    reader: R,
    buf: Vec<u8>,
    finished: bool,
}

impl<R: Read> LineSource<BufReader<R>> {
    pub fn from_reader(reader: R) -> Self {
        Self::new(BufReader::new(reader))
    }
}

impl<R: BufRead> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            finished: false,
        }
    }
}

impl<R: BufRead> Iterator for LineSource<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => {
                self.finished = true;
                None
            }
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                    if self.buf.last() == Some(&b'\r') {
                        self.buf.pop();
                    }
                }
                Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()))
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}
