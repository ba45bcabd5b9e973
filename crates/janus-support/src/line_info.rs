/// Line break information for a source buffer, recorded as the offsets of
/// the first character of each line.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct LineInfo {
    breaks: Vec<usize>,
}

impl LineInfo {
    pub fn new() -> LineInfo {
        LineInfo { breaks: vec![0] }
    }

    pub fn from_str(text: &str) -> LineInfo {
        let mut info = LineInfo::new();
        let bytes = text.as_bytes();
        let len = bytes.len();
        let mut cursor = 0;
        while cursor < len {
            match bytes[cursor] {
                b'\n' => {
                    cursor += 1;
                    info.breaks.push(cursor);
                }
                b'\r' => {
                    cursor += 1;
                    if cursor < len && bytes[cursor] == b'\n' {
                        cursor += 1;
                    }
                    info.breaks.push(cursor);
                }
                _ => {
                    cursor += 1;
                }
            }
        }
        info
    }

    /// The 1-based (line, column) of a byte offset.
    pub fn loc(&self, offset: usize) -> (usize, usize) {
        let line = match self.breaks.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        (line + 1, offset - self.breaks[line] + 1)
    }
}

impl Default for LineInfo {
    fn default() -> Self {
        LineInfo::new()
    }
}
