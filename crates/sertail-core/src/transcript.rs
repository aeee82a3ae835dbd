use std::time::Instant;

use crate::encoding::TextEncoding;

/// One received chunk, stamped with its offset from capture start.
#[derive(Debug, Clone)]
pub struct Entry {
    pub offset_ms: u64,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    pub show_timestamp: bool,
    pub show_hex: bool,
    pub encoding: TextEncoding,
}

impl Entry {
    pub fn render(&self, opts: &RenderOptions) -> String {
        let mut line = String::new();
        if opts.show_timestamp {
            let secs = self.offset_ms / 1000;
            let millis = self.offset_ms % 1000;
            line.push_str(&format!("[{secs:5}.{millis:03}] "));
        }
        if opts.show_hex {
            for (i, byte) in self.data.iter().enumerate() {
                if i > 0 {
                    line.push(' ');
                }
                line.push_str(&format!("{byte:02X}"));
            }
        } else {
            line.push_str(&opts.encoding.decode(&self.data));
        }
        line
    }
}

/// Bounded in-memory record of everything received this session.
pub struct Transcript {
    started: Instant,
    entries: Vec<Entry>,
    max_entries: usize,
}

impl Transcript {
    pub fn new(max_entries: usize) -> Self {
        Self {
            started: Instant::now(),
            entries: Vec::new(),
            max_entries,
        }
    }

    /// Record a chunk, evicting the oldest entry past the cap, and return
    /// the stored entry for rendering.
    pub fn push(&mut self, data: Vec<u8>) -> &Entry {
        let offset_ms = self.started.elapsed().as_millis() as u64;
        self.entries.push(Entry { offset_ms, data });
        if self.entries.len() > self.max_entries {
            self.entries.remove(0);
        }
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn to_text(&self, opts: &RenderOptions) -> String {
        let mut result = String::new();
        for entry in &self.entries {
            result.push_str(&entry.render(opts));
            result.push('\n');
        }
        result
    }
}
