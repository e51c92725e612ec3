//! Answer rendering: the live output buffer shown while an answer streams.

use crate::decoder::Utf8StreamDecoder;

/// Prefix for transport-level failures shown in place of (or after) an answer.
pub const ERROR_PREFIX: &str = "Sorry, an error occurred: ";

/// How the display expresses paragraph breaks and terminal markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderStyle {
    pub paragraph_break: String,
    pub placeholder: String,
    pub stopped_marker: String,
}

impl RenderStyle {
    pub fn html() -> Self {
        Self {
            paragraph_break: "<br>".to_string(),
            placeholder: "Thinking...".to_string(),
            stopped_marker: "<br><em>Generation stopped.</em>".to_string(),
        }
    }

    pub fn terminal() -> Self {
        Self {
            paragraph_break: "\n".to_string(),
            placeholder: "Thinking...".to_string(),
            stopped_marker: "\n[Generation stopped.]".to_string(),
        }
    }

    pub fn translate(&self, text: &str) -> String {
        text.replace('\n', &self.paragraph_break)
    }
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self::terminal()
    }
}

/// How a terminal message landed in the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Replaced(String),
    Appended(String),
}

/// Append-only answer text until a terminal event.
#[derive(Debug)]
pub struct OutputBuffer {
    style: RenderStyle,
    rendered: String,
    streamed: bool,
    decoder: Utf8StreamDecoder,
}

impl OutputBuffer {
    pub fn new(style: RenderStyle) -> Self {
        Self {
            style,
            rendered: String::new(),
            streamed: false,
            decoder: Utf8StreamDecoder::new(),
        }
    }

    /// Decode one network chunk and append it. Returns the rendered delta.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> String {
        let text = self.decoder.decode(chunk);
        self.append_text(&text)
    }

    /// Flush the decoder once the source signals completion.
    pub fn finish_stream(&mut self) -> String {
        let text = self.decoder.finish();
        self.append_text(&text)
    }

    fn append_text(&mut self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }
        let delta = self.style.translate(text);
        self.rendered.push_str(&delta);
        self.streamed = true;
        delta
    }

    /// Append the stopped marker after whatever has streamed so far.
    pub fn mark_stopped(&mut self) -> &str {
        self.rendered.push_str(&self.style.stopped_marker);
        &self.style.stopped_marker
    }

    /// Show a server-supplied message in place of the answer.
    pub fn replace(&mut self, text: &str) {
        self.rendered = self.style.translate(text);
    }

    /// Render a transport failure. Replaces the buffer when nothing streamed
    /// yet, otherwise appends after the partial answer.
    pub fn fail(&mut self, cause: &str) -> Rendered {
        let message = self.style.translate(&format!("{ERROR_PREFIX}{cause}"));
        if self.streamed {
            let delta = format!("{}{}", self.style.paragraph_break, message);
            self.rendered.push_str(&delta);
            Rendered::Appended(delta)
        } else {
            self.rendered = message.clone();
            Rendered::Replaced(message)
        }
    }

    #[cfg(test)]
    pub fn has_streamed(&self) -> bool {
        self.streamed
    }

    pub fn as_str(&self) -> &str {
        &self.rendered
    }

    pub fn into_string(self) -> String {
        self.rendered
    }
}
