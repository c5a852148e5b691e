//! Incremental decoder for `data: {json}` event-stream lines.

/// Buffers partial lines across body chunks.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one body chunk, returning the text fragments of every line it
    /// completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut fragments = Vec::new();
        while let Some(end) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=end).collect();
            if let Some(text) = decode_line(&String::from_utf8_lossy(&line)) {
                fragments.push(text);
            }
        }
        fragments
    }

    /// Decode a trailing line the body closed without terminating.
    pub fn finish(self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        decode_line(&String::from_utf8_lossy(&self.buffer))
    }
}

/// Non-empty `choices[0].text` of one event line; anything else is skipped.
pub fn decode_line(line: &str) -> Option<String> {
    let data = line.trim_end().strip_prefix("data:")?.trim_start();
    if data == "[DONE]" {
        return None;
    }

    let value: serde_json::Value = match serde_json::from_str(data) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!("Skipping malformed stream line: {}", e);
            return None;
        }
    };

    value
        .pointer("/choices/0/text")
        .and_then(|text| text.as_str())
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_line() {
        assert_eq!(
            decode_line(r#"data: {"choices":[{"text":"Hel"}]}"#),
            Some("Hel".to_string())
        );
        assert_eq!(decode_line("data: [DONE]"), None);
        assert_eq!(decode_line("data: {not json"), None);
        assert_eq!(decode_line(r#"data: {"choices":[{"text":""}]}"#), None);
        assert_eq!(decode_line("event: ping"), None);
        assert_eq!(decode_line(""), None);
    }

    #[test]
    fn test_line_split_across_chunks() {
        let mut decoder = SseDecoder::new();

        assert!(decoder.push(br#"data: {"choices":[{"te"#).is_empty());
        assert_eq!(
            decoder.push(b"xt\":\"lo\"}]}\r\n\ndata: [DONE]\n"),
            vec!["lo".to_string()]
        );
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_unterminated_trailing_line() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(br#"data: {"choices":[{"text":"end"}]}"#).is_empty());
        assert_eq!(decoder.finish(), Some("end".to_string()));
    }

    #[test]
    fn test_multibyte_split() {
        let line = "data: {\"choices\":[{\"text\":\"caf\u{e9}\"}]}\n".as_bytes();
        let split = line.len() - 6;
        let mut decoder = SseDecoder::new();

        assert!(decoder.push(&line[..split]).is_empty());
        assert_eq!(decoder.push(&line[split..]), vec!["caf\u{e9}".to_string()]);
    }
}
