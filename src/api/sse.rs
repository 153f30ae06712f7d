//! Incremental server-sent-events decoder.
//!
//! Bytes arrive in arbitrary network chunks; the decoder buffers partial
//! lines and yields complete `data` payloads as soon as their terminating
//! blank line is seen. Multiple `data:` lines in one event are joined with
//! `\n`; comment lines and other fields are ignored.

#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    pending: Vec<u8>,
    data_lines: Vec<String>,
}

impl SseDecoder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes; returns every payload completed by them.
    pub(crate) fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        let mut payloads = Vec::new();
        // '\n' never occurs inside a multi-byte UTF-8 sequence.
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line[..line.len() - 1]);
            self.feed_line(&line, &mut payloads);
        }
        payloads
    }

    /// Flush a trailing event that was not followed by a blank line.
    pub(crate) fn finish(&mut self) -> Vec<String> {
        let mut payloads = Vec::new();
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            let line = String::from_utf8_lossy(&rest);
            self.feed_line(&line, &mut payloads);
        }
        self.flush_event(&mut payloads);
        payloads
    }

    fn feed_line(&mut self, raw_line: &str, payloads: &mut Vec<String>) {
        let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
        if line.is_empty() {
            self.flush_event(payloads);
            return;
        }
        if line.starts_with(':') {
            return;
        }

        let (field, value) = if let Some((field, value)) = line.split_once(':') {
            (field, value.strip_prefix(' ').unwrap_or(value))
        } else {
            (line, "")
        };
        if field == "data" {
            self.data_lines.push(value.to_string());
        }
    }

    fn flush_event(&mut self, payloads: &mut Vec<String>) {
        if self.data_lines.is_empty() {
            return;
        }
        payloads.push(self.data_lines.join("\n"));
        self.data_lines.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsupport::{sse_data_block, sse_done_block};

    #[test]
    fn joins_data_lines_and_skips_comments() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(
            b": ping\n\
              event: demo\n\
              data: one\n\
              data: two\n\
              id: 1\n\
              \n\
              data: [DONE]\n\
              \n",
        );
        assert_eq!(payloads, vec!["one\ntwo".to_string(), "[DONE]".to_string()]);
    }

    #[test]
    fn payload_split_across_chunks_is_reassembled() {
        let mut decoder = SseDecoder::new();
        let block = sse_data_block(r#"{"choices":[]}"#);
        let (head, tail) = block.as_bytes().split_at(9);
        assert!(decoder.push(head).is_empty());
        assert_eq!(decoder.push(tail), vec![r#"{"choices":[]}"#.to_string()]);
    }

    #[test]
    fn multibyte_text_split_mid_character_survives() {
        let mut decoder = SseDecoder::new();
        let block = sse_data_block("héllo");
        let bytes = block.as_bytes();
        // Split inside the two-byte 'é'.
        let cut = "data: h".len() + 1;
        assert!(decoder.push(&bytes[..cut]).is_empty());
        assert_eq!(decoder.push(&bytes[cut..]), vec!["héllo".to_string()]);
    }

    #[test]
    fn crlf_line_endings_are_accepted() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b"data: a\r\n\r\ndata: b\r\n\r\n");
        assert_eq!(payloads, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn finish_flushes_unterminated_event() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: tail").is_empty());
        assert_eq!(decoder.finish(), vec!["tail".to_string()]);
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn done_marker_is_passed_through() {
        let mut decoder = SseDecoder::new();
        assert_eq!(decoder.push(sse_done_block().as_bytes()), vec!["[DONE]".to_string()]);
    }

    #[cfg(feature = "fuzz-tests")]
    mod prop_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn chunking_never_changes_decoded_payloads(
                payloads in proptest::collection::vec(
                    proptest::string::string_regex("[ -~]{0,24}").expect("regex"),
                    0..8
                ),
                chunk in 1usize..17
            ) {
                let mut stream = String::new();
                for payload in &payloads {
                    stream.push_str(": keepalive\n");
                    stream.push_str("data: ");
                    stream.push_str(payload);
                    stream.push_str("\n\n");
                }
                let mut decoder = SseDecoder::new();
                let mut decoded = Vec::new();
                for piece in stream.as_bytes().chunks(chunk) {
                    decoded.extend(decoder.push(piece));
                }
                decoded.extend(decoder.finish());
                prop_assert_eq!(decoded, payloads);
            }
        }
    }
}
