//! Document chunking for provider requests.
//!
//! A chunk is a bounded, line-numbered slice of a document sized for one
//! provider request. Chunking is a pure function of the text and the chunk
//! size: deterministic and restartable, with no hidden state.

/// Default number of document lines per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 30;

/// An ordered text segment carrying its original 1-based line numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// 1-based number of the first document line in this chunk.
    pub first_line: u32,
    /// 1-based number of the last document line in this chunk.
    pub last_line: u32,
    /// Body with each line rendered as `Line N: <content>`.
    pub text: String,
}

/// Split document text on line boundaries into ordered chunks of at most
/// `chunk_size` lines each.
///
/// Every line is annotated with its original 1-based number so findings can
/// be mapped back to the document regardless of which chunk produced them.
/// The final chunk may be shorter than `chunk_size`; empty text yields no
/// chunks. A `chunk_size` of 0 is treated as 1.
#[must_use]
pub fn chunk_lines(text: &str, chunk_size: usize) -> Vec<Chunk> {
    let chunk_size = chunk_size.max(1);
    let lines: Vec<&str> = text.lines().collect();

    let mut chunks = Vec::with_capacity(lines.len().div_ceil(chunk_size));
    for (index, window) in lines.chunks(chunk_size).enumerate() {
        let first = index * chunk_size + 1;
        let last = first + window.len() - 1;

        let mut body = String::new();
        for (offset, line) in window.iter().enumerate() {
            body.push_str(&format!("Line {}: {line}\n", first + offset));
        }

        chunks.push(Chunk {
            first_line: first as u32,
            last_line: last as u32,
            text: body,
        });
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_text(lines: usize) -> String {
        (1..=lines)
            .map(|n| format!("int x{n};"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        assert!(chunk_lines("", 30).is_empty());
    }

    #[test]
    fn test_single_short_chunk() {
        let chunks = chunk_lines("int main(){return 0;}", 30);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].first_line, 1);
        assert_eq!(chunks[0].last_line, 1);
        assert_eq!(chunks[0].text, "Line 1: int main(){return 0;}\n");
    }

    #[test]
    fn test_chunk_count_is_ceil_of_lines_over_size() {
        // 65 lines at K=30 -> ceil(65/30) = 3 chunks
        let chunks = chunk_lines(&numbered_text(65), 30);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].first_line, 61);
        assert_eq!(chunks[2].last_line, 65);
    }

    #[test]
    fn test_exact_multiple_has_no_empty_tail() {
        let chunks = chunk_lines(&numbered_text(60), 30);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].last_line, 60);
    }

    #[test]
    fn test_line_numbers_are_original_and_contiguous() {
        let chunks = chunk_lines(&numbered_text(7), 3);
        assert_eq!(chunks.len(), 3);
        // Chunk i covers lines [(i-1)K+1 .. min(iK, L)]
        assert_eq!(
            chunks
                .iter()
                .map(|c| (c.first_line, c.last_line))
                .collect::<Vec<_>>(),
            vec![(1, 3), (4, 6), (7, 7)]
        );
        assert!(chunks[1].text.starts_with("Line 4: int x4;"));
        assert!(chunks[2].text.contains("Line 7: int x7;"));
    }

    #[test]
    fn test_deterministic() {
        let text = numbered_text(42);
        assert_eq!(chunk_lines(&text, 10), chunk_lines(&text, 10));
    }

    #[test]
    fn test_zero_chunk_size_treated_as_one() {
        let chunks = chunk_lines("a\nb", 0);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "Line 1: a\n");
    }

    #[test]
    fn test_trailing_newline_does_not_add_phantom_line() {
        let chunks = chunk_lines("a\nb\n", 30);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].last_line, 2);
        assert_eq!(chunks[0].text, "Line 1: a\nLine 2: b\n");
    }
}
