/// Window size, in characters, of a knowledge chunk.
pub const CHUNK_SIZE: usize = 300;
/// Characters shared by consecutive chunks.
pub const CHUNK_OVERLAP: usize = 50;

/// Split `text` into overlapping character windows.
///
/// Windows advance by `size - overlap` characters; the final window always
/// ends at the end of the text. Whitespace-only input yields no chunks.
pub fn split_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() || size == 0 {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= size {
        return vec![text.to_string()];
    }

    let step = size.saturating_sub(overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + size).min(chars.len());
        let chunk: String = chars[start..end].iter().collect();
        let chunk = chunk.trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }
        if end == chars.len() {
            break;
        }
        start += step;
    }
    chunks
}
