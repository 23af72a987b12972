/// Telegram rejects messages longer than this many characters.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

/// Split text into chunks of at most `max_chars` characters, breaking at the
/// last newline or space inside the limit when there is one.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.chars().count() <= max_chars {
            chunks.push(remaining.to_string());
            break;
        }

        // Byte offset just past the last character that fits
        let limit = remaining
            .char_indices()
            .nth(max_chars)
            .map(|(pos, _)| pos)
            .unwrap_or(remaining.len());
        let window = &remaining[..limit];

        let break_pos = window
            .rfind('\n')
            .or_else(|| window.rfind(' '))
            .filter(|&pos| pos > 0);

        match break_pos {
            Some(pos) => {
                chunks.push(remaining[..pos].to_string());
                remaining = &remaining[pos + 1..];
            }
            None => {
                chunks.push(window.to_string());
                remaining = &remaining[limit..];
            }
        }
    }
    chunks
}
