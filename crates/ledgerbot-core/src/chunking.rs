//! Split long outgoing text into pieces that fit a messenger's size limit.

/// Split `text` into consecutive pieces of at most `max_chars` characters.
///
/// Pieces borrow from `text` and concatenate back to it exactly. A cut lands
/// on the last newline inside the window (the newline opens the next piece);
/// only a line longer than `max_chars` is cut mid-line.
///
/// Text that already fits comes back as a single piece, and so does the empty
/// string. A `max_chars` of 0 is treated as 1.
pub fn split_message(text: &str, max_chars: usize) -> Vec<&str> {
    split_with(text, max_chars, |_| None)
}

/// [`split_message`] for Telegram HTML.
///
/// A mid-line cut is moved back to the start of an entity (`&lt;`) or tag
/// (`<b>`) the window would otherwise end inside of, so every piece stays
/// parseable on its own. Newline cuts are unaffected.
pub fn split_html(text: &str, max_chars: usize) -> Vec<&str> {
    split_with(text, max_chars, open_markup_start)
}

fn split_with(
    text: &str,
    max_chars: usize,
    mid_line_cut: impl Fn(&str) -> Option<usize>,
) -> Vec<&str> {
    let max_chars = max_chars.max(1);

    let mut pieces = Vec::new();
    let mut rest = text;
    loop {
        // Byte offset of the first char past the window, if the rest overflows.
        let Some((window_end, _)) = rest.char_indices().nth(max_chars) else {
            pieces.push(rest);
            return pieces;
        };

        let window = &rest[..window_end];
        let cut = match window.rfind('\n') {
            Some(nl) if nl > 0 => nl,
            _ => match mid_line_cut(window) {
                Some(at) if at > 0 => at,
                _ => window_end,
            },
        };

        pieces.push(&rest[..cut]);
        rest = &rest[cut..];
    }
}

/// Byte offset of an entity or tag still open at the end of `window`.
fn open_markup_start(window: &str) -> Option<usize> {
    let entity = window.rfind('&').filter(|&at| !window[at..].contains(';'));
    let tag = window.rfind('<').filter(|&at| !window[at..].contains('>'));
    match (entity, tag) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}
