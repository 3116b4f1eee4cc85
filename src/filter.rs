//! Normalization of exported `.properties` content.
//!
//! Exports are handled as raw ISO-8859-1 bytes, one byte per character.
//! Nothing here decodes text: a `\\` pair is two `0x5C` bytes no matter what
//! surrounds it, so escapes like `\\u00e9` survive untouched.

/// Result of normalizing one exported file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Normalized {
    pub body: Vec<u8>,
    pub non_empty: bool,
}

/// Keep translated lines only and collapse doubled backslashes.
///
/// Blank lines and lines starting with `#` are dropped. Every kept line ends
/// with `\n` in the output, whatever terminator it had in the input.
pub fn normalize(raw: &[u8]) -> Normalized {
    let mut body = Vec::with_capacity(raw.len());
    let mut non_empty = false;

    for line in lines(raw) {
        if is_blank(line) || line.first() == Some(&b'#') {
            continue;
        }
        non_empty = true;
        collapse_backslashes(line, &mut body);
        body.push(b'\n');
    }

    Normalized { body, non_empty }
}

/// Whether a line holds nothing but whitespace.
///
/// Whitespace is the Latin-1 control set Java's `Character.isWhitespace`
/// accepts: space, `\t`..`\r` and the `0x1C`..`0x1F` separators. `0xA0`
/// (no-break space) counts as text.
pub fn is_blank(line: &[u8]) -> bool {
    line.iter()
        .all(|&b| matches!(b, b' ' | b'\t'..=b'\r' | 0x1C..=0x1F))
}

/// Replace each non-overlapping `\\` with `\`, scanning left to right.
fn collapse_backslashes(line: &[u8], out: &mut Vec<u8>) {
    let mut start = 0;
    let mut i = 0;
    while i + 1 < line.len() {
        if line[i] == b'\\' && line[i + 1] == b'\\' {
            out.extend_from_slice(&line[start..i]);
            out.push(b'\\');
            i += 2;
            start = i;
        } else {
            i += 1;
        }
    }
    out.extend_from_slice(&line[start..]);
}

/// Split on `\n`, `\r\n` or a lone `\r`, without terminators.
fn lines(raw: &[u8]) -> impl Iterator<Item = &[u8]> {
    let mut rest = raw;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        match rest.iter().position(|&b| b == b'\n' || b == b'\r') {
            Some(end) => {
                let line = &rest[..end];
                let skip = if rest[end] == b'\r' && rest.get(end + 1) == Some(&b'\n') {
                    2
                } else {
                    1
                };
                rest = &rest[end + skip..];
                Some(line)
            }
            None => {
                let line = rest;
                rest = &[];
                Some(line)
            }
        }
    })
}
