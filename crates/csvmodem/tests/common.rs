#![allow(missing_docs)]
#![allow(dead_code)]

/// A small file cut so that a CRLF, a quoted field with doubled quotes and
/// a field-ending delimiter all straddle chunk boundaries.
pub const CHUNKS: [&str; 7] = [
    "id,na",
    "me,note\r",
    "\n1,\"Ada ",
    "Lovelace\",\"said \"",
    "\"hi\"\"\"\r\n2,Grace,",
    "\r\n",
    "3,\"multi\nline\",x",
];

pub fn joined() -> String {
    CHUNKS.concat()
}

/// Splits `text` into chunks of `size` characters.
pub fn chunks_of(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(size.max(1)).map(|c| c.iter().collect()).collect()
}
