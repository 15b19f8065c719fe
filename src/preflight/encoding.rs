// Encoding sniffer: recognises the multi-byte Unicode byte-order marks and
// enforces UTF-8 for everything that does not carry one.

use super::PreflightError;

/// Byte-order marks accepted in front of an asset. Content carrying one of
/// these is handed to the structural parsers unchecked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrderMark {
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Utf32Be,
}

impl ByteOrderMark {
    // Four-byte marks are listed first so they win over the UTF-16 ones.
    const MARKS: [(&'static [u8], ByteOrderMark); 4] = [
        (&[0x00, 0x00, 0xfe, 0xff], ByteOrderMark::Utf32Le),
        (&[0x00, 0x00, 0xff, 0xfe], ByteOrderMark::Utf32Be),
        (&[0xff, 0xfe], ByteOrderMark::Utf16Le),
        (&[0xfe, 0xff], ByteOrderMark::Utf16Be),
    ];

    /// Length of the mark in bytes.
    pub fn width(self) -> usize {
        match self {
            ByteOrderMark::Utf16Le | ByteOrderMark::Utf16Be => 2,
            ByteOrderMark::Utf32Le | ByteOrderMark::Utf32Be => 4,
        }
    }

    /// Decode the text following the mark. Returns `None` when the
    /// remaining bytes are not a whole number of code units or contain an
    /// invalid sequence.
    pub fn decode(self, content: &[u8]) -> Option<String> {
        let body = content.get(self.width()..)?;
        match self {
            ByteOrderMark::Utf16Le => decode_utf16(body, u16::from_le_bytes),
            ByteOrderMark::Utf16Be => decode_utf16(body, u16::from_be_bytes),
            // Both four-byte marks open with a zero high half, so code units
            // are read high half first.
            ByteOrderMark::Utf32Le | ByteOrderMark::Utf32Be => decode_utf32_be(body),
        }
    }
}

fn decode_utf16(body: &[u8], unit: fn([u8; 2]) -> u16) -> Option<String> {
    if body.len() % 2 != 0 {
        return None;
    }
    let units = body.chunks_exact(2).map(|c| unit([c[0], c[1]]));
    char::decode_utf16(units).collect::<Result<String, _>>().ok()
}

fn decode_utf32_be(body: &[u8]) -> Option<String> {
    if body.len() % 4 != 0 {
        return None;
    }
    body.chunks_exact(4)
        .map(|c| char::from_u32(u32::from_be_bytes([c[0], c[1], c[2], c[3]])))
        .collect()
}

/// Detect a leading byte-order mark.
pub fn sniff(content: &[u8]) -> Option<ByteOrderMark> {
    ByteOrderMark::MARKS
        .iter()
        .find(|(mark, _)| content.starts_with(mark))
        .map(|(_, bom)| *bom)
}

/// Accept BOM-prefixed content as-is and require valid UTF-8 otherwise.
pub fn check(content: &[u8]) -> Result<Option<ByteOrderMark>, PreflightError> {
    if let Some(bom) = sniff(content) {
        return Ok(Some(bom));
    }
    std::str::from_utf8(content)
        .map(|_| None)
        .map_err(|e| PreflightError::InvalidEncoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_each_mark() {
        assert_eq!(sniff(&[0xff, 0xfe, b'a', 0]), Some(ByteOrderMark::Utf16Le));
        assert_eq!(sniff(&[0xfe, 0xff, 0, b'a']), Some(ByteOrderMark::Utf16Be));
        assert_eq!(sniff(&[0, 0, 0xfe, 0xff]), Some(ByteOrderMark::Utf32Le));
        assert_eq!(sniff(&[0, 0, 0xff, 0xfe]), Some(ByteOrderMark::Utf32Be));
        assert_eq!(sniff(b"{}"), None);
        assert_eq!(sniff(&[0xff]), None);
    }

    #[test]
    fn plain_utf8_passes() {
        assert_eq!(check("tïtle: ü".as_bytes()), Ok(None));
    }

    #[test]
    fn broken_utf8_without_mark_is_rejected() {
        let err = check(&[b'{', 0xc3, 0x28, b'}']).unwrap_err();
        assert!(matches!(err, PreflightError::InvalidEncoding(_)));
    }

    #[test]
    fn marked_content_skips_utf8_check() {
        assert_eq!(check(&[0xff, 0xfe, 0xfd]), Ok(Some(ByteOrderMark::Utf16Le)));
    }

    #[test]
    fn decodes_utf16_both_orders() {
        let le = [0xff, 0xfe, b'h', 0, b'i', 0];
        let be = [0xfe, 0xff, 0, b'h', 0, b'i'];
        assert_eq!(ByteOrderMark::Utf16Le.decode(&le).as_deref(), Some("hi"));
        assert_eq!(ByteOrderMark::Utf16Be.decode(&be).as_deref(), Some("hi"));
    }

    #[test]
    fn decodes_utf32_words() {
        let content = [0, 0, 0xfe, 0xff, 0, 0, 0, b'x'];
        assert_eq!(ByteOrderMark::Utf32Le.decode(&content).as_deref(), Some("x"));
    }

    #[test]
    fn odd_length_body_does_not_decode() {
        assert_eq!(ByteOrderMark::Utf16Le.decode(&[0xff, 0xfe, 0xfd]), None);
        assert_eq!(ByteOrderMark::Utf32Be.decode(&[0, 0, 0xff, 0xfe, 0]), None);
    }
}
