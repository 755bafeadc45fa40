//! Field metadata tags.
//!
//! A tag is a raw string of space-separated `key:"value"` entries, e.g.
//! `default:"10s" doc:"request timeout"`. Values are double-quoted and
//! accept the usual backslash escapes, including `\xNN` and `\uXXXX`.

/// Raw metadata attached to a declared field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tag {
    raw: String,
}

impl Tag {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// The full tag text.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Append a `key:"value"` entry, quoting the value.
    pub fn push(&mut self, key: &str, value: &str) {
        if !self.raw.is_empty() {
            self.raw.push(' ');
        }
        self.raw.push_str(key);
        self.raw.push(':');
        self.raw.push_str(&quote(value));
    }

    /// Value of the entry named `key`.
    ///
    /// Returns `None` when the key is absent, and also when the tag is
    /// malformed before the key is reached.
    pub fn lookup(&self, key: &str) -> Option<String> {
        let mut tag = self.raw.as_bytes();
        while !tag.is_empty() {
            let skip = tag.iter().take_while(|b| **b == b' ').count();
            tag = &tag[skip..];
            if tag.is_empty() {
                break;
            }

            let name_len = tag
                .iter()
                .take_while(|b| **b > b' ' && **b != b':' && **b != b'"' && **b != 0x7f)
                .count();
            if name_len == 0
                || name_len + 1 >= tag.len()
                || tag[name_len] != b':'
                || tag[name_len + 1] != b'"'
            {
                break;
            }
            let name = &tag[..name_len];
            tag = &tag[name_len + 1..];

            let mut i = 1;
            while i < tag.len() && tag[i] != b'"' {
                if tag[i] == b'\\' {
                    i += 1;
                }
                i += 1;
            }
            if i >= tag.len() {
                break;
            }
            let quoted = &tag[..=i];
            tag = &tag[i + 1..];

            if name == key.as_bytes() {
                return std::str::from_utf8(quoted).ok().and_then(unquote);
            }
        }
        None
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// Undo double-quote escaping: `\a \b \f \n \r \t \v \\ \"`, octal `\NNN`,
/// hex `\xNN` and the `\uXXXX` / `\UXXXXXXXX` code points.
///
/// Octal and hex escapes produce raw bytes; the result must still be UTF-8.
fn unquote(quoted: &str) -> Option<String> {
    let inner = quoted.strip_prefix('"')?.strip_suffix('"')?;
    let bytes = inner.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        i += 1;
        if b != b'\\' {
            out.push(b);
            continue;
        }
        let escape = *bytes.get(i)?;
        i += 1;
        match escape {
            b'a' => out.push(0x07),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'v' => out.push(0x0b),
            b'\\' => out.push(b'\\'),
            b'"' => out.push(b'"'),
            b'0'..=b'7' => {
                let digits = bytes.get(i - 1..i + 2)?;
                let value = u32::from_str_radix(std::str::from_utf8(digits).ok()?, 8).ok()?;
                out.push(u8::try_from(value).ok()?);
                i += 2;
            }
            b'x' => {
                out.push(u8::try_from(hex_digits(bytes, i, 2)?).ok()?);
                i += 2;
            }
            b'u' | b'U' => {
                let width = if escape == b'u' { 4 } else { 8 };
                let c = char::from_u32(hex_digits(bytes, i, width)?)?;
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                i += width;
            }
            _ => return None,
        }
    }
    String::from_utf8(out).ok()
}

fn hex_digits(bytes: &[u8], start: usize, width: usize) -> Option<u32> {
    let digits = bytes.get(start..start + width)?;
    if !digits.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    u32::from_str_radix(std::str::from_utf8(digits).ok()?, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_single_entry() {
        let tag = Tag::new(r#"default:"10s""#);
        assert_eq!(tag.lookup("default").as_deref(), Some("10s"));
        assert_eq!(tag.lookup("doc"), None);
    }

    #[test]
    fn test_lookup_among_several() {
        let tag = Tag::new(r#"doc:"request timeout"  default:"a b""#);
        assert_eq!(tag.lookup("doc").as_deref(), Some("request timeout"));
        assert_eq!(tag.lookup("default").as_deref(), Some("a b"));
    }

    #[test]
    fn test_lookup_escapes() {
        let tag = Tag::new(r#"default:"say \"hi\"\nbye""#);
        assert_eq!(tag.lookup("default").as_deref(), Some("say \"hi\"\nbye"));
    }

    #[test]
    fn test_lookup_code_point_and_byte_escapes() {
        let tag = Tag::new(r#"default:"caf\u00e9""#);
        assert_eq!(tag.lookup("default").as_deref(), Some("café"));

        let tag = Tag::new(r#"default:"\x41\102\U0001F600\a\v""#);
        assert_eq!(tag.lookup("default").as_deref(), Some("AB\u{1F600}\u{7}\u{b}"));

        let tag = Tag::new(r#"default:"\xc3\xa9""#);
        assert_eq!(tag.lookup("default").as_deref(), Some("é"));
    }

    #[test]
    fn test_lookup_rejects_bad_escapes() {
        assert_eq!(Tag::new(r#"default:"\q""#).lookup("default"), None);
        assert_eq!(Tag::new(r#"default:"\x4""#).lookup("default"), None);
        assert_eq!(Tag::new(r#"default:"\777""#).lookup("default"), None);
        assert_eq!(Tag::new(r#"default:"\ud800""#).lookup("default"), None);
        assert_eq!(Tag::new(r#"default:"\xff""#).lookup("default"), None);
    }

    #[test]
    fn test_lookup_plain_text_is_not_an_entry() {
        let tag = Tag::new("10s");
        assert_eq!(tag.lookup("default"), None);
        assert_eq!(tag.as_str(), "10s");
    }

    #[test]
    fn test_lookup_stops_at_malformed_entry() {
        let tag = Tag::new(r#"broken default:"1""#);
        assert_eq!(tag.lookup("default"), None);
    }

    #[test]
    fn test_push_round_trips_through_lookup() {
        let mut tag = Tag::default();
        tag.push("doc", "peers");
        tag.push("default", "a\nb \"c\"");
        assert_eq!(tag.lookup("default").as_deref(), Some("a\nb \"c\""));
        assert_eq!(tag.lookup("doc").as_deref(), Some("peers"));
    }
}
