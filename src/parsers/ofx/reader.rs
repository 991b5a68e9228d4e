use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use log::{debug, warn};

use crate::errors::{ConvertError, ConvertResult};
use crate::parsers::traits::{OfxHandler, Parser};

/// The two on-disk flavours of OFX.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// OFX 1.x: `KEY:VALUE` header lines, leaf elements without close tags
    Sgml,
    /// OFX 2.x: `<?xml?>` and `<?OFX?>` processing instructions, well-formed tags
    Xml,
}

impl Dialect {
    pub fn detect(content: &str) -> Option<Self> {
        let trimmed = content.trim_start_matches('\u{feff}').trim_start();
        if trimmed.starts_with("<?xml") || trimmed.contains("<?OFX") {
            Some(Dialect::Xml)
        } else if trimmed.contains("OFXHEADER:")
            || trimmed.contains("DATA:OFXSGML")
            || find_root(trimmed).is_some()
        {
            Some(Dialect::Sgml)
        } else {
            None
        }
    }

    /// Character encoding declared in the header: `ENCODING`/`CHARSET` lines
    /// for SGML, the `<?xml encoding?>` attribute for XML.
    fn declared_encoding(self, preamble: &str) -> Option<&'static Encoding> {
        match self {
            Dialect::Sgml => {
                let header = |key: &str| {
                    preamble.lines().find_map(|line| {
                        let (name, value) = line.trim().split_once(':')?;
                        name.trim().eq_ignore_ascii_case(key).then(|| value.trim())
                    })
                };
                if header("ENCODING").is_some_and(|v| v.eq_ignore_ascii_case("UTF-8")) {
                    return Some(UTF_8);
                }
                match header("CHARSET")? {
                    "1252" => Some(WINDOWS_1252),
                    charset if charset.bytes().all(|b| b.is_ascii_digit()) => {
                        Encoding::for_label(format!("windows-{charset}").as_bytes())
                    }
                    charset => Encoding::for_label(charset.as_bytes()),
                }
            }
            Dialect::Xml => {
                let start = preamble.find("encoding=")? + "encoding=".len();
                let quoted = &preamble[start..];
                let quote = quoted.chars().next().filter(|c| *c == '"' || *c == '\'')?;
                let label = quoted[1..].split(quote).next()?;
                Encoding::for_label(label.as_bytes())
            }
        }
    }
}

/// Decodes raw OFX bytes using the encoding the header declares.
///
/// Falls back to UTF-8 when nothing usable is declared. Bytes that do not fit
/// the chosen encoding become U+FFFD and a warning is logged.
pub fn decode_content(bytes: &[u8]) -> Cow<'_, str> {
    // headers are ASCII, so a lossy view is enough to read them
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(4096)]);
    let preamble = &head[..find_root(&head).unwrap_or(head.len())];

    let encoding = Dialect::detect(&head)
        .and_then(|dialect| dialect.declared_encoding(preamble))
        .unwrap_or(UTF_8);
    debug!("Decoding OFX content as {}", encoding.name());

    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        warn!("Content is not valid {}; replaced invalid bytes", encoding.name());
    }
    text
}

/// Event source for both OFX dialects.
///
/// Leaf and aggregate tags are told apart by what follows them: a start tag
/// followed by text is a leaf element, a start tag followed by another tag
/// opens an aggregate. Close tags of leaves (XML) are absorbed, close tags of
/// aggregates are forwarded untouched, balanced or not.
pub struct OfxReader;

impl Parser for OfxReader {
    fn is_supported(filename: Option<&str>, content: &str) -> bool {
        if let Some(name) = filename {
            let ext = name.to_lowercase();
            if ext.ends_with(".qfx") || ext.ends_with(".ofx") {
                return true;
            }
        }

        let trimmed = content.trim();
        find_root(trimmed).is_some()
            || trimmed.contains("OFXHEADER:")
            || trimmed.contains("DATA:OFXSGML")
    }

    fn parse<H: OfxHandler>(content: &str, handler: &mut H) -> ConvertResult<()> {
        let root = find_root(content).ok_or_else(|| malformed("missing <OFX> root"))?;
        read_headers(&content[..root], handler)?;

        // Start tag not yet known to be a leaf or an aggregate
        let mut pending: Option<&str> = None;
        // Leaf whose explicit close tag may still follow
        let mut last_leaf: Option<&str> = None;

        for token in Lexer::new(&content[root..]) {
            match token? {
                Token::Open(name) => {
                    if let Some(open) = pending.replace(name) {
                        handler.start_aggregate(open)?;
                    }
                    last_leaf = None;
                }
                Token::Text(value) => {
                    let name = pending
                        .take()
                        .ok_or_else(|| malformed(format!("text {value:?} outside of an element")))?;
                    handler.on_element(name, &value)?;
                    last_leaf = Some(name);
                }
                Token::Empty(name) => {
                    if let Some(open) = pending.take() {
                        handler.start_aggregate(open)?;
                    }
                    empty_element(handler, name)?;
                    last_leaf = None;
                }
                Token::Close(name) => {
                    if let Some(open) = pending.take() {
                        if open.eq_ignore_ascii_case(name) {
                            empty_element(handler, open)?;
                            last_leaf = None;
                            continue;
                        }
                        handler.on_element(open, "")?;
                    } else if last_leaf.is_some_and(|leaf| leaf.eq_ignore_ascii_case(name)) {
                        last_leaf = None;
                        continue;
                    }
                    last_leaf = None;
                    handler.end_aggregate(name)?;
                }
            }
        }

        if let Some(open) = pending {
            handler.on_element(open, "")?;
        }
        Ok(())
    }
}

/// `<X></X>` or `<X/>`: an empty leaf, unless the handler wants `X` as an
/// aggregate.
fn empty_element<H: OfxHandler>(handler: &mut H, name: &str) -> ConvertResult<()> {
    if handler.is_aggregate(name) {
        handler.start_aggregate(name)?;
        handler.end_aggregate(name)
    } else {
        handler.on_element(name, "")
    }
}

fn malformed(message: impl Into<String>) -> ConvertError {
    ConvertError::MalformedMarkup(message.into())
}

fn find_root(content: &str) -> Option<usize> {
    // ASCII uppercasing keeps byte offsets intact
    content.to_ascii_uppercase().find("<OFX>")
}

fn read_headers<H: OfxHandler>(preamble: &str, handler: &mut H) -> ConvertResult<()> {
    let mut rest = preamble.trim_start_matches('\u{feff}');
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            return Ok(());
        }

        if let Some(after) = rest.strip_prefix("<?") {
            let end = after
                .find("?>")
                .ok_or_else(|| malformed("unterminated processing instruction"))?;
            read_instruction(&after[..end], handler)?;
            rest = &after[end + 2..];
        } else {
            let (line, tail) = rest.split_once('\n').unwrap_or((rest, ""));
            let line = line.trim();
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| malformed(format!("header line without ':' {line:?}")))?;
            handler.on_header(name.trim(), value.trim())?;
            rest = tail;
        }
    }
}

fn read_instruction<H: OfxHandler>(body: &str, handler: &mut H) -> ConvertResult<()> {
    let mut parts = body.split_whitespace();
    let target = parts.next().unwrap_or_default();
    // <?xml ...?> only describes the XML layer
    if !target.eq_ignore_ascii_case("OFX") {
        return Ok(());
    }

    for pair in parts {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| malformed(format!("header attribute without '=' {pair:?}")))?;
        handler.on_header(name, value.trim_matches(|c| c == '"' || c == '\''))?;
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    Open(&'a str),
    Close(&'a str),
    /// `<TAG/>`
    Empty(&'a str),
    Text(Cow<'a, str>),
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = ConvertResult<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        let src = self.src;
        loop {
            let rest = &src[self.pos..];
            if rest.is_empty() {
                return None;
            }

            if let Some(tag) = rest.strip_prefix('<') {
                if tag.starts_with("!--") {
                    let Some(end) = tag.find("-->") else {
                        return Some(Err(malformed("unterminated comment")));
                    };
                    self.pos += 1 + end + 3;
                    continue;
                }

                let Some(end) = tag.find('>') else {
                    return Some(Err(malformed("unterminated tag")));
                };
                let inner = tag[..end].trim();
                self.pos += 1 + end + 1;
                if inner.starts_with('?') || inner.starts_with('!') {
                    continue;
                }
                return Some(tag_token(inner));
            }

            let end = rest.find('<').unwrap_or(rest.len());
            self.pos += end;
            let text = rest[..end].trim();
            if !text.is_empty() {
                return Some(Ok(Token::Text(decode_entities(text))));
            }
        }
    }
}

fn tag_token(inner: &str) -> ConvertResult<Token<'_>> {
    if let Some(name) = inner.strip_prefix('/') {
        let name = name.trim();
        if name.is_empty() {
            return Err(malformed("close tag without a name"));
        }
        return Ok(Token::Close(name));
    }

    let (inner, empty) = match inner.strip_suffix('/') {
        Some(inner) => (inner, true),
        None => (inner, false),
    };
    // attributes are not part of OFX; ignore them if present
    let name = inner.split_whitespace().next().unwrap_or_default();
    if name.is_empty() {
        return Err(malformed("tag without a name"));
    }

    Ok(if empty { Token::Empty(name) } else { Token::Open(name) })
}

fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&apos;", "'")
            .replace("&amp;", "&"),
    )
}
