pub mod chrome;
pub mod systrace;

use thiserror::Error;

use crate::model::RawTrace;

/// The payload shapes the loader distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputShape {
    /// Chrome trace event JSON (array or object form).
    JsonEvents,
    /// ftrace/systrace text with `tracing_mark_write` markers.
    MarkerText,
    /// Binary protobuf trace (Perfetto). Recognized but not decoded.
    Protobuf,
    /// gzip/zlib container. Decompression is the caller's job.
    Compressed,
    Unknown,
}

impl std::str::FromStr for InputShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::JsonEvents),
            "text" | "systrace" | "ftrace" => Ok(Self::MarkerText),
            "protobuf" | "perfetto" => Ok(Self::Protobuf),
            "auto" | "unknown" => Ok(Self::Unknown),
            other => Err(format!("unknown input shape: {other}")),
        }
    }
}

/// Input shapes that are recognized but deliberately not decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedInput {
    Protobuf,
    Compressed,
}

impl std::fmt::Display for UnsupportedInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Protobuf => write!(f, "protobuf traces are not yet supported"),
            Self::Compressed => write!(f, "compressed payloads must be decompressed first"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("chrome: {0}")]
    Chrome(#[from] chrome::ChromeParseError),
    #[error("systrace: {0}")]
    Systrace(#[from] systrace::SystraceParseError),
    #[error("{0}")]
    Unsupported(UnsupportedInput),
    #[error("unable to decode input as any supported trace format")]
    Undecodable,
}

/// Classify a payload by its leading bytes.
///
/// Detection strategy:
/// 1. Compression magic numbers.
/// 2. JSON: first non-whitespace byte is `{` or `[`.
/// 3. UTF-8 text carrying ftrace markers or an ftrace header.
/// 4. Binary starting with a length-delimited field-1 tag (Perfetto `packet`).
pub fn sniff(data: &[u8]) -> InputShape {
    match data {
        [0x1f, 0x8b, ..] | [0x78, 0x01 | 0x5e | 0x9c | 0xda, ..] => return InputShape::Compressed,
        _ => {}
    }

    let body = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    let first = body.iter().copied().find(|b| !b.is_ascii_whitespace());
    if matches!(first, Some(b'{' | b'[')) {
        return InputShape::JsonEvents;
    }

    match std::str::from_utf8(body) {
        Ok(text) => {
            if text.contains("tracing_mark_write") || text.trim_start().starts_with("# tracer:") {
                InputShape::MarkerText
            } else {
                InputShape::Unknown
            }
        }
        Err(_) if body.first() == Some(&0x0a) => InputShape::Protobuf,
        Err(_) => InputShape::Unknown,
    }
}

/// Decode a payload into raw events.
///
/// The declared shape wins when given; otherwise the sniffed one is used. An
/// `Unknown` shape tries every text format before giving up with
/// `ParseError::Undecodable`. Never returns an empty trace in place of a
/// decode failure.
pub fn parse(data: &[u8], declared: Option<InputShape>) -> Result<RawTrace, ParseError> {
    let shape = declared.unwrap_or_else(|| sniff(data));
    log::debug!("decoding {} bytes as {shape:?}", data.len());

    match shape {
        InputShape::JsonEvents => Ok(chrome::parse_chrome_trace(data)?),
        InputShape::MarkerText => Ok(systrace::parse_systrace(data)?),
        InputShape::Protobuf => Err(ParseError::Unsupported(UnsupportedInput::Protobuf)),
        InputShape::Compressed => Err(ParseError::Unsupported(UnsupportedInput::Compressed)),
        InputShape::Unknown => {
            if let Ok(trace) = chrome::parse_chrome_trace(data) {
                return Ok(trace);
            }
            if let Ok(trace) = systrace::parse_systrace(data) {
                return Ok(trace);
            }
            Err(ParseError::Undecodable)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_json() {
        assert_eq!(sniff(b"  [{\"ph\":\"X\"}]"), InputShape::JsonEvents);
        assert_eq!(sniff(b"\xEF\xBB\xBF{\"traceEvents\":[]}"), InputShape::JsonEvents);
    }

    #[test]
    fn sniffs_marker_text() {
        let text = b"  a-1 [000] .... 1.0: tracing_mark_write: B|1|x\n";
        assert_eq!(sniff(text), InputShape::MarkerText);
        assert_eq!(sniff(b"# tracer: nop\n"), InputShape::MarkerText);
    }

    #[test]
    fn sniffs_binary_containers() {
        assert_eq!(sniff(&[0x1f, 0x8b, 0x08, 0x00]), InputShape::Compressed);
        assert_eq!(sniff(&[0x0a, 0x96, 0x01, 0xff]), InputShape::Protobuf);
        assert_eq!(sniff(b"just some words"), InputShape::Unknown);
    }

    #[test]
    fn protobuf_is_reported_unsupported() {
        let err = parse(&[0x0a, 0x96, 0x01, 0xff], None).unwrap_err();
        assert!(matches!(
            err,
            ParseError::Unsupported(UnsupportedInput::Protobuf)
        ));
    }

    #[test]
    fn garbage_is_undecodable() {
        let err = parse(b"not a trace at all", None).unwrap_err();
        assert!(matches!(err, ParseError::Undecodable));
    }

    #[test]
    fn declared_shape_overrides_sniffing() {
        let err = parse(b"[]", Some(InputShape::MarkerText)).unwrap_err();
        assert!(matches!(err, ParseError::Systrace(_)));
    }

    #[test]
    fn shape_from_str() {
        assert_eq!("json".parse::<InputShape>(), Ok(InputShape::JsonEvents));
        assert_eq!("text".parse::<InputShape>(), Ok(InputShape::MarkerText));
        assert!("xml".parse::<InputShape>().is_err());
    }
}
