//! HL7 character sets (MSH-18) mapped to byte encodings.
//!
//! An absent MSH-18 means ASCII; it is handled as UTF-8, which agrees with
//! ASCII on every valid message.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};

use crate::error::Hl7Error;

/// Map an MSH-18 value to an encoding. `None` or empty selects UTF-8.
pub fn encoding_for(charset: Option<&str>) -> Result<&'static Encoding, Hl7Error> {
    let name = match charset.map(str::trim) {
        None | Some("") => return Ok(UTF_8),
        Some(name) => name,
    };
    let label = match name {
        "ASCII" | "UNICODE" | "UNICODE UTF-8" => "utf-8",
        "8859/1" => "iso-8859-1",
        "8859/2" => "iso-8859-2",
        "8859/3" => "iso-8859-3",
        "8859/4" => "iso-8859-4",
        "8859/5" => "iso-8859-5",
        "8859/6" => "iso-8859-6",
        "8859/7" => "iso-8859-7",
        "8859/8" => "iso-8859-8",
        "8859/9" => "iso-8859-9",
        "8859/15" => "iso-8859-15",
        "ISO IR87" => "iso-2022-jp",
        "ISO IR14" => "shift_jis",
        "GB 18030-2000" => "gb18030",
        "KS X 1001" => "euc-kr",
        "BIG-5" => "big5",
        other => return Err(Hl7Error::UnsupportedCharset(other.to_string())),
    };
    Encoding::for_label(label.as_bytes()).ok_or_else(|| Hl7Error::UnsupportedCharset(name.to_string()))
}

pub fn encode(text: &str, charset: Option<&str>) -> Result<Vec<u8>, Hl7Error> {
    let encoding = encoding_for(charset)?;
    let (bytes, _, unmappable) = encoding.encode(text);
    if unmappable {
        return Err(Hl7Error::Unencodable {
            charset: charset.unwrap_or("ASCII").to_string(),
        });
    }
    Ok(bytes.into_owned())
}

pub fn decode(bytes: &[u8], charset: Option<&str>) -> Result<String, Hl7Error> {
    let encoding = encoding_for(charset)?;
    let (text, _, malformed): (Cow<'_, str>, _, bool) = encoding.decode(bytes);
    if malformed {
        return Err(Hl7Error::Undecodable {
            charset: charset.unwrap_or("ASCII").to_string(),
        });
    }
    Ok(text.into_owned())
}
