//! HL7 v2 messages as segments of delimited fields.
//!
//! Field numbering follows the standard: `segment.field(3)` of a PID segment
//! is PID-3. For MSH, field 1 is the field separator itself and field 2 the
//! encoding characters, so `msh.field(9)` is MSH-9 as well.
//!
//! Escape sequences are not interpreted. Component and repetition separators
//! are preserved exactly as received.

use crate::charset;
use crate::error::Hl7Error;

pub const SEGMENT_TERMINATOR: char = '\r';

const MSH: &str = "MSH";

/// The five delimiters declared in MSH-1 and MSH-2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiters {
    pub field: char,
    pub component: char,
    pub repetition: char,
    pub escape: char,
    pub subcomponent: char,
}

impl Default for Delimiters {
    fn default() -> Self {
        Delimiters {
            field: '|',
            component: '^',
            repetition: '~',
            escape: '\\',
            subcomponent: '&',
        }
    }
}

impl Delimiters {
    /// MSH-2 value.
    pub fn encoding_characters(&self) -> String {
        [self.component, self.repetition, self.escape, self.subcomponent]
            .iter()
            .collect()
    }

    /// Read the delimiters from the start of an MSH segment.
    fn from_header(line: &str) -> Result<Self, Hl7Error> {
        let mut chars = line.chars().skip(MSH.len());
        let field = chars
            .next()
            .ok_or_else(|| Hl7Error::MalformedHeader("missing field separator".to_string()))?;
        let encoding: Vec<char> = chars.take_while(|c| *c != field).take(4).collect();
        if encoding.len() < 2 {
            return Err(Hl7Error::MalformedHeader(format!(
                "encoding characters too short: '{}'",
                encoding.iter().collect::<String>()
            )));
        }
        let defaults = Delimiters::default();
        Ok(Delimiters {
            field,
            component: encoding[0],
            repetition: encoding[1],
            escape: encoding.get(2).copied().unwrap_or(defaults.escape),
            subcomponent: encoding.get(3).copied().unwrap_or(defaults.subcomponent),
        })
    }
}

// ──────────────────────────────────────────────
// Hl7Segment
// ──────────────────────────────────────────────

/// One segment; `fields[0]` is the segment name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hl7Segment {
    fields: Vec<String>,
}

impl Hl7Segment {
    pub fn new(name: &str) -> Self {
        Hl7Segment {
            fields: vec![name.to_string()],
        }
    }

    fn header(delimiters: &Delimiters) -> Self {
        Hl7Segment {
            fields: vec![
                MSH.to_string(),
                delimiters.field.to_string(),
                delimiters.encoding_characters(),
            ],
        }
    }

    pub fn name(&self) -> &str {
        &self.fields[0]
    }

    /// Field `n`, or `None` when the segment is shorter.
    pub fn field(&self, n: usize) -> Option<&str> {
        if n == 0 {
            return None;
        }
        self.fields.get(n).map(String::as_str)
    }

    pub fn field_or<'a>(&'a self, n: usize, default: &'a str) -> &'a str {
        self.field(n).unwrap_or(default)
    }

    /// Set field `n` (1-based), padding with empty fields as needed.
    /// MSH-1 and MSH-2 are derived from the message delimiters and are not settable.
    pub fn set_field(&mut self, n: usize, value: impl Into<String>) {
        if n == 0 || (self.name() == MSH && n <= 2) {
            return;
        }
        if self.fields.len() <= n {
            self.fields.resize(n + 1, String::new());
        }
        self.fields[n] = value.into();
    }

    /// Split a field value on `separator`. An empty value has no parts.
    pub fn split(value: &str, separator: char) -> Vec<&str> {
        if value.is_empty() {
            return Vec::new();
        }
        value.split(separator).collect()
    }

    fn encode(&self, delimiters: &Delimiters, header: bool) -> String {
        let sep = delimiters.field.to_string();
        if header {
            let rest = self.fields.get(2..).unwrap_or_default();
            format!("{}{}{}", MSH, sep, rest.join(&sep))
        } else {
            self.fields.join(&sep)
        }
    }

    /// Parse the first line of a message. MSH-1 is the field separator
    /// itself, so the fields after it are shifted by one.
    fn parse_header(line: &str, delimiters: &Delimiters) -> Result<Self, Hl7Error> {
        let rest = line
            .strip_prefix(MSH)
            .and_then(|r| r.strip_prefix(delimiters.field))
            .ok_or_else(|| Hl7Error::MalformedHeader(format!("'{}'", line)))?;
        let mut fields = vec![MSH.to_string(), delimiters.field.to_string()];
        fields.extend(rest.split(delimiters.field).map(str::to_string));
        Ok(Hl7Segment { fields })
    }

    fn parse(line: &str, delimiters: &Delimiters) -> Self {
        Hl7Segment {
            fields: line.split(delimiters.field).map(str::to_string).collect(),
        }
    }
}

// ──────────────────────────────────────────────
// Hl7Message
// ──────────────────────────────────────────────

/// A message: an MSH segment followed by zero or more segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hl7Message {
    delimiters: Delimiters,
    segments: Vec<Hl7Segment>,
}

impl Hl7Message {
    /// A message holding only an MSH segment with the given MSH-9 and MSH-12.
    pub fn new(message_type: &str, version: &str) -> Self {
        let delimiters = Delimiters::default();
        let mut msh = Hl7Segment::header(&delimiters);
        msh.set_field(9, message_type);
        msh.set_field(11, "P");
        msh.set_field(12, version);
        Hl7Message {
            delimiters,
            segments: vec![msh],
        }
    }

    /// IHE ITI-9 PIX query (QBP^Q23) for one patient identifier in CX form.
    ///
    /// `timestamp` goes to MSH-7, `control_id` to MSH-10 and QPD-2.
    pub fn pix_query(pid: &str, control_id: &str, timestamp: &str) -> Self {
        let mut msg = Self::new("QBP^Q23^QBP_Q21", "2.5");
        let msh = msg.header_mut();
        msh.set_field(7, timestamp);
        msh.set_field(10, control_id);

        let mut qpd = Hl7Segment::new("QPD");
        qpd.set_field(1, "IHE PIX Query");
        qpd.set_field(2, control_id);
        qpd.set_field(3, pid);
        msg.push_segment(qpd);

        let mut rcp = Hl7Segment::new("RCP");
        rcp.set_field(1, "I");
        msg.push_segment(rcp);
        msg
    }

    pub fn delimiters(&self) -> Delimiters {
        self.delimiters
    }

    pub fn header(&self) -> &Hl7Segment {
        &self.segments[0]
    }

    pub fn header_mut(&mut self) -> &mut Hl7Segment {
        &mut self.segments[0]
    }

    pub fn segments(&self) -> &[Hl7Segment] {
        &self.segments
    }

    pub fn push_segment(&mut self, segment: Hl7Segment) {
        self.segments.push(segment);
    }

    /// First segment with the given name.
    pub fn segment(&self, name: &str) -> Option<&Hl7Segment> {
        self.segments.iter().find(|s| s.name() == name)
    }

    /// MSH-9, e.g. `RSP^K23^RSP_K23`.
    pub fn message_type(&self) -> &str {
        self.header().field_or(9, "")
    }

    pub fn control_id(&self) -> &str {
        self.header().field_or(10, "")
    }

    /// MSH-18.
    pub fn charset(&self) -> Option<&str> {
        self.header().field(18).filter(|s| !s.is_empty())
    }

    pub fn set_charset(&mut self, charset: Option<&str>) {
        self.header_mut().set_field(18, charset.unwrap_or(""));
    }

    /// Set MSH-3 and MSH-4 from an `APPLICATION|FACILITY` name.
    pub fn set_sending_application_with_facility(&mut self, name: &str) {
        let (app, facility) = split_application_name(name);
        let msh = self.header_mut();
        msh.set_field(3, app);
        msh.set_field(4, facility);
    }

    /// Set MSH-5 and MSH-6 from an `APPLICATION|FACILITY` name.
    pub fn set_receiving_application_with_facility(&mut self, name: &str) {
        let (app, facility) = split_application_name(name);
        let msh = self.header_mut();
        msh.set_field(5, app);
        msh.set_field(6, facility);
    }

    /// Fail when MSA-1 carries an error or reject acknowledgment code.
    /// Messages without MSA are accepted.
    pub fn check_accepted(&self) -> Result<(), Hl7Error> {
        let Some(msa) = self.segment("MSA") else {
            return Ok(());
        };
        let ack_code = msa.field_or(1, "");
        match ack_code {
            "AE" | "AR" | "CE" | "CR" => Err(Hl7Error::Rejected {
                ack_code: ack_code.to_string(),
                text: msa.field(3).filter(|t| !t.is_empty()).map(str::to_string),
            }),
            _ => Ok(()),
        }
    }

    /// Segments joined by carriage returns, with a trailing terminator.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            out.push_str(&segment.encode(&self.delimiters, i == 0));
            out.push(SEGMENT_TERMINATOR);
        }
        out
    }

    /// Encode and convert to bytes in the given MSH-18 character set.
    pub fn to_bytes(&self, charset: Option<&str>) -> Result<Vec<u8>, Hl7Error> {
        charset::encode(&self.encode(), charset)
    }

    /// Decode bytes in the given MSH-18 character set and parse them.
    pub fn parse(bytes: &[u8], charset: Option<&str>) -> Result<Self, Hl7Error> {
        let text = charset::decode(bytes, charset)?;
        Self::parse_str(&text)
    }

    pub fn parse_str(text: &str) -> Result<Self, Hl7Error> {
        let mut lines = text
            .split(|c| c == SEGMENT_TERMINATOR || c == '\n')
            .filter(|l| !l.is_empty());
        let first = lines.next().ok_or(Hl7Error::MissingHeader)?;
        if !first.starts_with(MSH) {
            return Err(Hl7Error::MissingHeader);
        }
        let delimiters = Delimiters::from_header(first)?;
        let mut segments = vec![Hl7Segment::parse_header(first, &delimiters)?];
        segments.extend(lines.map(|l| Hl7Segment::parse(l, &delimiters)));
        Ok(Hl7Message {
            delimiters,
            segments,
        })
    }
}

fn split_application_name(name: &str) -> (&str, &str) {
    match name.split_once('|') {
        Some((app, facility)) => (app, facility),
        None => (name, ""),
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
