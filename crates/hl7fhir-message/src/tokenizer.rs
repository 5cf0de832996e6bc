//! HL7 v2.x tokenizer
//!
//! Splits a raw message into segments on `\r`/`\n`, then into fields,
//! repetitions, components and sub-components using the delimiters declared
//! by the message itself. Purely functional over the input string.

use crate::message::{Delimiters, Field, ParsedMessage, Segment};
use hl7fhir_diagnostics::{ConvertError, H2F0001, H2F0002, H2F0003, H2F0004, Result};

/// Tokenize a raw HL7 v2.x message
///
/// The first segment must be MSH; its field separator is the character
/// immediately following the segment name, and the component, repetition,
/// escape and sub-component separators are read positionally from MSH-2,
/// defaulting to `^~\&` when absent or short.
pub fn tokenize(raw: &str) -> Result<ParsedMessage> {
    let lines: Vec<&str> = raw
        .split(['\r', '\n'])
        .filter(|line| !line.is_empty())
        .collect();

    let Some(first) = lines.first() else {
        return Err(ConvertError::malformed(H2F0002, "empty message"));
    };
    if !first.starts_with("MSH") {
        return Err(ConvertError::malformed(
            H2F0001,
            "first segment must be MSH",
        ));
    }

    let (delimiters, msh) = tokenize_msh(first)?;
    let mut segments = vec![msh];

    for line in &lines[1..] {
        segments.push(tokenize_segment(line, &delimiters)?);
    }

    Ok(ParsedMessage::new(delimiters, segments))
}

/// MSH is special: field 1 is the separator character itself and field 2 the
/// encoding characters, neither of which may be decomposed further.
fn tokenize_msh(line: &str) -> Result<(Delimiters, Segment)> {
    let mut chars = line.char_indices().skip(3);
    let Some((sep_pos, field_sep)) = chars.next() else {
        return Err(ConvertError::malformed(
            H2F0004,
            "MSH segment ends before the field separator",
        ));
    };

    let rest = &line[sep_pos + field_sep.len_utf8()..];
    let mut parts = rest.split(field_sep);
    let encoding = parts.next().unwrap_or("");
    let delimiters = Delimiters::from_encoding(field_sep, encoding);

    let mut fields = vec![
        Field::verbatim(&field_sep.to_string()),
        Field::verbatim(encoding),
    ];
    fields.extend(parts.map(|part| Field::parse(part, &delimiters)));

    Ok((delimiters, Segment::new("MSH", fields)))
}

fn tokenize_segment(line: &str, delimiters: &Delimiters) -> Result<Segment> {
    let mut parts = line.split(delimiters.field);
    let name = parts.next().unwrap_or("");

    if !(2..=3).contains(&name.chars().count())
        || !name.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(ConvertError::malformed(
            H2F0003,
            format!("illegal segment name '{name}'"),
        ));
    }

    let fields = parts.map(|part| Field::parse(part, delimiters)).collect();
    Ok(Segment::new(name, fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const ADT_A01: &str = "MSH|^~\\&|MEDIBOARD|SCELERIS|FHIR|ANS|20240517101530||ADT^A01|12345678|P|2.5\r\
EVN|A01|20240517101530\r\
PID|1||279035121518815^^^ASIP-SANTE-INS-NIR&1.2.250.1.213.1.4.8&ISO^INS~123456^^^MEDIBOARD^PI||SECLET^MARYSE^MARYSE BERTHE ALICE^^^^L|||F|||12 RUE DE LA PAIX^^PARIS^^75002^FRA||0612345678^PRN^CP~maryse.seclet@example.fr^NET^Internet\r\
PV1|1|I|UF1^CH2^LIT3|||||||||||||||123456789\r\
ZBE|MVT001|20240517101530||INSERT";

    #[test]
    fn test_tokenize_adt() {
        let msg = tokenize(ADT_A01).unwrap();
        assert_eq!(msg.segments.len(), 5);
        assert_eq!(msg.segments[0].name, "MSH");
        assert_eq!(msg.message_type, "ADT");
        assert_eq!(msg.trigger_event, "A01");
        assert_eq!(msg.control_id, "12345678");
        assert!(msg.has_segment("ZBE"));
    }

    #[test]
    fn test_msh_field_one_is_separator() {
        let msg = tokenize(ADT_A01).unwrap();
        let msh = msg.segment("MSH").unwrap();
        assert_eq!(msh.field_value(1), "|");
        assert_eq!(msh.field_value(2), "^~\\&");
        assert_eq!(msh.field_value(3), "MEDIBOARD");
    }

    #[test]
    fn test_encoding_characters_not_decomposed() {
        let msg = tokenize(ADT_A01).unwrap();
        let msh = msg.segment("MSH").unwrap();
        // MSH-2 contains the component separator but must stay one component
        let field = msh.field(2).unwrap();
        assert_eq!(field.first().unwrap().components.len(), 1);
    }

    #[test]
    fn test_custom_delimiters() {
        let raw = "MSH#*~\\&#APP#FAC#####ADT*A08#42#P#2.5\rPID#1##ID123##DUPONT*JEAN";
        let msg = tokenize(raw).unwrap();
        assert_eq!(msg.delimiters.field, '#');
        assert_eq!(msg.delimiters.component, '*');
        let pid = msg.segment("PID").unwrap();
        let name = pid.field(5).unwrap().first().unwrap();
        assert_eq!(name.component_value(1), "DUPONT");
        assert_eq!(name.component_value(2), "JEAN");
    }

    #[test]
    fn test_repetitions_split() {
        let msg = tokenize(ADT_A01).unwrap();
        let pid = msg.segment("PID").unwrap();
        let ids = pid.field(3).unwrap();
        assert_eq!(ids.repetitions.len(), 2);
        assert_eq!(ids.repetitions[0].component_value(1), "279035121518815");
        assert_eq!(ids.repetitions[1].component_value(1), "123456");
    }

    #[test]
    fn test_missing_msh_fails() {
        let err = tokenize("PID|1||12345").unwrap_err();
        assert_eq!(err.kind(), "MalformedMessage");
    }

    #[test]
    fn test_empty_message_fails() {
        assert!(tokenize("").is_err());
        assert!(tokenize("\r\n\r\n").is_err());
    }

    #[test]
    fn test_illegal_segment_name_fails() {
        let raw = "MSH|^~\\&|APP\rP!D|1";
        assert!(tokenize(raw).is_err());
        let raw = "MSH|^~\\&|APP\rTOOLONG|1";
        assert!(tokenize(raw).is_err());
    }

    #[test]
    fn test_two_letter_segment_name_allowed() {
        let raw = "MSH|^~\\&|APP\rZB|1";
        assert!(tokenize(raw).is_ok());
    }

    #[test]
    fn test_crlf_and_lf_terminators() {
        let crlf = "MSH|^~\\&|APP\r\nPID|1";
        let lf = "MSH|^~\\&|APP\nPID|1";
        assert_eq!(tokenize(crlf).unwrap(), tokenize(lf).unwrap());
    }

    proptest! {
        // Re-tokenizing the same text yields an identical structure with
        // stable segment/field/component counts.
        #[test]
        fn tokenize_is_idempotent(fields in proptest::collection::vec("[A-Za-z0-9 ^~&]{0,20}", 1..8)) {
            let raw = format!("MSH|^~\\&|APP|FAC\rPID|{}", fields.join("|"));
            let first = tokenize(&raw).unwrap();
            let second = tokenize(&raw).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.segments.len(), 2);
            let pid = first.segment("PID").unwrap();
            prop_assert_eq!(pid.field_count(), fields.len());
        }
    }
}
