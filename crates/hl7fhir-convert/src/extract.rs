//! Typed field extractors over HL7 composite field grammar
//!
//! Pure functions from a tokenized [`Field`] to normalized FHIR datatypes.
//! Date extraction fails soft (returns `None`); callers record the warning.

use crate::fhir::{Address, CodeableConcept, Coding, ContactPoint, HumanName, Identifier};
use hl7fhir_message::{Field, Repetition};
use hl7fhir_terminology::TerminologyTables;
use once_cell::sync::Lazy;
use regex::Regex;

/// HL7 name-use codes (table 0200) to FHIR name use
fn name_use(code: &str) -> &'static str {
    match code {
        "D" => "usual",
        "M" => "maiden",
        "N" => "nickname",
        // L and anything unrecognized count as the official name
        _ => "official",
    }
}

/// Extract every name repetition of an XPN field (e.g. PID-5)
///
/// Component 1 is the family name, component 2 the first given name and
/// component 3 holds additional given names space-separated within the one
/// component; they are split, order preserved, and de-duplicated against the
/// first given name. Repetitions without a family name are dropped. When two
/// repetitions share the same (family, use) pair the variant with strictly
/// more given names wins.
pub fn names(field: &Field) -> Vec<HumanName> {
    let mut selected: Vec<HumanName> = Vec::new();

    for rep in &field.repetitions {
        let family = rep.component_value(1);
        if family.is_empty() {
            continue;
        }

        let mut given: Vec<String> = Vec::new();
        let first_given = rep.component_value(2);
        if !first_given.is_empty() {
            given.push(first_given.to_string());
        }
        for token in rep.component_value(3).split_whitespace() {
            if !given.iter().any(|g| g == token) {
                given.push(token.to_string());
            }
        }

        let candidate = HumanName {
            use_: Some(name_use(rep.component_value(7)).to_string()),
            family: Some(family.to_string()),
            given,
            prefix: single(rep.component_value(5)),
            suffix: single(rep.component_value(4)),
        };

        match selected
            .iter_mut()
            .find(|n| n.family == candidate.family && n.use_ == candidate.use_)
        {
            Some(existing) => {
                if candidate.given.len() > existing.given.len() {
                    *existing = candidate;
                }
            }
            None => selected.push(candidate),
        }
    }

    selected
}

fn single(value: &str) -> Vec<String> {
    if value.is_empty() {
        Vec::new()
    } else {
        vec![value.to_string()]
    }
}

/// Extract identifiers from a CX field (e.g. PID-3)
///
/// Component 1 is the value, component 4 the assigning authority (first
/// sub-component the authority name, second an OID when present) and
/// component 5 the identifier type code, resolved through the catalog's
/// identifier table.
pub fn identifiers(field: &Field, tables: &TerminologyTables) -> Vec<Identifier> {
    field
        .repetitions
        .iter()
        .filter_map(|rep| identifier(rep, tables))
        .collect()
}

fn identifier(rep: &Repetition, tables: &TerminologyTables) -> Option<Identifier> {
    let value = rep.component_value(1);
    if value.is_empty() {
        return None;
    }

    let authority = rep.component(4);
    let authority_name = authority.and_then(|c| c.subcomponent(1)).unwrap_or("");
    let authority_oid = authority
        .and_then(|c| c.subcomponent(2))
        .filter(|oid| !oid.is_empty());

    let system = if let Some(oid) = authority_oid {
        Some(format!("urn:oid:{oid}"))
    } else if let Some(oid) = tables.known_oid(authority_name) {
        Some(format!("urn:oid:{oid}"))
    } else if !authority_name.is_empty() {
        Some(tables.system(authority_name))
    } else {
        None
    };

    let type_code = rep
        .component(5)
        .and_then(|c| c.subcomponent(1))
        .unwrap_or("");
    let type_ = (!type_code.is_empty()).then(|| {
        let concept = tables.identifier_type(type_code);
        CodeableConcept::from_coding(Coding::new(
            tables.system("IDENTIFIER-TYPE"),
            concept.code,
            concept.display,
        ))
    });

    Some(Identifier {
        use_: None,
        type_,
        system,
        value: Some(value.to_string()),
    })
}

/// Extract addresses from an XAD field (e.g. PID-11), one per repetition
pub fn addresses(field: &Field) -> Vec<Address> {
    field
        .repetitions
        .iter()
        .filter_map(|rep| {
            let address = Address {
                line: single(rep.component_value(1)),
                city: optional(rep.component_value(3)),
                postal_code: optional(rep.component_value(5)),
                country: optional(rep.component_value(6)),
            };
            (address != Address::default()).then_some(address)
        })
        .collect()
}

/// Extract contact points from an XTN field (e.g. PID-13), one per repetition
///
/// Equipment type (component 3) decides the system: network addresses become
/// email (value from component 4 when present), cell phones get use `mobile`.
pub fn telecoms(field: &Field) -> Vec<ContactPoint> {
    field
        .repetitions
        .iter()
        .filter_map(|rep| {
            let number = rep.component_value(1);
            let equipment = rep.component_value(3).to_ascii_uppercase();
            let is_email = equipment.contains("NET") || equipment.contains("INTERNET");

            let value = if is_email {
                let email = rep.component_value(4);
                if email.is_empty() { number } else { email }
            } else {
                number
            };
            if value.is_empty() {
                return None;
            }

            let use_ = if equipment == "CP" {
                Some("mobile".to_string())
            } else {
                match rep.component_value(2) {
                    "PRN" => Some("home".to_string()),
                    "WPN" => Some("work".to_string()),
                    _ => None,
                }
            };

            Some(ContactPoint {
                system: Some(if is_email { "email" } else { "phone" }.to_string()),
                value: Some(value.to_string()),
                use_,
            })
        })
        .collect()
}

fn optional(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

// HL7 compact timestamp: YYYY[MM[DD[HHMM[SS][.ffff]]]][+/-ZZZZ]
static TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d{4})(?:(\d{2})(?:(\d{2})(?:(\d{2})(\d{2})(?:(\d{2}))?(?:\.(\d{1,4}))?)?)?)?([+-]\d{4})?$",
    )
    .expect("timestamp pattern is valid")
});

struct Timestamp {
    date: String,
    time: Option<String>,
    offset: Option<String>,
}

fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let caps = TIMESTAMP.captures(raw.trim())?;

    let year: i32 = caps[1].parse().ok()?;
    let month: Option<u32> = caps.get(2).and_then(|m| m.as_str().parse().ok());
    let day: Option<u32> = caps.get(3).and_then(|m| m.as_str().parse().ok());

    // Reject calendar-impossible dates, not just shape mismatches
    chrono::NaiveDate::from_ymd_opt(year, month.unwrap_or(1), day.unwrap_or(1))?;

    let date = match (month, day) {
        (Some(m), Some(d)) => format!("{year:04}-{m:02}-{d:02}"),
        (Some(m), None) => format!("{year:04}-{m:02}"),
        _ => format!("{year:04}"),
    };

    let time = match (caps.get(4), caps.get(5)) {
        (Some(h), Some(min)) => {
            let hour: u32 = h.as_str().parse().ok()?;
            let minute: u32 = min.as_str().parse().ok()?;
            let second: u32 = caps.get(6).and_then(|s| s.as_str().parse().ok()).unwrap_or(0);
            chrono::NaiveTime::from_hms_opt(hour, minute, second)?;
            Some(format!("{hour:02}:{minute:02}:{second:02}"))
        }
        _ => None,
    };

    let offset = caps.get(8).map(|o| {
        let raw = o.as_str();
        format!("{}:{}", &raw[..3], &raw[3..])
    });

    Some(Timestamp { date, time, offset })
}

/// Extract a FHIR `date` (`YYYY[-MM[-DD]]`) from a DTM field
///
/// Fails soft: an unparseable value yields `None` and the caller records a
/// warning instead of aborting the conversion.
pub fn date(field: &Field) -> Option<String> {
    parse_timestamp(field.value()).map(|ts| ts.date)
}

/// Extract a FHIR `dateTime` from a DTM field; timestamps without an explicit
/// zone default to UTC, since a dateTime with a time requires an offset
pub fn datetime(field: &Field) -> Option<String> {
    let ts = parse_timestamp(field.value())?;
    Some(match ts.time {
        Some(time) => {
            let offset = ts.offset.unwrap_or_else(|| "+00:00".to_string());
            format!("{}T{}{}", ts.date, time, offset)
        }
        None => ts.date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hl7fhir_message::tokenize;
    use hl7fhir_terminology::Catalog;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn field(raw: &str) -> Field {
        let msg = tokenize(&format!("MSH|^~\\&|APP\rPID|{raw}")).unwrap();
        msg.segment("PID").unwrap().field(1).unwrap().clone()
    }

    #[test]
    fn test_name_additional_givens_split_and_deduplicated() {
        let names = names(&field("SECLET^MARYSE^MARYSE BERTHE ALICE^^^^L"));
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].family.as_deref(), Some("SECLET"));
        assert_eq!(names[0].given, vec!["MARYSE", "BERTHE", "ALICE"]);
        assert_eq!(names[0].use_.as_deref(), Some("official"));
    }

    #[test]
    fn test_name_repetitions_with_distinct_uses_not_merged() {
        let names = names(&field(
            "SECLET^^^^MME^^D~SECLET^MARYSE^MARYSE BERTHE ALICE^^^^L",
        ));
        assert_eq!(names.len(), 2);
        let usual = names.iter().find(|n| n.use_.as_deref() == Some("usual")).unwrap();
        assert!(usual.given.is_empty());
        assert_eq!(usual.prefix, vec!["MME"]);
        let official = names.iter().find(|n| n.use_.as_deref() == Some("official")).unwrap();
        assert_eq!(official.given.len(), 3);
    }

    #[test]
    fn test_name_same_family_and_use_most_givens_wins() {
        let names = names(&field("SECLET^MARYSE^^^^^L~SECLET^MARYSE^MARYSE BERTHE^^^^L"));
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].given, vec!["MARYSE", "BERTHE"]);
    }

    #[test]
    fn test_name_empty_family_dropped() {
        let names = names(&field("^JEAN^^^^^L"));
        assert!(names.is_empty());
    }

    #[test]
    fn test_identifier_authority_oid_becomes_system() {
        let catalog = Catalog::embedded().unwrap();
        let ids = identifiers(
            &field("279035121518815^^^ASIP-SANTE-INS-NIR&1.2.250.1.213.1.4.8&ISO^INS"),
            &catalog.snapshot(),
        );
        assert_eq!(ids.len(), 1);
        assert_eq!(ids[0].system.as_deref(), Some("urn:oid:1.2.250.1.213.1.4.8"));
        assert_eq!(ids[0].value.as_deref(), Some("279035121518815"));
        let type_ = ids[0].type_.as_ref().unwrap();
        assert_eq!(type_.coding[0].code.as_deref(), Some("INS"));
    }

    #[test]
    fn test_identifier_authority_name_resolved_via_oid_table() {
        let catalog = Catalog::embedded().unwrap();
        let ids = identifiers(&field("123456^^^INS-C^PI"), &catalog.snapshot());
        assert_eq!(ids[0].system.as_deref(), Some("urn:oid:1.2.250.1.213.1.4.2"));
    }

    #[test]
    fn test_identifier_empty_repetition_skipped() {
        let catalog = Catalog::embedded().unwrap();
        let ids = identifiers(&field("^^^X~123^^^MEDIBOARD^PI"), &catalog.snapshot());
        assert_eq!(ids.len(), 1);
        assert_eq!(ids[0].value.as_deref(), Some("123"));
    }

    #[test]
    fn test_address() {
        let addrs = addresses(&field("12 RUE DE LA PAIX^^PARIS^^75002^FRA"));
        assert_eq!(addrs.len(), 1);
        assert_eq!(addrs[0].line, vec!["12 RUE DE LA PAIX"]);
        assert_eq!(addrs[0].city.as_deref(), Some("PARIS"));
        assert_eq!(addrs[0].postal_code.as_deref(), Some("75002"));
        assert_eq!(addrs[0].country.as_deref(), Some("FRA"));
    }

    #[test]
    fn test_telecom_phone_and_email() {
        let points = telecoms(&field(
            "0612345678^PRN^CP~maryse.seclet@example.fr^NET^Internet",
        ));
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].system.as_deref(), Some("phone"));
        assert_eq!(points[0].use_.as_deref(), Some("mobile"));
        assert_eq!(points[1].system.as_deref(), Some("email"));
        assert_eq!(points[1].value.as_deref(), Some("maryse.seclet@example.fr"));
    }

    #[rstest]
    #[case("1973", "1973")]
    #[case("197304", "1973-04")]
    #[case("19730412", "1973-04-12")]
    fn test_date_precision(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(date(&field(raw)).as_deref(), Some(expected));
    }

    #[rstest]
    #[case("20240517101530", "2024-05-17T10:15:30+00:00")]
    #[case("20240517101530+0200", "2024-05-17T10:15:30+02:00")]
    #[case("20240517101530.1234-0500", "2024-05-17T10:15:30-05:00")]
    #[case("202405171015", "2024-05-17T10:15:00+00:00")]
    fn test_datetime(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(datetime(&field(raw)).as_deref(), Some(expected));
    }

    #[rstest]
    #[case("NOT_A_DATE")]
    #[case("19731341")] // month 13
    #[case("2024051")] // truncated day
    fn test_unparseable_dates_fail_soft(#[case] raw: &str) {
        assert_eq!(date(&field(raw)), None);
        assert_eq!(datetime(&field(raw)), None);
    }
}
