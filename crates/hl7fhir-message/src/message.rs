//! Positional HL7 message structure
//!
//! Field access is 1-based per HL7 convention: `segment.field(5)` is PID-5.
//! Index 0 is reserved for the segment name, except MSH where field 1 is
//! literally the field separator character and field 2 the encoding characters.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The delimiter set a message declares in MSH-1/MSH-2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delimiters {
    pub field: char,
    pub component: char,
    pub repetition: char,
    pub escape: char,
    pub subcomponent: char,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            field: '|',
            component: '^',
            repetition: '~',
            escape: '\\',
            subcomponent: '&',
        }
    }
}

impl Delimiters {
    /// Build from a field separator and the MSH-2 encoding characters,
    /// filling missing positions with the standard `^~\&` defaults.
    pub fn from_encoding(field: char, encoding: &str) -> Self {
        let mut chars = encoding.chars();
        let defaults = Self::default();
        Self {
            field,
            component: chars.next().unwrap_or(defaults.component),
            repetition: chars.next().unwrap_or(defaults.repetition),
            escape: chars.next().unwrap_or(defaults.escape),
            subcomponent: chars.next().unwrap_or(defaults.subcomponent),
        }
    }
}

/// A single component, possibly decomposed into sub-components on `&`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Raw component text, escape sequences included
    pub value: String,
    /// Sub-components; a component without `&` has exactly one
    pub subcomponents: Vec<String>,
}

impl Component {
    pub(crate) fn parse(raw: &str, delims: &Delimiters) -> Self {
        Self {
            value: raw.to_string(),
            subcomponents: raw.split(delims.subcomponent).map(str::to_string).collect(),
        }
    }

    /// Build a component that is never decomposed (MSH-1/MSH-2)
    pub(crate) fn verbatim(raw: &str) -> Self {
        Self {
            value: raw.to_string(),
            subcomponents: vec![raw.to_string()],
        }
    }

    /// 1-based sub-component access
    pub fn subcomponent(&self, index: usize) -> Option<&str> {
        if index == 0 {
            return None;
        }
        self.subcomponents.get(index - 1).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// One repetition of a field; components are positional, empty ones preserved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repetition {
    pub components: Vec<Component>,
}

impl Repetition {
    pub(crate) fn parse(raw: &str, delims: &Delimiters) -> Self {
        Self {
            components: raw
                .split(delims.component)
                .map(|c| Component::parse(c, delims))
                .collect(),
        }
    }

    /// 1-based component access
    pub fn component(&self, index: usize) -> Option<&Component> {
        if index == 0 {
            return None;
        }
        self.components.get(index - 1)
    }

    /// Raw text of a component, empty string when absent
    pub fn component_value(&self, index: usize) -> &str {
        self.component(index).map_or("", |c| c.value.as_str())
    }
}

/// A field value: one or more repetitions split on the repetition separator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub repetitions: Vec<Repetition>,
}

impl Field {
    pub(crate) fn parse(raw: &str, delims: &Delimiters) -> Self {
        Self {
            repetitions: raw
                .split(delims.repetition)
                .map(|r| Repetition::parse(r, delims))
                .collect(),
        }
    }

    pub(crate) fn verbatim(raw: &str) -> Self {
        Self {
            repetitions: vec![Repetition {
                components: vec![Component::verbatim(raw)],
            }],
        }
    }

    /// The first repetition, present for every non-synthetic field
    pub fn first(&self) -> Option<&Repetition> {
        self.repetitions.first()
    }

    /// Raw text of the whole first repetition's first component
    pub fn value(&self) -> &str {
        self.first().map_or("", |r| r.component_value(1))
    }

    pub fn is_empty(&self) -> bool {
        self.repetitions
            .iter()
            .all(|r| r.components.iter().all(Component::is_empty))
    }
}

/// A named segment with 1-based field access
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub name: String,
    pub(crate) fields: Vec<Field>,
}

impl Segment {
    pub(crate) fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// 1-based field access; `field(5)` on a PID segment is PID-5
    pub fn field(&self, index: usize) -> Option<&Field> {
        if index == 0 {
            return None;
        }
        self.fields.get(index - 1)
    }

    /// Raw text of a field's first repetition's first component
    pub fn field_value(&self, index: usize) -> &str {
        self.field(index).map_or("", Field::value)
    }

    /// Number of fields present
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

/// A tokenized message: ordered segments plus a name index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedMessage {
    pub delimiters: Delimiters,
    pub segments: Vec<Segment>,
    /// MSH-9.1 message code (e.g. "ADT")
    pub message_type: String,
    /// MSH-9.2 trigger event (e.g. "A01")
    pub trigger_event: String,
    /// MSH-10 message control id
    pub control_id: String,
    index: HashMap<String, Vec<usize>>,
}

impl ParsedMessage {
    pub(crate) fn new(delimiters: Delimiters, segments: Vec<Segment>) -> Self {
        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        for (pos, segment) in segments.iter().enumerate() {
            index.entry(segment.name.clone()).or_default().push(pos);
        }
        let msh = &segments[0];
        let (message_type, trigger_event) = msh
            .field(9)
            .and_then(Field::first)
            .map(|r| {
                (
                    r.component_value(1).to_string(),
                    r.component_value(2).to_string(),
                )
            })
            .unwrap_or_default();
        let control_id = msh.field_value(10).to_string();
        Self {
            delimiters,
            segments,
            message_type,
            trigger_event,
            control_id,
            index,
        }
    }

    /// First segment with the given name
    pub fn segment(&self, name: &str) -> Option<&Segment> {
        self.index
            .get(name)
            .and_then(|positions| positions.first())
            .map(|&pos| &self.segments[pos])
    }

    /// All segments with the given name, in message order
    pub fn segments_named(&self, name: &str) -> Vec<&Segment> {
        self.index
            .get(name)
            .map(|positions| positions.iter().map(|&pos| &self.segments[pos]).collect())
            .unwrap_or_default()
    }

    pub fn has_segment(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }
}
