//! BPMN process parsing.
//!
//! Reads a BPMN 2.0 XML definition into a small element tree and extracts
//! the template references carried by its sequence flows. Nodes are
//! referenced as `task-<id>`, `gateway-<id>` and `event-<id>`; the numeric
//! part is the id of the template row backing the node.

use std::borrow::Cow;
use std::sync::LazyLock;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;

use crate::error::CoreError;
use crate::types::DbId;

/// Namespace prefix written by older modeler exports.
const LEGACY_PREFIX: &str = "bpmn2:";

/// Namespace prefix the parser expects.
const BPMN_PREFIX: &str = "bpmn:";

static NODE_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(task|gateway|event)-(\d+)$").expect("valid regex")
});

// ---------------------------------------------------------------------------
// Element tree
// ---------------------------------------------------------------------------

/// One XML element with its attributes and child elements. Text is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    /// Qualified name as written, e.g. `bpmn:sequenceFlow`.
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// Value of the attribute with the given key, if present.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Child elements that are the BPMN element `local` (prefixed or not).
    pub fn bpmn_children<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children
            .iter()
            .filter(move |child| is_bpmn_element(&child.name, local))
    }
}

fn is_bpmn_element(name: &str, local: &str) -> bool {
    name == local || name.strip_prefix(BPMN_PREFIX) == Some(local)
}

// ---------------------------------------------------------------------------
// Node references
// ---------------------------------------------------------------------------

/// A template reference parsed from a sequence-flow endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Task(DbId),
    Gateway(DbId),
    Event(DbId),
}

/// Parse `task-12001` style references.
///
/// Returns `None` for other node ids (start/end markers, lanes), for a zero
/// id and for ids that do not fit an `i64`. Those are placeholders, not
/// errors.
pub fn parse_node_ref(reference: &str) -> Option<NodeRef> {
    let caps = NODE_REF_RE.captures(reference.trim())?;
    let id: DbId = caps[2].parse().ok()?;
    if id == 0 {
        return None;
    }
    match caps[1].to_ascii_lowercase().as_str() {
        "task" => Some(NodeRef::Task(id)),
        "gateway" => Some(NodeRef::Gateway(id)),
        "event" => Some(NodeRef::Event(id)),
        _ => None,
    }
}

/// Sequence-flow endpoints of the first process in a BPMN definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessGraph {
    /// Every `sourceRef`/`targetRef`, deduplicated, in document order.
    pub node_refs: Vec<String>,
}

impl ProcessGraph {
    /// Parsed template references, deduplicated, in document order.
    pub fn template_refs(&self) -> Vec<NodeRef> {
        let mut refs = Vec::new();
        for node_ref in self.node_refs.iter().filter_map(|r| parse_node_ref(r)) {
            if !refs.contains(&node_ref) {
                refs.push(node_ref);
            }
        }
        refs
    }

    pub fn task_template_ids(&self) -> Vec<DbId> {
        self.template_refs()
            .into_iter()
            .filter_map(|r| match r {
                NodeRef::Task(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn gateway_template_ids(&self) -> Vec<DbId> {
        self.template_refs()
            .into_iter()
            .filter_map(|r| match r {
                NodeRef::Gateway(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn event_template_ids(&self) -> Vec<DbId> {
        self.template_refs()
            .into_iter()
            .filter_map(|r| match r {
                NodeRef::Event(id) => Some(id),
                _ => None,
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Public functions
// ---------------------------------------------------------------------------

/// Rewrite the legacy `bpmn2:` prefix to `bpmn:`.
pub fn normalize_namespace(xml: &str) -> Cow<'_, str> {
    if xml.contains(LEGACY_PREFIX) {
        Cow::Owned(xml.replace(LEGACY_PREFIX, BPMN_PREFIX))
    } else {
        Cow::Borrowed(xml)
    }
}

/// Parse an XML document into its root element.
pub fn parse_xml(xml: &str) -> Result<XmlElement, CoreError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| CoreError::InvalidXml(format!("at position {}: {e}", reader.buffer_position())))?;

        match event {
            Event::Start(start) => stack.push(element_from_start(&start)?),
            Event::Empty(start) => {
                let element = element_from_start(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| CoreError::InvalidXml("unbalanced closing tag".to_string()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(CoreError::InvalidXml(
            "document ended before all elements were closed".to_string(),
        ));
    }
    root.ok_or_else(|| CoreError::InvalidXml("document has no root element".to_string()))
}

/// Normalize, parse and extract the sequence-flow graph of a BPMN schema.
///
/// Fails with [`CoreError::InvalidXml`] when the XML is malformed or has no
/// `definitions.process` element.
pub fn parse_process_graph(xml: &str) -> Result<ProcessGraph, CoreError> {
    let normalized = normalize_namespace(xml);
    let root = parse_xml(&normalized)?;

    if !is_bpmn_element(&root.name, "definitions") {
        return Err(CoreError::InvalidXml(format!(
            "expected a definitions root element, found '{}'",
            root.name
        )));
    }

    let process = root
        .bpmn_children("process")
        .next()
        .ok_or_else(|| CoreError::InvalidXml("definitions has no process element".to_string()))?;

    let mut node_refs: Vec<String> = Vec::new();
    for flow in process.bpmn_children("sequenceFlow") {
        for key in ["sourceRef", "targetRef"] {
            if let Some(value) = flow.attribute(key) {
                if !value.is_empty() && !node_refs.iter().any(|r| r == value) {
                    node_refs.push(value.to_string());
                }
            }
        }
    }

    Ok(ProcessGraph { node_refs })
}

/// Point every `task-|event-|gateway-<old_id>` reference at `new_id`.
///
/// Matching is case-insensitive and global; the prefix keeps its original
/// casing.
pub fn rewrite_node_refs(xml: &str, old_id: DbId, new_id: DbId) -> Result<String, CoreError> {
    let pattern = Regex::new(&format!("(?i)(task|event|gateway)-{old_id}"))
        .map_err(|e| CoreError::Internal(format!("Failed to build node reference pattern: {e}")))?;
    Ok(pattern
        .replace_all(xml, |caps: &regex::Captures<'_>| format!("{}-{new_id}", &caps[1]))
        .into_owned())
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn element_from_start(start: &BytesStart<'_>) -> Result<XmlElement, CoreError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| CoreError::InvalidXml(format!("bad attribute on <{name}>: {e}")))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| CoreError::InvalidXml(format!("bad attribute value on <{name}>: {e}")))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(XmlElement {
        name,
        attributes,
        children: Vec::new(),
    })
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), CoreError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(CoreError::InvalidXml(
                "document has more than one root element".to_string(),
            ))
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn sample_bpmn() -> &'static str {
        r#"<?xml version="1.0" encoding="UTF-8"?>
<bpmn:definitions xmlns:bpmn="http://www.omg.org/spec/BPMN/20100524/MODEL" id="Definitions_1">
  <bpmn:process id="Process_1" isExecutable="false">
    <bpmn:startEvent id="StartEvent_1" />
    <bpmn:task id="task-123001" name="Fill in the form" />
    <bpmn:exclusiveGateway id="gateway-123002" />
    <bpmn:task id="task-123003" />
    <bpmn:intermediateThrowEvent id="event-123004" />
    <bpmn:sequenceFlow id="Flow_1" sourceRef="StartEvent_1" targetRef="task-123001" />
    <bpmn:sequenceFlow id="Flow_2" sourceRef="task-123001" targetRef="gateway-123002" />
    <bpmn:sequenceFlow id="Flow_3" sourceRef="gateway-123002" targetRef="task-123003" />
    <bpmn:sequenceFlow id="Flow_4" sourceRef="gateway-123002" targetRef="event-123004" />
    <bpmn:sequenceFlow id="Flow_5" sourceRef="event-123004" targetRef="Task-0" />
  </bpmn:process>
</bpmn:definitions>"#
    }

    // -- parse_node_ref --------------------------------------------------------

    #[test]
    fn node_ref_prefixes_are_case_insensitive() {
        assert_eq!(parse_node_ref("task-12001"), Some(NodeRef::Task(12001)));
        assert_eq!(parse_node_ref("Gateway-12002"), Some(NodeRef::Gateway(12002)));
        assert_eq!(parse_node_ref("EVENT-12003"), Some(NodeRef::Event(12003)));
    }

    #[test]
    fn zero_and_non_numeric_refs_are_skipped() {
        assert_eq!(parse_node_ref("task-0"), None);
        assert_eq!(parse_node_ref("task-abc"), None);
        assert_eq!(parse_node_ref("StartEvent_1"), None);
        assert_eq!(parse_node_ref("task-99999999999999999999999"), None);
    }

    // -- parse_process_graph ---------------------------------------------------

    #[test]
    fn sequence_flow_refs_are_deduplicated_in_order() {
        let graph = parse_process_graph(sample_bpmn()).unwrap();
        assert_eq!(
            graph.node_refs,
            vec![
                "StartEvent_1",
                "task-123001",
                "gateway-123002",
                "task-123003",
                "event-123004",
                "Task-0"
            ]
        );
    }

    #[test]
    fn template_ids_are_split_by_kind() {
        let graph = parse_process_graph(sample_bpmn()).unwrap();
        assert_eq!(graph.task_template_ids(), vec![123001, 123003]);
        assert_eq!(graph.gateway_template_ids(), vec![123002]);
        assert_eq!(graph.event_template_ids(), vec![123004]);
    }

    #[test]
    fn legacy_bpmn2_prefix_is_accepted() {
        let legacy = sample_bpmn().replace("bpmn:", "bpmn2:");
        let graph = parse_process_graph(&legacy).unwrap();
        assert_eq!(graph.task_template_ids(), vec![123001, 123003]);
    }

    #[test]
    fn unprefixed_definitions_are_accepted() {
        let xml = r#"<definitions><process id="p"><sequenceFlow sourceRef="task-5001" targetRef="event-5002"/></process></definitions>"#;
        let graph = parse_process_graph(xml).unwrap();
        assert_eq!(graph.task_template_ids(), vec![5001]);
        assert_eq!(graph.event_template_ids(), vec![5002]);
    }

    #[test]
    fn process_without_flows_yields_empty_graph() {
        let xml = r#"<bpmn:definitions><bpmn:process id="p"/></bpmn:definitions>"#;
        let graph = parse_process_graph(xml).unwrap();
        assert!(graph.node_refs.is_empty());
    }

    #[test]
    fn malformed_xml_is_invalid() {
        let result = parse_process_graph("<bpmn:definitions><bpmn:process>");
        assert_matches!(result, Err(CoreError::InvalidXml(_)));

        let result = parse_process_graph("<a></b>");
        assert_matches!(result, Err(CoreError::InvalidXml(_)));

        let result = parse_process_graph("not xml at all");
        assert_matches!(result, Err(CoreError::InvalidXml(_)));
    }

    #[test]
    fn missing_process_is_invalid() {
        let result = parse_process_graph(r#"<bpmn:definitions id="d"></bpmn:definitions>"#);
        assert_matches!(result, Err(CoreError::InvalidXml(msg)) if msg.contains("process"));
    }

    #[test]
    fn wrong_root_is_invalid() {
        let result = parse_process_graph(r#"<semantic:definitions><semantic:process/></semantic:definitions>"#);
        assert_matches!(result, Err(CoreError::InvalidXml(_)));
    }

    #[test]
    fn attributes_are_unescaped() {
        let root = parse_xml(r#"<a name="x &amp; y"/>"#).unwrap();
        assert_eq!(root.attribute("name"), Some("x & y"));
    }

    // -- rewrite_node_refs -----------------------------------------------------

    #[test]
    fn node_refs_are_rewritten_keeping_case() {
        let xml = r#"<task id="task-123002"/><x targetRef="Event-123004"/><g id="GATEWAY-123003"/>"#;
        let rewritten = rewrite_node_refs(xml, 123, 456).unwrap();
        assert_eq!(
            rewritten,
            r#"<task id="task-456002"/><x targetRef="Event-456004"/><g id="GATEWAY-456003"/>"#
        );
    }

    #[test]
    fn unrelated_ids_are_left_alone() {
        let xml = r#"<x id="StartEvent_123001" ref="task-124001"/>"#;
        assert_eq!(rewrite_node_refs(xml, 123, 456).unwrap(), xml);
    }
}
