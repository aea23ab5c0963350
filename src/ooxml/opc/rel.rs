//! Relationship objects for OPC packages.
//!
//! A relationships part (`*.rels`) links a source part to its targets by
//! `rId`. docweave reads them to walk workbooks and decks in their declared
//! order, and writes them when generating new containers.

use crate::common::error::Result;
use crate::common::xml::{attr_value, escape_xml};
use crate::ooxml::opc::constants::namespace;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::fmt::Write as FmtWrite;

/// A single relationship from a source part to a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub r_id: String,
    pub reltype: String,
    /// Target reference, relative to the source part's directory unless external
    pub target: String,
    pub is_external: bool,
}

/// Ordered collection of relationships from a single source.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    rels: Vec<Relationship>,
}

impl Relationships {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `.rels` part.
    pub fn from_xml(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(bytes);
        reader.config_mut().trim_text(true);

        let mut rels = Vec::new();
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) | Ok(Event::Empty(e))
                    if e.local_name().as_ref() == b"Relationship" =>
                {
                    let r_id = attr_value(&e, b"Id")?.unwrap_or_default();
                    let reltype = attr_value(&e, b"Type")?.unwrap_or_default();
                    let target = attr_value(&e, b"Target")?.unwrap_or_default();
                    let is_external = attr_value(&e, b"TargetMode")?.as_deref() == Some("External");
                    rels.push(Relationship {
                        r_id,
                        reltype,
                        target,
                        is_external,
                    });
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(e.into()),
                _ => {},
            }
            buf.clear();
        }
        Ok(Self { rels })
    }

    /// Add an internal relationship and return its new `rId`.
    pub fn add(&mut self, reltype: &str, target: &str) -> String {
        let r_id = self.next_r_id();
        self.rels.push(Relationship {
            r_id: r_id.clone(),
            reltype: reltype.to_string(),
            target: target.to_string(),
            is_external: false,
        });
        r_id
    }

    #[inline]
    pub fn get(&self, r_id: &str) -> Option<&Relationship> {
        self.rels.iter().find(|r| r.r_id == r_id)
    }

    /// First relationship of a given type.
    pub fn first_of_type(&self, reltype: &str) -> Option<&Relationship> {
        self.rels.iter().find(|r| r.reltype == reltype)
    }

    /// Next free `rId`, one above the highest numeric id in use.
    fn next_r_id(&self) -> String {
        let max = self
            .rels
            .iter()
            .filter_map(|r| r.r_id.strip_prefix("rId")?.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        format!("rId{}", max + 1)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.rels.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    /// Serialize to `.rels` XML, preserving insertion order.
    pub fn to_xml(&self) -> Result<String> {
        let mut xml = String::with_capacity(256 + self.rels.len() * 160);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        write!(xml, r#"<Relationships xmlns="{}">"#, namespace::OPC_RELATIONSHIPS)?;

        for rel in &self.rels {
            let target_mode = if rel.is_external {
                r#" TargetMode="External""#
            } else {
                ""
            };
            write!(
                xml,
                r#"<Relationship Id="{}" Type="{}" Target="{}"{}/>"#,
                escape_xml(&rel.r_id),
                escape_xml(&rel.reltype),
                escape_xml(&rel.target),
                target_mode
            )?;
        }

        xml.push_str("</Relationships>");
        Ok(xml)
    }
}

/// Resolve a relationship target against the member name of its source part.
///
/// Absolute targets (`/xl/worksheets/sheet1.xml`) drop the leading slash;
/// relative ones are joined onto the source directory with `..` collapsed.
pub fn resolve_target(source_membername: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let base = source_membername
        .rsplit_once('/')
        .map(|(dir, _)| dir)
        .unwrap_or("");
    let mut segments: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {},
            ".." => {
                segments.pop();
            },
            other => segments.push(other),
        }
    }
    segments.join("/")
}
