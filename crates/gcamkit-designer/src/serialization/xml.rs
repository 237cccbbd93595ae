//! XML codec
//!
//! Documents look like:
//!
//! ```xml
//! <gcam version="1" name="bracket" units="millimeter" ...>
//!   <tool comment="" flags="0" diameter="3.175" .../>
//!   <sketch comment="outline" flags="0" taper-offset="0 0" ...>
//!     <line comment="" flags="0" p0="0 0" p1="10 0"/>
//!     <extrusion comment="" flags="0" resolution="1" cut-side="outside">
//!       <line comment="" flags="0" p0="0 0" p1="0 -3"/>
//!     </extrusion>
//!   </sketch>
//! </gcam>
//! ```
//!
//! Attributes are kebab-case, floats use the shortest text that parses back to
//! the same value, vectors are space separated and booleans are `0|1`.

use gcamkit_core::{MachineOptions, ProgramConfig, Vec2, Vec3};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::fmt::Display;
use std::str::FromStr;
use tracing::debug;

use crate::block::{Block, BlockFlags, BlockKind};
use crate::error::{CodecError, CodecResult};
use crate::program::{BlockId, Program, Slot};

/// Current document version.
pub const XML_VERSION: u32 = 1;

const ROOT: &str = "gcam";

fn xml_err<E: Display>(e: E) -> CodecError {
    CodecError::Xml(e.to_string())
}

fn escape_attr(value: &str) -> String {
    quick_xml::escape::escape(value)
        .replace('\n', "&#10;")
        .replace('\r', "&#13;")
        .replace('\t', "&#9;")
}

/// Ordered attribute list for one element.
#[derive(Debug, Default)]
pub(crate) struct AttrWriter {
    pairs: Vec<(&'static str, String)>,
}

impl AttrWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn common(&mut self, comment: &str, flags: BlockFlags) {
        self.str("comment", comment);
        self.u32("flags", flags.bits() as u32);
    }

    pub(crate) fn str(&mut self, name: &'static str, value: &str) {
        self.pairs.push((name, value.to_string()));
    }

    pub(crate) fn word(&mut self, name: &'static str, value: impl Display) {
        self.pairs.push((name, value.to_string()));
    }

    pub(crate) fn f64(&mut self, name: &'static str, value: f64) {
        self.pairs.push((name, format!("{}", value)));
    }

    pub(crate) fn u32(&mut self, name: &'static str, value: u32) {
        self.pairs.push((name, value.to_string()));
    }

    pub(crate) fn bool(&mut self, name: &'static str, value: bool) {
        self.pairs.push((name, if value { "1" } else { "0" }.to_string()));
    }

    pub(crate) fn vec2(&mut self, name: &'static str, value: Vec2) {
        self.pairs.push((name, format!("{} {}", value.x, value.y)));
    }

    pub(crate) fn vec3(&mut self, name: &'static str, value: Vec3) {
        self.pairs
            .push((name, format!("{} {} {}", value.x, value.y, value.z)));
    }

    pub(crate) fn list<T: Display>(&mut self, name: &'static str, values: impl Iterator<Item = T>) {
        let text: Vec<String> = values.map(|v| v.to_string()).collect();
        self.pairs.push((name, text.join(" ")));
    }

    fn start(&self, name: &'static str) -> BytesStart<'static> {
        let mut start = BytesStart::new(name);
        for (key, value) in &self.pairs {
            let escaped = escape_attr(value);
            start.push_attribute((key.as_bytes(), escaped.as_bytes()));
        }
        start
    }
}

/// Typed access to an element's attributes. Missing attributes yield `None`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AttrReader<'a> {
    attrs: &'a [(String, String)],
}

impl<'a> AttrReader<'a> {
    pub(crate) fn new(attrs: &'a [(String, String)]) -> Self {
        Self { attrs }
    }

    fn raw(&self, name: &str) -> Option<&'a str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn invalid(name: &str, value: &str) -> CodecError {
        CodecError::InvalidAttribute {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    pub(crate) fn str(&self, name: &str) -> Option<String> {
        self.raw(name).map(str::to_string)
    }

    pub(crate) fn parse<T: FromStr>(&self, name: &str) -> CodecResult<Option<T>> {
        match self.raw(name) {
            Some(text) => text
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| Self::invalid(name, text)),
            None => Ok(None),
        }
    }

    pub(crate) fn f64(&self, name: &str) -> CodecResult<Option<f64>> {
        match self.parse::<f64>(name)? {
            Some(v) if !v.is_finite() => {
                Err(Self::invalid(name, self.raw(name).unwrap_or_default()))
            }
            other => Ok(other),
        }
    }

    pub(crate) fn u32(&self, name: &str) -> CodecResult<Option<u32>> {
        self.parse(name)
    }

    pub(crate) fn u8(&self, name: &str) -> CodecResult<Option<u8>> {
        self.parse(name)
    }

    pub(crate) fn bool(&self, name: &str) -> CodecResult<Option<bool>> {
        match self.raw(name) {
            Some(text) => match text.trim() {
                "1" | "true" => Ok(Some(true)),
                "0" | "false" => Ok(Some(false)),
                _ => Err(Self::invalid(name, text)),
            },
            None => Ok(None),
        }
    }

    pub(crate) fn list<T: FromStr>(&self, name: &str) -> CodecResult<Option<Vec<T>>> {
        match self.raw(name) {
            Some(text) => text
                .split_whitespace()
                .map(|v| v.parse::<T>())
                .collect::<Result<Vec<T>, _>>()
                .map(Some)
                .map_err(|_| Self::invalid(name, text)),
            None => Ok(None),
        }
    }

    /// Whitespace separated floats, all finite.
    pub(crate) fn f64_list(&self, name: &str) -> CodecResult<Option<Vec<f64>>> {
        let values = self.list::<f64>(name)?;
        if values.as_ref().is_some_and(|v| v.iter().any(|x| !x.is_finite())) {
            return Err(Self::invalid(name, self.raw(name).unwrap_or_default()));
        }
        Ok(values)
    }

    pub(crate) fn f32_list(&self, name: &str) -> CodecResult<Option<Vec<f32>>> {
        let values = self.list::<f32>(name)?;
        if values.as_ref().is_some_and(|v| v.iter().any(|x| !x.is_finite())) {
            return Err(Self::invalid(name, self.raw(name).unwrap_or_default()));
        }
        Ok(values)
    }

    fn fixed<const N: usize>(&self, name: &str) -> CodecResult<Option<[f64; N]>> {
        let Some(values) = self.f64_list(name)? else {
            return Ok(None);
        };
        let array: [f64; N] = values
            .try_into()
            .map_err(|_| Self::invalid(name, self.raw(name).unwrap_or_default()))?;
        Ok(Some(array))
    }

    pub(crate) fn vec2(&self, name: &str) -> CodecResult<Option<Vec2>> {
        Ok(self.fixed::<2>(name)?.map(|[x, y]| Vec2::new(x, y)))
    }

    pub(crate) fn vec3(&self, name: &str) -> CodecResult<Option<Vec3>> {
        Ok(self.fixed::<3>(name)?.map(|[x, y, z]| Vec3::new(x, y, z)))
    }

    pub(crate) fn u32_pair(&self, name: &str) -> CodecResult<Option<[u32; 2]>> {
        let Some(values) = self.list::<u32>(name)? else {
            return Ok(None);
        };
        let pair: [u32; 2] = values
            .try_into()
            .map_err(|_| Self::invalid(name, self.raw(name).unwrap_or_default()))?;
        Ok(Some(pair))
    }
}

/// Minimal element tree built from the event stream.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct XmlElement {
    pub(crate) name: String,
    pub(crate) attrs: Vec<(String, String)>,
    pub(crate) children: Vec<XmlElement>,
}

fn element_from(e: &BytesStart<'_>) -> CodecResult<XmlElement> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(xml_err)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(xml_err)?.into_owned();
        attrs.push((key, value));
    }
    Ok(XmlElement {
        name,
        attrs,
        children: Vec::new(),
    })
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> CodecResult<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
    } else if root.is_none() {
        *root = Some(element);
    } else {
        return Err(CodecError::Xml("multiple root elements".to_string()));
    }
    Ok(())
}

pub(crate) fn parse_document(text: &str) -> CodecResult<XmlElement> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root = None;
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) => stack.push(element_from(&e)?),
            Event::Empty(e) => {
                let element = element_from(&e)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| CodecError::Xml("unbalanced end tag".to_string()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(CodecError::Xml("unclosed element".to_string()));
    }
    root.ok_or_else(|| CodecError::Xml("empty document".to_string()))
}

fn write_config(attrs: &mut AttrWriter, config: &ProgramConfig) {
    attrs.u32("version", XML_VERSION);
    attrs.str("name", &config.name);
    attrs.str("notes", &config.notes);
    attrs.word("units", config.units);
    attrs.word("material-type", config.material_type);
    attrs.vec3("material-size", config.material_size);
    attrs.vec3("material-origin", config.material_origin);
    attrs.f64("ztraverse", config.ztraverse);
    attrs.word("drilling-motion", config.drilling_motion);
    attrs.word("dialect", config.dialect);
    attrs.bool("home-switches", config.machine.home_switches);
    attrs.bool("auto-tool-change", config.machine.auto_tool_change);
    attrs.bool("spindle-control", config.machine.spindle_control);
    attrs.bool("coolant", config.machine.coolant);
    attrs.u32("decimals", config.decimals as u32);
}

fn read_config(attrs: &AttrReader<'_>) -> CodecResult<ProgramConfig> {
    let mut config = ProgramConfig::default();
    if let Some(name) = attrs.str("name") {
        config.name = name;
    }
    if let Some(notes) = attrs.str("notes") {
        config.notes = notes;
    }
    if let Some(units) = attrs.parse("units")? {
        config.units = units;
    }
    if let Some(material) = attrs.parse("material-type")? {
        config.material_type = material;
    }
    if let Some(size) = attrs.vec3("material-size")? {
        config.material_size = size;
    }
    if let Some(origin) = attrs.vec3("material-origin")? {
        config.material_origin = origin;
    }
    if let Some(z) = attrs.f64("ztraverse")? {
        config.ztraverse = z;
    }
    if let Some(motion) = attrs.parse("drilling-motion")? {
        config.drilling_motion = motion;
    }
    if let Some(dialect) = attrs.parse("dialect")? {
        config.dialect = dialect;
    }
    let defaults = MachineOptions::default();
    config.machine = MachineOptions {
        home_switches: attrs.bool("home-switches")?.unwrap_or(defaults.home_switches),
        auto_tool_change: attrs
            .bool("auto-tool-change")?
            .unwrap_or(defaults.auto_tool_change),
        spindle_control: attrs
            .bool("spindle-control")?
            .unwrap_or(defaults.spindle_control),
        coolant: attrs.bool("coolant")?.unwrap_or(defaults.coolant),
    };
    if let Some(decimals) = attrs.u8("decimals")? {
        config.decimals = decimals;
    }
    Ok(config)
}

fn write_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    program: &Program,
    id: BlockId,
) -> CodecResult<()> {
    let Some(block) = program.get(id) else {
        return Ok(());
    };
    let kind = block.kind();
    let mut attrs = AttrWriter::new();
    block.payload.write_xml(block.comment(), block.flags, &mut attrs);
    let start = attrs.start(kind.xml_name());

    let children: &[BlockId] = if kind.persists_children() {
        program.children(id)
    } else {
        &[]
    };
    let extruder = program.extruder(id);

    if children.is_empty() && extruder.is_none() {
        writer.write_event(Event::Empty(start)).map_err(xml_err)?;
        return Ok(());
    }

    writer.write_event(Event::Start(start)).map_err(xml_err)?;
    for child in children {
        write_element(writer, program, *child)?;
    }
    if let Some(extruder) = extruder {
        write_element(writer, program, extruder)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(kind.xml_name())))
        .map_err(xml_err)?;
    Ok(())
}

fn read_element(
    program: &mut Program,
    parent: Option<BlockId>,
    slot: Slot,
    element: &XmlElement,
) -> CodecResult<BlockId> {
    let kind = BlockKind::from_xml_name(&element.name)
        .ok_or_else(|| CodecError::UnknownElement(element.name.clone()))?;
    program.check_placement(parent, slot, kind)?;
    let attrs = AttrReader::new(&element.attrs);

    let mut block = Block::new(kind, &program.config);
    if let Some(comment) = attrs.str("comment") {
        block.set_comment(comment);
    }
    if let Some(flags) = attrs.u8("flags")? {
        block.flags = BlockFlags::from_bits(flags);
    }
    block.payload.parse_xml(&attrs)?;

    let id = program.attach(parent, slot, block);
    for child in &element.children {
        let slot = if kind.accepts_extruder() && child.name == BlockKind::Extrusion.xml_name() {
            Slot::Extruder
        } else {
            Slot::Child
        };
        read_element(program, Some(id), slot, child)?;
    }
    program.refresh_derived(id);
    Ok(id)
}

/// Encode a program as an XML document.
pub fn write_program(program: &Program) -> CodecResult<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_err)?;

    let mut attrs = AttrWriter::new();
    write_config(&mut attrs, &program.config);
    let start = attrs.start(ROOT);

    if program.roots().is_empty() {
        writer.write_event(Event::Empty(start)).map_err(xml_err)?;
    } else {
        writer.write_event(Event::Start(start)).map_err(xml_err)?;
        for root in program.roots() {
            write_element(&mut writer, program, *root)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(ROOT)))
            .map_err(xml_err)?;
    }

    let mut text = String::from_utf8(writer.into_inner())?;
    text.push('\n');
    Ok(text)
}

/// Decode an XML document. Any invalid element fails the whole read.
pub fn read_program(text: &str) -> CodecResult<Program> {
    let root = parse_document(text)?;
    if root.name != ROOT {
        return Err(CodecError::UnknownElement(root.name));
    }
    let attrs = AttrReader::new(&root.attrs);
    if let Some(version) = attrs.u32("version")? {
        if version != XML_VERSION {
            return Err(CodecError::UnsupportedVersion(version.min(u8::MAX as u32) as u8));
        }
    }

    let mut program = Program::new(read_config(&attrs)?);
    for element in &root.children {
        read_element(&mut program, None, Slot::Child, element)?;
    }
    debug!("parsed {} blocks", program.len());
    Ok(program)
}
