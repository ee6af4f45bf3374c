use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use paylink_client::CommandStatus;
use paylink_frame::address::address_name;
use paylink_frame::{control, Frame};
use paylink_session::ResponseApdu;
use paylink_tlv::{TlvNode, TlvValue};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_table(header: Vec<&str>, rows: Vec<Vec<String>>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    for row in rows {
        table.add_row(row);
    }
    println!("{table}");
}

#[derive(Serialize)]
pub struct TlvOutput {
    tag: String,
    name: &'static str,
    constructed: bool,
    length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<TlvOutput>,
}

impl From<&TlvNode> for TlvOutput {
    fn from(node: &TlvNode) -> Self {
        let (value, children) = match node.value() {
            TlvValue::Primitive(bytes) => (Some(hex::encode_upper(bytes)), Vec::new()),
            TlvValue::Constructed(children) => (None, children.iter().map(Self::from).collect()),
        };
        Self {
            tag: node.tag().to_string(),
            name: node.name(),
            constructed: node.is_constructed(),
            length: node.value_len(),
            value,
            children,
        }
    }
}

pub fn tlv_tree(nodes: &[TlvNode]) -> Vec<TlvOutput> {
    nodes.iter().map(TlvOutput::from).collect()
}

pub fn print_tlv(nodes: &[TlvNode], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&tlv_tree(nodes)),
        OutputFormat::Table => {
            let mut rows = Vec::new();
            flatten(nodes, 0, &mut |depth, node| {
                rows.push(vec![
                    format!("{}{}", "  ".repeat(depth), node.tag()),
                    node.name().to_string(),
                    node.value_len().to_string(),
                    node.bytes().map(|b| preview(b)).unwrap_or_default(),
                ]);
            });
            print_table(vec!["TAG", "NAME", "LEN", "VALUE"], rows);
        }
        OutputFormat::Pretty => {
            flatten(nodes, 0, &mut |depth, node| {
                let indent = "  ".repeat(depth);
                match node.bytes() {
                    Some(bytes) => println!(
                        "{indent}{} {} = {}",
                        node.tag(),
                        node.name(),
                        preview(bytes)
                    ),
                    None => println!("{indent}{} {} ({} bytes)", node.tag(), node.name(), node.value_len()),
                }
            });
        }
        OutputFormat::Raw => print_raw(&paylink_tlv::encode(nodes)),
    }
}

fn flatten(nodes: &[TlvNode], depth: usize, visit: &mut dyn FnMut(usize, &TlvNode)) {
    for node in nodes {
        visit(depth, node);
        flatten(node.children(), depth + 1, visit);
    }
}

/// Hex, plus the text when every byte is printable ASCII.
fn preview(bytes: &[u8]) -> String {
    let hex = hex::encode_upper(bytes);
    if !bytes.is_empty() && bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
        format!("{hex} \"{}\"", String::from_utf8_lossy(bytes))
    } else {
        hex
    }
}

#[derive(Serialize)]
struct FrameOutput {
    address: u8,
    interface: &'static str,
    control: u8,
    from_device: bool,
    expects_reply: bool,
    length: usize,
    payload: String,
    checksum: String,
}

pub fn print_frame(frame: &Frame, format: OutputFormat) {
    let out = FrameOutput {
        address: frame.address(),
        interface: address_name(frame.address()),
        control: frame.control(),
        from_device: control::is_from_device(frame.control()),
        expects_reply: control::expects_reply(frame.control()),
        length: frame.payload().len(),
        payload: hex::encode_upper(frame.payload()),
        checksum: format!("{:02X}", frame.checksum()),
    };
    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => print_table(
            vec!["ADDRESS", "CONTROL", "LEN", "PAYLOAD", "LRC"],
            vec![vec![
                format!("{} ({})", out.address, out.interface),
                format!("{:#04x}", out.control),
                out.length.to_string(),
                out.payload,
                out.checksum,
            ]],
        ),
        OutputFormat::Pretty => println!(
            "address={} ({}) control={:#04x} from_device={} expects_reply={} len={} payload={} lrc={}",
            out.address,
            out.interface,
            out.control,
            out.from_device,
            out.expects_reply,
            out.length,
            out.payload,
            out.checksum
        ),
        OutputFormat::Raw => print_raw(frame.payload()),
    }
}

#[derive(Serialize)]
struct ResponseOutput {
    address: u8,
    interface: &'static str,
    status: String,
    meaning: String,
    data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tlv: Option<Vec<TlvOutput>>,
}

pub fn print_response(address: u8, response: &ResponseApdu, format: OutputFormat) {
    let nodes = paylink_tlv::decode(&response.data).ok();
    let out = ResponseOutput {
        address,
        interface: address_name(address),
        status: response.status.to_string(),
        meaning: CommandStatus::from(response.status).to_string(),
        data: hex::encode_upper(&response.data),
        tlv: nodes.as_deref().map(tlv_tree),
    };
    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("Status: {} ({})", out.status, out.meaning);
            match &nodes {
                Some(nodes) if !nodes.is_empty() => print_tlv(nodes, format),
                _ => println!("Data:   {}", out.data),
            }
        }
        OutputFormat::Raw => print_raw(&response.data),
    }
}

/// A flat list of named values, for command results.
pub fn print_report(kind: &str, fields: &[(&str, String)], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let mut map = serde_json::Map::new();
            map.insert("kind".to_string(), kind.into());
            for (name, value) in fields {
                map.insert((*name).to_string(), value.clone().into());
            }
            print_json(&map);
        }
        OutputFormat::Table => print_table(
            vec!["FIELD", "VALUE"],
            fields
                .iter()
                .map(|(name, value)| vec![(*name).to_string(), value.clone()])
                .collect(),
        ),
        OutputFormat::Pretty => {
            for (name, value) in fields {
                println!("{name:>18}: {value}");
            }
        }
        OutputFormat::Raw => {
            for (_, value) in fields {
                println!("{value}");
            }
        }
    }
}

#[derive(Serialize)]
pub struct EventOutput {
    pub event: &'static str,
    pub address: Option<u8>,
    pub details: serde_json::Value,
    pub timestamp: String,
}

pub fn print_event(event: &EventOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(event),
        OutputFormat::Table => print_table(
            vec!["EVENT", "ADDRESS", "DETAILS"],
            vec![vec![
                event.event.to_string(),
                event
                    .address
                    .map(|a| format!("{a} ({})", address_name(a)))
                    .unwrap_or_default(),
                event.details.to_string(),
            ]],
        ),
        OutputFormat::Pretty | OutputFormat::Raw => {
            println!("{} {}", event.event, event.details);
        }
    }
}

pub fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
