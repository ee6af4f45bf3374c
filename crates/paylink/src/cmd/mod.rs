use clap::{Args, Subcommand};

use crate::endpoint::Endpoint;
use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod frame;
pub mod listen;
pub mod send;
pub mod status;
pub mod tlv;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a TLV blob and print the node tree.
    Tlv(TlvArgs),
    /// Build or check a wire frame.
    Frame(FrameArgs),
    /// Send one raw command and print the response.
    Send(SendArgs),
    /// Query terminal identity and state.
    Status(StatusArgs),
    /// Print unsolicited device events.
    Listen(ListenArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Tlv(args) => tlv::run(args, format),
        Command::Frame(args) => frame::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Status(args) => status::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct TlvArgs {
    /// Hex-encoded TLV data (whitespace allowed).
    pub hex: String,
}

#[derive(Args, Debug)]
pub struct FrameArgs {
    #[command(subcommand)]
    pub command: FrameCommand,
}

#[derive(Subcommand, Debug)]
pub enum FrameCommand {
    /// Wrap a payload in a frame.
    Encode {
        /// Interface address.
        #[arg(long, short = 'a')]
        address: u8,
        /// Control byte.
        #[arg(long, short = 'c', default_value = "0")]
        control: u8,
        /// Hex-encoded payload.
        payload: String,
    },
    /// Validate a complete frame and print its fields.
    Decode {
        /// Hex-encoded frame.
        frame: String,
    },
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Terminal endpoint (tcp://host:port or unix:///path).
    #[arg(env = "PAYLINK_ENDPOINT")]
    pub endpoint: Endpoint,
    /// Interface address to send to.
    #[arg(long, short = 'i', default_value = "1")]
    pub interface: u8,
    /// Hex-encoded command APDU (CLA INS P1 P2 [TLV data]).
    #[arg(long)]
    pub apdu: String,
    /// Response timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s", env = "PAYLINK_TIMEOUT")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Terminal endpoint (tcp://host:port or unix:///path).
    #[arg(env = "PAYLINK_ENDPOINT")]
    pub endpoint: Endpoint,
    /// Per-command timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s", env = "PAYLINK_TIMEOUT")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Terminal endpoint (tcp://host:port or unix:///path).
    #[arg(env = "PAYLINK_ENDPOINT")]
    pub endpoint: Endpoint,
    /// Exit after printing N events.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
