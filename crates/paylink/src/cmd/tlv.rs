use crate::cmd::TlvArgs;
use crate::exit::{hex_error, tlv_error, CliResult, SUCCESS};
use crate::output::{print_tlv, OutputFormat};

pub fn run(args: TlvArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = parse_hex("TLV data", &args.hex)?;
    let nodes = paylink_tlv::decode(&bytes).map_err(|err| tlv_error("decode failed", err))?;
    print_tlv(&nodes, format);
    Ok(SUCCESS)
}

/// Decode hex, ignoring whitespace and an optional `0x` prefix.
pub fn parse_hex(what: &str, input: &str) -> CliResult<Vec<u8>> {
    let compact: String = input.split_whitespace().collect();
    let digits = compact
        .strip_prefix("0x")
        .or_else(|| compact.strip_prefix("0X"))
        .unwrap_or(&compact);
    hex::decode(digits).map_err(|err| hex_error(what, err))
}
