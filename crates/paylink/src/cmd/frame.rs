use bytes::BytesMut;
use paylink_frame::{
    decode_frame, encode_frame, FrameError, HEADER_SIZE, MAX_PAYLOAD, TRAILER_SIZE,
};

use crate::cmd::tlv::parse_hex;
use crate::cmd::{FrameArgs, FrameCommand};
use crate::exit::{frame_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_frame, print_json, print_raw, OutputFormat};

pub fn run(args: FrameArgs, format: OutputFormat) -> CliResult<i32> {
    match args.command {
        FrameCommand::Encode {
            address,
            control,
            payload,
        } => encode(address, control, &payload, format),
        FrameCommand::Decode { frame } => decode(&frame, format),
    }
}

fn encode(address: u8, control: u8, payload: &str, format: OutputFormat) -> CliResult<i32> {
    let payload = parse_hex("payload", payload)?;
    let mut buf = BytesMut::new();
    encode_frame(address, control, &payload, &mut buf)
        .map_err(|err| frame_error("encode failed", err))?;

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "address": address,
            "control": control,
            "length": payload.len(),
            "frame": hex::encode_upper(&buf),
        })),
        OutputFormat::Raw => print_raw(&buf),
        OutputFormat::Table | OutputFormat::Pretty => println!("{}", hex::encode_upper(&buf)),
    }
    Ok(SUCCESS)
}

fn decode(input: &str, format: OutputFormat) -> CliResult<i32> {
    let mut buf = BytesMut::from(parse_hex("frame", input)?.as_slice());
    let total = buf.len();

    let frame = decode_frame(&mut buf, MAX_PAYLOAD)
        .map_err(|err| frame_error("decode failed", err))?
        .ok_or_else(|| {
            let expected = if total >= HEADER_SIZE {
                HEADER_SIZE + usize::from(u16::from_be_bytes([buf[2], buf[3]])) + TRAILER_SIZE
            } else {
                HEADER_SIZE
            };
            frame_error(
                "decode failed",
                FrameError::Truncated {
                    expected,
                    received: total,
                },
            )
        })?;
    if !buf.is_empty() {
        return Err(CliError::new(
            DATA_INVALID,
            format!("{} trailing bytes after the frame", buf.len()),
        ));
    }

    print_frame(&frame, format);
    Ok(SUCCESS)
}
