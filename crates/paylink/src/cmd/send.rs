use paylink_client::CommandStatus;

use crate::cmd::tlv::parse_hex;
use crate::cmd::SendArgs;
use crate::endpoint::parse_duration;
use crate::exit::{session_error, CliError, CliResult, DECLINED, SUCCESS, USAGE};
use crate::output::{print_response, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let apdu = parse_hex("--apdu", &args.apdu)?;
    if apdu.len() < 4 {
        return Err(CliError::new(
            USAGE,
            "--apdu needs at least CLA INS P1 P2 (4 bytes)",
        ));
    }

    let session = args.endpoint.open_session()?;
    let result = session.send_and_wait(args.interface, &apdu, timeout);
    if let Err(err) = session.close() {
        tracing::debug!(error = %err, "close failed");
    }
    let response = result.map_err(|err| session_error("send failed", err))?;

    print_response(args.interface, &response, format);
    Ok(exit_code(CommandStatus::from(response.status)))
}

fn exit_code(status: CommandStatus) -> i32 {
    if status.is_success() {
        SUCCESS
    } else {
        DECLINED
    }
}
