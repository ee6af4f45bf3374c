use paylink_client::{ClientConfig, CommandClient, CommandStatus, Outcome};
use paylink_frame::TERMINAL;

use crate::cmd::StatusArgs;
use crate::endpoint::parse_duration;
use crate::exit::{command_error, CliError, CliResult, DECLINED, SUCCESS};
use crate::output::{print_report, OutputFormat};

pub fn run(args: StatusArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let session = args.endpoint.open_session()?;
    let client = CommandClient::with_config(
        session.clone(),
        ClientConfig {
            command_timeout: timeout,
            ..ClientConfig::default()
        },
    );

    let report = collect(&client);
    if let Err(err) = session.close() {
        tracing::debug!(error = %err, "close failed");
    }
    let fields = report?;

    print_report("terminal-status", &fields, format);
    Ok(SUCCESS)
}

fn collect(client: &CommandClient) -> CliResult<Vec<(&'static str, String)>> {
    let info = accepted("get_info", client.get_info())?;
    let status = accepted("get_status", client.get_status(TERMINAL))?;

    Ok(vec![
        ("model", info.model),
        ("serial_number", info.serial_number),
        ("firmware_version", info.firmware_version),
        ("state", format!("{:?}", status.state)),
        (
            "battery_percent",
            status
                .battery_percent
                .map(|b| b.to_string())
                .unwrap_or_else(|| "n/a".to_string()),
        ),
    ])
}

fn accepted<T>(
    name: &str,
    result: paylink_client::Result<Outcome<T>>,
) -> CliResult<T> {
    match result.map_err(|err| command_error(&format!("{name} failed"), err))? {
        Outcome::Done(value) => Ok(value),
        Outcome::Declined(status) => Err(declined(name, status)),
    }
}

fn declined(name: &str, status: CommandStatus) -> CliError {
    CliError::new(
        DECLINED,
        format!("{name} declined: {status} ({})", status.status_word()),
    )
}
