use std::sync::Arc;
use std::time::Duration;

use paylink_frame::address::address_name;
use paylink_frame::{CASH_DRAWER, PRINTER, SCANNER, SERIAL_PORT, TERMINAL};
use paylink_session::{PrinterStatus, ProtocolSession, ResponseApdu};
use paylink_tlv::{tags, TlvNode};
use tracing::{debug, info};

use crate::command::{ins, Command};
use crate::config::ClientConfig;
use crate::error::{CommandError, Result};
use crate::status::{CommandStatus, Outcome};
use crate::types::{CardStatus, DeviceInfo, DeviceStatus, TransactionRequest, TransactionResult};

/// One method per device command, over a shared session.
///
/// Commands are serialized by the session: calling a method while another
/// thread is waiting on one fails with
/// [`SessionError::ProtocolViolation`](paylink_session::SessionError::ProtocolViolation).
#[derive(Debug, Clone)]
pub struct CommandClient {
    session: Arc<ProtocolSession>,
    config: ClientConfig,
}

impl CommandClient {
    pub fn new(session: Arc<ProtocolSession>) -> Self {
        Self::with_config(session, ClientConfig::default())
    }

    pub fn with_config(session: Arc<ProtocolSession>, config: ClientConfig) -> Self {
        Self { session, config }
    }

    pub fn session(&self) -> &Arc<ProtocolSession> {
        &self.session
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send a raw command and return the response as-is.
    pub fn transmit(
        &self,
        address: u8,
        command: &Command,
        timeout: Duration,
    ) -> Result<ResponseApdu> {
        let payload = command.encode();
        debug!(
            address,
            interface = address_name(address),
            ins = command.ins,
            len = payload.len(),
            "command"
        );
        let response = self.session.send_and_wait(address, &payload, timeout)?;
        debug!(
            address,
            ins = command.ins,
            status = %response.status,
            len = response.data.len(),
            "response"
        );
        Ok(response)
    }

    /// Run a command and decode the response data of a successful one.
    fn execute<T>(
        &self,
        address: u8,
        command: &Command,
        timeout: Duration,
        decode: impl FnOnce(&[TlvNode]) -> Result<T>,
    ) -> Result<Outcome<T>> {
        let response = self.transmit(address, command, timeout)?;
        let status = CommandStatus::from(response.status);
        if !status.is_success() {
            info!(address, ins = command.ins, %status, "command declined");
            return Ok(Outcome::Declined(status));
        }
        let nodes = paylink_tlv::decode(&response.data)?;
        decode(&nodes).map(Outcome::Done)
    }

    fn execute_unit(&self, address: u8, command: &Command) -> Result<Outcome<()>> {
        self.execute(address, command, self.config.command_timeout, |_| Ok(()))
    }

    pub fn get_info(&self) -> Result<Outcome<DeviceInfo>> {
        self.execute(
            TERMINAL,
            &Command::new(ins::GET_INFO),
            self.config.command_timeout,
            DeviceInfo::from_tlv,
        )
    }

    /// Status of the device behind `address`.
    pub fn get_status(&self, address: u8) -> Result<Outcome<DeviceStatus>> {
        self.execute(
            address,
            &Command::new(ins::GET_STATUS),
            self.config.command_timeout,
            DeviceStatus::from_tlv,
        )
    }

    /// Show `lines` on the terminal display, top to bottom.
    pub fn display_text<S: AsRef<str>>(&self, lines: &[S]) -> Result<Outcome<()>> {
        if lines.is_empty() {
            return Err(CommandError::InvalidArgument(
                "display_text needs at least one line".into(),
            ));
        }
        let data = lines
            .iter()
            .map(|line| {
                TlvNode::primitive(tags::DISPLAY_LINE, line.as_ref().as_bytes().to_vec())
            })
            .collect();
        self.execute_unit(TERMINAL, &Command::new(ins::DISPLAY_TEXT).with_data(data))
    }

    pub fn clear_display(&self) -> Result<Outcome<()>> {
        self.execute_unit(TERMINAL, &Command::new(ins::CLEAR_DISPLAY))
    }

    pub fn beep(&self, tone: u8, duration: Duration) -> Result<Outcome<()>> {
        let millis = u16::try_from(duration.as_millis()).map_err(|_| {
            CommandError::InvalidArgument(format!("beep duration {duration:?} is too long"))
        })?;
        let command = Command::new(ins::BEEP).with_data(vec![
            TlvNode::byte(tags::BEEP_TONE, tone),
            TlvNode::primitive(tags::BEEP_DURATION, millis.to_be_bytes().to_vec()),
        ]);
        self.execute_unit(TERMINAL, &command)
    }

    /// Run a card transaction. Blocks until the terminal finishes, which can
    /// take as long as the cardholder does.
    ///
    /// An abort from [`AbortableClient`](crate::AbortableClient) makes this
    /// return `Declined(Cancelled)`.
    pub fn start_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<Outcome<TransactionResult>> {
        let command = Command::new(ins::START_TRANSACTION).with_data(vec![request.to_tlv()?]);
        let timeout = self
            .config
            .transaction_timeout
            .max(request.user_timeout + self.config.command_timeout);
        info!(
            amount = request.amount,
            currency = request.currency,
            kind = ?request.kind,
            "starting transaction"
        );
        self.execute(TERMINAL, &command, timeout, TransactionResult::from_tlv)
    }

    pub fn get_card_status(&self) -> Result<Outcome<CardStatus>> {
        self.execute(
            TERMINAL,
            &Command::new(ins::GET_CARD_STATUS),
            self.config.command_timeout,
            CardStatus::from_tlv,
        )
    }

    /// Print `lines` on the attached printer, optionally cutting the paper after.
    pub fn print_text<S: AsRef<str>>(&self, lines: &[S], cut: bool) -> Result<Outcome<()>> {
        let mut data: Vec<TlvNode> = lines
            .iter()
            .map(|line| TlvNode::primitive(tags::PRINT_LINE, line.as_ref().as_bytes().to_vec()))
            .collect();
        data.push(TlvNode::byte(tags::PAPER_CUT, u8::from(cut)));
        self.execute_unit(PRINTER, &Command::new(ins::PRINT_TEXT).with_data(data))
    }

    pub fn get_printer_status(&self) -> Result<Outcome<PrinterStatus>> {
        self.execute(
            PRINTER,
            &Command::new(ins::GET_PRINTER_STATUS),
            self.config.command_timeout,
            |nodes| {
                let flags = paylink_tlv::find(nodes, tags::PRINTER_FLAGS)
                    .ok_or_else(|| CommandError::missing(tags::PRINTER_FLAGS))?;
                flags
                    .as_u8()
                    .map(PrinterStatus::from_bits)
                    .ok_or_else(|| CommandError::invalid(tags::PRINTER_FLAGS, "expected one byte"))
            },
        )
    }

    pub fn open_cash_drawer(&self) -> Result<Outcome<()>> {
        self.execute_unit(CASH_DRAWER, &Command::new(ins::OPEN_CASH_DRAWER))
    }

    pub fn set_scanner_enabled(&self, enabled: bool) -> Result<Outcome<()>> {
        let code = if enabled {
            ins::ENABLE_SCANNER
        } else {
            ins::DISABLE_SCANNER
        };
        self.execute_unit(SCANNER, &Command::new(code))
    }

    /// Write `data` out of serial port `port` on the terminal's serial bridge.
    pub fn serial_write(&self, port: u8, data: &[u8]) -> Result<Outcome<()>> {
        if data.is_empty() {
            return Err(CommandError::InvalidArgument(
                "serial_write needs at least one byte".into(),
            ));
        }
        let command = Command::new(ins::SERIAL_WRITE).with_data(vec![
            TlvNode::byte(tags::SERIAL_PORT_NUMBER, port),
            TlvNode::primitive(tags::SERIAL_DATA, data.to_vec()),
        ]);
        self.execute_unit(SERIAL_PORT, &command)
    }
}
