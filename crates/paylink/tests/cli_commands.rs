#![cfg(all(unix, feature = "cli"))]

use std::os::unix::net::UnixListener;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;

use paylink_frame::{control, FrameReader, FrameWriter, TERMINAL};
use paylink_tlv::{tags, TlvNode};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/paylink-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn paylink() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_paylink"));
    command
        .env_remove("PAYLINK_ENDPOINT")
        .env_remove("PAYLINK_TIMEOUT")
        .arg("--log-level")
        .arg("error");
    command
}

/// Serve one connection, answering each command with the next canned response.
fn fake_terminal(path: &Path, responses: Vec<(Vec<u8>, u16)>) -> thread::JoinHandle<Vec<Vec<u8>>> {
    let listener = UnixListener::bind(path).expect("socket should bind");
    thread::spawn(move || {
        let (stream, _) = listener.accept().expect("client should connect");
        let mut reader = FrameReader::new(stream.try_clone().expect("clone"));
        let mut writer = FrameWriter::new(stream);
        let mut seen = Vec::new();
        for (data, status) in responses {
            let command = reader.read_frame().expect("command frame");
            seen.push(command.payload().to_vec());
            let mut payload = data;
            payload.extend_from_slice(&status.to_be_bytes());
            writer
                .send(command.address(), control::FROM_DEVICE, &payload)
                .expect("response should be written");
        }
        seen
    })
}

#[test]
fn tlv_prints_named_tree() {
    let output = paylink()
        .args(["--format", "json", "tlv", "E1 08 DF10 01 02 DF11 01 50"])
        .output()
        .expect("tlv should run");

    assert!(output.status.success());
    let tree: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("tlv should emit json");
    assert_eq!(tree[0]["tag"], "E1");
    assert_eq!(tree[0]["name"], "device_status_template");
    assert_eq!(tree[0]["children"][0]["name"], "device_state");
    assert_eq!(tree[0]["children"][1]["value"], "50");
}

#[test]
fn tlv_rejects_truncated_data() {
    let output = paylink()
        .args(["tlv", "DF1005AA"])
        .output()
        .expect("tlv should run");
    assert_eq!(output.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&output.stderr).contains("malformed TLV"));
}

#[test]
fn frame_encode_and_decode() {
    let encoded = paylink()
        .args(["--format", "pretty", "frame", "encode", "--address", "1", "D0100000"])
        .output()
        .expect("frame encode should run");
    assert!(encoded.status.success());
    let hex = String::from_utf8_lossy(&encoded.stdout).trim().to_string();
    assert_eq!(hex, "01000004D0100000C5");

    let decoded = paylink()
        .args(["--format", "json", "frame", "decode", &hex])
        .output()
        .expect("frame decode should run");
    assert!(decoded.status.success());
    let frame: serde_json::Value = serde_json::from_slice(&decoded.stdout).expect("json");
    assert_eq!(frame["address"], 1);
    assert_eq!(frame["payload"], "D0100000");
    assert_eq!(frame["expects_reply"], true);
}

#[test]
fn frame_decode_rejects_bad_checksum() {
    let output = paylink()
        .args(["frame", "decode", "01000004D0100000C4"])
        .output()
        .expect("frame decode should run");
    assert_eq!(output.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&output.stderr).contains("checksum"));
}

#[test]
fn send_prints_response_from_terminal() {
    let dir = unique_temp_dir("send");
    let sock = dir.join("terminal.sock");
    let info = paylink_tlv::encode(&[TlvNode::primitive(tags::MODEL, &b"T-400"[..])]).to_vec();
    let terminal = fake_terminal(&sock, vec![(info, 0x9000)]);

    let output = paylink()
        .args(["--format", "json", "send"])
        .arg(format!("unix://{}", sock.display()))
        .args(["--interface", "1", "--apdu", "D0100000"])
        .output()
        .expect("send should run");

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let response: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(response["status"], "9000");
    assert_eq!(response["tlv"][0]["name"], "model");

    let seen = terminal.join().expect("terminal thread");
    assert_eq!(seen, vec![vec![0xD0, 0x10, 0x00, 0x00]]);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn declined_send_exits_10() {
    let dir = unique_temp_dir("declined");
    let sock = dir.join("terminal.sock");
    let terminal = fake_terminal(&sock, vec![(Vec::new(), 0x6403)]);

    let output = paylink()
        .args(["--format", "json", "send"])
        .arg(format!("unix://{}", sock.display()))
        .args(["--apdu", "D0400000"])
        .output()
        .expect("send should run");

    assert_eq!(output.status.code(), Some(10));
    assert!(String::from_utf8_lossy(&output.stdout).contains("card not present"));
    terminal.join().expect("terminal thread");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn status_reports_identity_and_state() {
    let dir = unique_temp_dir("status");
    let sock = dir.join("terminal.sock");
    let info = paylink_tlv::encode(&[
        TlvNode::primitive(tags::MODEL, &b"T-400"[..]),
        TlvNode::primitive(tags::SERIAL_NUMBER, &b"SN-9"[..]),
        TlvNode::primitive(tags::FIRMWARE_VERSION, &b"4.2.1"[..]),
    ])
    .to_vec();
    let state = paylink_tlv::encode(&[
        TlvNode::byte(tags::DEVICE_STATE, 0x00),
        TlvNode::byte(tags::BATTERY_LEVEL, 64),
    ])
    .to_vec();
    let terminal = fake_terminal(&sock, vec![(info, 0x9000), (state, 0x9000)]);

    let output = paylink()
        .args(["--format", "json", "status"])
        .arg(format!("unix://{}", sock.display()))
        .output()
        .expect("status should run");

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(report["kind"], "terminal-status");
    assert_eq!(report["model"], "T-400");
    assert_eq!(report["state"], "Idle");
    assert_eq!(report["battery_percent"], "64");

    let seen = terminal.join().expect("terminal thread");
    assert_eq!(seen[0][1], 0x10);
    assert_eq!(seen[1][1], 0x11);
    assert!(seen.iter().all(|apdu| apdu[0] == 0xD0));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn listen_prints_events_until_count() {
    let dir = unique_temp_dir("listen");
    let sock = dir.join("terminal.sock");
    let listener = UnixListener::bind(&sock).expect("socket should bind");
    let terminal = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("client should connect");
        let mut writer = FrameWriter::new(stream);
        let card = paylink_tlv::encode(&[TlvNode::constructed(
            tags::CARD_STATUS_TEMPLATE,
            vec![TlvNode::byte(tags::CARD_PRESENT, 1)],
        )]);
        let key = paylink_tlv::encode(&[TlvNode::constructed(
            tags::KEY_PRESS_TEMPLATE,
            vec![TlvNode::byte(tags::KEY_CODE, 0x0D)],
        )]);
        writer.send(TERMINAL, control::FROM_DEVICE, &card).expect("write");
        writer.send(TERMINAL, control::FROM_DEVICE, &key).expect("write");
        writer
    });

    let output = paylink()
        .args(["--format", "json", "listen"])
        .arg(format!("unix://{}", sock.display()))
        .args(["--count", "2"])
        .output()
        .expect("listen should run");

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("one json object per line"))
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["event"], "card_status");
    assert_eq!(lines[0]["details"]["present"], true);
    assert_eq!(lines[1]["event"], "key_pressed");
    assert_eq!(lines[1]["details"]["key"], 13);

    drop(terminal.join().expect("terminal thread"));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_socket_is_a_transport_error() {
    let dir = unique_temp_dir("missing");
    let output = paylink()
        .arg("status")
        .arg(format!("unix://{}", dir.join("nobody.sock").display()))
        .output()
        .expect("status should run");
    assert_eq!(output.status.code(), Some(3));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn version_reports_package_version() {
    let output = paylink().arg("version").output().expect("version should run");
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("paylink {}", env!("CARGO_PKG_VERSION"))
    );
}
