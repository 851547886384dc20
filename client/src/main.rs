use std::collections::HashMap;
use std::time::Duration;

use argh::FromArgs;
use color_eyre::eyre::{OptionExt, Result};
use dialoguer::FuzzySelect;
use evdev::{Device, InputEventKind, Key};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::{select, time};
use tokio_serial::{available_ports, SerialPortBuilderExt, SerialPortInfo, SerialPortType};
use tokio_util::sync::CancellationToken;

use uart_hid_shared::{translate, LineConfig, Parity, HOLD_TIME_MS};

mod diagnostic;
mod keypad;

/// Shortest gap between typed bytes that lets each keystroke finish.
const MIN_GAP_MS: u64 = HOLD_TIME_MS as u64 + 10;

/// Drive a UART HID keypad bridge from this machine.
#[derive(FromArgs)]
struct Args {
    /// serial port the bridge is on, asks when there is more than one
    #[argh(option)]
    port: Option<String>,

    /// baud rate, 9600 unless the firmware was built for 115200
    #[argh(option, default = "LineConfig::CANONICAL.baud")]
    baud: u32,

    #[argh(subcommand)]
    mode: Mode,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Mode {
    Type(TypeArgs),
    Tty(TtyArgs),
    Keypad(KeypadArgs),
}

/// type some text, one keystroke per byte the bridge understands
#[derive(FromArgs)]
#[argh(subcommand, name = "type")]
struct TypeArgs {
    /// text to send
    #[argh(positional)]
    text: String,

    /// milliseconds between bytes
    #[argh(option, default = "150")]
    gap_ms: u64,
}

/// forward this terminal's keystrokes until Ctrl-C or Ctrl-D, at most one
/// every 110ms so each gets its keystroke and diagnostic line
#[derive(FromArgs)]
#[argh(subcommand, name = "tty")]
struct TtyArgs {}

/// forward a local keypad read through evdev, paced like tty
#[derive(FromArgs)]
#[argh(subcommand, name = "keypad")]
struct KeypadArgs {
    /// input device path, asks when omitted
    #[argh(option)]
    device: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Args = argh::from_env();
    let line = LineConfig {
        baud: args.baud,
        ..LineConfig::CANONICAL
    };

    let port_name = match args.port {
        Some(port_name) => port_name,
        None => select_serial_port()?.port_name,
    };
    let serial_port = tokio_serial::new(&port_name, line.baud)
        .data_bits(tokio_serial::DataBits::Eight)
        .parity(match line.parity {
            Parity::None => tokio_serial::Parity::None,
            Parity::Even => tokio_serial::Parity::Even,
            Parity::Odd => tokio_serial::Parity::Odd,
        })
        .stop_bits(tokio_serial::StopBits::One)
        .open_native_async()?;
    log::info!("opened {port_name} at {line}");

    let (reader, mut writer) = tokio::io::split(serial_port);

    let token = CancellationToken::new();
    let cloned_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cloned_token.cancel();
        }
    });

    let printer = tokio::spawn(print_diagnostics(reader, token.clone()));

    let result = match args.mode {
        Mode::Type(TypeArgs { text, gap_ms }) => {
            type_text(&mut writer, text.as_bytes(), gap_ms, &token).await
        }
        Mode::Tty(_) => forward_tty(&mut writer, &token).await,
        Mode::Keypad(KeypadArgs { device }) => forward_keypad(&mut writer, device, &token).await,
    };

    token.cancel();
    printer.await??;

    result
}

async fn type_text<W: AsyncWrite + Unpin>(
    writer: &mut W,
    text: &[u8],
    gap_ms: u64,
    token: &CancellationToken,
) -> Result<()> {
    if gap_ms < MIN_GAP_MS {
        log::warn!("gap of {gap_ms}ms would cut keystrokes short, using {MIN_GAP_MS}ms");
    }
    let gap = Duration::from_millis(gap_ms.max(MIN_GAP_MS));

    for &byte in text {
        if translate(byte).is_none() {
            log::warn!("{byte:#04x} has no key, the bridge will only echo it");
        }

        writer.write_all(&[byte]).await?;
        writer.flush().await?;

        select! {
            _ = token.cancelled() => return Ok(()),
            _ = time::sleep(gap) => {}
        }
    }

    // let the last diagnostic line arrive
    select! {
        _ = token.cancelled() => {}
        _ = time::sleep(gap) => {}
    }

    Ok(())
}

/// Spaces writes so a keystroke is never cut short by the next one and the
/// bridge's transmit queue keeps up with its diagnostic lines.
struct Pacer {
    gap: Duration,
    last: Option<time::Instant>,
}

impl Pacer {
    fn new(gap: Duration) -> Self {
        Self { gap, last: None }
    }

    /// Wait until the next write may go out.
    async fn ready(&mut self) {
        if let Some(last) = self.last {
            time::sleep_until(last + self.gap).await;
        }
        self.last = Some(time::Instant::now());
    }
}

/// Puts stdin in raw mode until dropped.
struct RawMode {
    original: termios::Termios,
}

impl RawMode {
    const STDIN: i32 = 0;

    fn enable() -> Result<Self> {
        use termios::{tcsetattr, Termios, ECHO, ICANON, ISIG, TCSANOW};

        let original = Termios::from_fd(Self::STDIN)?;
        let mut raw = Termios::from_fd(Self::STDIN)?;
        raw.c_lflag &= !(ICANON | ECHO | ISIG);
        tcsetattr(Self::STDIN, TCSANOW, &raw)?;

        Ok(Self { original })
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Err(e) = termios::tcsetattr(Self::STDIN, termios::TCSANOW, &self.original) {
            log::error!("failed to restore terminal: {e}");
        }
    }
}

async fn forward_tty<W: AsyncWrite + Unpin>(writer: &mut W, token: &CancellationToken) -> Result<()> {
    const CTRL_C: u8 = 0x03;
    const CTRL_D: u8 = 0x04;

    let _raw = RawMode::enable()?;
    let mut pacer = Pacer::new(Duration::from_millis(MIN_GAP_MS));
    let mut stdin = tokio::io::stdin();
    let mut buf = [0; 1];
    log::info!("forwarding keystrokes, Ctrl-C or Ctrl-D to stop");

    loop {
        let read = select! {
            _ = token.cancelled() => break,
            read = stdin.read(&mut buf) => read,
        }?;

        match buf[..read] {
            [] | [CTRL_C] | [CTRL_D] => break,
            [byte] => {
                pacer.ready().await;
                writer.write_all(&[byte]).await?;
                writer.flush().await?;
            }
            _ => unreachable!("read into a one byte buffer"),
        }
    }

    Ok(())
}

async fn forward_keypad<W: AsyncWrite + Unpin>(
    writer: &mut W,
    path: Option<String>,
    token: &CancellationToken,
) -> Result<()> {
    let keypad = match path {
        Some(path) => Device::open(path)?,
        None => select_input_device()?,
    };
    log::info!(
        "reading keys from {}",
        keypad.name().unwrap_or("unnamed device")
    );

    let mut pacer = Pacer::new(Duration::from_millis(MIN_GAP_MS));
    let mut stream = keypad.into_event_stream()?;
    loop {
        let event = select! {
            _ = token.cancelled() => break,
            event = stream.next_event() => event,
        }?;
        let InputEventKind::Key(key) = event.kind() else {
            continue;
        };

        // only key down, the bridge does the release itself
        if event.value() != 1 {
            continue;
        }

        let Some(byte) = keypad::key_to_byte(key) else {
            log::debug!("ignoring {key:?}");
            continue;
        };

        pacer.ready().await;
        writer.write_all(&[byte]).await?;
        writer.flush().await?;
    }

    Ok(())
}

async fn print_diagnostics<R: AsyncRead + Unpin>(reader: R, token: CancellationToken) -> Result<()> {
    let mut reader = BufReader::new(reader);
    let mut raw = Vec::new();

    loop {
        raw.clear();
        let read = select! {
            _ = token.cancelled() => break,
            read = reader.read_until(b'\n', &mut raw) => read,
        }?;
        if read == 0 {
            log::warn!("serial port closed");
            break;
        }

        match diagnostic::parse(&raw) {
            Some(diag) => {
                print!("{}\r\n", diag.line);
                if !diag.dispatched {
                    log::debug!("\r{:#04x} was not typed", diag.byte);
                }
            }
            None => log::trace!("\runrecognised output {raw:?}"),
        }
    }

    Ok(())
}

fn select_input_device() -> Result<Device> {
    let mut keyboards = HashMap::new();
    for (_, device) in evdev::enumerate() {
        // keypads and full keyboards both have a keypad enter
        let supported = device.supported_keys().map_or(false, |keys| {
            keys.contains(Key::KEY_KPENTER) || keys.contains(Key::KEY_KP0)
        });
        if !supported {
            continue;
        }

        let Some(name) = device.name() else { continue };
        keyboards.insert(name.to_owned(), device);
    }

    if keyboards.len() > 1 {
        let items: Vec<_> = keyboards.keys().cloned().collect();
        let selection = FuzzySelect::new()
            .with_prompt("Which keypad should I read events from?")
            .items(&items)
            .interact()?;
        keyboards
            .remove(&items[selection])
            .ok_or_eyre("Selected keypad has run away :(")
    } else {
        keyboards
            .into_values()
            .next()
            .ok_or_eyre("No keypads found, do you have permission for /dev/inputX?")
    }
}

fn select_serial_port() -> Result<SerialPortInfo> {
    let mut ports = available_ports()?;
    ports.retain(|port| port.port_type != SerialPortType::Unknown);

    if ports.len() > 1 {
        let names: Vec<_> = ports.iter().map(|info| &info.port_name).collect();
        let selection = FuzzySelect::new()
            .with_prompt("Which serial port is the bridge on?")
            .items(&names)
            .interact()?;

        ports
            .into_iter()
            .nth(selection)
            .ok_or_eyre("Selected serial port has fled the country?")
    } else {
        ports.into_iter().next().ok_or_eyre("No serial ports?")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_type_text_sends_every_byte() {
        let (mut ours, mut theirs) = tokio::io::duplex(64);
        let token = CancellationToken::new();

        type_text(&mut ours, b"12x\r", 0, &token).await.unwrap();
        drop(ours);

        let mut sent = Vec::new();
        theirs.read_to_end(&mut sent).await.unwrap();
        assert_eq!(sent, b"12x\r");
    }

    #[tokio::test]
    async fn test_type_text_stops_when_cancelled() {
        let (mut ours, mut theirs) = tokio::io::duplex(64);
        let token = CancellationToken::new();
        token.cancel();

        type_text(&mut ours, b"123", 200, &token).await.unwrap();
        drop(ours);

        let mut sent = Vec::new();
        theirs.read_to_end(&mut sent).await.unwrap();
        assert_eq!(sent, b"1");
    }

    #[tokio::test]
    async fn test_pacer_spaces_writes() {
        let gap = Duration::from_millis(MIN_GAP_MS);
        let mut pacer = Pacer::new(gap);
        let start = time::Instant::now();

        pacer.ready().await;
        assert!(start.elapsed() < gap);

        pacer.ready().await;
        assert!(start.elapsed() >= gap);

        pacer.ready().await;
        assert!(start.elapsed() >= gap * 2);
    }

    #[test]
    fn test_min_gap_outlasts_hold() {
        assert!(MIN_GAP_MS > HOLD_TIME_MS as u64);
    }
}
