use anyhow::Context;
use clap::Parser;
use log::info;
use rns510_code_finder::{
    BufferPolicy, CodeFinder, DEFAULT_BAUD_RATE, FinderConfig, LogSink, MAX_PIN, PortConfig,
    ScanOutcome, SerialTransport, Settle,
};
use std::process::ExitCode;
use std::time::Duration;

/// RNS510 PIN code finder
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Serial port name (e.g. /dev/ttyUSB0, COM3)
    #[arg(short, long)]
    portname: String,

    /// Baud rate of the serial connection
    #[arg(short, long, default_value_t = DEFAULT_BAUD_RATE)]
    baudrate: u32,

    /// Read timeout in seconds
    #[arg(short, long, default_value = "1.0", value_parser = parse_seconds)]
    timeout: Duration,

    /// First PIN to try
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u16).range(..=i64::from(MAX_PIN)))]
    start: u16,

    /// Last PIN to try
    #[arg(long, default_value_t = 1999, value_parser = clap::value_parser!(u16).range(..=i64::from(MAX_PIN)))]
    stop: u16,

    /// Delay between sending a PIN and reading the reply, in milliseconds
    #[arg(long, default_value_t = 100)]
    settle_ms: u64,

    /// Keep re-reading every settle interval until the reply is conclusive or the read timeout expires
    #[arg(long)]
    poll: bool,

    /// Keep device output across attempts instead of clearing it before each PIN
    #[arg(long)]
    accumulate: bool,
}

fn parse_seconds(s: &str) -> Result<Duration, String> {
    let secs: f64 = s.parse().map_err(|e| format!("{e}"))?;
    Duration::try_from_secs_f64(secs)
        .map_err(|e| format!("{s} is not a valid number of seconds: {e}"))
}

impl Args {
    fn port_config(&self) -> PortConfig {
        PortConfig::new(&self.portname)
            .with_baud_rate(self.baudrate)
            .with_timeout(self.timeout)
    }

    fn finder_config(&self) -> FinderConfig {
        let interval = Duration::from_millis(self.settle_ms);
        FinderConfig {
            settle: if self.poll {
                Settle::Poll {
                    interval,
                    deadline: self.timeout,
                }
            } else {
                Settle::Fixed(interval)
            },
            buffer: if self.accumulate {
                BufferPolicy::Accumulate
            } else {
                BufferPolicy::ResetPerProbe
            },
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut finder = CodeFinder::with_config(
        SerialTransport::new(args.port_config()),
        LogSink,
        args.finder_config(),
    );

    let port = finder.transport().config();
    info!(
        "Scanning {:04}..={:04} on {} at {} baud, read timeout {:?}",
        args.start, args.stop, port.port_name, port.baud_rate, port.timeout
    );

    let stop = finder.stop_handle();
    ctrlc::set_handler(move || stop.stop()).context("Failed to set Ctrl+C handler")?;

    match finder.find_code(args.start, args.stop) {
        ScanOutcome::Found(pin) => {
            println!("{pin}");
            Ok(ExitCode::SUCCESS)
        }
        ScanOutcome::Exhausted | ScanOutcome::Stopped | ScanOutcome::Failed(_) => {
            Ok(ExitCode::FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Result<Args, clap::Error> {
        let argv = ["find_code", "--portname", "/dev/ttyUSB0"];
        Args::try_parse_from(argv.iter().chain(extra).copied())
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]).unwrap();

        assert_eq!(args.portname, "/dev/ttyUSB0");
        assert_eq!(args.baudrate, 115_200);
        assert_eq!(args.timeout, Duration::from_secs(1));
        assert_eq!((args.start, args.stop), (0, 1999));
        assert_eq!(args.finder_config(), FinderConfig::default());
    }

    #[test]
    fn test_portname_required() {
        assert!(Args::try_parse_from(["find_code"]).is_err());
    }

    #[test]
    fn test_port_config() {
        let args = parse(&["-b", "9600", "--timeout", "0.25"]).unwrap();
        let port = args.port_config();

        assert_eq!(port.port_name, "/dev/ttyUSB0");
        assert_eq!(port.baud_rate, 9600);
        assert_eq!(port.timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_range_above_four_digits_rejected() {
        assert!(parse(&["--stop", "10000"]).is_err());
        assert!(parse(&["--start", "10000"]).is_err());
        let args = parse(&["--start", "9990", "--stop", "9999"]).unwrap();
        assert_eq!((args.start, args.stop), (9990, 9999));
    }

    #[test]
    fn test_timeout_rejected_when_out_of_range() {
        assert!(parse(&["--timeout", "1e20"]).is_err());
        assert!(parse(&["--timeout", "-1"]).is_err());
        assert!(parse(&["--timeout", "NaN"]).is_err());
        assert!(parse(&["--timeout", "soon"]).is_err());
    }

    #[test]
    fn test_poll_uses_timeout_as_deadline() {
        let args = parse(&["--poll", "--settle-ms", "20", "--timeout", "2"]).unwrap();

        assert_eq!(
            args.finder_config().settle,
            Settle::Poll {
                interval: Duration::from_millis(20),
                deadline: Duration::from_secs(2),
            }
        );
    }

    #[test]
    fn test_accumulate() {
        let args = parse(&["--accumulate"]).unwrap();

        assert_eq!(args.finder_config().buffer, BufferPolicy::Accumulate);
        assert_eq!(args.finder_config().settle, Settle::Fixed(Duration::from_millis(100)));
    }
}
