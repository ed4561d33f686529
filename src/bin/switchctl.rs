//! `switchctl` — command-line client for the relay controller.
//!
//! Builds a validated command datagram, sends it and waits for the echo
//! acknowledgment, re-sending up to the attempt budget. Exit code 0 on
//! acknowledgment, 1 on validation, rejection, or transport failure.
//!
//! ```text
//! switchctl --device 192.168.1.38:3333 period 07:00 22:00
//! switchctl address https://reports.example/update
//! switchctl wifi attic-net hunter222
//! ```

#[cfg(not(target_os = "espidf"))]
mod cli {
    use std::process::ExitCode;
    use std::time::Duration;

    use clap::{Parser, Subcommand};

    use autoswitch::client::{send_command, RetryPolicy, SendOutcome, UdpTransport};
    use autoswitch::period::Period;
    use autoswitch::protocol::Message;

    #[derive(Parser)]
    #[command(name = "switchctl", about = "Configure an autoswitch relay controller over UDP")]
    struct Cli {
        /// Device address as host:port
        #[arg(long, default_value = "192.168.1.38:3333")]
        device: String,

        /// Send attempts before giving up
        #[arg(long, default_value_t = 8)]
        attempts: u32,

        /// Per-attempt reply timeout in seconds
        #[arg(long, default_value_t = 2)]
        timeout: u64,

        #[command(subcommand)]
        command: Command,
    }

    #[derive(Subcommand)]
    enum Command {
        /// Set the daily relay ON window (end exclusive, may wrap midnight)
        Period {
            /// Window start as hh:mm
            start: String,
            /// Window end as hh:mm
            end: String,
        },
        /// Set the telemetry report URL (http:// or https://, max 199 bytes)
        Address { url: String },
        /// Set WiFi credentials; the device restarts ~10s after the ack
        Wifi {
            /// SSID, max 32 characters
            ssid: String,
            /// Passphrase, max 64 characters
            password: String,
        },
    }

    /// Parse `hh:mm` into validated hour/minute.
    fn parse_hhmm(s: &str) -> Result<(u8, u8), String> {
        let (h, m) = s
            .split_once(':')
            .ok_or_else(|| format!("'{s}' is not hh:mm"))?;
        let hour: u8 = h.parse().map_err(|_| format!("invalid hour in '{s}'"))?;
        let minute: u8 = m.parse().map_err(|_| format!("invalid minute in '{s}'"))?;
        if hour > 23 || minute > 59 {
            return Err(format!("'{s}' is out of range (00:00-23:59)"));
        }
        Ok((hour, minute))
    }

    /// Validate the user's intent into a wire message. Fails before any
    /// network activity — an invalid command performs zero sends.
    fn build_message(command: &Command) -> Result<Message, String> {
        match command {
            Command::Period { start, end } => {
                let (sh, sm) = parse_hhmm(start)?;
                let (eh, em) = parse_hhmm(end)?;
                let period = Period::new(sh, sm, eh, em).map_err(|e| e.to_string())?;
                Ok(Message::Period {
                    raw: period.as_bytes(),
                })
            }
            Command::Address { url } => Message::address(url).map_err(|e| e.to_string()),
            Command::Wifi { ssid, password } => {
                Message::credentials(ssid, password).map_err(|e| e.to_string())
            }
        }
    }

    pub fn run() -> ExitCode {
        let cli = Cli::parse();

        let message = match build_message(&cli.command) {
            Ok(m) => m,
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::FAILURE;
            }
        };

        let mut transport =
            match UdpTransport::connect(&cli.device, Duration::from_secs(cli.timeout)) {
                Ok(t) => t,
                Err(e) => {
                    eprintln!("error: cannot reach {}: {e}", cli.device);
                    return ExitCode::FAILURE;
                }
            };

        let policy = RetryPolicy {
            max_attempts: cli.attempts,
        };
        match send_command(&mut transport, &message, policy) {
            SendOutcome::Acked => {
                println!("acknowledged");
                ExitCode::SUCCESS
            }
            SendOutcome::Rejected => {
                eprintln!("device rejected the command — check the arguments");
                ExitCode::FAILURE
            }
            SendOutcome::TimedOut => {
                eprintln!("no acknowledgment after {} attempts", cli.attempts);
                ExitCode::FAILURE
            }
        }
    }

}

#[cfg(not(target_os = "espidf"))]
fn main() -> std::process::ExitCode {
    cli::run()
}

/// The client does not run on the device.
#[cfg(target_os = "espidf")]
fn main() {}
