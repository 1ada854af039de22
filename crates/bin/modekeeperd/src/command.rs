//! Console commands read line by line from stdin.

use std::fmt;
use std::str::FromStr;

use modekeeper_domain::schedule::AutoMode;
use modekeeper_domain::signal::Signal;

/// A parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Activate,
    Deactivate,
    Toggle,
    Status,
    /// Press the stop action on the shown indicator.
    Stop,
    /// Emit a signal on the bus, as the platform would.
    Signal(Signal),
    AutoMode(AutoMode),
    /// Raw window string, validated by the automation.
    AutoWindow(String),
    Help,
    Quit,
}

/// Why a console line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command {0:?}, try `help`")]
    Unknown(String),
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let head = words.next().ok_or(CommandError::Empty)?;
        match head {
            "activate" | "on" => Ok(Self::Activate),
            "deactivate" | "off" => Ok(Self::Deactivate),
            "toggle" => Ok(Self::Toggle),
            "status" => Ok(Self::Status),
            "stop" => Ok(Self::Stop),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            "signal" => {
                let name = words.next().ok_or(CommandError::MissingArgument("signal"))?;
                name.parse()
                    .map(Self::Signal)
                    .map_err(|err| CommandError::InvalidArgument(format!("{err}")))
            }
            "auto" => match words.next() {
                Some("mode") => {
                    let mode = words.next().ok_or(CommandError::MissingArgument("auto mode"))?;
                    mode.parse()
                        .map(Self::AutoMode)
                        .map_err(|err| CommandError::InvalidArgument(format!("{err}")))
                }
                Some("window") => {
                    let rest: Vec<&str> = words.collect();
                    if rest.is_empty() {
                        return Err(CommandError::MissingArgument("auto window"));
                    }
                    Ok(Self::AutoWindow(rest.join(" ")))
                }
                Some(other) => Err(CommandError::Unknown(format!("auto {other}"))),
                None => Err(CommandError::MissingArgument("auto")),
            },
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// Usage text printed by `help`.
pub struct Usage;

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "commands:")?;
        writeln!(f, "  activate | deactivate | toggle   control the override mode")?;
        writeln!(f, "  status                           show both engines")?;
        writeln!(f, "  stop                             press the indicator stop action")?;
        writeln!(f, "  signal <name>                    screen_off, shutdown, battery_saver, setting:<key>")?;
        writeln!(f, "  auto mode <mode>                 disabled, night, time_window, sunset_to_time, time_to_sunrise")?;
        writeln!(f, "  auto window <HH:MM,HH:MM>        set the automation window")?;
        write!(f, "  quit")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_simple_commands() {
        assert_eq!("activate".parse::<Command>().unwrap(), Command::Activate);
        assert_eq!("  off ".parse::<Command>().unwrap(), Command::Deactivate);
        assert_eq!("status".parse::<Command>().unwrap(), Command::Status);
    }

    #[test]
    fn should_parse_signal() {
        assert_eq!(
            "signal screen_off".parse::<Command>().unwrap(),
            Command::Signal(Signal::ScreenOff)
        );
        assert_eq!(
            "signal setting:auto.mode".parse::<Command>().unwrap(),
            Command::Signal(Signal::setting_changed("auto.mode"))
        );
    }

    #[test]
    fn should_parse_auto_commands() {
        assert_eq!(
            "auto mode night".parse::<Command>().unwrap(),
            Command::AutoMode(AutoMode::Night)
        );
        assert_eq!(
            "auto window 22:00,06:00".parse::<Command>().unwrap(),
            Command::AutoWindow("22:00,06:00".to_string())
        );
    }

    #[test]
    fn should_keep_malformed_window_for_the_automation() {
        assert_eq!(
            "auto window garbage".parse::<Command>().unwrap(),
            Command::AutoWindow("garbage".to_string())
        );
    }

    #[test]
    fn should_reject_missing_argument() {
        assert_eq!(
            "signal".parse::<Command>(),
            Err(CommandError::MissingArgument("signal"))
        );
        assert_eq!(
            "auto mode".parse::<Command>(),
            Err(CommandError::MissingArgument("auto mode"))
        );
    }

    #[test]
    fn should_reject_unknown_input() {
        assert_eq!("".parse::<Command>(), Err(CommandError::Empty));
        assert!(matches!(
            "reboot".parse::<Command>(),
            Err(CommandError::Unknown(_))
        ));
        assert!(matches!(
            "signal thunder".parse::<Command>(),
            Err(CommandError::InvalidArgument(_))
        ));
    }
}
