//! SleepOn frames as carried over the Nordic UART service.
//!
//! Requests (written to TX) start with `0x5a`, notifications (received on RX) with `0x5b`. The
//! second byte selects the kind.

use std::fmt;

use thiserror::Error;

pub const REQUEST_PREFIX: u8 = 0x5a;
pub const NOTIFICATION_PREFIX: u8 = 0x5b;

const KIND_HEART_SPO2: u8 = 0x40;
const KIND_VERSION: u8 = 0x14;
const KIND_BATTERY: u8 = 0x15;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("empty frame")]
    Empty,
    #[error("unknown frame prefix {0:#04x}")]
    UnknownPrefix(u8),
    #[error("{kind} too short, want at least {want} bytes, got {got}")]
    TooShort {
        kind: &'static str,
        want: usize,
        got: usize,
    },
}

fn require(data: &[u8], kind: &'static str, want: usize) -> Result<(), DecodeError> {
    if data.len() < want {
        return Err(DecodeError::TooShort {
            kind,
            want,
            got: data.len(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Request(Request),
    Notification(Notification),
}

impl Frame {
    pub fn decode(data: &[u8]) -> Result<Frame, DecodeError> {
        match data.first() {
            None => Err(DecodeError::Empty),
            Some(&REQUEST_PREFIX) => Request::decode(data).map(Frame::Request),
            Some(&NOTIFICATION_PREFIX) => Notification::decode(data).map(Frame::Notification),
            Some(&b) => Err(DecodeError::UnknownPrefix(b)),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Request(r) => r.fmt(f),
            Frame::Notification(n) => n.fmt(f),
        }
    }
}

/// A command sent to the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Version,
    Other { opcode: u8, payload: Vec<u8> },
}

impl Request {
    fn decode(data: &[u8]) -> Result<Request, DecodeError> {
        require(data, "request", 2)?;
        Ok(match data[1] {
            KIND_VERSION => Request::Version,
            opcode => Request::Other {
                opcode,
                payload: data[2..].to_vec(),
            },
        })
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Version => write!(f, "Version request"),
            Request::Other { opcode, payload } => {
                write!(f, "Request {opcode:#04x}")?;
                if !payload.is_empty() {
                    write!(f, ": {}", Hex(payload))?;
                }
                Ok(())
            }
        }
    }
}

/// Whether the device sits on its charger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charging {
    No,
    Yes,
    Full,
    Other(u8),
}

impl From<u8> for Charging {
    fn from(b: u8) -> Self {
        match b {
            0 => Charging::No,
            1 => Charging::Yes,
            2 => Charging::Full,
            b => Charging::Other(b),
        }
    }
}

impl fmt::Display for Charging {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Charging::No => write!(f, "not charging"),
            Charging::Yes => write!(f, "charging"),
            Charging::Full => write!(f, "fully charged"),
            Charging::Other(b) => write!(f, "charging state {b}"),
        }
    }
}

/// Data pushed by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    HeartSpO2 {
        /// SpO₂, percent.
        spo2: u8,
        /// Heart rate, 1/min.
        heart_rate: u8,
        wearing: bool,
        charging: Charging,
        /// Perfusion index. Older firmware leaves it out.
        pi: u8,
    },
    Battery {
        /// Percent.
        level: u8,
    },
    Version(String),
    Unknown(Vec<u8>),
}

impl Notification {
    fn decode(data: &[u8]) -> Result<Notification, DecodeError> {
        require(data, "notification", 2)?;
        match data[1] {
            KIND_HEART_SPO2 => {
                require(data, "heart/SpO2 notification", 7)?;
                Ok(Notification::HeartSpO2 {
                    spo2: data[3],
                    heart_rate: data[4],
                    wearing: data[5] > 0,
                    charging: data[6].into(),
                    pi: data.get(7).copied().unwrap_or(0),
                })
            }
            KIND_VERSION => {
                require(data, "version notification", 4)?;
                Ok(Notification::Version(
                    String::from_utf8_lossy(&data[3..]).into_owned(),
                ))
            }
            KIND_BATTERY => {
                require(data, "battery notification", 4)?;
                Ok(Notification::Battery { level: data[3] })
            }
            _ => Ok(Notification::Unknown(data.to_vec())),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::HeartSpO2 {
                spo2,
                heart_rate,
                wearing,
                charging,
                pi,
            } => write!(
                f,
                "SpO2 {spo2}%, heart rate {heart_rate}/min, {}, {charging}, PI {pi}",
                if *wearing { "worn" } else { "not worn" },
            ),
            Notification::Battery { level } => write!(f, "Battery {level}%"),
            Notification::Version(v) => write!(f, "Firmware version {v:?}"),
            Notification::Unknown(data) => match data.get(1) {
                Some(kind) => write!(f, "Unknown notification {kind:#04x}: {}", Hex(data)),
                None => write!(f, "Unknown notification: {}", Hex(data)),
            },
        }
    }
}

struct Hex<'a>(&'a [u8]);

impl fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_request() {
        let frame = Frame::decode(&[0x5a, 0x14]).unwrap();
        assert_eq!(frame, Frame::Request(Request::Version));
        assert_eq!(frame.to_string(), "Version request");
    }

    #[test]
    fn other_request_keeps_payload() {
        let frame = Frame::decode(&[0x5a, 0x21, 0x01, 0xff]).unwrap();
        assert_eq!(
            frame,
            Frame::Request(Request::Other {
                opcode: 0x21,
                payload: vec![0x01, 0xff]
            })
        );
        assert_eq!(frame.to_string(), "Request 0x21: 01 ff");
    }

    #[test]
    fn heart_spo2_with_pi() {
        let frame = Frame::decode(&[0x5b, 0x40, 0x00, 97, 62, 1, 0, 3]).unwrap();
        assert_eq!(
            frame,
            Frame::Notification(Notification::HeartSpO2 {
                spo2: 97,
                heart_rate: 62,
                wearing: true,
                charging: Charging::No,
                pi: 3,
            })
        );
        assert_eq!(
            frame.to_string(),
            "SpO2 97%, heart rate 62/min, worn, not charging, PI 3"
        );
    }

    #[test]
    fn heart_spo2_without_pi() {
        let frame = Frame::decode(&[0x5b, 0x40, 0x00, 95, 70, 0, 2]).unwrap();
        assert_eq!(
            frame,
            Frame::Notification(Notification::HeartSpO2 {
                spo2: 95,
                heart_rate: 70,
                wearing: false,
                charging: Charging::Full,
                pi: 0,
            })
        );
    }

    #[test]
    fn heart_spo2_too_short() {
        assert_eq!(
            Frame::decode(&[0x5b, 0x40, 0x00, 95, 70, 0]),
            Err(DecodeError::TooShort {
                kind: "heart/SpO2 notification",
                want: 7,
                got: 6
            })
        );
    }

    #[test]
    fn version_notification() {
        let frame = Frame::decode(b"\x5b\x14\x00V1.2.3").unwrap();
        assert_eq!(
            frame,
            Frame::Notification(Notification::Version("V1.2.3".to_string()))
        );
        assert_eq!(frame.to_string(), "Firmware version \"V1.2.3\"");
    }

    #[test]
    fn battery_needs_its_level_byte() {
        assert_eq!(
            Frame::decode(&[0x5b, 0x15, 0x00, 80]).unwrap(),
            Frame::Notification(Notification::Battery { level: 80 })
        );
        assert!(matches!(
            Frame::decode(&[0x5b, 0x15, 0x00]),
            Err(DecodeError::TooShort { want: 4, got: 3, .. })
        ));
    }

    #[test]
    fn unknown_kind_is_kept() {
        let frame = Frame::decode(&[0x5b, 0x99, 0x01]).unwrap();
        assert_eq!(
            frame,
            Frame::Notification(Notification::Unknown(vec![0x5b, 0x99, 0x01]))
        );
        assert_eq!(frame.to_string(), "Unknown notification 0x99: 5b 99 01");
    }

    #[test]
    fn bad_frames() {
        assert_eq!(Frame::decode(&[]), Err(DecodeError::Empty));
        assert_eq!(Frame::decode(&[0x00, 0x14]), Err(DecodeError::UnknownPrefix(0)));
        assert!(matches!(
            Frame::decode(&[0x5b]),
            Err(DecodeError::TooShort { want: 2, got: 1, .. })
        ));
        assert_eq!(
            DecodeError::UnknownPrefix(0x7f).to_string(),
            "unknown frame prefix 0x7f"
        );
    }
}
