//! Record model and per-record encoding/decoding.
//!
//! Each record on the wire is `[param id][type descriptor][value bytes]`.
//! The handful of parameters the gateway acts on are modeled explicitly;
//! everything else is carried opaquely through [`Record::Unhandled`] so a
//! packet can be inspected or relayed without this crate understanding
//! every parameter the device family defines.

use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ProtocolError;
use crate::value::{decode_value, encode_value, ValueFormat};

/// OpenThings parameter ids used by the eTRV device family.
///
/// Parameters the codec does not model decode as [`Record::Unhandled`];
/// the constants are published so callers can match on them.
pub mod param {
    /// Join acknowledgement sent by the gateway
    pub const JOIN_RESPONSE: u8 = 0x6A;
    /// Join request broadcast by a device looking for a gateway
    pub const JOIN_COMMAND: u8 = 0xEA;
    /// Real power
    pub const POWER: u8 = 0x70;
    /// Reactive power
    pub const REACTIVE_POWER: u8 = 0x71;
    /// Current draw
    pub const CURRENT: u8 = 0x69;
    /// Switch actuation command
    pub const ACTUATE_SWITCH: u8 = 0xF3;
    /// Mains frequency
    pub const FREQUENCY: u8 = 0x66;
    /// Test parameter
    pub const TEST: u8 = 0xAA;
    /// Relay/switch state report
    pub const SWITCH_STATE: u8 = 0x73;
    /// New target temperature for the valve driver board
    pub const TARGET_TEMPERATURE: u8 = 0xF4;
    /// Externally read room temperature
    pub const TEMPERATURE_REPORT: u8 = 0x74;
    /// Battery voltage report
    pub const VOLTAGE: u8 = 0x76;
    /// Exercise valve command; diagnostic flags come back the same way
    pub const EXERCISE_VALVE: u8 = 0xA3;
    /// Request battery voltage from the driver board
    pub const REQUEST_VOLTAGE: u8 = 0xE2;
    /// Battery voltage reported by the driver board
    pub const REPORT_VOLTAGE: u8 = 0x62;
    /// Request diagnostic flags from the driver board
    pub const REQUEST_DIAGNOSTICS: u8 = 0xA6;
    /// Diagnostic flags reported by the driver board
    pub const REPORT_DIAGNOSTICS: u8 = 0x26;
    /// Valve state: 0 fully open, 1 fully closed, 2 normal operation
    pub const SET_VALVE_STATE: u8 = 0xA5;
    /// Low power mode: 0 off, 1 on
    pub const SET_LOW_POWER_MODE: u8 = 0xA4;
    /// Ask the device to identify itself
    pub const IDENTIFY: u8 = 0xBF;
    /// Update the device reporting interval
    pub const SET_REPORTING_INTERVAL: u8 = 0xD2;
}

/// One decoded OpenThings record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Record {
    /// Device requesting to join the network
    Join,
    /// Ask the device to identify itself
    Identify,
    /// Room temperature in degrees Celsius
    Temperature(f64),
    /// Battery voltage in volts
    Voltage(f64),
    /// Any parameter this codec does not interpret, carried opaquely so it
    /// can be re-encoded unchanged
    Unhandled {
        /// Raw parameter id
        param: u8,
        /// Raw type-descriptor byte
        type_desc: u8,
        /// Raw value bytes
        value: Vec<u8>,
    },
}

impl Record {
    /// Decode one record from its wire fields.
    ///
    /// Temperature and voltage records always carry a value; an empty one
    /// is a framing defect, not a zero reading.
    pub fn decode(param: u8, type_desc: u8, value: &[u8]) -> Result<Record, ProtocolError> {
        match param {
            param::JOIN_COMMAND => Ok(Record::Join),
            param::IDENTIFY => Ok(Record::Identify),
            param::TEMPERATURE_REPORT => {
                if value.is_empty() {
                    return Err(ProtocolError::ShortPacket(0));
                }
                Ok(Record::Temperature(decode_value(type_desc, value)))
            }
            param::VOLTAGE => {
                if value.is_empty() {
                    return Err(ProtocolError::ShortPacket(0));
                }
                Ok(Record::Voltage(decode_value(type_desc, value)))
            }
            _ => Ok(Record::Unhandled {
                param,
                type_desc,
                value: value.to_vec(),
            }),
        }
    }

    /// Append this record's wire form to `buf`.
    ///
    /// Join and identify are pure signals and carry a zero-length value.
    /// Temperature and voltage encode as signed x.8 in two bytes, the
    /// representation the eTRV itself reports in.
    pub fn encode(&self, buf: &mut BytesMut) {
        match self {
            Record::Join => {
                buf.put_u8(param::JOIN_COMMAND);
                buf.put_u8(0);
            }
            Record::Identify => {
                buf.put_u8(param::IDENTIFY);
                buf.put_u8(0);
            }
            Record::Temperature(value) => encode_report(buf, param::TEMPERATURE_REPORT, *value),
            Record::Voltage(value) => encode_report(buf, param::VOLTAGE, *value),
            Record::Unhandled {
                param,
                type_desc,
                value,
            } => {
                buf.put_u8(*param);
                buf.put_u8(*type_desc);
                buf.put_slice(value);
            }
        }
    }
}

fn encode_report(buf: &mut BytesMut, param: u8, value: f64) {
    let (type_desc, bytes) = encode_value(ValueFormat::SignedFixed8, 2, value);
    buf.put_u8(param);
    buf.put_u8(type_desc);
    buf.put_slice(&bytes);
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Record::Join => write!(f, "Join"),
            Record::Identify => write!(f, "Identify"),
            Record::Temperature(value) => write!(f, "Temperature{{{:.6}}}", value),
            Record::Voltage(value) => write!(f, "Voltage{{{:.6}}}", value),
            Record::Unhandled {
                param,
                type_desc,
                value,
            } => write!(f, "Unhandled{{{:02x},{:02x},{:02x?}}}", param, type_desc, value),
        }
    }
}
