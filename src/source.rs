//! Talking to the TeamRedMiner API.
//!
//! TeamRedMiner implements the cgminer API: one JSON command per TCP connection, answered with
//! a JSON document and the server closing the connection.
//!
//! ```text
//! -> {"command":"summary"}
//! <- {"STATUS":[{"STATUS":"S","Code":11,"Msg":"Summary",...}],"SUMMARY":[{"Elapsed":450,"MHS 30s":85.2,...}],"id":1}
//! ```

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::SourceError;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 4028;

/// Anything that can tell us how the miner is doing right now.
pub trait StatusSource {
    fn fetch_status(&self) -> Result<MinerStatus, SourceError>;
}

/// The part of the miner status the check looks at. Fields are None if the API did not report
/// them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MinerStatus {
    /// Average hashrate over the last 30 seconds in MH/s.
    pub hashrate: Option<f64>,
    pub uptime_seconds: Option<f64>,
    pub devices: Vec<DeviceStatus>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeviceStatus {
    pub gpu: i64,
    pub alive: Option<bool>,
    pub temperature: Option<f64>,
    pub memory_temperature: Option<f64>,
}

#[derive(Deserialize)]
struct ApiStatus {
    #[serde(rename = "STATUS")]
    status: String,
    #[serde(rename = "Code", default)]
    code: i64,
    #[serde(rename = "Msg", default)]
    message: String,
}

#[derive(Deserialize)]
struct SummaryEntry {
    #[serde(rename = "MHS 30s")]
    mhs_30s: Option<f64>,
    #[serde(rename = "Elapsed")]
    elapsed: Option<f64>,
}

#[derive(Deserialize)]
struct DeviceEntry {
    #[serde(rename = "GPU")]
    gpu: Option<i64>,
    #[serde(rename = "Status")]
    status: Option<String>,
    #[serde(rename = "Temperature")]
    temperature: Option<f64>,
    #[serde(rename = "TemperatureMem")]
    temperature_mem: Option<f64>,
}

/// A client for the TeamRedMiner API. Every command opens its own connection.
#[derive(Clone, Debug)]
pub struct TeamRedMinerApi {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TeamRedMinerApi {
    pub fn new(host: &str, port: u16, timeout: Duration) -> Self {
        TeamRedMinerApi {
            host: host.to_owned(),
            port,
            timeout,
        }
    }

    /// Sends a single command and returns the payload section of the response, which the API
    /// names after the command in upper case (`summary` answers with `SUMMARY`).
    pub fn request(&self, command: &str) -> Result<Value, SourceError> {
        let mut stream = self.connect()?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;

        let request = serde_json::json!({ "command": command });
        stream.write_all(request.to_string().as_bytes())?;

        let mut raw = Vec::new();
        stream.read_to_end(&mut raw)?;

        parse_response(&raw, &command.to_uppercase())
    }

    fn connect(&self) -> Result<TcpStream, SourceError> {
        let mut last_err = None;
        for addr in (self.host.as_str(), self.port).to_socket_addrs()? {
            tracing::debug!(%addr, "connecting to TeamRedMiner API");
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(stream) => return Ok(stream),
                Err(err) => last_err = Some(err),
            }
        }

        Err(match last_err {
            Some(err) => err.into(),
            None => SourceError::UnexpectedResponse(format!(
                "{} did not resolve to any address",
                self.host
            )),
        })
    }

    fn request_as<T: DeserializeOwned>(&self, command: &str) -> Result<T, SourceError> {
        Ok(serde_json::from_value(self.request(command)?)?)
    }
}

impl Default for TeamRedMinerApi {
    fn default() -> Self {
        TeamRedMinerApi::new(DEFAULT_HOST, DEFAULT_PORT, Duration::from_secs(1))
    }
}

impl StatusSource for TeamRedMinerApi {
    fn fetch_status(&self) -> Result<MinerStatus, SourceError> {
        let summary: Vec<SummaryEntry> = self.request_as("summary")?;
        let summary = summary
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::UnexpectedResponse("empty summary".to_owned()))?;

        let devices: Vec<DeviceEntry> = self.request_as("devs")?;

        let status = MinerStatus {
            hashrate: summary.mhs_30s,
            uptime_seconds: summary.elapsed,
            devices: devices
                .into_iter()
                .filter_map(|d| {
                    Some(DeviceStatus {
                        gpu: d.gpu?,
                        alive: d.status.map(|s| s == "Alive"),
                        temperature: d.temperature,
                        memory_temperature: d.temperature_mem,
                    })
                })
                .collect(),
        };
        log_status(&status);

        Ok(status)
    }
}

fn log_status(status: &MinerStatus) {
    if let Some(hashrate) = status.hashrate {
        tracing::info!("Hashrate is {} MH/s", hashrate);
    }
    if let Some(uptime) = status.uptime_seconds {
        let seconds = if uptime > 1.0 { "seconds" } else { "second" };
        tracing::info!("Uptime is {} {}", uptime, seconds);
    }
    for device in &status.devices {
        match device.alive {
            Some(true) => tracing::info!("GPU {} is alive", device.gpu),
            Some(false) => tracing::info!("GPU {} is dead!", device.gpu),
            None => {}
        }
        if let Some(temperature) = device.temperature {
            tracing::info!("GPU {}: temperature is {}C", device.gpu, temperature);
        }
        if let Some(temperature) = device.memory_temperature {
            tracing::info!("GPU {}: memory temperature is {}C", device.gpu, temperature);
        }
    }
}

/// Checks the STATUS section of a raw API response and returns its `section` payload.
fn parse_response(raw: &[u8], section: &str) -> Result<Value, SourceError> {
    // the API terminates its responses with a NUL byte
    let end = raw.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
    let mut response: serde_json::Map<String, Value> = serde_json::from_slice(&raw[..end])?;
    tracing::debug!(?response, "API response");

    let statuses: Vec<ApiStatus> = match response.remove("STATUS") {
        Some(statuses) => serde_json::from_value(statuses)?,
        None => {
            return Err(SourceError::UnexpectedResponse(
                "missing STATUS section".to_owned(),
            ))
        }
    };
    for status in statuses {
        if matches!(status.status.as_str(), "W" | "E" | "F") {
            return Err(SourceError::Api {
                code: status.code,
                message: status.message,
            });
        }
    }

    response
        .remove(section)
        .ok_or_else(|| SourceError::UnexpectedResponse(format!("missing {} section", section)))
}
