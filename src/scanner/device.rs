//! Drains point packets from a live sensor.
//!
//! The vendor's discovery-and-handshake machinery lives outside this crate;
//! what arrives here is the sensor's point data stream, the same
//! ethernet-style packets the LVX container records, delivered as UDP
//! datagrams on the data port. The driver is a process-wide singleton (the
//! vendor stack posts C callbacks with no user pointer), so a module-local
//! guard admits one live owner at a time; a second `init` fails with
//! [Error::SourceUnavailable].

use super::{EthPacket, Flow, ScanCode, Sink, ETH_HEADER_LEN, EXTEND_CARTESIAN, EXTEND_RAW_POINT_LEN};
use crate::{Error, Result};
use log::{debug, trace, warn};
use std::io::ErrorKind;
use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Port the sensor is configured to stream point data to.
const POINT_DATA_PORT: u16 = 65000;

/// Receive timeout between socket polls, so `stop` flags are honored.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

static DRIVER_CLAIMED: AtomicBool = AtomicBool::new(false);

/// A scanner over the live sensor's data stream.
#[derive(Debug)]
pub struct DeviceScanner {
    broadcast_code: String,
    socket: Option<UdpSocket>,
}

impl DeviceScanner {
    /// Creates a scanner for the sensor announcing this broadcast code.
    pub fn new(broadcast_code: &str) -> DeviceScanner {
        DeviceScanner {
            broadcast_code: broadcast_code.to_string(),
            socket: None,
        }
    }

    /// Returns the broadcast code this scanner was created for.
    pub fn broadcast_code(&self) -> &str {
        &self.broadcast_code
    }

    /// Claims the driver and binds the data port.
    pub fn init(&mut self) -> Result<()> {
        if self.socket.is_some() {
            debug!(
                "device scanner for {} already initialized",
                self.broadcast_code
            );
            return Ok(());
        }
        if DRIVER_CLAIMED.swap(true, Ordering::SeqCst) {
            return Err(Error::SourceUnavailable(
                "lidar driver is already claimed by another scanner".to_string(),
            ));
        }
        debug!(
            "initializing device scanner for broadcast code {}",
            self.broadcast_code
        );
        let socket = match UdpSocket::bind(("0.0.0.0", POINT_DATA_PORT)) {
            Ok(socket) => socket,
            Err(e) => {
                DRIVER_CLAIMED.store(false, Ordering::SeqCst);
                return Err(Error::SourceUnavailable(format!(
                    "cannot bind data port {POINT_DATA_PORT}: {e}"
                )));
            }
        };
        if let Err(e) = socket.set_read_timeout(Some(POLL_INTERVAL)) {
            DRIVER_CLAIMED.store(false, Ordering::SeqCst);
            return Err(Error::SourceUnavailable(format!(
                "cannot configure data socket: {e}"
            )));
        }
        self.socket = Some(socket);
        Ok(())
    }

    /// Drains datagrams, handing extended cartesian points to the sink.
    ///
    /// Blocks until the sink pauses or the socket fails; a live sensor has
    /// no end-of-stream.
    pub fn scan(&mut self, sink: &mut Sink<'_>) -> Result<ScanCode> {
        let socket = self
            .socket
            .as_ref()
            .ok_or_else(|| Error::Scan("device scanner is not initialized".to_string()))?;

        let mut datagram = [0u8; 1500];
        loop {
            let received = match socket.recv(&mut datagram) {
                Ok(received) => received,
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    continue;
                }
                Err(e) => return Err(Error::Scan(format!("data socket failed: {e}"))),
            };
            let Some(eth) = EthPacket::parse(&datagram[..received]) else {
                warn!("dropping short datagram of {received} bytes");
                continue;
            };
            if eth.data_type != EXTEND_CARTESIAN {
                trace!("ignoring packet of data type {}", eth.data_type);
                continue;
            }
            let mut offset = ETH_HEADER_LEN;
            while offset + EXTEND_RAW_POINT_LEN <= received {
                if let Some(point) = eth.extend_cartesian_point(&datagram[offset..]) {
                    if sink(point) == Flow::Pause {
                        return Ok(ScanCode::Paused);
                    }
                }
                offset += EXTEND_RAW_POINT_LEN;
            }
        }
    }

    /// Stops sampling and releases the driver.
    pub fn stop(&mut self) {
        if self.socket.take().is_some() {
            debug!("releasing device scanner for {}", self.broadcast_code);
            DRIVER_CLAIMED.store(false, Ordering::SeqCst);
        }
    }
}

impl Drop for DeviceScanner {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_requires_init() {
        let mut scanner = DeviceScanner::new("TESTCODE00000000");
        let result = scanner.scan(&mut |_| Flow::Pause);
        assert!(matches!(result, Err(Error::Scan(_))));
    }

    #[test]
    fn keeps_its_broadcast_code() {
        let scanner = DeviceScanner::new("3WEDH7600101621");
        assert_eq!("3WEDH7600101621", scanner.broadcast_code());
    }
}
