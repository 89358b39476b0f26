//! Scripted USB handle for tests
//!
//! [`ScriptedHandle`] records every interrupt write as it would appear on the
//! wire and answers reads from a queue of scripted steps. Clones share state,
//! so a test can keep one clone for inspection after moving another into a
//! [`HidDevice`](crate::HidDevice).
//!
//! # Example
//!
//! ```
//! use hid::mock::ScriptedHandle;
//!
//! let handle = ScriptedHandle::new();
//! handle.push_read(vec![1, 2, 3]);
//!
//! let device = handle.clone().into_device();
//! let mut buf = [0u8; 64];
//! assert_eq!(device.read(&mut buf).unwrap(), 3);
//! assert_eq!(&buf[..3], &[1, 2, 3]);
//! ```

use crate::descriptor::Endpoints;
use crate::device::HidDevice;
use crate::handle::UsbHandle;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Interrupt IN endpoint of the scripted interface
pub const MOCK_IN_ENDPOINT: u8 = 0x81;

/// Interrupt OUT endpoint of the scripted interface
pub const MOCK_OUT_ENDPOINT: u8 = 0x01;

/// One scripted answer to an interrupt read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadStep {
    /// Device returns these bytes (truncated to the caller's buffer)
    Data(Vec<u8>),
    /// Device returns a zero-length transfer
    Empty,
    /// Transfer fails
    Error(rusb::Error),
}

/// A write as seen on the wire (only the bytes actually transferred)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireWrite {
    pub endpoint: u8,
    pub data: Vec<u8>,
    pub timeout: Duration,
}

#[derive(Debug)]
struct State {
    reads: VecDeque<ReadStep>,
    /// Answer once `reads` is exhausted
    idle_read: ReadStep,
    writes: Vec<WireWrite>,
    write_attempts: usize,
    /// Write attempt index -> failure
    write_failures: HashMap<usize, rusb::Error>,
    /// Byte counts for the next successful writes; full length when empty
    write_lens: VecDeque<usize>,
    read_count: usize,
    released: Vec<u8>,
    reattached: Vec<u8>,
}

/// Scripted stand-in for a libusb device handle
#[derive(Debug, Clone)]
pub struct ScriptedHandle {
    state: Arc<Mutex<State>>,
}

impl Default for ScriptedHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedHandle {
    /// New handle; reads time out once the script runs dry
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                reads: VecDeque::new(),
                idle_read: ReadStep::Error(rusb::Error::Timeout),
                writes: Vec::new(),
                write_attempts: 0,
                write_failures: HashMap::new(),
                write_lens: VecDeque::new(),
                read_count: 0,
                released: Vec::new(),
                reattached: Vec::new(),
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Wrap this handle in a [`HidDevice`] with interface 0 and both
    /// interrupt endpoints present
    pub fn into_device(self) -> HidDevice<ScriptedHandle> {
        let endpoints = Endpoints {
            input: Some(MOCK_IN_ENDPOINT),
            output: Some(MOCK_OUT_ENDPOINT),
            input_max_packet_size: 64,
        };
        HidDevice::from_handle(self, 0, endpoints, false)
    }

    pub fn push_read(&self, data: Vec<u8>) {
        self.state().reads.push_back(ReadStep::Data(data));
    }

    pub fn push_empty_read(&self) {
        self.state().reads.push_back(ReadStep::Empty);
    }

    pub fn push_read_error(&self, error: rusb::Error) {
        self.state().reads.push_back(ReadStep::Error(error));
    }

    /// Answer used once the scripted reads are exhausted
    pub fn set_idle_read(&self, step: ReadStep) {
        self.state().idle_read = step;
    }

    /// Make the write attempt with this zero-based index fail
    pub fn fail_write(&self, index: usize, error: rusb::Error) {
        self.state().write_failures.insert(index, error);
    }

    /// Let the next successful write transfer at most `len` bytes
    pub fn push_write_len(&self, len: usize) {
        self.state().write_lens.push_back(len);
    }

    /// Successful writes, in order
    pub fn writes(&self) -> Vec<WireWrite> {
        self.state().writes.clone()
    }

    /// Number of read transfers attempted
    pub fn read_count(&self) -> usize {
        self.state().read_count
    }

    /// Scripted reads not yet consumed
    pub fn pending_reads(&self) -> usize {
        self.state().reads.len()
    }

    /// Interfaces released so far
    pub fn released_interfaces(&self) -> Vec<u8> {
        self.state().released.clone()
    }

    /// Interfaces handed back to the kernel driver so far
    pub fn reattached_interfaces(&self) -> Vec<u8> {
        self.state().reattached.clone()
    }
}

impl UsbHandle for ScriptedHandle {
    fn read_interrupt(
        &self,
        _endpoint: u8,
        buf: &mut [u8],
        _timeout: Duration,
    ) -> rusb::Result<usize> {
        let mut state = self.state();
        state.read_count += 1;

        let step = match state.reads.pop_front() {
            Some(step) => step,
            None => state.idle_read.clone(),
        };

        match step {
            ReadStep::Data(data) => {
                let len = data.len().min(buf.len());
                buf[..len].copy_from_slice(&data[..len]);
                Ok(len)
            }
            ReadStep::Empty => Ok(0),
            ReadStep::Error(e) => Err(e),
        }
    }

    fn write_interrupt(&self, endpoint: u8, buf: &[u8], timeout: Duration) -> rusb::Result<usize> {
        let mut state = self.state();
        let index = state.write_attempts;
        state.write_attempts += 1;

        if let Some(error) = state.write_failures.remove(&index) {
            return Err(error);
        }

        let len = match state.write_lens.pop_front() {
            Some(len) => len.min(buf.len()),
            None => buf.len(),
        };

        state.writes.push(WireWrite {
            endpoint,
            data: buf[..len].to_vec(),
            timeout,
        });
        Ok(len)
    }

    fn release_interface(&mut self, interface: u8) -> rusb::Result<()> {
        self.state().released.push(interface);
        Ok(())
    }

    fn attach_kernel_driver(&mut self, interface: u8) -> rusb::Result<()> {
        self.state().reattached.push(interface);
        Ok(())
    }
}
