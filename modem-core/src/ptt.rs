//! Push-to-talk control: the abstraction that keys a transmitter around a
//! burst of samples. `NullPtt` is the default for loopback/file-only runs;
//! `SerialPtt` and `LibraryPtt` drive real hardware; `ChainedPtt` fans one
//! logical key-up out to several controllers.

use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::net::TcpStream;
use std::os::unix::io::AsRawFd;
use std::sync::Arc;

use libloading::{Library, Symbol};
use serde_json::Value;

use crate::errors::{DeviceError, ModemError, Result as ModemResult};
use crate::tcp_control;

pub trait PttControl: Send {
    fn set(&mut self, enable: bool) -> ModemResult<()>;
    fn get(&self) -> bool;
}

/// Does nothing; `get()` reports whatever `set()` last recorded.
#[derive(Debug, Default)]
pub struct NullPtt {
    enabled: bool,
}

impl PttControl for NullPtt {
    fn set(&mut self, enable: bool) -> ModemResult<()> {
        self.enabled = enable;
        Ok(())
    }

    fn get(&self) -> bool {
        self.enabled
    }
}

/// Which serial line keys the transmitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialPttLine {
    Rts,
    Dtr,
}

/// Whether the line asserts on a high or low level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialPttTrigger {
    Off,
    On,
}

/// PTT via a serial port's RTS or DTR line, raised or dropped through the
/// `TIOCMBIS`/`TIOCMBIC`/`TIOCMGET` line-control ioctls.
pub struct SerialPtt {
    file: File,
    line: SerialPttLine,
    trigger: SerialPttTrigger,
    enabled: bool,
}

impl SerialPtt {
    /// Open `port_path` (e.g. `/dev/ttyUSB0`) for line control only; no baud
    /// rate or framing is configured since no data is exchanged.
    pub fn open(port_path: &str) -> ModemResult<Self> {
        Self::open_with(port_path, SerialPttLine::Rts, SerialPttTrigger::On)
    }

    pub fn open_with(
        port_path: &str,
        line: SerialPttLine,
        trigger: SerialPttTrigger,
    ) -> ModemResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(port_path)
            .map_err(|e| DeviceError::OpenFailed { reason: e.to_string() })?;
        let mut ptt = SerialPtt {
            file,
            line,
            trigger,
            enabled: false,
        };
        // The OS driver may assert RTS on open; drive the line inactive so a
        // freshly-opened port never keys the radio before the first `set`.
        ptt.set(false)?;
        Ok(ptt)
    }

    fn line_bit(&self) -> libc::c_int {
        match self.line {
            SerialPttLine::Rts => libc::TIOCM_RTS,
            SerialPttLine::Dtr => libc::TIOCM_DTR,
        }
    }

    fn assert_level(&self, enable: bool) -> bool {
        match self.trigger {
            SerialPttTrigger::On => enable,
            SerialPttTrigger::Off => !enable,
        }
    }
}

impl PttControl for SerialPtt {
    fn set(&mut self, enable: bool) -> ModemResult<()> {
        let fd = self.file.as_raw_fd();
        let bit = self.line_bit();
        let set_high = self.assert_level(enable);

        let rc = unsafe {
            if set_high {
                libc::ioctl(fd, libc::TIOCMBIS as _, &bit as *const _)
            } else {
                libc::ioctl(fd, libc::TIOCMBIC as _, &bit as *const _)
            }
        };
        if rc < 0 {
            return Err(DeviceError::Buffer {
                reason: std::io::Error::last_os_error().to_string(),
            }
            .into());
        }
        self.enabled = enable;
        Ok(())
    }

    fn get(&self) -> bool {
        self.enabled
    }
}

/// The C ABI a PTT shared library must export: `init`/`uninit` bracket the
/// library's lifetime, `set_ptt`/`get_ptt` drive the line. `init` takes an
/// optional `(action, value)` callback the library may invoke asynchronously
/// to report state changes; this binding does not register one.
type InitFn = unsafe extern "C" fn(callback: *const std::ffi::c_void) -> i32;
type UninitFn = unsafe extern "C" fn() -> i32;
type SetPttFn = unsafe extern "C" fn(enable: i32) -> i32;
type GetPttFn = unsafe extern "C" fn(out: *mut i32) -> i32;

/// PTT via a dynamically loaded vendor library (dlopen/dlsym ABI).
pub struct LibraryPtt {
    // Kept alive for the duration the library's symbols are in use.
    _library: Arc<Library>,
    set_ptt: SetPttFn,
    get_ptt: GetPttFn,
    uninit: UninitFn,
}

impl LibraryPtt {
    pub fn load(path: &str) -> ModemResult<Self> {
        let _ = CString::new(path.as_bytes())
            .map_err(|e| DeviceError::OpenFailed { reason: e.to_string() })?;

        let library = unsafe {
            Library::new(path).map_err(|e| DeviceError::OpenFailed { reason: e.to_string() })?
        };

        let init: Symbol<InitFn> = unsafe {
            library
                .get(b"init\0")
                .map_err(|e| DeviceError::OpenFailed { reason: e.to_string() })?
        };
        let set_ptt: Symbol<SetPttFn> = unsafe {
            library
                .get(b"set_ptt\0")
                .map_err(|e| DeviceError::OpenFailed { reason: e.to_string() })?
        };
        let get_ptt: Symbol<GetPttFn> = unsafe {
            library
                .get(b"get_ptt\0")
                .map_err(|e| DeviceError::OpenFailed { reason: e.to_string() })?
        };
        let uninit: Symbol<UninitFn> = unsafe {
            library
                .get(b"uninit\0")
                .map_err(|e| DeviceError::OpenFailed { reason: e.to_string() })?
        };

        let set_ptt = *set_ptt;
        let get_ptt = *get_ptt;
        let uninit = *uninit;

        let rc = unsafe { init(std::ptr::null()) };
        if rc != 0 {
            return Err(DeviceError::OpenFailed {
                reason: format!("library init() returned {rc}"),
            }
            .into());
        }

        Ok(LibraryPtt {
            _library: Arc::new(library),
            set_ptt,
            get_ptt,
            uninit,
        })
    }
}

impl PttControl for LibraryPtt {
    fn set(&mut self, enable: bool) -> ModemResult<()> {
        let rc = unsafe { (self.set_ptt)(enable as i32) };
        if rc != 0 {
            return Err(DeviceError::Buffer {
                reason: format!("set_ptt() returned {rc}"),
            }
            .into());
        }
        Ok(())
    }

    fn get(&self) -> bool {
        let mut out: i32 = 0;
        let rc = unsafe { (self.get_ptt)(&mut out as *mut i32) };
        rc == 0 && out != 0
    }
}

impl Drop for LibraryPtt {
    fn drop(&mut self) {
        unsafe {
            (self.uninit)();
        }
    }
}

/// PTT via the framed JSON-over-TCP control protocol (§6): `set_ptt`/
/// `get_ptt` commands issued against a remote stream-control server.
pub struct TcpPtt {
    stream: TcpStream,
    enabled: bool,
}

impl TcpPtt {
    pub fn connect(addr: &str) -> ModemResult<Self> {
        let stream = TcpStream::connect(addr)
            .map_err(|e| DeviceError::OpenFailed { reason: e.to_string() })?;
        Ok(TcpPtt {
            stream,
            enabled: false,
        })
    }
}

impl PttControl for TcpPtt {
    fn set(&mut self, enable: bool) -> ModemResult<()> {
        tcp_control::call(&mut self.stream, "set_ptt", Some(Value::Bool(enable)))?;
        self.enabled = enable;
        Ok(())
    }

    fn get(&self) -> bool {
        self.enabled
    }
}

/// Fans one logical key-up/key-down out to several controllers. `get()`
/// reports true if any member is asserted.
#[derive(Default)]
pub struct ChainedPtt {
    members: Vec<Box<dyn PttControl>>,
}

impl ChainedPtt {
    pub fn new() -> Self {
        ChainedPtt { members: Vec::new() }
    }

    pub fn push(&mut self, member: Box<dyn PttControl>) {
        self.members.push(member);
    }
}

impl PttControl for ChainedPtt {
    fn set(&mut self, enable: bool) -> ModemResult<()> {
        let mut first_err: Option<ModemError> = None;
        for member in &mut self.members {
            if let Err(e) = member.set(enable) {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn get(&self) -> bool {
        self.members.iter().any(|m| m.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_ptt_reports_last_set_value() {
        let mut ptt = NullPtt::default();
        assert!(!ptt.get());
        ptt.set(true).unwrap();
        assert!(ptt.get());
        ptt.set(false).unwrap();
        assert!(!ptt.get());
    }

    #[test]
    fn chained_ptt_ors_member_state() {
        let mut chain = ChainedPtt::new();
        chain.push(Box::new(NullPtt::default()));
        chain.push(Box::new(NullPtt::default()));
        assert!(!chain.get());
        chain.set(true).unwrap();
        assert!(chain.get());
    }
}
