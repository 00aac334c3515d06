//! Core-pinned threads for the ESP32 dual-core.
//!
//! Each long-running thread is described by a [`TaskSpec`].  On the board
//! the placement is applied through `esp_pthread_set_cfg()`, which configures the
//! *next* `pthread_create()` from the calling thread, so config and spawn
//! happen back to back inside [`TaskSpec::spawn`].  On the host only the
//! name and stack size are honoured.

use std::io;
use std::thread::JoinHandle;

/// CPU core identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// Core 0 (PRO_CPU): serial console and IDF housekeeping.
    Pro = 0,
    /// Core 1 (APP_CPU): control loop and acquisition.
    App = 1,
}

/// Placement and sizing of one firmware thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSpec {
    /// NUL-terminated, e.g. `"control\0"`.
    pub name: &'static str,
    pub core: Core,
    /// FreeRTOS priority; higher preempts lower.
    pub priority: u8,
    pub stack_kb: usize,
}

impl TaskSpec {
    pub const fn new(name: &'static str, core: Core, priority: u8, stack_kb: usize) -> Self {
        Self {
            name,
            core,
            priority,
            stack_kb,
        }
    }

    /// Name without the terminator.
    pub fn label(&self) -> &'static str {
        self.name.trim_end_matches('\0')
    }

    fn check(&self) -> io::Result<()> {
        if !self.name.ends_with('\0') || self.label().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("task name {:?} must be non-empty and NUL-terminated", self.name),
            ));
        }
        Ok(())
    }

    /// Start `f` on a new thread placed according to this spec.
    #[cfg(target_os = "espidf")]
    pub fn spawn(&self, f: impl FnOnce() + Send + 'static) -> io::Result<JoinHandle<()>> {
        self.check()?;

        // SAFETY: the config struct is copied by esp_pthread_set_cfg and
        // `name` is a 'static NUL-terminated string.
        let ret = unsafe {
            let mut cfg = esp_idf_sys::esp_create_default_pthread_config();
            cfg.pin_to_core = self.core as i32;
            cfg.prio = i32::from(self.priority);
            cfg.stack_size = (self.stack_kb * 1024) as i32;
            cfg.thread_name = self.name.as_ptr() as *const _;
            esp_idf_sys::esp_pthread_set_cfg(&cfg)
        };
        if ret != esp_idf_sys::ESP_OK as i32 {
            return Err(io::Error::other(format!(
                "esp_pthread_set_cfg({}) failed: {ret}",
                self.label()
            )));
        }

        log::info!(
            "Task: '{}' on {:?} core, priority {}, {} KB stack",
            self.label(),
            self.core,
            self.priority,
            self.stack_kb
        );
        std::thread::Builder::new().name(self.label().into()).spawn(f)
    }

    /// Host build: no core affinity or priority.
    #[cfg(not(target_os = "espidf"))]
    pub fn spawn(&self, f: impl FnOnce() + Send + 'static) -> io::Result<JoinHandle<()>> {
        self.check()?;
        log::info!("Task: '{}' (sim, {} KB stack)", self.label(), self.stack_kb);
        std::thread::Builder::new()
            .name(self.label().into())
            .stack_size(self.stack_kb * 1024)
            .spawn(f)
    }
}
