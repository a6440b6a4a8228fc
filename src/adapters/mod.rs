//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements         | Connects to                  |
//! |-----------------|--------------------|------------------------------|
//! | `command_queue` | CommandPort        | stdin / mpsc producers       |
//! | `config_file`   | ConfigPort         | JSON config file             |
//! | `fs_storage`    | StoragePort        | `<base>/data` directory tree |
//! | `mem_storage`   | StoragePort        | in-memory map                |
//! | `host_id`       | -                  | OS hostname                  |
//! | `log_sink`      | EventSink          | `log` facade                 |
//! | `lpd433`        | ActuationSink      | RF sender program            |
//! | `state_store`   | StatePort          | any StoragePort              |
//! | `time`          | ClockPort          | system wall clock            |
//! | `trigger_store` | TriggerStorePort   | any StoragePort              |

pub mod command_queue;
pub mod config_file;
pub mod fs_storage;
pub mod host_id;
pub mod log_sink;
pub mod lpd433;
pub mod mem_storage;
pub mod state_store;
pub mod time;
pub mod trigger_store;
