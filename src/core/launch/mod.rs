pub mod command;
pub mod driver;
pub mod natives;
pub mod options;
pub mod process;
pub mod worker;

pub use command::{format_command_for_logs, CommandBuilder, JavaCommandBuilder};
pub use driver::{Collaborators, DriverState, LaunchDriver, LaunchOutcome, LaunchRequest};
pub use options::{GraphicsQuality, LaunchOptions, MemoryMb};
pub use process::{DetachedSpawner, ProcessSpawner};
pub use worker::WorkerSlot;
