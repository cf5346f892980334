//! ---
//! tbus_section: "05-command-harness"
//! tbus_subsection: "module"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Discovery, publish, echo and request commands over a messaging node."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
//! One-shot commands that turn asynchronous messaging into bounded,
//! scriptable invocations.
//!
//! Each [`Harness`] method validates its arguments, builds the messages it
//! needs, connects exactly one node and reports the outcome as text on the
//! harness [`Console`]. Methods never return errors: failures become a single
//! diagnostic line on stderr, the way an operator would read them.

pub mod console;
mod discovery;
mod echo;
pub mod error;
pub mod harness;
mod publish;
mod request;
pub mod sleeper;

pub use console::{CapturedOutput, Console};
pub use echo::runs_indefinitely;
pub use error::{CommandError, MissingArgument};
pub use harness::{Harness, HarnessSettings};
pub use sleeper::{Sleeper, ThreadSleeper};
