// csvjob Daemon - Composition Root shared by the worker and the CLI

pub mod telemetry;
pub mod wiring;
