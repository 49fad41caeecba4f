pub use crate::config::{Config, ConfigBuilder};
pub use crate::error::{Error, Result};
pub use crate::seq::{collectors, Collector, EvalMode, Seq, Stage, SummaryStats};
pub use crate::telemetry::{Metrics, MetricsSnapshot};

pub use crate::{init, init_with_config, shutdown};
