use std::fmt;

use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

const TARGET_WIDTH: usize = 25;
const LEVEL_WIDTH: usize = 8;

/// Event format producing `timestamp target level message`.
///
/// The target stands in for a logger name and is padded so that levels line
/// up across modules.
#[derive(Debug, Clone)]
pub(super) struct LineFormat<T> {
    timer: T,
}

impl<T> LineFormat<T> {
    pub(super) const fn new(timer: T) -> Self {
        Self { timer }
    }
}

impl<S, N, T> FormatEvent<S, N> for LineFormat<T>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
    T: FormatTime,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        self.timer.format_time(&mut writer)?;
        let metadata = event.metadata();
        write!(
            writer,
            " {:<TARGET_WIDTH$} {:<LEVEL_WIDTH$} ",
            metadata.target(),
            metadata.level().as_str()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
