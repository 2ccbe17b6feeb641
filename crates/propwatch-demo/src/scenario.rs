//! The demo run: build a container, observe it, remove one entry, and
//! report what the accessors saw.

use std::io::Write;
use std::path::Path;
use std::rc::Rc;

use propwatch::{
    Container, ContainerKind, EventFormat, FanoutSink, Key, ObserveReport, Observer,
    RecordingSink, TracingSink, Value, WriterSink,
};
use serde_json::json;
use tracing::{debug, info};

use crate::cli::Cli;
use crate::error::{DemoError, Result};

/// The list every run observes unless `--input` names a file.
pub const REFERENCE_LIST: [i64; 10] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 0];

/// What a run observed and left behind.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub report: ObserveReport,
    /// JSON form of the removed value, if a removal ran.
    pub removed: Option<serde_json::Value>,
    pub reads: usize,
    pub writes: usize,
    /// The container after removal.
    pub snapshot: serde_json::Value,
}

impl Summary {
    fn to_json(&self) -> serde_json::Value {
        json!({
            "installed": self.report.installed.len(),
            "containers": self.report.containers,
            "removed": self.removed,
            "reads": self.reads,
            "writes": self.writes,
            "snapshot": self.snapshot,
        })
    }

    /// Append the summary after the event lines.
    pub fn write_to(&self, out: &mut impl Write, format: EventFormat) -> std::io::Result<()> {
        if format == EventFormat::Json {
            serde_json::to_writer(&mut *out, &self.to_json())?;
            return writeln!(out);
        }
        if let Some(removed) = &self.removed {
            writeln!(out, "removed: {removed}")?;
        }
        writeln!(out, "snapshot: {}", self.snapshot)?;
        writeln!(out, "reads: {} writes: {}", self.reads, self.writes)
    }
}

/// Load the root container: the reference list, or a JSON array/object.
pub fn load_root(input: Option<&Path>) -> Result<Container> {
    let Some(path) = input else {
        return Ok(Container::list(REFERENCE_LIST));
    };
    let text = std::fs::read_to_string(path)?;
    let document: serde_json::Value = serde_json::from_str(&text)?;
    Value::from_json(&document)
        .as_container()
        .cloned()
        .ok_or_else(|| {
            DemoError::invalid(format!(
                "{} must hold a JSON array or object",
                path.display()
            ))
        })
}

/// Interpret `--remove` against the root's kind. Without `--remove` the
/// first entry is removed; an empty root has nothing to remove.
pub fn removal_key(cli: &Cli, root: &Container) -> Result<Option<Key>> {
    if cli.no_remove {
        return Ok(None);
    }
    match (cli.remove.as_deref(), root.kind()) {
        (None, _) => Ok(root.keys().into_iter().next()),
        (Some(raw), ContainerKind::List) => raw
            .parse::<usize>()
            .map(|index| Some(Key::Index(index)))
            .map_err(|_| DemoError::invalid(format!("--remove {raw:?} is not a list index"))),
        (Some(raw), ContainerKind::Map) => Ok(Some(Key::Name(raw.to_owned()))),
    }
}

/// Run the scenario, writing events and the summary to `out`.
pub fn run<W: Write + 'static>(cli: &Cli, out: W) -> Result<Summary> {
    let root = load_root(cli.input.as_deref())?;
    let key = removal_key(cli, &root)?;

    let writer = Rc::new(WriterSink::new(out, cli.events.into()));
    let recorder = RecordingSink::new();
    let mut sink = FanoutSink::new().with(recorder.clone()).with(TracingSink);
    sink.push(writer.clone());

    let report = Observer::new(sink)
        .with_config(cli.observer_config())
        .observe(&root)?;
    info!(
        installed = report.installed.len(),
        containers = report.containers,
        cycles_skipped = report.cycles_skipped,
        "scenario.observed"
    );

    let removed = match key {
        Some(key) => {
            debug!(%key, policy = %root.removal_policy(), "scenario.remove");
            let removed = root.remove(&key).map_err(|source| DemoError::Remove {
                key: key.bare().to_string(),
                source,
            })?;
            Some(removed.to_json())
        }
        None => None,
    };

    let summary = Summary {
        report,
        removed,
        reads: recorder.reads(),
        writes: recorder.writes(),
        snapshot: root.snapshot(),
    };
    info!(reads = summary.reads, writes = summary.writes, "scenario.done");

    let failures = writer.failures();
    if failures > 0 {
        return Err(DemoError::EventOutput { failures });
    }
    let format = writer.format();
    writer.with_writer(|out| {
        summary.write_to(out, format)?;
        out.flush()
    })?;
    Ok(summary)
}
