//! `TracingSink` and observer instrumentation, checked with a capturing
//! `tracing-subscriber` layer.

use std::sync::{Arc, Mutex};

use propwatch::{Container, Observer, TracingSink};
use tracing::Subscriber;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Captured {
    message: String,
    target: String,
    level: tracing::Level,
    path: Option<String>,
}

#[derive(Default)]
struct TraceState {
    saw_observe_span: bool,
    events: Vec<Captured>,
}

struct TraceCapture {
    state: Arc<Mutex<TraceState>>,
}

impl<S> Layer<S> for TraceCapture
where
    S: Subscriber + for<'lookup> tracing_subscriber::registry::LookupSpan<'lookup>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::Id,
        _ctx: Context<'_, S>,
    ) {
        if attrs.metadata().name() == "observe" {
            self.state.lock().expect("trace lock").saw_observe_span = true;
        }
    }

    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        #[derive(Default)]
        struct Fields {
            message: Option<String>,
            path: Option<String>,
        }
        impl tracing::field::Visit for Fields {
            fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
                match field.name() {
                    "message" => self.message = Some(value.to_string()),
                    "path" => self.path = Some(value.to_string()),
                    _ => {}
                }
            }

            fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
                let rendered = format!("{value:?}").trim_matches('"').to_string();
                match field.name() {
                    "message" => self.message = Some(rendered),
                    "path" => self.path = Some(rendered),
                    _ => {}
                }
            }
        }

        let mut fields = Fields::default();
        event.record(&mut fields);
        let metadata = event.metadata();
        self.state.lock().expect("trace lock").events.push(Captured {
            message: fields.message.unwrap_or_default(),
            target: metadata.target().to_string(),
            level: *metadata.level(),
            path: fields.path,
        });
    }
}

fn capture<R>(f: impl FnOnce() -> R) -> (R, Arc<Mutex<TraceState>>) {
    let state = Arc::new(Mutex::new(TraceState::default()));
    let subscriber = tracing_subscriber::registry().with(TraceCapture {
        state: Arc::clone(&state),
    });
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, state)
}

#[test]
fn access_events_are_forwarded_with_path() {
    let ((), state) = capture(|| {
        let list = Container::list([1, 2]);
        Observer::new(TracingSink).observe(&list).expect("observe");
        let _ = list.get(1usize).expect("read");
        list.set(1usize, 5).expect("write");
    });

    let snapshot = state.lock().expect("trace lock");
    let access: Vec<&Captured> = snapshot
        .events
        .iter()
        .filter(|event| event.target == "propwatch::access")
        .collect();
    assert_eq!(access.len(), 2);
    assert_eq!(access[0].message, "entry.read");
    assert_eq!(access[0].level, tracing::Level::TRACE);
    assert_eq!(access[0].path.as_deref(), Some("$[1]"));
    assert_eq!(access[1].message, "entry.write");
    assert_eq!(access[1].level, tracing::Level::DEBUG);
}

#[test]
fn observe_pass_is_instrumented() {
    let ((), state) = capture(|| {
        let list = Container::list([1]);
        list.push(list.clone()).expect("push");
        Observer::new(TracingSink).observe(&list).expect("observe");
        list.remove(1usize).expect("break cycle");
    });

    let snapshot = state.lock().expect("trace lock");
    assert!(snapshot.saw_observe_span, "expected observe span");
    let messages: Vec<&str> = snapshot.events.iter().map(|e| e.message.as_str()).collect();
    assert!(messages.contains(&"observe.install"));
    assert!(messages.contains(&"observe.skip_cycle"));
    assert!(messages.contains(&"observe.done"));
}
