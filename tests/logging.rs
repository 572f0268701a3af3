//! Structured logging integration tests.
//!
//! A capture layer records every event so the tests can check that the
//! interesting transitions (degraded generation, fallback, mount/unmount)
//! are reported with their fields.

use std::sync::{Arc, Mutex};

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

use pulsefield::cpu::Headless;
use pulsefield::geometry::generate_points;
use pulsefield::{CpuRenderer, FieldConfig, Scene, VolumeShape};

// ============================================================================
// Test Infrastructure
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: Level,
    message: String,
    fields: Vec<(String, String)>,
}

impl CapturedEvent {
    fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct FieldVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        let value = format!("{value:?}");
        if field.name() == "message" {
            self.message = value;
        } else {
            self.fields.push((field.name().to_string(), value));
        }
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.fields.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.fields.push((field.name().to_string(), value.to_string()));
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for EventCapture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor {
            message: String::new(),
            fields: Vec::new(),
        };
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

/// Run `f` with a capturing subscriber installed on this thread.
fn capture<F: FnOnce()>(f: F) -> Vec<CapturedEvent> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(EventCapture {
        events: events.clone(),
    });
    tracing::subscriber::with_default(subscriber, f);
    let captured = events.lock().unwrap().clone();
    captured
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn exhausted_generator_budget_is_warned_once() {
    // Every candidate sits below the floor and the floor keeps nothing, so
    // shaping can never accept a point.
    let shape = VolumeShape {
        floor_y: 10.0,
        floor_keep: 0.0,
        ..Default::default()
    };
    let events = capture(|| {
        let cloud = generate_points(50, &shape, &mut SmallRng::seed_from_u64(1));
        assert_eq!(cloud.len(), 50);
    });

    let warnings: Vec<_> = events.iter().filter(|e| e.level == Level::WARN).collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("attempt budget"));
    assert_eq!(warnings[0].field("accepted"), Some("0"));
    assert_eq!(warnings[0].field("requested"), Some("50"));
}

#[test]
fn default_shape_generates_without_warnings() {
    let events = capture(|| {
        generate_points(2_000, &VolumeShape::default(), &mut SmallRng::seed_from_u64(3));
    });
    assert!(events.iter().all(|e| e.level != Level::WARN));
}

#[test]
fn empty_target_logs_fallback() {
    let events = capture(|| {
        let mut scene: Scene<CpuRenderer> = Scene::new(500, FieldConfig::default());
        assert!(scene.mount(&Headless::new(0, 0)).is_err());
    });

    let warning = events
        .iter()
        .find(|e| e.level == Level::WARN)
        .expect("fallback warning");
    assert!(warning.message.contains("placeholder"));
    assert!(warning.field("error").is_some());
}

#[test]
fn mount_and_unmount_are_logged() {
    let events = capture(|| {
        let mut scene: Scene<CpuRenderer> =
            Scene::new(800, FieldConfig::default()).with_seed(9);
        scene.mount(&Headless::new(32, 16)).unwrap();
        scene.unmount();
        scene.unmount();
    });

    let info: Vec<_> = events.iter().filter(|e| e.level == Level::INFO).collect();
    let mounted = info
        .iter()
        .find(|e| e.message == "scene mounted")
        .expect("mount event");
    assert_eq!(mounted.field("points"), Some("800"));
    assert_eq!(mounted.field("width"), Some("32"));
    assert_eq!(
        info.iter().filter(|e| e.message == "scene unmounted").count(),
        1
    );
}
