//! ---
//! tbus_section: "07-testing-qa"
//! tbus_subsection: "integration-tests"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Workspace-level integration suites."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
use std::io::Write;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tbus_commands::{CapturedOutput, Console, Harness, HarnessSettings};
use tbus_common::{CliConfig, ShutdownToken};
use tbus_msgs::builtin::names;
use tbus_msgs::{DynamicMessage, MessageFactory};
use tbus_transport::{InMemoryBus, Node};

fn harness_for(bus: &InMemoryBus, settings: HarnessSettings) -> (Harness, CapturedOutput) {
    let (console, output) = Console::captured();
    let harness = Harness::new(
        Arc::new(bus.connector()),
        Arc::new(MessageFactory::with_builtin_types()),
    )
    .with_console(console)
    .with_settings(settings);
    (harness, output)
}

#[test]
fn configured_grace_drives_publish_delay() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(file, "[publish]\ngrace_period_ms = 150")?;
    let loaded = CliConfig::load_from(Some(file.path()), None, &[] as &[&str])?;
    let settings = HarnessSettings::from(&loaded.config.publish);
    assert_eq!(settings.publish_grace, Duration::from_millis(150));

    let bus = InMemoryBus::new();
    let (harness, output) = harness_for(&bus, settings);
    let started = Instant::now();
    harness.topic_pub(Some("/cfg"), Some("tbus_msgs.Empty"), Some(""));
    assert!(started.elapsed() >= Duration::from_millis(150));
    assert_eq!(output.stderr(), "");
    Ok(())
}

#[test]
fn pose_published_through_alias_is_echoed_in_text_format() {
    let bus = InMemoryBus::new();
    let settings = HarnessSettings {
        publish_grace: Duration::from_millis(50),
    };
    let (echo, echoed) = harness_for(&bus, settings.clone());
    let (publish, _) = harness_for(&bus, settings);

    let listener = thread::spawn(move || echo.topic_echo(Some("/pose"), 0.6, &ShutdownToken::new()));
    thread::sleep(Duration::from_millis(100));
    publish.topic_pub(
        Some("/pose"),
        Some("tbus_msgs.Pose"),
        Some("name: 'arm' position < x: 1.5 > orientation { w: 1 }"),
    );
    listener.join().expect("echo thread");

    assert_eq!(
        echoed.stdout(),
        "name: \"arm\"\nposition {\n  x: 1.5\n}\norientation {\n  w: 1\n}\n\n"
    );
}

#[test]
fn one_request_reaches_exactly_one_of_several_providers() {
    let bus = InMemoryBus::new();
    let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let providers: Vec<_> = (0..2)
        .map(|_| {
            let node = bus.node();
            let calls = Arc::clone(&calls);
            node.advertise_service(
                "/count",
                names::EMPTY,
                names::UINT64,
                move |_: &DynamicMessage, rep: &mut DynamicMessage| {
                    let n = calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
                    rep.set("data", n as u64).is_ok()
                },
            )
            .expect("service");
            node
        })
        .collect();

    let (harness, output) = harness_for(&bus, HarnessSettings::default());
    harness.service_info(Some("/count"));
    harness.service_req(
        Some("/count"),
        Some("tbus_msgs.Empty"),
        Some("tbus_msgs.UInt64"),
        Some(1000),
        Some(""),
    );

    let lines: Vec<String> = output.stdout().lines().map(str::to_owned).collect();
    assert_eq!(lines.len(), 5, "{lines:?}");
    assert!(lines[1..3]
        .iter()
        .all(|line| line.ends_with("tbus.msgs.Empty, tbus.msgs.UInt64")));
    assert_eq!(lines[3], "data: 1");
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    drop(providers);
}

#[test]
fn late_provider_is_found_within_timeout() {
    let bus = InMemoryBus::new();
    let server_bus = bus.clone();
    let server = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        let node = server_bus.node();
        node.advertise_service("/late", names::INT32, names::STRING_MSG, |req, rep| {
            let value = req.get("data").and_then(|v| v.as_i64()).unwrap_or_default();
            rep.set("data", value.to_string()).is_ok()
        })
        .expect("service");
        thread::sleep(Duration::from_millis(500));
    });

    let (harness, output) = harness_for(&bus, HarnessSettings::default());
    harness.service_req(
        Some("/late"),
        Some("tbus.msgs.Int32"),
        Some("tbus.msgs.StringMsg"),
        Some(400),
        Some("data: 7"),
    );
    server.join().expect("server thread");
    assert_eq!(output.stdout(), "data: \"7\"\n\n");
}
