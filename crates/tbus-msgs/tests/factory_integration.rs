//! ---
//! tbus_section: "02-messaging-data-model"
//! tbus_subsection: "module"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Runtime message registry, dynamic messages and text format."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
use tbus_msgs::builtin::names;
use tbus_msgs::{
    FactoryError, FieldKind, MessageDescriptor, MessageFactory, TextErrorReason, Value,
};

#[test]
fn every_builtin_type_resolves_through_its_alias() {
    let factory = MessageFactory::builtin();
    for canonical in factory.type_names() {
        let alias = canonical.replacen("tbus.msgs.", "tbus_msgs.", 1);
        let message = factory.new_message(&alias, None).expect("alias resolves");
        assert_eq!(message.type_name(), canonical);
    }
}

#[test]
fn payload_round_trips_through_debug_string() {
    let factory = MessageFactory::builtin();
    let payload = "linear { x: 0.5 } angular { z: -1.25 }";
    let twist = factory.new_message(names::TWIST, Some(payload)).expect("twist");
    let rendered = twist.debug_string();
    assert_eq!(rendered, "linear {\n  x: 0.5\n}\nangular {\n  z: -1.25\n}\n");

    let reparsed = factory
        .new_message(names::TWIST, Some(rendered.as_str()))
        .expect("debug string is valid text format");
    assert_eq!(reparsed, twist);
}

#[test]
fn string_payload_with_escapes_renders_escaped() {
    let message = MessageFactory::builtin()
        .new_message("tbus_msgs.StringMsg", Some(r#"data: "line\nnext \"q\"""#))
        .expect("string");
    assert_eq!(message.get("data"), Some(&Value::from("line\nnext \"q\"")));
    assert_eq!(message.debug_string(), "data: \"line\\nnext \\\"q\\\"\"\n");
}

#[test]
fn error_positions_point_at_offending_token() {
    let err = MessageFactory::builtin()
        .new_message(names::POSE, Some("name: 'a'\nposition {\n  x: 1\n  w: 2\n}"))
        .expect_err("quaternion field on vector");
    let FactoryError::InvalidPayload { type_name, source } = err else {
        panic!("expected invalid payload");
    };
    assert_eq!(type_name, names::POSE);
    assert_eq!((source.line, source.column), (4, 3));
    assert!(matches!(source.reason, TextErrorReason::Field(_)));
    assert_eq!(source.to_string().split(':').next(), Some("4"));
}

#[test]
fn custom_types_nest_builtin_ones() {
    let mut factory = MessageFactory::with_builtin_types();
    let vector = factory.resolve(names::VECTOR3D).cloned().expect("vector");
    let waypoint = MessageDescriptor::builder("demo.Waypoint")
        .field("label", FieldKind::String)
        .message_field("target", &vector)
        .field("dwell_ms", FieldKind::UInt32)
        .build()
        .expect("waypoint");
    factory.register(waypoint).expect("register");

    let message = factory
        .new_message("demo.Waypoint", Some("label: 'dock'; target: { x: 3 }; dwell_ms: 0x10"))
        .expect("waypoint message");
    assert_eq!(
        message.debug_string(),
        "label: \"dock\"\ntarget {\n  x: 3\n}\ndwell_ms: 16\n"
    );
    assert!(!MessageFactory::builtin().contains("demo.Waypoint"));
}

#[test]
fn encoded_messages_decode_to_equal_values() {
    let factory = MessageFactory::builtin();
    let original = factory
        .new_message(names::HEADER, Some("stamp { sec: 1700000000 nsec: 5 }"))
        .expect("header");
    let bytes = original.encode();
    let json: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
    assert_eq!(json["type"], names::HEADER);
    let decoded = factory.decode(names::HEADER, &bytes).expect("decode");
    assert_eq!(decoded, original);
}
