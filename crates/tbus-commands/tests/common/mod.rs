//! ---
//! tbus_section: "05-command-harness"
//! tbus_subsection: "module"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Discovery, publish, echo and request commands over a messaging node."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
//! Recording doubles for the messaging node and the sleeper.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tbus_commands::{CapturedOutput, Console, Harness, Sleeper};
use tbus_msgs::{DynamicMessage, MessageFactory};
use tbus_transport::{
    Connector, MessageCallback, MessagePublisher, Node, Publisher, RequestOutcome,
    ServicePublisher, TransportError,
};

/// Ordered record of every collaborator call.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.0.lock().iter().any(|event| event.starts_with(prefix))
    }
}

/// What the stub node reports and how it reacts.
#[derive(Clone, Default)]
pub struct Script {
    pub topics: Vec<String>,
    pub publishers: Vec<MessagePublisher>,
    pub services: Vec<String>,
    pub providers: Vec<ServicePublisher>,
    pub refuse_connect: bool,
    pub refuse_advertise: bool,
    pub refuse_publish: bool,
    pub refuse_subscribe: bool,
    /// Outcome of every request; `None` means timed out.
    pub outcome: Option<RequestOutcome>,
    /// Text-format payload merged into the response on success.
    pub reply: Option<String>,
    /// `StringMsg` payloads delivered synchronously on subscribe.
    pub deliveries: Vec<String>,
}

pub struct StubConnector {
    script: Script,
    log: EventLog,
}

impl Connector for StubConnector {
    fn connect(&self) -> Result<Box<dyn Node>, TransportError> {
        self.log.push("connect");
        if self.script.refuse_connect {
            return Err(TransportError::Disconnected);
        }
        Ok(Box::new(StubNode {
            script: self.script.clone(),
            log: self.log.clone(),
        }))
    }
}

struct StubNode {
    script: Script,
    log: EventLog,
}

impl Node for StubNode {
    fn address(&self) -> &str {
        "stub://node"
    }

    fn topic_list(&self) -> Vec<String> {
        self.log.push("topic_list");
        self.script.topics.clone()
    }

    fn topic_info(&self, topic: &str) -> Vec<MessagePublisher> {
        self.log.push(format!("topic_info {topic}"));
        self.script.publishers.clone()
    }

    fn service_list(&self) -> Vec<String> {
        self.log.push("service_list");
        self.script.services.clone()
    }

    fn service_info(&self, service: &str) -> Vec<ServicePublisher> {
        self.log.push(format!("service_info {service}"));
        self.script.providers.clone()
    }

    fn advertise(&self, topic: &str, msg_type: &str) -> Result<Box<dyn Publisher>, TransportError> {
        self.log.push(format!("advertise {topic} {msg_type}"));
        if self.script.refuse_advertise {
            return Err(TransportError::InvalidTopic(topic.to_owned()));
        }
        Ok(Box::new(StubPublisher {
            topic: topic.to_owned(),
            msg_type: msg_type.to_owned(),
            refuse: self.script.refuse_publish,
            log: self.log.clone(),
        }))
    }

    fn subscribe(&self, topic: &str, callback: MessageCallback) -> Result<(), TransportError> {
        self.log.push(format!("subscribe {topic}"));
        if self.script.refuse_subscribe {
            return Err(TransportError::InvalidTopic(topic.to_owned()));
        }
        for payload in &self.script.deliveries {
            let message = MessageFactory::builtin()
                .new_message("tbus.msgs.StringMsg", Some(payload.as_str()))
                .expect("scripted delivery");
            callback(&message);
        }
        Ok(())
    }

    fn request(
        &self,
        service: &str,
        request: &DynamicMessage,
        timeout: Duration,
        response: &mut DynamicMessage,
    ) -> RequestOutcome {
        self.log.push(format!(
            "request {service} {} {} {}",
            request.type_name(),
            response.type_name(),
            timeout.as_millis()
        ));
        let outcome = self.script.outcome.unwrap_or(RequestOutcome::TimedOut);
        if outcome == RequestOutcome::Success {
            if let Some(reply) = &self.script.reply {
                response.merge_text(reply).expect("scripted reply");
            }
        }
        outcome
    }
}

impl Drop for StubNode {
    fn drop(&mut self) {
        self.log.push("drop node");
    }
}

struct StubPublisher {
    topic: String,
    msg_type: String,
    refuse: bool,
    log: EventLog,
}

impl Publisher for StubPublisher {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn msg_type(&self) -> &str {
        &self.msg_type
    }

    fn publish(&self, message: &DynamicMessage) -> Result<(), TransportError> {
        self.log
            .push(format!("publish {} {}", self.topic, message.debug_string().trim_end()));
        if self.refuse {
            return Err(TransportError::NotAdvertised(self.topic.clone()));
        }
        Ok(())
    }
}

/// Sleeper that records the requested duration instead of blocking.
pub struct RecordingSleeper {
    log: EventLog,
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.log.push(format!("sleep {}", duration.as_millis()));
    }
}

/// Harness wired to the stub node, a recording sleeper and captured output.
pub fn stub_harness(script: Script) -> (Harness, CapturedOutput, EventLog) {
    let log = EventLog::default();
    let (console, captured) = Console::captured();
    let connector = Arc::new(StubConnector {
        script,
        log: log.clone(),
    });
    let harness = Harness::new(connector, Arc::new(MessageFactory::with_builtin_types()))
        .with_console(console)
        .with_sleeper(Arc::new(RecordingSleeper { log: log.clone() }));
    (harness, captured, log)
}
