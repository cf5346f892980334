//! ---
//! tbus_section: "05-command-harness"
//! tbus_subsection: "module"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Discovery, publish, echo and request commands over a messaging node."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
use tbus_logging::{bus_debug, LogContext};

use crate::harness::non_empty;
use crate::{CommandError, Harness};

impl Harness {
    /// Print every known topic, one per line.
    pub fn topic_list(&self) {
        let ctx = LogContext::for_command("topic-list");
        let result = self.connect().map(|node| {
            for topic in node.topic_list() {
                self.console.out_line(&topic);
            }
        });
        self.report(&ctx, "topic.list", result);
    }

    /// Print the publishers of `topic`.
    pub fn topic_info(&self, topic: Option<&str>) {
        let ctx = LogContext::for_command("topic-info");
        let result = self.try_topic_info(&ctx, topic);
        self.report(&ctx, "topic.info", result);
    }

    fn try_topic_info(&self, ctx: &LogContext<'_>, topic: Option<&str>) -> Result<(), CommandError> {
        let topic = non_empty(topic).ok_or(CommandError::InvalidTopic)?;
        let node = self.connect()?;
        let publishers = node.topic_info(topic);
        bus_debug!(
            context = ctx.clone().with_topic(topic),
            "{} publisher(s) known",
            publishers.len()
        );
        if publishers.is_empty() {
            self.console
                .out_line(&format!("No publishers on topic [{}]", topic));
            return Ok(());
        }
        self.console.out_line("Publishers [Address, Message Type]:");
        for publisher in publishers {
            self.console
                .out_line(&format!("  {}, {}", publisher.address, publisher.msg_type));
        }
        Ok(())
    }

    /// Print every known service, one per line.
    pub fn service_list(&self) {
        let ctx = LogContext::for_command("service-list");
        let result = self.connect().map(|node| {
            for service in node.service_list() {
                self.console.out_line(&service);
            }
        });
        self.report(&ctx, "service.list", result);
    }

    /// Print the providers of `service`.
    pub fn service_info(&self, service: Option<&str>) {
        let ctx = LogContext::for_command("service-info");
        let result = self.try_service_info(service);
        self.report(&ctx, "service.info", result);
    }

    fn try_service_info(&self, service: Option<&str>) -> Result<(), CommandError> {
        let service = non_empty(service).ok_or(CommandError::InvalidService)?;
        let node = self.connect()?;
        let providers = node.service_info(service);
        if providers.is_empty() {
            self.console
                .out_line(&format!("No service providers on service [{}]", service));
            return Ok(());
        }
        self.console
            .out_line("Service providers [Address, Request Message Type, Response Message Type]:");
        for provider in providers {
            self.console.out_line(&format!(
                "  {}, {}, {}",
                provider.address, provider.req_type, provider.rep_type
            ));
        }
        Ok(())
    }
}
