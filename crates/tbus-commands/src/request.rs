//! ---
//! tbus_section: "05-command-harness"
//! tbus_subsection: "module"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Discovery, publish, echo and request commands over a messaging node."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
use std::time::Duration;

use tbus_logging::{bus_debug, LogContext};
use tbus_transport::RequestOutcome;

use crate::error::MissingArgument;
use crate::harness::non_empty;
use crate::{CommandError, Harness};

impl Harness {
    /// Call `service` once and print the outcome.
    ///
    /// Success prints the response on stdout, a provider-reported failure
    /// prints `Service call failed` on stdout and a missing reply prints
    /// `Service call timed out` on stderr. Both messages are built before
    /// any node is created.
    pub fn service_req(
        &self,
        service: Option<&str>,
        req_type: Option<&str>,
        rep_type: Option<&str>,
        timeout_ms: Option<u64>,
        data: Option<&str>,
    ) {
        let mut ctx = LogContext::for_command("service-req");
        if let Some(service) = service {
            ctx = ctx.with_service(service);
        }
        let result = self.try_service_req(&ctx, service, req_type, rep_type, timeout_ms, data);
        self.report(&ctx, "service.request", result);
    }

    fn try_service_req(
        &self,
        ctx: &LogContext<'_>,
        service: Option<&str>,
        req_type: Option<&str>,
        rep_type: Option<&str>,
        timeout_ms: Option<u64>,
        data: Option<&str>,
    ) -> Result<(), CommandError> {
        let service = service.ok_or(CommandError::Missing(MissingArgument::ServiceName))?;
        let req_type = req_type.ok_or(CommandError::Missing(MissingArgument::RequestType))?;
        let rep_type = rep_type.ok_or(CommandError::Missing(MissingArgument::ResponseType))?;
        let timeout = timeout_ms
            .map(Duration::from_millis)
            .ok_or(CommandError::Missing(MissingArgument::Timeout))?;
        let data = data.ok_or(CommandError::Missing(MissingArgument::RequestData))?;
        let service = non_empty(Some(service)).ok_or(CommandError::InvalidService)?;

        let request = self
            .factory
            .new_message(req_type, Some(data))
            .map_err(|source| CommandError::CreateRequest {
                req_type: req_type.to_owned(),
                data: data.to_owned(),
                source,
            })?;
        let mut response = self
            .factory
            .new_message(rep_type, None)
            .map_err(|source| CommandError::CreateResponse {
                rep_type: rep_type.to_owned(),
                source,
            })?;

        let node = self.connect()?;
        let outcome = node.request(service, &request, timeout, &mut response);
        bus_debug!(
            context = ctx.clone().with_msg_type(request.type_name()),
            "request finished: {:?}",
            outcome
        );
        match outcome {
            RequestOutcome::Success => self.console.out_line(&response.debug_string()),
            RequestOutcome::Failure => self.console.out_line("Service call failed"),
            RequestOutcome::TimedOut => self.console.err_line("Service call timed out"),
        }
        Ok(())
    }
}
