//! PIX query (IHE ITI-9) from the consumer side.

use pacs_core::{IdWithIssuer, IdentitySet, ParseIdError};
use pacs_hl7::{
    Hl7Application, Hl7ApplicationCache, Hl7Device, Hl7Message, Hl7Segment, IdentityExchange,
    TransportError,
};
use time::macros::format_description;
use time::OffsetDateTime;

use crate::config::PixEndpoints;
use crate::error::PixError;

/// Resolves patient identifiers against a remote PIX manager.
///
/// Holds no per-query state; one resolver can serve concurrent callers.
pub struct PixResolver<X, C> {
    device: Hl7Device,
    cache: C,
    exchange: X,
}

impl<X, C> PixResolver<X, C>
where
    X: IdentityExchange,
    C: Hl7ApplicationCache,
{
    /// `device` holds the local consumer applications, `cache` resolves the
    /// remote manager, `exchange` carries the messages.
    pub fn new(device: Hl7Device, cache: C, exchange: X) -> Self {
        PixResolver {
            device,
            cache,
            exchange,
        }
    }

    pub fn exchange(&self) -> &X {
        &self.exchange
    }

    /// Resolve `local` into the queried identifier followed by its aliases.
    ///
    /// - no identifier: empty set
    /// - endpoints not configured, wildcard id, or no issuer: `{ local }`
    ///   without contacting the manager
    /// - any configuration, transport or message failure: `{ local }`, logged
    ///
    /// Exactly one request is sent per call; there are no retries.
    pub async fn resolve(
        &self,
        local: Option<&IdWithIssuer>,
        endpoints: &PixEndpoints,
    ) -> IdentitySet {
        let Some(pid) = local else {
            return IdentitySet::empty();
        };
        let Some((consumer, manager)) = endpoints.applications() else {
            return IdentitySet::single(pid.clone());
        };
        if pid.contains_wildcard() || pid.issuer.is_none() {
            return IdentitySet::single(pid.clone());
        }

        match self.query(pid, consumer, manager).await {
            Ok(aliases) => {
                tracing::debug!(pid = %pid, aliases = aliases.len(), "PIX query answered");
                IdentitySet::with_aliases(pid.clone(), aliases)
            }
            Err(e) => {
                tracing::info!(pid = %pid, error = %e, "PIX Query failed");
                IdentitySet::single(pid.clone())
            }
        }
    }

    async fn query(
        &self,
        pid: &IdWithIssuer,
        consumer: &str,
        manager: &str,
    ) -> Result<Vec<IdWithIssuer>, PixError> {
        let consumer_app = self.device.require_application(consumer)?;
        let manager_app = self.cache.find_application(manager).await?;
        let charset = consumer_app.default_charset();

        let mut qbp = Hl7Message::pix_query(&pid.to_string(), &control_id(), &timestamp());
        qbp.set_sending_application_with_facility(consumer);
        qbp.set_receiving_application_with_facility(&manager_app.name);
        qbp.set_charset(charset);
        let request = qbp.to_bytes(charset)?;

        let response = self.exchange_once(consumer_app, &manager_app, &request).await?;
        let rsp = Hl7Message::parse(&response, charset)?;
        rsp.check_accepted()?;
        Ok(parse_aliases(&rsp)?)
    }

    /// Connect, send one request, read one response. The connection is
    /// closed before returning, whatever the outcome.
    async fn exchange_once(
        &self,
        local: &Hl7Application,
        remote: &Hl7Application,
        request: &[u8],
    ) -> Result<Vec<u8>, TransportError> {
        let mut conn = self.exchange.connect(local, remote).await?;
        let result = self.send_and_receive(&mut conn, request).await;
        self.exchange.close(conn).await;
        result
    }

    async fn send_and_receive(
        &self,
        conn: &mut X::Connection,
        request: &[u8],
    ) -> Result<Vec<u8>, TransportError> {
        self.exchange.send(conn, request).await?;
        self.exchange.receive(conn).await
    }
}

/// Identifiers listed in PID-3 of a PIX response, in response order.
///
/// Repetitions are split on the separator declared in the response's MSH-2.
/// A response without PID (no match) yields no aliases; empty repetitions
/// are skipped.
pub fn parse_aliases(rsp: &Hl7Message) -> Result<Vec<IdWithIssuer>, ParseIdError> {
    let Some(pid) = rsp.segment("PID") else {
        return Ok(Vec::new());
    };
    Hl7Segment::split(pid.field_or(3, ""), rsp.delimiters().repetition)
        .into_iter()
        .filter(|cx| !cx.is_empty())
        .map(IdWithIssuer::parse_cx)
        .collect()
}

fn control_id() -> String {
    format!("{:010}", rand::random::<u32>())
}

fn timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(format_description!(
            "[year][month][day][hour][minute][second]"
        ))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pacs_core::Issuer;

    fn rsp(pid3: &str) -> Hl7Message {
        Hl7Message::parse_str(&format!(
            "MSH|^~\\&|PIXMGR|HIE|||||RSP^K23|R1|P|2.5\rMSA|AA|Q1\rPID|||{}\r",
            pid3
        ))
        .unwrap()
    }

    #[test]
    fn aliases_in_response_order() {
        let aliases = parse_aliases(&rsp("A2^^^IssuerX~A3")).unwrap();
        assert_eq!(
            aliases,
            vec![
                IdWithIssuer::new("A2", Issuer::local("IssuerX")),
                IdWithIssuer::unscoped("A3"),
            ]
        );
    }

    #[test]
    fn missing_pid_segment_means_no_aliases() {
        let msg =
            Hl7Message::parse_str("MSH|^~\\&|PIXMGR|HIE|||||RSP^K23|R1|P|2.5\rQAK|Q1|NF\r")
                .unwrap();
        assert!(parse_aliases(&msg).unwrap().is_empty());
    }

    #[test]
    fn empty_repetitions_skipped() {
        let aliases = parse_aliases(&rsp("~A2^^^X~~")).unwrap();
        assert_eq!(aliases, vec![IdWithIssuer::new("A2", Issuer::local("X"))]);
        assert!(parse_aliases(&rsp("")).unwrap().is_empty());
    }

    #[test]
    fn alias_without_id_is_error() {
        assert!(parse_aliases(&rsp("A2~^^^X")).is_err());
    }

    #[test]
    fn control_id_is_numeric() {
        let id = control_id();
        assert_eq!(id.len(), 10);
        assert!(id.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn timestamp_has_seconds_precision() {
        let ts = timestamp();
        assert_eq!(ts.len(), 14);
        assert!(ts.chars().all(|c| c.is_ascii_digit()));
    }
}
