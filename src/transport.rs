use std::net::SocketAddr;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use hickory_proto::op::Message;
use tokio::net::UdpSocket;

use crate::dns::{parse_response, QueryDescriptor};
use crate::error::ExchangeError;

/// A nameserver endpoint as configured, normalized to `host:port`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameserverTarget {
	pub address: String,
}

/// A decoded response and the time it took to arrive.
#[derive(Debug, Clone)]
pub struct Exchanged {
	pub response: Message,
	pub rtt: Duration,
}

/// A failed exchange and how long the attempt ran before giving up.
#[derive(Debug, Clone)]
pub struct ExchangeFailure {
	pub error: ExchangeError,
	pub elapsed: Duration,
}

/// How a prober talks to its nameserver.
#[async_trait]
pub trait Exchanger: Send + Sync + 'static {
	/// Send the query once and wait at most `timeout` for the matching response.
	///
	/// The endpoint is looked up on every call; a failed lookup is an error
	/// of this attempt only.
	async fn exchange(
		&self,
		target: &NameserverTarget,
		query: &QueryDescriptor,
		timeout: Duration,
	) -> Result<Exchanged, ExchangeFailure>;
}

/// Plain DNS over UDP, one socket per exchange.
#[derive(Debug, Clone, Default)]
pub struct UdpExchanger;

#[async_trait]
impl Exchanger for UdpExchanger {
	async fn exchange(
		&self,
		target: &NameserverTarget,
		query: &QueryDescriptor,
		timeout: Duration,
	) -> Result<Exchanged, ExchangeFailure> {
		let start = Instant::now();
		let result = match lookup(target, timeout).await {
			Ok(server) => send_udp_query(server, query, timeout, start).await,
			Err(e) => Err(e),
		};
		result.map_err(|error| ExchangeFailure {
			error,
			elapsed: start.elapsed(),
		})
	}
}

/// Resolve `host:port` to its first address, bounded by the query timeout.
async fn lookup(target: &NameserverTarget, timeout: Duration) -> Result<SocketAddr, ExchangeError> {
	let lookup_error = |reason: String| ExchangeError::Lookup {
		address: target.address.clone(),
		reason,
	};
	let mut addrs = tokio::time::timeout(timeout, tokio::net::lookup_host(target.address.as_str()))
		.await
		.map_err(|_| ExchangeError::Timeout(timeout))?
		.map_err(|e| lookup_error(e.to_string()))?;
	addrs
		.next()
		.ok_or_else(|| lookup_error("no addresses".to_string()))
}

/// Send a single DNS query over UDP and measure latency.
///
/// Creates a dedicated socket per query so stale answers to an earlier,
/// timed-out attempt can never be mistaken for the current one.
async fn send_udp_query(
	server: SocketAddr,
	query: &QueryDescriptor,
	timeout: Duration,
	start: Instant,
) -> Result<Exchanged, ExchangeError> {
	let txid: u16 = rand::random();
	let query_bytes = query.to_bytes(txid)?;

	let bind_addr = if server.is_ipv4() {
		"0.0.0.0:0"
	} else {
		"[::]:0"
	};
	let socket = UdpSocket::bind(bind_addr).await?;
	socket.connect(server).await?;

	let start_send = Instant::now();
	socket.send(&query_bytes).await?;

	// Use 4096-byte buffer to handle EDNS-extended responses
	let mut buf = vec![0u8; 4096];
	loop {
		let elapsed = start.elapsed();
		if elapsed >= timeout {
			return Err(ExchangeError::Timeout(timeout));
		}
		let remaining = timeout - elapsed;

		match tokio::time::timeout(remaining, socket.recv(&mut buf)).await {
			Ok(Ok(len)) => match parse_response(&buf[..len], txid) {
				Ok(response) => {
					return Ok(Exchanged {
						response,
						rtt: start_send.elapsed(),
					});
				}
				Err(e) => {
					// Not our answer; keep listening within the same deadline
					tracing::debug!(%server, "ignoring datagram: {}", e);
				}
			},
			Ok(Err(e)) => return Err(e.into()),
			Err(_) => return Err(ExchangeError::Timeout(timeout)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use hickory_proto::op::{MessageType, ResponseCode};
	use hickory_proto::rr::rdata::A;
	use hickory_proto::rr::{RData, Record};
	use tokio::task::JoinHandle;

	fn target(addr: SocketAddr) -> NameserverTarget {
		NameserverTarget {
			address: addr.to_string(),
		}
	}

	/// Loopback nameserver answering every query with one A record and `rcode`.
	async fn spawn_responder(rcode: ResponseCode) -> (SocketAddr, JoinHandle<()>) {
		let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
		let addr = socket.local_addr().unwrap();
		let handle = tokio::spawn(async move {
			let mut buf = vec![0u8; 512];
			loop {
				let Ok((len, peer)) = socket.recv_from(&mut buf).await else {
					break;
				};
				let Ok(mut message) = Message::from_vec(&buf[..len]) else {
					continue;
				};
				message.set_message_type(MessageType::Response);
				message.set_response_code(rcode);
				if rcode == ResponseCode::NoError {
					let name = message.queries()[0].name().clone();
					message.add_answer(Record::from_rdata(name, 60, RData::A(A::new(192, 0, 2, 1))));
				}
				let bytes = message.to_vec().unwrap();
				let _ = socket.send_to(&bytes, peer).await;
			}
		});
		(addr, handle)
	}

	#[tokio::test]
	async fn test_udp_exchange_success() {
		let (addr, server) = spawn_responder(ResponseCode::NoError).await;
		let query = QueryDescriptor::new("example.com", "A", true).unwrap();

		let exchanged = UdpExchanger
			.exchange(&target(addr), &query, Duration::from_secs(2))
			.await
			.unwrap();
		assert_eq!(exchanged.response.response_code(), ResponseCode::NoError);
		assert_eq!(exchanged.response.answers().len(), 1);
		assert!(exchanged.rtt < Duration::from_secs(2));
		server.abort();
	}

	#[tokio::test]
	async fn test_udp_exchange_bad_rcode_is_still_a_response() {
		let (addr, server) = spawn_responder(ResponseCode::ServFail).await;
		let query = QueryDescriptor::new("example.com", "A", true).unwrap();

		let exchanged = UdpExchanger
			.exchange(&target(addr), &query, Duration::from_secs(2))
			.await
			.unwrap();
		assert_eq!(exchanged.response.response_code(), ResponseCode::ServFail);
		server.abort();
	}

	#[tokio::test]
	async fn test_udp_exchange_timeout() {
		// Bound but silent socket
		let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
		let addr = silent.local_addr().unwrap();
		let query = QueryDescriptor::new("example.com", "A", true).unwrap();

		let failure = UdpExchanger
			.exchange(&target(addr), &query, Duration::from_millis(50))
			.await
			.unwrap_err();
		assert_eq!(failure.error, ExchangeError::Timeout(Duration::from_millis(50)));
		assert!(failure.elapsed >= Duration::from_millis(50));
	}

	#[tokio::test]
	async fn test_lookup_literal_address() {
		let addr = lookup(&target("127.0.0.1:5353".parse().unwrap()), Duration::from_secs(1))
			.await
			.unwrap();
		assert_eq!(addr, "127.0.0.1:5353".parse::<SocketAddr>().unwrap());
	}

	#[tokio::test]
	async fn test_failed_lookup_is_an_exchange_error() {
		let unresolvable = NameserverTarget {
			address: "no-port-here".to_string(),
		};
		let query = QueryDescriptor::new("example.com", "A", true).unwrap();

		let failure = UdpExchanger
			.exchange(&unresolvable, &query, Duration::from_secs(2))
			.await
			.unwrap_err();
		assert!(matches!(
			failure.error,
			ExchangeError::Lookup { ref address, .. } if address == "no-port-here"
		));
		assert!(failure.error.to_string().starts_with("lookup no-port-here: "));
		// The same target fails again on the next attempt instead of being pinned
		assert!(UdpExchanger
			.exchange(&unresolvable, &query, Duration::from_secs(2))
			.await
			.is_err());
	}
}
