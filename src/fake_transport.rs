//! Scripted stand-in for the UDP transport, driven by tokio's paused clock.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use hickory_proto::op::{MessageType, ResponseCode};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{RData, Record};
use tokio::time::Instant;

use crate::dns::QueryDescriptor;
use crate::error::ExchangeError;
use crate::transport::{ExchangeFailure, Exchanged, Exchanger, NameserverTarget};

/// One scripted exchange result.
#[derive(Debug, Clone)]
pub enum Scripted {
	Answer { rtt_ms: u64, rcode: ResponseCode },
	Fail(ExchangeError),
}

/// Replays a script of results, then answers NOERROR after 1ms forever.
///
/// Targets named "unresolvable" fail every lookup; a target named "panics"
/// brings its worker task down.
#[derive(Debug, Default)]
pub struct FakeExchanger {
	script: Mutex<VecDeque<Scripted>>,
	calls: Mutex<Vec<Instant>>,
}

impl FakeExchanger {
	pub fn with_script(script: Vec<Scripted>) -> Self {
		FakeExchanger {
			script: Mutex::new(script.into()),
			calls: Mutex::new(Vec::new()),
		}
	}

	pub fn calls(&self) -> u64 {
		self.calls.lock().unwrap().len() as u64
	}

	pub fn call_times(&self) -> Vec<Instant> {
		self.calls.lock().unwrap().clone()
	}
}

#[async_trait]
impl Exchanger for FakeExchanger {
	async fn exchange(
		&self,
		target: &NameserverTarget,
		query: &QueryDescriptor,
		timeout: Duration,
	) -> Result<Exchanged, ExchangeFailure> {
		self.calls.lock().unwrap().push(Instant::now());
		match target.address.as_str() {
			"unresolvable" => {
				return Err(ExchangeFailure {
					error: ExchangeError::Lookup {
						address: target.address.clone(),
						reason: "no such host".to_string(),
					},
					elapsed: Duration::ZERO,
				});
			}
			"panics" => panic!("exchanger blew up"),
			_ => {}
		}
		let next = self.script.lock().unwrap().pop_front();
		let next = next.unwrap_or(Scripted::Answer {
			rtt_ms: 1,
			rcode: ResponseCode::NoError,
		});

		match next {
			Scripted::Answer { rtt_ms, rcode } => {
				let rtt = Duration::from_millis(rtt_ms);
				if rtt >= timeout {
					tokio::time::sleep(timeout).await;
					return Err(ExchangeFailure {
						error: ExchangeError::Timeout(timeout),
						elapsed: timeout,
					});
				}
				tokio::time::sleep(rtt).await;
				let mut response = query.to_message(0);
				response.set_message_type(MessageType::Response);
				response.set_response_code(rcode);
				if rcode == ResponseCode::NoError {
					response.add_answer(Record::from_rdata(
						query.name().clone(),
						300,
						RData::A(A::new(192, 0, 2, 53)),
					));
				}
				Ok(Exchanged { response, rtt })
			}
			Scripted::Fail(error) => Err(ExchangeFailure {
				error,
				elapsed: Duration::ZERO,
			}),
		}
	}
}
