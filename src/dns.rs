use std::str::FromStr;

use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{Name, RecordType};

use crate::error::{ConfigError, ExchangeError};

/// The single query every prober sends, built once and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDescriptor {
	name: Name,
	record_type: RecordType,
	recursion_desired: bool,
}

impl QueryDescriptor {
	/// Build a descriptor from a record name and a type keyword such as "aaaa".
	///
	/// The name is always treated as fully qualified.
	pub fn new(
		name: &str,
		query_type: &str,
		recursion_desired: bool,
	) -> Result<Self, ConfigError> {
		let record_type = parse_query_type(query_type)?;

		let trimmed = name.trim();
		if trimmed.is_empty() {
			return Err(ConfigError::MissingName);
		}
		let mut name = Name::from_ascii(trimmed).map_err(|e| ConfigError::InvalidName {
			name: trimmed.to_string(),
			reason: e.to_string(),
		})?;
		name.set_fqdn(true);

		Ok(QueryDescriptor {
			name,
			record_type,
			recursion_desired,
		})
	}

	pub fn name(&self) -> &Name {
		&self.name
	}

	pub fn record_type(&self) -> RecordType {
		self.record_type
	}

	pub fn recursion_desired(&self) -> bool {
		self.recursion_desired
	}

	/// Build the query message carrying the given transaction id.
	pub fn to_message(&self, txid: u16) -> Message {
		let mut message = Message::new();
		message.set_id(txid);
		message.set_message_type(MessageType::Query);
		message.set_op_code(OpCode::Query);
		message.set_recursion_desired(self.recursion_desired);
		message.add_query(Query::query(self.name.clone(), self.record_type));
		message
	}

	/// Serialize the query with the given transaction id.
	pub fn to_bytes(&self, txid: u16) -> Result<Vec<u8>, ExchangeError> {
		self.to_message(txid)
			.to_vec()
			.map_err(|e| ExchangeError::Malformed(e.to_string()))
	}
}

/// Map a type keyword to a record type, ignoring case.
pub fn parse_query_type(keyword: &str) -> Result<RecordType, ConfigError> {
	let upper = keyword.trim().to_ascii_uppercase();
	match RecordType::from_str(&upper) {
		Ok(RecordType::Unknown(_)) | Err(_) => {
			Err(ConfigError::InvalidQueryType(keyword.to_string()))
		}
		Ok(record_type) => Ok(record_type),
	}
}

/// Parse a DNS response, validating the transaction ID.
///
/// Returns an error if the bytes do not decode, the txid does not match or
/// the message is not a response.
pub fn parse_response(bytes: &[u8], expected_txid: u16) -> Result<Message, ExchangeError> {
	let message = Message::from_vec(bytes)
		.map_err(|e| ExchangeError::Io(format!("failed to parse DNS response: {}", e)))?;

	if message.id() != expected_txid {
		return Err(ExchangeError::Io(format!(
			"txid mismatch: expected {}, got {}",
			expected_txid,
			message.id()
		)));
	}

	if message.message_type() != MessageType::Response {
		return Err(ExchangeError::Io("received a query instead of a response".to_string()));
	}

	Ok(message)
}

/// Mnemonic for a response code, e.g. "NXDOMAIN".
pub fn rcode_name(rcode: ResponseCode) -> String {
	match rcode {
		ResponseCode::NoError => "NOERROR".to_string(),
		ResponseCode::FormErr => "FORMERR".to_string(),
		ResponseCode::ServFail => "SERVFAIL".to_string(),
		ResponseCode::NXDomain => "NXDOMAIN".to_string(),
		ResponseCode::NotImp => "NOTIMP".to_string(),
		ResponseCode::Refused => "REFUSED".to_string(),
		ResponseCode::YXDomain => "YXDOMAIN".to_string(),
		ResponseCode::YXRRSet => "YXRRSET".to_string(),
		ResponseCode::NXRRSet => "NXRRSET".to_string(),
		ResponseCode::NotAuth => "NOTAUTH".to_string(),
		ResponseCode::NotZone => "NOTZONE".to_string(),
		other => format!("RCODE{}", u16::from(other)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_query_type_is_case_insensitive() {
		assert_eq!(parse_query_type("aaaa").unwrap(), RecordType::AAAA);
		assert_eq!(parse_query_type("Mx").unwrap(), RecordType::MX);
		assert_eq!(parse_query_type("SOA").unwrap(), RecordType::SOA);
		assert_eq!(parse_query_type(" txt ").unwrap(), RecordType::TXT);
	}

	#[test]
	fn test_unknown_query_type() {
		let err = parse_query_type("BOGUS").unwrap_err();
		assert_eq!(err, ConfigError::InvalidQueryType("BOGUS".to_string()));
		assert_eq!(err.to_string(), "Invalid query type \"BOGUS\"");
	}

	#[test]
	fn test_descriptor_is_fqdn() {
		let query = QueryDescriptor::new("example.com", "a", true).unwrap();
		assert!(query.name().is_fqdn());
		assert_eq!(query.name().to_ascii(), "example.com.");
		assert_eq!(query.record_type(), RecordType::A);
		assert!(query.recursion_desired());
	}

	#[test]
	fn test_descriptor_rejects_empty_name() {
		let err = QueryDescriptor::new("  ", "A", true).unwrap_err();
		assert_eq!(err, ConfigError::MissingName);
	}

	#[test]
	fn test_descriptor_rejects_bad_type_before_name() {
		let err = QueryDescriptor::new("example.com", "NOPE", true).unwrap_err();
		assert!(matches!(err, ConfigError::InvalidQueryType(_)));
	}

	#[test]
	fn test_to_message_sets_flags() {
		let query = QueryDescriptor::new("example.com", "NS", false).unwrap();
		let message = query.to_message(4242);
		assert_eq!(message.id(), 4242);
		assert_eq!(message.message_type(), MessageType::Query);
		assert!(!message.recursion_desired());
		assert_eq!(message.queries().len(), 1);
		assert_eq!(message.queries()[0].query_type(), RecordType::NS);
	}

	#[test]
	fn test_to_bytes_carries_txid() {
		let query = QueryDescriptor::new("example.com", "A", true).unwrap();
		let bytes = query.to_bytes(1234).unwrap();
		// DNS header is 12 bytes minimum
		assert!(bytes.len() >= 12);
		assert_eq!(bytes[0], (1234 >> 8) as u8);
		assert_eq!(bytes[1], (1234 & 0xff) as u8);
		// RD is the lowest bit of the third byte
		assert_eq!(bytes[2] & 0x01, 0x01);
	}

	#[test]
	fn test_parse_valid_response() {
		let query = QueryDescriptor::new("example.com", "A", true).unwrap();
		let mut response = query.to_message(9999);
		response.set_message_type(MessageType::Response);
		response.set_response_code(ResponseCode::NXDomain);
		let bytes = response.to_vec().unwrap();

		let parsed = parse_response(&bytes, 9999).unwrap();
		assert_eq!(parsed.response_code(), ResponseCode::NXDomain);
	}

	#[test]
	fn test_txid_mismatch() {
		let query = QueryDescriptor::new("example.com", "A", true).unwrap();
		let mut response = query.to_message(1111);
		response.set_message_type(MessageType::Response);
		let bytes = response.to_vec().unwrap();

		let err = parse_response(&bytes, 2222).unwrap_err();
		assert!(err.to_string().contains("txid mismatch"));
	}

	#[test]
	fn test_query_is_not_a_response() {
		let query = QueryDescriptor::new("example.com", "A", true).unwrap();
		let bytes = query.to_bytes(7).unwrap();
		assert!(parse_response(&bytes, 7).is_err());
	}

	#[test]
	fn test_truncated_buffer() {
		// Only 5 bytes -- too short for a valid DNS message
		let bytes = vec![0u8; 5];
		assert!(parse_response(&bytes, 0).is_err());
	}

	#[test]
	fn test_rcode_names() {
		assert_eq!(rcode_name(ResponseCode::NoError), "NOERROR");
		assert_eq!(rcode_name(ResponseCode::ServFail), "SERVFAIL");
		assert_eq!(rcode_name(ResponseCode::NXDomain), "NXDOMAIN");
		assert_eq!(rcode_name(ResponseCode::Refused), "REFUSED");
	}
}
