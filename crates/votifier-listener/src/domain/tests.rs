//! Tests for the protocol domain
//!
//! Covers sniffing, handshakes, and both decoders.

use super::*;
use crate::testing::{challenge, inner_payload, keys, signed_envelope, v1_block};

use base64::prelude::BASE64_STANDARD;
use base64::Engine;

const ISSUED: &str = "0123456789abcdef0123456789abcdef";

fn registry() -> TokenRegistry {
    TokenRegistry::new().with_token("default", "secret123")
}

// =============================================================================
// TEST GROUP 1: Protocol Sniffing
// =============================================================================

#[test]
fn test_detect_binary_magic() {
    assert_eq!(Framing::detect(*b"s:"), Framing::V2Binary);
}

#[test]
fn test_detect_json_line() {
    assert_eq!(Framing::detect(*b"{\""), Framing::V2Json);
    assert_eq!(Framing::detect([b'{', 0x00]), Framing::V2Json);
}

#[test]
fn test_detect_everything_else_is_v1() {
    assert_eq!(Framing::detect([0x00, 0x00]), Framing::V1Block);
    assert_eq!(Framing::detect(*b"s;"), Framing::V1Block);
    assert_eq!(Framing::detect(*b":s"), Framing::V1Block);
    assert_eq!(Framing::detect([0x9f, b'{']), Framing::V1Block);
    assert!(!Framing::V1Block.is_v2());
    assert!(Framing::V2Binary.is_v2());
}

#[test]
fn test_handshake_without_tokens_is_v1() {
    let line = handshake_line(&TokenRegistry::new(), &Challenge::generate());
    assert_eq!(line, "VOTIFIER 1\n");
}

#[test]
fn test_handshake_with_tokens_carries_challenge() {
    let c = challenge(ISSUED);
    let line = handshake_line(&registry(), &c);
    assert_eq!(line, format!("VOTIFIER 2 {}\n", ISSUED));
}

#[test]
fn test_handshake_offers_v2_without_default_token() {
    let tokens = TokenRegistry::new().with_token("minecraft", "abc");
    let line = handshake_line(&tokens, &challenge(ISSUED));
    assert!(line.starts_with("VOTIFIER 2 "));
}

// =============================================================================
// TEST GROUP 2: Challenges and Tokens
// =============================================================================

#[test]
fn test_challenge_is_32_hex_chars() {
    let c = Challenge::generate();
    assert_eq!(c.value().len(), CHALLENGE_HEX_LEN);
    assert!(c.value().chars().all(|ch| ch.is_ascii_hexdigit()));
}

#[test]
fn test_challenges_are_not_reused() {
    let a = Challenge::generate();
    let b = Challenge::generate();
    assert_ne!(a.value(), b.value());
    assert_ne!(a.connection_id(), b.connection_id());
}

#[test]
fn test_token_lookup_prefers_service_entry() {
    let tokens = registry().with_token("minecraft", "mc-secret");
    assert_eq!(tokens.resolve("minecraft"), Some("mc-secret"));
    assert_eq!(tokens.resolve("other"), Some("secret123"));
}

#[test]
fn test_token_lookup_without_default() {
    let tokens = TokenRegistry::new().with_token("minecraft", "mc-secret");
    assert_eq!(tokens.resolve("other"), None);
}

#[test]
fn test_token_registry_debug_hides_secrets() {
    let rendered = format!("{:?}", registry());
    assert!(rendered.contains("default"));
    assert!(!rendered.contains("secret123"));
}

// =============================================================================
// TEST GROUP 3: V1 Decoder
// =============================================================================

#[test]
fn test_v1_decodes_valid_block() {
    let block = v1_block("VOTE\nTopSites\nAlice\n10.0.0.7\n1700000000\n");
    assert_eq!(block.len(), V1_BLOCK_LEN);

    let vote = V1Decoder::new(keys()).decode(&block, 0).unwrap();
    assert_eq!(vote.service_name, "TopSites");
    assert_eq!(vote.username, "Alice");
    assert_eq!(vote.address, "10.0.0.7");
    assert_eq!(vote.timestamp, VoteTimestamp::from("1700000000"));
    assert_eq!(vote.source_protocol_version, ProtocolVersion::V1);
}

#[test]
fn test_v1_address_is_opaque() {
    let block = v1_block("VOTE\nsite\nuser\nnot-an-ip\nts\n");
    let vote = V1Decoder::new(keys()).decode(&block, 0).unwrap();
    assert_eq!(vote.address, "not-an-ip");
}

#[test]
fn test_v1_empty_timestamp_uses_receive_time() {
    let block = v1_block("VOTE\nsite\nuser\n1.2.3.4\n\n");
    let vote = V1Decoder::new(keys()).decode(&block, 42).unwrap();
    assert_eq!(vote.timestamp, VoteTimestamp::from(42));
}

#[test]
fn test_v1_trailing_content_ignored() {
    let block = v1_block("VOTE\nsite\nuser\n1.2.3.4\n99\nextra\nmore");
    let vote = V1Decoder::new(keys()).decode(&block, 0).unwrap();
    assert_eq!(vote.username, "user");
}

#[test]
fn test_v1_missing_opcode_is_malformed() {
    let block = v1_block("VOTES\nsite\nuser\n1.2.3.4\n99\n");
    let err = V1Decoder::new(keys()).decode(&block, 0).unwrap_err();
    assert!(matches!(err, DecodeError::MalformedPayload(_)));
}

#[test]
fn test_v1_too_few_fields_is_malformed() {
    let block = v1_block("VOTE\nsite\nuser");
    let err = V1Decoder::new(keys()).decode(&block, 0).unwrap_err();
    assert!(matches!(err, DecodeError::MalformedPayload(_)));
}

#[test]
fn test_v1_garbage_block_fails_decryption() {
    let err = V1Decoder::new(keys()).decode(&[0x42u8; V1_BLOCK_LEN], 0).unwrap_err();
    assert!(matches!(err, DecodeError::Decryption(_)));
    assert_eq!(err.kind(), "decryption_error");
}

#[test]
fn test_v1_same_block_accepted_twice() {
    let block = v1_block("VOTE\nsite\nuser\n1.2.3.4\n99\n");
    let decoder = V1Decoder::new(keys());
    assert!(decoder.decode(&block, 0).is_ok());
    assert!(decoder.decode(&block, 0).is_ok());
}

#[test]
fn test_v1_blinded_decrypt_is_stable_across_calls() {
    // Each call draws a fresh blinding factor; the plaintext must not change.
    let block = v1_block("VOTE\nTopSites\nAlice\n10.0.0.7\n1700000000\n");
    let decoder = V1Decoder::new(keys());
    let first = decoder.decode(&block, 0).unwrap();
    for _ in 0..4 {
        assert_eq!(decoder.decode(&block, 0).unwrap(), first);
    }

    for garbage in [[0x00u8; V1_BLOCK_LEN], [0xffu8; V1_BLOCK_LEN]] {
        let err = decoder.decode(&garbage, 0).unwrap_err();
        assert!(matches!(err, DecodeError::Decryption(_)));
    }
}

// =============================================================================
// TEST GROUP 4: V2 Decoder
// =============================================================================

#[test]
fn test_v2_valid_envelope() {
    let tokens = registry();
    let frame = signed_envelope("minecraft", ISSUED, "secret123");

    let vote = V2Decoder::new(&tokens)
        .decode(frame.as_bytes(), &challenge(ISSUED))
        .unwrap();

    assert_eq!(vote.service_name, "minecraft");
    assert_eq!(vote.username, "Bob");
    assert_eq!(vote.address, "1.2.3.4");
    assert_eq!(vote.timestamp, VoteTimestamp::from(12345));
    assert_eq!(vote.source_protocol_version, ProtocolVersion::V2);
}

#[test]
fn test_v2_signature_covers_raw_payload_text() {
    // Unusual spacing and key order: re-serializing would change the bytes.
    let payload = format!(
        "{{ \"challenge\" : \"{}\",\"serviceName\":\"site\" ,\"username\":\"Bob\",\"address\":\"a\",\"timestamp\":\"t\"}}",
        ISSUED
    );
    let tokens = registry();
    let frame = V2Envelope::sign(payload, "secret123").unwrap().to_json();

    let vote = V2Decoder::new(&tokens)
        .decode(frame.as_bytes(), &challenge(ISSUED))
        .unwrap();
    assert_eq!(vote.timestamp, VoteTimestamp::from("t"));
}

#[test]
fn test_v2_single_bit_flip_is_rejected() {
    let tokens = registry();
    for service in ["minecraft", "a", "service-with-a-longer-name", ""] {
        let payload = inner_payload(service, ISSUED);
        let mut sig = BASE64_STANDARD
            .decode(sign_payload("secret123", &payload).unwrap())
            .unwrap();

        for bit in [0usize, 7, 100, 255] {
            sig[bit / 8] ^= 1 << (bit % 8);
            let envelope = V2Envelope {
                payload: payload.clone(),
                signature: BASE64_STANDARD.encode(&sig),
            };
            let err = V2Decoder::new(&tokens)
                .decode(envelope.to_json().as_bytes(), &challenge(ISSUED))
                .unwrap_err();
            assert_eq!(err, DecodeError::SignatureMismatch);
            sig[bit / 8] ^= 1 << (bit % 8);
        }
    }
}

#[test]
fn test_v2_all_zero_signature_is_mismatch() {
    let tokens = registry();
    let envelope = V2Envelope {
        payload: inner_payload("minecraft", ISSUED),
        signature: BASE64_STANDARD.encode([0u8; SIGNATURE_LEN]),
    };
    let err = V2Decoder::new(&tokens)
        .decode(envelope.to_json().as_bytes(), &challenge(ISSUED))
        .unwrap_err();
    assert_eq!(err, DecodeError::SignatureMismatch);
}

#[test]
fn test_v2_sign_accepts_any_secret_length() {
    let payload = inner_payload("minecraft", ISSUED);
    let long = "k".repeat(200);
    for secret in ["", "x", long.as_str()] {
        let signature = sign_payload(secret, &payload).unwrap();
        assert_eq!(BASE64_STANDARD.decode(signature).unwrap().len(), SIGNATURE_LEN);
    }
}

#[test]
fn test_v2_truncated_signature_is_mismatch() {
    let tokens = registry();
    let payload = inner_payload("minecraft", ISSUED);
    let sig = BASE64_STANDARD
        .decode(sign_payload("secret123", &payload).unwrap())
        .unwrap();
    let envelope = V2Envelope {
        payload,
        signature: BASE64_STANDARD.encode(&sig[..16]),
    };

    let err = V2Decoder::new(&tokens)
        .decode(envelope.to_json().as_bytes(), &challenge(ISSUED))
        .unwrap_err();
    assert_eq!(err, DecodeError::SignatureMismatch);
}

#[test]
fn test_v2_wrong_secret_is_mismatch() {
    let tokens = registry();
    let frame = signed_envelope("minecraft", ISSUED, "not-the-secret");
    let err = V2Decoder::new(&tokens)
        .decode(frame.as_bytes(), &challenge(ISSUED))
        .unwrap_err();
    assert_eq!(err, DecodeError::SignatureMismatch);
}

#[test]
fn test_v2_replay_on_new_challenge_is_rejected() {
    let tokens = registry();
    let captured = signed_envelope("minecraft", ISSUED, "secret123");
    let later = challenge("ffffffffffffffffffffffffffffffff");

    let err = V2Decoder::new(&tokens)
        .decode(captured.as_bytes(), &later)
        .unwrap_err();
    assert!(matches!(err, DecodeError::ChallengeMismatch { .. }));
}

#[test]
fn test_v2_signature_checked_before_challenge() {
    let tokens = registry();
    let frame = signed_envelope("minecraft", "wrong", "not-the-secret");
    let err = V2Decoder::new(&tokens)
        .decode(frame.as_bytes(), &challenge(ISSUED))
        .unwrap_err();
    assert_eq!(err, DecodeError::SignatureMismatch);
}

#[test]
fn test_v2_falls_back_to_default_token() {
    let tokens = registry().with_token("other-site", "other-secret");
    let frame = signed_envelope("minecraft", ISSUED, "secret123");
    assert!(V2Decoder::new(&tokens)
        .decode(frame.as_bytes(), &challenge(ISSUED))
        .is_ok());
}

#[test]
fn test_v2_unknown_service_without_default() {
    let tokens = TokenRegistry::new().with_token("other-site", "other-secret");
    let frame = signed_envelope("minecraft", ISSUED, "secret123");
    let err = V2Decoder::new(&tokens)
        .decode(frame.as_bytes(), &challenge(ISSUED))
        .unwrap_err();
    assert_eq!(err, DecodeError::UnknownService("minecraft".to_string()));
}

#[test]
fn test_v2_invalid_base64_signature() {
    let tokens = registry();
    let envelope = V2Envelope {
        payload: inner_payload("minecraft", ISSUED),
        signature: "***not base64***".to_string(),
    };
    let err = V2Decoder::new(&tokens)
        .decode(envelope.to_json().as_bytes(), &challenge(ISSUED))
        .unwrap_err();
    assert_eq!(err, DecodeError::InvalidSignatureEncoding);
}

#[test]
fn test_v2_invalid_outer_json() {
    let tokens = registry();
    let err = V2Decoder::new(&tokens)
        .decode(b"{not json", &challenge(ISSUED))
        .unwrap_err();
    assert!(matches!(err, DecodeError::InvalidOuterEnvelope(_)));
}

#[test]
fn test_v2_invalid_inner_json() {
    let tokens = registry();
    let frame = V2Envelope::sign("definitely not json", "secret123")
        .unwrap()
        .to_json();
    let err = V2Decoder::new(&tokens)
        .decode(frame.as_bytes(), &challenge(ISSUED))
        .unwrap_err();
    assert!(matches!(err, DecodeError::InvalidInnerEnvelope(_)));
}
