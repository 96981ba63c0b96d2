// Unit tests for the OSC datagram codec
// Byte layouts are checked against hand-built OSC 1.0 packets

use crate::osc::{ControlMessage, OscArg, decode_packet, encode_message};

fn bundle(elements: &[Vec<u8>]) -> Vec<u8> {
    let mut buf = b"#bundle\0".to_vec();
    buf.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 1]); // immediately
    for element in elements {
        buf.extend_from_slice(&(element.len() as i32).to_be_bytes());
        buf.extend_from_slice(element);
    }
    buf
}

/// **VALUE**: Verifies the exact wire layout of a float message.
///
/// **WHY THIS MATTERS**: Mixer faders are driven by `/track/N/volume ,f` messages;
/// a padding mistake makes the mixer silently ignore every fader move.
///
/// **BUG THIS CATCHES**: Would catch missing NUL terminators, wrong 4-byte
/// alignment, or little-endian floats.
#[test]
fn given_volume_message_when_encoded_then_matches_osc_layout() {
    // GIVEN
    let message = ControlMessage::new("/track/1/volume", vec![OscArg::Float(0.5)]);

    // WHEN
    let bytes = encode_message(&message).unwrap();

    // THEN: "/track/1/volume" is 15 chars + NUL = 16, ",f" + NUL pads to 4, then 4 bytes
    let mut expected = b"/track/1/volume\0".to_vec();
    expected.extend_from_slice(b",f\0\0");
    expected.extend_from_slice(&0.5f32.to_be_bytes());
    assert_eq!(bytes, expected);
}

/// **VALUE**: Every supported argument type survives encode then decode.
///
/// **BUG THIS CATCHES**: Would catch a type tag written without its payload
/// (or the reverse), which shifts every later argument.
#[test]
fn given_mixed_args_when_encoded_and_decoded_then_args_preserved() {
    // GIVEN
    let message = ControlMessage::new(
        "/mixed",
        vec![
            OscArg::Int(-7),
            OscArg::Long(1 << 40),
            OscArg::Float(0.25),
            OscArg::Double(0.125),
            OscArg::String("Drums".to_string()),
            OscArg::Blob(vec![1, 2, 3, 4, 5]),
            OscArg::True,
            OscArg::False,
            OscArg::Nil,
            OscArg::Int(9),
        ],
    );

    // WHEN
    let bytes = encode_message(&message).unwrap();
    let decoded = decode_packet(&bytes).unwrap();

    // THEN
    assert_eq!(bytes.len() % 4, 0);
    assert_eq!(decoded, vec![message]);
}

/// **VALUE**: Bundles from the mixer are flattened into their messages, in order.
///
/// **WHY THIS MATTERS**: The mixer batches feedback into bundles. If bundles were
/// rejected, clients would never see track updates.
#[test]
fn given_nested_bundle_when_decoded_then_messages_flattened_in_order() {
    // GIVEN
    let first = encode_message(&ControlMessage::new("/track/1/mute", vec![OscArg::Int(1)])).unwrap();
    let second = encode_message(&ControlMessage::new("/track/2/mute", vec![OscArg::Int(0)])).unwrap();
    let third = encode_message(&ControlMessage::query("/track/3/name")).unwrap();
    let inner = bundle(&[second, third]);
    let outer = bundle(&[first, inner]);

    // WHEN
    let decoded = decode_packet(&outer).unwrap();

    // THEN
    let addresses: Vec<&str> = decoded.iter().map(|m| m.address.as_str()).collect();
    assert_eq!(addresses, ["/track/1/mute", "/track/2/mute", "/track/3/name"]);
}

/// **VALUE**: Messages without a type tag string decode as queries.
#[test]
fn given_message_without_type_tags_when_decoded_then_no_args() {
    // GIVEN: address only, old-style
    let bytes = b"/ping\0\0\0".to_vec();

    // WHEN
    let decoded = decode_packet(&bytes).unwrap();

    // THEN
    assert_eq!(decoded, vec![ControlMessage::query("/ping")]);
}

/// **VALUE**: Truncated datagrams are rejected instead of read past the end.
///
/// **BUG THIS CATCHES**: Would catch slicing without bounds checks, which would
/// panic the UDP receive loop on a single corrupt packet.
#[test]
fn given_truncated_float_when_decoded_then_decode_error() {
    // GIVEN
    let mut bytes = encode_message(&ControlMessage::new("/x", vec![OscArg::Float(1.0)])).unwrap();
    bytes.truncate(bytes.len() - 2);

    // WHEN
    let result = decode_packet(&bytes);

    // THEN
    let err = result.unwrap_err().to_string();
    assert!(err.contains("Truncated"), "got: {err}");
}

/// **VALUE**: Unknown type tags fail the packet with a clear reason.
#[test]
fn given_unknown_type_tag_when_decoded_then_decode_error() {
    // GIVEN
    let bytes = b"/x\0\0,r\0\0\0\0\0\0".to_vec();

    // WHEN
    let err = decode_packet(&bytes).unwrap_err().to_string();

    // THEN
    assert!(err.contains("Unsupported type tag 'r'"), "got: {err}");
}

/// **VALUE**: Garbage that is neither a message nor a bundle is rejected.
#[test]
fn given_non_osc_bytes_when_decoded_then_decode_error() {
    assert!(decode_packet(b"hello").is_err());
    assert!(decode_packet(&[]).is_err());
}

/// **VALUE**: Addresses must be OSC address patterns.
///
/// **BUG THIS CATCHES**: Would catch client frames with addresses like
/// `track/1/volume` being sent as datagrams the mixer cannot parse.
#[test]
fn given_address_without_slash_when_encoded_then_encode_error() {
    // GIVEN
    let message = ControlMessage::query("track/1/volume");

    // WHEN
    let result = encode_message(&message);

    // THEN
    assert!(result.is_err());
}

/// **VALUE**: Strings with interior NULs cannot be encoded.
#[test]
fn given_string_with_nul_when_encoded_then_encode_error() {
    let message = ControlMessage::new("/name", vec![OscArg::String("a\0b".to_string())]);

    assert!(encode_message(&message).is_err());
}

/// **VALUE**: Runaway bundle nesting is bounded.
#[test]
fn given_deeply_nested_bundle_when_decoded_then_decode_error() {
    // GIVEN
    let mut packet = encode_message(&ControlMessage::query("/deep")).unwrap();
    for _ in 0..12 {
        packet = bundle(&[packet]);
    }

    // WHEN
    let err = decode_packet(&packet).unwrap_err().to_string();

    // THEN
    assert!(err.contains("nested"), "got: {err}");
}
