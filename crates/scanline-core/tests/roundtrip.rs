//! Wire round-trips: sequences the encoder emits must come back out of the
//! parser as the matching events, for every chunking of the byte stream.

use scanline_core::capabilities::DeviceAttributes;
use scanline_core::control::ControlSequence;
use scanline_core::encode::Encoding;
use scanline_core::event::{Event, KeyCode, KeyEvent};
use scanline_core::input_parser::InputParser;

fn parse(bytes: &[u8]) -> Vec<Event> {
    InputParser::new().parse(bytes)
}

#[test]
fn cursor_motions_round_trip_to_arrow_keys() {
    let cases = [
        (ControlSequence::CursorUp(1), KeyCode::Up),
        (ControlSequence::CursorDown(1), KeyCode::Down),
        (ControlSequence::CursorForward(1), KeyCode::Right),
        (ControlSequence::CursorBackward(1), KeyCode::Left),
    ];

    for (sequence, code) in cases {
        let bytes = Encoding::SevenBit.encode(&sequence);
        assert_eq!(
            parse(&bytes),
            vec![Event::Key(KeyEvent::new(code))],
            "{sequence:?}"
        );
    }
}

#[test]
fn counted_cursor_motions_still_decode_direction() {
    // The count survives encoding; the key event carries the direction.
    let bytes = Encoding::SevenBit.encode(&ControlSequence::CursorUp(7));
    assert_eq!(bytes, b"\x1b[7A");
    assert_eq!(parse(&bytes), vec![Event::Key(KeyEvent::new(KeyCode::Up))]);
}

#[test]
fn device_attribute_responses_preserve_parameters() {
    // The parser must hand back exactly the parameter list a terminal
    // would have sent for each response shape.
    let primary = parse(b"\x1b[?64;1;9;15;22c");
    assert_eq!(
        primary,
        vec![Event::Response(DeviceAttributes::Primary(vec![
            64, 1, 9, 15, 22
        ]))]
    );

    let secondary = parse(b"\x1b[>1;95;0c");
    assert_eq!(
        secondary,
        vec![Event::Response(DeviceAttributes::Secondary(vec![1, 95, 0]))]
    );

    let tertiary = parse(b"\x1b[=00000000c");
    assert_eq!(
        tertiary,
        vec![Event::Response(DeviceAttributes::Tertiary(vec![0]))]
    );
}

#[test]
fn da_request_is_not_an_event() {
    // `CSI c` with no private marker is the *request*; a parser feeding an
    // application must not surface it as a response.
    let bytes = Encoding::SevenBit.encode(&ControlSequence::DeviceAttributes(
        DeviceAttributes::Request,
    ));
    assert!(parse(&bytes).is_empty());
}

#[test]
fn concatenated_sequences_concatenate_events() {
    let mut bytes = Encoding::SevenBit.encode(&ControlSequence::CursorUp(1));
    bytes.extend(Encoding::SevenBit.encode(&ControlSequence::CursorBackward(1)));
    bytes.extend_from_slice(b"\x1b[?1;0c");

    assert_eq!(
        parse(&bytes),
        vec![
            Event::Key(KeyEvent::new(KeyCode::Up)),
            Event::Key(KeyEvent::new(KeyCode::Left)),
            Event::Response(DeviceAttributes::Primary(vec![1, 0])),
        ]
    );
}

#[test]
fn every_split_of_a_mixed_stream_is_lossless() {
    let mut stream = Vec::new();
    stream.extend(Encoding::SevenBit.encode(&ControlSequence::CursorDown(1)));
    stream.extend_from_slice(b"\x1b[?62;4c");
    stream.extend(Encoding::SevenBit.encode(&ControlSequence::CursorForward(1)));
    stream.extend_from_slice(b"plain");

    let whole = parse(&stream);
    assert_eq!(whole.len(), 8);

    for split in 0..=stream.len() {
        let mut parser = InputParser::new();
        let mut events = parser.parse(&stream[..split]);
        events.extend(parser.parse(&stream[split..]));
        assert_eq!(events, whole, "split at {split}");
    }
}
