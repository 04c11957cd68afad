use frameshift::{
    AsciiParser, Decoder, DecoderConfig, DynamicLength, Encoder, Endian, FieldRange, Frame,
    FrameSchema, FrameView, LengthSchema, ProtocolParser, ValidSchema,
};

fn sensor_schema() -> ValidSchema {
    FrameSchema::new(LengthSchema::Fixed { length: 4 })
        .with_prefix([0xFF, 0xFE])
        .with_command_size(1)
        .with_alter_data_size(1)
        .with_crc(1, Endian::Big)
        .with_suffix([0xCC])
        .normalize()
        .unwrap()
}

fn drain(decoder: &mut Decoder) -> Vec<Frame> {
    decoder.drain().collect()
}

#[test]
fn fixed_frame_encodes_to_exact_bytes_and_decodes_back() {
    let schema = sensor_schema();
    let encoder = Encoder::with_schema(schema.clone());

    let mut frame = encoder.encode(Some(&[0x0C]), None).unwrap();
    frame.set_alter_data(&[0x0A]).unwrap();
    frame.set_content(&[0x01, 0x02, 0x03, 0x04]).unwrap();
    frame.set_crc(0x99);
    let frame = frame.freeze();
    assert_eq!(
        frame.as_bytes(),
        &[0xFF, 0xFE, 0x0C, 0x0A, 0x01, 0x02, 0x03, 0x04, 0x99, 0xCC]
    );

    let mut decoder = Decoder::new(schema, DecoderConfig::default()).unwrap();
    decoder.feed(frame.as_bytes()).unwrap();
    let decoded = decoder.parse().unwrap();
    assert_eq!(decoded.command(), &[0x0C]);
    assert_eq!(decoded.content(), &[0x01, 0x02, 0x03, 0x04]);
    assert_eq!(decoded, frame);
    assert!(decoder.parse().is_none());
}

#[test]
fn free_mode_content_runs_to_first_suffix() {
    let schema = FrameSchema::new(LengthSchema::Free).with_suffix([0xCC]);
    let mut decoder = Decoder::from_schema(schema, DecoderConfig::default()).unwrap();
    decoder
        .feed(&[0x00, 0x00, 0xFF, 0xFE, 0x01, 0x02, 0x03, 0x04, 0x05, 0x99, 0xCC])
        .unwrap();

    let frame = decoder.parse().unwrap();
    assert_eq!(
        frame.content(),
        &[0x00, 0x00, 0xFF, 0xFE, 0x01, 0x02, 0x03, 0x04, 0x05, 0x99]
    );
    assert_eq!(frame.suffix(), &[0xCC]);
    assert!(decoder.parse().is_none());
}

#[test]
fn per_command_lengths_dispatch_in_sequence() {
    let schema = FrameSchema::new(LengthSchema::Fixed { length: 4 })
        .with_prefix([0xFF, 0xFE])
        .with_command_size(1)
        .with_override([0x01], LengthSchema::Fixed { length: 2 })
        .with_override([0x03], LengthSchema::Fixed { length: 0 })
        .normalize()
        .unwrap();
    let encoder = Encoder::with_schema(schema.clone());

    let mut stream = Vec::new();
    stream.extend_from_slice(encoder.encode_content(Some(&[0x01]), b"ab").unwrap().as_bytes());
    stream.extend_from_slice(encoder.encode_content(Some(&[0x03]), b"").unwrap().as_bytes());
    stream.extend_from_slice(encoder.encode_content(Some(&[0x02]), b"wxyz").unwrap().as_bytes());

    let mut decoder = Decoder::new(schema, DecoderConfig::default()).unwrap();
    decoder.feed(&stream).unwrap();
    let frames = drain(&mut decoder);

    let decoded: Vec<(&[u8], &[u8])> = frames
        .iter()
        .map(|frame| (frame.command(), frame.content()))
        .collect();
    assert_eq!(
        decoded,
        vec![
            (&[0x01][..], &b"ab"[..]),
            (&[0x03][..], &b""[..]),
            (&[0x02][..], &b"wxyz"[..]),
        ]
    );
}

#[test]
fn corrupt_leading_byte_then_one_frame() {
    let schema = sensor_schema();
    let encoder = Encoder::with_schema(schema.clone());
    let frame = encoder
        .encode_content(Some(&[0x01]), &[9, 8, 7, 6])
        .unwrap();

    let mut decoder = Decoder::new(schema, DecoderConfig::default()).unwrap();
    decoder.feed(&[0xFF]).unwrap();
    decoder.feed(frame.as_bytes()).unwrap();

    let frames = drain(&mut decoder);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].content(), &[9, 8, 7, 6]);
    assert!(decoder.parse().is_none());
}

#[test]
fn truncated_frame_is_skipped_after_resync() {
    let schema = sensor_schema();
    let encoder = Encoder::with_schema(schema.clone());
    let frame = encoder.encode_content(Some(&[0x01]), &[1, 2, 3, 4]).unwrap();
    let bytes = frame.as_bytes();

    let mut decoder = Decoder::new(schema, DecoderConfig::default()).unwrap();
    decoder.feed(&bytes[..6]).unwrap();
    decoder.feed(bytes).unwrap();

    let frames = drain(&mut decoder);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].as_bytes(), bytes);
    assert!(decoder.stats().resyncs >= 1);
}

#[test]
fn dynamic_length_covering_whole_frame() {
    let dynamic = DynamicLength::new(2)
        .with_endian(Endian::Little)
        .with_range(FieldRange::ALL);
    let schema = FrameSchema::new(LengthSchema::Dynamic(dynamic))
        .with_prefix([0x7E])
        .with_command_size(2)
        .with_crc(2, Endian::Little)
        .with_crc_range(FieldRange::COMMAND | FieldRange::CONTENT)
        .with_suffix([0x7F])
        .normalize()
        .unwrap();
    let encoder = Encoder::with_schema(schema.clone());

    let mut frame = encoder.encode_content(Some(&[0x10, 0x20]), b"payload").unwrap();
    let sum: u64 = frame
        .crc_coverage(schema.crc_range())
        .flatten()
        .map(|&byte| u64::from(byte))
        .sum();
    frame.set_crc(sum);
    let frame = frame.freeze();
    assert_eq!(frame.length_value(), frame.wire_size() as u64);

    let mut decoder = Decoder::new(schema.clone(), DecoderConfig::default()).unwrap();
    for byte in frame.as_bytes() {
        decoder.feed(std::slice::from_ref(byte)).unwrap();
        if let Some(decoded) = decoder.parse() {
            assert_eq!(decoded.content(), b"payload");
            assert_eq!(decoded.crc_value(), sum);
            let recomputed: u64 = decoded
                .crc_coverage(schema.crc_range())
                .flatten()
                .map(|&byte| u64::from(byte))
                .sum();
            assert_eq!(recomputed, sum);
            return;
        }
    }
    panic!("frame was not decoded");
}

#[test]
fn decoder_schema_feeds_encoder() {
    let schema = FrameSchema::new(LengthSchema::Free).with_suffix(*b"\r\n");
    let decoder = Decoder::from_schema(schema, DecoderConfig::default()).unwrap();
    let encoder = Encoder::with_schema(decoder.schema().clone());
    assert!(encoder.schema().ptr_eq(decoder.schema()));
}

#[test]
fn ascii_lines_through_transform() {
    let mut parser = AsciiParser::new();
    let mut records = parser.transform("a=1,b=2\nc=").unwrap();
    records.extend(parser.transform("3\n").unwrap());

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get("b").map(String::as_str), Some("2"));
    assert_eq!(records[1].get("c").map(String::as_str), Some("3"));
}
