use frameshift::{
    Decoder, DecoderConfig, DynamicLength, Encoder, Endian, FieldRange, Frame, FrameSchema,
    FrameView, LengthSchema, ProtocolParser, ValidSchema,
};
use proptest::prelude::*;

const PREFIX: [u8; 2] = [0xFF, 0xFE];
const SUFFIX: [u8; 2] = [0x0D, 0x0A];

#[derive(Debug, Clone, Copy)]
enum Mode {
    Fixed,
    Dynamic {
        size: usize,
        little: bool,
        whole_frame: bool,
    },
    Free,
}

#[derive(Debug, Clone, Copy)]
struct Layout {
    mode: Mode,
    command_size: usize,
    alter_data_size: usize,
    crc_size: usize,
}

impl Layout {
    fn schema(self, fixed_len: usize) -> ValidSchema {
        let (length, crc_size) = match self.mode {
            Mode::Fixed => (LengthSchema::Fixed { length: fixed_len }, self.crc_size),
            Mode::Dynamic {
                size,
                little,
                whole_frame,
            } => {
                let endian = if little { Endian::Little } else { Endian::Big };
                let range = if whole_frame {
                    FieldRange::ALL
                } else {
                    FieldRange::CONTENT
                };
                let dynamic = DynamicLength::new(size)
                    .with_endian(endian)
                    .with_range(range);
                (LengthSchema::Dynamic(dynamic), self.crc_size)
            }
            Mode::Free => (LengthSchema::Free, 0),
        };
        FrameSchema::new(length)
            .with_prefix(PREFIX)
            .with_command_size(self.command_size)
            .with_alter_data_size(self.alter_data_size)
            .with_crc(crc_size, Endian::Big)
            .with_suffix(SUFFIX)
            .normalize()
            .unwrap()
    }

    /// Shape raw bytes into content this layout can carry
    fn fit(self, mut content: Vec<u8>, fixed_len: usize) -> Vec<u8> {
        match self.mode {
            Mode::Fixed => content.resize(fixed_len, 0xA5),
            Mode::Dynamic { .. } => {}
            Mode::Free => {
                for byte in &mut content {
                    if SUFFIX.contains(byte) {
                        *byte = b'.';
                    }
                }
            }
        }
        content
    }

    fn command(self, seed: u8) -> Vec<u8> {
        (0..self.command_size)
            .map(|i| seed.wrapping_add(i as u8))
            .collect()
    }
}

fn layout_strategy() -> impl Strategy<Value = Layout> {
    let mode = prop_oneof![
        Just(Mode::Fixed),
        (
            prop::sample::select(vec![1usize, 2, 4]),
            any::<bool>(),
            any::<bool>()
        )
            .prop_map(|(size, little, whole_frame)| Mode::Dynamic {
                size,
                little,
                whole_frame,
            }),
        Just(Mode::Free),
    ];
    (mode, 0usize..=2, 0usize..=2, 0usize..=2).prop_map(
        |(mode, command_size, alter_data_size, crc_size)| Layout {
            mode,
            command_size,
            alter_data_size,
            crc_size,
        },
    )
}

fn content_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=64)
}

fn encode_frame(schema: &ValidSchema, command: &[u8], content: &[u8]) -> Frame {
    let encoder = Encoder::with_schema(schema.clone());
    let command = (!command.is_empty()).then_some(command);
    let mut frame = encoder.encode_content(command, content).unwrap();
    frame.set_crc(content.len() as u64);
    frame.freeze()
}

proptest! {
    #[test]
    fn prop_roundtrip_preserves_frame(
        layout in layout_strategy(),
        raw in content_strategy(),
        seed in any::<u8>(),
        fixed_len in 0usize..=16,
    ) {
        let schema = layout.schema(fixed_len);
        let content = layout.fit(raw, fixed_len);
        let command = layout.command(seed);
        let frame = encode_frame(&schema, &command, &content);

        let mut decoder = Decoder::new(schema, DecoderConfig::default()).unwrap();
        decoder.feed(frame.as_bytes()).unwrap();
        let decoded = decoder.parse();

        prop_assert!(decoded.is_some());
        let decoded = decoded.unwrap();
        prop_assert_eq!(decoded.command(), &command[..]);
        prop_assert_eq!(decoded.content(), &content[..]);
        prop_assert_eq!(decoded.as_bytes(), frame.as_bytes());
        prop_assert!(decoder.parse().is_none());
    }

    #[test]
    fn prop_chunked_delivery_is_invisible(
        layout in layout_strategy(),
        raw in content_strategy(),
        fixed_len in 0usize..=16,
        sizes in prop::collection::vec(1usize..8, 1..16),
    ) {
        let schema = layout.schema(fixed_len);
        let content = layout.fit(raw, fixed_len);
        let frame = encode_frame(&schema, &layout.command(0x40), &content);

        let mut decoder = Decoder::new(schema, DecoderConfig::default()).unwrap();
        let mut frames = Vec::new();
        let mut rest = frame.as_bytes();
        let mut sizes = sizes.iter().cycle();
        while !rest.is_empty() {
            let n = sizes.next().copied().unwrap_or(1).min(rest.len());
            decoder.feed(&rest[..n]).unwrap();
            rest = &rest[n..];
            frames.extend(std::iter::from_fn(|| decoder.parse()));
        }

        prop_assert_eq!(frames, vec![frame]);
    }

    #[test]
    fn prop_concatenated_frames_drain(
        layout in layout_strategy(),
        contents in prop::collection::vec(content_strategy(), 1..8),
        fixed_len in 0usize..=16,
    ) {
        let schema = layout.schema(fixed_len);
        let mut stream = Vec::new();
        let mut expected = Vec::new();
        for (i, raw) in contents.into_iter().enumerate() {
            let content = layout.fit(raw, fixed_len);
            let frame = encode_frame(&schema, &layout.command(i as u8), &content);
            stream.extend_from_slice(frame.as_bytes());
            expected.push(frame);
        }

        let mut decoder = Decoder::new(schema, DecoderConfig::default()).unwrap();
        decoder.feed(&stream).unwrap();
        let frames: Vec<Frame> = decoder.drain().collect();

        prop_assert_eq!(frames.len(), expected.len());
        prop_assert_eq!(frames, expected);
        prop_assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn prop_garbage_before_frame_is_dropped(
        layout in layout_strategy(),
        garbage in prop::collection::vec(0u8..0xFF, 0..256),
        raw in content_strategy(),
        fixed_len in 0usize..=16,
    ) {
        let schema = layout.schema(fixed_len);
        let content = layout.fit(raw, fixed_len);
        let frame = encode_frame(&schema, &layout.command(7), &content);

        let mut decoder = Decoder::new(schema, DecoderConfig::default()).unwrap();
        decoder.feed(&garbage).unwrap();
        decoder.feed(frame.as_bytes()).unwrap();
        let frames: Vec<Frame> = decoder.drain().collect();

        prop_assert_eq!(frames, vec![frame]);
        prop_assert_eq!(decoder.stats().discarded_bytes, garbage.len() as u64);
    }

    #[test]
    fn prop_noise_never_overflows(
        layout in layout_strategy(),
        noise in prop::collection::vec(any::<u8>(), 0..4096),
    ) {
        let schema = layout.schema(8);
        let config = DecoderConfig::new(64);
        let mut decoder = Decoder::new(schema, config).unwrap();

        let result = decoder.transform(&noise);
        prop_assert!(result.is_ok());
        prop_assert!(decoder.buffered() <= 64);
    }
}
