//! Encode a few frames, corrupt the stream and decode it back

use frameshift::{
    Decoder, DecoderConfig, DynamicLength, Encoder, Endian, FrameSchema, FrameView,
    LengthSchema,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Frameshift Round Trip Example");
    println!("=============================\n");

    let schema = FrameSchema::new(LengthSchema::Fixed { length: 4 })
        .with_prefix([0xFF, 0xFE])
        .with_command_size(1)
        .with_override([0x02], LengthSchema::Dynamic(DynamicLength::new(1)))
        .with_alter_data_size(1)
        .with_crc(1, Endian::Big)
        .with_suffix([0xCC])
        .normalize()?;

    let encoder = Encoder::with_schema(schema.clone());
    let mut decoder = Decoder::new(schema, DecoderConfig::default())?;

    let mut stream = vec![0x00, 0xFF, 0x13];
    for (command, content) in [(0x01u8, &b"ping"[..]), (0x02, b"variable payload")] {
        let mut frame = encoder.encode_content(Some(&[command]), content)?;
        frame.set_alter_data(&[0x0A])?;
        let sum = frame
            .crc_coverage(encoder.schema().crc_range())
            .flatten()
            .fold(0u8, |acc, &byte| acc.wrapping_add(byte));
        frame.set_crc(u64::from(sum));
        println!("Encoded command {command:#04x}: {:02X?}", frame.as_bytes());
        stream.extend_from_slice(frame.as_bytes());
    }

    for chunk in stream.chunks(5) {
        decoder.feed(chunk)?;
        while let Some(frame) = decoder.parse() {
            println!(
                "Decoded command {:02X?}: {:?} (crc {:#04x})",
                frame.command(),
                String::from_utf8_lossy(frame.content()),
                frame.crc_value()
            );
        }
    }

    let stats = decoder.stats();
    println!(
        "\n{} frames, {} resyncs, {} bytes discarded",
        stats.frames, stats.resyncs, stats.discarded_bytes
    );

    Ok(())
}
