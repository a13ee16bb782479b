//! Basic usage example for the OpenThings packet codec.

use gateway_wire::{decode_packet, encode_packet, encode_packet_with_pip, Message, Record};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== OpenThings Codec Example ===\n");

    // 1. Decode a captured temperature report
    println!("1. Decoding a captured packet...");
    let mut raw = [
        0x04, 0x03, 0x0F, 0x42, 0x89, 0x00, 0x3A, 0x46, 0x9C, 0xA6, 0xE2, 0x35, 0x1F, 0xDC,
    ];
    let message = decode_packet(&mut raw)?;
    println!("   Sensor id: {:06x}", message.sensor_id);
    println!("   Message: {}", message);

    // 2. Build a message and encode it with a random pip
    println!("\n2. Encoding a temperature report...");
    let report = Message {
        manufacturer_id: 0x04,
        product_id: 0x03,
        sensor_id: 0x00097F,
        records: vec![Record::Temperature(21.5), Record::Voltage(2.90625)],
    };
    let wire = encode_packet(&report, &mut rand::thread_rng());
    println!("   Encoded packet: {:02x?}", &wire[..]);

    // 3. Round-trip the encoded packet
    println!("\n3. Decoding it again...");
    let mut wire = encode_packet_with_pip(&report, 0x1234);
    let decoded = decode_packet(&mut wire)?;
    println!("   Round trip matches original: {}", decoded == report);

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
