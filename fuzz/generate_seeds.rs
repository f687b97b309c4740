//! Generate seed corpus for fuzzing

use respack::{ArchiveWriter, MetadataNode, Value};
use std::fs;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let corpus_dir = "fuzz/corpus/fuzz_archive_parse";
    fs::create_dir_all(corpus_dir)?;

    println!("Generating seed corpus...");

    // Seed 1: Empty pack (no resources)
    {
        let path = format!("{}/seed_empty.pack", corpus_dir);
        let writer = ArchiveWriter::create(&path)?;
        writer.finalize()?;
        println!("Generated: {}", path);
    }

    // Seed 2: Single small resource
    {
        let path = format!("{}/seed_single_small.pack", corpus_dir);
        let mut writer = ArchiveWriter::create(&path)?;
        writer.add_resource("test.txt", b"Hello, World!")?;
        writer.finalize()?;
        println!("Generated: {}", path);
    }

    // Seed 3: Nested names and typed metadata
    {
        let path = format!("{}/seed_metadata.pack", corpus_dir);
        let mut writer = ArchiveWriter::create(&path)?;
        writer.add_resource_with(
            "models/tree.obj",
            b"v 0 0 0\n",
            vec![
                MetadataNode::leaf("MinX", Value::Float(-1.5)),
                MetadataNode::leaf("Material", Value::String("bark".to_string())),
                MetadataNode::container(
                    "Bounds",
                    vec![MetadataNode::leaf("Radius", Value::Integer(3))],
                ),
            ],
        )?;
        writer.add_resource("textures/bark.tga", &[0x42; 64])?;
        writer.finalize()?;
        println!("Generated: {}", path);
    }

    // Seed 4: Settings document as a resource
    {
        let path = format!("{}/seed_settings.pack", corpus_dir);
        let mut writer = ArchiveWriter::create(&path)?;
        let settings = b"<root><item name=\"Display\"><item name=\"Width\" type=\"Integer\">800</item></item></root>";
        writer.add_resource(respack::DEFAULT_SETTINGS_FILE, settings)?;
        writer.finalize()?;
        println!("Generated: {}", path);
    }

    // Seed 5: Binary data
    {
        let path = format!("{}/seed_binary.pack", corpus_dir);
        let mut writer = ArchiveWriter::create(&path)?;
        let binary_data: Vec<u8> = (0..255).collect();
        writer.add_resource("binary.bin", &binary_data)?;
        writer.finalize()?;
        println!("Generated: {}", path);
    }

    // Seed 6: Empty resource (zero bytes)
    {
        let path = format!("{}/seed_zero_length.pack", corpus_dir);
        let mut writer = ArchiveWriter::create(&path)?;
        writer.add_resource("empty.txt", b"")?;
        writer.finalize()?;
        println!("Generated: {}", path);
    }

    println!("\nGenerated 6 seed files in {}", corpus_dir);
    Ok(())
}
