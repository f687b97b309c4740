//! Integration tests for respack-rs

use respack::{
    dump, ingest_str, Archive, ArchiveWriter, MetadataNode, PackError, Settings, Value,
    HEADER_SIZE, PACK_MAGIC,
};
use std::io::{Read, Write};
use tempfile::NamedTempFile;

/// Helper: Write a pack byte by byte from a header, markup and data region
fn raw_pack(magic: u32, markup: &str, data: &[u8]) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file
        .write_all(&(markup.len() as u32).to_le_bytes())
        .unwrap();
    temp_file.write_all(&magic.to_le_bytes()).unwrap();
    temp_file.write_all(markup.as_bytes()).unwrap();
    temp_file.write_all(data).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

const SINGLE_ENTRY: &str = r#"<root>
	<item name="a.raw" type="None">
		<item name="Offset" type="Integer">0</item>
		<item name="Size" type="Integer">4</item>
	</item>
</root>
"#;

#[test]
fn test_single_resource_lifecycle() {
    let temp_file = raw_pack(PACK_MAGIC, SINGLE_ENTRY, &[0xDE, 0xAD, 0xBE, 0xEF]);
    let mut archive = Archive::open(temp_file.path()).unwrap();

    assert_eq!(archive.entry_count(), 1);
    assert_eq!(
        archive.data_region_offset(),
        HEADER_SIZE + SINGLE_ENTRY.len() as u64
    );

    let id = archive.acquire_by_path("a.raw").unwrap();
    assert_eq!(archive.data(id), Some(&[0xDE, 0xAD, 0xBE, 0xEF][..]));
    assert_eq!(archive.reference_count(id), Some(1));
    assert!(archive.is_hot(id));

    archive.release(id).unwrap();
    assert_eq!(archive.sweep(), 1);
    assert!(!archive.is_hot(id));
    assert_eq!(archive.data(id), None);

    let again = archive.acquire_by_path("a.raw").unwrap();
    assert_eq!(again, id);
    assert_eq!(archive.data(again), Some(&[0xDE, 0xAD, 0xBE, 0xEF][..]));

    archive.close();
}

#[test]
fn test_bad_magic_rejected() {
    let temp_file = raw_pack(0xBAD0_BAD0, SINGLE_ENTRY, &[0xDE, 0xAD, 0xBE, 0xEF]);

    match Archive::open(temp_file.path()) {
        Err(PackError::InvalidMagic { found }) => assert_eq!(found, 0xBAD0_BAD0),
        other => panic!("Expected InvalidMagic, got: {:?}", other),
    }
}

#[test]
fn test_writer_roundtrip() {
    let temp_file = NamedTempFile::new().unwrap();
    let archive_path = temp_file.path();

    // Create pack
    {
        let mut writer = ArchiveWriter::create(archive_path).unwrap();
        writer.add_resource("textures/grass.tga", &[7u8; 300]).unwrap();
        writer
            .add_resource_with(
                "models/tree.obj",
                b"v 0 0 0\n",
                vec![
                    MetadataNode::leaf("MinX", Value::Float(-1.5)),
                    MetadataNode::leaf("Version", Value::Integer(2)),
                ],
            )
            .unwrap();
        writer.add_resource("empty.bin", &[]).unwrap();
        writer.finalize().unwrap();
    }

    // Read pack
    {
        let mut archive = Archive::open(archive_path).unwrap();
        assert_eq!(
            archive.resource_names(),
            vec!["textures/grass.tga", "models/tree.obj", "empty.bin"]
        );
        assert!(archive.contains("textures\\grass.tga"));

        let tree = archive.lookup("models/tree.obj").unwrap();
        let meta = archive.metadata(tree).unwrap();
        assert_eq!(meta.get_float(&["MinX"]).unwrap(), -1.5);
        assert_eq!(meta.get_integer(&["Version"]).unwrap(), 2);

        let grass = archive.acquire_by_path("textures/grass.tga").unwrap();
        assert_eq!(archive.data(grass).unwrap(), &[7u8; 300][..]);

        let obj = archive.acquire_by_path("models/tree.obj").unwrap();
        assert_eq!(archive.data(obj).unwrap(), b"v 0 0 0\n");

        let empty = archive.acquire_by_path("empty.bin").unwrap();
        assert_eq!(archive.data(empty).unwrap(), b"");

        archive.close();
    }
}

#[test]
fn test_lookup_missing_resource() {
    let temp_file = raw_pack(PACK_MAGIC, SINGLE_ENTRY, &[0xDE, 0xAD, 0xBE, 0xEF]);
    let mut archive = Archive::open(temp_file.path()).unwrap();

    let err = archive.acquire_by_path("b.raw").unwrap_err();
    assert!(err.is_missing_key());
    assert!(!err.is_io());
    assert!(archive.stream("b.raw").is_err());
}

#[test]
fn test_stream_reads_without_acquiring() {
    let temp_file = NamedTempFile::new().unwrap();
    let payload: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
    {
        let mut writer = ArchiveWriter::create(temp_file.path()).unwrap();
        writer.add_resource("first.bin", b"abc").unwrap();
        writer.add_resource("audio/theme.ogg", &payload).unwrap();
        writer.finalize().unwrap();
    }

    let mut archive = Archive::open(temp_file.path()).unwrap();

    {
        let mut stream = archive.stream("audio/theme.ogg").unwrap();
        assert_eq!(stream.size(), payload.len() as u64);

        let mut head = [0u8; 100];
        stream.read_exact(&mut head).unwrap();
        assert_eq!(&head[..], &payload[..100]);
        assert_eq!(stream.remaining(), payload.len() as u64 - 100);

        let mut rest = Vec::new();
        stream.read_to_end(&mut rest).unwrap();
        assert_eq!(&rest[..], &payload[100..]);
    }

    let id = archive.lookup("audio/theme.ogg").unwrap();
    assert_eq!(archive.reference_count(id), Some(0));
    assert!(!archive.is_hot(id));

    // A later acquire re-seeks the shared cursor.
    let first = archive.acquire_by_path("first.bin").unwrap();
    assert_eq!(archive.data(first).unwrap(), b"abc");
}

#[test]
fn test_settings_loaded_through_pack() {
    let settings_markup = r#"<root>
	<item name="General">
		<item name="Title" type="String">Pack Demo</item>
	</item>
	<item name="Display">
		<item name="Width" type="Integer">1024</item>
		<item name="Height" type="Integer">768</item>
		<item name="FOV" type="Float">75</item>
	</item>
	<item name="Script">
		<item name="Startup" type="String">script/boot.py</item>
	</item>
</root>
"#;

    let temp_file = NamedTempFile::new().unwrap();
    {
        let mut writer = ArchiveWriter::create(temp_file.path()).unwrap();
        writer.add_resource("script/boot.py", b"import engine\n").unwrap();
        writer
            .add_resource(respack::DEFAULT_SETTINGS_FILE, settings_markup.as_bytes())
            .unwrap();
        writer.finalize().unwrap();
    }

    let mut archive = Archive::open(temp_file.path()).unwrap();
    let settings = Settings::load(&mut archive, respack::DEFAULT_SETTINGS_FILE).unwrap();

    assert_eq!(settings.title, "Pack Demo");
    assert_eq!((settings.width, settings.height), (1024, 768));
    assert_eq!(settings.fov, 75.0);
    assert_eq!(settings.startup_script, "script/boot.py");
    assert!(settings.audio_enabled);

    let boot = archive.acquire_by_path(&settings.startup_script).unwrap();
    assert_eq!(archive.data(boot).unwrap(), b"import engine\n");
}

#[test]
fn test_missing_settings_file() {
    let temp_file = raw_pack(PACK_MAGIC, SINGLE_ENTRY, &[0xDE, 0xAD, 0xBE, 0xEF]);
    let mut archive = Archive::open(temp_file.path()).unwrap();

    let err = Settings::load(&mut archive, "settings.sgml").unwrap_err();
    assert!(err.is_missing_key());
}

#[test]
fn test_dump_pack_metadata() {
    let temp_file = raw_pack(PACK_MAGIC, SINGLE_ENTRY, &[0xDE, 0xAD, 0xBE, 0xEF]);
    let archive = Archive::open(temp_file.path()).unwrap();

    let mut out = Vec::new();
    dump(archive.body().unwrap(), &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.starts_with("<root>\n\t<item name=\"a.raw\" type=\"None\">\n"));
    let reparsed = ingest_str(&text).unwrap();
    assert_eq!(reparsed.body(), archive.body());
}

#[test]
fn test_separate_handles_per_thread() {
    let temp_file = NamedTempFile::new().unwrap();
    {
        let mut writer = ArchiveWriter::create(temp_file.path()).unwrap();
        for i in 0..20 {
            writer
                .add_resource(&format!("file{}.txt", i), format!("data{}", i).as_bytes())
                .unwrap();
        }
        writer.finalize().unwrap();
    }

    // Each thread opens its own archive (separate cursor)
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let path = temp_file.path().to_path_buf();
            std::thread::spawn(move || {
                let mut archive = Archive::open(&path).unwrap();
                for i in 0..20 {
                    let id = archive.acquire_by_path(&format!("file{}.txt", i)).unwrap();
                    assert_eq!(archive.data(id).unwrap(), format!("data{}", i).as_bytes());
                    archive.release(id).unwrap();
                }
                archive.sweep()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 20);
    }
}
