use std::fs;
use std::io;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;
use tracing_subscriber::fmt::MakeWriter;

use qbot::{DestinationLayout, ExclusionSet, relocate_tree};

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Captured {
    type Writer = Captured;
    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn relocation_emits_structured_summary() {
    let td = tempdir().unwrap();
    let src = td.path().join("download");
    fs::create_dir_all(src.join("sample")).unwrap();
    fs::write(src.join("e1.mkv"), b"1").unwrap();
    fs::write(src.join("sample").join("s.mkv"), b"s").unwrap();

    let captured = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(captured.clone())
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        relocate_tree(
            &src,
            &td.path().join("staging"),
            &ExclusionSet::from_csv("sample"),
            DestinationLayout::Flat,
        )
        .unwrap();
    });

    let text = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
    assert!(text.contains("Relocation finished"), "{text}");
    assert!(text.contains("moved=1"), "{text}");
    assert!(text.contains("excluded=1"), "{text}");
}
