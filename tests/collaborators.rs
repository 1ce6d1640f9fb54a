use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use inkboard::services::{
    Capabilities, NotebookExporter, OcrTransport, OperationLocation, ServiceError, TextRecognizer,
};
use inkboard::{CanvasError, InkApp, MemoryStore};
use parking_lot::Mutex;

fn app(capabilities: Capabilities) -> InkApp {
    InkApp::from_parts(capabilities, Box::new(MemoryStore::new()))
}

/// Notebook that records every upload it receives.
struct RecordingNotebook {
    uploads: Arc<Mutex<Vec<(String, usize)>>>,
}

impl NotebookExporter for RecordingNotebook {
    fn upload(&self, name: &str, png: Vec<u8>) -> BoxFuture<'static, Result<(), ServiceError>> {
        let uploads = self.uploads.clone();
        let name = name.to_owned();
        async move {
            uploads.lock().push((name, png.len()));
            Ok(())
        }
        .boxed()
    }
}

/// Transport answering every poll with the configured lines.
struct StubTransport {
    lines: Vec<String>,
}

impl OcrTransport for StubTransport {
    fn submit(&self, _png: Vec<u8>) -> BoxFuture<'static, Result<OperationLocation, ServiceError>> {
        async { Ok(OperationLocation("job-7".to_owned())) }.boxed()
    }

    fn poll(
        &self,
        location: &OperationLocation,
    ) -> BoxFuture<'static, Result<Option<Vec<String>>, ServiceError>> {
        assert_eq!(location.0, "job-7");
        let lines = self.lines.clone();
        async move { Ok(Some(lines)) }.boxed()
    }
}

#[test]
fn notebook_export_saves_and_uploads_the_named_board() {
    let uploads = Arc::new(Mutex::new(Vec::new()));
    let mut app = app(Capabilities::detect()).with_notebook(Arc::new(RecordingNotebook {
        uploads: uploads.clone(),
    }));
    app.handle_viewport(64, 64).unwrap();

    let upload = app.export_to_notebook("standup notes").unwrap();
    futures::executor::block_on(upload).unwrap();

    let uploads = uploads.lock();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].0, "standup notes");
    // The upload carries the board's PNG bytes.
    assert!(uploads[0].1 > 0);

    // Exporting also appends the save-under-name record.
    let saved = app.saved_images();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].name, "standup notes");
}

#[test]
fn notebook_export_without_a_collaborator_is_unavailable() {
    let mut app = app(Capabilities::detect());
    app.handle_viewport(64, 64).unwrap();
    assert!(matches!(
        app.export_to_notebook("board"),
        Err(CanvasError::Service(ServiceError::Unavailable))
    ));
    // Nothing was saved either.
    assert!(app.saved_images().is_empty());
}

#[test]
fn notebook_export_needs_an_initialized_surface() {
    let uploads = Arc::new(Mutex::new(Vec::new()));
    let mut app = app(Capabilities::detect()).with_notebook(Arc::new(RecordingNotebook {
        uploads: uploads.clone(),
    }));
    assert!(matches!(
        app.export_to_notebook("board"),
        Err(CanvasError::UninitializedSurface)
    ));
    assert!(uploads.lock().is_empty());
}

#[test]
fn text_recognition_runs_over_the_canvas_bitmap() {
    let recognizer = TextRecognizer::new(Arc::new(StubTransport {
        lines: vec!["hello".to_owned(), "world".to_owned()],
    }));
    let mut app = app(Capabilities::detect()).with_recognizer(Arc::new(recognizer));
    app.handle_viewport(64, 64).unwrap();

    let text = futures::executor::block_on(app.recognize_text().unwrap()).unwrap();
    assert_eq!(text, "hello.world");
}

#[test]
fn text_recognition_without_a_collaborator_is_unavailable() {
    let mut app = app(Capabilities::detect());
    app.handle_viewport(64, 64).unwrap();
    assert!(app.recognize_text().is_none());
    assert!(matches!(
        app.request_text_recognition(),
        Err(CanvasError::Service(ServiceError::Unavailable))
    ));
}

#[test]
fn clipboard_paste_is_gated_on_the_capability() {
    let mut app = app(Capabilities::none());
    app.handle_viewport(64, 64).unwrap();
    assert!(matches!(
        app.paste_clipboard_image(),
        Err(CanvasError::Service(ServiceError::Unavailable))
    ));
}
