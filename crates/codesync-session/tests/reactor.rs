use std::time::Duration;

use codesync_common::{ClientMessage, JoinRequest, ServerMessage};
use codesync_core::{EditSurface, EditorRope, LocalSurface, Selection, Splice, ViewState};
use codesync_session::{
    AllowAll, LoopbackAuthority, ReadOnly, SessionInput, SessionOutput, SessionReactor,
    SessionStatus, SyncError,
};
use tokio::sync::mpsc;

async fn next(rx: &mut mpsc::Receiver<SessionOutput>) -> SessionOutput {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("reactor output timed out")
        .expect("reactor stopped")
}

#[tokio::test]
async fn test_join_and_ready() {
    let (handle, mut rx) =
        SessionReactor::spawn("A".into(), LocalSurface::with_text(""), AllowAll, 8);

    handle.open("notes.md").await.unwrap();
    assert_eq!(
        next(&mut rx).await,
        SessionOutput::Send(ClientMessage::Join(JoinRequest {
            file_id: "notes.md".into()
        }))
    );
    assert_eq!(
        next(&mut rx).await,
        SessionOutput::Status(SessionStatus::Connecting { resyncing: false })
    );

    handle
        .send(SessionInput::Raw(
            r##"{"type":"ready","fileId":"notes.md","content":"# Notes","version":2}"##.into(),
        ))
        .await
        .unwrap();
    assert_eq!(next(&mut rx).await, SessionOutput::Status(SessionStatus::Ready));
    assert_eq!(next(&mut rx).await, SessionOutput::Content("# Notes".into()));
}

#[tokio::test]
async fn test_two_reactors_through_authority() {
    let mut authority = LoopbackAuthority::new().with_file("f", "");
    let conn_a = authority.connect();
    let conn_b = authority.connect();

    let (a, mut a_rx) = SessionReactor::spawn("A".into(), LocalSurface::with_text(""), AllowAll, 8);
    let (b, mut b_rx) = SessionReactor::spawn("B".into(), LocalSurface::with_text(""), AllowAll, 8);

    for (handle, rx, conn) in [(&a, &mut a_rx, conn_a), (&b, &mut b_rx, conn_b)] {
        handle.open("f").await.unwrap();
        let SessionOutput::Send(join) = next(rx).await else {
            panic!("expected join");
        };
        let _connecting = next(rx).await;
        for delivery in authority.handle(conn, join) {
            handle.deliver(delivery.message).await.unwrap();
        }
        assert_eq!(next(rx).await, SessionOutput::Status(SessionStatus::Ready));
        assert_eq!(next(rx).await, SessionOutput::Content(String::new()));
    }

    a.local_edit("shared").await.unwrap();
    let SessionOutput::Send(op) = next(&mut a_rx).await else {
        panic!("expected operation");
    };
    let deliveries = authority.handle(conn_a, op);
    assert_eq!(deliveries.len(), 2);
    for delivery in deliveries {
        let target = if delivery.to == conn_a { &a } else { &b };
        target.deliver(delivery.message).await.unwrap();
    }

    assert_eq!(next(&mut b_rx).await, SessionOutput::Content("shared".into()));

    // Acknowledgment of our own edit changes nothing visible.
    drop(a);
    drop(b);
    assert!(a_rx.recv().await.is_none());
    assert!(b_rx.recv().await.is_none());
}

#[tokio::test]
async fn test_rejected_edit_reported() {
    let (handle, mut rx) =
        SessionReactor::spawn("A".into(), LocalSurface::with_text(""), ReadOnly, 8);

    handle.local_edit("x").await.unwrap();
    assert_eq!(next(&mut rx).await, SessionOutput::Rejected(SyncError::NotJoined));

    handle.open("f").await.unwrap();
    let _join = next(&mut rx).await;
    let _connecting = next(&mut rx).await;
    handle
        .deliver(
            ServerMessage::from_json(r#"{"type":"ready","fileId":"f","content":"","version":0}"#)
                .unwrap(),
        )
        .await
        .unwrap();
    let _ready = next(&mut rx).await;
    let _content = next(&mut rx).await;

    handle.local_edit("x").await.unwrap();
    assert_eq!(
        next(&mut rx).await,
        SessionOutput::Rejected(SyncError::PermissionDenied("f".into()))
    );
}

#[tokio::test]
async fn test_run_returns_controller() {
    let (reactor, handle, mut rx) =
        SessionReactor::new("A".into(), LocalSurface::with_text(""), AllowAll, 4);
    let task = tokio::spawn(reactor.run());

    handle.open("f").await.unwrap();
    handle.disconnected().await.unwrap();
    let _ = next(&mut rx).await;
    drop(handle);

    let controller = task.await.unwrap();
    assert_eq!(controller.status(), &SessionStatus::Idle);
    assert_eq!(controller.active_file().map(|f| f.as_str()), Some("f"));
    drop(rx);
}

/// Counts wholesale content resets so splice-only writes can be checked.
struct CountingSurface {
    inner: LocalSurface,
    resets: usize,
}

impl EditSurface for CountingSurface {
    type Buffer = EditorRope;

    fn buffer(&self) -> Option<&EditorRope> {
        self.inner.buffer()
    }

    fn buffer_mut(&mut self) -> Option<&mut EditorRope> {
        self.inner.buffer_mut()
    }

    fn has_focus(&self) -> bool {
        self.inner.has_focus()
    }

    fn save_view_state(&self) -> ViewState {
        self.inner.save_view_state()
    }

    fn restore_view_state(&mut self, state: ViewState) {
        self.inner.restore_view_state(state);
    }

    fn set_content(&mut self, text: &str) {
        self.resets += 1;
        self.inner.set_content(text);
    }

    fn apply_splices(&mut self, splices: &[Splice]) {
        self.inner.apply_splices(splices);
    }
}

#[tokio::test]
async fn test_local_edit_mirrored_through_patch() {
    let mut surface = CountingSurface {
        inner: LocalSurface::with_text(""),
        resets: 0,
    };
    surface
        .inner
        .set_view(ViewState::with_selection(Selection::collapsed(2)));

    let (reactor, handle, mut rx) = SessionReactor::new("A".into(), surface, AllowAll, 8);
    let task = tokio::spawn(reactor.run());

    handle.open("f").await.unwrap();
    handle
        .deliver(
            ServerMessage::from_json(r#"{"type":"ready","fileId":"f","content":"abc","version":0}"#)
                .unwrap(),
        )
        .await
        .unwrap();
    handle.local_edit("abcd").await.unwrap();
    handle.local_edit("abcd").await.unwrap();
    drop(handle);

    let controller = task.await.unwrap();
    let surface = controller.surface();
    assert_eq!(surface.text().as_deref(), Some("abcd"));
    assert_eq!(surface.resets, 0);
    // Snapshot plus one edit; the repeated edit changed nothing.
    assert_eq!(surface.inner.batches(), 2);
    assert_eq!(surface.inner.view().selection, Selection::collapsed(2));
    while rx.recv().await.is_some() {}
}
