use {
    crate::{
        buffer::BufferKind,
        config::ExportConfig,
        dmabuf::LINEAR_MODIFIER,
        event_loop::EventLoop,
        exportable::{ExportContext, ViewBackendExportable},
        handshake::{HandshakeRecord, announce_surface, send_record},
        ifs::SharedBuffer,
        test_utils::{
            TestCreateImage, TestExportClient, TestFrameCallback, TestSharedBuffer,
            TestViewBackend, dmabuf, test_display,
        },
    },
    std::{cell::RefCell, rc::Rc},
};

const XRGB8888: u32 = 0x34325258;

struct Setup {
    el: EventLoop,
    ctx: Rc<ExportContext>,
    backend: Rc<TestViewBackend>,
    client: Rc<TestExportClient>,
    view: ViewBackendExportable,
}

fn setup() -> Setup {
    let el = EventLoop::new().unwrap();
    let ctx = ExportContext::new(&el.to_ref(), ExportConfig::default());
    let backend = Rc::new(TestViewBackend::default());
    let client = Rc::new(TestExportClient::default());
    let view = ViewBackendExportable::create(&ctx, backend.clone(), client.clone(), 800, 600);
    Setup {
        el,
        ctx,
        backend,
        client,
        view,
    }
}

#[test]
fn dmabuf_round_trip() {
    let s = setup();
    s.view.initialize();
    assert_eq!(&*s.backend.sizes.borrow(), &[(800, 600)]);
    let fd = s.view.get_consumer_fd().unwrap();
    announce_surface(fd.raw(), 7).unwrap();
    s.el.dispatch(0).unwrap();

    let target = s.ctx.registry.lookup(7).unwrap();
    assert_eq!(s.ctx.registry.owner(7), Some(s.view.session().id()));
    let buf = dmabuf(XRGB8888, &[LINEAR_MODIFIER, LINEAR_MODIFIER]);
    target.export_linux_dmabuf(Rc::new(buf));

    let mut exported = s.client.take();
    assert_eq!(exported.len(), 1);
    let (kind, buffer) = exported.pop().unwrap();
    assert_eq!(kind, BufferKind::LinuxDmabuf);
    let desc = s.view.query_dmabuf_descriptor(&buffer).unwrap();
    assert_eq!(desc.format, XRGB8888);
    assert_eq!(desc.planes.len(), 2);

    let create = TestCreateImage::new();
    let img = unsafe { s.view.import_to_gpu_image_with(&create, &buffer, test_display()) };
    assert!(!img.unwrap().is_none());
    assert_eq!(create.last.borrow().as_ref().unwrap().entries(), 3 + 5 * 2 + 1);

    s.view.dispatch_release_buffer(buffer);
}

#[test]
fn bad_magic_does_not_register() {
    let s = setup();
    s.view.initialize();
    let fd = s.view.get_consumer_fd().unwrap();
    send_record(
        fd.raw(),
        HandshakeRecord {
            magic: 0x01,
            surface_id: 7,
        },
    )
    .unwrap();
    s.el.dispatch(0).unwrap();
    assert!(s.ctx.registry.lookup(7).is_none());
}

#[test]
fn shared_buffer_round_trip() {
    let s = setup();
    s.view.initialize();
    let shared = TestSharedBuffer::new();
    s.view
        .exportable_client()
        .export_buffer_resource(shared.clone());
    let (kind, buffer) = s.client.take().pop().unwrap();
    assert_eq!(kind, BufferKind::WlResource);
    assert!(s.view.query_dmabuf_descriptor(&buffer).is_none());
    let create = TestCreateImage::new();
    unsafe { s.view.import_to_gpu_image_with(&create, &buffer, test_display()) }.unwrap();
    assert_eq!(
        create.last.borrow().as_ref().unwrap().client_buffer,
        shared.client_buffer(),
    );
    s.view.dispatch_release_buffer(buffer);
    assert_eq!(shared.releases.get(), 1);
}

#[test]
fn frame_complete_is_forwarded() {
    let s = setup();
    let done = Rc::new(RefCell::new(vec![]));
    let cb = Rc::new(TestFrameCallback {
        token: 5,
        done: done.clone(),
    });
    s.view.exportable_client().frame_callback(cb);
    s.view.dispatch_frame_complete();
    assert_eq!(&*done.borrow(), &[5]);
}

#[test]
fn destroy_releases_everything() {
    let s = setup();
    s.view.initialize();
    let fd = s.view.get_consumer_fd().unwrap();
    announce_surface(fd.raw(), 7).unwrap();
    s.el.dispatch(0).unwrap();
    assert_eq!(s.el.len(), 1);
    let Setup { el, ctx, view, .. } = s;
    view.destroy();
    assert!(ctx.registry.is_empty());
    assert_eq!(el.len(), 0);
}

#[test]
fn destroy_with_client_still_held() {
    let s = setup();
    s.view.initialize();
    let fd = s.view.get_consumer_fd().unwrap();
    announce_surface(fd.raw(), 7).unwrap();
    s.el.dispatch(0).unwrap();
    let Setup { el, ctx, view, .. } = s;
    let held = view.exportable_client();
    let session = view.session().clone();
    view.destroy();
    assert!(ctx.registry.lookup(7).is_none());
    assert!(ctx.registry.is_empty());
    assert_eq!(el.len(), 0);
    assert!(!session.has_channel());
    assert!(session.borrow_consumer_fd().is_err());

    let done = Rc::new(RefCell::new(vec![]));
    held.frame_callback(Rc::new(TestFrameCallback {
        token: 1,
        done: done.clone(),
    }));
    assert_eq!(session.pending_frame_callbacks(), 0);
    session.dispatch_frame_complete();
    assert!(done.borrow().is_empty());
}
