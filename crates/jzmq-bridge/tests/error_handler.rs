//! Error-handler registration and delivery through the native trampoline.

use jzmq_testkit::{
    bridge, bridge_with, context_object, FakeBridge, FakeLibZmq, FakeObject, FakeTarget, FakeVm,
    ReportedError, VmBehavior,
};
use pretty_assertions::assert_eq;
use zmq_ctx::error::{EFSM, ETERM};
use zmq_ctx::{ErrorKind, NativeVersion};

fn constructed() -> (FakeBridge, FakeObject) {
    let bridge = bridge();
    let mut ctx = context_object();
    bridge.construct(&mut ctx, 1).unwrap();
    (bridge, ctx)
}

#[test]
fn test_error_reaches_target_on_native_thread() {
    let (bridge, mut ctx) = constructed();
    let vm = FakeVm::new();
    let target = FakeTarget::new(&vm);
    let log = target.log();

    assert!(bridge.set_error_handler(&mut ctx, Some(target)));
    assert!(bridge
        .native()
        .fire_error_on_thread(ctx.handle(), ETERM, Some("tcp://127.0.0.1:5555")));

    assert_eq!(
        log.entries(),
        vec![ReportedError {
            kind: Some(ErrorKind::Terminated),
            code: ETERM,
            host: "tcp://127.0.0.1:5555".to_string(),
            attached: true,
        }]
    );
    assert_eq!(vm.attach_count(), 1);
    assert_eq!(vm.detach_count(), 1);
}

#[test]
fn test_null_host_is_delivered_empty() {
    let (bridge, mut ctx) = constructed();
    let target = FakeTarget::new(&FakeVm::new());
    let log = target.log();

    bridge.set_error_handler(&mut ctx, Some(target));
    bridge.native().fire_error_on_thread(ctx.handle(), EFSM, None);

    assert_eq!(log.entries()[0].host, "");
    assert_eq!(log.entries()[0].kind, Some(ErrorKind::InvalidState));
}

#[test]
fn test_attached_thread_stays_attached() {
    let (bridge, mut ctx) = constructed();
    let vm = FakeVm::new();
    let target = FakeTarget::new(&vm);
    let log = target.log();
    bridge.set_error_handler(&mut ctx, Some(target));

    FakeVm::mark_current_thread_attached(true);
    bridge.native().fire_error(ctx.handle(), ETERM, None);
    let still_attached = FakeVm::current_thread_attached();
    FakeVm::mark_current_thread_attached(false);

    assert!(still_attached);
    assert_eq!(log.len(), 1);
    assert_eq!(vm.attach_count(), 0);
    assert_eq!(vm.detach_count(), 0);
}

#[test]
fn test_detached_thread_is_detached_again() {
    let (bridge, mut ctx) = constructed();
    let vm = FakeVm::new();
    bridge.set_error_handler(&mut ctx, Some(FakeTarget::new(&vm)));

    bridge.native().fire_error(ctx.handle(), ETERM, None);

    assert!(!FakeVm::current_thread_attached());
    assert_eq!(vm.detach_count(), 1);
}

#[test]
fn test_panicking_target_restores_thread_state() {
    let (bridge, mut ctx) = constructed();
    let vm = FakeVm::new();
    bridge.set_error_handler(&mut ctx, Some(FakeTarget::new(&vm).panicking()));

    assert!(bridge.native().fire_error_on_thread(ctx.handle(), ETERM, None));
    bridge.native().fire_error(ctx.handle(), ETERM, None);

    assert!(!FakeVm::current_thread_attached());
    assert_eq!(vm.attach_count(), 2);
    assert_eq!(vm.detach_count(), 2);
}

#[test]
fn test_attach_failure_skips_callback() {
    let (bridge, mut ctx) = constructed();
    let vm = FakeVm::with_behavior(VmBehavior::AttachFails);
    let target = FakeTarget::new(&vm);
    let log = target.log();
    bridge.set_error_handler(&mut ctx, Some(target));

    bridge.native().fire_error_on_thread(ctx.handle(), ETERM, None);

    assert!(log.is_empty());
    assert_eq!(vm.detach_count(), 0);
}

#[test]
fn test_unsupported_vm_skips_callback() {
    let (bridge, mut ctx) = constructed();
    let target = FakeTarget::new(&FakeVm::with_behavior(VmBehavior::Unsupported));
    let log = target.log();
    bridge.set_error_handler(&mut ctx, Some(target));

    bridge.native().fire_error_on_thread(ctx.handle(), ETERM, None);

    assert!(log.is_empty());
}

#[test]
fn test_missing_translator_delivers_untranslated() {
    let (bridge, mut ctx) = constructed();
    let target = FakeTarget::new(&FakeVm::new()).without_translator();
    let log = target.log();

    assert!(bridge.set_error_handler(&mut ctx, Some(target)));
    bridge.native().fire_error_on_thread(ctx.handle(), ETERM, Some("inproc://a"));

    let entries = log.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, None);
    assert_eq!(entries[0].code, ETERM);
}

#[test]
fn test_target_without_report_method_is_rejected() {
    let (bridge, mut ctx) = constructed();
    let target = FakeTarget::new(&FakeVm::new()).without_report_method();
    let refs = target.refs();
    let log = target.log();

    assert!(!bridge.set_error_handler(&mut ctx, Some(target)));

    assert_eq!(bridge.native().calls().set_error_handler, 0);
    assert!(!bridge.native().has_handler(ctx.handle()));
    assert!(!bridge.native().fire_error(ctx.handle(), ETERM, None));
    assert!(log.is_empty());
    assert_eq!(refs.pinned(), 0);
    assert_eq!(bridge.handler_count(), 0);
}

#[test]
fn test_no_context_returns_false() {
    let bridge = bridge();
    let mut ctx = context_object();
    let target = FakeTarget::new(&FakeVm::new());
    let refs = target.refs();

    assert!(!bridge.set_error_handler(&mut ctx, Some(target)));
    assert!(!bridge.set_error_handler::<_, FakeTarget>(&mut ctx, None));

    assert_eq!(bridge.native().calls().total(), 0);
    assert_eq!(refs.pinned(), 0);
}

#[test]
fn test_old_library_returns_false_without_native_call() {
    let bridge = bridge_with(FakeLibZmq::with_version(NativeVersion::new(4, 2, 2)));
    let mut ctx = context_object();
    bridge.construct(&mut ctx, 1).unwrap();
    let target = FakeTarget::new(&FakeVm::new());
    let refs = target.refs();

    assert!(!bridge.set_error_handler(&mut ctx, Some(target)));
    assert!(!bridge.set_error_handler::<_, FakeTarget>(&mut ctx, None));

    assert_eq!(bridge.native().calls().set_error_handler, 0);
    assert_eq!(refs.pinned(), 0);
}

#[test]
fn test_uninstall_stops_delivery_and_releases() {
    let (bridge, mut ctx) = constructed();
    let target = FakeTarget::new(&FakeVm::new());
    let refs = target.refs();
    let log = target.log();

    assert!(bridge.set_error_handler(&mut ctx, Some(target)));
    assert!(bridge.set_error_handler::<_, FakeTarget>(&mut ctx, None));

    assert!(!bridge.native().fire_error(ctx.handle(), ETERM, None));
    assert!(log.is_empty());
    assert_eq!(refs.live(), 0);
    assert_eq!(bridge.handler_count(), 0);
}

#[test]
fn test_replacing_handler_releases_previous() {
    let (bridge, mut ctx) = constructed();
    let vm = FakeVm::new();
    let first = FakeTarget::new(&vm);
    let second = FakeTarget::new(&vm).replying(1);
    let (first_refs, first_log) = (first.refs(), first.log());
    let (second_refs, second_log) = (second.refs(), second.log());

    assert!(bridge.set_error_handler(&mut ctx, Some(first)));
    assert!(bridge.set_error_handler(&mut ctx, Some(second)));

    assert_eq!(first_refs.live(), 0);
    assert_eq!(second_refs.live(), 1);
    assert_eq!(bridge.handler_count(), 1);

    bridge.native().fire_error_on_thread(ctx.handle(), ETERM, None);
    assert!(first_log.is_empty());
    assert_eq!(second_log.len(), 1);
}

#[test]
fn test_failed_install_keeps_previous_handler() {
    let (bridge, mut ctx) = constructed();
    let vm = FakeVm::new();
    let first = FakeTarget::new(&vm);
    let second = FakeTarget::new(&vm);
    let (first_refs, first_log) = (first.refs(), first.log());
    let second_refs = second.refs();

    assert!(bridge.set_error_handler(&mut ctx, Some(first)));
    bridge.native().fail_next_handler_install(libc::EINVAL);
    assert!(!bridge.set_error_handler(&mut ctx, Some(second)));

    assert_eq!(first_refs.live(), 1);
    assert_eq!((second_refs.pinned(), second_refs.live()), (1, 0));

    bridge.native().fire_error_on_thread(ctx.handle(), ETERM, None);
    assert_eq!(first_log.len(), 1);
}

#[test]
fn test_destroy_releases_handler() {
    let (bridge, mut ctx) = constructed();
    let target = FakeTarget::new(&FakeVm::new());
    let refs = target.refs();
    let raw = ctx.handle();

    assert!(bridge.set_error_handler(&mut ctx, Some(target)));
    bridge.destroy(&mut ctx).unwrap();

    assert_eq!(refs.live(), 0);
    assert_eq!(bridge.handler_count(), 0);
    assert!(!bridge.native().has_handler(raw));
}

#[test]
fn test_interrupted_destroy_keeps_handler_alive() {
    let (bridge, mut ctx) = constructed();
    let target = FakeTarget::new(&FakeVm::new());
    let refs = target.refs();
    let log = target.log();
    let raw = ctx.handle();

    assert!(bridge.set_error_handler(&mut ctx, Some(target)));
    bridge.native().interrupt_next_term();
    let err = bridge.destroy(&mut ctx).unwrap_err();

    assert_eq!(err.native_code(), Some(libc::EINTR));
    assert_eq!(ctx.handle(), 0);
    assert!(bridge.native().has_handler(raw));
    assert_eq!(refs.live(), 1);
    assert_eq!(bridge.handler_count(), 0);

    assert!(bridge
        .native()
        .fire_error_on_thread(raw, ETERM, Some("inproc://late")));
    assert_eq!(log.len(), 1);
    assert_eq!(log.entries()[0].host, "inproc://late");
}

#[test]
fn test_handlers_are_per_context() {
    let bridge = bridge();
    let vm = FakeVm::new();
    let mut first = context_object();
    let mut second = context_object();
    bridge.construct(&mut first, 1).unwrap();
    bridge.construct(&mut second, 1).unwrap();

    let first_target = FakeTarget::new(&vm);
    let second_target = FakeTarget::new(&vm);
    let (first_log, second_log) = (first_target.log(), second_target.log());
    bridge.set_error_handler(&mut first, Some(first_target));
    bridge.set_error_handler(&mut second, Some(second_target));

    bridge.native().fire_error_on_thread(second.handle(), ETERM, None);

    assert!(first_log.is_empty());
    assert_eq!(second_log.len(), 1);
    assert_eq!(bridge.handler_count(), 2);
}
