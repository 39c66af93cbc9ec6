use {
    crate::{
        session::SessionError,
        utils::{errorfmt::ErrorFmt, oserror::OsError},
    },
    uapi::c,
};

#[test]
fn source_chain_is_appended() {
    let e = SessionError::Dup(OsError(c::EBADF));
    let s = ErrorFmt(e).to_string();
    assert!(
        s.starts_with("Could not duplicate the consumer end of the side channel: "),
        "{}",
        s,
    );
    assert_eq!(s.matches(": ").count(), 1, "{}", s);
}

#[test]
fn error_without_source_is_printed_alone() {
    let s = ErrorFmt(SessionError::NoChannel).to_string();
    assert_eq!(s, "The session has no side channel");
}
