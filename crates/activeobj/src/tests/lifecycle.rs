use crate::lifecycle::{AtomicLifecycle, Lifecycle};

#[test]
fn transitions_follow_compare_and_swap() {
    let state = AtomicLifecycle::new(Lifecycle::Created);

    assert!(state.transition(Lifecycle::Created, Lifecycle::Running).is_ok());
    assert_eq!(state.load(), Lifecycle::Running);

    let observed = state
        .transition(Lifecycle::Created, Lifecycle::Running)
        .unwrap_err();
    assert_eq!(observed, Lifecycle::Running);

    assert!(state.transition(Lifecycle::Running, Lifecycle::Stopping).is_ok());
    state.store(Lifecycle::Stopped);
    assert_eq!(state.load(), Lifecycle::Stopped);
}

#[test]
fn display_names() {
    assert_eq!(Lifecycle::Created.to_string(), "created");
    assert_eq!(Lifecycle::Stopping.to_string(), "stopping");
    assert_eq!(format!("{:?}", AtomicLifecycle::new(Lifecycle::Running)), "Running");
}
