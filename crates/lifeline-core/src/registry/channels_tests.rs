use super::*;

fn names(registry: &ChannelRegistry<String>) -> Vec<String> {
    registry.sub_channel_names()
}

#[test]
fn test_default_sub_channels_without_metrics() {
    let registry: ChannelRegistry<String> = ChannelRegistry::new("control");
    assert_eq!(names(&registry), vec!["condition", "ctl", "done"]);
}

#[test]
fn test_default_sub_channels_with_metrics() {
    let registry: ChannelRegistry<String> =
        ChannelRegistry::new_with_property("control", None, None, true);
    assert_eq!(
        names(&registry),
        vec!["condition", "ctl", "done", "monitor", "telemetry"]
    );
}

#[test]
fn test_metrics_before_first_access() {
    let registry: ChannelRegistry<String> = ChannelRegistry::new("control");
    registry.with_metrics(true);
    assert!(registry.has_metrics());
    assert_eq!(names(&registry).len(), 5);
}

#[test]
fn test_enabling_metrics_after_population_adds_channels() {
    let registry: ChannelRegistry<String> = ChannelRegistry::new("control");
    assert_eq!(names(&registry).len(), 3);

    registry.with_metrics(true);
    assert!(registry.lookup_text(TELEMETRY).is_some());
    assert!(registry.lookup_text(MONITOR).is_some());

    registry.with_metrics(false);
    assert_eq!(names(&registry).len(), 5);
}

#[test]
fn test_default_kinds_and_capacities() {
    let registry: ChannelRegistry<String> = ChannelRegistry::new("control");

    let (done, kind) = registry.lookup_sub_channel(DONE).unwrap();
    assert_eq!(kind, ChannelKind::Flag);
    assert_eq!(done.capacity(), SMALL_BUFFER);

    let (ctl, kind) = registry.lookup_sub_channel(CTL).unwrap();
    assert_eq!(kind, ChannelKind::Text);
    assert_eq!(ctl.capacity(), MEDIUM_BUFFER);

    assert_eq!(registry.main_channel().capacity(), LARGE_BUFFER);
}

#[test]
fn test_with_property_constructor_buffer_default() {
    let registry: ChannelRegistry<u32> = ChannelRegistry::new_with_property("p", None, None, false);
    assert_eq!(registry.buffer_size(), 3);
    assert_eq!(registry.main_channel().capacity(), 3);

    let registry: ChannelRegistry<u32> =
        ChannelRegistry::new_with_property("p", Some(7), None, false);
    assert_eq!(registry.main_channel().capacity(), 7);
}

#[test]
fn test_custom_buffer_sizes() {
    let registry: ChannelRegistry<String> = ChannelRegistry::new("control");
    registry.with_buffer_sizes(BufferSizes {
        small: 1,
        medium: 8,
        large: 16,
    });
    assert_eq!(registry.lookup_text(CTL).unwrap().capacity(), 8);
    assert_eq!(registry.lookup_flag(DONE).unwrap().capacity(), 1);
}

#[test]
fn test_lookup_missing_is_not_error() {
    let registry: ChannelRegistry<String> = ChannelRegistry::new("control");
    assert!(registry.lookup_sub_channel("nope").is_none());
}

#[test]
fn test_lookup_is_idempotent() {
    let registry: ChannelRegistry<String> = ChannelRegistry::new("control");
    let (first, _) = registry.lookup_sub_channel(CTL).unwrap();
    let (second, _) = registry.lookup_sub_channel(CTL).unwrap();
    assert!(first.same_channel(&second));
}

#[test]
fn test_typed_lookup_mismatch_reports_absent() {
    let registry: ChannelRegistry<String> = ChannelRegistry::new("control");
    assert!(registry.lookup_text(DONE).is_none());
    assert!(registry.lookup_flag(CTL).is_none());
    assert!(registry.lookup_message(CTL).is_none());
}

#[test]
fn test_register_replaces() {
    let registry: ChannelRegistry<u32> = ChannelRegistry::new("control");
    let stored = registry.register_sub_channel("data", SubChannel::message("data", 4));
    assert_eq!(stored.kind(), ChannelKind::Message);

    let replacement = registry.register_sub_channel("data", SubChannel::flag("data", 1));
    let (found, kind) = registry.lookup_sub_channel("data").unwrap();
    assert_eq!(kind, ChannelKind::Flag);
    assert!(found.same_channel(&replacement));
    assert!(!stored.is_closed());
}

#[test]
fn test_set_sub_channel_buffers() {
    let registry: ChannelRegistry<String> = ChannelRegistry::new("control");
    let ctl = registry.lookup_text(CTL).unwrap();
    ctl.try_send("pending".to_string()).unwrap();

    assert_eq!(registry.set_sub_channel_buffers(CTL, 9), 9);
    assert_eq!(ctl.capacity(), 9);
    assert!(ctl.is_empty());

    assert_eq!(registry.set_sub_channel_buffers("missing", 9), 0);
}

#[test]
fn test_remove_sub_channel() {
    let registry: ChannelRegistry<String> = ChannelRegistry::new("control");
    let removed = registry.remove_sub_channel(CONDITION).unwrap();
    assert!(!removed.is_closed());
    assert!(registry.lookup_sub_channel(CONDITION).is_none());
}

#[test]
fn test_main_channel_replacement_keeps_old_open() {
    let registry: ChannelRegistry<u32> = ChannelRegistry::new("control");
    let original = registry.main_channel();

    let previous = registry.set_main_channel(Arc::new(ChannelBase::new("main-2", 4)));
    assert!(Arc::ptr_eq(&original, &previous));
    assert!(!previous.is_closed());
    assert_eq!(registry.main_channel().name(), "main-2");
    assert_eq!(registry.buffer_size(), 4);
}

#[test]
fn test_builder_chaining() {
    let registry: ChannelRegistry<u32> = ChannelRegistry::new("control");
    registry
        .with_metrics(true)
        .with_buffer_size(6)
        .with_main_channel(Arc::new(ChannelBase::new("m", 2)));

    assert!(registry.has_metrics());
    assert_eq!(registry.buffer_size(), 2);
    assert_eq!(registry.main_channel().name(), "m");
}

#[test]
fn test_close_closes_sub_channels_but_not_main() {
    let registry: ChannelRegistry<String> = ChannelRegistry::new("control");
    registry.close().unwrap();

    assert!(registry.lookup_flag(DONE).unwrap().is_closed());
    assert!(registry.lookup_text(CTL).unwrap().is_closed());
    assert!(!registry.main_channel().is_closed());
}

#[test]
fn test_second_close_fails() {
    let registry: ChannelRegistry<String> = ChannelRegistry::new("control");
    registry.close().unwrap();

    let err = registry.close().unwrap_err();
    assert!(matches!(err, ChannelError::AlreadyClosed(_)));
    // The map is intact after the failed close.
    assert_eq!(names(&registry).len(), 3);
}

#[test]
fn test_concurrent_close_yields_one_success() {
    let registry: Arc<ChannelRegistry<String>> = Arc::new(ChannelRegistry::new("control"));
    registry.sub_channel_names();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = registry.clone();
            std::thread::spawn(move || registry.close().is_ok())
        })
        .collect();
    let successes = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert!(successes <= 1);
    assert_eq!(names(&registry).len(), 3);
    assert!(registry.lookup_text(CTL).unwrap().is_closed());
}

#[tokio::test]
async fn test_publish_control() {
    let registry: ChannelRegistry<String> = ChannelRegistry::new("control");
    registry.publish_control("Lifecycle", "start").unwrap();

    let message = registry.lookup_text(CTL).unwrap().recv().await.unwrap();
    let value: serde_json::Value = serde_json::from_str(&message).unwrap();
    assert_eq!(value["context"], "Lifecycle");
    assert_eq!(value["message"], "start");
}

#[test]
fn test_publish_control_mistyped_ctl() {
    let registry: ChannelRegistry<String> = ChannelRegistry::new("control");
    registry.register_sub_channel(CTL, SubChannel::flag(CTL, 1));

    let err = registry.publish_control("Lifecycle", "start").unwrap_err();
    assert!(matches!(err, ChannelError::TypeMismatch { .. }));

    registry.remove_sub_channel(CTL);
    let err = registry.publish_control("Lifecycle", "start").unwrap_err();
    assert_eq!(err, ChannelError::NotFound(CTL.to_string()));
}

#[test]
fn test_publish_control_full() {
    let registry: ChannelRegistry<String> = ChannelRegistry::new("control");
    for _ in 0..MEDIUM_BUFFER {
        registry.publish_control("Lifecycle", "tick").unwrap();
    }
    assert!(matches!(
        registry.publish_control("Lifecycle", "tick"),
        Err(ChannelError::Full(_))
    ));
}

#[test]
fn test_control_message_format() {
    assert_eq!(
        control_message("SignalManager", "SIGTERM"),
        r#"{"context":"SignalManager","message":"SIGTERM"}"#
    );
}
